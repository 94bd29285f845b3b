//! Structural token decoding without signature verification.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::{AuthError, Claims},
};

/// Failures raised while decoding a compact JWS.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token does not have three dot-separated segments.
	#[error("Token must have three dot-separated segments, found {found}.")]
	Segments {
		/// Number of segments found.
		found: usize,
	},
	/// Segment is not valid base64url.
	#[error("Token {segment} is not valid base64url.")]
	Base64 {
		/// Segment name.
		segment: &'static str,
		/// Underlying decode failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Segment is not valid JSON.
	#[error("Token {segment} is not valid JSON.")]
	Json {
		/// Segment name.
		segment: &'static str,
		/// Underlying parse failure.
		#[source]
		source: serde_json::Error,
	},
	/// Segment decoded to JSON that is not an object.
	#[error("Decoded token {segment} must be an object.")]
	NotAnObject {
		/// Segment name.
		segment: &'static str,
	},
}

/// Header, payload, and signature of a token, decoded but not verified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
	/// JOSE header.
	pub header: JsonMap<String, JsonValue>,
	/// Unverified claims.
	pub payload: Claims,
	/// Signature segment as presented (base64url).
	pub signature: String,
}
impl DecodedToken {
	/// Algorithm declared in the header (`alg`).
	pub fn algorithm(&self) -> Option<&str> {
		self.header.get("alg").and_then(JsonValue::as_str)
	}

	/// Key identifier declared in the header (`kid`).
	pub fn key_id(&self) -> Option<&str> {
		self.header.get("kid").and_then(JsonValue::as_str)
	}
}

/// Decodes `token` into header, payload, and signature.
///
/// Fails with [`AuthError::InvalidToken`] when the token is not a compact JWS whose header and
/// payload are JSON objects.
pub fn decode_token(token: &str) -> Result<DecodedToken, AuthError> {
	decode_segments(token).map_err(AuthError::invalid_token)
}

fn decode_segments(token: &str) -> Result<DecodedToken, DecodeError> {
	let segments = token.split('.').collect::<Vec<_>>();
	let [header, payload, signature] = segments.as_slice() else {
		return Err(DecodeError::Segments { found: segments.len() });
	};

	Ok(DecodedToken {
		header: decode_object("header", header)?,
		payload: decode_object("payload", payload)?,
		signature: (*signature).to_owned(),
	})
}

fn decode_object(
	segment: &'static str,
	raw: &str,
) -> Result<JsonMap<String, JsonValue>, DecodeError> {
	let bytes = URL_SAFE_NO_PAD
		.decode(raw.trim_end_matches('='))
		.map_err(|source| DecodeError::Base64 { segment, source })?;

	match serde_json::from_slice(&bytes).map_err(|source| DecodeError::Json { segment, source })? {
		JsonValue::Object(map) => Ok(map),
		_ => Err(DecodeError::NotAnObject { segment }),
	}
}
