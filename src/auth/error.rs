//! Authentication failure taxonomy (HTTP 401).

// crates.io
use http::{HeaderValue, Response, StatusCode, header::WWW_AUTHENTICATE};
// self
use crate::{_prelude::*, error::BoxError};

/// Stable error codes exposed to hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
	/// The token passed verification but the application revoked it.
	RevokedToken,
	/// The token could not be decoded or verified.
	InvalidToken,
	/// The authorization header uses a scheme other than `Bearer`.
	CredentialsBadScheme,
	/// The authorization header is not `<scheme> <token>`.
	CredentialsBadFormat,
	/// No token was presented although one is required.
	CredentialsRequired,
}
impl ErrorCode {
	/// Returns the wire label for the code.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorCode::RevokedToken => "revoked_token",
			ErrorCode::InvalidToken => "invalid_token",
			ErrorCode::CredentialsBadScheme => "credentials_bad_scheme",
			ErrorCode::CredentialsBadFormat => "credentials_bad_format",
			ErrorCode::CredentialsRequired => "credentials_required",
		}
	}
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Authentication failure raised by the pipeline.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// No token was presented although one is required.
	#[error("No authorization token was found.")]
	CredentialsRequired,
	/// The authorization header uses a scheme other than `Bearer`.
	#[error("Format is Authorization: Bearer [token].")]
	CredentialsBadScheme,
	/// The authorization header is not `<scheme> <token>`.
	#[error("Format is Authorization: Bearer [token].")]
	CredentialsBadFormat,
	/// The token could not be decoded or verified.
	#[error("{message}")]
	InvalidToken {
		/// Human-readable reason.
		message: String,
		/// Underlying decode or verification failure.
		#[source]
		source: Option<BoxError>,
	},
	/// The token passed verification but the application revoked it.
	#[error("The token has been revoked.")]
	RevokedToken,
}
impl AuthError {
	/// Builds an [`AuthError::InvalidToken`] wrapping `source`.
	pub fn invalid_token(source: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::InvalidToken { message: source.to_string(), source: Some(Box::new(source)) }
	}

	/// Builds an [`AuthError::InvalidToken`] without an inner cause.
	pub fn invalid_token_message(message: impl Into<String>) -> Self {
		Self::InvalidToken { message: message.into(), source: None }
	}

	/// Stable code for the failure.
	pub fn code(&self) -> ErrorCode {
		match self {
			Self::CredentialsRequired => ErrorCode::CredentialsRequired,
			Self::CredentialsBadScheme => ErrorCode::CredentialsBadScheme,
			Self::CredentialsBadFormat => ErrorCode::CredentialsBadFormat,
			Self::InvalidToken { .. } => ErrorCode::InvalidToken,
			Self::RevokedToken => ErrorCode::RevokedToken,
		}
	}

	/// HTTP status code for authentication failures.
	pub fn status(&self) -> u16 {
		401
	}

	/// Builds a 401 response carrying the message as body and a `Bearer` challenge.
	pub fn to_response<B>(&self) -> Response<B>
	where
		B: From<String>,
	{
		let mut response = Response::new(B::from(self.to_string()));

		*response.status_mut() = StatusCode::UNAUTHORIZED;

		if let Ok(value) = HeaderValue::from_str(&format!("Bearer error=\"{}\"", self.code())) {
			response.headers_mut().insert(WWW_AUTHENTICATE, value);
		}

		response
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn codes_match_wire_labels() {
		assert_eq!(AuthError::CredentialsRequired.code().as_str(), "credentials_required");
		assert_eq!(AuthError::CredentialsBadScheme.code().as_str(), "credentials_bad_scheme");
		assert_eq!(AuthError::CredentialsBadFormat.code().as_str(), "credentials_bad_format");
		assert_eq!(AuthError::RevokedToken.code().as_str(), "revoked_token");
		assert_eq!(
			AuthError::invalid_token_message("jwt malformed").code().as_str(),
			"invalid_token"
		);

		let serialized = serde_json::to_string(&ErrorCode::CredentialsBadFormat)
			.expect("Error codes should serialize.");

		assert_eq!(serialized, "\"credentials_bad_format\"");
	}

	#[test]
	fn invalid_token_preserves_cause() {
		let cause = std::io::Error::other("signature mismatch");
		let err = AuthError::invalid_token(cause);

		assert_eq!(err.to_string(), "signature mismatch");

		let source = StdError::source(&err).expect("Invalid token errors should keep their cause.");

		assert_eq!(source.to_string(), "signature mismatch");
	}

	#[test]
	fn response_carries_status_and_challenge() {
		let response: Response<String> = AuthError::RevokedToken.to_response();

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(response.body(), "The token has been revoked.");
		assert_eq!(
			response.headers().get(WWW_AUTHENTICATE).and_then(|value| value.to_str().ok()),
			Some("Bearer error=\"revoked_token\""),
		);
	}
}
