//! Key set document model and the transport seam used to download it.

// crates.io
use jsonwebtoken::jwk::Jwk;
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, jwks::KeySetError};
#[cfg(feature = "reqwest")]
use crate::{
	error::{ConfigError, TransportError},
	jwks::KeySetOptions,
};

/// Boxed future returned by [`KeySetFetcher::fetch`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<KeySetDocument, KeySetError>> + 'a + Send>>;

/// Downloads key set documents.
///
/// Implementations map non-success responses to [`KeySetError::Http`] and network failures to
/// [`KeySetError::Transport`] so callers can tell them apart from unknown keys.
pub trait KeySetFetcher
where
	Self: Send + Sync,
{
	/// Fetches the document published at `endpoint`.
	fn fetch<'a>(&'a self, endpoint: &'a Url) -> FetchFuture<'a>;
}

/// Raw JWKS document (`{"keys": [...]}`).
///
/// Keys stay as raw JSON so one malformed entry does not invalidate the rest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySetDocument {
	/// Published keys.
	pub keys: Vec<JsonValue>,
}
impl KeySetDocument {
	/// Parses a document body.
	pub fn parse(body: &[u8]) -> Result<Self, KeySetError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| KeySetError::Parse { source })
	}

	/// Keys usable for signature verification.
	///
	/// A key qualifies when its `use` is absent or `sig`, it carries a `kid`, and it parses as
	/// a JWK.
	pub fn signing_keys(&self) -> Vec<Jwk> {
		self.keys
			.iter()
			.filter(|key| key.get("use").is_none_or(|usage| usage.as_str() == Some("sig")))
			.filter_map(|key| serde_json::from_value::<Jwk>(key.clone()).ok())
			.filter(|jwk| jwk.common.key_id.is_some())
			.collect()
	}

	/// Selects the signing key for `kid`.
	///
	/// Without a `kid`, a document holding exactly one signing key yields that key.
	pub fn find(&self, kid: Option<&str>) -> Result<Jwk, KeySetError> {
		let mut keys = self.signing_keys();

		if keys.is_empty() {
			return Err(KeySetError::NoSigningKeys);
		}

		let position = match kid {
			Some(kid) => keys.iter().position(|jwk| jwk.common.key_id.as_deref() == Some(kid)),
			None if keys.len() == 1 => Some(0),
			None => None,
		};

		position
			.map(|index| keys.swap_remove(index))
			.ok_or_else(|| KeySetError::SigningKeyNotFound { kid: kid.map(str::to_owned) })
	}
}

/// [`KeySetFetcher`] backed by reqwest.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestKeySetFetcher(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestKeySetFetcher {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout, proxy, TLS, and header options.
	pub fn from_options(options: &KeySetOptions) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().danger_accept_invalid_certs(!options.strict_ssl);

		if let Some(seconds) = options.timeout_secs {
			builder = builder.timeout(std::time::Duration::from_secs(seconds));
		}
		if let Some(proxy) = &options.proxy {
			builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
		}

		let mut headers = HeaderMap::new();

		for (name, value) in &options.request_headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		Ok(Self(builder.default_headers(headers).build()?))
	}
}
#[cfg(feature = "reqwest")]
impl KeySetFetcher for ReqwestKeySetFetcher {
	fn fetch<'a>(&'a self, endpoint: &'a Url) -> FetchFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(endpoint.clone())
				.header(ACCEPT, "application/json")
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();

			if !status.is_success() {
				return Err(KeySetError::Http {
					status: status.as_u16(),
					retry_after: parse_retry_after(response.headers()),
				});
			}

			let body = response.bytes().await.map_err(TransportError::from)?;

			KeySetDocument::parse(&body)
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
