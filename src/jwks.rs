//! Remote JSON Web Key Set resolution.
//!
//! [`RemoteKeySetClient`] resolves signing keys by `kid` from a JWKS endpoint. Keys are cached
//! in memory (FIFO eviction, bounded age), concurrent misses for one `kid` share a single fetch,
//! and an optional [`RateLimitPolicy`] throttles requests that reach the endpoint.
//! [`JwksSecretProvider`] adapts the client into a header-aware
//! [`SecretSource`](crate::secret::SecretSource).

pub mod cache;
pub mod client;
pub mod fetch;
pub mod metrics;
pub mod provider;
pub mod rate_limit;

pub use cache::*;
pub use client::*;
pub use fetch::*;
pub use metrics::*;
pub use provider::*;
pub use rate_limit::*;

// self
use crate::{_prelude::*, error::TransportError};

/// Failures raised while resolving a key from a remote key set.
#[derive(Debug, ThisError)]
pub enum KeySetError {
	/// No signing key matches the requested `kid`.
	#[error("Unable to find a signing key that matches `{}`.", kid.as_deref().unwrap_or("<none>"))]
	SigningKeyNotFound {
		/// Requested key identifier.
		kid: Option<String>,
	},
	/// The document holds no usable signing keys.
	#[error("The key set endpoint did not return any signing keys.")]
	NoSigningKeys,
	/// The rate limit policy refused to contact the endpoint.
	#[error("Too many requests to the key set endpoint; retry after {retry_after}.")]
	RateLimited {
		/// Suggested delay before retrying.
		retry_after: Duration,
	},
	/// The endpoint answered with a non-success status.
	#[error("Key set endpoint returned HTTP {status}.")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint, when provided.
		retry_after: Option<Duration>,
	},
	/// The document is not a valid key set.
	#[error("Key set document could not be parsed.")]
	Parse {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Network or IO failure while calling the endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl KeySetError {
	/// HTTP status code the host should answer with.
	pub fn status(&self) -> u16 {
		match self {
			Self::SigningKeyNotFound { .. } => 401,
			Self::RateLimited { .. } => 503,
			Self::NoSigningKeys
			| Self::Http { .. }
			| Self::Parse { .. }
			| Self::Transport(_) => 502,
		}
	}
}

/// Remote key set options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetOptions {
	/// JWKS endpoint.
	pub endpoint_uri: Url,
	/// Cache resolved keys.
	#[serde(default = "defaults::cache")]
	pub cache: bool,
	/// Maximum number of cached keys.
	#[serde(default = "defaults::cache_max_entries")]
	pub cache_max_entries: usize,
	/// Maximum age of a cached key in seconds.
	#[serde(default = "defaults::cache_max_age_secs")]
	pub cache_max_age_secs: u64,
	/// Throttle requests that reach the endpoint.
	#[serde(default)]
	pub rate_limit: bool,
	/// Requests per minute allowed when rate limiting.
	#[serde(default = "defaults::requests_per_minute")]
	pub requests_per_minute: u32,
	/// Request timeout in seconds.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	/// Proxy used for endpoint requests.
	#[serde(default)]
	pub proxy: Option<Url>,
	/// Verify the endpoint's TLS certificate.
	#[serde(default = "defaults::strict_ssl")]
	pub strict_ssl: bool,
	/// Extra headers sent with every endpoint request.
	#[serde(default)]
	pub request_headers: BTreeMap<String, String>,
}
impl KeySetOptions {
	/// Creates options for `endpoint_uri` with default cache and rate limit settings.
	pub fn new(endpoint_uri: Url) -> Self {
		Self {
			endpoint_uri,
			cache: defaults::cache(),
			cache_max_entries: defaults::cache_max_entries(),
			cache_max_age_secs: defaults::cache_max_age_secs(),
			rate_limit: false,
			requests_per_minute: defaults::requests_per_minute(),
			timeout_secs: None,
			proxy: None,
			strict_ssl: defaults::strict_ssl(),
			request_headers: BTreeMap::new(),
		}
	}

	/// Enables or disables the key cache.
	pub fn with_cache(mut self, cache: bool) -> Self {
		self.cache = cache;

		self
	}

	/// Sets the maximum number of cached keys.
	pub fn with_cache_max_entries(mut self, entries: usize) -> Self {
		self.cache_max_entries = entries;

		self
	}

	/// Sets the maximum age of a cached key in seconds.
	pub fn with_cache_max_age_secs(mut self, seconds: u64) -> Self {
		self.cache_max_age_secs = seconds;

		self
	}

	/// Enables rate limiting at `requests_per_minute`.
	pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
		self.rate_limit = true;
		self.requests_per_minute = requests_per_minute;

		self
	}

	/// Sets the request timeout in seconds.
	pub fn with_timeout_secs(mut self, seconds: u64) -> Self {
		self.timeout_secs = Some(seconds);

		self
	}

	/// Routes endpoint requests through `proxy`.
	pub fn with_proxy(mut self, proxy: Url) -> Self {
		self.proxy = Some(proxy);

		self
	}

	/// Controls TLS certificate verification.
	pub fn with_strict_ssl(mut self, strict: bool) -> Self {
		self.strict_ssl = strict;

		self
	}

	/// Adds a header sent with every endpoint request.
	pub fn with_request_header(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.request_headers.insert(name.into(), value.into());

		self
	}

	/// Maximum age of a cached key.
	pub fn cache_max_age(&self) -> Duration {
		Duration::seconds(i64::try_from(self.cache_max_age_secs).unwrap_or(i64::MAX))
	}
}

mod defaults {
	pub(super) fn cache() -> bool {
		true
	}

	pub(super) fn cache_max_entries() -> usize {
		5
	}

	pub(super) fn cache_max_age_secs() -> u64 {
		600
	}

	pub(super) fn requests_per_minute() -> u32 {
		10
	}

	pub(super) fn strict_ssl() -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn options_deserialize_with_defaults() {
		let options: KeySetOptions = serde_json::from_value(serde_json::json!({
			"endpoint_uri": "https://issuer.example/.well-known/jwks.json"
		}))
		.expect("Minimal options should deserialize.");

		assert_eq!(
			options,
			KeySetOptions::new(
				Url::parse("https://issuer.example/.well-known/jwks.json")
					.expect("Fixture URL should parse.")
			)
		);
		assert!(options.cache);
		assert_eq!(options.cache_max_entries, 5);
		assert_eq!(options.cache_max_age(), Duration::minutes(10));
		assert!(!options.rate_limit);
		assert_eq!(options.requests_per_minute, 10);
		assert!(options.strict_ssl);
	}

	#[test]
	fn status_separates_unknown_keys_from_upstream_failures() {
		assert_eq!(KeySetError::SigningKeyNotFound { kid: Some("a".into()) }.status(), 401);
		assert_eq!(KeySetError::RateLimited { retry_after: Duration::seconds(6) }.status(), 503);
		assert_eq!(KeySetError::Http { status: 500, retry_after: None }.status(), 502);
		assert_eq!(KeySetError::NoSigningKeys.status(), 502);
	}
}
