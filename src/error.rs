//! Crate-level error types shared across the authenticator, authorizer, and key-set client.

// self
use crate::{_prelude::*, auth::AuthError, authz::ScopeError, secret::SecretError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used when wrapping foreign failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Authentication failed; respond with HTTP 401.
	#[error(transparent)]
	Unauthorized(#[from] AuthError),
	/// Authorization failed; respond with HTTP 403 and a `WWW-Authenticate` challenge.
	#[error(transparent)]
	Forbidden(#[from] ScopeError),
	/// Secret resolution failed for reasons other than an unknown signing key.
	#[error(transparent)]
	Secret(#[from] SecretError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// HTTP status code the host should answer with.
	pub fn status(&self) -> u16 {
		match self {
			Self::Unauthorized(e) => e.status(),
			Self::Forbidden(e) => e.status(),
			Self::Secret(e) => e.status(),
			Self::Config(_) => 500,
		}
	}
}

/// Configuration and validation failures raised while building guards.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No secret source was configured.
	#[error("A secret source must be configured.")]
	MissingSecret,
	/// No accepted algorithms were configured.
	#[error("At least one accepted algorithm must be configured.")]
	MissingAlgorithms,
	/// Expected scopes cannot be normalized.
	#[error("Expected scopes are invalid.")]
	InvalidScope(#[from] crate::authz::ScopeValidationError),
	/// Key-set endpoint cannot be used.
	#[error("Key set endpoint `{endpoint}` is invalid: {reason}.")]
	InvalidEndpoint {
		/// Endpoint as configured.
		endpoint: String,
		/// Why the endpoint was rejected.
		reason: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configured request header is not a valid HTTP header.
	#[error("Request header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as configured.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO) raised while fetching key sets.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the key set endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the key set endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_follows_failure_class() {
		let unauthorized: Error = AuthError::CredentialsRequired.into();
		let forbidden: Error = ScopeError::insufficient_scope(vec!["read:user".into()]).into();
		let config: Error = ConfigError::MissingSecret.into();

		assert_eq!(unauthorized.status(), 401);
		assert_eq!(forbidden.status(), 403);
		assert_eq!(config.status(), 500);
	}

	#[test]
	fn transport_error_keeps_source() {
		let io = std::io::Error::other("connection reset");
		let err = TransportError::network(io);
		let source = StdError::source(&err)
			.expect("Network transport errors should expose the underlying cause.");

		assert_eq!(source.to_string(), "connection reset");
	}
}
