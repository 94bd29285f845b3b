//! Scope admission over verified claims.
//!
//! [`ScopeAuthorizer`] is stateless and runs after [`Authenticator`](crate::auth::Authenticator):
//! hand it the claims that authentication returned and it decides whether the token grants the
//! scopes an endpoint expects.

pub mod authorizer;
pub mod scope;

pub use authorizer::*;
pub use scope::*;

// crates.io
use http::{HeaderValue, Response, StatusCode, header::WWW_AUTHENTICATE};
// self
use crate::_prelude::*;

/// Why scope admission failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFailureReason {
	/// No claims were supplied.
	MissingToken,
	/// Claims do not carry the expected scopes.
	InsufficientScope,
}
impl ScopeFailureReason {
	/// Human-readable message.
	pub const fn message(self) -> &'static str {
		match self {
			Self::MissingToken => "User token missing",
			Self::InsufficientScope => "Insufficient scope",
		}
	}
}
impl Display for ScopeFailureReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.message())
	}
}

/// Authorization failure (HTTP 403) carrying the scopes the endpoint expects.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{reason}")]
pub struct ScopeError {
	/// Why admission failed.
	pub reason: ScopeFailureReason,
	/// Expected scopes in configuration order.
	pub expected_scopes: Vec<String>,
}
impl ScopeError {
	/// No claims were supplied.
	pub fn missing_token(expected_scopes: Vec<String>) -> Self {
		Self { reason: ScopeFailureReason::MissingToken, expected_scopes }
	}

	/// Claims do not carry the expected scopes.
	pub fn insufficient_scope(expected_scopes: Vec<String>) -> Self {
		Self { reason: ScopeFailureReason::InsufficientScope, expected_scopes }
	}

	/// HTTP status code for authorization failures.
	pub fn status(&self) -> u16 {
		403
	}

	/// `WWW-Authenticate` challenge value.
	pub fn www_authenticate(&self) -> String {
		format!("Bearer scope=\"{}\", error=\"{}\"", self.expected_scopes.join(" "), self.reason)
	}

	/// Builds a 403 response carrying the message as body and the challenge header.
	pub fn to_response<B>(&self) -> Response<B>
	where
		B: From<String>,
	{
		let mut response = Response::new(B::from(self.reason.message().to_owned()));

		*response.status_mut() = StatusCode::FORBIDDEN;

		if let Ok(value) = HeaderValue::from_str(&self.www_authenticate()) {
			response.headers_mut().insert(WWW_AUTHENTICATE, value);
		}

		response
	}
}
