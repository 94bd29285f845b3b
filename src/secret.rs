//! Key material and the interchangeable strategies that resolve it per request.
//!
//! [`SecretSource`] is chosen once at configuration time: a fixed [`Secret`], a
//! [`SecretCallback`] that sees the request and the unverified payload, or a
//! [`HeaderSecretCallback`] that additionally sees the token header (needed to pick a key by
//! `kid`/`alg`). The authenticator dispatches on the variant, never on a callable's shape.

pub mod key;
pub mod source;

pub use key::*;
pub use source::*;

// self
use crate::{_prelude::*, error::BoxError, jwks::KeySetError};

/// Failures raised while resolving key material.
#[derive(Debug, ThisError)]
pub enum SecretError {
	/// The token header declared an algorithm the resolver does not serve.
	#[error(
		"Unsupported token algorithm {}; accepted: {accepted}.",
		algorithm.as_deref().unwrap_or("<none>")
	)]
	UnsupportedAlgorithm {
		/// Algorithm found in the token header, if any.
		algorithm: Option<String>,
		/// Accepted algorithms, comma separated.
		accepted: String,
	},
	/// Remote key-set resolution failed.
	#[error(transparent)]
	KeySet(#[from] KeySetError),
	/// Caller-supplied resolution logic failed.
	#[error("Secret callback failed.")]
	Callback {
		/// Failure reported by the callback.
		#[source]
		source: BoxError,
	},
}
impl SecretError {
	/// Wraps a callback failure.
	pub fn callback(src: impl Into<BoxError>) -> Self {
		Self::Callback { source: src.into() }
	}

	/// HTTP status code the host should answer with.
	pub fn status(&self) -> u16 {
		match self {
			Self::UnsupportedAlgorithm { .. } => 401,
			Self::KeySet(e) => e.status(),
			Self::Callback { .. } => 500,
		}
	}
}
