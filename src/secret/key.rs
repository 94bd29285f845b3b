//! Redacted key material wrapper.

// crates.io
use jsonwebtoken::jwk::Jwk;
// self
use crate::_prelude::*;

/// Key material used to verify a token signature.
///
/// Shared secrets never appear in `Debug`/`Display` output.
#[derive(Clone, PartialEq)]
pub enum Secret {
	/// Shared secret bytes (HMAC algorithms).
	Shared(Arc<[u8]>),
	/// PEM encoded public key. HMAC algorithms use the PEM text itself as the shared secret.
	Pem(Arc<str>),
	/// JSON Web Key taken from a key set.
	Jwk(Box<Jwk>),
}
impl Secret {
	/// Wraps shared secret bytes.
	pub fn shared(value: impl AsRef<[u8]>) -> Self {
		Self::Shared(Arc::from(value.as_ref()))
	}

	/// Wraps a PEM encoded public key.
	pub fn pem(value: impl AsRef<str>) -> Self {
		Self::Pem(Arc::from(value.as_ref()))
	}

	/// Wraps a JSON Web Key.
	pub fn jwk(value: Jwk) -> Self {
		Self::Jwk(Box::new(value))
	}

	/// Secret that can never verify a token.
	pub fn empty() -> Self {
		Self::Shared(Arc::from(&[][..]))
	}

	/// Returns true when no key material is present.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Shared(bytes) => bytes.is_empty(),
			Self::Pem(pem) => pem.trim().is_empty(),
			Self::Jwk(_) => false,
		}
	}

	/// Key identifier carried by JWK material.
	pub fn key_id(&self) -> Option<&str> {
		match self {
			Self::Jwk(jwk) => jwk.common.key_id.as_deref(),
			_ => None,
		}
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::shared(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self::shared(value)
	}
}
impl From<Vec<u8>> for Secret {
	fn from(value: Vec<u8>) -> Self {
		Self::Shared(Arc::from(value))
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Shared(_) => f.debug_tuple("Secret::Shared").field(&"<redacted>").finish(),
			Self::Pem(_) => f.debug_tuple("Secret::Pem").field(&"<redacted>").finish(),
			Self::Jwk(jwk) => f.debug_tuple("Secret::Jwk").field(&jwk.common.key_id).finish(),
		}
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::from("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret::Shared(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn empty_secrets_are_detected() {
		assert!(Secret::empty().is_empty());
		assert!(Secret::from("").is_empty());
		assert!(Secret::pem("  \n").is_empty());
		assert!(!Secret::from("value").is_empty());
	}

	#[test]
	fn jwk_secret_exposes_key_id() {
		let jwk: Jwk = serde_json::from_value(serde_json::json!({
			"kty": "RSA",
			"kid": "primary",
			"n": "AQAB",
			"e": "AQAB"
		}))
		.expect("JWK fixture should deserialize.");
		let secret = Secret::jwk(jwk);

		assert_eq!(secret.key_id(), Some("primary"));
		assert!(!secret.is_empty());
		assert!(format!("{secret:?}").contains("primary"));
	}
}
