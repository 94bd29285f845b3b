//! Signature and claim verification behind the [`TokenVerifier`] capability.
//!
//! The default [`JsonWebTokenVerifier`] delegates signature checks to `jsonwebtoken` and layers
//! `max_age` enforcement on top. Hosts with their own primitive implement [`TokenVerifier`] and
//! hand it to [`Authenticator::with_verifier`](crate::auth::Authenticator::with_verifier).

// std
use std::collections::HashSet;
// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::Error as JwtError};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, auth::Claims, secret::Secret};

/// Boxed future returned by [`TokenVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<Claims, VerifyError>> + 'a + Send>>;

/// Failures raised while verifying a token.
#[derive(Debug, ThisError)]
pub enum VerifyError {
	/// Resolved key material was empty.
	#[error("A secret or public key must be provided.")]
	MissingSecret,
	/// Header algorithm is not in the accepted list.
	#[error("Token algorithm {algorithm:?} is not accepted.")]
	AlgorithmNotAccepted {
		/// Algorithm declared by the token.
		algorithm: Algorithm,
	},
	/// Key material cannot be used with the token's algorithm.
	#[error("Key material is not valid for {algorithm:?}.")]
	InvalidKey {
		/// Algorithm declared by the token.
		algorithm: Algorithm,
		/// Key parsing failure.
		#[source]
		source: JwtError,
	},
	/// Token is older than the configured maximum age.
	#[error("Token exceeds the maximum age of {max_age} seconds.")]
	MaxAgeExceeded {
		/// Configured maximum age in seconds.
		max_age: u64,
	},
	/// `max_age` is configured but the token carries no `iat`.
	#[error("The iat claim is required when a maximum age is configured.")]
	MissingIssuedAt,
	/// Signature or standard claim validation failed.
	#[error(transparent)]
	Jwt(#[from] JwtError),
}

/// Claim validation options; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
	/// Accepted `iss` values; empty accepts any issuer.
	#[serde(deserialize_with = "one_or_many")]
	pub issuer: Vec<String>,
	/// Accepted `aud` values; empty skips the audience check.
	#[serde(deserialize_with = "one_or_many")]
	pub audience: Vec<String>,
	/// Required `sub` value.
	pub subject: Option<String>,
	/// Leeway in seconds applied to `exp`, `nbf`, and `max_age`.
	pub clock_tolerance: u64,
	/// Maximum token age in seconds, measured from `iat`.
	pub max_age: Option<u64>,
	/// Accept expired tokens.
	pub ignore_expiration: bool,
	/// Accept tokens before their `nbf`.
	pub ignore_not_before: bool,
	/// Registered claims that must be present (e.g. `exp`, `iss`).
	pub required_claims: Vec<String>,
}
impl VerifyOptions {
	/// Adds an accepted issuer.
	pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer.push(issuer.into());

		self
	}

	/// Adds an accepted audience.
	pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
		self.audience.push(audience.into());

		self
	}

	/// Requires a specific subject.
	pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());

		self
	}

	/// Sets the clock tolerance in seconds.
	pub fn with_clock_tolerance(mut self, seconds: u64) -> Self {
		self.clock_tolerance = seconds;

		self
	}

	/// Sets the maximum token age in seconds.
	pub fn with_max_age(mut self, seconds: u64) -> Self {
		self.max_age = Some(seconds);

		self
	}

	/// Skips the `exp` check.
	pub fn with_ignore_expiration(mut self, ignore: bool) -> Self {
		self.ignore_expiration = ignore;

		self
	}

	/// Skips the `nbf` check.
	pub fn with_ignore_not_before(mut self, ignore: bool) -> Self {
		self.ignore_not_before = ignore;

		self
	}

	/// Requires a registered claim to be present.
	pub fn with_required_claim(mut self, claim: impl Into<String>) -> Self {
		self.required_claims.push(claim.into());

		self
	}

	fn validation(&self, algorithm: Algorithm) -> Validation {
		let mut validation = Validation::new(algorithm);

		validation.algorithms = vec![algorithm];
		validation.leeway = self.clock_tolerance;
		validation.validate_exp = !self.ignore_expiration;
		validation.validate_nbf = !self.ignore_not_before;
		validation.sub = self.subject.clone();

		// A configured check fails when its claim is absent.
		let mut required = self.required_claims.iter().cloned().collect::<HashSet<_>>();

		if !self.issuer.is_empty() {
			required.insert("iss".into());
		}
		if !self.audience.is_empty() {
			required.insert("aud".into());
		}
		if self.subject.is_some() {
			required.insert("sub".into());
		}

		validation.required_spec_claims = required;

		if self.audience.is_empty() {
			validation.validate_aud = false;
		} else {
			validation.set_audience(&self.audience);
		}
		if !self.issuer.is_empty() {
			validation.set_issuer(&self.issuer);
		}

		validation
	}
}

/// Per-call verification inputs taken from the authenticator configuration.
#[derive(Clone, Copy, Debug)]
pub struct VerifyRequest<'a> {
	/// Accepted algorithms.
	pub algorithms: &'a [Algorithm],
	/// Claim validation options.
	pub options: &'a VerifyOptions,
}

/// Signature verification primitive.
pub trait TokenVerifier
where
	Self: Send + Sync,
{
	/// Verifies `token` against `secret` and returns its claims.
	fn verify<'a>(
		&'a self,
		token: &'a str,
		secret: &'a Secret,
		request: VerifyRequest<'a>,
	) -> VerifyFuture<'a>;
}

/// [`TokenVerifier`] backed by the `jsonwebtoken` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonWebTokenVerifier;
impl JsonWebTokenVerifier {
	/// Verifies `token`, evaluating `max_age` against `now`.
	///
	/// `exp` and `nbf` are evaluated by `jsonwebtoken` against the system clock.
	pub fn verify_at(
		&self,
		token: &str,
		secret: &Secret,
		request: VerifyRequest<'_>,
		now: OffsetDateTime,
	) -> Result<Claims, VerifyError> {
		if secret.is_empty() {
			return Err(VerifyError::MissingSecret);
		}

		let algorithm = jsonwebtoken::decode_header(token)?.alg;

		if !request.algorithms.contains(&algorithm) {
			return Err(VerifyError::AlgorithmNotAccepted { algorithm });
		}

		let key = decoding_key(secret, algorithm)?;
		let validation = request.options.validation(algorithm);
		let claims = jsonwebtoken::decode::<Claims>(token, &key, &validation)?.claims;

		check_max_age(&claims, request.options, now)?;

		Ok(claims)
	}
}
impl TokenVerifier for JsonWebTokenVerifier {
	fn verify<'a>(
		&'a self,
		token: &'a str,
		secret: &'a Secret,
		request: VerifyRequest<'a>,
	) -> VerifyFuture<'a> {
		let result = self.verify_at(token, secret, request, OffsetDateTime::now_utc());

		Box::pin(async move { result })
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyFamily {
	Hmac,
	Rsa,
	Ec,
	Ed,
}
impl From<Algorithm> for KeyFamily {
	fn from(value: Algorithm) -> Self {
		match value {
			Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
			Algorithm::RS256
			| Algorithm::RS384
			| Algorithm::RS512
			| Algorithm::PS256
			| Algorithm::PS384
			| Algorithm::PS512 => Self::Rsa,
			Algorithm::ES256 | Algorithm::ES384 => Self::Ec,
			Algorithm::EdDSA => Self::Ed,
		}
	}
}

fn decoding_key(secret: &Secret, algorithm: Algorithm) -> Result<DecodingKey, VerifyError> {
	let material = match secret {
		Secret::Jwk(jwk) =>
			return DecodingKey::from_jwk(jwk)
				.map_err(|source| VerifyError::InvalidKey { algorithm, source }),
		Secret::Shared(bytes) => bytes.as_ref(),
		Secret::Pem(pem) => pem.as_bytes(),
	};
	let key = match KeyFamily::from(algorithm) {
		KeyFamily::Hmac => Ok(DecodingKey::from_secret(material)),
		KeyFamily::Rsa => DecodingKey::from_rsa_pem(material),
		KeyFamily::Ec => DecodingKey::from_ec_pem(material),
		KeyFamily::Ed => DecodingKey::from_ed_pem(material),
	};

	key.map_err(|source| VerifyError::InvalidKey { algorithm, source })
}

fn check_max_age(
	claims: &Claims,
	options: &VerifyOptions,
	now: OffsetDateTime,
) -> Result<(), VerifyError> {
	let Some(max_age) = options.max_age else {
		return Ok(());
	};
	let issued_at = claims
		.get("iat")
		.and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|secs| secs as i64)))
		.ok_or(VerifyError::MissingIssuedAt)?;
	let deadline = issued_at
		.saturating_add(max_age as i64)
		.saturating_add(options.clock_tolerance as i64);

	if now.unix_timestamp() >= deadline {
		return Err(VerifyError::MaxAgeExceeded { max_age });
	}

	Ok(())
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(String),
		Many(Vec<String>),
	}

	match Option::<OneOrMany>::deserialize(deserializer)? {
		None => Ok(Vec::new()),
		Some(OneOrMany::One(value)) if value.is_empty() =>
			Err(DeError::custom("expected a non-empty string")),
		Some(OneOrMany::One(value)) => Ok(vec![value]),
		Some(OneOrMany::Many(values)) => Ok(values),
	}
}
