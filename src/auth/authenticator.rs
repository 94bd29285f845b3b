//! Per-request authentication pipeline.
//!
//! [`Authenticator::authenticate`] walks the stages in a fixed order and stops at the first
//! failure:
//!
//! 1. CORS preflight requests announcing `authorization` pass through untouched.
//! 2. The bearer token is extracted from the `Authorization` header.
//! 3. The token is decoded structurally so secret callbacks can inspect it.
//! 4. The configured [`SecretSource`](crate::secret::SecretSource) produces key material.
//! 5. The [`TokenVerifier`] checks the signature and standard claims.
//! 6. The revocation check runs against the verified claims.
//!
//! Claims are only returned when every stage succeeded.

// self
use crate::{
	_prelude::*,
	auth::{self, AuthConfig, AuthError, AuthRequest, Claims},
	obs::{self, Stage, StageOutcome, StageSpan},
	verify::{JsonWebTokenVerifier, TokenVerifier, VerifyRequest},
};

/// Bearer token authenticator shared across requests.
pub struct Authenticator<V = JsonWebTokenVerifier>
where
	V: ?Sized,
{
	config: AuthConfig,
	verifier: Arc<V>,
}
impl Authenticator {
	/// Creates an authenticator using [`JsonWebTokenVerifier`].
	pub fn new(config: AuthConfig) -> Self {
		Self { config, verifier: Arc::new(JsonWebTokenVerifier) }
	}
}
impl<V> Authenticator<V>
where
	V: ?Sized + TokenVerifier,
{
	/// Creates an authenticator with a custom verification primitive.
	pub fn with_verifier(config: AuthConfig, verifier: Arc<V>) -> Self {
		Self { config, verifier }
	}

	/// Configuration the authenticator was built with.
	pub fn config(&self) -> &AuthConfig {
		&self.config
	}

	/// Authenticates `request`.
	///
	/// Returns `Ok(None)` for preflight requests and for requests without a credential when
	/// credentials are optional, `Ok(Some(claims))` for verified tokens, and an [`Error`]
	/// otherwise. Secret resolution failures surface as [`Error::Secret`]; every other failure
	/// is an [`Error::Unauthorized`].
	pub async fn authenticate(&self, request: &dyn AuthRequest) -> Result<Option<Claims>> {
		const STAGE: Stage = Stage::Authenticate;

		let span = StageSpan::new(STAGE, "authenticate");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.run(request)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn run(&self, request: &dyn AuthRequest) -> Result<Option<Claims>> {
		if auth::is_authorization_preflight(request) {
			return Ok(None);
		}

		let config = &self.config;
		let Some(token) = auth::token_from_request(
			request,
			config.credentials_required(),
			config.strict_format(),
		)?
		else {
			return if config.credentials_required() {
				Err(AuthError::CredentialsRequired.into())
			} else {
				Ok(None)
			};
		};
		let decoded = auth::decode_token(token)?;
		let secret = config.secret().resolve(request, &decoded).await?;
		let verify = VerifyRequest {
			algorithms: config.algorithms(),
			options: config.verify_options(),
		};
		let claims = self.verifier.verify(token, &secret, verify).await.map_err(|e| {
			obs::warn_failure(Stage::Authenticate, "Token verification failed.", &e);

			AuthError::invalid_token(e)
		})?;

		if config.revocation().is_revoked(request, &claims).await {
			return Err(AuthError::RevokedToken.into());
		}

		Ok(Some(claims))
	}
}
impl<V> Clone for Authenticator<V>
where
	V: ?Sized,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), verifier: self.verifier.clone() }
	}
}
impl<V> Debug for Authenticator<V>
where
	V: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator").field("config", &self.config).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::Algorithm;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::{ErrorCode, RequestParts, RevokedTokenIds},
		secret::{Secret, SecretError, SecretSource},
		verify::{VerifyError, VerifyFuture},
	};

	fn authenticator() -> Authenticator {
		let config = AuthConfig::builder()
			.secret(SecretSource::fixed(TEST_HMAC_SECRET))
			.algorithm(Algorithm::HS256)
			.build()
			.expect("Test configuration should build.");

		Authenticator::new(config)
	}

	fn unauthorized_code(err: Error) -> ErrorCode {
		match err {
			Error::Unauthorized(e) => e.code(),
			other => panic!("Expected an authentication failure, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn valid_token_yields_claims() {
		let token = mint_hs256(serde_json::json!({ "sub": "alice" }), None);
		let claims = authenticator()
			.authenticate(&bearer_request(&token))
			.await
			.expect("Valid token should authenticate.")
			.expect("Claims should be returned.");

		assert_eq!(claims.get("sub"), Some(&JsonValue::from("alice")));
	}

	#[tokio::test]
	async fn missing_credentials_follow_requirement() {
		let err = authenticator()
			.authenticate(&RequestParts::new("GET"))
			.await
			.expect_err("Credentials are required by default.");

		assert_eq!(unauthorized_code(err), ErrorCode::CredentialsRequired);

		let optional = Authenticator::new(
			AuthConfig::builder()
				.secret(SecretSource::fixed(TEST_HMAC_SECRET))
				.algorithm(Algorithm::HS256)
				.credentials_required(false)
				.build()
				.expect("Test configuration should build."),
		);

		assert!(matches!(optional.authenticate(&RequestParts::new("GET")).await, Ok(None)));
	}

	#[tokio::test]
	async fn preflight_bypasses_pipeline() {
		let request = RequestParts::new("OPTIONS")
			.with_header("access-control-request-headers", "content-type, authorization");

		assert!(matches!(authenticator().authenticate(&request).await, Ok(None)));
	}

	#[tokio::test]
	async fn malformed_header_and_token_are_rejected() {
		let bad_format = RequestParts::new("GET").with_header("authorization", "Bearer_bad");
		let err = authenticator().authenticate(&bad_format).await.expect_err("Bad format.");

		assert_eq!(unauthorized_code(err), ErrorCode::CredentialsBadFormat);

		let err = authenticator()
			.authenticate(&bearer_request("not-a-jwt"))
			.await
			.expect_err("Garbage tokens must fail.");

		assert_eq!(unauthorized_code(err), ErrorCode::InvalidToken);
	}

	#[tokio::test]
	async fn wrong_signature_is_invalid_token() {
		let token = mint_hs256(serde_json::json!({ "sub": "alice" }), Some("another-secret"));
		let err = authenticator()
			.authenticate(&bearer_request(&token))
			.await
			.expect_err("Foreign signatures must fail.");

		assert_eq!(unauthorized_code(err), ErrorCode::InvalidToken);
	}

	#[tokio::test]
	async fn revoked_tokens_are_rejected_after_verification() {
		let revoked = RevokedTokenIds::default();

		revoked.revoke("t-1");

		let authenticator = Authenticator::new(
			AuthConfig::builder()
				.secret(SecretSource::fixed(TEST_HMAC_SECRET))
				.algorithm(Algorithm::HS256)
				.is_revoked(revoked)
				.build()
				.expect("Test configuration should build."),
		);
		let token = mint_hs256(serde_json::json!({ "jti": "t-1" }), None);
		let err = authenticator
			.authenticate(&bearer_request(&token))
			.await
			.expect_err("Revoked tokens must fail.");

		assert_eq!(unauthorized_code(err), ErrorCode::RevokedToken);

		let forged = mint_hs256(serde_json::json!({ "jti": "t-1" }), Some("another-secret"));
		let err = authenticator
			.authenticate(&bearer_request(&forged))
			.await
			.expect_err("Forged tokens must fail before revocation.");

		assert_eq!(unauthorized_code(err), ErrorCode::InvalidToken);
	}

	#[tokio::test]
	async fn secret_callback_failures_surface_unchanged() {
		let authenticator = Authenticator::new(
			AuthConfig::builder()
				.secret(SecretSource::callback(|_: &dyn AuthRequest, _: &Claims| async {
					Err::<Secret, _>(SecretError::callback("tenant lookup failed"))
				}))
				.algorithm(Algorithm::HS256)
				.build()
				.expect("Test configuration should build."),
		);
		let token = mint_hs256(serde_json::json!({}), None);
		let err = authenticator
			.authenticate(&bearer_request(&token))
			.await
			.expect_err("Callback failures must propagate.");

		assert!(matches!(err, Error::Secret(SecretError::Callback { .. })));
		assert_eq!(err.status(), 500);
	}

	struct RejectAll;
	impl TokenVerifier for RejectAll {
		fn verify<'a>(
			&'a self,
			_: &'a str,
			_: &'a Secret,
			_: VerifyRequest<'a>,
		) -> VerifyFuture<'a> {
			Box::pin(async { Err::<Claims, _>(VerifyError::MissingSecret) })
		}
	}

	#[tokio::test]
	async fn custom_verifier_is_used() {
		let config = authenticator().config().clone();
		let authenticator = Authenticator::with_verifier(config, Arc::new(RejectAll));
		let token = mint_hs256(serde_json::json!({}), None);
		let err = authenticator
			.authenticate(&bearer_request(&token))
			.await
			.expect_err("Custom verifier rejects everything.");

		assert_eq!(err.to_string(), "A secret or public key must be provided.");
	}

	#[tokio::test]
	async fn dyn_verifier_is_supported() {
		let verifier: Arc<dyn TokenVerifier> = Arc::new(JsonWebTokenVerifier);
		let config = authenticator().config().clone();
		let authenticator = Authenticator::with_verifier(config, verifier);
		let token = mint_hs256(serde_json::json!({ "sub": "alice" }), None);

		assert!(authenticator.authenticate(&bearer_request(&token)).await.is_ok());
	}
}
