//! Scope admission configuration and evaluation.

// self
use crate::{
	_prelude::*,
	auth::Claims,
	authz::{ScopeError, ScopeSet, validate_scopes},
	error::ConfigError,
	obs::{self, Stage, StageOutcome, StageSpan},
};

const DEFAULT_SCOPE_KEY: &str = "scope";

/// Scope admission options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
	/// Claim holding the granted scopes; empty falls back to `scope`.
	pub scope_key: String,
	/// Require every expected scope instead of any one of them.
	pub check_all_scopes: bool,
}
impl AuthzConfig {
	/// Overrides the claim holding the granted scopes.
	pub fn with_scope_key(mut self, key: impl Into<String>) -> Self {
		self.scope_key = key.into();

		self
	}

	/// Requires every expected scope.
	pub fn with_check_all_scopes(mut self, check_all: bool) -> Self {
		self.check_all_scopes = check_all;

		self
	}

	/// Claim consulted for granted scopes.
	pub fn scope_key(&self) -> &str {
		if self.scope_key.is_empty() { DEFAULT_SCOPE_KEY } else { &self.scope_key }
	}
}
impl Default for AuthzConfig {
	fn default() -> Self {
		Self { scope_key: DEFAULT_SCOPE_KEY.into(), check_all_scopes: false }
	}
}

/// Decides whether verified claims grant an endpoint's expected scopes.
#[derive(Clone, Debug)]
pub struct ScopeAuthorizer {
	expected: Vec<String>,
	config: AuthzConfig,
}
impl ScopeAuthorizer {
	/// Creates an authorizer; rejects empty or whitespace-bearing expected scopes.
	pub fn new<I, S>(expected: I, config: AuthzConfig) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { expected: validate_scopes(expected)?, config })
	}

	/// Expected scopes in configuration order.
	pub fn expected_scopes(&self) -> &[String] {
		&self.expected
	}

	/// Admission options.
	pub fn config(&self) -> &AuthzConfig {
		&self.config
	}

	/// Admits or rejects `claims`.
	///
	/// An empty expectation admits everything, including a missing token.
	pub fn authorize(&self, claims: Option<&Claims>) -> Result<(), ScopeError> {
		const STAGE: Stage = Stage::Authorize;

		let _span = StageSpan::new(STAGE, "authorize").entered();

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = self.evaluate(claims);

		match &result {
			Ok(()) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(e) => {
				obs::warn_failure(STAGE, "Scope admission rejected the request.", e);
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);
			},
		}

		result
	}

	fn evaluate(&self, claims: Option<&Claims>) -> Result<(), ScopeError> {
		if self.expected.is_empty() {
			return Ok(());
		}

		let Some(claims) = claims else {
			return Err(ScopeError::missing_token(self.expected.clone()));
		};
		let Some(granted) = claims.get(self.config.scope_key()).and_then(ScopeSet::from_claim)
		else {
			return Err(ScopeError::insufficient_scope(self.expected.clone()));
		};
		let allowed = if self.config.check_all_scopes {
			self.expected.iter().all(|scope| granted.contains(scope))
		} else {
			self.expected.iter().any(|scope| granted.contains(scope))
		};

		if allowed { Ok(()) } else { Err(ScopeError::insufficient_scope(self.expected.clone())) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, authz::ScopeFailureReason};

	fn authorizer(expected: &[&str], config: AuthzConfig) -> ScopeAuthorizer {
		ScopeAuthorizer::new(expected.iter().copied(), config)
			.expect("Expected scopes should validate.")
	}

	#[test]
	fn empty_expectation_admits_everything() {
		let authorizer = authorizer(&[], AuthzConfig::default());

		assert!(authorizer.authorize(None).is_ok());
		assert!(authorizer.authorize(Some(&claims(serde_json::json!({})))).is_ok());
	}

	#[test]
	fn missing_claims_are_reported() {
		let err = authorizer(&["read:user"], AuthzConfig::default())
			.authorize(None)
			.expect_err("Missing claims must fail.");

		assert_eq!(err.reason, ScopeFailureReason::MissingToken);
		assert_eq!(err.expected_scopes, vec!["read:user".to_owned()]);
	}

	#[test]
	fn any_scope_suffices_by_default() {
		let authorizer = authorizer(&["read:user", "write:user"], AuthzConfig::default());

		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": "write:user" }))))
				.is_ok()
		);
		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": ["read:user"] }))))
				.is_ok()
		);

		let err = authorizer
			.authorize(Some(&claims(serde_json::json!({ "scope": "delete:user" }))))
			.expect_err("Unrelated scopes must fail.");

		assert_eq!(err.reason, ScopeFailureReason::InsufficientScope);
		assert_eq!(err.expected_scopes, vec!["read:user".to_owned(), "write:user".to_owned()]);
	}

	#[test]
	fn check_all_scopes_requires_every_scope() {
		let authorizer = authorizer(
			&["read:user", "write:user"],
			AuthzConfig::default().with_check_all_scopes(true),
		);

		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": "write:user read:user" }))))
				.is_ok()
		);
		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": "read:user" }))))
				.is_err()
		);
	}

	#[test]
	fn custom_scope_key_is_honored() {
		let authorizer =
			authorizer(&["read:user"], AuthzConfig::default().with_scope_key("permissions"));

		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "permissions": ["read:user"] }))))
				.is_ok()
		);
		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": "read:user" }))))
				.is_err()
		);
		assert_eq!(AuthzConfig::default().with_scope_key("").scope_key(), "scope");
	}

	#[test]
	fn unparseable_scope_claims_are_insufficient() {
		let authorizer = authorizer(&["read:user"], AuthzConfig::default());

		for value in [serde_json::json!({}), serde_json::json!({ "scope": 7 })] {
			let err = authorizer
				.authorize(Some(&claims(value)))
				.expect_err("Unparseable scope claims must fail.");

			assert_eq!(err.reason, ScopeFailureReason::InsufficientScope);
		}
	}

	#[test]
	fn malformed_array_entries_do_not_block_valid_ones() {
		let authorizer = authorizer(&["read:user"], AuthzConfig::default());

		for scope in [
			serde_json::json!(["read:user", ""]),
			serde_json::json!(["read:user", "write user"]),
			serde_json::json!(["read:user", 1]),
		] {
			assert!(
				authorizer.authorize(Some(&claims(serde_json::json!({ "scope": scope })))).is_ok()
			);
		}
		assert!(
			authorizer
				.authorize(Some(&claims(serde_json::json!({ "scope": ["", "read user"] }))))
				.is_err()
		);
	}

	#[test]
	fn invalid_expected_scopes_fail_construction() {
		let err = ScopeAuthorizer::new(["read user"], AuthzConfig::default())
			.expect_err("Whitespace-bearing scopes must be rejected.");

		assert!(matches!(err, ConfigError::InvalidScope(_)));
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: AuthzConfig = serde_json::from_value(serde_json::json!({
			"check_all_scopes": true
		}))
		.expect("Config should deserialize.");

		assert_eq!(config.scope_key(), "scope");
		assert!(config.check_all_scopes);
	}
}
