// crates.io
use bearer_guard::{
	_preludet::*,
	authz::{AuthzConfig, ScopeAuthorizer, ScopeFailureReason},
	error::ConfigError,
};

fn authorizer(expected: &[&str], check_all_scopes: bool) -> ScopeAuthorizer {
	ScopeAuthorizer::new(
		expected.iter().copied(),
		AuthzConfig::default().with_check_all_scopes(check_all_scopes),
	)
	.expect("Expected scopes should validate.")
}

#[test]
fn empty_expectation_passes_without_claims() {
	assert!(authorizer(&[], false).authorize(None).is_ok());
	assert!(
		authorizer(&[], true).authorize(Some(&claims(serde_json::json!({ "scope": 3 })))).is_ok()
	);
}

#[test]
fn any_mode_attaches_full_expected_list() {
	let authorizer = authorizer(&["read:user"], false);

	assert!(
		authorizer
			.authorize(Some(&claims(serde_json::json!({ "scope": "read:user write:user" }))))
			.is_ok()
	);

	let err = authorizer
		.authorize(Some(&claims(serde_json::json!({ "scope": "write:user" }))))
		.expect_err("Missing scope must fail.");

	assert_eq!(err.reason, ScopeFailureReason::InsufficientScope);
	assert_eq!(err.expected_scopes, vec!["read:user".to_owned()]);
	assert_eq!(
		err.www_authenticate(),
		"Bearer scope=\"read:user\", error=\"Insufficient scope\""
	);
}

#[test]
fn all_mode_requires_every_scope() {
	let authorizer = authorizer(&["a", "b"], true);

	assert!(authorizer.authorize(Some(&claims(serde_json::json!({ "scope": ["a"] })))).is_err());
	assert!(
		authorizer
			.authorize(Some(&claims(serde_json::json!({ "scope": ["a", "b", "c"] }))))
			.is_ok()
	);
}

#[test]
fn array_claims_match_entries_verbatim() {
	let authorizer = authorizer(&["read:user"], false);

	for scope in
		[serde_json::json!(["read:user", ""]), serde_json::json!(["read:user", "write user"])]
	{
		assert!(authorizer.authorize(Some(&claims(serde_json::json!({ "scope": scope })))).is_ok());
	}
}

#[test]
fn missing_claims_are_forbidden() {
	let err = authorizer(&["read:user", "write:user"], false)
		.authorize(None)
		.expect_err("Missing claims must fail.");
	let response: http::Response<String> = err.to_response();

	assert_eq!(err.reason, ScopeFailureReason::MissingToken);
	assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
	assert_eq!(response.body(), "User token missing");
	assert_eq!(
		response
			.headers()
			.get(http::header::WWW_AUTHENTICATE)
			.and_then(|value| value.to_str().ok()),
		Some("Bearer scope=\"read:user write:user\", error=\"User token missing\"")
	);
}

#[test]
fn malformed_expected_scopes_are_configuration_errors() {
	for expected in [vec![""], vec!["read user"]] {
		let err = ScopeAuthorizer::new(expected, AuthzConfig::default())
			.expect_err("Malformed scopes must be rejected.");

		assert!(matches!(err, ConfigError::InvalidScope(_)));
	}
}
