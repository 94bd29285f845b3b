//! Demonstrates authenticating an `http::Request` with a shared HMAC secret, rejecting a revoked
//! token, and admitting the verified claims by scope.

// crates.io
use color_eyre::Result;
// self
use bearer_guard::{
	auth::{AuthConfig, Authenticator, RevokedTokenIds},
	authz::{AuthzConfig, ScopeAuthorizer},
	jsonwebtoken::{self, Algorithm, EncodingKey, Header},
	secret::SecretSource,
	verify::VerifyOptions,
};

const SECRET: &str = "demo-shared-secret";

fn mint(claims: serde_json::Value) -> Result<String> {
	Ok(jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		&claims,
		&EncodingKey::from_secret(SECRET.as_bytes()),
	)?)
}

fn request(token: &str) -> Result<http::Request<()>> {
	Ok(http::Request::builder()
		.method("GET")
		.uri("/reports")
		.header("authorization", format!("Bearer {token}"))
		.body(())?)
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let revoked = RevokedTokenIds::default();
	let authenticator = Authenticator::new(
		AuthConfig::builder()
			.secret(SecretSource::fixed(SECRET))
			.algorithm(Algorithm::HS256)
			.verify_options(VerifyOptions::default().with_issuer("https://auth.demo"))
			.is_revoked(revoked.clone())
			.build()?,
	);
	let authorizer = ScopeAuthorizer::new(["reports:read"], AuthzConfig::default())?;
	let token = mint(serde_json::json!({
		"iss": "https://auth.demo",
		"sub": "analyst",
		"jti": "session-1",
		"scope": "reports:read reports:export",
	}))?;
	let claims = authenticator.authenticate(&request(&token)?).await?;

	authorizer.authorize(claims.as_ref())?;

	println!("Admitted subject: {:?}.", claims.as_ref().and_then(|claims| claims.get("sub")));

	revoked.revoke("session-1");

	match authenticator.authenticate(&request(&token)?).await {
		Ok(_) => println!("Unexpectedly admitted a revoked token."),
		Err(e) => println!("Rejected with HTTP {}: {e}.", e.status()),
	}

	Ok(())
}
