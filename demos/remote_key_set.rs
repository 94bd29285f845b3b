//! Demonstrates resolving RS256 signing keys from a (mocked) JWKS endpoint, reusing the cached
//! key across requests, and rejecting tokens signed with other algorithms before any fetch.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use bearer_guard::{
	auth::{AuthConfig, Authenticator, RequestParts},
	jsonwebtoken::{self, Algorithm, EncodingKey, Header},
	jwks::{JwksSecretProvider, KeySetOptions},
	url::Url,
};

const JWKS: &str = include_str!("../tests/fixtures/jwks.json");
const RSA_PRIVATE_PEM: &str = include_str!("../tests/fixtures/rsa_private.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let jwks_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/jwks.json");
			then.status(200).header("content-type", "application/json").body(JWKS);
		})
		.await;
	let provider = JwksSecretProvider::new(
		KeySetOptions::new(Url::parse(&server.url("/.well-known/jwks.json"))?)
			.with_cache_max_age_secs(300)
			.with_rate_limit(10),
	)?;
	let authenticator = Authenticator::new(
		AuthConfig::builder().secret(provider.clone()).algorithm(Algorithm::RS256).build()?,
	);
	let mut header = Header::new(Algorithm::RS256);

	header.kid = Some("primary".into());

	let token = jsonwebtoken::encode(
		&header,
		&serde_json::json!({ "sub": "billing-service" }),
		&EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes())?,
	)?;
	let request = RequestParts::new("GET").with_header("authorization", format!("Bearer {token}"));

	for attempt in 1..=3 {
		let claims = authenticator.authenticate(&request).await?;

		println!("Attempt {attempt}: {:?}.", claims.as_ref().and_then(|claims| claims.get("sub")));
	}

	jwks_mock.assert_calls_async(1).await;

	let metrics = provider.client().metrics();

	println!("Fetches: {}, cache hits: {}.", metrics.fetches(), metrics.cache_hits());

	let hs256 = jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		&serde_json::json!({ "sub": "intruder" }),
		&EncodingKey::from_secret(b"guessed"),
	)?;
	let forged = RequestParts::new("GET").with_header("authorization", format!("Bearer {hs256}"));

	if let Err(e) = authenticator.authenticate(&forged).await {
		println!("Rejected before fetching: {e}");
	}

	Ok(())
}
