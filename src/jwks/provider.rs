//! Header-aware secret source backed by a remote key set.

// std
use std::str::FromStr;
// crates.io
use jsonwebtoken::Algorithm;
// self
use crate::{
	_prelude::*,
	auth::{AuthRequest, Claims},
	jwks::{KeySetError, RemoteKeySetClient},
	secret::{HeaderSecretCallback, Secret, SecretError, SecretFuture, SecretSource},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, jwks::KeySetOptions};

/// Decides what a key resolution failure means for the request.
///
/// Closures of the shape `Fn(KeySetError) -> Result<Secret, SecretError>` implement the trait
/// automatically.
pub trait SigningKeyErrorHandler
where
	Self: Send + Sync,
{
	/// Maps `error` to a fallback secret or a secret resolution failure.
	fn on_signing_key_error(&self, error: KeySetError) -> Result<Secret, SecretError>;
}
impl<F> SigningKeyErrorHandler for F
where
	F: Send + Sync + Fn(KeySetError) -> Result<Secret, SecretError>,
{
	fn on_signing_key_error(&self, error: KeySetError) -> Result<Secret, SecretError> {
		self(error)
	}
}

/// Treats an unknown `kid` as an unverifiable token and propagates every other failure.
///
/// The empty secret it returns makes verification fail, so the request ends as an invalid
/// token rather than a server error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSigningKeyErrorHandler;
impl SigningKeyErrorHandler for DefaultSigningKeyErrorHandler {
	fn on_signing_key_error(&self, error: KeySetError) -> Result<Secret, SecretError> {
		match error {
			KeySetError::SigningKeyNotFound { .. } => Ok(Secret::empty()),
			other => Err(other.into()),
		}
	}
}

/// Resolves secrets by the token header's `kid` from a remote key set.
///
/// Only tokens whose header `alg` is accepted (RS256 by default) reach the endpoint; anything
/// else fails with [`SecretError::UnsupportedAlgorithm`] up front.
#[derive(Clone)]
pub struct JwksSecretProvider {
	client: RemoteKeySetClient,
	algorithms: Vec<Algorithm>,
	error_handler: Arc<dyn SigningKeyErrorHandler>,
}
impl JwksSecretProvider {
	/// Creates a provider with a reqwest-backed client.
	#[cfg(feature = "reqwest")]
	pub fn new(options: KeySetOptions) -> Result<Self, ConfigError> {
		Ok(Self::with_client(RemoteKeySetClient::new(options)?))
	}

	/// Creates a provider around an existing client.
	pub fn with_client(client: RemoteKeySetClient) -> Self {
		Self {
			client,
			algorithms: vec![Algorithm::RS256],
			error_handler: Arc::new(DefaultSigningKeyErrorHandler),
		}
	}

	/// Replaces the accepted header algorithms; an empty list keeps the current ones.
	pub fn with_algorithms<I>(mut self, algorithms: I) -> Self
	where
		I: IntoIterator<Item = Algorithm>,
	{
		let algorithms = algorithms.into_iter().collect::<Vec<_>>();

		if !algorithms.is_empty() {
			self.algorithms = algorithms;
		}

		self
	}

	/// Replaces the signing key error handler.
	pub fn with_signing_key_error_handler(
		mut self,
		handler: impl 'static + SigningKeyErrorHandler,
	) -> Self {
		self.error_handler = Arc::new(handler);

		self
	}

	/// Underlying key set client.
	pub fn client(&self) -> &RemoteKeySetClient {
		&self.client
	}

	/// Accepted header algorithms.
	pub fn algorithms(&self) -> &[Algorithm] {
		&self.algorithms
	}

	/// Resolves the secret for a token header.
	pub async fn provide(
		&self,
		header: &JsonMap<String, JsonValue>,
	) -> Result<Secret, SecretError> {
		let declared = header.get("alg").and_then(JsonValue::as_str);

		if !declared
			.and_then(|alg| Algorithm::from_str(alg).ok())
			.is_some_and(|alg| self.algorithms.contains(&alg))
		{
			return Err(SecretError::UnsupportedAlgorithm {
				algorithm: declared.map(str::to_owned),
				accepted: self
					.algorithms
					.iter()
					.map(|alg| format!("{alg:?}"))
					.collect::<Vec<_>>()
					.join(", "),
			});
		}

		let kid = header.get("kid").and_then(JsonValue::as_str);

		match self.client.resolve_key(kid).await {
			Ok(secret) => Ok(secret),
			Err(e) => self.error_handler.on_signing_key_error(e),
		}
	}
}
impl HeaderSecretCallback for JwksSecretProvider {
	fn resolve<'a>(
		&'a self,
		_: &'a dyn AuthRequest,
		header: &'a JsonMap<String, JsonValue>,
		_: &'a Claims,
	) -> SecretFuture<'a> {
		Box::pin(self.provide(header))
	}
}
impl Debug for JwksSecretProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwksSecretProvider")
			.field("client", &self.client)
			.field("algorithms", &self.algorithms)
			.finish_non_exhaustive()
	}
}
impl From<JwksSecretProvider> for SecretSource {
	fn from(value: JwksSecretProvider) -> Self {
		SecretSource::header_callback(value)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		_preludet::*,
		jwks::{FetchFuture, KeySetDocument, KeySetFetcher, KeySetOptions},
	};

	#[derive(Default)]
	struct FixtureFetcher {
		calls: AtomicUsize,
	}
	impl KeySetFetcher for FixtureFetcher {
		fn fetch<'a>(&'a self, _: &'a Url) -> FetchFuture<'a> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { KeySetDocument::parse(TEST_JWKS.as_bytes()) })
		}
	}

	fn provider(fetcher: Arc<FixtureFetcher>) -> JwksSecretProvider {
		let options = KeySetOptions::new(
			Url::parse("https://issuer.example/.well-known/jwks.json")
				.expect("Fixture URL should parse."),
		);

		JwksSecretProvider::with_client(
			RemoteKeySetClient::with_fetcher(options, fetcher).expect("Client should build."),
		)
	}

	#[tokio::test]
	async fn unsupported_algorithms_never_reach_the_endpoint() {
		let fetcher = Arc::new(FixtureFetcher::default());
		let provider = provider(fetcher.clone());

		for header in [
			claims(serde_json::json!({ "alg": "HS256", "kid": "primary" })),
			claims(serde_json::json!({ "alg": "none" })),
			claims(serde_json::json!({ "kid": "primary" })),
		] {
			let err = provider.provide(&header).await.expect_err("Only RS256 is accepted.");

			assert!(matches!(err, SecretError::UnsupportedAlgorithm { .. }));
			assert_eq!(err.status(), 401);
		}

		assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn known_kid_resolves_jwk() {
		let provider = provider(Arc::new(FixtureFetcher::default()));
		let secret = provider
			.provide(&claims(serde_json::json!({ "alg": "RS256", "kid": "primary" })))
			.await
			.expect("Known kid should resolve.");

		assert_eq!(secret.key_id(), Some("primary"));
	}

	#[tokio::test]
	async fn unknown_kid_maps_to_empty_secret() {
		let provider = provider(Arc::new(FixtureFetcher::default()));
		let secret = provider
			.provide(&claims(serde_json::json!({ "alg": "RS256", "kid": "missing" })))
			.await
			.expect("Unknown kids map to an empty secret.");

		assert!(secret.is_empty());
	}

	#[tokio::test]
	async fn custom_handler_overrides_default() {
		let provider = provider(Arc::new(FixtureFetcher::default())).with_signing_key_error_handler(
			|error: KeySetError| Err(SecretError::from(error)),
		);
		let err = provider
			.provide(&claims(serde_json::json!({ "alg": "RS256", "kid": "missing" })))
			.await
			.expect_err("Custom handler propagates unknown kids.");

		assert!(matches!(err, SecretError::KeySet(KeySetError::SigningKeyNotFound { .. })));
	}

	#[test]
	fn additional_algorithms_can_be_accepted() {
		let provider = provider(Arc::new(FixtureFetcher::default()))
			.with_algorithms([Algorithm::RS256, Algorithm::PS256]);

		assert_eq!(provider.algorithms(), &[Algorithm::RS256, Algorithm::PS256]);
		assert!(matches!(SecretSource::from(provider), SecretSource::HeaderCallback(_)));
	}
}
