//! Secret resolution strategies selected at configuration time.

// self
use crate::{
	_prelude::*,
	auth::{AuthRequest, Claims, DecodedToken},
	secret::{Secret, SecretError},
};

/// Boxed future returned by secret callbacks.
pub type SecretFuture<'a> = Pin<Box<dyn Future<Output = Result<Secret, SecretError>> + 'a + Send>>;

/// Resolves key material from the request and the unverified payload.
///
/// Closures of the shape `Fn(&dyn AuthRequest, &Claims) -> impl Future` implement the trait
/// automatically as long as the returned future owns its state.
pub trait SecretCallback
where
	Self: Send + Sync,
{
	/// Produces the secret for the current request.
	fn resolve<'a>(&'a self, request: &'a dyn AuthRequest, payload: &'a Claims)
	-> SecretFuture<'a>;
}
impl<F, Fut> SecretCallback for F
where
	F: Send + Sync + Fn(&dyn AuthRequest, &Claims) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Secret, SecretError>>,
{
	fn resolve<'a>(
		&'a self,
		request: &'a dyn AuthRequest,
		payload: &'a Claims,
	) -> SecretFuture<'a> {
		Box::pin(self(request, payload))
	}
}

/// Resolves key material from the request, the token header, and the unverified payload.
pub trait HeaderSecretCallback
where
	Self: Send + Sync,
{
	/// Produces the secret for the current request.
	fn resolve<'a>(
		&'a self,
		request: &'a dyn AuthRequest,
		header: &'a JsonMap<String, JsonValue>,
		payload: &'a Claims,
	) -> SecretFuture<'a>;
}
impl<F, Fut> HeaderSecretCallback for F
where
	F: Send + Sync + Fn(&dyn AuthRequest, &JsonMap<String, JsonValue>, &Claims) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Secret, SecretError>>,
{
	fn resolve<'a>(
		&'a self,
		request: &'a dyn AuthRequest,
		header: &'a JsonMap<String, JsonValue>,
		payload: &'a Claims,
	) -> SecretFuture<'a> {
		Box::pin(self(request, header, payload))
	}
}

/// Secret resolution strategy.
#[derive(Clone)]
pub enum SecretSource {
	/// Fixed key material; ignores the request and claims.
	Static(Secret),
	/// Request-aware callback receiving the payload.
	Callback(Arc<dyn SecretCallback>),
	/// Request-aware callback receiving the header and the payload.
	HeaderCallback(Arc<dyn HeaderSecretCallback>),
}
impl SecretSource {
	/// Wraps fixed key material.
	pub fn fixed(secret: impl Into<Secret>) -> Self {
		Self::Static(secret.into())
	}

	/// Wraps a `(request, payload)` callback.
	pub fn callback(callback: impl 'static + SecretCallback) -> Self {
		Self::Callback(Arc::new(callback))
	}

	/// Wraps a `(request, header, payload)` callback.
	pub fn header_callback(callback: impl 'static + HeaderSecretCallback) -> Self {
		Self::HeaderCallback(Arc::new(callback))
	}

	/// Resolves the secret for `token`.
	pub async fn resolve(
		&self,
		request: &dyn AuthRequest,
		token: &DecodedToken,
	) -> Result<Secret, SecretError> {
		match self {
			Self::Static(secret) => Ok(secret.clone()),
			Self::Callback(callback) => callback.resolve(request, &token.payload).await,
			Self::HeaderCallback(callback) =>
				callback.resolve(request, &token.header, &token.payload).await,
		}
	}
}
impl Debug for SecretSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Static(secret) => f.debug_tuple("SecretSource::Static").field(secret).finish(),
			Self::Callback(_) => f.write_str("SecretSource::Callback(..)"),
			Self::HeaderCallback(_) => f.write_str("SecretSource::HeaderCallback(..)"),
		}
	}
}
impl From<Secret> for SecretSource {
	fn from(value: Secret) -> Self {
		Self::Static(value)
	}
}
