//! Post-verification revocation hooks.

// std
use std::collections::HashSet;
// self
use crate::{
	_prelude::*,
	auth::{AuthRequest, Claims},
};

/// Boxed future returned by [`RevocationCheck::is_revoked`].
pub type RevocationFuture<'a> = Pin<Box<dyn Future<Output = bool> + 'a + Send>>;

/// Predicate deciding whether a verified token has been revoked.
///
/// Runs only after the signature and standard claims passed verification, so `payload` is
/// trusted. Closures of the shape `Fn(&dyn AuthRequest, &Claims) -> impl Future<Output = bool>`
/// implement the trait automatically.
pub trait RevocationCheck
where
	Self: Send + Sync,
{
	/// Returns true when the token must be rejected.
	fn is_revoked<'a>(
		&'a self,
		request: &'a dyn AuthRequest,
		payload: &'a Claims,
	) -> RevocationFuture<'a>;
}
impl<F, Fut> RevocationCheck for F
where
	F: Send + Sync + Fn(&dyn AuthRequest, &Claims) -> Fut,
	Fut: 'static + Send + Future<Output = bool>,
{
	fn is_revoked<'a>(
		&'a self,
		request: &'a dyn AuthRequest,
		payload: &'a Claims,
	) -> RevocationFuture<'a> {
		Box::pin(self(request, payload))
	}
}

/// Revocation check that accepts every token.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverRevoked;
impl RevocationCheck for NeverRevoked {
	fn is_revoked<'a>(&'a self, _: &'a dyn AuthRequest, _: &'a Claims) -> RevocationFuture<'a> {
		Box::pin(async { false })
	}
}

/// In-memory deny-list keyed by the `jti` claim.
///
/// Tokens without a string `jti` are never considered revoked. Clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct RevokedTokenIds(Arc<RwLock<HashSet<String>>>);
impl RevokedTokenIds {
	/// Adds `jti` to the deny-list.
	pub fn revoke(&self, jti: impl Into<String>) {
		self.0.write().insert(jti.into());
	}

	/// Removes `jti` from the deny-list, returning whether it was present.
	pub fn restore(&self, jti: &str) -> bool {
		self.0.write().remove(jti)
	}

	/// Returns true if `jti` is currently revoked.
	pub fn contains(&self, jti: &str) -> bool {
		self.0.read().contains(jti)
	}

	/// Number of revoked identifiers.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing has been revoked.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl RevocationCheck for RevokedTokenIds {
	fn is_revoked<'a>(
		&'a self,
		_: &'a dyn AuthRequest,
		payload: &'a Claims,
	) -> RevocationFuture<'a> {
		let revoked =
			payload.get("jti").and_then(JsonValue::as_str).is_some_and(|jti| self.contains(jti));

		Box::pin(async move { revoked })
	}
}
