//! Cached, single-flight key resolution against a JWKS endpoint.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	jwks::{
		KeySetCache, KeySetCacheEntry, KeySetError, KeySetFetcher, KeySetMetrics, KeySetOptions,
		PerMinuteLimiter, RateLimitContext, RateLimitDecision, RateLimitPolicy,
	},
	obs::{self, Stage, StageOutcome, StageSpan},
	secret::Secret,
};
#[cfg(feature = "reqwest")] use crate::jwks::ReqwestKeySetFetcher;

type FlightGuards = Arc<Mutex<HashMap<String, FlightSlot>>>;

/// Resolves signing keys from a remote key set.
///
/// Clones share the cache, the rate limit budget, and the in-flight guards.
#[derive(Clone)]
pub struct RemoteKeySetClient {
	options: KeySetOptions,
	fetcher: Arc<dyn KeySetFetcher>,
	cache: Arc<KeySetCache>,
	rate_limit: Option<Arc<dyn RateLimitPolicy>>,
	flight_guards: FlightGuards,
	metrics: Arc<KeySetMetrics>,
}
impl RemoteKeySetClient {
	/// Creates a client that fetches with reqwest.
	#[cfg(feature = "reqwest")]
	pub fn new(options: KeySetOptions) -> Result<Self, ConfigError> {
		let fetcher = ReqwestKeySetFetcher::from_options(&options)?;

		Self::with_fetcher(options, Arc::new(fetcher))
	}

	/// Creates a client that fetches through `fetcher`.
	pub fn with_fetcher(
		options: KeySetOptions,
		fetcher: Arc<dyn KeySetFetcher>,
	) -> Result<Self, ConfigError> {
		if !matches!(options.endpoint_uri.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint {
				endpoint: options.endpoint_uri.to_string(),
				reason: "only http and https endpoints are supported",
			});
		}

		let cache = Arc::new(KeySetCache::new(options.cache_max_entries, options.cache_max_age()));
		let rate_limit = options.rate_limit.then(|| {
			Arc::new(PerMinuteLimiter::new(options.requests_per_minute)) as Arc<dyn RateLimitPolicy>
		});

		Ok(Self {
			options,
			fetcher,
			cache,
			rate_limit,
			flight_guards: Default::default(),
			metrics: Default::default(),
		})
	}

	/// Replaces the rate limit policy; applies even when `rate_limit` is off in the options.
	pub fn with_rate_limit_policy(mut self, policy: Arc<dyn RateLimitPolicy>) -> Self {
		self.rate_limit = Some(policy);

		self
	}

	/// Options the client was built with.
	pub fn options(&self) -> &KeySetOptions {
		&self.options
	}

	/// Shared key cache.
	pub fn cache(&self) -> &KeySetCache {
		&self.cache
	}

	/// Resolution counters.
	pub fn metrics(&self) -> &KeySetMetrics {
		&self.metrics
	}

	/// Resolves the signing key for `kid`.
	///
	/// Fresh cached keys are returned without contacting the endpoint. Concurrent misses for
	/// the same `kid` wait for a single fetch. Keys resolved without a `kid` are never cached.
	pub async fn resolve_key(&self, kid: Option<&str>) -> Result<Secret, KeySetError> {
		const STAGE: Stage = Stage::ResolveKey;

		let span = StageSpan::new(STAGE, "resolve_key");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(secret) = self.cached(kid) {
					return Ok(secret);
				}

				let flight = FlightGuard::acquire(&self.flight_guards, kid.unwrap_or_default());
				let _singleflight = flight.lock.lock().await;

				match self.cached(kid) {
					Some(secret) => Ok(secret),
					None => self.fetch_and_store(kid).await,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	fn cached(&self, kid: Option<&str>) -> Option<Secret> {
		let kid = kid.filter(|_| self.options.cache)?;
		let secret = self.cache.get(kid)?;

		self.metrics.record_hit();
		obs::debug_cache_hit(kid);

		Some(secret)
	}

	async fn fetch_and_store(&self, kid: Option<&str>) -> Result<Secret, KeySetError> {
		self.metrics.record_miss();

		if let Some(policy) = &self.rate_limit {
			let context = RateLimitContext::new(self.options.endpoint_uri.clone(), kid);

			if let RateLimitDecision::Delay(directive) = policy.evaluate(&context).await {
				let err = KeySetError::RateLimited { retry_after: directive.recommended_backoff };

				obs::warn_failure(Stage::ResolveKey, "Key set request was rate limited.", &err);

				return Err(err);
			}
		}

		self.metrics.record_fetch();

		let document = self.fetcher.fetch(&self.options.endpoint_uri).await.inspect_err(|e| {
			self.metrics.record_fetch_failure();
			obs::warn_failure(Stage::ResolveKey, "Key set fetch failed.", e);
		})?;
		let jwk = document.find(kid)?;
		let secret = Secret::jwk(jwk);

		// `find` matched on `kid`, so the entry is keyed by the identifier it answers for.
		if let Some(kid) = kid.filter(|_| self.options.cache) {
			self.cache.insert(KeySetCacheEntry {
				key_id: kid.to_owned(),
				key: secret.clone(),
				fetched_at: OffsetDateTime::now_utc(),
			});
		}

		Ok(secret)
	}
}
impl Debug for RemoteKeySetClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RemoteKeySetClient")
			.field("options", &self.options)
			.field("cache_len", &self.cache.len())
			.field("rate_limited", &self.rate_limit.is_some())
			.finish_non_exhaustive()
	}
}

struct FlightSlot {
	lock: Arc<AsyncMutex<()>>,
	holders: usize,
}

/// Per-kid membership in the single-flight map.
///
/// Dropping the guard, including when the resolution future is cancelled, releases the slot once
/// no other resolution holds it.
struct FlightGuard<'a> {
	guards: &'a Mutex<HashMap<String, FlightSlot>>,
	key: &'a str,
	lock: Arc<AsyncMutex<()>>,
}
impl<'a> FlightGuard<'a> {
	fn acquire(guards: &'a Mutex<HashMap<String, FlightSlot>>, key: &'a str) -> Self {
		let mut map = guards.lock();
		let slot = map
			.entry(key.to_owned())
			.or_insert_with(|| FlightSlot { lock: Arc::new(AsyncMutex::new(())), holders: 0 });

		slot.holders += 1;

		Self { guards, key, lock: slot.lock.clone() }
	}
}
impl Drop for FlightGuard<'_> {
	fn drop(&mut self) {
		let mut map = self.guards.lock();

		if let Some(slot) = map.get_mut(self.key) {
			slot.holders -= 1;

			if slot.holders == 0 {
				map.remove(self.key);
			}
		}
	}
}
