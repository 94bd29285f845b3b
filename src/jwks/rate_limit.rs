//! Rate limit policy contracts consulted before a key set request leaves the process.

// self
use crate::_prelude::*;

/// Boxed future returned by [`RateLimitPolicy::evaluate`].
pub type RateLimitFuture<'a> = Pin<Box<dyn Future<Output = RateLimitDecision> + 'a + Send>>;

/// Strategy that decides whether the next key set request may reach the endpoint.
///
/// Only cache misses are evaluated; cached keys are served without consulting the policy.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Evaluates whether the next call should be delayed.
	fn evaluate<'a>(&'a self, context: &'a RateLimitContext) -> RateLimitFuture<'a>;
}

/// Context shared with a [`RateLimitPolicy`] before an outbound call is made.
#[derive(Clone, Debug)]
pub struct RateLimitContext {
	/// Endpoint about to be called.
	pub endpoint: Url,
	/// Key identifier being resolved.
	pub key_id: Option<String>,
	/// Timestamp observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl RateLimitContext {
	/// Creates a new context for the given endpoint and key identifier.
	pub fn new(endpoint: Url, key_id: Option<&str>) -> Self {
		Self {
			endpoint,
			key_id: key_id.map(str::to_owned),
			observed_at: OffsetDateTime::now_utc(),
		}
	}

	/// Overrides the timestamp associated with the observation.
	pub fn with_observed_at(mut self, instant: OffsetDateTime) -> Self {
		self.observed_at = instant;

		self
	}
}

/// Result emitted by a [`RateLimitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow,
	/// The request should be delayed.
	Delay(RetryDirective),
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Suggested backoff duration.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}

/// Token bucket admitting `requests_per_minute` calls, refilled continuously.
///
/// The bucket starts full, so the first `requests_per_minute` calls pass immediately.
#[derive(Debug)]
pub struct PerMinuteLimiter {
	requests_per_minute: u32,
	bucket: Mutex<Bucket>,
}
impl PerMinuteLimiter {
	/// Creates a limiter; zero is treated as one request per minute.
	pub fn new(requests_per_minute: u32) -> Self {
		let requests_per_minute = requests_per_minute.max(1);

		let bucket = Bucket { tokens: f64::from(requests_per_minute), refilled_at: None };

		Self { requests_per_minute, bucket: Mutex::new(bucket) }
	}

	/// Configured budget.
	pub fn requests_per_minute(&self) -> u32 {
		self.requests_per_minute
	}

	/// Takes a token at `now`, or reports how long until one is available.
	pub fn acquire_at(&self, now: OffsetDateTime) -> RateLimitDecision {
		let capacity = f64::from(self.requests_per_minute);
		let per_second = capacity / 60.;
		let mut bucket = self.bucket.lock();

		if let Some(refilled_at) = bucket.refilled_at {
			let elapsed = (now - refilled_at).as_seconds_f64().max(0.);

			bucket.tokens = (bucket.tokens + elapsed * per_second).min(capacity);
		}

		bucket.refilled_at = Some(now);

		if bucket.tokens >= 1. {
			bucket.tokens -= 1.;

			return RateLimitDecision::Allow;
		}

		let wait = Duration::seconds_f64((1. - bucket.tokens) * 60. / capacity);

		RateLimitDecision::Delay(
			RetryDirective::new(now + wait, wait).with_reason(format!(
				"Exceeded {} key set requests per minute.",
				self.requests_per_minute
			)),
		)
	}
}
impl RateLimitPolicy for PerMinuteLimiter {
	fn evaluate<'a>(&'a self, context: &'a RateLimitContext) -> RateLimitFuture<'a> {
		let decision = self.acquire_at(context.observed_at);

		Box::pin(async move { decision })
	}
}

#[derive(Debug)]
struct Bucket {
	tokens: f64,
	refilled_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn bucket_allows_budget_then_delays() {
		let limiter = PerMinuteLimiter::new(2);
		let now = datetime!(2025-01-01 00:00 UTC);

		assert_eq!(limiter.acquire_at(now), RateLimitDecision::Allow);
		assert_eq!(limiter.acquire_at(now), RateLimitDecision::Allow);

		let RateLimitDecision::Delay(directive) = limiter.acquire_at(now) else {
			panic!("Third request within the same instant must be delayed.");
		};

		assert_eq!(directive.recommended_backoff, Duration::seconds(30));
		assert_eq!(directive.earliest_retry_at, now + Duration::seconds(30));
		assert!(directive.reason.is_some());
	}

	#[test]
	fn bucket_refills_over_time() {
		let limiter = PerMinuteLimiter::new(1);
		let now = datetime!(2025-01-01 00:00 UTC);

		assert_eq!(limiter.acquire_at(now), RateLimitDecision::Allow);
		assert!(matches!(
			limiter.acquire_at(now + Duration::seconds(30)),
			RateLimitDecision::Delay(_)
		));
		assert_eq!(limiter.acquire_at(now + Duration::seconds(61)), RateLimitDecision::Allow);
	}

	#[tokio::test]
	async fn policy_uses_context_timestamp() {
		let limiter = PerMinuteLimiter::new(1);
		let endpoint = Url::parse("https://issuer.example/jwks.json").expect("URL should parse.");
		let now = datetime!(2025-01-01 00:00 UTC);
		let context = RateLimitContext::new(endpoint, Some("primary")).with_observed_at(now);

		assert_eq!(limiter.evaluate(&context).await, RateLimitDecision::Allow);
		assert!(matches!(limiter.evaluate(&context).await, RateLimitDecision::Delay(_)));
		assert_eq!(PerMinuteLimiter::new(0).requests_per_minute(), 1);
	}
}
