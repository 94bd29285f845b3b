//! Counters describing key resolution.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for key resolution.
#[derive(Debug, Default)]
pub struct KeySetMetrics {
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	fetches: AtomicU64,
	fetch_failures: AtomicU64,
}
impl KeySetMetrics {
	/// Returns the number of keys served from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of resolutions the cache could not serve.
	pub fn cache_misses(&self) -> u64 {
		self.cache_misses.load(Ordering::Relaxed)
	}

	/// Returns the number of requests sent to the endpoint.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of endpoint requests that failed.
	pub fn fetch_failures(&self) -> u64 {
		self.fetch_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_miss(&self) {
		self.cache_misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch_failure(&self) {
		self.fetch_failures.fetch_add(1, Ordering::Relaxed);
	}
}
