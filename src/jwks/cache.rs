//! In-memory signing key cache with FIFO eviction.

// self
use crate::{_prelude::*, secret::Secret};

/// Cached signing key.
#[derive(Clone, Debug, PartialEq)]
pub struct KeySetCacheEntry {
	/// Key identifier the entry answers for.
	pub key_id: String,
	/// Key material.
	pub key: Secret,
	/// When the key was fetched.
	pub fetched_at: OffsetDateTime,
}

/// Bounded cache of signing keys keyed by `kid`.
///
/// Entries are inserted whole under a write lock, so readers never observe partial state.
/// When full, the oldest insertion is evicted first.
#[derive(Debug)]
pub struct KeySetCache {
	entries: RwLock<VecDeque<KeySetCacheEntry>>,
	max_entries: usize,
	max_age: Duration,
}
impl KeySetCache {
	/// Creates a cache holding at most `max_entries` keys younger than `max_age`.
	pub fn new(max_entries: usize, max_age: Duration) -> Self {
		Self { entries: RwLock::new(VecDeque::new()), max_entries, max_age }
	}

	/// Returns the fresh key cached for `key_id`.
	pub fn get(&self, key_id: &str) -> Option<Secret> {
		self.get_at(key_id, OffsetDateTime::now_utc())
	}

	/// Returns the key cached for `key_id` if it is still fresh at `now`.
	pub fn get_at(&self, key_id: &str, now: OffsetDateTime) -> Option<Secret> {
		self.entries
			.read()
			.iter()
			.find(|entry| entry.key_id == key_id)
			.filter(|entry| now - entry.fetched_at < self.max_age)
			.map(|entry| entry.key.clone())
	}

	/// Stores `entry`, replacing any entry for the same key and evicting the oldest ones.
	pub fn insert(&self, entry: KeySetCacheEntry) {
		if self.max_entries == 0 {
			return;
		}

		let mut entries = self.entries.write();

		entries.retain(|existing| existing.key_id != entry.key_id);
		entries.push_back(entry);

		while entries.len() > self.max_entries {
			entries.pop_front();
		}
	}

	/// Removes the entry for `key_id`, returning it.
	pub fn remove(&self, key_id: &str) -> Option<KeySetCacheEntry> {
		let mut entries = self.entries.write();
		let index = entries.iter().position(|entry| entry.key_id == key_id)?;

		entries.remove(index)
	}

	/// Number of cached entries, fresh or stale.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}
