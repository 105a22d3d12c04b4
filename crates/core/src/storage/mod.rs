//! Storage back-ends and the per-pass adapter in front of them.
//!
//! Physical stores (cookie jar, local key-value store, in-memory) are slow
//! or eventually consistent, so every pass reads them at most once through
//! [`StorageAdapter`], which also replays the pass's own writes on top of
//! that single snapshot.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::Result;

mod cookie_jar;
mod local_store;
mod memory;

#[cfg(test)]
mod tests;

pub use cookie_jar::CookieJarBackend;
pub use local_store::LocalStoreBackend;
pub use memory::{MemoryBackend, MemoryHandle};

/// Outcome of one physical read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRead {
	Ready(BTreeMap<String, String>),
	/// The store has not reported yet (e.g. first paint before mount).
	NotReady,
}

/// Expiry and scope applied to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
	pub max_age: Duration,
	pub path: String,
}

impl WriteOptions {
	pub fn new(max_age: Duration, path: impl Into<String>) -> Self {
		Self {
			max_age,
			path: path.into(),
		}
	}

	/// An already-expired write, used to neutralize stores that ignore deletes.
	pub fn expired(path: impl Into<String>) -> Self {
		Self::new(Duration::ZERO, path)
	}

	pub fn is_expired(&self) -> bool {
		self.max_age.is_zero()
	}

	/// Absolute expiry in unix seconds, clamped for very long lifetimes.
	pub fn expires_at(&self, now: i64) -> i64 {
		now.saturating_add(i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX))
	}
}

/// A physical key-value store.
pub trait StorageBackend: Send {
	fn name(&self) -> &str;

	fn read_all(&mut self) -> Result<BackendRead>;

	fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<()>;

	/// Removes `key`; stores with path scoping only match the exact `path`.
	fn delete(&mut self, key: &str, path: &str) -> Result<()>;
}

/// One read of the physical stores during the current pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSnapshot {
	Pending,
	Ready(BTreeMap<String, String>),
}

impl StorageSnapshot {
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		match self {
			Self::Pending => None,
			Self::Ready(entries) => entries.get(key).map(String::as_str),
		}
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	fn with_overlay(&self, overlay: &BTreeMap<String, Option<String>>) -> Self {
		if overlay.is_empty() {
			return self.clone();
		}
		let mut entries = match self {
			Self::Ready(entries) => entries.clone(),
			// Own writes are known even when the store is not.
			Self::Pending if overlay.values().all(Option::is_none) => return Self::Pending,
			Self::Pending => BTreeMap::new(),
		};
		for (key, value) in overlay {
			match value {
				Some(value) => entries.insert(key.clone(), value.clone()),
				None => entries.remove(key),
			};
		}
		Self::Ready(entries)
	}
}

/// Ordered list of back-ends behind one per-pass snapshot cache.
///
/// Back-ends are given highest priority first. Reads merge every back-end
/// with higher priority winning per key; writes and deletes fan out to all.
/// Nothing here returns an error: failing back-ends are logged and skipped.
pub struct StorageAdapter {
	backends: Vec<Box<dyn StorageBackend>>,
	snapshot: Option<StorageSnapshot>,
	overlay: BTreeMap<String, Option<String>>,
	physical_reads: u64,
}

impl std::fmt::Debug for StorageAdapter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StorageAdapter")
			.field("backends", &self.backend_names())
			.field("snapshot", &self.snapshot)
			.field("overlay_keys", &self.overlay.keys().collect::<Vec<_>>())
			.field("physical_reads", &self.physical_reads)
			.finish()
	}
}

impl StorageAdapter {
	pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> Self {
		Self {
			backends,
			snapshot: None,
			overlay: BTreeMap::new(),
			physical_reads: 0,
		}
	}

	pub fn single(backend: impl StorageBackend + 'static) -> Self {
		Self::new(vec![Box::new(backend)])
	}

	pub fn backend_names(&self) -> Vec<&str> {
		self.backends.iter().map(|b| b.name()).collect()
	}

	/// Number of times the physical stores were actually read.
	pub fn physical_reads(&self) -> u64 {
		self.physical_reads
	}

	/// Forgets the snapshot and overlay of the previous pass.
	pub fn begin_pass(&mut self) {
		self.snapshot = None;
		self.overlay.clear();
	}

	/// Drops the captured snapshot; own writes/deletes of this pass still apply.
	pub fn discard_snapshot(&mut self) {
		self.snapshot = None;
	}

	/// Returns this pass's view of storage, reading the back-ends only once.
	pub fn read_all(&mut self) -> StorageSnapshot {
		if self.snapshot.is_none() {
			let snapshot = self.read_physical();
			self.snapshot = Some(snapshot);
		}
		match &self.snapshot {
			Some(snapshot) => snapshot.with_overlay(&self.overlay),
			None => StorageSnapshot::Pending,
		}
	}

	/// Writes to every back-end and records the write for this pass.
	pub fn write(&mut self, key: &str, value: &str, options: &WriteOptions) {
		for backend in &mut self.backends {
			if let Err(err) = backend.write(key, value, options) {
				warn!(target: "hydrate.storage", backend = backend.name(), %key, error = %err, "write failed; keeping value in memory only");
			}
		}
		let visible = (!options.is_expired()).then(|| value.to_string());
		self.overlay.insert(key.to_string(), visible);
	}

	/// Deletes from every back-end using the same path as the write.
	pub fn delete(&mut self, key: &str, path: &str) {
		for backend in &mut self.backends {
			if let Err(err) = backend.delete(key, path) {
				warn!(target: "hydrate.storage", backend = backend.name(), %key, error = %err, "delete failed");
			}
		}
		self.overlay.insert(key.to_string(), None);
	}

	fn read_physical(&mut self) -> StorageSnapshot {
		self.physical_reads += 1;
		let mut merged = BTreeMap::new();

		// Lowest priority first so higher-priority entries overwrite.
		for backend in self.backends.iter_mut().rev() {
			match backend.read_all() {
				Ok(BackendRead::Ready(entries)) => {
					trace!(target: "hydrate.storage", backend = backend.name(), keys = entries.len(), "backend ready");
					merged.extend(entries);
				}
				Ok(BackendRead::NotReady) => {
					debug!(target: "hydrate.storage", backend = backend.name(), "backend not ready");
					return StorageSnapshot::Pending;
				}
				Err(err) => {
					warn!(target: "hydrate.storage", backend = backend.name(), error = %err, "read failed; treating backend as empty");
				}
			}
		}

		StorageSnapshot::Ready(merged)
	}
}
