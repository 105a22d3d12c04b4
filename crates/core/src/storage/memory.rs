//! In-process store with cookie semantics, latency simulation and failure
//! injection.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{BackendRead, StorageBackend, WriteOptions};
use crate::error::{Error, Result};
use crate::token::now_ts;

#[derive(Debug, Clone)]
struct MemoryEntry {
	value: String,
	expires_at: Option<i64>,
}

#[derive(Debug, Default)]
struct MemoryState {
	/// Keyed by `(key, path)`: the same key under two paths is two entries.
	entries: BTreeMap<(String, String), MemoryEntry>,
	not_ready_reads: u32,
	failing: bool,
	ignore_deletes: bool,
	reads: u32,
	writes: u32,
}

/// Test-side handle for inspecting and steering a [`MemoryBackend`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
	state: Arc<Mutex<MemoryState>>,
}

impl MemoryHandle {
	/// Makes the next `reads` physical reads report "not ready".
	pub fn set_not_ready_reads(&self, reads: u32) {
		self.state.lock().not_ready_reads = reads;
	}

	/// Makes every operation fail, as if storage were disabled.
	pub fn set_failing(&self, failing: bool) {
		self.state.lock().failing = failing;
	}

	/// Makes deletes silently no-op; expired overwrites still apply.
	pub fn set_ignore_deletes(&self, ignore: bool) {
		self.state.lock().ignore_deletes = ignore;
	}

	/// Seeds a raw value without expiry.
	pub fn insert_raw(&self, key: &str, value: &str, path: &str) {
		self.state.lock().entries.insert(
			(key.to_string(), path.to_string()),
			MemoryEntry {
				value: value.to_string(),
				expires_at: None,
			},
		);
	}

	/// Returns the live value for `key`, preferring the most specific path.
	pub fn get(&self, key: &str) -> Option<String> {
		let state = self.state.lock();
		visible_entries(&state).remove(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Number of physical reads served (including not-ready ones).
	pub fn reads(&self) -> u32 {
		self.state.lock().reads
	}

	pub fn writes(&self) -> u32 {
		self.state.lock().writes
	}
}

/// In-memory [`StorageBackend`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
	name: String,
	handle: MemoryHandle,
}

impl MemoryBackend {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			handle: MemoryHandle::default(),
		}
	}

	/// Creates a backend together with a handle sharing its state.
	pub fn with_handle(name: impl Into<String>) -> (Self, MemoryHandle) {
		let backend = Self::new(name);
		let handle = backend.handle.clone();
		(backend, handle)
	}

	pub fn handle(&self) -> MemoryHandle {
		self.handle.clone()
	}

	fn check_available(&self, state: &MemoryState) -> Result<()> {
		if state.failing {
			return Err(Error::storage(&self.name, "storage disabled"));
		}
		Ok(())
	}
}

impl StorageBackend for MemoryBackend {
	fn name(&self) -> &str {
		&self.name
	}

	fn read_all(&mut self) -> Result<BackendRead> {
		let mut state = self.handle.state.lock();
		state.reads += 1;
		self.check_available(&state)?;
		if state.not_ready_reads > 0 {
			state.not_ready_reads -= 1;
			return Ok(BackendRead::NotReady);
		}
		Ok(BackendRead::Ready(visible_entries(&state)))
	}

	fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<()> {
		let mut state = self.handle.state.lock();
		self.check_available(&state)?;
		state.writes += 1;

		let slot = (key.to_string(), options.path.clone());
		if options.is_expired() {
			state.entries.remove(&slot);
			return Ok(());
		}
		let expires_at = options.expires_at(now_ts());
		state.entries.insert(
			slot,
			MemoryEntry {
				value: value.to_string(),
				expires_at: Some(expires_at),
			},
		);
		Ok(())
	}

	fn delete(&mut self, key: &str, path: &str) -> Result<()> {
		let mut state = self.handle.state.lock();
		self.check_available(&state)?;
		if state.ignore_deletes {
			return Ok(());
		}
		state.entries.remove(&(key.to_string(), path.to_string()));
		Ok(())
	}
}

fn visible_entries(state: &MemoryState) -> BTreeMap<String, String> {
	let now = now_ts();
	let mut best: BTreeMap<String, (usize, String)> = BTreeMap::new();
	for ((key, path), entry) in &state.entries {
		if entry.expires_at.is_some_and(|at| at <= now) {
			continue;
		}
		let specificity = path.len();
		let replace = best.get(key).is_none_or(|(current, _)| specificity > *current);
		if replace {
			best.insert(key.clone(), (specificity, entry.value.clone()));
		}
	}
	best.into_iter().map(|(key, (_, value))| (key, value)).collect()
}
