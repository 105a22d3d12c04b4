//! File-backed key-value store emulating browser local storage with TTLs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BackendRead, StorageBackend, WriteOptions};
use crate::error::{Error, Result};
use crate::token::now_ts;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalEntry {
	name: String,
	value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_at: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalStoreFile {
	#[serde(default)]
	local_storage: Vec<LocalEntry>,
}

/// Local store persisted as `{"localStorage": [{name, value, expiresAt}]}`.
///
/// Local storage has no path scope; the path of writes and deletes is ignored.
#[derive(Debug, Clone)]
pub struct LocalStoreBackend {
	path: PathBuf,
}

impl LocalStoreBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<LocalStoreFile> {
		match fs::read_to_string(&self.path) {
			Ok(content) => serde_json::from_str(&content).map_err(|e| Error::storage(self.name(), e)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(LocalStoreFile::default()),
			Err(err) => Err(Error::storage(self.name(), err)),
		}
	}

	fn save(&self, file: &LocalStoreFile) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(|e| Error::storage(self.name(), e))?;
		}
		let json = serde_json::to_string_pretty(file)?;
		fs::write(&self.path, json).map_err(|e| Error::storage(self.name(), e))
	}
}

impl StorageBackend for LocalStoreBackend {
	fn name(&self) -> &str {
		"local-storage"
	}

	fn read_all(&mut self) -> Result<BackendRead> {
		let now = now_ts();
		let entries = self
			.load()?
			.local_storage
			.into_iter()
			.filter(|e| e.expires_at.is_none_or(|at| at > now))
			.map(|e| (e.name, e.value))
			.collect::<BTreeMap<_, _>>();
		Ok(BackendRead::Ready(entries))
	}

	fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<()> {
		let mut file = self.load()?;
		file.local_storage.retain(|e| e.name != key);
		if !options.is_expired() {
			file.local_storage.push(LocalEntry {
				name: key.to_string(),
				value: value.to_string(),
				expires_at: Some(options.expires_at(now_ts())),
			});
		}
		self.save(&file)
	}

	fn delete(&mut self, key: &str, _path: &str) -> Result<()> {
		let mut file = self.load()?;
		let before = file.local_storage.len();
		file.local_storage.retain(|e| e.name != key);
		if file.local_storage.len() == before {
			return Ok(());
		}
		self.save(&file)
	}
}
