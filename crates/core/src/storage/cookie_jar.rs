//! File-backed cookie jar in storage-state layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BackendRead, StorageBackend, WriteOptions};
use crate::error::{Error, Result};
use crate::token::now_ts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cookie {
	name: String,
	/// Percent-encoded value, as a browser would hold it.
	value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	domain: Option<String>,
	#[serde(default = "root_path")]
	path: String,
	/// Unix seconds; `-1` marks a session cookie.
	#[serde(default = "session_expiry")]
	expires: f64,
	#[serde(default)]
	http_only: bool,
	#[serde(default)]
	secure: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	same_site: Option<String>,
}

impl Cookie {
	fn is_live(&self, now: i64) -> bool {
		self.expires < 0.0 || self.expires > now as f64
	}
}

fn root_path() -> String {
	"/".to_string()
}

fn session_expiry() -> f64 {
	-1.0
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CookieJarFile {
	#[serde(default)]
	cookies: Vec<Cookie>,
}

/// Cookie store persisted as `{"cookies": [...]}`.
///
/// Cookies are identified by `(name, path)`, so a delete issued with a
/// different path than the write leaves the cookie in place.
#[derive(Debug, Clone)]
pub struct CookieJarBackend {
	path: PathBuf,
}

impl CookieJarBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<CookieJarFile> {
		match fs::read_to_string(&self.path) {
			Ok(content) => serde_json::from_str(&content).map_err(|e| Error::storage(self.name(), e)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CookieJarFile::default()),
			Err(err) => Err(Error::storage(self.name(), err)),
		}
	}

	fn save(&self, mut jar: CookieJarFile) -> Result<()> {
		let now = now_ts();
		jar.cookies.retain(|c| c.is_live(now));
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let json = serde_json::to_string_pretty(&jar)?;
		fs::write(&self.path, json)?;
		Ok(())
	}
}

impl StorageBackend for CookieJarBackend {
	fn name(&self) -> &str {
		"cookies"
	}

	fn read_all(&mut self) -> Result<BackendRead> {
		let now = now_ts();
		let mut by_name: BTreeMap<String, (usize, String)> = BTreeMap::new();

		for cookie in self.load()?.cookies.into_iter().filter(|c| c.is_live(now)) {
			let value = match urlencoding::decode(&cookie.value) {
				Ok(decoded) => decoded.into_owned(),
				Err(_) => cookie.value.clone(),
			};
			let specificity = cookie.path.len();
			if by_name.get(&cookie.name).is_none_or(|(current, _)| specificity > *current) {
				by_name.insert(cookie.name, (specificity, value));
			}
		}

		Ok(BackendRead::Ready(by_name.into_iter().map(|(name, (_, value))| (name, value)).collect()))
	}

	fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<()> {
		let mut jar = self.load()?;
		jar.cookies.retain(|c| !(c.name == key && c.path == options.path));

		if options.is_expired() {
			debug!(target: "hydrate.storage", cookie = %key, path = %options.path, "expiring cookie");
		} else {
			jar.cookies.push(Cookie {
				name: key.to_string(),
				value: urlencoding::encode(value).into_owned(),
				domain: None,
				path: options.path.clone(),
				expires: (now_ts() as f64) + options.max_age.as_secs_f64(),
				http_only: false,
				secure: true,
				same_site: Some("Lax".to_string()),
			});
		}

		self.save(jar).map_err(|e| Error::storage(self.name(), e))
	}

	fn delete(&mut self, key: &str, path: &str) -> Result<()> {
		let mut jar = self.load()?;
		let before = jar.cookies.len();
		jar.cookies.retain(|c| !(c.name == key && c.path == path));
		if jar.cookies.len() == before {
			debug!(target: "hydrate.storage", cookie = %key, %path, "no cookie matched name and path");
			return Ok(());
		}
		self.save(jar).map_err(|e| Error::storage(self.name(), e))
	}
}
