//! Session policy configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/hydrate/config.json` (or an explicit path),
//! then overridden from `HYDRATE_*` environment variables and validated.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_STORAGE_KEY: &str = "session_auth";
pub const DEFAULT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 10;
pub const DEFAULT_LOGIN_VIEW: &str = "login";
pub const DEFAULT_HOME_VIEW: &str = "home";

pub const ENV_API_URL: &str = "HYDRATE_API_URL";
pub const ENV_STORAGE_KEY: &str = "HYDRATE_STORAGE_KEY";
pub const ENV_CLOCK_SKEW_SECS: &str = "HYDRATE_CLOCK_SKEW_SECS";

/// Policy shared by the hydration controller, lifecycle and API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
	/// Storage key holding the serialized session record.
	pub storage_key: String,
	/// Max-age applied by `login`.
	pub ttl_secs: u64,
	/// Write/delete scope; deletes must use the same path as writes.
	pub cookie_path: String,
	/// Tolerance subtracted from `exp` before comparing with the clock.
	pub clock_skew_secs: u64,
	pub login_view: String,
	pub home_view: String,
	/// Remote API root. Profile completion and sign-in are disabled without it.
	pub api_base_url: Option<String>,
	pub request_timeout_secs: u64,
	/// Consecutive PENDING aborts allowed before a pass proceeds without storage.
	pub max_pending_passes: u32,
	/// Re-pass budget for the host driver.
	pub max_passes: u32,
	/// Surface transient profile-check failures as an info notice.
	pub notify_profile_errors: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			storage_key: DEFAULT_STORAGE_KEY.to_string(),
			ttl_secs: DEFAULT_TTL_SECS,
			cookie_path: "/".to_string(),
			clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
			login_view: DEFAULT_LOGIN_VIEW.to_string(),
			home_view: DEFAULT_HOME_VIEW.to_string(),
			api_base_url: None,
			request_timeout_secs: 10,
			max_pending_passes: 1,
			max_passes: 8,
			notify_profile_errors: false,
		}
	}
}

impl SessionConfig {
	/// Loads a config file; a missing file yields defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				debug!(target: "hydrate.config", path = %path.display(), "no config file; using defaults");
				return Ok(Self::default());
			}
			Err(err) => return Err(err.into()),
		};
		serde_json::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
	}

	/// Applies `HYDRATE_*` overrides from the process environment.
	pub fn with_env_overrides(self) -> Result<Self> {
		self.with_overrides(|name| std::env::var(name).ok())
	}

	/// Applies overrides from an arbitrary variable lookup.
	pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
			self.api_base_url = Some(url);
		}
		if let Some(key) = lookup(ENV_STORAGE_KEY).filter(|v| !v.trim().is_empty()) {
			self.storage_key = key;
		}
		if let Some(skew) = lookup(ENV_CLOCK_SKEW_SECS) {
			self.clock_skew_secs = skew
				.trim()
				.parse()
				.map_err(|_| Error::Config(format!("{ENV_CLOCK_SKEW_SECS} must be a whole number of seconds, got {skew:?}")))?;
		}
		Ok(self)
	}

	pub fn validate(&self) -> Result<()> {
		if self.storage_key.trim().is_empty() {
			return Err(Error::Config("storageKey must not be empty".into()));
		}
		if !self.cookie_path.starts_with('/') {
			return Err(Error::Config(format!("cookiePath must start with '/', got {:?}", self.cookie_path)));
		}
		if self.ttl_secs == 0 {
			return Err(Error::Config("ttlSecs must be positive".into()));
		}
		if self.clock_skew_secs >= self.ttl_secs {
			return Err(Error::Config("clockSkewSecs must be smaller than ttlSecs".into()));
		}
		if self.max_passes < 2 {
			return Err(Error::Config("maxPasses must allow at least one re-pass".into()));
		}
		if self.login_view == self.home_view {
			return Err(Error::Config("loginView and homeView must differ".into()));
		}
		Ok(())
	}

	pub fn ttl(&self) -> Duration {
		Duration::from_secs(self.ttl_secs)
	}

	pub fn clock_skew(&self) -> Duration {
		Duration::from_secs(self.clock_skew_secs)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

/// Default config location.
pub fn default_config_path() -> PathBuf {
	std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
		.unwrap_or_else(|| PathBuf::from("."))
		.join("hydrate/config.json")
}
