//! Per-invocation wiring: config, state directory and session host.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use hydrate::{ApiClient, CookieJarBackend, LocalStoreBackend, SessionConfig, SessionHost, StorageAdapter, default_config_path};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

pub const COOKIE_FILE: &str = "cookies.json";
pub const LOCAL_STORE_FILE: &str = "local_storage.json";

#[derive(Debug, Clone)]
pub struct CommandContext {
	pub config: SessionConfig,
	pub state_dir: PathBuf,
}

impl CommandContext {
	/// Resolves config (file, then env, then flags) and the state directory.
	pub fn from_cli(cli: &Cli) -> Result<Self> {
		let path = cli.config.clone().unwrap_or_else(default_config_path);
		let mut config = SessionConfig::load(&path)
			.and_then(SessionConfig::with_env_overrides)
			.with_context(|| format!("loading session config from {}", path.display()))
			.map_err(CliError::Config)?;
		if let Some(url) = &cli.api_url {
			config.api_base_url = Some(url.clone());
		}
		config.validate()?;

		let state_dir = cli.state_dir.clone().unwrap_or_else(default_state_dir);
		debug!(target: "hydrate.cli", config = %path.display(), state_dir = %state_dir.display(), "context resolved");
		Ok(Self { config, state_dir })
	}

	/// Cookie jar first, local store second.
	pub fn storage(&self) -> StorageAdapter {
		StorageAdapter::new(vec![
			Box::new(CookieJarBackend::new(self.state_dir.join(COOKIE_FILE))),
			Box::new(LocalStoreBackend::new(self.state_dir.join(LOCAL_STORE_FILE))),
		])
	}

	pub fn api(&self) -> Result<Option<ApiClient>> {
		let Some(base) = self.config.api_base_url.as_deref() else {
			return Ok(None);
		};
		Ok(Some(ApiClient::new(base, self.config.request_timeout())?))
	}

	pub fn host(&self) -> Result<SessionHost> {
		let host = SessionHost::new(self.config.clone(), self.storage());
		Ok(match self.api()? {
			Some(api) => host.with_profile_source(Arc::new(api)),
			None => host,
		})
	}
}

/// `$XDG_STATE_HOME/hydrate`, or the platform's local data dir.
pub fn default_state_dir() -> PathBuf {
	dirs::state_dir()
		.or_else(dirs::data_local_dir)
		.unwrap_or_else(|| PathBuf::from("."))
		.join("hydrate")
}
