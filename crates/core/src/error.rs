//! Error types for hydrate.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or driving a session host.
///
/// The hydration path itself never returns these to the UI: storage failures
/// degrade to pass-local state and profile failures are classified into
/// [`ProfileOutcome`](crate::api::ProfileOutcome).
#[derive(Debug, Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("HTTP client error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("storage backend `{backend}` unavailable: {reason}")]
	Storage { backend: String, reason: String },

	#[error("session did not settle within {limit} passes")]
	PassLimit { limit: u32 },
}

impl Error {
	pub(crate) fn storage(backend: impl Into<String>, reason: impl std::fmt::Display) -> Self {
		Self::Storage {
			backend: backend.into(),
			reason: reason.to_string(),
		}
	}
}
