use thiserror::Error;

use crate::output::ErrorCode;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Session(#[from] hydrate::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("{0}")]
	InvalidInput(String),

	#[error("{0}")]
	Auth(String),

	#[error("API error ({status}): {detail}")]
	Api { status: u16, detail: String },

	#[error("cannot reach the API: {0}")]
	Network(String),

	#[error("{0:#}")]
	Config(anyhow::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Session(hydrate::Error::Config(_)) | CliError::Config(_) => ErrorCode::ConfigError,
			CliError::Session(hydrate::Error::Storage { .. }) => ErrorCode::StorageError,
			CliError::Session(hydrate::Error::Http(_)) => ErrorCode::NetworkError,
			CliError::Session(_) => ErrorCode::SessionError,
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) => ErrorCode::InternalError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Auth(_) => ErrorCode::AuthError,
			CliError::Api { .. } => ErrorCode::ApiError,
			CliError::Network(_) => ErrorCode::NetworkError,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_follow_the_failing_layer() {
		assert_eq!(CliError::Session(hydrate::Error::Config("x".into())).code(), ErrorCode::ConfigError);
		assert_eq!(CliError::Session(hydrate::Error::PassLimit { limit: 8 }).code(), ErrorCode::SessionError);
		assert_eq!(CliError::Network("refused".into()).code(), ErrorCode::NetworkError);
		assert_eq!(CliError::Config(anyhow::anyhow!("bad")).code(), ErrorCode::ConfigError);
	}

	#[test]
	fn config_errors_keep_their_context_chain() {
		let err = CliError::Config(anyhow::anyhow!("root cause").context("loading config"));
		assert_eq!(err.to_string(), "loading config: root cause");
	}
}
