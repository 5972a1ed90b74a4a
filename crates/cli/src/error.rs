use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, PilotError>;

#[derive(Debug, Error)]
pub enum PilotError {
	#[error("failed to read config {}: {source}", .path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {}: {source}", .path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid config: {0}")]
	InvalidConfig(String),

	#[error("no payload script configured (pass --payload or set payloadPath)")]
	PayloadMissing,

	#[error("no debugging port found; launch the application with --remote-debugging-port or pass --port")]
	NoPort,

	#[error(transparent)]
	Runtime(#[from] pilot_runtime::Error),

	/// Process-level setup failures (signal handlers).
	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl PilotError {
	pub fn code(&self) -> ErrorCode {
		match self {
			PilotError::ConfigRead { .. } | PilotError::ConfigParse { .. } | PilotError::InvalidConfig(_) => ErrorCode::ConfigError,
			PilotError::PayloadMissing => ErrorCode::PayloadMissing,
			PilotError::NoPort => ErrorCode::NoPort,
			PilotError::Runtime(pilot_runtime::Error::InvalidArgument(_)) => ErrorCode::ConfigError,
			PilotError::Runtime(_) | PilotError::Anyhow(_) => ErrorCode::InternalError,
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		CommandError {
			code: self.code(),
			message: self.to_string(),
		}
	}
}
