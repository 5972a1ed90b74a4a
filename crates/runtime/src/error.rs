//! Error types for the session runtime.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionKey;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to debugging targets.
///
/// None of these escape the component that produced them at the process
/// level: the session manager logs and recovers from every variant.
#[derive(Debug, Error)]
pub enum Error {
	/// No response arrived for a request before its deadline.
	#[error("Timeout: request {id} got no response within {timeout_ms}ms")]
	Timeout { id: u64, timeout_ms: u64 },

	/// Opening the debugger socket failed.
	#[error("Failed to connect to {url}: {reason}")]
	ConnectionFailed { url: String, reason: String },

	/// The transport closed while the request was in flight or before it was sent.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Protocol-level error returned by the endpoint.
	#[error("Protocol error {code}: {message}")]
	Remote { code: i64, message: String },

	/// The evaluated expression threw.
	#[error("Evaluation threw: {0}")]
	Evaluation(String),

	/// The payload script could not be read.
	#[error("Payload unavailable at {}: {source}", .path.display())]
	PayloadUnavailable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Evaluating the payload inside a target failed.
	#[error("Injection into {key} failed: {source}")]
	InjectionFailed {
		key: SessionKey,
		#[source]
		source: Box<Error>,
	},

	/// Transport-level error (HTTP client setup, socket I/O).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Invalid argument provided to a constructor or operation.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this error is a missed deadline.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Timeout { .. } => true,
			Error::InjectionFailed { source, .. } => source.is_timeout(),
			_ => false,
		}
	}

	/// Returns true if the transport is gone.
	pub fn is_closed(&self) -> bool {
		match self {
			Error::ChannelClosed => true,
			Error::InjectionFailed { source, .. } => source.is_closed(),
			_ => false,
		}
	}
}
