//! JSON configuration file.
//!
//! ```json
//! {
//!   "cdpPort": 9005,
//!   "payloadPath": "payload.js",
//!   "pollIntervalMs": 5000,
//!   "payload": { "ide": "editor" },
//!   "entryPoints": { "start": "__autoAcceptStart" }
//! }
//! ```
//!
//! Every key is optional. Relative `payloadPath`s are resolved against the
//! directory holding the file. Command-line flags override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pilot_runtime::{EntryPoints, Injector, PayloadSource};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{PilotError, Result};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pilot.json";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
	/// Explicit debugging port; `0` counts as unset
	pub cdp_port: Option<u16>,
	pub payload_path: Option<PathBuf>,
	pub poll_interval_ms: Option<u64>,
	/// Opaque object handed to the payload's start entry point
	pub payload: Value,
	pub entry_points: EntryPoints,
}

impl Config {
	/// Loads `explicit`, or [`DEFAULT_CONFIG_FILE`] if it exists, or defaults.
	///
	/// A missing explicit file is an error; a missing default file is not.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::from_file(path),
			None => {
				let path = Path::new(DEFAULT_CONFIG_FILE);
				if path.is_file() { Self::from_file(path) } else { Ok(Self::default()) }
			}
		}
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|source| PilotError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		let mut config: Config = serde_json::from_str(&raw).map_err(|source| PilotError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})?;

		if let (Some(payload), Some(base)) = (&config.payload_path, path.parent()) {
			if payload.is_relative() {
				config.payload_path = Some(base.join(payload));
			}
		}

		config.validate()?;
		debug!(target: "pilot.config", path = %path.display(), "loaded config");
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.entry_points.validate()?;
		if self.poll_interval_ms == Some(0) {
			return Err(PilotError::InvalidConfig("pollIntervalMs must be positive".into()));
		}
		if !(self.payload.is_null() || self.payload.is_object()) {
			return Err(PilotError::InvalidConfig("payload must be a JSON object".into()));
		}
		Ok(())
	}

	/// Applies command-line overrides.
	pub fn with_overrides(mut self, port: Option<u16>, payload: Option<PathBuf>) -> Self {
		if port.is_some() {
			self.cdp_port = port;
		}
		if payload.is_some() {
			self.payload_path = payload;
		}
		self
	}

	pub fn poll_interval(&self) -> Duration {
		self.poll_interval_ms.map(Duration::from_millis).unwrap_or(DEFAULT_POLL_INTERVAL)
	}

	/// Argument for the start entry point; `{}` when none is configured.
	pub fn start_config(&self) -> Value {
		if self.payload.is_null() { json!({}) } else { self.payload.clone() }
	}

	/// Injector for the configured payload, for commands that inject.
	pub fn injector(&self) -> Result<Injector> {
		let path = self.payload_path.clone().ok_or(PilotError::PayloadMissing)?;
		Ok(Injector::new(PayloadSource::File(path), self.entry_points.clone()))
	}

	/// Injector for commands that only call entry points of an existing payload.
	pub fn observer(&self) -> Injector {
		Injector::new(PayloadSource::inline(""), self.entry_points.clone())
	}
}
