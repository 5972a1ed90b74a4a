//! Result envelope printed by every command.
//!
//! JSON output is a single object on stdout:
//!
//! ```json
//! { "ok": true, "command": "stats", "data": { "clicks": 3, ... } }
//! ```
//!
//! Failures carry `"ok": false` and an `error` object instead of `data`.
//! `run` prints one envelope per pass, newline-delimited.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	#[default]
	Json,
	/// Human-readable `key: value` lines
	Text,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: &'static str, data: T) -> Self {
		Self {
			ok: true,
			command,
			data: Some(data),
			error: None,
		}
	}
}

impl CommandResult<()> {
	pub fn failure(command: &'static str, error: CommandError) -> Self {
		Self {
			ok: false,
			command,
			data: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Configuration file missing or malformed
	ConfigError,
	/// No payload script configured for a command that injects
	PayloadMissing,
	/// No debugging port could be resolved
	NoPort,
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::PayloadMissing => write!(f, "PAYLOAD_MISSING"),
			ErrorCode::NoPort => write!(f, "NO_PORT"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Prints `result` to stdout in `format`.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	let rendered = match format {
		OutputFormat::Json => serde_json::to_string(result).unwrap_or_else(|e| format!(r#"{{"ok":false,"error":"{e}"}}"#)),
		OutputFormat::Text => render_text(result),
	};
	let mut stdout = io::stdout().lock();
	let _ = writeln!(stdout, "{rendered}");
	let _ = stdout.flush();
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("error[{}]: {}", error.code, error.message);
}

fn render_text<T: Serialize>(result: &CommandResult<T>) -> String {
	if let Some(error) = &result.error {
		return format!("{}: {}", result.command, error.message);
	}
	let data = result.data.as_ref().and_then(|d| serde_json::to_value(d).ok()).unwrap_or_default();
	let mut lines = Vec::new();
	flatten_text("", &data, &mut lines);
	lines.join("\n")
}

fn flatten_text(prefix: &str, value: &serde_json::Value, lines: &mut Vec<String>) {
	use serde_json::Value;
	match value {
		Value::Object(map) => {
			for (key, value) in map {
				let key = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
				flatten_text(&key, value, lines);
			}
		}
		Value::Array(items) if !items.is_empty() => {
			for (index, item) in items.iter().enumerate() {
				flatten_text(&format!("{prefix}[{index}]"), item, lines);
			}
		}
		Value::String(s) => lines.push(format!("{prefix}: {s}")),
		other => lines.push(format!("{prefix}: {other}")),
	}
}
