//! The injected automation script and its calling convention.
//!
//! The payload is opaque: it is evaluated once in a target's global scope and
//! is then driven through four optional global functions. Every expression
//! built here guards on the function's existence, so a payload that is not
//! (yet) initialized or exposes a different API turns each call into a no-op
//! instead of a `ReferenceError`.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Where the payload script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
	/// Read from disk on every injection.
	File(PathBuf),
	Inline(Arc<str>),
}

impl PayloadSource {
	pub fn inline(script: impl Into<Arc<str>>) -> Self {
		PayloadSource::Inline(script.into())
	}

	pub async fn load(&self) -> Result<Arc<str>> {
		match self {
			PayloadSource::Inline(script) => Ok(Arc::clone(script)),
			PayloadSource::File(path) => tokio::fs::read_to_string(path)
				.await
				.map(Arc::from)
				.map_err(|source| Error::PayloadUnavailable { path: path.clone(), source }),
		}
	}
}

/// Names of the payload's global entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPoints {
	/// `start(config)`: applies configuration and (re)starts the automation.
	pub start: String,
	pub stop: String,
	/// `getStats()`: returns a JSON string of [`pilot_protocol::Counters`].
	pub get_stats: String,
	/// `setFocusState(bool)`
	pub set_focus_state: String,
}

impl Default for EntryPoints {
	fn default() -> Self {
		Self {
			start: "__autoAcceptStart".into(),
			stop: "__autoAcceptStop".into(),
			get_stats: "__autoAcceptGetStats".into(),
			set_focus_state: "__autoAcceptSetFocusState".into(),
		}
	}
}

impl EntryPoints {
	/// Rejects names that are not plain JavaScript identifiers.
	///
	/// Names are spliced into expressions verbatim, so anything else could
	/// change what gets evaluated.
	pub fn validate(&self) -> Result<()> {
		for (role, name) in [
			("start", &self.start),
			("stop", &self.stop),
			("getStats", &self.get_stats),
			("setFocusState", &self.set_focus_state),
		] {
			if !is_identifier(name) {
				return Err(Error::InvalidArgument(format!("entry point {role} is not a JavaScript identifier: {name:?}")));
			}
		}
		Ok(())
	}

	pub fn start_expression(&self, config: &Value) -> String {
		guarded_call(&self.start, &config.to_string())
	}

	pub fn stop_expression(&self) -> String {
		guarded_call(&self.stop, "")
	}

	/// Evaluates to a JSON string; `"{}"` when the entry point is absent.
	pub fn stats_expression(&self) -> String {
		format!("JSON.stringify(window.{0} ? window.{0}() : {{}})", self.get_stats)
	}

	pub fn focus_expression(&self, focused: bool) -> String {
		guarded_call(&self.set_focus_state, if focused { "true" } else { "false" })
	}
}

fn guarded_call(name: &str, args: &str) -> String {
	format!("if(window.{name}) window.{name}({args})")
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn default_expressions() {
		let entry = EntryPoints::default();
		assert_eq!(entry.stop_expression(), "if(window.__autoAcceptStop) window.__autoAcceptStop()");
		assert_eq!(
			entry.stats_expression(),
			"JSON.stringify(window.__autoAcceptGetStats ? window.__autoAcceptGetStats() : {})"
		);
		assert_eq!(
			entry.focus_expression(false),
			"if(window.__autoAcceptSetFocusState) window.__autoAcceptSetFocusState(false)"
		);
	}

	#[test]
	fn start_embeds_config_as_json() {
		let entry = EntryPoints::default();
		let expr = entry.start_expression(&json!({"ide": "editor", "pollInterval": 800}));
		assert_eq!(
			expr,
			r#"if(window.__autoAcceptStart) window.__autoAcceptStart({"ide":"editor","pollInterval":800})"#
		);
	}

	#[test]
	fn partial_entry_points_fill_defaults() {
		let entry: EntryPoints = serde_json::from_value(json!({"start": "myStart"})).unwrap();
		assert_eq!(entry.start, "myStart");
		assert_eq!(entry.stop, "__autoAcceptStop");
		assert!(entry.validate().is_ok());
	}

	#[test]
	fn rejects_non_identifiers() {
		let entry = EntryPoints {
			stop: "x);alert(1".into(),
			..Default::default()
		};
		assert!(matches!(entry.validate(), Err(Error::InvalidArgument(_))));
		assert!(!is_identifier(""));
		assert!(!is_identifier("9lives"));
		assert!(is_identifier("$_ok9"));
	}

	#[tokio::test]
	async fn missing_file_is_unavailable() {
		let dir = tempfile::tempdir().unwrap();
		let source = PayloadSource::File(dir.path().join("absent.js"));
		match source.load().await {
			Err(Error::PayloadUnavailable { path, .. }) => assert!(path.ends_with("absent.js")),
			other => panic!("expected payload unavailable, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn file_is_read() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("payload.js");
		std::fs::write(&path, "window.__loaded = true;").unwrap();
		let script = PayloadSource::File(path).load().await.unwrap();
		assert_eq!(&*script, "window.__loaded = true;");
	}
}
