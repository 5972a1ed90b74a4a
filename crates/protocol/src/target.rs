//! Entries of the `/json/list` target listing.

use serde::{Deserialize, Serialize};

/// Target types that host automatable UI: ordinary pages and the host's
/// embedded panels.
pub const AUTOMATABLE_TARGET_TYPES: [&str; 2] = ["page", "webview"];

/// One inspectable surface exposed by the debugging endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
	/// Opaque id assigned by the endpoint
	pub id: String,
	/// Surface kind (`page`, `webview`, `service_worker`, ...)
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Debugger socket; absent when another client already holds the target
	#[serde(rename = "webSocketDebuggerUrl", default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
}

impl Target {
	/// Returns the debugger URL when present and non-empty.
	pub fn ws_url(&self) -> Option<&str> {
		self.web_socket_debugger_url.as_deref().filter(|u| !u.is_empty())
	}

	/// Whether this target can carry the automation payload.
	pub fn is_automatable(&self) -> bool {
		self.ws_url().is_some() && AUTOMATABLE_TARGET_TYPES.contains(&self.kind.as_str())
	}
}
