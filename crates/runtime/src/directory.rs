//! Client for the debugging endpoint's `/json/list` target listing.

use std::time::Duration;

use pilot_protocol::Target;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Bound on the whole listing request.
pub const LISTING_TIMEOUT: Duration = Duration::from_millis(500);

/// Loopback host every endpoint is resolved on.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Lists automatable targets on a local debugging endpoint.
#[derive(Debug, Clone)]
pub struct TargetDirectory {
	client: reqwest::Client,
	timeout: Duration,
}

impl TargetDirectory {
	pub fn new() -> Result<Self> {
		Self::with_timeout(LISTING_TIMEOUT)
	}

	pub fn with_timeout(timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.no_proxy()
			.build()
			.map_err(|e| Error::TransportError(format!("Failed to create HTTP client: {}", e)))?;
		Ok(Self { client, timeout })
	}

	/// Lists the automatable targets on `port`.
	///
	/// Never fails: an unreachable endpoint, a timeout, a non-success status,
	/// or a malformed body all produce an empty list. Entries that are not
	/// automatable pages or webviews, or that cannot be parsed, are dropped.
	pub async fn list_targets(&self, port: u16) -> Vec<Target> {
		match self.fetch(port).await {
			Ok(raw) => {
				let total = raw.len();
				let targets: Vec<Target> = raw
					.into_iter()
					.filter_map(|entry| serde_json::from_value::<Target>(entry).ok())
					.filter(Target::is_automatable)
					.collect();
				trace!(target: "pilot.directory", port, total, automatable = targets.len(), "listed targets");
				targets
			}
			Err(reason) => {
				debug!(target: "pilot.directory", port, %reason, "target listing unavailable");
				Vec::new()
			}
		}
	}

	/// Whether at least one automatable target is listed on `port`.
	pub async fn is_available(&self, port: u16) -> bool {
		!self.list_targets(port).await.is_empty()
	}

	async fn fetch(&self, port: u16) -> std::result::Result<Vec<Value>, String> {
		let url = listing_url(port);
		// The client timeout covers the body; this also bounds name resolution and connect.
		let response = tokio::time::timeout(self.timeout, self.client.get(&url).send())
			.await
			.map_err(|_| format!("no response within {}ms", self.timeout.as_millis()))?
			.map_err(|e| e.to_string())?;

		if !response.status().is_success() {
			return Err(format!("unexpected status {}", response.status()));
		}

		let body: Value = response.json().await.map_err(|e| e.to_string())?;
		match body {
			Value::Array(entries) => Ok(entries),
			other => Err(format!("expected a JSON array, got {}", json_kind(&other))),
		}
	}
}

pub fn listing_url(port: u16) -> String {
	format!("http://{LOOPBACK_HOST}:{port}/json/list")
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
