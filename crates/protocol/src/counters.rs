//! Telemetry totals reported by the injected payload.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named activity totals.
///
/// The payload reports these as a JSON string; fields it omits count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Counters {
	pub clicks: u64,
	pub blocked: u64,
	pub file_edits: u64,
	pub terminal_commands: u64,
}

impl Counters {
	/// Parses the value returned by the payload's stats entry point.
	///
	/// Accepts the JSON string the payload produces (possibly stringified
	/// twice over) or an already decoded object. Non-numeric, negative, or
	/// missing fields read as zero; anything else yields all zeros.
	pub fn from_stats_value(value: &Value) -> Result<Self, serde_json::Error> {
		match value {
			Value::String(raw) => Self::from_stats_value(&serde_json::from_str(raw)?),
			Value::Object(map) => Ok(Self::from_object(map)),
			_ => Ok(Self::default()),
		}
	}

	fn from_object(map: &Map<String, Value>) -> Self {
		let field = |name: &str| map.get(name).map(as_count).unwrap_or(0);
		Self {
			clicks: field("clicks"),
			blocked: field("blocked"),
			file_edits: field("fileEdits"),
			terminal_commands: field("terminalCommands"),
		}
	}

	pub fn is_zero(&self) -> bool {
		*self == Self::default()
	}
}

fn as_count(value: &Value) -> u64 {
	value
		.as_u64()
		.or_else(|| value.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
		.unwrap_or(0)
}

/// Field-wise saturating addition.
impl AddAssign for Counters {
	fn add_assign(&mut self, rhs: Self) {
		self.clicks = self.clicks.saturating_add(rhs.clicks);
		self.blocked = self.blocked.saturating_add(rhs.blocked);
		self.file_edits = self.file_edits.saturating_add(rhs.file_edits);
		self.terminal_commands = self.terminal_commands.saturating_add(rhs.terminal_commands);
	}
}

impl Add for Counters {
	type Output = Self;

	fn add(mut self, rhs: Self) -> Self {
		self += rhs;
		self
	}
}

impl std::iter::Sum for Counters {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Self::default(), Add::add)
	}
}
