//! Debugging port resolution.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::extract_debugging_port;
use super::probe::{AncestorCommandLineProbe, default_probe};

/// Environment variable consulted when nothing else names a port.
pub const PORT_ENV_VAR: &str = "ELECTRON_REMOTE_DEBUGGING_PORT";

/// How many ancestors of the current process are inspected.
pub const MAX_ANCESTOR_DEPTH: usize = 10;

/// Where a resolved port came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSource {
	Override,
	AncestorProcess,
	ProcessArgs,
	Environment,
}

impl fmt::Display for PortSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PortSource::Override => write!(f, "override"),
			PortSource::AncestorProcess => write!(f, "ancestor process"),
			PortSource::ProcessArgs => write!(f, "process arguments"),
			PortSource::Environment => write!(f, "environment"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPort {
	pub port: u16,
	pub source: PortSource,
}

/// Decides which debugging port to attach to.
///
/// Sources are tried in a fixed order and the first hit wins:
///
/// 1. Explicit override (zero counts as unset)
/// 2. `--remote-debugging-port=<n>` on one of up to [`MAX_ANCESTOR_DEPTH`]
///    ancestor command lines, nearest first
/// 3. The same flag in this process's own arguments
/// 4. [`PORT_ENV_VAR`]
///
/// With none of them the result is `None` ("strict mode"): no port is
/// guessed and no scanning is attempted.
pub struct PortResolver {
	override_port: Option<u16>,
	probe: Box<dyn AncestorCommandLineProbe>,
	args: Vec<String>,
	env_value: Option<String>,
}

impl PortResolver {
	/// Resolver with no override, arguments or environment.
	pub fn new(probe: Box<dyn AncestorCommandLineProbe>) -> Self {
		Self {
			override_port: None,
			probe,
			args: Vec::new(),
			env_value: None,
		}
	}

	/// Resolver reading this process's arguments, environment and ancestors.
	pub fn from_process(override_port: Option<u16>) -> Self {
		Self::new(default_probe())
			.with_override(override_port)
			.with_args(std::env::args())
			.with_env_value(std::env::var(PORT_ENV_VAR).ok())
	}

	pub fn with_override(mut self, port: Option<u16>) -> Self {
		self.override_port = port;
		self
	}

	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_env_value(mut self, value: Option<String>) -> Self {
		self.env_value = value;
		self
	}

	pub fn with_probe(mut self, probe: Box<dyn AncestorCommandLineProbe>) -> Self {
		self.probe = probe;
		self
	}

	pub async fn resolve(&self) -> Option<ResolvedPort> {
		let resolved = self.try_sources().await;
		match resolved {
			Some(ResolvedPort { port, source }) => {
				info!(target: "pilot.port", port, %source, "resolved debugging port");
			}
			None => {
				info!(target: "pilot.port", "no debugging port found; strict mode, automation stays inactive");
			}
		}
		resolved
	}

	async fn try_sources(&self) -> Option<ResolvedPort> {
		if let Some(port) = self.override_port.filter(|port| *port != 0) {
			return Some(ResolvedPort {
				port,
				source: PortSource::Override,
			});
		}

		let ancestors = self.probe.ancestor_command_lines(MAX_ANCESTOR_DEPTH).await;
		debug!(target: "pilot.port", probe = self.probe.name(), inspected = ancestors.len(), "scanned ancestor command lines");
		if let Some(port) = ancestors.iter().find_map(|line| extract_debugging_port(line)) {
			return Some(ResolvedPort {
				port,
				source: PortSource::AncestorProcess,
			});
		}

		if let Some(port) = self.args.iter().find_map(|arg| extract_debugging_port(arg)) {
			return Some(ResolvedPort {
				port,
				source: PortSource::ProcessArgs,
			});
		}

		let port = self.env_value.as_deref().and_then(|value| value.trim().parse::<u16>().ok()).filter(|port| *port != 0)?;
		Some(ResolvedPort {
			port,
			source: PortSource::Environment,
		})
	}
}

impl fmt::Debug for PortResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PortResolver")
			.field("override_port", &self.override_port)
			.field("probe", &self.probe.name())
			.field("args", &self.args.len())
			.field("env_value", &self.env_value)
			.finish()
	}
}
