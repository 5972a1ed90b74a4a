//! High-level facade tying discovery, sessions, injection and telemetry together.

use std::sync::Arc;

use futures_util::future::join_all;
use pilot_protocol::{Counters, Target};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::directory::TargetDirectory;
use crate::error::Result;
use crate::inject::Injector;
use crate::port::{PortResolver, ResolvedPort};
use crate::registry::SessionRegistry;
use crate::session::{Session, SessionKey, SessionOptions};
use crate::telemetry;

/// Outcome of one [`SessionManager::start`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSummary {
	/// Automatable targets listed on the endpoint.
	pub listed: usize,
	/// Targets that have a live session after the pass.
	pub connected: usize,
	/// Sessions whose configuration push succeeded.
	pub configured: usize,
}

/// Keeps the payload active on every automatable target of one endpoint.
///
/// The port is resolved once; without one the manager stays inert and every
/// operation is a cheap no-op. All failures are handled per target and
/// logged, so none of the operations return errors.
pub struct SessionManager {
	port: Option<ResolvedPort>,
	directory: TargetDirectory,
	registry: SessionRegistry,
	injector: Injector,
	options: SessionOptions,
}

impl SessionManager {
	pub fn new(port: Option<ResolvedPort>, injector: Injector) -> Result<Self> {
		Ok(Self {
			port,
			directory: TargetDirectory::new()?,
			registry: SessionRegistry::new(),
			injector,
			options: SessionOptions::default(),
		})
	}

	/// Runs the resolver and builds a manager for whatever it finds.
	pub async fn resolve(resolver: &PortResolver, injector: Injector) -> Result<Self> {
		Self::new(resolver.resolve().await, injector)
	}

	pub fn with_session_options(mut self, options: SessionOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_directory(mut self, directory: TargetDirectory) -> Self {
		self.directory = directory;
		self
	}

	pub fn port(&self) -> Option<ResolvedPort> {
		self.port
	}

	pub fn registry(&self) -> &SessionRegistry {
		&self.registry
	}

	pub fn injector(&self) -> &Injector {
		&self.injector
	}

	/// Connects to new targets and pushes `config` to every listed one.
	///
	/// Sessions already registered are reused; those whose transport has
	/// closed are dropped first so their targets get a fresh session.
	pub async fn start(&self, config: &Value) -> StartSummary {
		let Some(ResolvedPort { port, .. }) = self.port else {
			debug!(target: "pilot.manager", "no debugging port; start skipped");
			return StartSummary::default();
		};

		let pruned = self.registry.prune_closed();
		if pruned > 0 {
			debug!(target: "pilot.manager", pruned, "dropped closed sessions");
		}

		let targets = self.directory.list_targets(port).await;
		let outcomes = join_all(targets.iter().map(|target| self.start_target(port, target, config))).await;

		let summary = StartSummary {
			listed: targets.len(),
			connected: outcomes.iter().filter(|o| o.is_some()).count(),
			configured: outcomes.iter().filter(|o| **o == Some(true)).count(),
		};
		debug!(target: "pilot.manager", port, ?summary, "start pass finished");
		summary
	}

	/// `None` when no session could be established; otherwise whether `ensure` succeeded.
	async fn start_target(&self, port: u16, target: &Target, config: &Value) -> Option<bool> {
		if !self.registry.connect(port, target, &self.options).await {
			return None;
		}
		// The socket may close between connect and lookup.
		let session = self.registry.get(&SessionKey::new(port, target.id.clone()))?;
		match self.injector.ensure(&session, config).await {
			Ok(()) => Some(true),
			Err(e) => {
				warn!(target: "pilot.manager", session = %session.key(), error = %e, "failed to drive payload");
				Some(false)
			}
		}
	}

	/// Connects to every listed target without touching its payload.
	///
	/// Returns the number of live sessions afterwards.
	pub async fn attach(&self) -> usize {
		let Some(ResolvedPort { port, .. }) = self.port else {
			return 0;
		};
		self.registry.prune_closed();
		let targets = self.directory.list_targets(port).await;
		join_all(targets.iter().map(|target| self.registry.connect(port, target, &self.options))).await;
		self.registry.len()
	}

	/// Closes every session without calling the payload's stop entry point.
	pub fn detach(&self) {
		for session in self.registry.drain() {
			session.close();
		}
	}

	/// Stops the payload in every session and closes them all.
	pub async fn stop(&self) {
		let sessions = self.registry.drain();
		if sessions.is_empty() {
			return;
		}
		let count = sessions.len();
		join_all(sessions.iter().map(|session| self.injector.teardown(session))).await;
		info!(target: "pilot.manager", sessions = count, "stopped all sessions");
	}

	/// Aggregated counters across all sessions.
	pub async fn stats(&self) -> Counters {
		telemetry::collect(&self.registry, &self.injector).await
	}

	/// Tells every session's payload whether the host window has focus.
	pub async fn set_focus_state(&self, focused: bool) {
		let sessions = self.registry.sessions();
		join_all(sessions.iter().map(|session| self.focus_one(session, focused))).await;
	}

	async fn focus_one(&self, session: &Arc<Session>, focused: bool) {
		if let Err(e) = self.injector.set_focus_state(session, focused).await {
			debug!(target: "pilot.manager", session = %session.key(), error = %e, "focus update failed");
		}
	}

	/// Automatable targets on the resolved port; empty without one.
	pub async fn targets(&self) -> Vec<Target> {
		match self.port {
			Some(resolved) => self.directory.list_targets(resolved.port).await,
			None => Vec::new(),
		}
	}

	/// Whether at least one automatable target is listed on the resolved port.
	pub async fn is_available(&self) -> bool {
		match self.port {
			Some(resolved) => self.directory.is_available(resolved.port).await,
			None => false,
		}
	}

	pub fn connection_count(&self) -> usize {
		self.registry.len()
	}
}
