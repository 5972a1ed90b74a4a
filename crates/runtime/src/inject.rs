//! Injection controller: one-time payload load plus guarded entry-point calls.

use pilot_protocol::Counters;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::payload::{EntryPoints, PayloadSource};
use crate::session::Session;

/// Loads the payload into sessions and drives its entry points.
///
/// Per session the payload is evaluated at most once: re-running it would
/// re-initialize its internal state and reset its counters. Every other call
/// is idempotent from this side and may be repeated freely.
#[derive(Debug, Clone)]
pub struct Injector {
	payload: PayloadSource,
	entry_points: EntryPoints,
}

impl Injector {
	pub fn new(payload: PayloadSource, entry_points: EntryPoints) -> Self {
		Self { payload, entry_points }
	}

	pub fn entry_points(&self) -> &EntryPoints {
		&self.entry_points
	}

	/// Injects the payload if this session has not had it yet, then pushes `config`.
	///
	/// A failed injection leaves the session uninjected so the next `ensure`
	/// retries it, and skips the configuration call.
	pub async fn ensure(&self, session: &Session, config: &Value) -> Result<()> {
		{
			// Held across the evaluation so concurrent callers inject once.
			let mut injected = session.injection_gate().lock().await;
			if !*injected {
				self.inject(session).await.map_err(|e| Error::InjectionFailed {
					key: session.key().clone(),
					source: Box::new(e),
				})?;
				*injected = true;
				info!(target: "pilot.inject", session = %session.key(), "payload injected");
			}
		}

		session.call(&self.entry_points.start_expression(config)).await?;
		debug!(target: "pilot.inject", session = %session.key(), "configuration applied");
		Ok(())
	}

	async fn inject(&self, session: &Session) -> Result<()> {
		let script = self.payload.load().await?;
		session.call(&script).await?;
		Ok(())
	}

	/// Asks the payload to stop, then closes the transport.
	///
	/// The stop call's outcome is ignored; the transport is closed either way.
	pub async fn teardown(&self, session: &Session) {
		if let Err(e) = session.call(&self.entry_points.stop_expression()).await {
			debug!(target: "pilot.inject", session = %session.key(), error = %e, "stop call failed");
		}
		session.close();
	}

	pub async fn set_focus_state(&self, session: &Session, focused: bool) -> Result<()> {
		session.call(&self.entry_points.focus_expression(focused)).await?;
		Ok(())
	}

	/// Reads the payload's counters; zeros when it exposes none.
	pub async fn stats(&self, session: &Session) -> Result<Counters> {
		let value = session.call(&self.entry_points.stats_expression()).await?;
		Counters::from_stats_value(&value).map_err(|e| {
			warn!(target: "pilot.inject", session = %session.key(), error = %e, "payload returned malformed stats");
			Error::Json(e)
		})
	}
}
