//! Cross-session counter aggregation.

use futures_util::future::join_all;
use pilot_protocol::Counters;
use tracing::{debug, trace};

use crate::inject::Injector;
use crate::registry::SessionRegistry;

/// Sums the payload counters of every registered session.
///
/// All sessions are queried concurrently. A session that fails, times out,
/// or closes mid-query contributes zero; it never affects the others.
pub async fn collect(registry: &SessionRegistry, injector: &Injector) -> Counters {
	let sessions = registry.sessions();
	let queries = sessions.iter().map(|session| async move {
		match injector.stats(session).await {
			Ok(counters) => {
				trace!(target: "pilot.telemetry", session = %session.key(), ?counters, "collected counters");
				counters
			}
			Err(e) => {
				debug!(target: "pilot.telemetry", session = %session.key(), error = %e, "stats query failed");
				Counters::default()
			}
		}
	});
	join_all(queries).await.into_iter().sum()
}
