use std::time::Duration;

use pilot_runtime::{Counters, StartSummary};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::Context;
use crate::cli::RunArgs;
use crate::error::{PilotError, Result};
use crate::output::{CommandResult, print_result};

/// One line of `run` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PassReport {
	pass: u64,
	#[serde(flatten)]
	summary: StartSummary,
	connections: usize,
	counters: Counters,
}

pub async fn execute(ctx: &Context, args: &RunArgs) -> Result<()> {
	let injector = ctx.config.injector()?;
	let interval = args.interval_ms.map(Duration::from_millis).unwrap_or_else(|| ctx.config.poll_interval());
	if interval.is_zero() {
		return Err(PilotError::InvalidConfig("--interval-ms must be positive".into()));
	}

	let manager = ctx.manager(injector).await?;
	let Some(resolved) = manager.port() else {
		return Err(PilotError::NoPort);
	};
	info!(target: "pilot.run", port = resolved.port, source = %resolved.source, interval_ms = interval.as_millis() as u64, "supervising targets");

	let start_config = ctx.config.start_config();
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let shutdown = shutdown_signal()?;
	tokio::pin!(shutdown);
	let mut pass = 0u64;

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				pass += 1;
				let summary = manager.start(&start_config).await;
				let counters = manager.stats().await;
				let report = PassReport {
					pass,
					summary,
					connections: manager.connection_count(),
					counters,
				};
				print_result(&CommandResult::success("run", report), ctx.format);
				if args.once {
					return Ok(());
				}
			}
			signal = &mut shutdown => {
				info!(target: "pilot.run", signal, "stopping payload in all targets");
				manager.stop().await;
				return Ok(());
			}
		}
	}
}

/// Resolves with the name of the first shutdown signal received.
#[cfg(unix)]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = &'static str>> {
	use anyhow::Context as _;
	use tokio::signal::unix::{SignalKind, signal};

	let mut terminate = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
	Ok(async move {
		tokio::select! {
			result = tokio::signal::ctrl_c() => interrupted(result),
			_ = terminate.recv() => "SIGTERM",
		}
	})
}

#[cfg(not(unix))]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = &'static str>> {
	Ok(async { interrupted(tokio::signal::ctrl_c().await) })
}

fn interrupted(result: std::io::Result<()>) -> &'static str {
	if let Err(e) = result {
		warn!(target: "pilot.run", error = %e, "failed to listen for Ctrl-C");
	}
	"Ctrl-C"
}
