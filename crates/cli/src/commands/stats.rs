use pilot_runtime::Counters;
use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output::{CommandResult, print_result};

#[derive(Debug, Serialize)]
struct StatsReport {
	attached: usize,
	#[serde(flatten)]
	counters: Counters,
}

/// Reads counters from every target without disturbing the running payload.
pub async fn execute(ctx: &Context) -> Result<()> {
	let manager = ctx.manager(ctx.config.observer()).await?;
	let attached = manager.attach().await;
	let counters = manager.stats().await;
	manager.detach();

	print_result(&CommandResult::success("stats", StatsReport { attached, counters }), ctx.format);
	Ok(())
}
