use pilot_runtime::{PortSource, Target};
use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output::{CommandResult, print_result};

#[derive(Debug, Serialize)]
struct StatusReport {
	port: Option<u16>,
	source: Option<PortSource>,
	available: bool,
	targets: Vec<Target>,
}

/// Reports the resolved port and its targets. No port is a valid answer, not an error.
pub async fn execute(ctx: &Context) -> Result<()> {
	let manager = ctx.manager(ctx.config.observer()).await?;
	let targets = manager.targets().await;
	let report = StatusReport {
		port: manager.port().map(|resolved| resolved.port),
		source: manager.port().map(|resolved| resolved.source),
		available: !targets.is_empty(),
		targets,
	};
	print_result(&CommandResult::success("status", report), ctx.format);
	Ok(())
}
