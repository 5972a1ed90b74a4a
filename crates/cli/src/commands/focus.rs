use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output::{CommandResult, print_result};

#[derive(Debug, Serialize)]
struct FocusReport {
	focused: bool,
	attached: usize,
}

pub async fn execute(ctx: &Context, focused: bool) -> Result<()> {
	let manager = ctx.manager(ctx.config.observer()).await?;
	let attached = manager.attach().await;
	manager.set_focus_state(focused).await;
	manager.detach();

	print_result(&CommandResult::success("focus", FocusReport { focused, attached }), ctx.format);
	Ok(())
}
