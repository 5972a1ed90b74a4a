#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Keeps an automation payload running in every window of a
/// remote-debuggable desktop application.
#[derive(Parser, Debug)]
#[command(name = "pilot")]
#[command(about = "Drive an injected automation payload over the remote-debugging protocol")]
#[command(version)]
#[command(styles = styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// JSON configuration file (default: ./pilot.json when present)
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Debugging port; skips discovery
	#[arg(short, long, global = true, value_name = "PORT")]
	pub port: Option<u16>,

	/// Payload script injected into each target
	#[arg(long, global = true, value_name = "FILE")]
	pub payload: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Inject the payload everywhere and keep it configured until Ctrl-C.
	Run(RunArgs),
	/// Show the resolved port and the automatable targets behind it.
	Status,
	/// Print counters aggregated across all targets.
	Stats,
	/// Tell every payload whether the host window has focus.
	Focus(FocusArgs),
	/// Print the port a profile identity maps to.
	AllocatePort(AllocatePortArgs),
	/// Check launch arguments for the debugging flag.
	CheckFlag(CheckFlagArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
	/// Milliseconds between passes (overrides pollIntervalMs)
	#[arg(long, value_name = "MS")]
	pub interval_ms: Option<u64>,

	/// Run a single pass and exit without stopping the payload
	#[arg(long)]
	pub once: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FocusArgs {
	#[arg(value_name = "FOCUSED", action = clap::ArgAction::Set)]
	pub focused: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AllocatePortArgs {
	/// Profile identity, usually a user-data-dir path; omitted means the default profile
	#[arg(value_name = "IDENTITY")]
	pub identity: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckFlagArgs {
	/// Arguments to inspect; this process's own arguments when omitted
	#[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
	pub args: Vec<String>,
}

/// Cargo-like help colors.
fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}
