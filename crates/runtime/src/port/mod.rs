//! Debugging port resolution and allocation.
//!
//! - [`resolver`]: the fixed priority chain that decides which port to attach to
//! - [`probe`]: ancestor-process command-line inspection used by the chain
//! - [`allocator`]: the profile-identity → port hash shared with the
//!   shortcut-patching collaborator

use std::sync::LazyLock;

use regex_lite::Regex;

pub mod allocator;
pub mod probe;
pub mod resolver;

pub use allocator::{BASE_PORT, DEFAULT_PORT, PORT_RANGE, allocate_port, port_for_profile, user_data_dir};
pub use probe::{AncestorCommandLineProbe, NoopProbe, PowerShellProbe, ProcfsProbe, PsProbe, default_probe};
pub use resolver::{MAX_ANCESTOR_DEPTH, PORT_ENV_VAR, PortResolver, PortSource, ResolvedPort};

/// Command-line flag that exposes the debugging endpoint.
pub const DEBUGGING_PORT_FLAG: &str = "--remote-debugging-port";

static DEBUGGING_PORT_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--remote-debugging-port=(\d+)").expect("valid regex"));

/// Extracts the first usable `--remote-debugging-port=<digits>` value from `text`.
///
/// Values that are zero or do not fit a TCP port are skipped.
pub fn extract_debugging_port(text: &str) -> Option<u16> {
	DEBUGGING_PORT_TOKEN
		.captures_iter(text)
		.filter_map(|caps| caps.get(1))
		.filter_map(|m| m.as_str().parse::<u16>().ok())
		.find(|port| *port != 0)
}

/// Whether any of `args` carries the debugging-port flag with a value.
pub fn has_debugging_flag<S: AsRef<str>>(args: &[S]) -> bool {
	args.iter().any(|arg| DEBUGGING_PORT_TOKEN.is_match(arg.as_ref()))
}
