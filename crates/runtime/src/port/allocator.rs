//! Deterministic profile → port allocation.
//!
//! The shortcut-patching collaborator writes `--remote-debugging-port=<p>`
//! into the launch shortcut using exactly this rule, so both sides agree on
//! the port of a profile without any runtime handshake.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Reserved for instances launched without a dedicated profile.
pub const BASE_PORT: u16 = 9000;

/// Port used when no profile identity is available.
pub const DEFAULT_PORT: u16 = BASE_PORT;

/// Number of ports profiles are spread over (9001..=9050).
pub const PORT_RANGE: u16 = 50;

static USER_DATA_DIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"--user-data-dir=["']?([^"'\s]+)["']?"#).expect("valid regex"));

/// Maps a profile identity (usually a user-data-dir path) to a stable port.
///
/// MD5 of the UTF-8 bytes; the first two digest bytes read as a
/// little-endian `u16`, reduced into `BASE_PORT + 1 ..= BASE_PORT + PORT_RANGE`.
pub fn allocate_port(identity: &str) -> u16 {
	let digest = md5::compute(identity.as_bytes());
	let v = u16::from_le_bytes([digest.0[0], digest.0[1]]);
	BASE_PORT + 1 + (v % PORT_RANGE)
}

/// Port for an optional profile: [`DEFAULT_PORT`] without one.
pub fn port_for_profile(profile: Option<&str>) -> u16 {
	match profile {
		Some(identity) if !identity.is_empty() => allocate_port(identity),
		_ => DEFAULT_PORT,
	}
}

/// Extracts the `--user-data-dir=` value from a launch command line.
pub fn user_data_dir(command_line: &str) -> Option<String> {
	USER_DATA_DIR.captures(command_line).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}
