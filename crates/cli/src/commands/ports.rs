//! Launch-flag helpers shared with the shortcut-patching collaborator.

use pilot_runtime::port::extract_debugging_port;
use pilot_runtime::{has_debugging_flag, port_for_profile, user_data_dir};
use serde::Serialize;

use crate::cli::{AllocatePortArgs, CheckFlagArgs};
use crate::error::Result;
use crate::output::{CommandResult, OutputFormat, print_result};

#[derive(Debug, Serialize)]
struct AllocatePortReport {
	identity: Option<String>,
	port: u16,
}

pub fn allocate(args: &AllocatePortArgs, format: OutputFormat) -> Result<()> {
	let port = port_for_profile(args.identity.as_deref());
	let report = AllocatePortReport {
		identity: args.identity.clone(),
		port,
	};
	print_result(&CommandResult::success("allocate-port", report), format);
	Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFlagReport {
	pub has_flag: bool,
	pub debugging_port: Option<u16>,
	pub user_data_dir: Option<String>,
	/// Port the allocator assigns to the profile (the default port without one)
	pub profile_port: u16,
}

/// Inspects launch arguments the way the shortcut patcher does.
pub fn check_flag<S: AsRef<str>>(args: &[S]) -> CheckFlagReport {
	let profile = find_user_data_dir(args);
	CheckFlagReport {
		has_flag: has_debugging_flag(args),
		debugging_port: args.iter().find_map(|arg| extract_debugging_port(arg.as_ref())),
		profile_port: port_for_profile(profile.as_deref()),
		user_data_dir: profile,
	}
}

pub fn check(args: &CheckFlagArgs, format: OutputFormat) -> Result<()> {
	let report = if args.args.is_empty() {
		let own: Vec<String> = std::env::args().collect();
		check_flag(own.as_slice())
	} else {
		check_flag(args.args.as_slice())
	};
	print_result(&CommandResult::success("check-flag", report), format);
	Ok(())
}

/// A bare `--user-data-dir=<path>` token keeps its spaces; full command lines
/// go through the shared extractor.
fn find_user_data_dir<S: AsRef<str>>(args: &[S]) -> Option<String> {
	args.iter().find_map(|arg| {
		let arg = arg.as_ref();
		match arg.strip_prefix("--user-data-dir=") {
			Some(value) => Some(value.trim_matches(|c| c == '"' || c == '\'').to_string()).filter(|v| !v.is_empty()),
			None => user_data_dir(arg),
		}
	})
}

#[cfg(test)]
mod tests {
	use pilot_runtime::allocate_port;

	use super::*;

	#[test]
	fn reports_flag_and_profile_port() {
		let report = check_flag(&["/opt/editor/editor", "--remote-debugging-port=9012", "--user-data-dir=/home/me/My Profile"]);
		assert!(report.has_flag);
		assert_eq!(report.debugging_port, Some(9012));
		assert_eq!(report.user_data_dir.as_deref(), Some("/home/me/My Profile"));
		assert_eq!(report.profile_port, allocate_port("/home/me/My Profile"));
	}

	#[test]
	fn missing_flag_and_profile() {
		let report = check_flag(&["/opt/editor/editor", "--new-window"]);
		assert_eq!(
			report,
			CheckFlagReport {
				has_flag: false,
				debugging_port: None,
				user_data_dir: None,
				profile_port: 9000,
			}
		);
	}

	#[test]
	fn full_command_line_in_one_argument() {
		let report = check_flag(&[r#""C:\Editor\Editor.exe" --user-data-dir="C:\profiles\work" --remote-debugging-port=9031"#]);
		assert!(report.has_flag);
		assert_eq!(report.debugging_port, Some(9031));
		assert_eq!(report.user_data_dir.as_deref(), Some(r"C:\profiles\work"));
	}
}
