use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_run_with_globals() {
	let cli = Cli::try_parse_from(["pilot", "-vv", "--port", "9005", "--payload", "payload.js", "run", "--interval-ms", "750"]).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.port, Some(9005));
	assert_eq!(cli.payload, Some(PathBuf::from("payload.js")));
	match cli.command {
		Commands::Run(args) => {
			assert_eq!(args.interval_ms, Some(750));
			assert!(!args.once);
		}
		_ => panic!("Expected Run command"),
	}
}

#[test]
fn globals_after_subcommand() {
	let cli = Cli::try_parse_from(["pilot", "status", "-c", "/etc/pilot.json", "-f", "text"]).unwrap();
	assert!(matches!(cli.command, Commands::Status));
	assert_eq!(cli.config, Some(PathBuf::from("/etc/pilot.json")));
	assert_eq!(cli.format, OutputFormat::Text);
}

#[test]
fn parse_focus_bool() {
	let cli = Cli::try_parse_from(["pilot", "focus", "false"]).unwrap();
	match cli.command {
		Commands::Focus(args) => assert!(!args.focused),
		_ => panic!("Expected Focus command"),
	}
	assert!(Cli::try_parse_from(["pilot", "focus", "maybe"]).is_err());
}

#[test]
fn parse_allocate_port_optional_identity() {
	let cli = Cli::try_parse_from(["pilot", "allocate-port"]).unwrap();
	match cli.command {
		Commands::AllocatePort(args) => assert_eq!(args.identity, None),
		_ => panic!("Expected AllocatePort command"),
	}

	let cli = Cli::try_parse_from(["pilot", "allocate-port", "/home/me/.config/Editor"]).unwrap();
	match cli.command {
		Commands::AllocatePort(args) => assert_eq!(args.identity.as_deref(), Some("/home/me/.config/Editor")),
		_ => panic!("Expected AllocatePort command"),
	}
}

#[test]
fn check_flag_accepts_hyphenated_args() {
	let cli = Cli::try_parse_from(["pilot", "check-flag", "editor", "--remote-debugging-port=9001", "--user-data-dir=/tmp/p"]).unwrap();
	match cli.command {
		Commands::CheckFlag(args) => {
			assert_eq!(args.args, vec!["editor", "--remote-debugging-port=9001", "--user-data-dir=/tmp/p"]);
		}
		_ => panic!("Expected CheckFlag command"),
	}
}

#[test]
fn rejects_out_of_range_port() {
	assert!(Cli::try_parse_from(["pilot", "--port", "70000", "status"]).is_err());
}
