use clap::Parser;
use pilot_cli::cli::Cli;
use pilot_cli::error::PilotError;
use pilot_cli::output::{self, CommandResult, OutputFormat};
use pilot_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(&err, command, format);
		std::process::exit(1);
	}
}

fn handle_error(err: &PilotError, command: &'static str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	if format == OutputFormat::Json {
		output::print_result(&CommandResult::failure(command, cmd_error), format);
	}
}
