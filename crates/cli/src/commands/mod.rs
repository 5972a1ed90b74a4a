mod focus;
mod ports;
mod run;
mod stats;
mod status;

use pilot_runtime::{Injector, PortResolver, SessionManager};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputFormat;

pub use ports::{CheckFlagReport, check_flag};

/// Everything a command needs besides its own arguments.
pub struct Context {
	pub config: Config,
	pub format: OutputFormat,
}

impl Context {
	/// Resolves the debugging port and wraps it in a manager driving `injector`.
	pub async fn manager(&self, injector: Injector) -> Result<SessionManager> {
		let resolver = PortResolver::from_process(self.config.cdp_port);
		Ok(SessionManager::resolve(&resolver, injector).await?)
	}
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Run(_) => "run",
			Commands::Status => "status",
			Commands::Stats => "stats",
			Commands::Focus(_) => "focus",
			Commands::AllocatePort(_) => "allocate-port",
			Commands::CheckFlag(_) => "check-flag",
		}
	}
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let Cli {
		format,
		config,
		port,
		payload,
		command,
		..
	} = cli;
	// Only commands that talk to targets read the config file.
	let context = || -> Result<Context> {
		Ok(Context {
			config: Config::load(config.as_deref())?.with_overrides(port, payload.clone()),
			format,
		})
	};

	match command {
		Commands::Run(args) => run::execute(&context()?, &args).await,
		Commands::Status => status::execute(&context()?).await,
		Commands::Stats => stats::execute(&context()?).await,
		Commands::Focus(args) => focus::execute(&context()?, args.focused).await,
		Commands::AllocatePort(args) => ports::allocate(&args, format),
		Commands::CheckFlag(args) => ports::check(&args, format),
	}
}
