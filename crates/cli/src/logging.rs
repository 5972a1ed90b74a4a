use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	// 0 = warnings only (per-target failures are logged at warn)
	// 1 (-v) = info: port resolution, connects, disconnects
	// 2 (-vv) = debug for pilot, info for dependencies
	// 3+ (-vvv) = trace for everything, including every frame
	let filter = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "info,pilot=debug",
		_ => "trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(verbosity >= 2)
		.with_level(true)
		.compact()
		.init();
}
