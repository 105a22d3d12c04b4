use clap::Parser;
use hydrate_cli::cli::Cli;
use hydrate_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		error!(target: "hydrate.cli", error = %err, "command failed");
		commands::report_failure(command, &err, format);
		std::process::exit(1);
	}
}
