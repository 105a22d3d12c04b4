use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hydrate")]
#[command(about = "Inspect and drive a persisted client session from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Session config file (defaults to $XDG_CONFIG_HOME/hydrate/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Directory holding the cookie jar and local store
	#[arg(long, global = true, value_name = "DIR")]
	pub state_dir: Option<PathBuf>,

	/// Remote API base URL (overrides config and HYDRATE_API_URL)
	#[arg(long, global = true, value_name = "URL")]
	pub api_url: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Restore the persisted session and show it
	#[command(alias = "st")]
	Status,

	/// Persist a session record from an existing token
	Login {
		/// Bearer token
		#[arg(long)]
		token: String,
		#[arg(long, default_value = "")]
		role: String,
		/// Display name
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		tax_id: Option<String>,
	},

	/// Exchange credentials with the API and persist the resulting session
	SignIn {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},

	/// Remove the persisted session
	Logout,

	/// Decode a token's claims without touching storage
	Inspect { token: String },
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Status => "status",
			Commands::Login { .. } => "login",
			Commands::SignIn { .. } => "sign-in",
			Commands::Logout => "logout",
			Commands::Inspect { .. } => "inspect",
		}
	}
}
