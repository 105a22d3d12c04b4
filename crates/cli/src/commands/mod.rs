//! Command implementations.
//!
//! Every session command drives the same host: passes are re-run until one
//! completes, and the settled session is reported.

mod inspect;
mod login;
mod logout;
mod sign_in;
mod status;

use hydrate::{PassReport, PassResult, SessionHost, SessionRecord};
use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, OutputFormat, RenderText, ResultBuilder, print_result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::from_cli(&cli)?;
	let format = cli.format;

	match cli.command {
		Commands::Status => print_result(&status::run(&ctx).await?, format),
		Commands::Login { token, role, name, tax_id } => {
			let mut record = SessionRecord::new(token, role);
			if let Some(name) = name {
				record = record.with_display_name(name);
			}
			if let Some(tax_id) = tax_id {
				record = record.with_tax_id(tax_id);
			}
			print_result(&login::run(&ctx, record).await?, format);
		}
		Commands::SignIn { email, password } => print_result(&sign_in::run(&ctx, &email, &password).await?, format),
		Commands::Logout => print_result(&logout::run(&ctx).await?, format),
		Commands::Inspect { token } => print_result(&inspect::run(&ctx, &token), format),
	}

	Ok(())
}

/// Prints a failed command in the requested format.
pub fn report_failure(command: &str, err: &CliError, format: OutputFormat) {
	let result: CommandResult<()> = ResultBuilder::new(command).error(err.code(), err.to_string()).build();
	print_result(&result, format);
}

/// Settles a host whose first completed pass logs `record` in.
async fn settle_with_login(host: &mut SessionHost, record: SessionRecord) -> Result<PassReport> {
	let mut pending = Some(record);
	let report = host
		.settle(|ctx| match pending.take() {
			Some(record) => ctx.login(record),
			None => PassResult::Continue,
		})
		.await?;
	Ok(report)
}

/// Wraps a payload, turning the session's pending notice into a diagnostic.
fn with_notice<T: Serialize + RenderText>(command: &str, data: T, report: &PassReport) -> CommandResult<T> {
	let mut builder = ResultBuilder::new(command).data(data);
	if let Some(notice) = report.session.flash() {
		builder = builder.diagnostic(notice.kind.into(), notice.message.clone());
	}
	builder.build()
}
