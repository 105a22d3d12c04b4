use hydrate::{SessionRecord, now_ts};
use tracing::info;

use super::{settle_with_login, with_notice};
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, SessionData};

pub async fn run(ctx: &CommandContext, record: SessionRecord) -> Result<CommandResult<SessionData>> {
	if !record.is_present() {
		return Err(CliError::InvalidInput("token must not be empty".into()));
	}

	let mut host = ctx.host()?;
	let report = settle_with_login(&mut host, record).await?;
	info!(target: "hydrate.cli", passes = report.passes, authenticated = report.session.is_authenticated(), "login settled");

	let backends = host.storage().backend_names().into_iter().map(String::from).collect();
	Ok(with_notice("login", SessionData::from_report(&report, backends, now_ts()), &report))
}
