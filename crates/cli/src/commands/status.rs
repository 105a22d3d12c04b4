use hydrate::{PassResult, now_ts};

use super::with_notice;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CommandResult, SessionData};

pub async fn run(ctx: &CommandContext) -> Result<CommandResult<SessionData>> {
	let mut host = ctx.host()?;
	let report = host.settle(|_| PassResult::Continue).await?;
	let backends = host.storage().backend_names().into_iter().map(String::from).collect();

	Ok(with_notice("status", SessionData::from_report(&report, backends, now_ts()), &report))
}
