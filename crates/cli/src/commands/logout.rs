use hydrate::{PassResult, now_ts};

use super::with_notice;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CommandResult, LogoutData, SessionData};

pub async fn run(ctx: &CommandContext) -> Result<CommandResult<LogoutData>> {
	let mut host = ctx.host()?;

	let mut was_authenticated = None;
	let report = host
		.settle(|pass| {
			if was_authenticated.is_some() {
				return PassResult::Continue;
			}
			was_authenticated = Some(pass.is_authenticated());
			pass.logout()
		})
		.await?;

	let backends = host.storage().backend_names().into_iter().map(String::from).collect();
	let data = LogoutData {
		was_authenticated: was_authenticated.unwrap_or(false),
		session: SessionData::from_report(&report, backends, now_ts()),
	};
	Ok(with_notice("logout", data, &report))
}
