use hydrate::{SignInOutcome, now_ts};

use super::{settle_with_login, with_notice};
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, SessionData};

pub async fn run(ctx: &CommandContext, email: &str, password: &str) -> Result<CommandResult<SessionData>> {
	let api = ctx
		.api()?
		.ok_or_else(|| CliError::InvalidInput("no API URL configured; pass --api-url or set HYDRATE_API_URL".into()))?;

	let record = match api.sign_in(email, password).await {
		SignInOutcome::Authenticated(record) => record,
		SignInOutcome::Unverified { email } => {
			return Err(CliError::Auth(format!("{email} has not been verified yet; check your inbox")));
		}
		SignInOutcome::InvalidCredentials { detail } => return Err(CliError::Auth(detail)),
		SignInOutcome::Rejected { status, detail } => return Err(CliError::Api { status, detail }),
		SignInOutcome::Connection { detail } => return Err(CliError::Network(detail)),
	};

	let mut host = ctx.host()?;
	let report = settle_with_login(&mut host, record).await?;
	let backends = host.storage().backend_names().into_iter().map(String::from).collect();
	Ok(with_notice("sign-in", SessionData::from_report(&report, backends, now_ts()), &report))
}
