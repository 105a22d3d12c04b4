use hydrate::{TokenInspector, now_ts};

use crate::context::CommandContext;
use crate::output::{CommandResult, InspectData, ResultBuilder};

pub fn run(ctx: &CommandContext, token: &str) -> CommandResult<InspectData> {
	let inspector = TokenInspector::new(ctx.config.clock_skew());
	ResultBuilder::new("inspect").data(InspectData::new(token, &inspector, now_ts())).build()
}
