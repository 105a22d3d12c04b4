//! Login and logout: the only writers of the persisted session record.

use hydrate_protocol::SessionRecord;
use tracing::{info, warn};

use crate::cache::Notice;
use crate::pass::{AbortReason, PassContext, PassResult};
use crate::storage::WriteOptions;
use crate::token::fingerprint;

/// Persists `record`, mirrors it into the cache and ends the pass.
///
/// Calling it twice with the same record leaves the same cache; only the
/// storage write is repeated. A record without a token is ignored.
pub fn login(ctx: &mut PassContext<'_>, record: SessionRecord) -> PassResult {
	if !record.is_present() {
		warn!(target: "hydrate.lifecycle", "ignoring login without a token");
		return PassResult::Continue;
	}

	let options = WriteOptions::new(ctx.config.ttl(), ctx.config.cookie_path.clone());
	match record.to_blob() {
		Ok(blob) => ctx.storage.write(&ctx.config.storage_key, &blob, &options),
		Err(err) => warn!(target: "hydrate.lifecycle", error = %err, "could not serialize session; keeping it in memory only"),
	}

	ctx.cache.absorb(&record);
	ctx.cache.navigate(ctx.config.home_view.clone());
	info!(target: "hydrate.lifecycle", token = %fingerprint(&record.token), role = %record.role, "logged in");
	PassResult::Abort(AbortReason::LoggedIn)
}

/// Removes the persisted record, clears the cache and ends the pass.
pub fn logout(ctx: &mut PassContext<'_>) -> PassResult {
	clear_session(ctx);
	info!(target: "hydrate.lifecycle", "logged out");
	PassResult::Abort(AbortReason::LoggedOut)
}

/// Logout forced by expiry or revocation, leaving `notice` for the next render.
pub(crate) fn end_session(ctx: &mut PassContext<'_>, reason: AbortReason, notice: Notice) -> PassResult {
	clear_session(ctx);
	ctx.cache.set_flash(notice);
	info!(target: "hydrate.lifecycle", %reason, "session ended");
	PassResult::Abort(reason)
}

fn clear_session(ctx: &mut PassContext<'_>) {
	let key = &ctx.config.storage_key;
	let path = &ctx.config.cookie_path;

	// Expired overwrite first: some stores ignore deletes.
	ctx.storage.write(key, "", &WriteOptions::expired(path.clone()));
	ctx.storage.delete(key, path);
	ctx.storage.discard_snapshot();

	ctx.cache.clear();
	ctx.cache.navigate(ctx.config.login_view.clone());
}
