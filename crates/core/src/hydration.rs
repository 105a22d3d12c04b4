//! Hydration state machine run at the start of every pass.
//!
//! ```text
//! UNINITIALIZED -> AWAITING_STORAGE -> { HYDRATED_ACTIVE | HYDRATED_EMPTY }
//! HYDRATED_ACTIVE -> EXPIRED | LOGGED_OUT
//! ```
//!
//! Storage is trusted for continuity, the server only for revocation: a
//! populated cache is never downgraded by a stale or pending read, and a
//! failing profile check never logs the user out unless it answers 401/403.

use hydrate_protocol::SessionRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ProfileOutcome, ProfileSource};
use crate::cache::Notice;
use crate::config::SessionConfig;
use crate::lifecycle;
use crate::pass::{AbortReason, PassContext, PassResult};
use crate::storage::StorageSnapshot;
use crate::token::{TokenInspector, fingerprint};

pub const EXPIRED_NOTICE: &str = "Your session expired. Please sign in again.";
pub const REVOKED_NOTICE: &str = "Your session expired or is no longer valid. Please sign in again.";
pub const PROFILE_UNAVAILABLE_NOTICE: &str = "Could not refresh your profile right now; continuing with the saved session.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationState {
	Uninitialized,
	AwaitingStorage,
	HydratedActive,
	HydratedEmpty,
	Expired,
	LoggedOut,
}

impl std::fmt::Display for HydrationState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			HydrationState::Uninitialized => "uninitialized",
			HydrationState::AwaitingStorage => "awaiting_storage",
			HydrationState::HydratedActive => "hydrated_active",
			HydrationState::HydratedEmpty => "hydrated_empty",
			HydrationState::Expired => "expired",
			HydrationState::LoggedOut => "logged_out",
		};
		f.write_str(name)
	}
}

/// Populates the session cache from storage and enforces expiry.
///
/// Lives across passes (in the host) so it can bound PENDING re-passes and
/// remember the last token it rejected.
#[derive(Debug, Clone)]
pub struct HydrationController {
	state: HydrationState,
	inspector: TokenInspector,
	max_pending_passes: u32,
	pending_passes: u32,
	rejected_token: Option<String>,
	/// Token whose profile was already requested; one request per token.
	profiled_token: Option<String>,
}

impl HydrationController {
	pub fn new(config: &SessionConfig) -> Self {
		Self {
			state: HydrationState::Uninitialized,
			inspector: TokenInspector::new(config.clock_skew()),
			max_pending_passes: config.max_pending_passes,
			pending_passes: 0,
			rejected_token: None,
			profiled_token: None,
		}
	}

	pub fn state(&self) -> HydrationState {
		self.state
	}

	pub fn inspector(&self) -> &TokenInspector {
		&self.inspector
	}

	/// Runs the storage half of the state machine for this pass.
	pub fn hydrate(&mut self, ctx: &mut PassContext<'_>) -> PassResult {
		self.state = HydrationState::Uninitialized;

		if ctx.cache.is_authenticated() {
			self.pending_passes = 0;
			self.state = HydrationState::HydratedActive;
			return self.check_expiry(ctx);
		}

		self.state = HydrationState::AwaitingStorage;
		let snapshot = ctx.storage.read_all();
		let record = match &snapshot {
			StorageSnapshot::Pending if self.pending_passes < self.max_pending_passes => {
				self.pending_passes += 1;
				debug!(target: "hydrate.hydration", attempt = self.pending_passes, "storage pending; aborting pass");
				return PassResult::Abort(AbortReason::AwaitingStorage);
			}
			StorageSnapshot::Pending => {
				warn!(
					target: "hydrate.hydration",
					attempts = self.pending_passes,
					"storage still pending; continuing without a persisted session"
				);
				None
			}
			StorageSnapshot::Ready(_) => {
				self.pending_passes = 0;
				snapshot.get(&ctx.config.storage_key).and_then(decode_record)
			}
		};

		let record = record.filter(SessionRecord::is_present).filter(|r| !self.was_rejected(&r.token));
		let Some(record) = record else {
			self.state = HydrationState::HydratedEmpty;
			if ctx.cache.view().is_none() {
				ctx.cache.navigate(ctx.config.login_view.clone());
			}
			return PassResult::Continue;
		};

		ctx.cache.absorb(&record);
		let on_login_screen = ctx
			.cache
			.view()
			.is_none_or(|view| view.is_empty() || view == ctx.config.login_view);
		if on_login_screen {
			ctx.cache.navigate(ctx.config.home_view.clone());
		}
		self.state = HydrationState::HydratedActive;
		info!(target: "hydrate.hydration", token = %fingerprint(&record.token), "session restored from storage");

		self.check_expiry(ctx)
	}

	/// Best-effort profile completion; only 401/403 ends the session.
	pub async fn complete_profile(&mut self, ctx: &mut PassContext<'_>, source: &dyn ProfileSource) -> PassResult {
		if !ctx.cache.needs_profile() {
			return PassResult::Continue;
		}

		let token = ctx.cache.token().to_string();
		if self.profiled_token.as_deref() == Some(token.as_str()) {
			return PassResult::Continue;
		}
		self.profiled_token = Some(token.clone());

		match source.fetch_profile(&token).await {
			ProfileOutcome::Profile(profile) => {
				ctx.cache.fill_profile(&profile);
				debug!(target: "hydrate.profile", "profile fields completed");
				PassResult::Continue
			}
			ProfileOutcome::Revoked { status } => {
				warn!(target: "hydrate.profile", status, "profile check rejected the token");
				self.rejected_token = Some(token);
				self.state = HydrationState::LoggedOut;
				lifecycle::end_session(ctx, AbortReason::Revoked, Notice::warning(REVOKED_NOTICE))
			}
			ProfileOutcome::Unavailable { reason } => {
				warn!(target: "hydrate.profile", %reason, "profile check failed; keeping session");
				if ctx.config.notify_profile_errors {
					ctx.cache.set_flash(Notice::info(PROFILE_UNAVAILABLE_NOTICE));
				}
				PassResult::Continue
			}
		}
	}

	/// Tracks lifecycle transitions triggered outside hydration.
	pub fn observe(&mut self, result: PassResult) {
		match result {
			PassResult::Abort(AbortReason::LoggedIn) => {
				self.rejected_token = None;
				self.state = HydrationState::HydratedActive;
			}
			PassResult::Abort(AbortReason::LoggedOut) => self.state = HydrationState::LoggedOut,
			_ => {}
		}
	}

	fn check_expiry(&mut self, ctx: &mut PassContext<'_>) -> PassResult {
		if !self.inspector.is_expired(ctx.cache.token()) {
			return PassResult::Continue;
		}

		info!(target: "hydrate.hydration", token = %fingerprint(ctx.cache.token()), "token expired");
		self.rejected_token = Some(ctx.cache.token().to_string());
		self.state = HydrationState::Expired;
		lifecycle::end_session(ctx, AbortReason::Expired, Notice::warning(EXPIRED_NOTICE))
	}

	fn was_rejected(&self, token: &str) -> bool {
		let rejected = self.rejected_token.as_deref() == Some(token);
		if rejected {
			debug!(target: "hydrate.hydration", "storage returned a token that was already rejected; ignoring it");
		}
		rejected
	}
}

/// Parses a stored blob, accepting percent-encoded JSON as well.
///
/// Anything undecodable counts as no session.
pub fn decode_record(raw: &str) -> Option<SessionRecord> {
	if let Ok(record) = SessionRecord::from_blob(raw) {
		return Some(record);
	}
	let decoded = urlencoding::decode(raw).ok()?;
	match SessionRecord::from_blob(&decoded) {
		Ok(record) => Some(record),
		Err(err) => {
			debug!(target: "hydrate.hydration", error = %err, "stored session is not decodable; treating as absent");
			None
		}
	}
}
