//! Pass model: one full re-execution of the client, threaded explicitly.

use hydrate_protocol::SessionRecord;
use serde::Serialize;

use crate::cache::SessionCache;
use crate::config::SessionConfig;
use crate::lifecycle;
use crate::storage::StorageAdapter;

/// Why a pass ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
	/// Storage has not reported yet; re-enter on the next pass.
	AwaitingStorage,
	LoggedIn,
	LoggedOut,
	/// The token's `exp` has passed.
	Expired,
	/// The server answered 401/403 to the profile check.
	Revoked,
}

impl std::fmt::Display for AbortReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AbortReason::AwaitingStorage => write!(f, "awaiting_storage"),
			AbortReason::LoggedIn => write!(f, "logged_in"),
			AbortReason::LoggedOut => write!(f, "logged_out"),
			AbortReason::Expired => write!(f, "expired"),
			AbortReason::Revoked => write!(f, "revoked"),
		}
	}
}

/// Outcome of a pass (or of a step within one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum PassResult {
	Continue,
	Abort(AbortReason),
}

impl PassResult {
	pub fn is_continue(&self) -> bool {
		matches!(self, PassResult::Continue)
	}

	pub fn abort_reason(&self) -> Option<AbortReason> {
		match self {
			PassResult::Continue => None,
			PassResult::Abort(reason) => Some(*reason),
		}
	}
}

/// Everything a pass may touch, borrowed for the duration of the pass.
pub struct PassContext<'a> {
	pub(crate) cache: &'a mut SessionCache,
	pub(crate) storage: &'a mut StorageAdapter,
	pub config: &'a SessionConfig,
}

impl<'a> PassContext<'a> {
	pub fn new(cache: &'a mut SessionCache, storage: &'a mut StorageAdapter, config: &'a SessionConfig) -> Self {
		Self { cache, storage, config }
	}

	pub fn session(&self) -> &SessionCache {
		self.cache
	}

	pub fn is_authenticated(&self) -> bool {
		self.cache.is_authenticated()
	}

	pub fn navigate(&mut self, view: impl Into<String>) {
		self.cache.navigate(view);
	}

	/// See [`lifecycle::login`].
	pub fn login(&mut self, record: SessionRecord) -> PassResult {
		lifecycle::login(self, record)
	}

	/// See [`lifecycle::logout`].
	pub fn logout(&mut self) -> PassResult {
		lifecycle::logout(self)
	}
}
