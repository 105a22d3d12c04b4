//! Host driver: runs passes until the session settles.

use std::sync::Arc;

use hydrate_protocol::SessionRecord;
use serde::Serialize;
use tracing::{debug, trace};

use crate::api::ProfileSource;
use crate::cache::{Notice, SessionCache};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::hydration::{HydrationController, HydrationState};
use crate::pass::{AbortReason, PassContext, PassResult};
use crate::storage::StorageAdapter;

/// Summary of a [`SessionHost::settle`] run.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
	pub passes: u32,
	pub aborts: Vec<AbortReason>,
	pub state: HydrationState,
	pub session: SessionCache,
}

/// Owns everything that outlives a single pass.
pub struct SessionHost {
	config: SessionConfig,
	storage: StorageAdapter,
	cache: SessionCache,
	controller: HydrationController,
	profile: Option<Arc<dyn ProfileSource>>,
}

impl std::fmt::Debug for SessionHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionHost")
			.field("storage", &self.storage)
			.field("state", &self.controller.state())
			.field("authenticated", &self.cache.is_authenticated())
			.field("profile_source", &self.profile.is_some())
			.finish()
	}
}

impl SessionHost {
	pub fn new(config: SessionConfig, storage: StorageAdapter) -> Self {
		let controller = HydrationController::new(&config);
		Self {
			config,
			storage,
			cache: SessionCache::new(),
			controller,
			profile: None,
		}
	}

	pub fn with_profile_source(mut self, source: Arc<dyn ProfileSource>) -> Self {
		self.profile = Some(source);
		self
	}

	/// Starts from a cache carried over from an earlier host.
	pub fn with_cache(mut self, cache: SessionCache) -> Self {
		self.cache = cache;
		self
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn storage(&self) -> &StorageAdapter {
		&self.storage
	}

	pub fn state(&self) -> HydrationState {
		self.controller.state()
	}

	pub fn current_session(&self) -> &SessionCache {
		&self.cache
	}

	pub fn is_authenticated(&self) -> bool {
		self.cache.is_authenticated()
	}

	pub fn take_flash(&mut self) -> Option<Notice> {
		self.cache.take_flash()
	}

	/// Runs one pass: hydration, profile completion, then `view`.
	///
	/// `view` only runs when hydration let the pass continue.
	pub async fn run_pass<F>(&mut self, view: F) -> PassResult
	where
		F: FnOnce(&mut PassContext<'_>) -> PassResult,
	{
		let Self {
			config,
			storage,
			cache,
			controller,
			profile,
		} = self;

		storage.begin_pass();
		let mut ctx = PassContext::new(cache, storage, config);

		let result = controller.hydrate(&mut ctx);
		if !result.is_continue() {
			return result;
		}

		if let Some(source) = profile.as_deref() {
			let result = controller.complete_profile(&mut ctx, source).await;
			if !result.is_continue() {
				return result;
			}
		}

		let result = view(&mut ctx);
		controller.observe(result);
		result
	}

	/// Re-runs passes until one completes, up to `maxPasses`.
	pub async fn settle<F>(&mut self, mut view: F) -> Result<PassReport>
	where
		F: FnMut(&mut PassContext<'_>) -> PassResult,
	{
		let limit = self.config.max_passes;
		let mut aborts = Vec::new();

		for pass in 1..=limit {
			match self.run_pass(&mut view).await {
				PassResult::Continue => {
					debug!(target: "hydrate.host", passes = pass, state = %self.state(), "session settled");
					return Ok(PassReport {
						passes: pass,
						aborts,
						state: self.state(),
						session: self.cache.clone(),
					});
				}
				PassResult::Abort(reason) => {
					trace!(target: "hydrate.host", pass, %reason, "pass aborted; re-entering");
					aborts.push(reason);
				}
			}
		}

		Err(Error::PassLimit { limit })
	}

	/// Logs in outside a view callback, ending the current pass.
	pub fn login(&mut self, record: SessionRecord) -> PassResult {
		let result = self.with_context(|ctx| ctx.login(record));
		self.controller.observe(result);
		result
	}

	/// Logs out outside a view callback, ending the current pass.
	pub fn logout(&mut self) -> PassResult {
		let result = self.with_context(|ctx| ctx.logout());
		self.controller.observe(result);
		result
	}

	fn with_context<T>(&mut self, f: impl FnOnce(&mut PassContext<'_>) -> T) -> T {
		let mut ctx = PassContext::new(&mut self.cache, &mut self.storage, &self.config);
		f(&mut ctx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::storage::MemoryBackend;

	#[tokio::test]
	async fn settle_reports_pending_abort_then_empty_session() {
		let (backend, handle) = MemoryBackend::with_handle("memory");
		handle.set_not_ready_reads(1);
		let mut host = SessionHost::new(SessionConfig::default(), StorageAdapter::single(backend));

		let report = host.settle(|_| PassResult::Continue).await.unwrap();
		assert_eq!(report.passes, 2);
		assert_eq!(report.aborts, vec![AbortReason::AwaitingStorage]);
		assert_eq!(report.state, HydrationState::HydratedEmpty);
		assert_eq!(report.session.view(), Some("login"));
	}

	#[tokio::test]
	async fn pending_pass_leaves_the_cache_untouched() {
		let (backend, handle) = MemoryBackend::with_handle("memory");
		handle.set_not_ready_reads(1);
		let mut host = SessionHost::new(SessionConfig::default(), StorageAdapter::single(backend));

		let mut view_ran = false;
		let result = host
			.run_pass(|_| {
				view_ran = true;
				PassResult::Continue
			})
			.await;

		assert_eq!(result, PassResult::Abort(AbortReason::AwaitingStorage));
		assert!(!view_ran);
		assert_eq!(host.current_session(), &SessionCache::default());
		assert_eq!(host.current_session().view(), None);
		assert!(host.current_session().flash().is_none());
		assert_eq!(host.state(), HydrationState::AwaitingStorage);

		let result = host.run_pass(|_| PassResult::Continue).await;
		assert_eq!(result, PassResult::Continue);
		assert_eq!(host.current_session().view(), Some("login"));
	}

	#[tokio::test]
	async fn settle_gives_up_after_the_pass_budget() {
		let mut host = SessionHost::new(SessionConfig::default(), StorageAdapter::single(MemoryBackend::new("memory")));

		let err = host.settle(|ctx| ctx.logout()).await.unwrap_err();
		assert!(matches!(err, Error::PassLimit { limit: 8 }));
	}
}
