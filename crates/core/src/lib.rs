//! Session hydration and lifecycle for re-entrant, pass-based clients.
//!
//! Every interaction re-runs the whole client from its entry point (a
//! "pass"). The persisted session lives in slow, eventually consistent
//! storage, so each pass:
//!
//! 1. reads storage at most once through a [`StorageAdapter`],
//! 2. aborts with [`AbortReason::AwaitingStorage`] while storage is pending,
//! 3. restores the record into the [`SessionCache`] without downgrading an
//!    already-populated cache,
//! 4. rejects expired tokens before any network call, and
//! 5. hands the cache to the UI, which may call [`PassContext::login`] or
//!    [`PassContext::logout`] to end the pass.
//!
//! # Example
//!
//! ```ignore
//! use hydrate::{MemoryBackend, PassResult, SessionConfig, SessionHost, StorageAdapter};
//!
//! let storage = StorageAdapter::single(MemoryBackend::new("memory"));
//! let mut host = SessionHost::new(SessionConfig::default(), storage);
//!
//! let report = host
//!     .settle(|ctx| {
//!         println!("authenticated: {}", ctx.is_authenticated());
//!         PassResult::Continue
//!     })
//!     .await?;
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod hydration;
pub mod lifecycle;
pub mod pass;
pub mod storage;
pub mod token;

pub use api::{ApiClient, ProfileOutcome, ProfileSource, SignInOutcome};
pub use cache::{Notice, NoticeKind, SessionCache};
pub use config::{SessionConfig, default_config_path};
pub use error::{Error, Result};
pub use host::{PassReport, SessionHost};
pub use hydration::{HydrationController, HydrationState, decode_record};
pub use hydrate_protocol::{LoginResponse, ProfileResponse, SessionRecord, TokenClaims};
pub use pass::{AbortReason, PassContext, PassResult};
pub use storage::{
	BackendRead, CookieJarBackend, LocalStoreBackend, MemoryBackend, MemoryHandle, StorageAdapter, StorageBackend, StorageSnapshot, WriteOptions,
};
pub use token::{TokenInspector, decode_claims, describe_expiry, fingerprint, now_ts};
