use std::fs;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use super::*;

const KEY: &str = "session_auth";

/// Records the target of every event.
struct TargetRecorder(Arc<Mutex<Vec<String>>>);

impl<S: tracing::Subscriber> Layer<S> for TargetRecorder {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
		self.0.lock().push(event.metadata().target().to_string());
	}
}

fn week() -> WriteOptions {
	WriteOptions::new(Duration::from_secs(7 * 24 * 3600), "/")
}

#[test]
fn read_all_hits_the_backend_once_per_pass() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	let mut adapter = StorageAdapter::single(backend);

	adapter.read_all();
	adapter.read_all();
	adapter.read_all();
	assert_eq!(handle.reads(), 1);
	assert_eq!(adapter.physical_reads(), 1);

	adapter.begin_pass();
	adapter.read_all();
	assert_eq!(handle.reads(), 2);
}

#[test]
fn pending_is_cached_for_the_pass() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_not_ready_reads(1);
	let mut adapter = StorageAdapter::single(backend);

	assert!(adapter.read_all().is_pending());
	assert!(adapter.read_all().is_pending());
	assert_eq!(handle.reads(), 1);

	adapter.begin_pass();
	assert_eq!(adapter.read_all(), StorageSnapshot::Ready(Default::default()));
}

#[test]
fn storage_failures_log_under_the_storage_target() {
	let targets = Arc::new(Mutex::new(Vec::new()));
	let subscriber = tracing_subscriber::registry().with(TargetRecorder(targets.clone()));

	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_failing(true);
	let mut adapter = StorageAdapter::single(backend);
	tracing::subscriber::with_default(subscriber, || adapter.write(KEY, "v", &week()));

	let targets = targets.lock();
	assert!(!targets.is_empty());
	assert!(targets.iter().all(|t| t == "hydrate.storage"), "unexpected targets: {targets:?}");
}

#[test]
fn write_is_visible_in_the_same_pass_even_if_backend_lags() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_not_ready_reads(5);
	let mut adapter = StorageAdapter::single(backend);

	adapter.write(KEY, "v", &week());
	assert_eq!(adapter.read_all().get(KEY), Some("v"));
}

#[test]
fn write_after_snapshot_overrides_cached_value() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.insert_raw(KEY, "old", "/");
	let mut adapter = StorageAdapter::single(backend);

	assert_eq!(adapter.read_all().get(KEY), Some("old"));
	adapter.write(KEY, "new", &week());
	assert_eq!(adapter.read_all().get(KEY), Some("new"));
	assert_eq!(handle.reads(), 1);
}

#[test]
fn delete_scrubs_snapshot_and_survives_discard() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.insert_raw(KEY, "v", "/");
	handle.set_ignore_deletes(true);
	let mut adapter = StorageAdapter::single(backend);

	assert!(adapter.read_all().contains_key(KEY));
	adapter.delete(KEY, "/");
	assert!(!adapter.read_all().contains_key(KEY));

	adapter.discard_snapshot();
	assert!(!adapter.read_all().contains_key(KEY));
	assert_eq!(handle.reads(), 2);
}

#[test]
fn delete_only_while_pending_keeps_pending() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_not_ready_reads(1);
	let mut adapter = StorageAdapter::single(backend);

	adapter.delete(KEY, "/");
	assert!(adapter.read_all().is_pending());
}

#[test]
fn failing_backend_degrades_to_memory_only() {
	let (backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_failing(true);
	let mut adapter = StorageAdapter::single(backend);

	adapter.write(KEY, "v", &week());
	assert_eq!(adapter.read_all().get(KEY), Some("v"));
	adapter.delete(KEY, "/");

	adapter.begin_pass();
	assert_eq!(adapter.read_all(), StorageSnapshot::Ready(Default::default()));
}

#[test]
fn higher_priority_backend_wins_and_pending_blocks_merge() {
	let (cookies, cookie_handle) = MemoryBackend::with_handle("cookies");
	let (local, local_handle) = MemoryBackend::with_handle("local");
	cookie_handle.insert_raw(KEY, "from-cookie", "/");
	local_handle.insert_raw(KEY, "from-local", "/");
	local_handle.insert_raw("other", "x", "/");
	let mut adapter = StorageAdapter::new(vec![Box::new(cookies), Box::new(local)]);

	let snapshot = adapter.read_all();
	assert_eq!(snapshot.get(KEY), Some("from-cookie"));
	assert_eq!(snapshot.get("other"), Some("x"));

	adapter.begin_pass();
	cookie_handle.set_not_ready_reads(1);
	assert!(adapter.read_all().is_pending());
}

#[test]
fn writes_fan_out_to_every_backend() {
	let (cookies, cookie_handle) = MemoryBackend::with_handle("cookies");
	let (local, local_handle) = MemoryBackend::with_handle("local");
	let mut adapter = StorageAdapter::new(vec![Box::new(cookies), Box::new(local)]);

	adapter.write(KEY, "v", &week());
	assert_eq!(cookie_handle.get(KEY).as_deref(), Some("v"));
	assert_eq!(local_handle.get(KEY).as_deref(), Some("v"));

	adapter.delete(KEY, "/");
	assert!(!cookie_handle.contains(KEY));
	assert!(!local_handle.contains(KEY));
}

#[test]
fn memory_delete_with_mismatched_path_is_a_no_op() {
	let (mut backend, handle) = MemoryBackend::with_handle("memory");
	backend.write(KEY, "v", &WriteOptions::new(Duration::from_secs(60), "/app")).unwrap();
	backend.delete(KEY, "/").unwrap();
	assert!(handle.contains(KEY));
	backend.delete(KEY, "/app").unwrap();
	assert!(!handle.contains(KEY));
}

#[test]
fn expired_write_removes_even_when_deletes_are_ignored() {
	let (mut backend, handle) = MemoryBackend::with_handle("memory");
	handle.set_ignore_deletes(true);
	backend.write(KEY, "v", &week()).unwrap();
	backend.delete(KEY, "/").unwrap();
	assert!(handle.contains(KEY));

	backend.write(KEY, "", &WriteOptions::expired("/")).unwrap();
	assert!(!handle.contains(KEY));
}

#[test]
fn cookie_jar_round_trips_and_percent_encodes() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("state/cookies.json");
	let mut jar = CookieJarBackend::new(&path);

	jar.write(KEY, r#"{"token":"t 1"}"#, &week()).unwrap();
	let raw = fs::read_to_string(&path).unwrap();
	assert!(raw.contains("%7B%22token%22"), "value should be stored percent-encoded: {raw}");
	assert!(raw.contains(r#""sameSite": "Lax""#));

	let BackendRead::Ready(entries) = jar.read_all().unwrap() else {
		panic!("cookie jar should always be ready");
	};
	assert_eq!(entries.get(KEY).map(String::as_str), Some(r#"{"token":"t 1"}"#));
}

#[test]
fn cookie_jar_delete_requires_matching_path() {
	let temp = TempDir::new().unwrap();
	let mut jar = CookieJarBackend::new(temp.path().join("cookies.json"));

	jar.write(KEY, "v", &week()).unwrap();
	jar.delete(KEY, "/receipts").unwrap();
	assert_eq!(jar.read_all().unwrap(), BackendRead::Ready([(KEY.to_string(), "v".to_string())].into()));

	jar.delete(KEY, "/").unwrap();
	assert_eq!(jar.read_all().unwrap(), BackendRead::Ready(Default::default()));
}

#[test]
fn cookie_jar_skips_expired_cookies() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("cookies.json");
	fs::write(
		&path,
		r#"{"cookies":[
  {"name":"stale","value":"x","path":"/","expires":1.0},
  {"name":"session","value":"y","path":"/","expires":-1.0}
]}"#,
	)
	.unwrap();

	let mut jar = CookieJarBackend::new(&path);
	let BackendRead::Ready(entries) = jar.read_all().unwrap() else {
		panic!("cookie jar should always be ready");
	};
	assert!(!entries.contains_key("stale"));
	assert_eq!(entries.get("session").map(String::as_str), Some("y"));
}

#[test]
fn corrupt_cookie_jar_reads_as_empty_through_adapter() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("cookies.json");
	fs::write(&path, "not json").unwrap();

	let mut jar = CookieJarBackend::new(&path);
	assert!(jar.read_all().is_err());

	let mut adapter = StorageAdapter::single(jar);
	assert_eq!(adapter.read_all(), StorageSnapshot::Ready(Default::default()));
}

#[test]
fn local_store_ignores_path_and_honors_ttl() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("local_storage.json");
	let mut store = LocalStoreBackend::new(&path);

	store.write(KEY, "v", &WriteOptions::new(Duration::from_secs(60), "/app")).unwrap();
	assert_eq!(store.read_all().unwrap(), BackendRead::Ready([(KEY.to_string(), "v".to_string())].into()));

	store.delete(KEY, "/elsewhere").unwrap();
	assert_eq!(store.read_all().unwrap(), BackendRead::Ready(Default::default()));

	fs::write(&path, r#"{"localStorage":[{"name":"old","value":"x","expiresAt":1}]}"#).unwrap();
	assert_eq!(store.read_all().unwrap(), BackendRead::Ready(Default::default()));
}

#[test]
fn huge_ttl_saturates_instead_of_expiring() {
	let options = WriteOptions::new(Duration::from_secs(u64::MAX), "/");
	assert_eq!(options.expires_at(1_000), i64::MAX);
	assert_eq!(week().expires_at(1_000), 1_000 + 7 * 24 * 3600);

	let temp = TempDir::new().unwrap();
	let mut store = LocalStoreBackend::new(temp.path().join("local_storage.json"));
	store.write(KEY, "v", &options).unwrap();
	assert_eq!(store.read_all().unwrap(), BackendRead::Ready([(KEY.to_string(), "v".to_string())].into()));

	let (mut memory, _handle) = MemoryBackend::with_handle("memory");
	memory.write(KEY, "v", &options).unwrap();
	assert_eq!(memory.read_all().unwrap(), BackendRead::Ready([(KEY.to_string(), "v".to_string())].into()));
}
