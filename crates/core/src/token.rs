//! Bearer token inspection.
//!
//! Claims are decoded for expiry and display only. The signature is never
//! checked here; authorization is enforced by the server.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hydrate_protocol::TokenClaims;

/// Decodes the payload segment of a three-segment token.
///
/// Returns `None` for anything malformed: wrong segment count, bad base64,
/// non-UTF-8 or non-object JSON.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
	let mut segments = token.split('.');
	let (Some(_header), Some(payload), Some(_signature), None) = (segments.next(), segments.next(), segments.next(), segments.next()) else {
		return None;
	};

	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
	let text = std::str::from_utf8(&bytes).ok()?;
	serde_json::from_str(text).ok()
}

/// Expiry checks with a configurable clock-skew tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInspector {
	clock_skew: Duration,
}

impl Default for TokenInspector {
	fn default() -> Self {
		Self::new(Duration::from_secs(crate::config::DEFAULT_CLOCK_SKEW_SECS))
	}
}

impl TokenInspector {
	pub fn new(clock_skew: Duration) -> Self {
		Self { clock_skew }
	}

	pub fn clock_skew(&self) -> Duration {
		self.clock_skew
	}

	pub fn decode_claims(&self, token: &str) -> Option<TokenClaims> {
		decode_claims(token)
	}

	/// Returns true when the token must be treated as expired.
	///
	/// Fails closed: undecodable claims or a missing `exp` count as expired.
	pub fn is_expired(&self, token: &str) -> bool {
		self.is_expired_at(token, now_ts())
	}

	/// Same as [`is_expired`](Self::is_expired) against an explicit clock.
	pub fn is_expired_at(&self, token: &str, now: i64) -> bool {
		let Some(exp) = decode_claims(token).and_then(|claims| claims.exp) else {
			return true;
		};
		now as f64 >= exp - self.clock_skew.as_secs_f64()
	}

	/// Seconds left before the token is considered expired, if it is still valid.
	pub fn remaining_at(&self, token: &str, now: i64) -> Option<u64> {
		let exp = decode_claims(token)?.exp?;
		let deadline = exp - self.clock_skew.as_secs_f64();
		let left = deadline - now as f64;
		(left > 0.0).then(|| left as u64)
	}
}

/// Human-readable remaining lifetime (`expired`, `42m`, `5h`, `6d`).
pub fn describe_expiry(exp: Option<i64>, now: i64) -> String {
	let Some(ts) = exp else {
		return "unknown".into();
	};
	if ts <= now {
		return "expired".into();
	}

	match ts - now {
		d if d < 60 => format!("{d}s"),
		d if d < 3600 => format!("{}m", d / 60),
		d if d < 86400 => format!("{}h", d / 3600),
		d => format!("{}d", d / 86400),
	}
}

/// Short, log-safe identifier for a token.
pub fn fingerprint(token: &str) -> String {
	let prefix: String = token.chars().take(8).collect();
	format!("{prefix}…({})", token.len())
}

/// Current Unix time in whole seconds.
pub fn now_ts() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	const FAR_FUTURE: &str = "a.eyJleHAiOjk5OTk5OTk5OTl9.c";
	const EPOCH_PLUS_ONE: &str = "a.eyJleHAiOjF9.c";

	fn token_with_payload(payload: &str) -> String {
		format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn far_future_token_is_live() {
		assert!(!TokenInspector::default().is_expired(FAR_FUTURE));
	}

	#[test]
	fn past_token_is_expired() {
		assert!(TokenInspector::default().is_expired(EPOCH_PLUS_ONE));
	}

	#[test]
	fn malformed_tokens_fail_closed() {
		let inspector = TokenInspector::default();
		let mut tokens: Vec<String> = ["not-a-jwt", "", "a.b", "a.b.c.d", "a..c", "a.!!!.c", "a.bm90IGpzb24.c"]
			.into_iter()
			.map(String::from)
			.collect();
		tokens.extend(
			[r#"[1,2]"#, r#"{"sub":"no-exp"}"#, r#"{"exp":"9999999999"}"#, r#"{"exp":null}"#]
				.into_iter()
				.map(token_with_payload),
		);

		for token in &tokens {
			assert!(inspector.is_expired(token), "{token:?} should be treated as expired");
		}
	}

	#[test]
	fn invalid_utf8_payload_is_rejected() {
		let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]));
		assert!(decode_claims(&token).is_none());
	}

	#[test]
	fn padded_payload_is_accepted() {
		let claims = decode_claims("a.eyJleHAiOjF9.c").unwrap();
		assert_eq!(claims.expires_at(), Some(1));

		let padded = format!("h.{}==.s", URL_SAFE_NO_PAD.encode(r#"{"exp":12}"#));
		assert_eq!(decode_claims(&padded).unwrap().expires_at(), Some(12));
	}

	#[test]
	fn skew_moves_the_deadline_earlier() {
		let token = token_with_payload(r#"{"exp":1000}"#);
		let strict = TokenInspector::new(Duration::ZERO);
		let tolerant = TokenInspector::new(Duration::from_secs(15));

		assert!(!strict.is_expired_at(&token, 999));
		assert!(strict.is_expired_at(&token, 1000));
		assert!(tolerant.is_expired_at(&token, 985));
		assert!(!tolerant.is_expired_at(&token, 984));
	}

	#[test]
	fn fractional_exp_is_supported() {
		let token = token_with_payload(r#"{"exp":1000.5,"role":"admin"}"#);
		let claims = decode_claims(&token).unwrap();
		assert_eq!(claims.extra["role"], "admin");
		assert!(!TokenInspector::new(Duration::ZERO).is_expired_at(&token, 1000));
	}

	#[test]
	fn remaining_reports_seconds_until_deadline() {
		let token = token_with_payload(r#"{"exp":1000}"#);
		let inspector = TokenInspector::new(Duration::from_secs(10));
		assert_eq!(inspector.remaining_at(&token, 900), Some(90));
		assert_eq!(inspector.remaining_at(&token, 995), None);
	}

	#[test]
	fn describe_expiry_buckets() {
		assert_eq!(describe_expiry(None, 0), "unknown");
		assert_eq!(describe_expiry(Some(10), 20), "expired");
		assert_eq!(describe_expiry(Some(130), 100), "30s");
		assert_eq!(describe_expiry(Some(100 + 600), 100), "10m");
		assert_eq!(describe_expiry(Some(100 + 7200), 100), "2h");
		assert_eq!(describe_expiry(Some(100 + 3 * 86400), 100), "3d");
	}

	#[test]
	fn fingerprint_hides_the_token() {
		let fp = fingerprint("abcdefghijklmnop");
		assert!(fp.starts_with("abcdefgh"));
		assert!(!fp.contains("ijkl"));
	}
}
