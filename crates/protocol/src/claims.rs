//! Decoded (never verified) bearer token payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims carried in the middle segment of a bearer token.
///
/// Only `exp` matters to the client; everything else is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Expiry in seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl TokenClaims {
	/// Expiry truncated to whole seconds.
	pub fn expires_at(&self) -> Option<i64> {
		self.exp.map(|exp| exp as i64)
	}
}
