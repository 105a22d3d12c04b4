//! Command payloads.

use std::io::{self, Write};

use colored::Colorize;
use hydrate::{AbortReason, HydrationState, PassReport, TokenClaims, TokenInspector, describe_expiry, fingerprint};
use serde::Serialize;

use super::RenderText;

/// Session as seen after the passes settled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
	pub authenticated: bool,
	pub state: HydrationState,
	/// Fingerprint only; the token itself is never printed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	pub role: String,
	pub display_name: String,
	pub tax_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub view: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<String>,
	pub passes: u32,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub aborts: Vec<AbortReason>,
	pub backends: Vec<String>,
}

impl SessionData {
	pub fn from_report(report: &PassReport, backends: Vec<String>, now: i64) -> Self {
		let session = &report.session;
		let authenticated = session.is_authenticated();
		let expires_at = authenticated
			.then(|| hydrate::decode_claims(session.token()).and_then(|c| c.expires_at()))
			.flatten();

		Self {
			authenticated,
			state: report.state,
			token: authenticated.then(|| fingerprint(session.token())),
			role: session.role().to_string(),
			display_name: session.display_name().to_string(),
			tax_id: session.tax_id().to_string(),
			view: session.view().map(str::to_string),
			expires_at,
			expires_in: authenticated.then(|| describe_expiry(expires_at, now)),
			passes: report.passes,
			aborts: report.aborts.clone(),
			backends,
		}
	}
}

fn field(out: &mut dyn Write, label: &str, value: &str) -> io::Result<()> {
	if value.is_empty() {
		return Ok(());
	}
	writeln!(out, "  {:<13} {value}", format!("{label}:").dimmed())
}

impl RenderText for SessionData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		if self.authenticated {
			writeln!(out, "{} ({})", "Authenticated".green().bold(), self.state)?;
		} else {
			writeln!(out, "{} ({})", "Not signed in".yellow().bold(), self.state)?;
		}
		field(out, "token", self.token.as_deref().unwrap_or_default())?;
		field(out, "role", &self.role)?;
		field(out, "name", &self.display_name)?;
		field(out, "tax id", &self.tax_id)?;
		field(out, "expires in", self.expires_in.as_deref().unwrap_or_default())?;
		field(out, "view", self.view.as_deref().unwrap_or_default())?;
		field(out, "storage", &self.backends.join(", "))
	}
}

/// Result of `logout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutData {
	pub was_authenticated: bool,
	#[serde(flatten)]
	pub session: SessionData,
}

impl RenderText for LogoutData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		if self.was_authenticated {
			writeln!(out, "{}", "Logged out".green().bold())
		} else {
			writeln!(out, "No active session; storage cleared anyway")
		}
	}
}

/// Result of `inspect`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectData {
	pub fingerprint: String,
	pub decodable: bool,
	pub expired: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	pub expires_in: String,
	pub clock_skew_secs: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub claims: Option<TokenClaims>,
}

impl InspectData {
	pub fn new(token: &str, inspector: &TokenInspector, now: i64) -> Self {
		let claims = inspector.decode_claims(token);
		let expires_at = claims.as_ref().and_then(TokenClaims::expires_at);
		Self {
			fingerprint: fingerprint(token),
			decodable: claims.is_some(),
			expired: inspector.is_expired_at(token, now),
			expires_at,
			expires_in: describe_expiry(expires_at, now),
			clock_skew_secs: inspector.clock_skew().as_secs(),
			claims,
		}
	}
}

impl RenderText for InspectData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		let verdict = match (self.decodable, self.expired) {
			(false, _) => "malformed (treated as expired)".red().bold(),
			(true, true) => "expired".red().bold(),
			(true, false) => "valid".green().bold(),
		};
		writeln!(out, "{} {verdict}", self.fingerprint)?;
		field(out, "expires in", &self.expires_in)?;
		if let Some(claims) = &self.claims {
			if let Ok(json) = serde_json::to_string_pretty(claims) {
				writeln!(out, "{json}")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn inspect_reports_malformed_tokens_as_expired() {
		let data = InspectData::new("garbage", &TokenInspector::new(Duration::ZERO), 0);
		assert!(!data.decodable);
		assert!(data.expired);
		assert_eq!(data.expires_in, "unknown");
	}

	#[test]
	fn inspect_never_serializes_the_raw_token() {
		let token = "a.eyJleHAiOjk5OTk5OTk5OTl9.c";
		let data = InspectData::new(token, &TokenInspector::default(), 1_000);
		let json = serde_json::to_string(&data).unwrap();
		assert!(!json.contains(token));
		assert!(data.decodable);
		assert!(!data.expired);
	}
}
