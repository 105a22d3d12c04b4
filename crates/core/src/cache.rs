//! In-memory session state for the current pass.

use hydrate_protocol::{ProfileResponse, SessionRecord};
use serde::{Deserialize, Serialize};

/// Severity of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
	Info,
	Warning,
}

/// Message shown once by the UI on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
	pub kind: NoticeKind,
	pub message: String,
}

impl Notice {
	pub fn info(message: impl Into<String>) -> Self {
		Self {
			kind: NoticeKind::Info,
			message: message.into(),
		}
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Self {
			kind: NoticeKind::Warning,
			message: message.into(),
		}
	}
}

/// Authoritative session state for a pass, carried into the next pass
/// unless explicitly mutated.
///
/// `token` is non-empty iff the user is authenticated. Session fields are
/// only written by hydration and the lifecycle operations; the UI may
/// navigate and consume the flash notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCache {
	token: String,
	role: String,
	display_name: String,
	tax_id: String,
	view: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	flash: Option<Notice>,
}

impl SessionCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_authenticated(&self) -> bool {
		!self.token.is_empty()
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	pub fn role(&self) -> &str {
		&self.role
	}

	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	pub fn tax_id(&self) -> &str {
		&self.tax_id
	}

	pub fn view(&self) -> Option<&str> {
		self.view.as_deref()
	}

	pub fn flash(&self) -> Option<&Notice> {
		self.flash.as_ref()
	}

	/// Returns the pending notice and clears it.
	pub fn take_flash(&mut self) -> Option<Notice> {
		self.flash.take()
	}

	pub fn navigate(&mut self, view: impl Into<String>) {
		self.view = Some(view.into());
	}

	/// The session fields as a persistable record.
	pub fn record(&self) -> SessionRecord {
		SessionRecord {
			token: self.token.clone(),
			role: self.role.clone(),
			display_name: self.display_name.clone(),
			tax_id: self.tax_id.clone(),
		}
	}

	/// True when secondary profile fields still need filling.
	pub fn needs_profile(&self) -> bool {
		self.is_authenticated() && (self.role.is_empty() || self.display_name.is_empty())
	}

	pub(crate) fn absorb(&mut self, record: &SessionRecord) {
		self.token.clone_from(&record.token);
		self.role.clone_from(&record.role);
		self.display_name.clone_from(&record.display_name);
		self.tax_id.clone_from(&record.tax_id);
	}

	/// Fills only the fields that are still empty.
	pub(crate) fn fill_profile(&mut self, profile: &ProfileResponse) {
		if self.role.is_empty() {
			if let Some(role) = profile.role.as_deref().filter(|r| !r.is_empty()) {
				self.role = role.to_string();
			}
		}
		if self.display_name.is_empty() {
			if let Some(name) = profile.display_name.as_deref().filter(|n| !n.is_empty()) {
				self.display_name = name.to_string();
			}
		}
	}

	/// Clears every field, including view and notice.
	pub(crate) fn clear(&mut self) {
		*self = Self::default();
	}

	pub(crate) fn set_flash(&mut self, notice: Notice) {
		self.flash = Some(notice);
	}
}
