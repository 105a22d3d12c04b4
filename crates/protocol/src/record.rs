//! The persisted session record.

use serde::{Deserialize, Serialize};

/// The unit persisted under the session storage key.
///
/// A record whose `token` is empty is considered absent regardless of the
/// other fields. Legacy blobs written with `rol`/`nombre`/`rfc` keys are read
/// through serde aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	#[serde(default)]
	pub token: String,
	#[serde(default, alias = "rol")]
	pub role: String,
	#[serde(default, alias = "nombre")]
	pub display_name: String,
	#[serde(default, alias = "rfc")]
	pub tax_id: String,
}

impl SessionRecord {
	pub fn new(token: impl Into<String>, role: impl Into<String>) -> Self {
		Self {
			token: token.into(),
			role: role.into(),
			..Default::default()
		}
	}

	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = name.into();
		self
	}

	pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
		self.tax_id = tax_id.into();
		self
	}

	/// Returns true when the record carries a token.
	pub fn is_present(&self) -> bool {
		!self.token.is_empty()
	}

	/// Serializes the record into the opaque blob stored under one key.
	pub fn to_blob(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}

	pub fn from_blob(blob: &str) -> serde_json::Result<Self> {
		serde_json::from_str(blob)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_token_is_absent() {
		let record = SessionRecord::new("", "admin").with_display_name("X");
		assert!(!record.is_present());
	}

	#[test]
	fn blob_uses_camel_case_keys() {
		let blob = SessionRecord::new("t1", "admin").with_tax_id("Y").to_blob().unwrap();
		let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
		assert_eq!(value["taxId"], "Y");
		assert_eq!(value["displayName"], "");
	}

	#[test]
	fn legacy_field_names_are_accepted() {
		let record = SessionRecord::from_blob(r#"{"token":"t","rol":"usuario","nombre":"Ana","rfc":"ABCD010101"}"#).unwrap();
		assert_eq!(record.role, "usuario");
		assert_eq!(record.display_name, "Ana");
		assert_eq!(record.tax_id, "ABCD010101");
	}

	#[test]
	fn missing_fields_default_to_empty() {
		let record = SessionRecord::from_blob(r#"{"token":"t"}"#).unwrap();
		assert!(record.is_present());
		assert!(record.role.is_empty());
	}
}
