//! Request and response bodies of the auth-adjacent endpoints.

use serde::{Deserialize, Serialize};

use crate::record::SessionRecord;

/// Body of `GET /users/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
	#[serde(default, alias = "rol")]
	pub role: Option<String>,
	#[serde(default, alias = "nombre")]
	pub display_name: Option<String>,
}

/// Body of `POST /users/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Successful `POST /users/login` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	#[serde(alias = "access_token")]
	pub access_token: String,
	#[serde(default, alias = "rol")]
	pub role: String,
	#[serde(default, alias = "nombre")]
	pub display_name: Option<String>,
	#[serde(default, alias = "rfc")]
	pub tax_id: Option<String>,
}

impl LoginResponse {
	pub fn into_record(self) -> SessionRecord {
		SessionRecord {
			token: self.access_token,
			role: self.role,
			display_name: self.display_name.unwrap_or_default(),
			tax_id: self.tax_id.unwrap_or_default(),
		}
	}
}

/// Error body returned by the API (`{"detail": "..."}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
	#[serde(default)]
	pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn login_response_accepts_backend_field_names() {
		let response: LoginResponse =
			serde_json::from_str(r#"{"access_token":"a.b.c","rol":"admin","nombre":"Root","rfc":null}"#).unwrap();
		let record = response.into_record();
		assert_eq!(record.token, "a.b.c");
		assert_eq!(record.role, "admin");
		assert_eq!(record.display_name, "Root");
		assert_eq!(record.tax_id, "");
	}

	#[test]
	fn profile_response_tolerates_missing_fields() {
		let profile: ProfileResponse = serde_json::from_str(r#"{"displayName":"Ana"}"#).unwrap();
		assert_eq!(profile.role, None);
		assert_eq!(profile.display_name.as_deref(), Some("Ana"));
	}
}
