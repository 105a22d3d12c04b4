//! Client for the auth-adjacent endpoints of the remote API.
//!
//! - `GET /users/me` - profile completion ([`ProfileSource`])
//! - `POST /users/login` - credential sign-in ([`ApiClient::sign_in`])

use std::time::Duration;

use async_trait::async_trait;
use hydrate_protocol::{ErrorBody, LoginRequest, LoginResponse, ProfileResponse, SessionRecord};
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

/// Classified result of a profile check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
	Profile(ProfileResponse),
	/// 401/403: the server no longer accepts the token.
	Revoked { status: u16 },
	/// Network failure or any other status; the session is left alone.
	Unavailable { reason: String },
}

/// Source of secondary profile fields for an authenticated session.
#[async_trait]
pub trait ProfileSource: Send + Sync {
	async fn fetch_profile(&self, token: &str) -> ProfileOutcome;
}

/// Classified result of a credential sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
	Authenticated(SessionRecord),
	/// The account exists but its e-mail address is not verified yet.
	Unverified { email: String },
	InvalidCredentials { detail: String },
	Rejected { status: u16, detail: String },
	Connection { detail: String },
}

/// Thin reqwest wrapper bound to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base_url: Url,
}

impl ApiClient {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
		let mut base_url = Url::parse(base_url)?;
		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(Error::Config(format!("API URL must be http(s), got {base_url}")));
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}

		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { http, base_url })
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.base_url.join(path)?)
	}

	/// Exchanges credentials for a session record; never touches storage.
	pub async fn sign_in(&self, email: &str, password: &str) -> SignInOutcome {
		let url = match self.endpoint("users/login") {
			Ok(url) => url,
			Err(err) => return SignInOutcome::Connection { detail: err.to_string() },
		};
		let body = LoginRequest {
			email: email.to_string(),
			password: password.to_string(),
		};

		debug!(target: "hydrate.api", %url, "signing in");
		let response = match self.http.post(url).json(&body).send().await {
			Ok(response) => response,
			Err(err) => {
				warn!(target: "hydrate.api", error = %err, "sign-in request failed");
				return SignInOutcome::Connection { detail: err.to_string() };
			}
		};

		let status = response.status();
		if status == StatusCode::OK {
			return match response.json::<LoginResponse>().await {
				Ok(login) => {
					info!(target: "hydrate.api", role = %login.role, "sign-in accepted");
					SignInOutcome::Authenticated(login.into_record())
				}
				Err(err) => SignInOutcome::Rejected {
					status: status.as_u16(),
					detail: format!("unreadable sign-in response: {err}"),
				},
			};
		}

		let detail = error_detail(response).await;
		if status == StatusCode::UNAUTHORIZED {
			if mentions_unverified(detail.as_deref()) {
				return SignInOutcome::Unverified { email: email.to_string() };
			}
			return SignInOutcome::InvalidCredentials {
				detail: detail.unwrap_or_else(|| "invalid credentials".into()),
			};
		}

		SignInOutcome::Rejected {
			status: status.as_u16(),
			detail: detail.unwrap_or_else(|| format!("error {}", status.as_u16())),
		}
	}
}

#[async_trait]
impl ProfileSource for ApiClient {
	async fn fetch_profile(&self, token: &str) -> ProfileOutcome {
		let url = match self.endpoint("users/me") {
			Ok(url) => url,
			Err(err) => return ProfileOutcome::Unavailable { reason: err.to_string() },
		};

		let response = match self.http.get(url).bearer_auth(token).send().await {
			Ok(response) => response,
			Err(err) => return ProfileOutcome::Unavailable { reason: err.to_string() },
		};

		match response.status() {
			StatusCode::OK => match response.json::<ProfileResponse>().await {
				Ok(profile) => ProfileOutcome::Profile(profile),
				Err(err) => ProfileOutcome::Unavailable {
					reason: format!("unreadable profile: {err}"),
				},
			},
			status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => ProfileOutcome::Revoked { status: status.as_u16() },
			status => ProfileOutcome::Unavailable {
				reason: format!("profile endpoint answered {status}"),
			},
		}
	}
}

async fn error_detail(response: reqwest::Response) -> Option<String> {
	let text = response.text().await.ok()?;
	serde_json::from_str::<ErrorBody>(&text)
		.ok()
		.and_then(|body| body.detail)
		.or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
}

fn mentions_unverified(detail: Option<&str>) -> bool {
	detail.is_some_and(|d| {
		let d = d.to_lowercase();
		d.contains("not verified") || d.contains("unverified") || d.contains("no verificado")
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn base_url_gains_trailing_slash() {
		let client = ApiClient::new("https://api.example.com/v1", Duration::from_secs(1)).unwrap();
		assert_eq!(client.endpoint("users/me").unwrap().as_str(), "https://api.example.com/v1/users/me");
	}

	#[test]
	fn non_http_base_url_is_rejected() {
		let err = ApiClient::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn unverified_detection_covers_known_phrasings() {
		assert!(mentions_unverified(Some("Correo no verificado")));
		assert!(mentions_unverified(Some("Email not verified")));
		assert!(!mentions_unverified(Some("Wrong password")));
		assert!(!mentions_unverified(None));
	}
}
