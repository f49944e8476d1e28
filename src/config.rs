//! Client configuration: base URL, auth endpoints, storage key, and user-facing messages.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError, path, token::DEFAULT_STORAGE_KEY};

/// Default refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default logout endpoint, relative to the base URL.
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";
/// Message shown when a session cannot be refreshed.
pub const DEFAULT_SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again.";
/// Message used when a failure carries no better description.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed.";

/// Environment variable holding the base URL.
pub const ENV_BASE_URL: &str = "AUTHED_REQUEST_BASE_URL";
/// Fallback environment variable holding the base URL.
pub const ENV_BASE_URL_FALLBACK: &str = "BASE_URL";
/// Environment variable overriding the refresh endpoint.
pub const ENV_REFRESH_PATH: &str = "AUTHED_REQUEST_REFRESH_PATH";
/// Environment variable overriding the logout endpoint.
pub const ENV_LOGOUT_PATH: &str = "AUTHED_REQUEST_LOGOUT_PATH";
/// Environment variable overriding the storage key.
pub const ENV_STORAGE_KEY: &str = "AUTHED_REQUEST_STORAGE_KEY";

/// Settings shared by a [`RequestClient`](crate::client::RequestClient) and its auth service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL relative templates are joined onto; `None` requires absolute templates.
	pub base_url: Option<Url>,
	/// Storage key for the credential pair.
	pub storage_key: String,
	/// Refresh endpoint, relative to the base URL or absolute.
	pub refresh_path: String,
	/// Logout endpoint, relative to the base URL or absolute.
	pub logout_path: String,
	/// Message reported when refresh fails.
	pub session_expired_message: String,
	/// Message used when no server or transport message exists.
	pub failure_message: String,
}
impl ClientConfig {
	/// Creates a configuration with defaults for everything but the base URL.
	pub fn new(base_url: Option<Url>) -> Self {
		Self {
			base_url,
			storage_key: DEFAULT_STORAGE_KEY.into(),
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			logout_path: DEFAULT_LOGOUT_PATH.into(),
			session_expired_message: DEFAULT_SESSION_EXPIRED_MESSAGE.into(),
			failure_message: DEFAULT_FAILURE_MESSAGE.into(),
		}
	}

	/// Parses `base_url` and builds a configuration around it.
	pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(base_url)
			.map_err(|source| ConfigError::InvalidUrl { url: base_url.to_owned(), source })?;

		Ok(Self::new(Some(url)))
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Reads the configuration through `lookup`; empty values count as unset.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let mut config = match read(ENV_BASE_URL).or_else(|| read(ENV_BASE_URL_FALLBACK)) {
			Some(base) => Self::with_base_url(base.trim())?,
			None => Self::new(None),
		};

		if let Some(path) = read(ENV_REFRESH_PATH) {
			config.refresh_path = path;
		}
		if let Some(path) = read(ENV_LOGOUT_PATH) {
			config.logout_path = path;
		}
		if let Some(key) = read(ENV_STORAGE_KEY) {
			config.storage_key = key;
		}

		Ok(config)
	}

	/// Overrides the storage key.
	pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
		self.storage_key = key.into();

		self
	}

	/// Overrides the refresh endpoint.
	pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint.
	pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the session-expired message.
	pub fn with_session_expired_message(mut self, message: impl Into<String>) -> Self {
		self.session_expired_message = message.into();

		self
	}

	/// Overrides the generic failure message.
	pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
		self.failure_message = message.into();

		self
	}

	/// Absolute refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		path::join(self.base_url.as_ref(), &self.refresh_path)
	}

	/// Absolute logout endpoint.
	pub fn logout_url(&self) -> Result<Url, ConfigError> {
		path::join(self.base_url.as_ref(), &self.logout_path)
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self::new(None)
	}
}
