//! Pipeline-level error types shared across the transport, token store, and request client.

// self
use crate::{_prelude::*, http::TransportFailure, storage::StorageError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error code reported when a failure carries no HTTP status.
pub const DEFAULT_ERROR_CODE: u16 = 500;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StorageError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Non-2xx response or network failure reported by the transport.
	#[error(transparent)]
	Transport(#[from] TransportFailure),
	/// Refresh or logout against the auth service failed; the session is gone.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Successful response whose body does not match the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// HTTP status of the undecodable response.
		status: Option<u16>,
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// HTTP status associated with the failure, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport(failure) => failure.status,
			Self::Auth(e) => e.status(),
			Self::Decode { status, .. } => *status,
			Self::Storage(_) | Self::Config(_) => None,
		}
	}

	/// Status code surfaced in failure responses; [`DEFAULT_ERROR_CODE`] when no status exists.
	pub fn error_code(&self) -> u16 {
		self.status().unwrap_or(DEFAULT_ERROR_CODE)
	}

	/// Non-empty `message` supplied by the server in the error body.
	pub fn server_message(&self) -> Option<&str> {
		match self {
			Self::Transport(failure) => failure.server_message(),
			Self::Auth(e) => e.server_message(),
			_ => None,
		}
	}

	/// Message produced by the transport (or this error's own description), if non-empty.
	pub fn transport_message(&self) -> Option<String> {
		let message = match self {
			Self::Transport(failure) => failure.message.clone(),
			other => other.to_string(),
		};

		if message.trim().is_empty() { None } else { Some(message) }
	}

	/// Resolves the user-facing message: server message, then transport message, then
	/// `fallback`.
	pub fn user_message(&self, fallback: &str) -> String {
		self.server_message()
			.map(ToOwned::to_owned)
			.or_else(|| self.transport_message())
			.unwrap_or_else(|| fallback.to_owned())
	}

	/// Returns `true` when the failure is an HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(401)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// URL template references a placeholder with no supplied value.
	#[error("Path variable `{name}` is missing for template `{template}`.")]
	MissingPathVariable {
		/// Placeholder name.
		name: String,
		/// Template being resolved.
		template: String,
	},
	/// Resolved request URL or configured base URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be converted to JSON.
	#[error("Request body could not be serialized.")]
	InvalidBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Refresh and logout failures against the auth service.
///
/// Values are cloneable so a single in-flight refresh can hand the same failure to every
/// waiting caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// Stored credentials carry no refresh token.
	#[error("No refresh token available.")]
	MissingRefreshToken,
	/// Auth service answered with a non-2xx status.
	#[error("Auth service rejected the request with status {status}: {message}.")]
	Rejected {
		/// HTTP status returned by the auth service.
		status: u16,
		/// Transport-level description.
		message: String,
		/// `message` field of the error body, if present.
		server_message: Option<String>,
	},
	/// Auth service could not be reached.
	#[error("Network error occurred while calling the auth service: {message}.")]
	Network {
		/// Transport-level description.
		message: String,
	},
	/// Auth service answered with a body that is not a credential envelope.
	#[error("Auth service returned a malformed body: {message}.")]
	MalformedResponse {
		/// HTTP status of the response, when available.
		status: Option<u16>,
		/// Parsing failure summary including the JSON path.
		message: String,
	},
	/// Credentials could not be persisted or erased.
	#[error(transparent)]
	Storage(#[from] StorageError),
}
impl AuthError {
	/// HTTP status associated with the failure, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			Self::MalformedResponse { status, .. } => *status,
			_ => None,
		}
	}

	/// Non-empty `message` supplied by the auth service.
	pub fn server_message(&self) -> Option<&str> {
		match self {
			Self::Rejected { server_message, .. } =>
				server_message.as_deref().filter(|message| !message.is_empty()),
			_ => None,
		}
	}
}
impl From<TransportFailure> for AuthError {
	fn from(failure: TransportFailure) -> Self {
		let server_message = failure.server_message().map(ToOwned::to_owned);

		match failure.status {
			Some(status) => Self::Rejected { status, message: failure.message, server_message },
			None => Self::Network { message: failure.message },
		}
	}
}
