//! Uniform call outcome returned by the non-raising entry points.

// crates.io
use serde::ser::{SerializeStruct, Serializer};
// self
use crate::_prelude::*;

/// Outcome of one logical call.
///
/// Serializes as `{"data": .., "success": true}` or
/// `{"success": false, "errorCode": .., "errorMessage": ..}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiResponse<T> {
	/// 2xx response with its decoded body.
	Success {
		/// Decoded response body.
		data: T,
	},
	/// Call failed after the pipeline ran its recovery and reporting.
	Failure {
		/// HTTP status, or 500 when none was received.
		error_code: u16,
		/// Server message, transport message, or the generic failure message.
		error_message: String,
	},
}
impl<T> ApiResponse<T> {
	/// Returns `true` for [`ApiResponse::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Borrows the decoded body on success.
	pub fn data(&self) -> Option<&T> {
		match self {
			Self::Success { data } => Some(data),
			Self::Failure { .. } => None,
		}
	}

	/// Consumes the response, returning the body on success.
	pub fn into_data(self) -> Option<T> {
		match self {
			Self::Success { data } => Some(data),
			Self::Failure { .. } => None,
		}
	}

	/// Failure status code, if the call failed.
	pub fn error_code(&self) -> Option<u16> {
		match self {
			Self::Success { .. } => None,
			Self::Failure { error_code, .. } => Some(*error_code),
		}
	}

	/// Failure message, if the call failed.
	pub fn error_message(&self) -> Option<&str> {
		match self {
			Self::Success { .. } => None,
			Self::Failure { error_message, .. } => Some(error_message),
		}
	}

	/// Maps the success body.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
		match self {
			Self::Success { data } => ApiResponse::Success { data: f(data) },
			Self::Failure { error_code, error_message } =>
				ApiResponse::Failure { error_code, error_message },
		}
	}
}
impl<T> Serialize for ApiResponse<T>
where
	T: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Success { data } => {
				let mut state = serializer.serialize_struct("ApiResponse", 2)?;

				state.serialize_field("data", data)?;
				state.serialize_field("success", &true)?;
				state.end()
			},
			Self::Failure { error_code, error_message } => {
				let mut state = serializer.serialize_struct("ApiResponse", 3)?;

				state.serialize_field("success", &false)?;
				state.serialize_field("errorCode", error_code)?;
				state.serialize_field("errorMessage", error_message)?;
				state.end()
			},
		}
	}
}
