//! Key-value storage contract backing the token store, plus built-in backends.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

// self
use crate::_prelude::*;

/// Synchronous key-value capability where credentials are persisted.
///
/// Mirrors browser-style local storage: string keys to string values, no expiry.
pub trait KeyValueStorage
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

	/// Removes `key`; removing a missing key succeeds.
	fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Error type produced by [`KeyValueStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StorageError {
	/// Serialization failures surfaced by the backend or the token store.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn storage_error_converts_into_error_with_source() {
		let storage_error = StorageError::Backend { message: "disk unavailable".into() };
		let err: Error = storage_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert!(err.to_string().contains("disk unavailable"));

		let source = StdError::source(&err)
			.expect("Error should expose the original storage error as its source.");

		assert_eq!(source.to_string(), storage_error.to_string());
	}
}
