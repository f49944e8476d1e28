//! Thread-safe in-memory [`KeyValueStorage`] for local development and tests.

// self
use crate::{
	_prelude::*,
	storage::{KeyValueStorage, StorageError},
};

/// Storage backend that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage(Arc<RwLock<HashMap<String, String>>>);
impl MemoryStorage {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl KeyValueStorage for MemoryStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
		self.0.write().insert(key.to_owned(), value);

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StorageError> {
		self.0.write().remove(key);

		Ok(())
	}
}
