//! Centralized user-facing error reporting through a swappable [`Toast`] sink.

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	toast::{ConsoleToast, Toast},
};

static GLOBAL: OnceLock<Arc<ErrorReporter>> = OnceLock::new();

/// Forwards human-readable error strings to the active [`Toast`].
///
/// The active sink can be swapped at any time with [`ErrorReporter::set_toast`]; every later
/// [`ErrorReporter::show_error`] goes to the new sink while messages already delivered stay with
/// the old one.
pub struct ErrorReporter {
	toast: RwLock<Arc<dyn Toast>>,
}
impl ErrorReporter {
	/// Creates a reporter delivering to `toast`.
	pub fn new(toast: Arc<dyn Toast>) -> Self {
		Self { toast: RwLock::new(toast) }
	}

	/// Process-wide reporter, built with a [`ConsoleToast`] on first use.
	pub fn global() -> Arc<Self> {
		GLOBAL.get_or_init(|| Arc::new(Self::default())).clone()
	}

	/// Replaces the active sink.
	pub fn set_toast(&self, toast: Arc<dyn Toast>) {
		*self.toast.write() = toast;
	}

	/// Delivers `message` to the active sink.
	pub fn show_error(&self, message: &str) {
		// Clone out of the lock so a sink may call `set_toast` without deadlocking.
		let toast = self.toast.read().clone();

		toast.show(message);
	}
}
impl Default for ErrorReporter {
	fn default() -> Self {
		Self::new(Arc::new(ConsoleToast))
	}
}
impl Debug for ErrorReporter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ErrorReporter(..)")
	}
}
