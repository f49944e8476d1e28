//! Toast sink contract and the console-backed default.

// std
use std::io::{self, Write};
// crates.io
use time::Duration;
// self
use crate::_prelude::*;

/// Capability for displaying a transient message to the user.
///
/// Only [`Toast::show`] is required. [`Toast::hide`] and [`Toast::config`] are advisory hooks for
/// UI-backed sinks; the pipeline never depends on them.
pub trait Toast
where
	Self: Send + Sync,
{
	/// Displays `message`.
	fn show(&self, message: &str);

	/// Dismisses the currently visible message, if the sink supports it.
	fn hide(&self) {}

	/// Display preferences for this sink.
	fn config(&self) -> Option<ToastConfig> {
		None
	}
}

/// Advisory display configuration for a [`Toast`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastConfig {
	/// How long a message stays visible.
	pub duration: Option<Duration>,
	/// Screen anchor.
	pub position: Option<ToastPosition>,
	/// Severity styling.
	pub kind: Option<ToastKind>,
}
impl ToastConfig {
	/// Sets the visible duration.
	pub fn with_duration(mut self, duration: Duration) -> Self {
		self.duration = Some(duration);

		self
	}

	/// Sets the screen anchor.
	pub fn with_position(mut self, position: ToastPosition) -> Self {
		self.position = Some(position);

		self
	}

	/// Sets the severity styling.
	pub fn with_kind(mut self, kind: ToastKind) -> Self {
		self.kind = Some(kind);

		self
	}
}

/// Screen anchor for a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastPosition {
	/// Top edge.
	Top,
	/// Bottom edge.
	Bottom,
	/// Centered.
	Center,
}

/// Severity styling for a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
	/// Positive confirmation.
	Success,
	/// Failure.
	Error,
	/// Caution.
	Warning,
	/// Neutral notice.
	Info,
}

/// Default sink for environments without a UI; writes each message to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleToast;
impl Toast for ConsoleToast {
	fn show(&self, message: &str) {
		// Nowhere left to report a failed console write.
		let _ = writeln!(io::stderr().lock(), "{message}");
	}

	fn config(&self) -> Option<ToastConfig> {
		Some(ToastConfig::default().with_kind(ToastKind::Error))
	}
}
