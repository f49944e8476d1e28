//! Optional observability for pipeline flows.
//!
//! Every observed flow (a request, a refresh flight, a logout, a local erase) goes through
//! [`observe`] or [`observe_sync`], which count the attempt, run the work inside a span, and
//! stamp the outcome on both the span and the counter.
//!
//! # Feature Flags
//!
//! - `tracing`: spans named `authed_request.flow` with `flow`, `stage`, and `outcome` fields.
//!   Failed flows also emit a `warn` event inside the span.
//! - `metrics`: the `authed_request_flow_total` counter, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::record_outcome;
pub use tracing::FlowSpan;

// self
use crate::_prelude::*;

/// Pipeline operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// One logical call through [`RequestClient`](crate::client::RequestClient).
	Request,
	/// Refresh-token exchange (one per single-flight).
	Refresh,
	/// Remote logout plus local credential erase.
	Logout,
	/// Local credential erase without contacting the auth service.
	Erase,
}
impl FlowKind {
	/// Label used for span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Refresh => "refresh",
			FlowKind::Logout => "logout",
			FlowKind::Erase => "erase",
		}
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Flow started.
	Attempt,
	/// Flow finished with `Ok`.
	Success,
	/// Flow finished with `Err`.
	Failure,
}
impl FlowOutcome {
	/// Terminal outcome of `result`.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}

	/// Label used for span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}

/// Runs `fut` as one observed flow of `kind`.
pub async fn observe<T, E, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);

	record_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	finish(kind, &span, &result);

	result
}

/// Synchronous counterpart of [`observe`].
pub fn observe_sync<T, E>(
	kind: FlowKind,
	stage: &'static str,
	f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
	let span = FlowSpan::new(kind, stage);

	record_outcome(kind, FlowOutcome::Attempt);

	let result = span.in_scope(f);

	finish(kind, &span, &result);

	result
}

fn finish<T, E>(kind: FlowKind, span: &FlowSpan, result: &Result<T, E>) {
	let outcome = FlowOutcome::of(result);

	span.close(outcome);
	record_outcome(kind, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok: Result<u8, ()> = observe(FlowKind::Refresh, "ok", async { Ok(42) }).await;
		let failed: Result<(), &str> =
			observe_sync(FlowKind::Erase, "failed", || Err("disk unavailable"));

		assert_eq!(ok, Ok(42));
		assert_eq!(failed, Err("disk unavailable"));
		assert_eq!(FlowOutcome::of(&ok), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of(&failed), FlowOutcome::Failure);
	}
}
