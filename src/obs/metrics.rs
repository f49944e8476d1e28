// self
use crate::obs::{FlowKind, FlowOutcome};

/// Increments `authed_request_flow_total` for `kind` + `outcome` when `metrics` is enabled.
pub fn record_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"authed_request_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}
