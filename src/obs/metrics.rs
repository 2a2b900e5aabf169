// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"reddit_broker_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Publishes the throttle's outstanding work in milliseconds (when enabled).
pub fn record_throttle_backlog(backlog_ms: u64) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("reddit_broker_throttle_backlog_ms").set(backlog_ms as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = backlog_ms;
	}
}
