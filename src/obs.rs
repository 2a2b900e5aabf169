//! Optional observability helpers for session flows and API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `reddit_broker.flow` with the `flow` and
//!   `stage` (call site) fields.
//! - Enable `metrics` to increment the `reddit_broker_flow_total` counter for every
//!   attempt/success/failure/retry/reauth, labeled by `flow` + `outcome`, and to publish the
//!   throttle backlog through the `reddit_broker_throttle_backlog_ms` gauge.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// User authentication (password, authorization code, implicit token, pass-through).
	Auth,
	/// Application-only authentication.
	ApplicationOnlyAuth,
	/// Refresh token renewal.
	Refresh,
	/// Token revocation.
	Deauth,
	/// API call through the retry/re-authentication loop.
	Call,
	/// Listing slice fetch.
	Listing,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Auth => "auth",
			FlowKind::ApplicationOnlyAuth => "application_only_auth",
			FlowKind::Refresh => "refresh",
			FlowKind::Deauth => "deauth",
			FlowKind::Call => "call",
			FlowKind::Listing => "listing",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Server error answered with another attempt.
	Retry,
	/// Stale token answered with re-authentication.
	Reauth,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Retry => "retry",
			FlowOutcome::Reauth => "reauth",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
