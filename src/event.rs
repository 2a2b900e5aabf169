//! Observable client events.
//!
//! Events are delivered through a [`tokio::sync::broadcast`] channel. Nobody has to listen;
//! sends with no subscribers are dropped, and slow subscribers see
//! [`RecvError::Lagged`](tokio::sync::broadcast::error::RecvError::Lagged) instead of
//! blocking calls.

// crates.io
use tokio::sync::broadcast;
// self
use crate::{_prelude::*, error::ResponseError};

/// Capacity of the per-client event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events emitted while calls are classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
	/// A 5xx response was received; carries the response and the remaining retry budget.
	ServerError(ResponseError),
	/// The session expired and cannot be renewed automatically.
	AccessTokenExpired,
}
impl ClientEvent {
	/// Returns the event name used in logs.
	pub const fn name(&self) -> &'static str {
		match self {
			ClientEvent::ServerError(_) => "server_error",
			ClientEvent::AccessTokenExpired => "access_token_expired",
		}
	}
}

pub(crate) fn channel() -> broadcast::Sender<ClientEvent> {
	broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}

pub(crate) fn emit(sender: &broadcast::Sender<ClientEvent>, event: ClientEvent) {
	#[cfg(feature = "tracing")]
	tracing::debug!(event = event.name(), "Emitting client event.");

	// No receivers is fine; events are optional to consume.
	let _ = sender.send(event);
}
