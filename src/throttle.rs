//! Self-correcting request spacing without an explicit queue.
//!
//! The throttle keeps one counter of outstanding scheduled work in milliseconds. Acquiring a
//! permit adds the fixed per-request cost and waits for whatever was already outstanding;
//! dropping the permit returns the lesser of the elapsed time and the cost. Calls that
//! finish faster than the cost hand back credit instead of over-throttling later calls.

// std
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};
// crates.io
use tokio::time::{self, Instant};
// self
use crate::obs;

/// Minimum spacing Reddit's OAuth API allows between requests.
pub const DEFAULT_REQUEST_COST: Duration = Duration::from_millis(1000);

/// Shared outstanding-work counter for one client.
#[derive(Debug)]
pub struct Throttle {
	backlog_ms: AtomicU64,
	cost_ms: u64,
}
impl Throttle {
	/// Creates a throttle charging `cost` per request.
	pub fn new(cost: Duration) -> Self {
		Self {
			backlog_ms: AtomicU64::new(0),
			cost_ms: u64::try_from(cost.as_millis()).unwrap_or(u64::MAX),
		}
	}

	/// Fixed per-request cost.
	pub fn cost(&self) -> Duration {
		Duration::from_millis(self.cost_ms)
	}

	/// Outstanding scheduled work.
	pub fn backlog(&self) -> Duration {
		Duration::from_millis(self.backlog_ms.load(Ordering::Acquire))
	}

	/// Reserves a request slot.
	///
	/// The counter is charged before this returns, so callers must not await anything
	/// between acquiring and waiting on the permit if they rely on ordering.
	pub fn acquire(&self) -> ThrottlePermit<'_> {
		let previous = self.backlog_ms.fetch_add(self.cost_ms, Ordering::AcqRel);

		obs::record_throttle_backlog(previous.saturating_add(self.cost_ms));

		ThrottlePermit {
			throttle: self,
			wait: Duration::from_millis(previous),
			started: Instant::now(),
		}
	}

	fn release(&self, elapsed: Duration) {
		let credit = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).min(self.cost_ms);
		let previous = self
			.backlog_ms
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
				Some(current.saturating_sub(credit))
			})
			.unwrap_or_default();

		obs::record_throttle_backlog(previous.saturating_sub(credit));
	}
}
impl Default for Throttle {
	fn default() -> Self {
		Self::new(DEFAULT_REQUEST_COST)
	}
}

/// Reserved request slot; returns its credit to the throttle when dropped.
#[derive(Debug)]
pub struct ThrottlePermit<'a> {
	throttle: &'a Throttle,
	wait: Duration,
	started: Instant,
}
impl ThrottlePermit<'_> {
	/// Time this request has to wait before it may be sent.
	pub fn wait(&self) -> Duration {
		self.wait
	}

	/// Sleeps until the request may be sent.
	pub async fn ready(&self) {
		if !self.wait.is_zero() {
			time::sleep(self.wait).await;
		}
	}
}
impl Drop for ThrottlePermit<'_> {
	fn drop(&mut self) {
		self.throttle.release(self.started.elapsed());
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn back_to_back_permits_queue_additively() {
		let throttle = Throttle::default();
		let first = throttle.acquire();
		let second = throttle.acquire();
		let third = throttle.acquire();

		assert_eq!(first.wait(), Duration::ZERO);
		assert_eq!(second.wait(), Duration::from_millis(1000));
		assert_eq!(third.wait(), Duration::from_millis(2000));
		assert_eq!(throttle.backlog(), Duration::from_millis(3000));

		time::advance(Duration::from_millis(50)).await;
		drop(first);

		assert_eq!(throttle.backlog(), Duration::from_millis(2950));

		drop(second);
		drop(third);
	}

	#[tokio::test(start_paused = true)]
	async fn slow_calls_return_at_most_the_cost() {
		let throttle = Throttle::default();
		let permit = throttle.acquire();

		time::advance(Duration::from_millis(4000)).await;
		drop(permit);

		assert_eq!(throttle.backlog(), Duration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn ready_sleeps_for_the_outstanding_work() {
		let throttle = Throttle::new(Duration::from_millis(200));
		let _first = throttle.acquire();
		let second = throttle.acquire();
		let before = Instant::now();

		second.ready().await;

		assert!(before.elapsed() >= Duration::from_millis(200));
	}

	#[test]
	fn backlog_never_goes_negative() {
		let throttle = Throttle::default();

		throttle.release(Duration::from_millis(500));

		assert_eq!(throttle.backlog(), Duration::ZERO);
	}
}
