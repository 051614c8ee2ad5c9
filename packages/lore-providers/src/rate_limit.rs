use std::{collections::VecDeque, time::Duration};

use tokio::{
	sync::Mutex,
	time::{self, Instant},
};

/// Sliding-window request cap: at most `max_requests` acquisitions per `window`.
#[derive(Debug)]
pub struct RateLimiter {
	max_requests: usize,
	window: Duration,
	stamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
	pub fn new(max_requests: u32, window: Duration) -> Self {
		Self {
			max_requests: (max_requests as usize).max(1),
			window,
			stamps: Mutex::new(VecDeque::new()),
		}
	}

	pub fn from_config(cfg: &lore_config::GeneratorRateLimit) -> Option<Self> {
		cfg.enabled.then(|| Self::new(cfg.max_requests, Duration::from_secs(cfg.window_secs)))
	}

	/// Waits until a slot in the current window is free, then claims it.
	pub async fn acquire(&self) {
		loop {
			let wait = {
				let mut stamps = self.stamps.lock().await;
				let now = Instant::now();

				while stamps.front().is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
				{
					stamps.pop_front();
				}

				if stamps.len() < self.max_requests {
					stamps.push_back(now);

					return;
				}

				match stamps.front() {
					Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
					None => Duration::ZERO,
				}
			};

			tracing::warn!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting.");

			time::sleep(wait).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn admits_up_to_the_cap_without_waiting() {
		let limiter = RateLimiter::new(3, Duration::from_secs(60));
		let start = Instant::now();

		for _ in 0..3 {
			limiter.acquire().await;
		}

		assert_eq!(start.elapsed(), Duration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn waits_for_the_oldest_request_to_leave_the_window() {
		let limiter = RateLimiter::new(2, Duration::from_secs(10));
		let start = Instant::now();

		limiter.acquire().await;
		time::advance(Duration::from_secs(4)).await;
		limiter.acquire().await;
		limiter.acquire().await;

		assert!(start.elapsed() >= Duration::from_secs(10));
		assert!(start.elapsed() < Duration::from_secs(14));
	}

	#[test]
	fn disabled_config_builds_no_limiter() {
		let cfg =
			lore_config::GeneratorRateLimit { enabled: false, max_requests: 1, window_secs: 1 };

		assert!(RateLimiter::from_config(&cfg).is_none());
	}
}
