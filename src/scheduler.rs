//! Auto-refresh scheduling: a single cancellable timer task that feeds ticks
//! into the controller's event channel.
//!
//! Arming a schedule always tears the previous one down first, so at most
//! one timer is ever live. A zero interval disables the schedule entirely;
//! manual refresh stays available either way.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Default)]
pub struct AutoRefresh {
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl AutoRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Replace the current schedule. The previous timer is cancelled before
    /// the new one is armed; `Duration::ZERO` just cancels.
    pub fn schedule(&mut self, interval: Duration, ticks: mpsc::Sender<()>) {
        self.cancel();
        self.interval = interval;
        if interval.is_zero() {
            debug!("auto-refresh disabled");
            return;
        }

        debug!(interval = ?interval, "auto-refresh armed");
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick of tokio's interval completes immediately;
            // consume it so the first refresh lands one full interval out
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if ticks.send(()).await.is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.interval = Duration::ZERO;
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn ticks_arrive_at_the_configured_interval() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut refresh = AutoRefresh::new();
        refresh.schedule(Duration::from_millis(10), tx);
        assert!(refresh.is_active());

        for _ in 0..2 {
            timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("tick should arrive")
                .expect("channel open");
        }
    }

    #[tokio::test]
    async fn zero_interval_stops_scheduled_ticks() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut refresh = AutoRefresh::new();
        refresh.schedule(Duration::from_millis(5), tx.clone());
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("tick should arrive")
            .expect("channel open");

        refresh.schedule(Duration::ZERO, tx);
        assert!(!refresh.is_active());
        // drain whatever was in flight, then expect silence
        while rx.try_recv().is_ok() {}
        assert!(
            timeout(Duration::from_millis(50), rx.recv()).await.is_err(),
            "no further ticks after disabling"
        );
    }

    #[tokio::test]
    async fn rearming_replaces_the_previous_timer() {
        let (fast_tx, mut fast_rx) = mpsc::channel(16);
        let (slow_tx, mut slow_rx) = mpsc::channel(16);
        let mut refresh = AutoRefresh::new();
        refresh.schedule(Duration::from_millis(5), fast_tx);
        refresh.schedule(Duration::from_millis(20), slow_tx);

        timeout(Duration::from_secs(1), slow_rx.recv())
            .await
            .expect("new timer should tick")
            .expect("channel open");
        while fast_rx.try_recv().is_ok() {}
        assert!(
            timeout(Duration::from_millis(30), fast_rx.recv())
                .await
                .is_err(),
            "old timer must be gone"
        );
    }
}
