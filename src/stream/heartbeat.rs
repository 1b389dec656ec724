use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};

/// Trigger source for a poll loop: fires when its period elapses or when
/// `reload()` demands an immediate refresh.
///
/// `set_interval` re-arms the timer with the new period without firing.
/// A manual heartbeat has no timer and fires only on `reload()`. One poll
/// task waits on a heartbeat at a time; other parties interact with it
/// only through `set_interval` and `reload`.
#[derive(Clone)]
pub struct Heartbeat {
    inner: Arc<HeartbeatInner>,
}

struct HeartbeatInner {
    period: watch::Sender<Option<Duration>>,
    kick: Notify,
}

impl Heartbeat {
    pub fn new(period: Duration) -> Self {
        Self::with_period(Some(period))
    }

    /// A heartbeat with no timer; `wait` returns only after `reload`.
    pub fn manual() -> Self {
        Self::with_period(None)
    }

    fn with_period(period: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(HeartbeatInner {
                period: watch::Sender::new(period),
                kick: Notify::new(),
            }),
        }
    }

    /// Replace the period, restarting the timer from now.
    pub fn set_interval(&self, period: Duration) {
        self.inner.period.send_replace(Some(period));
    }

    pub fn interval(&self) -> Option<Duration> {
        *self.inner.period.borrow()
    }

    /// Demand an immediate tick. A reload issued while nobody is waiting
    /// is remembered and satisfies the next `wait`.
    pub fn reload(&self) {
        self.inner.kick.notify_one();
    }

    /// Wait for the next tick: period elapse or reload, whichever is
    /// sooner. An interval change re-arms the sleep without returning.
    pub async fn wait(&self) {
        let mut period_rx = self.inner.period.subscribe();
        loop {
            let period = *period_rx.borrow_and_update();
            tokio::select! {
                _ = self.inner.kick.notified() => return,
                _ = sleep_for(period) => return,
                changed = period_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn sleep_for(period: Option<Duration>) {
    match period {
        Some(period) => tokio::time::sleep(period).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    #[tokio::test(start_paused = true)]
    async fn fires_when_the_period_elapses() {
        let heartbeat = Heartbeat::new(Duration::from_secs(10));
        let start = Instant::now();
        heartbeat.wait().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_fires_without_waiting_for_the_period() {
        let heartbeat = Heartbeat::new(Duration::from_secs(10));
        heartbeat.reload();
        let start = Instant::now();
        heartbeat.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_heartbeat_only_fires_on_reload() {
        let heartbeat = Heartbeat::manual();
        assert!(
            timeout(Duration::from_secs(60), heartbeat.wait())
                .await
                .is_err()
        );
        heartbeat.reload();
        heartbeat.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn set_interval_rearms_a_waiting_tick() {
        let heartbeat = Heartbeat::new(Duration::from_secs(3600));
        let waiter = {
            let heartbeat = heartbeat.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                heartbeat.wait().await;
                start.elapsed()
            })
        };
        tokio::task::yield_now().await;
        heartbeat.set_interval(Duration::from_secs(5));
        let elapsed = waiter.await.expect("waiter panicked");
        assert_eq!(elapsed, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_reflects_the_latest_setting() {
        let heartbeat = Heartbeat::new(Duration::from_secs(10));
        heartbeat.set_interval(Duration::from_secs(60));
        assert_eq!(heartbeat.interval(), Some(Duration::from_secs(60)));
        assert_eq!(Heartbeat::manual().interval(), None);
    }
}
