use crate::http::transport::TransportError;
use crate::stream::heartbeat::Heartbeat;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

type Fetch<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, TransportError>> + Send + Sync>;

/// A shared, cached, periodically refreshed fetch.
///
/// The first subscriber starts a background loop that runs one fetch per
/// heartbeat tick and publishes snapshots through a `watch` channel, so
/// every subscriber observes the same computation and late subscribers
/// replay the latest value. A trigger arriving while a fetch is in flight
/// abandons that fetch's result and starts over, which keeps a slow stale
/// response from overwriting a newer one. Once the last subscriber is
/// gone the loop stops and the cache is cleared; the next subscriber
/// starts fresh.
pub struct SharedPoll<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<PollInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Clone for SharedPoll<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct PollInner<T> {
    heartbeat: Heartbeat,
    fetch: Fetch<T>,
    value: watch::Sender<Option<T>>,
    running: Mutex<bool>,
}

impl<T: Clone + Send + Sync + 'static> SharedPoll<T> {
    pub fn new<F, Fut>(heartbeat: Heartbeat, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let fetch = move || -> BoxFuture<'static, Result<T, TransportError>> { Box::pin(fetch()) };
        Self {
            inner: Arc::new(PollInner {
                heartbeat,
                fetch: Arc::new(fetch),
                value: watch::Sender::new(None),
                running: Mutex::new(false),
            }),
        }
    }

    /// Attach a subscriber, starting the poll loop if it is not running.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        let receiver = self.inner.value.subscribe();
        self.ensure_running();
        receiver
    }

    /// Demand an immediate refresh.
    pub fn refresh(&self) {
        self.inner.heartbeat.reload();
    }

    /// Drop the cached value without stopping the loop. Subscribers
    /// observe `None` until the next successful fetch.
    pub fn clear(&self) {
        self.inner.value.send_replace(None);
    }

    fn ensure_running(&self) {
        let mut running = match self.inner.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *running {
            return;
        }
        *running = true;
        let inner = self.inner.clone();
        tokio::spawn(async move {
            log::debug!("shared poll loop started");
            run_poll_loop(inner).await;
            log::debug!("shared poll loop stopped");
        });
    }
}

async fn run_poll_loop<T: Clone + Send + Sync + 'static>(inner: Arc<PollInner<T>>) {
    loop {
        // One fetch per trigger. A trigger arriving mid-fetch discards the
        // in-flight result and restarts, so only the latest fetch lands.
        let result = loop {
            let mut fetch = (inner.fetch)();
            tokio::select! {
                biased;
                _ = inner.heartbeat.wait() => continue,
                result = &mut fetch => break result,
            }
        };
        match result {
            Ok(value) => {
                inner.value.send_replace(Some(value));
            }
            Err(error) => {
                // Keep the previous snapshot; the next tick retries.
                log::warn!("shared poll fetch failed: {}", error);
            }
        }

        // Park until the next trigger. Stop once no subscriber remains.
        loop {
            if try_stop(&inner) {
                return;
            }
            tokio::select! {
                _ = inner.heartbeat.wait() => break,
                _ = inner.value.closed() => {}
            }
        }
    }
}

/// Stop the loop if the last subscriber is gone, clearing the cache so a
/// future subscriber starts from a fresh fetch. Returns false when a new
/// subscriber raced the shutdown.
fn try_stop<T>(inner: &PollInner<T>) -> bool {
    let mut running = match inner.running.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if inner.value.receiver_count() > 0 {
        return false;
    }
    inner.value.send_replace(None);
    *running = false;
    true
}
