use crate::http::transport::TransportError;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

type Producer<In> =
    Arc<dyn Fn(In) -> BoxFuture<'static, Result<Value, TransportError>> + Send + Sync>;

/// A restartable HTTP request unit.
///
/// Wraps a request-producing closure and exposes a success channel and an
/// error channel, each optionally behind a transform. Every invocation is
/// independent; concurrent invocations share no state, and a failure in
/// one unit never disturbs another unit's in-flight requests.
pub struct RequestUnit<In, Out = Value, Err = TransportError>
where
    Out: Clone + Send + 'static,
    Err: Clone + Send + 'static,
{
    producer: Producer<In>,
    map_success: Arc<dyn Fn(Value) -> Out + Send + Sync>,
    map_error: Arc<dyn Fn(TransportError) -> Err + Send + Sync>,
    success_tx: broadcast::Sender<Out>,
    error_tx: broadcast::Sender<Err>,
}

impl<In, Out, Err> Clone for RequestUnit<In, Out, Err>
where
    Out: Clone + Send + 'static,
    Err: Clone + Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
            map_success: self.map_success.clone(),
            map_error: self.map_error.clone(),
            success_tx: self.success_tx.clone(),
            error_tx: self.error_tx.clone(),
        }
    }
}

impl<In: Send + 'static> RequestUnit<In> {
    /// A unit that forwards responses and errors untransformed.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn(In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, TransportError>> + Send + 'static,
    {
        Self::with_maps(producer, |value| value, |error| error)
    }
}

impl<In, Out, Err> RequestUnit<In, Out, Err>
where
    In: Send + 'static,
    Out: Clone + Send + 'static,
    Err: Clone + Send + 'static,
{
    /// A unit with a success transform and an error transform installed.
    pub fn with_maps<F, Fut, S, E>(producer: F, map_success: S, map_error: E) -> Self
    where
        F: Fn(In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, TransportError>> + Send + 'static,
        S: Fn(Value) -> Out + Send + Sync + 'static,
        E: Fn(TransportError) -> Err + Send + Sync + 'static,
    {
        // Buffer 64 events. A subscriber that falls behind skips
        // intermediate results and keeps receiving the newest ones.
        let (success_tx, _) = broadcast::channel(64);
        let (error_tx, _) = broadcast::channel(64);
        let producer = move |input: In| -> BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(producer(input))
        };
        Self {
            producer: Arc::new(producer),
            map_success: Arc::new(map_success),
            map_error: Arc::new(map_error),
            success_tx,
            error_tx,
        }
    }

    /// Run one invocation and return its outcome. The result is also
    /// published to the matching channel.
    pub async fn send(&self, input: In) -> Result<Out, Err> {
        match (self.producer)(input).await {
            Ok(value) => {
                let out = (self.map_success)(value);
                // Ignore send errors (no subscribers)
                let _ = self.success_tx.send(out.clone());
                Ok(out)
            }
            Err(error) => {
                log::warn!("request failed: {}", error);
                let err = (self.map_error)(error);
                let _ = self.error_tx.send(err.clone());
                Err(err)
            }
        }
    }

    /// Fire-and-forget invocation; the outcome reaches subscribers through
    /// the success or error channel.
    pub fn invoke(&self, input: In) {
        let unit = self.clone();
        tokio::spawn(async move {
            let _ = unit.send(input).await;
        });
    }

    /// Subscribe to transformed successful responses.
    pub fn successes(&self) -> broadcast::Receiver<Out> {
        self.success_tx.subscribe()
    }

    /// Subscribe to transformed failures.
    pub fn errors(&self) -> broadcast::Receiver<Err> {
        self.error_tx.subscribe()
    }
}
