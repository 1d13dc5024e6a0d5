//! Long-polling transport: a `getUpdates` loop with retry and per-update
//! task fan-out (§4.5 "long poller").

use std::sync::Arc;
use std::time::Duration;

use tgbot_types::{DeleteWebhook, GetUpdates, GetWebhookInfo};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::errors::TransportError;
use crate::retry::{RetryContext, RetryPolicy, TooManyRequestsBackoff};
use crate::router::Router;
use crate::update::{Invoke, Update, invoke};

/// Polls `getUpdates` and dispatches each batch through a [`Router`], one
/// spawned task per update (§4.5).
pub struct LongPoller<P = TooManyRequestsBackoff> {
    client: Arc<dyn Invoke>,
    router: Arc<Router>,
    retry_policy: P,
    limit: Option<i64>,
    poll_timeout_secs: i64,
    allowed_updates: Option<Vec<String>>,
    handler_timeout: Option<Duration>,
}

impl LongPoller<TooManyRequestsBackoff> {
    pub fn new(client: Arc<dyn Invoke>, router: Arc<Router>) -> Self {
        Self {
            client,
            router,
            retry_policy: TooManyRequestsBackoff::default(),
            limit: None,
            poll_timeout_secs: 30,
            allowed_updates: None,
            handler_timeout: None,
        }
    }
}

impl<P: RetryPolicy> LongPoller<P> {
    /// Swaps in a different retry policy, e.g. [`crate::retry::NoRetries`] for
    /// a poller that should stop at the first transport error.
    pub fn retry_policy<P2: RetryPolicy>(self, retry_policy: P2) -> LongPoller<P2> {
        LongPoller {
            client: self.client,
            router: self.router,
            retry_policy,
            limit: self.limit,
            poll_timeout_secs: self.poll_timeout_secs,
            allowed_updates: self.allowed_updates,
            handler_timeout: self.handler_timeout,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn poll_timeout_secs(mut self, secs: i64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    pub fn allowed_updates(mut self, updates: Vec<String>) -> Self {
        self.allowed_updates = Some(updates);
        self
    }

    /// Caps how long a single update's handler may run; a timed-out handler
    /// is abandoned, not cancelled mid-await, and only logged.
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    /// Polls until `shutdown` reports `true`, then waits for every in-flight
    /// handler task before returning. On start, deletes any webhook
    /// currently configured for this bot — a bot cannot receive updates
    /// through both transports at once.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        self.delete_configured_webhook().await?;

        let mut offset: i64 = 0;
        let mut tasks = JoinSet::new();
        let mut fail_count: u32 = 0;

        while !*shutdown.borrow() {
            let mut request = GetUpdates::new().offset(offset).timeout(self.poll_timeout_secs);
            if let Some(limit) = self.limit {
                request = request.limit(limit);
            }
            if let Some(updates) = self.allowed_updates.clone() {
                request = request.allowed_updates(updates);
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = invoke(self.client.as_ref(), request) => {
                    match result {
                        Ok(updates) => {
                            fail_count = 0;
                            if let Some(last) = updates.last() {
                                offset = last.update_id + 1;
                            }
                            self.spawn_updates(updates, &mut tasks);
                        }
                        Err(error) => {
                            fail_count += 1;
                            let ctx = RetryContext {
                                fail_count: std::num::NonZeroU32::new(fail_count).expect("incremented above zero"),
                                slept_so_far: Duration::ZERO,
                                error,
                            };
                            match self.retry_policy.should_retry(&ctx) {
                                std::ops::ControlFlow::Continue(delay) => {
                                    tokio::select! {
                                        _ = tokio::time::sleep(delay) => {}
                                        _ = shutdown.changed() => break,
                                    }
                                }
                                std::ops::ControlFlow::Break(()) => {
                                    tracing::warn!(fail_count, "retry policy declined to retry, stopping the poller");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    fn spawn_updates(&self, updates: Vec<tgbot_types::Update>, tasks: &mut JoinSet<()>) {
        for raw in updates {
            let update = Update::new(raw, self.client.clone(), None);
            let router = self.router.clone();
            let deadline = self.handler_timeout;
            tasks.spawn(async move {
                let dispatch = router.dispatch(update);
                match deadline {
                    Some(timeout) => {
                        if tokio::time::timeout(timeout, dispatch).await.is_err() {
                            tracing::warn!("handler exceeded its deadline, abandoning");
                        }
                    }
                    None => dispatch.await,
                }
            });
        }
    }

    async fn delete_configured_webhook(&self) -> Result<(), TransportError> {
        let info = invoke(self.client.as_ref(), GetWebhookInfo::new()).await?;
        if !info.url.is_empty() {
            invoke(self.client.as_ref(), DeleteWebhook::new()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<Result<serde_json::Value, TransportError>>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Invoke for ScriptedClient {
        async fn invoke_raw(
            &self,
            method: &'static str,
            _args: serde_json::Value,
        ) -> Result<serde_json::Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if method == "getWebhookInfo" {
                return Ok(serde_json::json!({"url": "", "has_custom_certificate": false, "pending_update_count": 0}));
            }
            if method == "deleteWebhook" {
                return Ok(serde_json::json!(true));
            }
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() { Ok(serde_json::json!([])) } else { responses.remove(0) }
        }
    }

    #[tokio::test]
    async fn stops_politely_when_shutdown_flips_before_the_first_poll() {
        let client = Arc::new(ScriptedClient { responses: Mutex::new(vec![]), calls: AtomicUsize::new(0) });
        let router = Arc::new(Router::new());
        let poller = LongPoller::new(client, router);
        let (tx, rx) = watch::channel(true);
        drop(tx);
        poller.run(rx).await.unwrap();
    }

    #[tokio::test]
    async fn dispatches_a_polled_update_and_advances_the_offset() {
        let hits = Arc::new(AtomicUsize::new(0));
        let update_json = serde_json::json!([{
            "update_id": 41,
            "message": {"message_id": 1, "date": 0, "chat": {"id": 1, "type": "private"}},
        }]);
        let client = Arc::new(ScriptedClient {
            responses: Mutex::new(vec![Ok(update_json)]),
            calls: AtomicUsize::new(0),
        });
        let mut router = Router::new();
        let h = hits.clone();
        router.on::<tgbot_types::Message, _>(vec![], move |_u: crate::update::TypedUpdate<tgbot_types::Message>| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let poller = LongPoller::new(client, Arc::new(router));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { poller.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
