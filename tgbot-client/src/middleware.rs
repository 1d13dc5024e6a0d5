//! Middleware: a wrapper transforming a handler, composed left-to-right at
//! the outside so registration-time snapshots are stable (§4.4, glossary
//! "Middleware").
//!
//! Middleware operates on the erased [`Update`] rather than a typed
//! variant — it is cross-cutting (logging, timing, the session layer in
//! [`crate::session`]) and does not need the variant payload a particular
//! handler was registered for.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::HandlerError;
use crate::update::Update;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A handler with its variant type erased — what middleware actually wraps.
pub trait ErasedHandler: Send + Sync {
    fn call<'a>(&'a self, update: &'a Update) -> BoxFuture<'a, Result<(), HandlerError>>;
}

impl<F, Fut> ErasedHandler for F
where
    F: Fn(&Update) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call<'a>(&'a self, update: &'a Update) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin((self)(update))
    }
}

/// A wrapper transforming a handler. Installed via [`crate::router::Router::use_middleware`]
/// and captured at registration time: later installs do not retroactively
/// affect already-registered handlers.
pub trait Middleware: Send + Sync {
    fn call<'a>(
        &'a self,
        update: &'a Update,
        next: &'a dyn ErasedHandler,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// One link in a middleware chain, composed around a handler at registration.
pub(crate) struct Wrapped {
    pub middleware: Arc<dyn Middleware>,
    pub next: Arc<dyn ErasedHandler>,
}

impl ErasedHandler for Wrapped {
    fn call<'a>(&'a self, update: &'a Update) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move { self.middleware.call(update, self.next.as_ref()).await })
    }
}

/// Fold the middleware snapshot around `base`, outermost-first, matching
/// `Middleware` composed "left-to-right at the outside" (glossary).
pub(crate) fn wrap(base: Arc<dyn ErasedHandler>, chain: &[Arc<dyn Middleware>]) -> Arc<dyn ErasedHandler> {
    chain.iter().rev().fold(base, |next, middleware| {
        Arc::new(Wrapped { middleware: middleware.clone(), next }) as Arc<dyn ErasedHandler>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMiddleware(Arc<AtomicUsize>);
    impl Middleware for CountingMiddleware {
        fn call<'a>(
            &'a self,
            update: &'a Update,
            next: &'a dyn ErasedHandler,
        ) -> BoxFuture<'a, Result<(), HandlerError>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(next.call(update))
        }
    }

    fn blank_update() -> Update {
        let raw: tgbot_types::Update = serde_json::from_value(serde_json::json!({"update_id": 1})).unwrap();
        struct NullClient;
        #[async_trait::async_trait]
        impl crate::update::Invoke for NullClient {
            async fn invoke_raw(
                &self,
                _m: &'static str,
                _a: serde_json::Value,
            ) -> Result<serde_json::Value, crate::errors::TransportError> {
                unreachable!()
            }
        }
        Update::new(raw, Arc::new(NullClient), None)
    }

    #[tokio::test]
    async fn chain_runs_outside_in_and_reaches_the_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let base: Arc<dyn ErasedHandler> = Arc::new(|_update: &Update| async { Ok(()) });
        let chain: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(CountingMiddleware(count.clone())), Arc::new(CountingMiddleware(count.clone()))];
        let wrapped = wrap(base, &chain);
        wrapped.call(&blank_update()).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
