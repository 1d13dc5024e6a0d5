//! Update routing: registration, middleware snapshots and dispatch order
//! (§4.4).
//!
//! Dispatch: classify the update by its populated variant field; if none,
//! return without action. Build the candidate list — every generic handler
//! in registration order, then every typed handler registered for that
//! variant in registration order. Evaluate each candidate's filter in turn;
//! the first candidate whose filter allows runs, and its outcome is the
//! dispatch outcome. A filter error or handler error goes to the error
//! handler, if one is registered. If no candidate allows, "no match" is a
//! success, not an error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{DispatchError, FilterError, HandlerError};
use crate::filters::{All, Filter};
use crate::middleware::{BoxFuture, ErasedHandler, Middleware, wrap};
use crate::update::{Update, UpdateKind, Variant};

/// A handler registered for one update variant.
#[async_trait]
pub trait TypedHandler<V>: Send + Sync {
    async fn handle(&self, update: &crate::update::TypedUpdate<V>) -> Result<(), HandlerError>;
}

#[async_trait]
impl<V, F, Fut> TypedHandler<V> for F
where
    V: Clone + Send + Sync,
    F: Fn(crate::update::TypedUpdate<V>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, update: &crate::update::TypedUpdate<V>) -> Result<(), HandlerError> {
        (self)(update.clone()).await
    }
}

/// A handler that sees every update, regardless of variant.
#[async_trait]
pub trait GenericHandler: Send + Sync {
    async fn handle(&self, update: &Update) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> GenericHandler for F
where
    F: Fn(&Update) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, update: &Update) -> Result<(), HandlerError> {
        (self)(update).await
    }
}

/// Invoked with the dispatch error, when one is registered.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, update: &Update, error: DispatchError);
}

#[async_trait]
impl<F, Fut> ErrorHandler for F
where
    F: Fn(&Update, DispatchError) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, update: &Update, error: DispatchError) {
        (self)(update, error).await
    }
}

/// One registered slot in the dispatch table: a filter gate plus a
/// middleware-wrapped handler, with its variant erased so generic and typed
/// registrations can share one candidate list.
#[async_trait]
trait Candidate: Send + Sync {
    /// `Ok(None)` if the filter declined — try the next candidate. `Ok(Some(_))`
    /// if it ran, carrying the handler's own result.
    async fn dispatch(&self, update: &Update) -> Result<Option<Result<(), HandlerError>>, FilterError>;
}

struct TypedCandidate<V> {
    filter: Option<All<V>>,
    wrapped: Arc<dyn ErasedHandler>,
}

#[async_trait]
impl<V: Variant> Candidate for TypedCandidate<V> {
    async fn dispatch(&self, update: &Update) -> Result<Option<Result<(), HandlerError>>, FilterError> {
        let Some(typed) = update.typed::<V>() else { return Ok(None) };
        if let Some(filter) = &self.filter {
            if !filter.allows(&typed).await? {
                return Ok(None);
            }
        }
        Ok(Some(self.wrapped.call(update).await))
    }
}

struct GenericCandidate {
    wrapped: Arc<dyn ErasedHandler>,
}

#[async_trait]
impl Candidate for GenericCandidate {
    async fn dispatch(&self, update: &Update) -> Result<Option<Result<(), HandlerError>>, FilterError> {
        Ok(Some(self.wrapped.call(update).await))
    }
}

/// Registers handlers, middleware and an error handler, and dispatches
/// incoming updates against them (§4.4).
#[derive(Default)]
pub struct Router {
    generic: Vec<Box<dyn Candidate>>,
    typed: HashMap<UpdateKind, Vec<Box<dyn Candidate>>>,
    middleware_chain: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a middleware layer. Only handlers registered *after* this
    /// call are wrapped by it — the chain is snapshotted at registration
    /// time, so later installs never retroactively affect earlier ones.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware_chain.push(Arc::new(middleware));
        self
    }

    pub fn on_error(&mut self, handler: impl ErrorHandler + 'static) -> &mut Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Register a handler for variant `V`, gated by zero or more filters
    /// combined with short-circuit AND.
    pub fn on<V, H>(&mut self, filters: Vec<Box<dyn Filter<V>>>, handler: H) -> &mut Self
    where
        V: Variant,
        H: TypedHandler<V> + 'static,
    {
        let base = erase_typed(handler);
        let wrapped = wrap(base, &self.middleware_chain);
        let filter = if filters.is_empty() { None } else { Some(All::new(filters)) };
        self.typed.entry(V::KIND).or_default().push(Box::new(TypedCandidate::<V> { filter, wrapped }));
        self
    }

    /// Register a handler that sees every update, unconditionally. Tried
    /// before any typed handler for the same variant.
    pub fn on_any(&mut self, handler: impl GenericHandler + 'static) -> &mut Self {
        let handler = Arc::new(handler);
        let base: Arc<dyn ErasedHandler> =
            Arc::new(move |update: &Update| {
                let handler = handler.clone();
                let update = update.clone();
                async move { handler.handle(&update).await }
            });
        let wrapped = wrap(base, &self.middleware_chain);
        self.generic.push(Box::new(GenericCandidate { wrapped }));
        self
    }

    /// Dispatch one received update against the registered candidates.
    pub async fn dispatch(&self, update: Update) {
        let Some(kind) = update.kind() else { return };
        let candidates = self.generic.iter().chain(self.typed.get(&kind).into_iter().flatten());
        for candidate in candidates {
            match candidate.dispatch(&update).await {
                Ok(Some(Ok(()))) => return,
                Ok(Some(Err(err))) => {
                    self.route_error(&update, DispatchError::Handler(err)).await;
                    return;
                }
                Ok(None) => continue,
                Err(err) => {
                    self.route_error(&update, DispatchError::Filter(err)).await;
                    return;
                }
            }
        }
    }

    async fn route_error(&self, update: &Update, error: DispatchError) {
        match &self.error_handler {
            Some(handler) => handler.handle(update, error).await,
            None => tracing::error!(%error, "unhandled dispatch error"),
        }
    }
}

fn erase_typed<V, H>(handler: H) -> Arc<dyn ErasedHandler>
where
    V: Variant,
    H: TypedHandler<V> + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |update: &Update| {
        let handler = handler.clone();
        let typed = update.typed::<V>();
        async move {
            match typed {
                Some(typed) => handler.handle(&typed).await,
                None => Ok(()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tgbot_types::Message;

    struct NullClient;
    #[async_trait]
    impl crate::update::Invoke for NullClient {
        async fn invoke_raw(
            &self,
            _m: &'static str,
            _a: serde_json::Value,
        ) -> Result<serde_json::Value, TransportError> {
            Ok(serde_json::json!({}))
        }
    }

    fn message_update(text: &str) -> Update {
        let raw: tgbot_types::Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 1, "date": 0, "chat": {"id": 1, "type": "private"}, "text": text},
        }))
        .unwrap();
        Update::new(raw, Arc::new(NullClient), None)
    }

    #[tokio::test]
    async fn first_matching_typed_handler_wins_over_later_ones() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        let h1 = hits.clone();
        router.on::<Message, _>(vec![], move |_u: crate::update::TypedUpdate<Message>| {
            let h1 = h1.clone();
            async move {
                h1.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let h2 = hits.clone();
        router.on::<Message, _>(vec![], move |_u: crate::update::TypedUpdate<Message>| {
            let h2 = h2.clone();
            async move {
                h2.fetch_add(100, Ordering::SeqCst);
                Ok(())
            }
        });
        router.dispatch(message_update("hi")).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generic_handlers_run_before_typed_ones() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut router = Router::new();
        let o1 = order.clone();
        router.on_any(move |_u: &Update| {
            let o1 = o1.clone();
            async move {
                o1.lock().unwrap().push("generic");
                Ok(())
            }
        });
        let o2 = order.clone();
        router.on::<Message, _>(vec![], move |_u: crate::update::TypedUpdate<Message>| {
            let o2 = o2.clone();
            async move {
                o2.lock().unwrap().push("typed");
                Ok(())
            }
        });
        router.dispatch(message_update("hi")).await;
        assert_eq!(*order.lock().unwrap(), vec!["generic"]);
    }

    #[tokio::test]
    async fn middleware_installed_after_registration_does_not_wrap_earlier_handlers() {
        let seen = Arc::new(AtomicUsize::new(0));
        struct Counter(Arc<AtomicUsize>);
        impl Middleware for Counter {
            fn call<'a>(
                &'a self,
                update: &'a Update,
                next: &'a dyn ErasedHandler,
            ) -> BoxFuture<'a, Result<(), HandlerError>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(next.call(update))
            }
        }

        let mut router = Router::new();
        router.on::<Message, _>(vec![], |_u: crate::update::TypedUpdate<Message>| async { Ok(()) });
        router.use_middleware(Counter(seen.clone()));
        router.on::<Message, _>(vec![], |_u: crate::update::TypedUpdate<Message>| async { Ok(()) });

        router.dispatch(message_update("hi")).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0, "first registration predates the middleware");
    }

    #[tokio::test]
    async fn no_matching_candidate_is_a_quiet_success() {
        let router = Router::new();
        router.dispatch(message_update("hi")).await;
    }
}
