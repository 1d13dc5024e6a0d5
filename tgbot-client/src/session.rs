//! Session middleware: keyed per-update state with at-most-one-writeback
//! (§4.8, §9 "session concurrency").
//!
//! Bracketing middleware around the handler. Before: compute a key from the
//! update (default stringified chat id; missing chat is an error), load the
//! serialized blob from the [`Store`] (absent → the declared initial value),
//! decode it (default codec: JSON) and attach it to the invocation context
//! via [`crate::update::Extensions`]. After: compare the final value against
//! the initial one — equal means `Store::del` (session reset); otherwise,
//! changed from the pre-handler snapshot means `Store::set`; unchanged means
//! neither call happens.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex as AsyncMutex;

use crate::errors::{HandlerError, StoreError};
use crate::middleware::{BoxFuture, ErasedHandler, Middleware};
use crate::session_backend::Store;
use crate::update::Update;

/// Derives the store key from an update.
pub trait KeyFn: Send + Sync + 'static {
    fn key(&self, update: &Update) -> Result<String, StoreError>;
}

impl<F> KeyFn for F
where
    F: Fn(&Update) -> Result<String, StoreError> + Send + Sync + 'static,
{
    fn key(&self, update: &Update) -> Result<String, StoreError> {
        (self)(update)
    }
}

/// Default key: the update's chat id, as decimal text.
pub struct ChatIdKey;

impl KeyFn for ChatIdKey {
    fn key(&self, update: &Update) -> Result<String, StoreError> {
        chat_id(update.raw()).map(|id| id.to_string()).ok_or_else(|| StoreError::new(NoChatOnUpdate))
    }
}

#[derive(Debug)]
struct NoChatOnUpdate;

impl fmt::Display for NoChatOnUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "update carries no chat to key a session on")
    }
}

impl std::error::Error for NoChatOnUpdate {}

fn chat_id(update: &tgbot_types::Update) -> Option<i64> {
    update
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .or_else(|| update.edited_message.as_ref().map(|m| m.chat.id))
        .or_else(|| update.channel_post.as_ref().map(|m| m.chat.id))
        .or_else(|| update.edited_channel_post.as_ref().map(|m| m.chat.id))
        .or_else(|| update.callback_query.as_ref().and_then(|c| c.message.as_ref().map(|m| m.chat.id)))
        .or_else(|| update.my_chat_member.as_ref().map(|c| c.chat.id))
        .or_else(|| update.chat_member.as_ref().map(|c| c.chat.id))
        .or_else(|| update.chat_join_request.as_ref().map(|c| c.chat.id))
}

// ─── Session<T> ───────────────────────────────────────────────────────────────

/// A handle to the mutable per-update value of type `T`, shared with the
/// middleware so it can observe the final value after the handler returns.
/// Obtained inside a handler with [`Session::current`].
pub struct Session<T>(Arc<StdMutex<T>>);

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> Session<T> {
    /// Read the [`Session<T>`] the middleware attached to this update's
    /// extensions. Panics if [`SessionMiddleware<T>`] was never installed —
    /// a handler reaching for a session that was never wired up is a
    /// programming error, not a runtime condition to recover from.
    pub fn current<V: Clone>(update: &crate::update::TypedUpdate<V>) -> Self {
        update.extensions().get::<Session<T>>().expect(
            "no Session<T> in this update's context — is SessionMiddleware<T> installed for this type?",
        )
    }

    pub fn get(&self) -> T {
        self.0.lock().expect("session mutex poisoned").clone()
    }

    pub fn set(&self, value: T) {
        *self.0.lock().expect("session mutex poisoned") = value;
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.lock().expect("session mutex poisoned"));
    }
}

// ─── SessionMiddleware<T> ───────────────────────────────────────────────────────

/// Installs keyed, typed session state around every handler registered
/// after it (§4.4 "middleware is captured at registration time").
pub struct SessionMiddleware<T, K = ChatIdKey> {
    store: Arc<dyn Store>,
    initial: T,
    key_fn: K,
    /// Guards against a duplicate `Store::get` for the same update id when
    /// more than one consumer consults the session during one dispatch (§4.8
    /// "an in-memory guard keyed by update id avoids duplicate reads").
    in_flight: AsyncMutex<HashMap<i64, Session<T>>>,
}

impl<T> SessionMiddleware<T, ChatIdKey>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn with_initial(store: Arc<dyn Store>, initial: T) -> Self {
        SessionMiddleware { store, initial, key_fn: ChatIdKey, in_flight: AsyncMutex::new(HashMap::new()) }
    }
}

impl<T> SessionMiddleware<T, ChatIdKey>
where
    T: Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// A session keyed by chat id, with `T::default()` as the declared
    /// initial value.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_initial(store, T::default())
    }
}

impl<T, K> SessionMiddleware<T, K>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
    K: KeyFn,
{
    /// Key sessions by something other than chat id (e.g. user id).
    pub fn keyed_by<K2: KeyFn>(self, key_fn: K2) -> SessionMiddleware<T, K2> {
        SessionMiddleware { store: self.store, initial: self.initial, key_fn, in_flight: AsyncMutex::new(HashMap::new()) }
    }

    async fn load(&self, update: &Update) -> Result<(String, Session<T>, T), HandlerError> {
        let key = self.key_fn.key(update).map_err(HandlerError::new)?;

        let mut in_flight = self.in_flight.lock().await;
        if let Some(existing) = in_flight.get(&update.update_id()) {
            let snapshot = existing.get();
            return Ok((key, existing.clone(), snapshot));
        }

        let blob = self.store.get(&key).await.map_err(HandlerError::new)?;
        let value = match blob {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| HandlerError::new(JsonError(e)))?,
            None => self.initial.clone(),
        };
        let snapshot = value.clone();
        let session = Session(Arc::new(StdMutex::new(value)));
        in_flight.insert(update.update_id(), session.clone());
        Ok((key, session, snapshot))
    }

    async fn forget(&self, update_id: i64) {
        self.in_flight.lock().await.remove(&update_id);
    }
}

#[derive(Debug)]
struct JsonError(serde_json::Error);
impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session codec: {}", self.0)
    }
}
impl std::error::Error for JsonError {}

impl<T, K> Middleware for SessionMiddleware<T, K>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
    K: KeyFn,
{
    fn call<'a>(&'a self, update: &'a Update, next: &'a dyn ErasedHandler) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let (key, session, pre_handler_snapshot) = self.load(update).await?;
            update.extensions().insert(session.clone());

            let result = next.call(update).await;

            self.forget(update.update_id()).await;

            let final_value = session.get();
            if final_value == self.initial {
                self.store.del(&key).await.map_err(HandlerError::new)?;
            } else if final_value != pre_handler_snapshot {
                let encoded = serde_json::to_vec(&final_value).map_err(|e| HandlerError::new(JsonError(e)))?;
                self.store.set(&key, encoded).await.map_err(HandlerError::new)?;
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_backend::InMemoryStore;
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        counter: i64,
    }

    struct NullClient;
    #[async_trait]
    impl crate::update::Invoke for NullClient {
        async fn invoke_raw(
            &self,
            _m: &'static str,
            _a: serde_json::Value,
        ) -> Result<serde_json::Value, crate::errors::TransportError> {
            unreachable!()
        }
    }

    fn update_with_chat(update_id: i64, chat_id: i64) -> Update {
        let raw: tgbot_types::Update = serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "message": {"message_id": 1, "date": 0, "chat": {"id": chat_id, "type": "private"}},
        }))
        .unwrap();
        Update::new(raw, Arc::new(NullClient), None)
    }

    fn base_handler() -> Arc<dyn ErasedHandler> {
        Arc::new(|_update: &Update| async { Ok(()) })
    }

    #[tokio::test]
    async fn mutation_to_a_nonzero_value_writes_back() {
        let store = Arc::new(InMemoryStore::new());
        let mw = SessionMiddleware::<Counter>::new(store.clone());
        let handler: Arc<dyn ErasedHandler> = Arc::new(|update: &Update| {
            let update = update.clone();
            async move {
                let session = update.extensions().get::<Session<Counter>>().unwrap();
                session.update(|c| c.counter += 1);
                Ok(())
            }
        });
        let update = update_with_chat(1, 1234);
        mw.call(&update, handler.as_ref()).await.unwrap();

        let stored = store.get("1234").await.unwrap().unwrap();
        let decoded: Counter = serde_json::from_slice(&stored).unwrap();
        assert_eq!(decoded.counter, 1);
    }

    #[tokio::test]
    async fn returning_to_the_initial_value_deletes_the_key() {
        let store = Arc::new(InMemoryStore::new());
        store.set("1234", serde_json::to_vec(&Counter { counter: 2 }).unwrap()).await.unwrap();
        let mw = SessionMiddleware::<Counter>::new(store.clone());
        let handler: Arc<dyn ErasedHandler> = Arc::new(|update: &Update| {
            let update = update.clone();
            async move {
                let session = update.extensions().get::<Session<Counter>>().unwrap();
                session.set(Counter { counter: 0 });
                Ok(())
            }
        });
        let update = update_with_chat(1, 1234);
        mw.call(&update, handler.as_ref()).await.unwrap();

        assert_eq!(store.get("1234").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reading_without_mutating_touches_neither_set_nor_del() {
        let store = Arc::new(InMemoryStore::new());
        store.set("1234", serde_json::to_vec(&Counter { counter: 5 }).unwrap()).await.unwrap();
        let mw = SessionMiddleware::<Counter>::new(store.clone());
        let handler: Arc<dyn ErasedHandler> = Arc::new(|update: &Update| {
            let update = update.clone();
            async move {
                let session = update.extensions().get::<Session<Counter>>().unwrap();
                let _ = session.get();
                Ok(())
            }
        });
        let update = update_with_chat(1, 1234);
        mw.call(&update, handler.as_ref()).await.unwrap();

        let stored = store.get("1234").await.unwrap().unwrap();
        let decoded: Counter = serde_json::from_slice(&stored).unwrap();
        assert_eq!(decoded.counter, 5);
    }

    #[tokio::test]
    async fn missing_chat_fails_the_dispatch() {
        let store = Arc::new(InMemoryStore::new());
        let mw = SessionMiddleware::<Counter>::new(store);
        let raw: tgbot_types::Update = serde_json::from_value(serde_json::json!({"update_id": 1})).unwrap();
        let update = Update::new(raw, Arc::new(NullClient), None);
        assert!(mw.call(&update, base_handler().as_ref()).await.is_err());
    }
}
