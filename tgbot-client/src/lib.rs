//! # tgbot-client
//!
//! The update dispatch runtime for `tgbot`: routing, filters, middleware,
//! transports, session state and the callback-payload codec live in this
//! crate's modules. `tgbot-types` supplies the generated wire types and
//! `BotMethod` requests this crate builds on; nothing here talks HTTP to
//! `api.telegram.org` directly — that's the [`update::Invoke`] capability a
//! concrete client hands to every [`update::Update`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use tgbot_client::{Router, filters::Command};
//! use tgbot_client::update::TypedUpdate;
//! use tgbot_types::Message;
//!
//! # async fn build() {
//! let mut router = Router::new();
//! router.on::<Message, _>(vec![Box::new(Command::new("start"))], |update: TypedUpdate<Message>| async move {
//!     update.answer("hello!").await.map(|_| ()).map_err(tgbot_client::errors::HandlerError::new)
//! });
//! # }
//! ```
//!
//! Session state, callback encoding, and the long-poll/webhook transports
//! are opt-in layers built on top of the same [`Router`] and [`update::Update`]
//! — see [`session`], [`codec`] and [`transport`].

#![deny(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod filters;
pub mod middleware;
pub mod retry;
pub mod router;
pub mod session;
pub mod session_backend;
pub mod transport;
pub mod update;

pub use errors::{CodecError, DispatchError, FilterError, HandlerError, StoreError, TransportError};
pub use middleware::Middleware;
pub use retry::{NoRetries, RetryContext, RetryPolicy, TooManyRequestsBackoff};
pub use router::{ErrorHandler, GenericHandler, Router, TypedHandler};
pub use session::{Session, SessionMiddleware};
pub use session_backend::{InMemoryStore, Store};
pub use update::{Call, Invoke, ReplySlot, TypedUpdate, Update, UpdateKind};
