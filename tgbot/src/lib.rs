//! # tgbot — Telegram Bot API framework
//!
//! `tgbot` is a modular Rust framework for the Telegram Bot API. It consists
//! of focused sub-crates wired together here for convenience:
//!
//! | Sub-crate         | Role                                                  |
//! |--------------------|-------------------------------------------------------|
//! | `tgbot-tl-parser` | Parse the Bot API HTML reference into an IR            |
//! | `tgbot-tl-gen`    | Generate Rust source from the IR (build-time)          |
//! | `tgbot-types`     | Auto-generated request/response types and enums        |
//! | `tgbot-client`    | Routing, filters, middleware, sessions, transports      |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tgbot::client::{Router, filters::Command};
//! use tgbot::client::update::{Invoke, TypedUpdate};
//! use tgbot::types::Message;
//!
//! # async fn build(client: Arc<dyn Invoke>) {
//! let mut router = Router::new();
//! router.on::<Message, _>(vec![Box::new(Command::new("start"))], |update: TypedUpdate<Message>| async move {
//!     update.answer("hello!").await.map(|_| ()).map_err(tgbot::client::errors::HandlerError::new)
//! });
//! # }
//! ```
//!
//! ## Updating the API surface
//!
//! Replace `tgbot-types/reference/bot-api.html` with a newer reference page
//! and run `cargo build` — the generated types and methods regenerate
//! automatically from `tgbot-types/build.rs`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`tgbot_types`] — generated request/response types, enums and
/// the [`BotMethod`](tgbot_types::BotMethod) trait.
pub use tgbot_types as types;

/// Re-export of [`tgbot_client`] — routing, filters, middleware, sessions and
/// transports built on top of [`types`].
pub use tgbot_client as client;

/// Re-export of [`tgbot_tl_parser`] (requires `feature = "parser"`).
#[cfg(feature = "parser")]
pub use tgbot_tl_parser as parser;

/// Re-export of [`tgbot_tl_gen`] (requires `feature = "codegen"`).
#[cfg(feature = "codegen")]
pub use tgbot_tl_gen as codegen;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use tgbot_types::BotMethod;

pub use tgbot_client::{
    CodecError, DispatchError, FilterError, HandlerError, InMemoryStore, Router, Session, SessionMiddleware,
    StoreError, Store, TransportError, TypedUpdate, Update,
};
