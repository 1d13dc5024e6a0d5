//! Transports: the two ways updates cross the network boundary into a
//! [`crate::router::Router`] (§4.5). A bot runs exactly one of these at a
//! time — long polling and a webhook both claim `getUpdates`' update stream,
//! and Telegram will not feed the same bot through both.

mod long_poll;
mod webhook;

pub use long_poll::LongPoller;
pub use webhook::{CidrV4, TELEGRAM_WEBHOOK_NETWORKS, WebhookConfig, app, ensure_configured, serve};
