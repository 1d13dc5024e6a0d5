//! Generated Telegram Bot API types, method request builders and a small
//! hand-written core the generated code builds on.
//!
//! This crate is **auto-generated** from [`tgbot-tl-parser`]'s IR by
//! [`tgbot-tl-gen`], driven by `build.rs` against `reference/bot-api.html`
//! and `reference/config.yaml`. To widen coverage, drop in a larger excerpt
//! of the official reference page and rebuild — the generated module below
//! regenerates from scratch every time.
//!
//! [`tgbot-tl-parser`]: https://docs.rs/tgbot-tl-parser
//! [`tgbot-tl-gen`]: https://docs.rs/tgbot-tl-gen

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Every generated request struct implements this so a client can send it
/// without a big `match` over method names.
pub trait BotMethod: Serialize {
    /// The type `Invoke` deserializes the raw JSON `result` field into.
    type Response: serde::de::DeserializeOwned;
    /// The Bot API method name, e.g. `"sendMessage"` — goes on the wire as
    /// the HTTP path segment (or the `method` field in a webhook response).
    const NAME: &'static str;
}

/// The reference page's `True` pseudo-type: a field or response that is
/// only ever the JSON literal `true`, used where the wire protocol confirms
/// success rather than returning a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct True;

impl Serialize for True {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for True {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value {
            Ok(True)
        } else {
            Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Bool(value),
                &"the literal `true`",
            ))
        }
    }
}

/// The reference page's `False` pseudo-type, the mirror image of [`True`].
/// Rarer on the wire, but documented for a handful of fields (e.g. a
/// `can_set_sticker_set` that is only ever present when `false`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct False;

impl Serialize for False {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(false)
    }
}

impl<'de> Deserialize<'de> for False {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value {
            Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Bool(value),
                &"the literal `false`",
            ))
        } else {
            Ok(False)
        }
    }
}

include!(concat!(env!("OUT_DIR"), "/generated_types.rs"));
include!(concat!(env!("OUT_DIR"), "/generated_methods.rs"));

/// The reply-markup parameter shared by every message-sending method.
///
/// The reference page documents this as "one of `InlineKeyboardMarkup`,
/// `ReplyKeyboardMarkup`, `ReplyKeyboardRemove` or `ForceReply`" on each
/// method individually rather than as a type section of its own, so there is
/// no heading for the parser to pick up — it is hand-written here and bound
/// in as a literal [`tgbot_tl_gen::Config::typegen`] `type_overrides` entry
/// rather than generated (`typegen.interface_unions` in `reference/config.yaml`
/// records that this union has no wire discriminator of its own; each
/// variant serializes as itself).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    /// An inline keyboard attached to the message itself.
    InlineKeyboard(InlineKeyboardMarkup),
    /// A custom reply keyboard, shown in place of the user's regular one.
    ReplyKeyboard(ReplyKeyboardMarkup),
    /// Tells the client to hide the regular keyboard.
    RemoveKeyboard(ReplyKeyboardRemove),
    /// Tells the client to open its reply interface.
    ForceReply(ForceReply),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(v: InlineKeyboardMarkup) -> Self { Self::InlineKeyboard(v) }
}
impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(v: ReplyKeyboardMarkup) -> Self { Self::ReplyKeyboard(v) }
}
impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(v: ReplyKeyboardRemove) -> Self { Self::RemoveKeyboard(v) }
}
impl From<ForceReply> for ReplyMarkup {
    fn from(v: ForceReply) -> Self { Self::ForceReply(v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_serializes_as_json_true() {
        assert_eq!(serde_json::to_string(&True).unwrap(), "true");
    }

    #[test]
    fn true_rejects_false() {
        let err = serde_json::from_str::<True>("false").unwrap_err();
        assert!(err.to_string().contains("true"));
    }

    #[test]
    fn get_me_has_no_params() {
        // getMe takes no parameters — this just has to compile.
        let json = serde_json::to_string(&serde_json::json!({})).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn send_message_builder_round_trips() {
        let call = SendMessage::new(1234_i64, "hello")
            .parse_mode("MarkdownV2")
            .reply_markup(ForceReply { force_reply: true });
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["chat_id"], 1234);
        assert_eq!(json["text"], "hello");
        assert_eq!(json["parse_mode"], "MarkdownV2");
        assert_eq!(json["reply_markup"]["force_reply"], true);
        assert_eq!(SendMessage::NAME, "sendMessage");
    }

    #[test]
    fn chat_type_enum_round_trips() {
        let chat: Chat = serde_json::from_value(serde_json::json!({
            "id": 42,
            "type": "supergroup",
        })).unwrap();
        assert!(matches!(chat.r#type, ChatType::Supergroup));
        assert!(!chat.is_private());
    }

    #[test]
    fn chat_member_discriminates_on_status() {
        let member: ChatMember = serde_json::from_value(serde_json::json!({
            "status": "administrator",
            "user": {"id": 1, "is_bot": false, "first_name": "A"},
            "can_be_edited": true,
        })).unwrap();
        assert!(matches!(member, ChatMember::ChatMemberAdministrator(_)));
    }

    #[test]
    fn update_has_exactly_one_populated_variant_field() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "date": 0,
                "chat": {"id": 1, "type": "private"},
            },
        })).unwrap();
        assert!(update.message.is_some());
        assert!(update.callback_query.is_none());
    }
}
