//! Filters: boolean predicates over a typed update (§4.4 "Filter semantics",
//! "Command filter details").
//!
//! A filter is side-effect-free except for permitted cache reads (the
//! command filter's memoized `getMe`) and may fail — failures propagate to
//! the router's error handler as [`FilterError`].

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::OnceCell;

use tgbot_types::{ChatType, GetMe, Message, MessageEntityType};

use crate::errors::FilterError;
use crate::update::{Invoke, TypedUpdate, invoke};

/// A boolean predicate over a [`TypedUpdate`]. Implemented per variant type
/// `V` since most concrete filters only make sense for message-bearing
/// updates; combinators ([`All`], [`Any`], [`Not`]) are generic over `V`.
#[async_trait]
pub trait Filter<V>: Send + Sync {
    async fn allows(&self, update: &TypedUpdate<V>) -> Result<bool, FilterError>;
}

// ─── Combinators ──────────────────────────────────────────────────────────────

/// Short-circuit AND. Any filter error halts with that error.
pub struct All<V>(Vec<Box<dyn Filter<V>>>);

impl<V> All<V> {
    pub fn new(filters: Vec<Box<dyn Filter<V>>>) -> Self {
        Self(filters)
    }
}

#[async_trait]
impl<V: Send + Sync> Filter<V> for All<V> {
    async fn allows(&self, update: &TypedUpdate<V>) -> Result<bool, FilterError> {
        for filter in &self.0 {
            if !filter.allows(update).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Short-circuit OR. Any filter error halts with that error.
pub struct Any<V>(Vec<Box<dyn Filter<V>>>);

impl<V> Any<V> {
    pub fn new(filters: Vec<Box<dyn Filter<V>>>) -> Self {
        Self(filters)
    }
}

#[async_trait]
impl<V: Send + Sync> Filter<V> for Any<V> {
    async fn allows(&self, update: &TypedUpdate<V>) -> Result<bool, FilterError> {
        for filter in &self.0 {
            if filter.allows(update).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Inverts `allow`. Errors pass through unchanged.
pub struct Not<V>(Box<dyn Filter<V>>);

impl<V> Not<V> {
    pub fn new(filter: impl Filter<V> + 'static) -> Self {
        Self(Box::new(filter))
    }
}

#[async_trait]
impl<V: Send + Sync> Filter<V> for Not<V> {
    async fn allows(&self, update: &TypedUpdate<V>) -> Result<bool, FilterError> {
        Ok(!self.0.allows(update).await?)
    }
}

// ─── Source text extraction ───────────────────────────────────────────────────

/// The text a message-bearing update exposes to text-oriented filters.
pub trait HasText {
    /// First non-empty of `text`, or (if `ignore_caption` is false) `caption`.
    fn source_text(&self, ignore_caption: bool) -> Option<&str>;
    fn entities(&self, ignore_caption: bool) -> Vec<&tgbot_types::MessageEntity>;
}

impl HasText for Message {
    fn source_text(&self, ignore_caption: bool) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| if ignore_caption { None } else { self.caption.as_deref() })
    }

    fn entities(&self, ignore_caption: bool) -> Vec<&tgbot_types::MessageEntity> {
        let mut out: Vec<&tgbot_types::MessageEntity> = self.entities.iter().flatten().collect();
        if !ignore_caption {
            out.extend(self.caption_entities.iter().flatten());
        }
        out
    }
}

// ─── Command ──────────────────────────────────────────────────────────────────

/// A memoized `getMe` lookup, shared across [`Command`] filters that opt in
/// via [`Command::with_shared_bot_username`] (§9 "cache with an
/// initialized-once sentinel").
#[derive(Default)]
pub struct BotIdentityCache(OnceCell<String>);

impl BotIdentityCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn username(&self, client: &dyn Invoke) -> Result<String, FilterError> {
        self.0
            .get_or_try_init(|| async {
                let me = invoke(client, GetMe {}).await?;
                Ok(me.username.unwrap_or_default())
            })
            .await
            .map(|s| s.clone())
            .map_err(FilterError)
    }
}

/// Matches `/command` (and aliases), with Telegram's `@mention` suffix
/// handling (§4.4 "Command filter details").
pub struct Command {
    names: Vec<String>,
    prefixes: Vec<char>,
    ignore_case: bool,
    ignore_caption: bool,
    ignore_mention: bool,
    identity: Arc<BotIdentityCache>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            prefixes: vec!['/'],
            ignore_case: true,
            ignore_caption: false,
            ignore_mention: false,
            identity: BotIdentityCache::new(),
        }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn prefixes(mut self, prefixes: impl IntoIterator<Item = char>) -> Self {
        self.prefixes = prefixes.into_iter().collect();
        self
    }

    pub fn ignore_case(mut self, value: bool) -> Self {
        self.ignore_case = value;
        self
    }

    pub fn ignore_caption(mut self, value: bool) -> Self {
        self.ignore_caption = value;
        self
    }

    pub fn ignore_mention(mut self, value: bool) -> Self {
        self.ignore_mention = value;
        self
    }

    /// Share one process-lifetime `getMe` cache across several `Command`
    /// filters, avoiding a duplicate lookup per registration.
    pub fn with_shared_bot_username(mut self, cache: Arc<BotIdentityCache>) -> Self {
        self.identity = cache;
        self
    }
}

#[async_trait]
impl Filter<Message> for Command {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        let Some(text) = update.payload().source_text(self.ignore_caption) else {
            return Ok(false);
        };
        let Some(token) = text.split_whitespace().next() else {
            return Ok(false);
        };
        let Some(first_char) = token.chars().next() else {
            return Ok(false);
        };
        if !self.prefixes.contains(&first_char) {
            return Ok(false);
        }
        let rest = &token[first_char.len_utf8()..];
        let (command, mention) = match rest.split_once('@') {
            Some((c, m)) => (c, Some(m)),
            None => (rest, None),
        };

        let command_matches = self.names.iter().any(|name| {
            if self.ignore_case {
                name.eq_ignore_ascii_case(command)
            } else {
                name == command
            }
        });
        if !command_matches {
            return Ok(false);
        }

        if let Some(mention) = mention {
            if !self.ignore_mention {
                // Mention comparison is always case-insensitive, unlike the
                // command token, which follows `ignore_case` (§9 open question 3).
                let bot_username = self.identity.username(update.client().as_ref()).await?;
                if !mention.eq_ignore_ascii_case(&bot_username) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

// ─── Regex ────────────────────────────────────────────────────────────────────

/// Matches a compiled regular expression against the update's source text.
pub struct TextRegex {
    pattern: Regex,
    ignore_caption: bool,
}

impl TextRegex {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern, ignore_caption: false }
    }

    pub fn ignore_caption(mut self, value: bool) -> Self {
        self.ignore_caption = value;
        self
    }
}

#[async_trait]
impl Filter<Message> for TextRegex {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        Ok(update
            .payload()
            .source_text(self.ignore_caption)
            .is_some_and(|text| self.pattern.is_match(text)))
    }
}

// ─── ChatType ─────────────────────────────────────────────────────────────────

/// Matches when the update's chat type is one of a configured set.
pub struct ChatTypeFilter(Vec<ChatType>);

impl ChatTypeFilter {
    pub fn new(types: impl IntoIterator<Item = ChatType>) -> Self {
        Self(types.into_iter().collect())
    }
}

#[async_trait]
impl Filter<Message> for ChatTypeFilter {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        Ok(self.0.contains(&update.payload().chat.r#type))
    }
}

// ─── MessageType ──────────────────────────────────────────────────────────────

/// The content kinds the bundled reference page documents on [`Message`].
/// Widening `tgbot-types/reference/bot-api.html` to cover photo/video/sticker
/// fields extends this enum the same way it extends everything else generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Other,
}

fn classify_message(message: &Message) -> MessageKind {
    if message.text.as_deref().is_some_and(|t| !t.is_empty()) {
        MessageKind::Text
    } else {
        MessageKind::Other
    }
}

/// Matches when the message's content kind is one of a configured set.
pub struct MessageTypeFilter(Vec<MessageKind>);

impl MessageTypeFilter {
    pub fn new(kinds: impl IntoIterator<Item = MessageKind>) -> Self {
        Self(kinds.into_iter().collect())
    }
}

#[async_trait]
impl Filter<Message> for MessageTypeFilter {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        Ok(self.0.contains(&classify_message(update.payload())))
    }
}

// ─── Text comparison ──────────────────────────────────────────────────────────

/// How a [`TextComparison`] filter relates the candidate text to its targets.
pub enum Compare {
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    InSet(Vec<String>),
}

pub struct TextComparison {
    compare: Compare,
    ignore_case: bool,
    ignore_caption: bool,
}

impl TextComparison {
    pub fn new(compare: Compare) -> Self {
        Self { compare, ignore_case: false, ignore_caption: false }
    }

    pub fn ignore_case(mut self, value: bool) -> Self {
        self.ignore_case = value;
        self
    }

    pub fn ignore_caption(mut self, value: bool) -> Self {
        self.ignore_caption = value;
        self
    }

    fn fold<'a>(&self, s: &'a str) -> std::borrow::Cow<'a, str> {
        if self.ignore_case { s.to_lowercase().into() } else { s.into() }
    }
}

#[async_trait]
impl Filter<Message> for TextComparison {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        let Some(text) = update.payload().source_text(self.ignore_caption) else {
            return Ok(false);
        };
        let text = self.fold(text);
        Ok(match &self.compare {
            Compare::Equals(target) => text == self.fold(target),
            Compare::Prefix(target) => text.starts_with(self.fold(target).as_ref()),
            Compare::Suffix(target) => text.ends_with(self.fold(target).as_ref()),
            Compare::Contains(target) => text.contains(self.fold(target).as_ref()),
            Compare::InSet(targets) => targets.iter().any(|t| text == self.fold(t)),
        })
    }
}

// ─── Entity type ──────────────────────────────────────────────────────────────

/// Matches when any entity across text/caption entities is one of a
/// configured set of [`MessageEntityType`]s.
pub struct EntityTypeFilter {
    types: Vec<MessageEntityType>,
    ignore_caption: bool,
}

impl EntityTypeFilter {
    pub fn new(types: impl IntoIterator<Item = MessageEntityType>) -> Self {
        Self { types: types.into_iter().collect(), ignore_caption: false }
    }

    pub fn ignore_caption(mut self, value: bool) -> Self {
        self.ignore_caption = value;
        self
    }
}

#[async_trait]
impl Filter<Message> for EntityTypeFilter {
    async fn allows(&self, update: &TypedUpdate<Message>) -> Result<bool, FilterError> {
        let entities = update.payload().entities(self.ignore_caption);
        Ok(entities.iter().any(|e| self.types.contains(&e.r#type)))
    }
}

// ─── Payload-decoding filter ──────────────────────────────────────────────────

use crate::codec::{CallbackKind, CallbackValue, PrefixedCodec};

/// Routes a [`tgbot_types::CallbackQuery`] by its codec prefix and decodes
/// its payload, pairing §4.4's "payload-decoding filter" with §4.7's codec.
pub struct CallbackPayload {
    codec: PrefixedCodec,
    schema: Vec<CallbackKind>,
}

impl CallbackPayload {
    pub fn new(codec: PrefixedCodec, schema: Vec<CallbackKind>) -> Self {
        Self { codec, schema }
    }

    /// Decode the payload, if this update's callback data matched the prefix.
    pub fn decode(&self, data: &str) -> Option<Result<Vec<CallbackValue>, crate::errors::CodecError>> {
        self.codec.decode(&self.schema, data)
    }
}

#[async_trait]
impl Filter<tgbot_types::CallbackQuery> for CallbackPayload {
    async fn allows(&self, update: &TypedUpdate<tgbot_types::CallbackQuery>) -> Result<bool, FilterError> {
        let Some(data) = update.payload().data.as_deref() else { return Ok(false) };
        Ok(self.decode(data).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CallbackCodec;
    use std::sync::Arc;

    struct NullClient;
    #[async_trait]
    impl Invoke for NullClient {
        async fn invoke_raw(
            &self,
            _method: &'static str,
            _args: serde_json::Value,
        ) -> Result<serde_json::Value, crate::errors::TransportError> {
            unreachable!("tests never drive a real call through this client")
        }
    }

    fn message_update(text: &str) -> TypedUpdate<Message> {
        let message: Message = serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 1, "type": "private"},
            "text": text,
        }))
        .unwrap();
        let raw: tgbot_types::Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": serde_json::to_value(&message).unwrap(),
        }))
        .unwrap();
        let update = crate::update::Update::new(raw, Arc::new(NullClient), None);
        update.typed::<Message>().unwrap()
    }

    #[tokio::test]
    async fn command_matches_with_mention_and_bot_username() {
        let filter = Command::new("start").ignore_mention(true);
        let update = message_update("/start@anyone payload");
        assert!(filter.allows(&update).await.unwrap());
    }

    #[tokio::test]
    async fn command_rejects_non_matching_name() {
        let filter = Command::new("start");
        let update = message_update("/stop");
        assert!(!filter.allows(&update).await.unwrap());
    }

    #[tokio::test]
    async fn command_aliases_both_match() {
        let filter = Command::new("start").alias("go");
        assert!(filter.allows(&message_update("/go")).await.unwrap());
        assert!(filter.allows(&message_update("/start")).await.unwrap());
    }

    #[tokio::test]
    async fn text_comparison_prefix_is_case_insensitive_when_asked() {
        let filter = TextComparison::new(Compare::Prefix("HELLO".into())).ignore_case(true);
        assert!(filter.allows(&message_update("hello world")).await.unwrap());
    }

    #[tokio::test]
    async fn all_short_circuits_on_first_false() {
        let filters: Vec<Box<dyn Filter<Message>>> = vec![
            Box::new(ChatTypeFilter::new([ChatType::Group])),
            Box::new(Command::new("start")),
        ];
        let all = All::new(filters);
        assert!(!all.allows(&message_update("/start")).await.unwrap());
    }

    #[tokio::test]
    async fn not_inverts_allow() {
        let filter = Not::new(ChatTypeFilter::new([ChatType::Group]));
        assert!(filter.allows(&message_update("anything")).await.unwrap());
    }

    #[test]
    fn callback_payload_decodes_matching_prefix() {
        let filter = CallbackPayload::new(
            PrefixedCodec::new("noop", CallbackCodec::default()),
            vec![CallbackKind::Int],
        );
        assert!(filter.decode("noop:1").is_some());
        assert!(filter.decode("other:1").is_none());
    }
}
