//! Runtime `Update` wrapper, typed facades, prepared calls and the
//! reply-in-response mechanism (§3 runtime entities, §4.6, §9 design notes).
//!
//! The generated `tgbot_types::Update` is the raw wire struct: a flat object
//! with one optional field per variant. This module adds the runtime
//! context spec.md §9 calls for — "the update carries a capability handle to
//! the transport, injected at construction time" — plus the single-use
//! reply slot a webhook-originated update owns.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use tgbot_types::{
    BotMethod, CallbackQuery, ChatBoostRemoved, ChatBoostUpdated, ChatJoinRequest, ChatMemberUpdated,
    ChosenInlineResult, InlineQuery, Message, MessageReactionCountUpdated, MessageReactionUpdated, Poll,
    PollAnswer, PreCheckoutQuery, SendMessage, ShippingQuery,
};

use crate::errors::TransportError;

/// The capability a client gives an [`Update`] to place outbound calls —
/// "assume a capability `Invoke(method, args, files) -> raw JSON result`"
/// (spec.md §1). The HTTP client that actually implements this against
/// `api.telegram.org` is an external collaborator, out of scope here.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke_raw(
        &self,
        method: &'static str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}

/// Execute `method` against `client` and decode its typed response.
pub async fn invoke<M: BotMethod + Serialize + Send + Sync>(
    client: &dyn Invoke,
    method: M,
) -> Result<M::Response, TransportError> {
    let args = serde_json::to_value(&method).map_err(|e| TransportError::Deserialize(e.to_string()))?;
    let raw = client.invoke_raw(M::NAME, args).await?;
    serde_json::from_value(raw).map_err(|e| TransportError::Deserialize(e.to_string()))
}

// ─── Call<R> ──────────────────────────────────────────────────────────────────

/// A prepared request: a method name plus serialized args, executable via
/// [`Invoke`] or serializable as a webhook HTTP response body (§3, §4.6).
pub struct Call<R> {
    method: &'static str,
    args: serde_json::Map<String, serde_json::Value>,
    _response: std::marker::PhantomData<fn() -> R>,
}

impl<R> Clone for Call<R> {
    fn clone(&self) -> Self {
        Self { method: self.method, args: self.args.clone(), _response: std::marker::PhantomData }
    }
}

impl<R: DeserializeOwned> Call<R> {
    pub fn new<M>(method: M) -> Result<Self, TransportError>
    where
        M: BotMethod<Response = R> + Serialize,
    {
        let value = serde_json::to_value(&method).map_err(|e| TransportError::Deserialize(e.to_string()))?;
        let args = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Ok(Self { method: M::NAME, args, _response: std::marker::PhantomData })
    }

    /// Send this call through the client.
    pub async fn execute(self, client: &dyn Invoke) -> Result<R, TransportError> {
        let raw = client.invoke_raw(self.method, serde_json::Value::Object(self.args)).await?;
        serde_json::from_value(raw).map_err(|e| TransportError::Deserialize(e.to_string()))
    }

    /// Serialize as the webhook response body: the call's own arguments,
    /// each top-level scalar rendered as a JSON string, with a `method`
    /// field folded in (§4.6 / testable scenario E). Telegram's webhook
    /// reply endpoint reads every field as a string regardless of the
    /// method's normal wire type, so `chat_id: 1234` becomes `"1234"`.
    pub fn into_webhook_body(self) -> serde_json::Value {
        let mut args: serde_json::Map<String, serde_json::Value> =
            self.args.into_iter().map(|(key, value)| (key, stringify_scalar(value))).collect();
        args.insert("method".to_string(), serde_json::Value::String(self.method.to_string()));
        serde_json::Value::Object(args)
    }
}

/// Renders a JSON number or bool as its string form; leaves strings, arrays,
/// objects, and null untouched (arrays/objects already carry their own
/// nested scalars in the shape Telegram's JSON bodies expect).
fn stringify_scalar(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Number(n) => serde_json::Value::String(n.to_string()),
        serde_json::Value::Bool(b) => serde_json::Value::String(b.to_string()),
        other => other,
    }
}

// ─── Reply slot ───────────────────────────────────────────────────────────────

/// The single-use reply channel a webhook-originated update owns (§4.6, §9).
/// "First writer wins": later attempts to fill it must fall through to a
/// normal client call instead.
#[derive(Default)]
pub struct ReplySlot(Mutex<Option<serde_json::Value>>);

impl ReplySlot {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    /// Attempt to fill the slot. Returns `true` if this call won it.
    pub fn try_fill(&self, body: serde_json::Value) -> bool {
        let mut slot = self.0.lock().expect("reply slot mutex poisoned");
        if slot.is_some() {
            false
        } else {
            *slot = Some(body);
            true
        }
    }

    /// Take the body out, if one was ever placed.
    pub fn take(&self) -> Option<serde_json::Value> {
        self.0.lock().expect("reply slot mutex poisoned").take()
    }
}

// ─── Extensions ───────────────────────────────────────────────────────────────

/// A small type-keyed bag attached to an [`Update`], used by middleware to
/// "attach the value to the invocation context" (§4.8) — the session layer
/// stashes a loaded [`crate::session::Session`] here so the handler (and any
/// nested access within the same dispatch) can read it back without a second
/// store round trip.
#[derive(Clone, Default)]
pub struct Extensions(Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.0.lock().expect("extensions mutex poisoned").insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a clone of the stored value of type `T`, if any was inserted.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.0
            .lock()
            .expect("extensions mutex poisoned")
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    pub fn remove<T: Send + Sync + 'static>(&self) {
        self.0.lock().expect("extensions mutex poisoned").remove(&TypeId::of::<T>());
    }
}

// ─── UpdateKind ───────────────────────────────────────────────────────────────

/// Which of the tagged sum's ~20 variants an [`Update`] carries (§3, §4.4
/// step 1 "classify the update by the single non-empty variant field").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    BusinessConnection,
    BusinessMessage,
    EditedBusinessMessage,
    DeletedBusinessMessages,
    MessageReaction,
    MessageReactionCount,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
    ChatBoost,
    RemovedChatBoost,
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// A received update, carrying a back reference to the transport client and
/// (in webhook mode) a single-slot reply channel.
#[derive(Clone)]
pub struct Update {
    raw: tgbot_types::Update,
    client: Arc<dyn Invoke>,
    reply_slot: Option<Arc<ReplySlot>>,
    extensions: Extensions,
}

impl Update {
    /// Constructed by a transport per received record (§3 lifecycles). Pass
    /// `reply_slot` only for webhook-originated updates.
    pub fn new(raw: tgbot_types::Update, client: Arc<dyn Invoke>, reply_slot: Option<Arc<ReplySlot>>) -> Self {
        Self { raw, client, reply_slot, extensions: Extensions::new() }
    }

    pub fn raw(&self) -> &tgbot_types::Update {
        &self.raw
    }

    pub fn client(&self) -> &Arc<dyn Invoke> {
        &self.client
    }

    pub fn reply_slot(&self) -> Option<&Arc<ReplySlot>> {
        self.reply_slot.as_ref()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn is_webhook_originated(&self) -> bool {
        self.reply_slot.is_some()
    }

    pub fn update_id(&self) -> i64 {
        self.raw.update_id
    }

    /// Classify by the single populated variant field; `None` if the record
    /// somehow carries none (§4.4 step 1: "if none, return without action").
    pub fn kind(&self) -> Option<UpdateKind> {
        macro_rules! check {
            ($($field:ident => $kind:ident),+ $(,)?) => {
                $(if self.raw.$field.is_some() { return Some(UpdateKind::$kind); })+
            };
        }
        check! {
            message => Message,
            edited_message => EditedMessage,
            channel_post => ChannelPost,
            edited_channel_post => EditedChannelPost,
            business_connection => BusinessConnection,
            business_message => BusinessMessage,
            edited_business_message => EditedBusinessMessage,
            deleted_business_messages => DeletedBusinessMessages,
            message_reaction => MessageReaction,
            message_reaction_count => MessageReactionCount,
            inline_query => InlineQuery,
            chosen_inline_result => ChosenInlineResult,
            callback_query => CallbackQuery,
            shipping_query => ShippingQuery,
            pre_checkout_query => PreCheckoutQuery,
            poll => Poll,
            poll_answer => PollAnswer,
            my_chat_member => MyChatMember,
            chat_member => ChatMember,
            chat_join_request => ChatJoinRequest,
            chat_boost => ChatBoost,
            removed_chat_boost => RemovedChatBoost,
        }
        None
    }

    /// Build the typed facade for variant `V`, if this update carries it.
    pub fn typed<V: Variant>(&self) -> Option<TypedUpdate<V>> {
        V::extract(&self.raw).map(|payload| TypedUpdate {
            payload: payload.clone(),
            client: self.client.clone(),
            reply_slot: self.reply_slot.clone(),
            extensions: self.extensions.clone(),
        })
    }
}

/// A payload type one of [`Update`]'s variant fields holds, pairing the
/// field accessor with its [`UpdateKind`] for the router's dispatch table.
pub trait Variant: Clone + Send + Sync + 'static {
    const KIND: UpdateKind;
    fn extract(update: &tgbot_types::Update) -> Option<&Self>;
}

macro_rules! impl_variant {
    ($ty:ty, $field:ident, $kind:ident) => {
        impl Variant for $ty {
            const KIND: UpdateKind = UpdateKind::$kind;
            fn extract(update: &tgbot_types::Update) -> Option<&Self> {
                update.$field.as_ref()
            }
        }
    };
}

impl_variant!(Message, message, Message);
impl_variant!(CallbackQuery, callback_query, CallbackQuery);
impl_variant!(InlineQuery, inline_query, InlineQuery);
impl_variant!(ChosenInlineResult, chosen_inline_result, ChosenInlineResult);
impl_variant!(ShippingQuery, shipping_query, ShippingQuery);
impl_variant!(PreCheckoutQuery, pre_checkout_query, PreCheckoutQuery);
impl_variant!(Poll, poll, Poll);
impl_variant!(PollAnswer, poll_answer, PollAnswer);
impl_variant!(ChatJoinRequest, chat_join_request, ChatJoinRequest);
impl_variant!(ChatBoostUpdated, chat_boost, ChatBoost);
impl_variant!(ChatBoostRemoved, removed_chat_boost, RemovedChatBoost);
impl_variant!(MessageReactionUpdated, message_reaction, MessageReaction);
impl_variant!(MessageReactionCountUpdated, message_reaction_count, MessageReactionCount);

/// `my_chat_member` and `chat_member` carry the same payload type
/// ([`ChatMemberUpdated`]), so they can't both implement [`Variant`] — the
/// router dispatches these two off [`Update::kind`] and these accessors
/// directly instead of through [`Update::typed`].
pub fn my_chat_member(update: &tgbot_types::Update) -> Option<&ChatMemberUpdated> {
    update.my_chat_member.as_ref()
}

pub fn chat_member(update: &tgbot_types::Update) -> Option<&ChatMemberUpdated> {
    update.chat_member.as_ref()
}

// ─── TypedUpdate<V> ───────────────────────────────────────────────────────────

/// A facade over one update variant's payload, exposing the variant plus
/// convenience methods rooted on its natural target (§3).
#[derive(Clone)]
pub struct TypedUpdate<V: Clone> {
    payload: V,
    client: Arc<dyn Invoke>,
    reply_slot: Option<Arc<ReplySlot>>,
    extensions: Extensions,
}

impl<V: Clone> TypedUpdate<V> {
    pub fn payload(&self) -> &V {
        &self.payload
    }

    pub fn client(&self) -> &Arc<dyn Invoke> {
        &self.client
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Place `call` in the reply slot if one exists and is free, otherwise
    /// run it through the client immediately (§4.6). Returns `None` only
    /// when the call was stashed in the slot rather than executed.
    pub async fn reply<R>(&self, call: Call<R>) -> Result<Option<R>, TransportError>
    where
        R: DeserializeOwned,
    {
        let Some(slot) = &self.reply_slot else {
            return call.execute(self.client.as_ref()).await.map(Some);
        };
        if slot.try_fill(call.clone().into_webhook_body()) {
            return Ok(None);
        }
        call.execute(self.client.as_ref()).await.map(Some)
    }
}

impl TypedUpdate<Message> {
    /// Shortcut: reply with plain text addressed to this message's chat.
    pub async fn answer(&self, text: impl Into<String>) -> Result<Option<Message>, TransportError> {
        let call = Call::new(SendMessage::new(self.payload.chat.id, text.into()))?;
        self.reply(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullClient;
    #[async_trait]
    impl Invoke for NullClient {
        async fn invoke_raw(
            &self,
            _method: &'static str,
            _args: serde_json::Value,
        ) -> Result<serde_json::Value, TransportError> {
            Ok(serde_json::json!({}))
        }
    }

    fn message_update() -> tgbot_types::Update {
        serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 1, "date": 0, "chat": {"id": 42, "type": "private"}},
        }))
        .unwrap()
    }

    #[test]
    fn kind_classifies_the_populated_variant() {
        let update = Update::new(message_update(), Arc::new(NullClient), None);
        assert_eq!(update.kind(), Some(UpdateKind::Message));
    }

    #[test]
    fn typed_extracts_the_matching_payload() {
        let update = Update::new(message_update(), Arc::new(NullClient), None);
        let typed = update.typed::<Message>().expect("message variant present");
        assert_eq!(typed.payload().chat.id, 42);
        assert!(update.typed::<CallbackQuery>().is_none());
    }

    #[test]
    fn reply_slot_is_first_writer_wins() {
        let slot = ReplySlot::new();
        assert!(slot.try_fill(serde_json::json!({"method": "sendMessage"})));
        assert!(!slot.try_fill(serde_json::json!({"method": "sendMessage"})));
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn call_into_webhook_body_folds_method_into_args() {
        let call = Call::new(SendMessage::new(1234_i64, "test")).unwrap();
        let body = call.into_webhook_body();
        assert_eq!(body["method"], "sendMessage");
        assert_eq!(body["chat_id"], "1234");
        assert_eq!(body["text"], "test");
    }
}
