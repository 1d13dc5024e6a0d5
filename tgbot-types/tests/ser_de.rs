//! Whole-pipeline tests: parse the bundled reference page at build time,
//! then exercise the generated types end to end.

use tgbot_types::{
    BotMethod, Chat, ChatMember, ChatType, ForwardMessage, GetMe, GetUpdates, InlineKeyboardButton,
    InlineKeyboardMarkup, Message, ReplyMarkup, SendMessage, Update, User,
};

#[test]
fn get_me_request_has_no_body_fields() {
    let call = GetMe {};
    assert_eq!(serde_json::to_value(&call).unwrap(), serde_json::json!({}));
    assert_eq!(GetMe::NAME, "getMe");
}

#[test]
fn get_updates_defaults_are_all_unset() {
    let call = GetUpdates::new();
    let json = serde_json::to_value(&call).unwrap();
    assert_eq!(json, serde_json::json!({}));
}

#[test]
fn get_updates_builder_sets_offset_and_timeout() {
    let call = GetUpdates::new().offset(101_i64).timeout(30_i64).limit(50_i64);
    let json = serde_json::to_value(&call).unwrap();
    assert_eq!(json["offset"], 101);
    assert_eq!(json["timeout"], 30);
    assert_eq!(json["limit"], 50);
}

#[test]
fn forward_message_required_params_become_constructor_args() {
    let call = ForwardMessage::new(1_i64, 2_i64, 99_i64);
    let json = serde_json::to_value(&call).unwrap();
    assert_eq!(json["chat_id"], 1);
    assert_eq!(json["from_chat_id"], 2);
    assert_eq!(json["message_id"], 99);
}

#[test]
fn reply_markup_union_round_trips_each_variant() {
    let markup = ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "Yes".into(),
            url: None,
            callback_data: Some("yes".into()),
        }]],
    });
    let json = serde_json::to_value(&markup).unwrap();
    assert_eq!(json["inline_keyboard"][0][0]["text"], "Yes");

    let decoded: ReplyMarkup = serde_json::from_value(json).unwrap();
    assert!(matches!(decoded, ReplyMarkup::InlineKeyboard(_)));
}

#[test]
fn message_self_reference_round_trips_through_box() {
    let original: Message = serde_json::from_value(serde_json::json!({
        "message_id": 5,
        "date": 1_700_000_000,
        "chat": {"id": 10, "type": "private"},
        "text": "re: hello",
        "reply_to_message": {
            "message_id": 4,
            "date": 1_699_999_999,
            "chat": {"id": 10, "type": "private"},
            "text": "hello",
        },
    })).unwrap();

    let reply_to = original.reply_to_message.as_deref().expect("boxed reply");
    assert_eq!(reply_to.message_id, 4);
    assert_eq!(reply_to.text.as_deref(), Some("hello"));
}

#[test]
fn update_round_trips_a_callback_query_variant() {
    let update: Update = serde_json::from_value(serde_json::json!({
        "update_id": 42,
        "callback_query": {
            "id": "cbq1",
            "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
            "chat_instance": "instance",
            "data": "noop:1",
        },
    })).unwrap();

    assert!(update.message.is_none());
    let cbq = update.callback_query.expect("callback query present");
    assert_eq!(cbq.data.as_deref(), Some("noop:1"));
    assert_eq!(cbq.from.id, 7);
}

#[test]
fn chat_member_union_rejects_unknown_status() {
    let err = serde_json::from_value::<ChatMember>(serde_json::json!({
        "status": "not-a-real-status",
        "user": {"id": 1, "is_bot": false, "first_name": "X"},
    }))
    .unwrap_err();
    assert!(err.to_string().contains("status") || err.to_string().contains("unknown variant"));
}

#[test]
fn chat_type_variants_cover_all_four_documented_values() {
    for (wire, expected) in [
        ("private", ChatType::Private),
        ("group", ChatType::Group),
        ("supergroup", ChatType::Supergroup),
        ("channel", ChatType::Channel),
    ] {
        let chat: Chat = serde_json::from_value(serde_json::json!({"id": 1, "type": wire})).unwrap();
        assert_eq!(chat.r#type, expected);
    }
}

#[test]
fn user_id_survives_52_significant_bits() {
    // The reference page calls out 52-bit identifiers explicitly; make sure
    // a value near that ceiling round-trips without precision loss.
    let near_max: i64 = (1i64 << 52) - 1;
    let user: User = serde_json::from_value(serde_json::json!({
        "id": near_max,
        "is_bot": false,
        "first_name": "Big",
    })).unwrap();
    assert_eq!(user.id, near_max);
}

#[test]
fn send_message_constructor_takes_only_required_params() {
    let call = SendMessage::new(1_i64, "hi there");
    assert_eq!(call.chat_id, 1);
    assert_eq!(call.text, "hi there");
    assert!(call.parse_mode.is_none());
    assert!(call.reply_markup.is_none());
    assert!(call.message_thread_id.is_none());
}
