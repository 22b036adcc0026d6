use crate::messenger::Keyboard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl From<Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: Keyboard) -> Self {
        InlineKeyboardMarkup {
            inline_keyboard: keyboard
                .rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.text,
                            callback_data: button.action.to_string(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SetWebhook<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhook {
    pub drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct SendPhoto<'a> {
    pub chat_id: i64,
    pub photo: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_callback_update() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "callback_query": {
                "id": "cb-1",
                "from": { "id": 42, "is_bot": false, "first_name": "Gio", "username": "gio" },
                "message": {
                    "message_id": 5,
                    "date": 0,
                    "chat": { "id": 42, "type": "private" },
                    "text": "campaign"
                },
                "chat_instance": "x",
                "data": "confirm_3"
            }
        }))
        .expect("valid update");

        assert_eq!(update.update_id, 10);
        assert!(update.message.is_none());
        let query = update.callback_query.expect("callback query");
        assert_eq!(query.from.username.as_deref(), Some("gio"));
        assert_eq!(query.data.as_deref(), Some("confirm_3"));
        assert_eq!(query.message.map(|m| m.chat.id), Some(42));
    }

    #[test]
    fn deserializes_error_response() {
        let response: ApiResponse<Message> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified"
        }))
        .expect("valid response");
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(400));
    }

    #[test]
    fn keyboard_serializes_as_callback_buttons() {
        let markup = InlineKeyboardMarkup::from(Keyboard::disposition(9));
        assert_eq!(
            serde_json::to_value(markup).expect("serializable"),
            json!({
                "inline_keyboard": [[
                    { "text": "✅ Confirm", "callback_data": "confirm_9" },
                    { "text": "❌ Reject", "callback_data": "reject_9" }
                ]]
            })
        );
    }

    #[test]
    fn omits_missing_reply_markup() {
        let params = SendMessage {
            chat_id: 1,
            text: "hi",
            parse_mode: "HTML",
            reply_markup: None,
        };
        assert_eq!(
            serde_json::to_value(params).expect("serializable"),
            json!({ "chat_id": 1, "text": "hi", "parse_mode": "HTML" })
        );
    }
}
