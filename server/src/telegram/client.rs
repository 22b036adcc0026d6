use crate::{
    config::TelegramConfig,
    messenger::{Keyboard, MessageRef, Messenger},
    telegram::{types::*, Error},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

const PARSE_MODE: &str = "HTML";
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Minimal Telegram Bot API client over HTTPS + JSON.
pub struct Client {
    http: reqwest::Client,
    // Contains the bot token; never log it.
    base_url: String,
}

impl Client {
    pub fn new(config: &TelegramConfig) -> Result<Self, Error> {
        // Long polls hold the request open for `poll_timeout_secs`.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, Error>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)?;

        let response: ApiResponse<R> = serde_json::from_slice(&body)?;
        match response.result {
            Some(result) if response.ok => Ok(result),
            _ => Err(Error::Api {
                code: response.error_code.unwrap_or_default(),
                description: response
                    .description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            }),
        }
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, Error> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            },
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), Error> {
        let _: bool = self
            .call(
                "setWebhook",
                &SetWebhook {
                    url,
                    secret_token,
                    allowed_updates: ALLOWED_UPDATES,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), Error> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhook {
                    drop_pending_updates: false,
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for Client {
    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, Error> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text: &text,
                    parse_mode: PARSE_MODE,
                    reply_markup: keyboard.map(InlineKeyboardMarkup::from),
                },
            )
            .await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn send_photo(&self, chat_id: i64, photo: String) -> Result<MessageRef, Error> {
        let message: Message = self
            .call(
                "sendPhoto",
                &SendPhoto {
                    chat_id,
                    photo: &photo,
                },
            )
            .await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<(), Error> {
        // Returns the edited message, or `true` for inline messages.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id: message.chat_id,
                    message_id: message.message_id,
                    text: &text,
                    parse_mode: PARSE_MODE,
                    reply_markup: keyboard.map(InlineKeyboardMarkup::from),
                },
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: String) -> Result<(), Error> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: &callback_id,
                },
            )
            .await?;
        Ok(())
    }
}
