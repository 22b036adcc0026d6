use crate::{action::Action, telegram};
use async_trait::async_trait;

/// A message already delivered to a chat, addressable for edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: Action,
}

impl Button {
    pub fn new(text: &str, action: Action) -> Self {
        Self {
            text: text.to_string(),
            action,
        }
    }
}

/// Inline keyboard attached below a message, one `Vec` per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// "Donate" and "refresh" under the campaign post.
    pub fn campaign() -> Self {
        Self {
            rows: vec![
                vec![Button::new("🎉 Donate", Action::Donate)],
                vec![Button::new("🔄 Refresh", Action::Refresh)],
            ],
        }
    }

    /// Approve/reject pair on the admin alert for `donation_id`.
    pub fn disposition(donation_id: i64) -> Self {
        use crate::action::Decision;

        Self {
            rows: vec![vec![
                Button::new(
                    "✅ Confirm",
                    Action::Dispose {
                        donation_id,
                        decision: Decision::Confirm,
                    },
                ),
                Button::new(
                    "❌ Reject",
                    Action::Dispose {
                        donation_id,
                        decision: Decision::Reject,
                    },
                ),
            ]],
        }
    }
}

/// Outbound side of the chat transport. Texts are HTML formatted.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, telegram::Error>;

    async fn send_photo(&self, chat_id: i64, photo: String) -> Result<MessageRef, telegram::Error>;

    async fn edit_text(
        &self,
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<(), telegram::Error>;

    async fn answer_callback(&self, callback_id: String) -> Result<(), telegram::Error>;
}

#[cfg(test)]
mockall::mock! {
    pub Messenger {}

    #[async_trait]
    impl Messenger for Messenger {
        async fn send_text(
            &self,
            chat_id: i64,
            text: String,
            keyboard: Option<Keyboard>,
        ) -> Result<MessageRef, telegram::Error>;

        async fn send_photo(
            &self,
            chat_id: i64,
            photo: String,
        ) -> Result<MessageRef, telegram::Error>;

        async fn edit_text(
            &self,
            message: MessageRef,
            text: String,
            keyboard: Option<Keyboard>,
        ) -> Result<(), telegram::Error>;

        async fn answer_callback(&self, callback_id: String) -> Result<(), telegram::Error>;
    }
}
