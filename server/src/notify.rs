use crate::{
    messenger::{Keyboard, MessageRef, Messenger},
    money::CurrencyUnit,
    telegram,
};
use donation_storage::{models::donation::DonationRow, DonationStatus};
use log::warn;
use std::sync::Arc;

/// Escapes text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Owns every outbound message. Delivery failures are logged and swallowed,
/// they never undo work already committed by the caller.
pub struct Notifier<M> {
    messenger: Arc<M>,
    unit: Arc<CurrencyUnit>,
}

impl<M> Clone for Notifier<M> {
    fn clone(&self) -> Self {
        Self {
            messenger: self.messenger.clone(),
            unit: self.unit.clone(),
        }
    }
}

impl<M> Notifier<M>
where
    M: Messenger,
{
    pub fn new(messenger: Arc<M>, unit: Arc<CurrencyUnit>) -> Self {
        Self { messenger, unit }
    }

    async fn send(&self, what: &str, chat_id: i64, text: String, keyboard: Option<Keyboard>) {
        let result = self.messenger.send_text(chat_id, text, keyboard).await;
        log_failure(what, chat_id, result);
    }

    pub async fn campaign_photo(&self, chat_id: i64, photo_url: &str) {
        let result = self
            .messenger
            .send_photo(chat_id, photo_url.to_string())
            .await;
        log_failure("campaign photo", chat_id, result);
    }

    pub async fn campaign_post(&self, chat_id: i64, text: String) {
        self.send("campaign post", chat_id, text, Some(Keyboard::campaign()))
            .await;
    }

    pub async fn refresh_campaign_post(&self, message: MessageRef, text: String) {
        let result = self
            .messenger
            .edit_text(message, text, Some(Keyboard::campaign()))
            .await;
        log_failure("campaign refresh", message.chat_id, result);
    }

    pub async fn acknowledge(&self, callback_id: String) {
        if let Err(e) = self.messenger.answer_callback(callback_id).await {
            warn!("Failed to answer callback query: {}", e);
        }
    }

    pub async fn prompt_amount(&self, chat_id: i64, pending_donation_id: Option<i64>) {
        let mut text = String::new();
        if let Some(donation_id) = pending_donation_id {
            text.push_str(&format!(
                "Your request #{} is still waiting for confirmation.\n",
                donation_id
            ));
        }
        text.push_str("Enter the amount of your donation (digits only):");
        self.send("amount prompt", chat_id, text, None).await;
    }

    pub async fn invalid_amount(&self, chat_id: i64) {
        self.send(
            "invalid amount notice",
            chat_id,
            "❌ Enter a valid amount.".to_string(),
            None,
        )
        .await;
    }

    /// Tells the donor their request was queued.
    pub async fn submission_received(&self, chat_id: i64, donation: &DonationRow) {
        self.send(
            "submission notice",
            chat_id,
            format!(
                "✅ Request #{} for {} sent. Wait for confirmation!",
                donation.donation_id,
                self.unit.format(donation.amount)
            ),
            None,
        )
        .await;
    }

    /// Asks the admin to confirm or reject a new donation.
    pub async fn admin_alert(&self, admin_id: i64, donor_handle: &str, donation: &DonationRow) {
        self.send(
            "admin alert",
            admin_id,
            format!(
                "⚠️ New donation request #{} from {} for {}",
                donation.donation_id,
                escape_html(donor_handle),
                self.unit.format(donation.amount)
            ),
            Some(Keyboard::disposition(donation.donation_id)),
        )
        .await;
    }

    /// Tells the donor how the admin decided.
    pub async fn donor_outcome(&self, donation: &DonationRow) {
        let text = match donation.status {
            DonationStatus::Confirmed => format!(
                "🎉 Your donation of {} was confirmed. Thank you!",
                self.unit.format(donation.amount)
            ),
            status => format!(
                "Your donation of {} was {}.",
                self.unit.format(donation.amount),
                status
            ),
        };
        // Private chats share the user's id.
        self.send("donor outcome", donation.user_id, text, None)
            .await;
    }

    /// Replaces the admin alert with its final status.
    pub async fn disposition_recorded(&self, message: MessageRef, donation: &DonationRow) {
        let result = self
            .messenger
            .edit_text(
                message,
                format!("Request #{} {}.", donation.donation_id, donation.status),
                None,
            )
            .await;
        log_failure("disposition edit", message.chat_id, result);
    }

    pub async fn not_authorized(&self, chat_id: i64) {
        self.send(
            "authorization notice",
            chat_id,
            "❌ Only the admin can confirm transfers.".to_string(),
            None,
        )
        .await;
    }

    pub async fn donation_not_found(&self, chat_id: i64, donation_id: i64) {
        self.send(
            "not found notice",
            chat_id,
            format!("Request #{} does not exist.", donation_id),
            None,
        )
        .await;
    }

    pub async fn already_decided(&self, chat_id: i64, donation_id: i64, status: DonationStatus) {
        self.send(
            "already decided notice",
            chat_id,
            format!("Request #{} was already {}.", donation_id, status),
            None,
        )
        .await;
    }

    pub async fn generic_failure(&self, chat_id: i64) {
        self.send(
            "failure notice",
            chat_id,
            "Something went wrong, please try again later.".to_string(),
            None,
        )
        .await;
    }
}

fn log_failure<T>(what: &str, chat_id: i64, result: Result<T, telegram::Error>) {
    if let Err(e) = result {
        warn!("Failed to deliver {} to chat {}: {}", what, chat_id, e);
    }
}
