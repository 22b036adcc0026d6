use crate::{
    action::{is_start_command, Action},
    messenger::{MessageRef, Messenger},
    notify::Notifier,
    services::donation::{DonationService, Donor},
    telegram::types::{CallbackQuery, Message, Update, User},
};
use async_trait::async_trait;
use donation_status::{
    well_known::{invalid_field, missing_required_field},
    Status,
};
use log::{debug, error, info};
use std::{
    collections::{HashSet, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

const RECENT_UPDATES: usize = 1024;

/// Entry point shared by the polling and webhook transports.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle_update(&self, update: Update);
}

/// Bounded memory of handled update ids, oldest evicted first.
pub struct RecentUpdates {
    capacity: usize,
    inner: Mutex<(HashSet<i64>, VecDeque<i64>)>,
}

impl RecentUpdates {
    pub fn with_capacity(capacity: usize) -> Self {
        let seen = HashSet::with_capacity(capacity);
        let order = VecDeque::with_capacity(capacity);
        Self {
            capacity,
            inner: Mutex::new((seen, order)),
        }
    }

    /// Records `update_id`. Returns false if it was already seen.
    pub fn insert(&self, update_id: i64) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (seen, order) = &mut *guard;
        if !seen.insert(update_id) {
            return false;
        }
        order.push_back(update_id);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                seen.remove(&oldest);
            }
        }
        true
    }
}

impl Default for RecentUpdates {
    fn default() -> Self {
        Self::with_capacity(RECENT_UPDATES)
    }
}

/// Decodes updates into donation workflow calls.
pub struct UpdateRouter<S, M> {
    service: Arc<S>,
    notifier: Notifier<M>,
    recent: RecentUpdates,
}

impl<S, M> UpdateRouter<S, M>
where
    S: DonationService,
    M: Messenger,
{
    pub fn new(service: Arc<S>, notifier: Notifier<M>) -> Self {
        Self {
            service,
            notifier,
            recent: RecentUpdates::default(),
        }
    }

    async fn on_message(&self, message: Message) -> Result<(), Status> {
        let (Some(text), Some(from)) = (message.text, message.from) else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        if is_start_command(&text) {
            return self.service.start(chat_id).await;
        }
        if text.starts_with('/') {
            debug!("Ignoring command {:?} in chat {}", text, chat_id);
            return Ok(());
        }
        self.service
            .submit_amount(donor(from), chat_id, text)
            .await
            .map(|_| ())
    }

    async fn on_callback(&self, query: CallbackQuery) -> Result<(), Status> {
        self.notifier.acknowledge(query.id).await;

        let data = query
            .data
            .ok_or_else(|| missing_required_field("callback_data"))?;
        let action = data
            .parse::<Action>()
            .map_err(|e| invalid_field("callback_data", e))?;
        let message = query.message.as_ref().map(message_ref);

        match action {
            Action::Donate => {
                let chat_id = message.map_or(query.from.id, |message| message.chat_id);
                self.service
                    .begin_donation(donor(query.from), chat_id)
                    .await
            }
            Action::Refresh => {
                let message = message.ok_or_else(|| missing_required_field("message"))?;
                self.service.refresh(message).await
            }
            Action::Dispose {
                donation_id,
                decision,
            } => {
                let message = message.ok_or_else(|| missing_required_field("message"))?;
                self.service
                    .dispose(query.from.id, message, donation_id, decision)
                    .await
                    .map(|_| ())
            }
        }
    }

    async fn report(&self, update_id: i64, chat_id: Option<i64>, result: Result<(), Status>) {
        let Err(status) = result else {
            return;
        };
        if status.is_recovered() {
            info!("Update {} not applied: {}", update_id, status);
            return;
        }
        error!("Failed to handle update {}: {}", update_id, status);
        if let Some(chat_id) = chat_id {
            self.notifier.generic_failure(chat_id).await;
        }
    }
}

#[async_trait]
impl<S, M> UpdateHandler for UpdateRouter<S, M>
where
    S: DonationService + 'static,
    M: Messenger + 'static,
{
    async fn handle_update(&self, update: Update) {
        if !self.recent.insert(update.update_id) {
            debug!("Dropping redelivered update {}", update.update_id);
            return;
        }

        if let Some(message) = update.message {
            let chat_id = message.chat.id;
            let result = self.on_message(message).await;
            self.report(update.update_id, Some(chat_id), result).await;
        } else if let Some(query) = update.callback_query {
            let chat_id = query
                .message
                .as_ref()
                .map_or(query.from.id, |message| message.chat.id);
            let result = self.on_callback(query).await;
            self.report(update.update_id, Some(chat_id), result).await;
        }
    }
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef {
        chat_id: message.chat.id,
        message_id: message.message_id,
    }
}

fn donor(user: User) -> Donor {
    Donor {
        user_id: user.id,
        username: user.username,
    }
}
