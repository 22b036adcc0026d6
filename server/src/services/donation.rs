use crate::{
    action::Decision,
    campaign::Campaign,
    messenger::{MessageRef, Messenger},
    notify::Notifier,
    session::SessionStore,
};
use async_trait::async_trait;
use chrono::Utc;
use donation_status::{internal, permission_denied, well_known::invalid_field, Status};
use donation_storage::{
    database::{
        client::DatabaseClient,
        store::{OnDemandStore, TransactionalStore},
    },
    models::donation::{DonationRow, NewDonationRow},
    stores::donation::{DonationDispositionStore, DonationStore},
    Error,
};
use log::info;
use std::{marker::PhantomData, sync::Arc};

#[cfg(test)]
mod tests;

/// The chat user reporting a donation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Donor {
    pub user_id: i64,
    pub username: Option<String>,
}

impl Donor {
    /// `@username` when the user has one, the numeric id otherwise.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.user_id.to_string(),
        }
    }
}

/// Donation lifecycle: campaign post, amount entry and admin disposition.
///
/// Handlers explain recoverable failures (bad amount, non-admin actor,
/// unknown or already decided donation) to the chat themselves and still
/// return the `Status` so callers can log it. `Internal` failures are left
/// for the caller to report.
#[async_trait]
pub trait DonationService: Send + Sync {
    /// Posts the campaign with the current progress and the donate/refresh
    /// buttons.
    async fn start(&self, chat_id: i64) -> Result<(), Status>;

    /// Re-renders the progress of an existing campaign post in place.
    async fn refresh(&self, message: MessageRef) -> Result<(), Status>;

    /// Puts the donor into the awaiting-amount state and asks for the amount.
    async fn begin_donation(&self, donor: Donor, chat_id: i64) -> Result<(), Status>;

    /// Interprets `text` as an amount if the donor is awaiting one. Returns the
    /// created pending donation, or `None` when the text was not meant as an
    /// amount.
    async fn submit_amount(
        &self,
        donor: Donor,
        chat_id: i64,
        text: String,
    ) -> Result<Option<DonationRow>, Status>;

    /// Confirms or rejects a pending donation on behalf of `actor_id`, which
    /// must be the admin. `message` is the admin alert that was pressed.
    async fn dispose(
        &self,
        actor_id: i64,
        message: MessageRef,
        donation_id: i64,
        decision: Decision,
    ) -> Result<DonationRow, Status>;
}

pub struct DonationServiceImpl<Db, Store, TStore, M> {
    database: Arc<Db>,
    notifier: Notifier<M>,
    campaign: Arc<Campaign>,
    sessions: Arc<SessionStore>,
    admin_id: i64,
    _marker: PhantomData<fn() -> (Store, TStore)>,
}

impl<Db, Store, TStore, M> DonationServiceImpl<Db, Store, TStore, M> {
    pub fn new(
        database: Arc<Db>,
        notifier: Notifier<M>,
        campaign: Arc<Campaign>,
        sessions: Arc<SessionStore>,
        admin_id: i64,
    ) -> Self {
        Self {
            database,
            notifier,
            campaign,
            sessions,
            admin_id,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Db, Store, TStore, M> DonationService for DonationServiceImpl<Db, Store, TStore, M>
where
    Db: DatabaseClient<Store, TStore> + 'static,
    Store: DonationStore + OnDemandStore + 'static,
    TStore: DonationStore + TransactionalStore + 'static,
    M: Messenger + 'static,
{
    async fn start(&self, chat_id: i64) -> Result<(), Status> {
        let total = self.database.on_demand().total_confirmed().await?;
        let text = self
            .campaign
            .post(total)
            .map_err(|e| internal!("failed to render campaign post: {}", e))?;

        if let Some(photo_url) = self.campaign.photo_url() {
            self.notifier.campaign_photo(chat_id, photo_url).await;
        }
        self.notifier.campaign_post(chat_id, text).await;
        Ok(())
    }

    async fn refresh(&self, message: MessageRef) -> Result<(), Status> {
        let total = self.database.on_demand().total_confirmed().await?;
        let text = self
            .campaign
            .post(total)
            .map_err(|e| internal!("failed to render campaign post: {}", e))?;
        self.notifier.refresh_campaign_post(message, text).await;
        Ok(())
    }

    async fn begin_donation(&self, donor: Donor, chat_id: i64) -> Result<(), Status> {
        let pending_donation_id = self
            .database
            .on_demand()
            .latest_pending_id(donor.user_id)
            .await?;

        self.sessions.await_amount(donor.user_id);
        self.notifier
            .prompt_amount(chat_id, pending_donation_id)
            .await;
        Ok(())
    }

    async fn submit_amount(
        &self,
        donor: Donor,
        chat_id: i64,
        text: String,
    ) -> Result<Option<DonationRow>, Status> {
        if !self.sessions.is_awaiting_amount(donor.user_id) {
            return Ok(None);
        }

        // Invalid input keeps the session, so the donor can simply retry.
        let amount = match self.campaign.unit().parse_amount(&text) {
            Ok(amount) => amount,
            Err(e) => {
                self.notifier.invalid_amount(chat_id).await;
                return Err(invalid_field("amount", e));
            }
        };

        let donation = self
            .database
            .on_demand()
            .add_donation(NewDonationRow {
                create_time: Utc::now(),
                user_id: donor.user_id,
                amount,
            })
            .await?;
        self.sessions.finish(donor.user_id);
        info!(
            "Donation #{} of {} submitted by user {}",
            donation.donation_id, donation.amount, donor.user_id
        );

        self.notifier.submission_received(chat_id, &donation).await;
        self.notifier
            .admin_alert(self.admin_id, &donor.handle(), &donation)
            .await;
        Ok(Some(donation))
    }

    async fn dispose(
        &self,
        actor_id: i64,
        message: MessageRef,
        donation_id: i64,
        decision: Decision,
    ) -> Result<DonationRow, Status> {
        if actor_id != self.admin_id {
            self.notifier.not_authorized(message.chat_id).await;
            return Err(permission_denied!(
                "user {} may not dispose of donation {}",
                actor_id,
                donation_id
            ));
        }

        let txn = self.database.begin().await?;
        // On error the transaction is dropped, which rolls it back.
        let donation = match txn.set_status(donation_id, decision.status()).await {
            Ok(donation) => donation,
            Err(Error::NotFound(id)) => {
                self.notifier.donation_not_found(message.chat_id, id).await;
                return Err(Error::NotFound(id).into());
            }
            Err(Error::AlreadyDecided { id, status }) => {
                self.notifier
                    .already_decided(message.chat_id, id, status)
                    .await;
                return Err(Error::AlreadyDecided { id, status }.into());
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;
        info!("Donation #{} {}", donation.donation_id, donation.status);

        // The status change is committed; delivery failures past this point
        // are only logged.
        self.notifier.donor_outcome(&donation).await;
        self.notifier.disposition_recorded(message, &donation).await;
        Ok(donation)
    }
}
