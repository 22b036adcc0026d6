use crate::{
    database::store::TransactionalStore,
    models::donation::*,
    pg::store::{PgOnDemandStore, PgTransactionalStore},
    Error,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgExecutor;

#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Inserts a new pending donation.
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error>;

    /// Sum of all confirmed donations, zero when there are none.
    async fn total_confirmed(&self) -> Result<Decimal, Error>;

    /// Most recent pending donation of the user, if any.
    async fn latest_pending_id(&self, user_id: i64) -> Result<Option<i64>, Error>;

    /// Loads a donation and locks its row until the surrounding transaction ends.
    async fn find_donation_for_update(
        &self,
        donation_id: i64,
    ) -> Result<Option<DonationRow>, Error>;

    /// Moves a pending donation into `status`. Returns `None` when the
    /// donation is missing or no longer pending.
    async fn update_donation_status(
        &self,
        donation_id: i64,
        status: DonationStatus,
    ) -> Result<Option<DonationRow>, Error>;
}

#[async_trait]
impl DonationStore for PgOnDemandStore {
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error> {
        Ok(add_donation(&self.pool, new_row).await?)
    }

    async fn total_confirmed(&self) -> Result<Decimal, Error> {
        Ok(total_confirmed(&self.pool).await?)
    }

    async fn latest_pending_id(&self, user_id: i64) -> Result<Option<i64>, Error> {
        Ok(latest_pending_id(&self.pool, user_id).await?)
    }

    async fn find_donation_for_update(
        &self,
        donation_id: i64,
    ) -> Result<Option<DonationRow>, Error> {
        Ok(find_donation_for_update(&self.pool, donation_id).await?)
    }

    async fn update_donation_status(
        &self,
        donation_id: i64,
        status: DonationStatus,
    ) -> Result<Option<DonationRow>, Error> {
        Ok(update_donation_status(&self.pool, donation_id, status).await?)
    }
}

#[async_trait]
impl DonationStore for PgTransactionalStore {
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error> {
        let mut lock = self.txn.lock().await;
        Ok(add_donation(&mut **lock, new_row).await?)
    }

    async fn total_confirmed(&self) -> Result<Decimal, Error> {
        let mut lock = self.txn.lock().await;
        Ok(total_confirmed(&mut **lock).await?)
    }

    async fn latest_pending_id(&self, user_id: i64) -> Result<Option<i64>, Error> {
        let mut lock = self.txn.lock().await;
        Ok(latest_pending_id(&mut **lock, user_id).await?)
    }

    async fn find_donation_for_update(
        &self,
        donation_id: i64,
    ) -> Result<Option<DonationRow>, Error> {
        let mut lock = self.txn.lock().await;
        Ok(find_donation_for_update(&mut **lock, donation_id).await?)
    }

    async fn update_donation_status(
        &self,
        donation_id: i64,
        status: DonationStatus,
    ) -> Result<Option<DonationRow>, Error> {
        let mut lock = self.txn.lock().await;
        Ok(update_donation_status(&mut **lock, donation_id, status).await?)
    }
}

#[async_trait]
pub trait DonationDispositionStore {
    /// Moves a pending donation into a terminal status and returns the
    /// updated row, which carries the donor and amount for notifications.
    async fn set_status(
        &self,
        donation_id: i64,
        status: DonationStatus,
    ) -> Result<DonationRow, Error>;
}

// Implemented for transactional donation stores only, so the row lock taken
// by the lookup is held until the update commits.
#[async_trait]
impl<S> DonationDispositionStore for S
where
    S: DonationStore + TransactionalStore,
{
    async fn set_status(
        &self,
        donation_id: i64,
        status: DonationStatus,
    ) -> Result<DonationRow, Error> {
        let current = self
            .find_donation_for_update(donation_id)
            .await?
            .ok_or(Error::NotFound(donation_id))?;
        if current.status.is_terminal() {
            return Err(Error::AlreadyDecided {
                id: donation_id,
                status: current.status,
            });
        }

        self.update_donation_status(donation_id, status)
            .await?
            .ok_or(Error::AlreadyDecided {
                id: donation_id,
                status: current.status,
            })
    }
}

async fn add_donation<'a, E>(executor: E, new_row: NewDonationRow) -> Result<DonationRow, Error>
where
    E: PgExecutor<'a>,
{
    Ok(
        sqlx::query_as(include_str!("../../queries/donation/insert.sql"))
            .bind(new_row.user_id)
            .bind(new_row.amount)
            .bind(new_row.create_time)
            .fetch_one(executor)
            .await?,
    )
}

async fn total_confirmed<'a, E>(executor: E) -> Result<Decimal, Error>
where
    E: PgExecutor<'a>,
{
    Ok(
        sqlx::query_scalar(include_str!("../../queries/donation/total_confirmed.sql"))
            .fetch_one(executor)
            .await?,
    )
}

async fn latest_pending_id<'a, E>(executor: E, user_id: i64) -> Result<Option<i64>, Error>
where
    E: PgExecutor<'a>,
{
    Ok(
        sqlx::query_scalar(include_str!("../../queries/donation/latest_pending_id.sql"))
            .bind(user_id)
            .fetch_optional(executor)
            .await?,
    )
}

async fn find_donation_for_update<'a, E>(
    executor: E,
    donation_id: i64,
) -> Result<Option<DonationRow>, Error>
where
    E: PgExecutor<'a>,
{
    Ok(
        sqlx::query_as(include_str!("../../queries/donation/find_for_update.sql"))
            .bind(donation_id)
            .fetch_optional(executor)
            .await?,
    )
}

async fn update_donation_status<'a, E>(
    executor: E,
    donation_id: i64,
    status: DonationStatus,
) -> Result<Option<DonationRow>, Error>
where
    E: PgExecutor<'a>,
{
    Ok(
        sqlx::query_as(include_str!("../../queries/donation/update_status.sql"))
            .bind(donation_id)
            .bind(status.as_str())
            .fetch_optional(executor)
            .await?,
    )
}
