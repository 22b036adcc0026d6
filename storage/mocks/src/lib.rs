use async_trait::async_trait;
use donation_storage::{
    database::{
        client::DatabaseClient,
        store::{OnDemandStore, TransactionalStore},
    },
    models::donation::*,
    stores::donation::*,
    Error,
};
use mockall::mock;
use rust_decimal::Decimal;

mock! {
  pub DatabaseClient {}

  #[async_trait]
  impl DatabaseClient<MockStore, MockStore> for DatabaseClient {
      fn on_demand(&self) -> MockStore;

      async fn begin(&self) -> Result<MockStore, Error>;
  }
}

mock! {
  pub Store {}

  #[async_trait]
  impl DonationStore for Store {
      async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error>;

      async fn total_confirmed(&self) -> Result<Decimal, Error>;

      async fn latest_pending_id(&self, user_id: i64) -> Result<Option<i64>, Error>;

      async fn find_donation_for_update(
          &self,
          donation_id: i64,
      ) -> Result<Option<DonationRow>, Error>;

      async fn update_donation_status(
          &self,
          donation_id: i64,
          status: DonationStatus,
      ) -> Result<Option<DonationRow>, Error>;
  }

  #[async_trait]
  impl OnDemandStore for Store {
  }

  #[async_trait]
  impl TransactionalStore for Store {
      async fn commit(self) -> Result<(), Error>;

      async fn rollback(self) -> Result<(), Error>;
  }
}
