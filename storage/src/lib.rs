use ::sqlx::migrate::MigrateError;
use donation_status::Status;

pub mod database;
pub mod models;
pub mod pg;
pub mod stores;

pub use database::{
    client::DatabaseClient,
    store::{OnDemandStore, TransactionalStore},
};
pub use models::donation::DonationStatus;
pub use pg::client::PgDatabaseClient;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Error occurred when executing some SQL operation.
    #[error("sql failed: {0:?}")]
    Sql(#[from] ::sqlx::Error),

    // Error occurred when running migrations.
    #[error("migration failed: {0:?}")]
    Migrate(#[from] MigrateError),

    // No donation exists with the given id.
    #[error("donation {0} not found")]
    NotFound(i64),

    // The donation already left the pending state.
    #[error("donation {id} is already {status}")]
    AlreadyDecided { id: i64, status: DonationStatus },

    // Some other/unexpected error occurred.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound(_) => Status::not_found(error.to_string()),
            Error::AlreadyDecided { .. } => Status::failed_precondition(error.to_string()),
            _ => Status::internal(format!("storage error: {:?}", error)),
        }
    }
}
