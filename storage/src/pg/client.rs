use crate::{
    database::client::DatabaseClient,
    pg::store::{PgOnDemandStore, PgTransactionalStore},
    Error,
};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// How long a query waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// The donations database, reached through one shared connection pool.
pub struct PgDatabaseClient {
    pool: PgPool,
}

impl PgDatabaseClient {
    /// Opens a pool of at most `max_connections` connections to `postgres_uri`.
    pub async fn connect(postgres_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(postgres_uri)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates or upgrades the `donations` table from `storage/migrations`.
    pub async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DatabaseClient<PgOnDemandStore, PgTransactionalStore> for PgDatabaseClient {
    /// Serves the campaign total, the pending request lookup and new
    /// submissions. Each of these is a single statement, so no transaction
    /// is opened.
    fn on_demand(&self) -> PgOnDemandStore {
        PgOnDemandStore::new(self.pool.clone())
    }

    /// Starts the transaction an admin disposition runs in.
    async fn begin(&self) -> Result<PgTransactionalStore, Error> {
        let txn = self.pool.begin().await?;
        Ok(PgTransactionalStore::new(txn))
    }
}
