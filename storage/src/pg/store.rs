use crate::{
    database::store::{OnDemandStore, TransactionalStore},
    Error,
};
use async_trait::async_trait;
use futures::lock::Mutex;
use sqlx::{PgPool, Postgres, Transaction};

/// Runs each donation query on whichever pooled connection is free.
#[derive(Debug)]
pub struct PgOnDemandStore {
    pub(crate) pool: PgPool,
}

impl PgOnDemandStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OnDemandStore for PgOnDemandStore {}

/// Runs every donation query inside one open transaction. The mutex hands the
/// connection out mutably to the `&self` store methods.
#[derive(Debug)]
pub struct PgTransactionalStore {
    pub(crate) txn: Mutex<Transaction<'static, Postgres>>,
}

impl PgTransactionalStore {
    pub(crate) fn new(txn: Transaction<'static, Postgres>) -> Self {
        Self {
            txn: Mutex::new(txn),
        }
    }
}

#[async_trait]
impl TransactionalStore for PgTransactionalStore {
    async fn commit(self) -> Result<(), Error> {
        self.txn.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.txn.into_inner().rollback().await?;
        Ok(())
    }
}
