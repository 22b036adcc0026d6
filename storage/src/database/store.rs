use crate::Error;
use async_trait::async_trait;

/// Marker for stores that run each query on its own pooled connection.
#[async_trait]
pub trait OnDemandStore: Send + Sync {}

/// A store holding an open transaction. Uncommitted work is rolled back
/// when the store is dropped.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn commit(self) -> Result<(), Error>;

    async fn rollback(self) -> Result<(), Error>;
}
