use crate::{
    database::store::{OnDemandStore, TransactionalStore},
    Error,
};
use async_trait::async_trait;

/// Hands out donation stores backed by one database.
///
/// Reads such as the campaign total go through [`on_demand`](Self::on_demand).
/// Dispositions go through [`begin`](Self::begin) so the row lock taken while
/// checking a donation's status is held until the new status commits.
#[async_trait]
pub trait DatabaseClient<S, T>
where
    Self: Send + Sync,
    S: OnDemandStore,
    T: TransactionalStore,
{
    /// Store that checks out a pooled connection per query.
    fn on_demand(&self) -> S;

    /// Store bound to a freshly opened transaction. Dropping it without
    /// `commit()` rolls back.
    async fn begin(&self) -> Result<T, Error>;
}
