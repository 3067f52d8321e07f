use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::engine::error::CoreError;

/// Threads a single transaction through whatever the closure does, so no
/// component invoked along the way opens one of its own. Commits on
/// success; on error the transaction is simply dropped, which rolls it
/// back.
pub struct UnitOfWork;

impl UnitOfWork {
    pub async fn run<T, F>(pool: &PgPool, f: F) -> Result<T, CoreError>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'_, Postgres>) -> BoxFuture<'c, Result<T, CoreError>>,
    {
        let mut tx = pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}
