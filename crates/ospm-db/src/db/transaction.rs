//! Store transaction utilities
//!
//! Lifecycle operations touch several tables and must be all-or-nothing.
//! [`TransactionGuard`] scopes one store transaction to one operation: it is
//! committed explicitly, and anything else (early return, `?`, panic) rolls
//! it back when the guard is dropped.

use std::ops::{Deref, DerefMut};

use crate::db::error::StoreResult;
use crate::db::store::{IsolationLevel, Store, StoreTransaction};

/// A store transaction wrapper that automatically handles rollback
///
/// # Example
///
/// ```ignore
/// use ospm_db::{IsolationLevel, StoreTransaction, TransactionGuard};
///
/// async fn example<S: ospm_db::Store>(store: &S, group_id: uuid::Uuid) -> ospm_db::StoreResult<()> {
///     let mut tx = TransactionGuard::begin(store, IsolationLevel::Default).await?;
///     tx.delete_permissions(group_id).await?;
///     tx.delete_subscriber_group(group_id).await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard<T: StoreTransaction> {
    transaction: Option<T>,
}

impl<T: StoreTransaction> TransactionGuard<T> {
    /// Begin a new store transaction
    pub async fn begin<S>(store: &S, isolation: IsolationLevel) -> StoreResult<Self>
    where
        S: Store<Tx = T>,
    {
        let transaction = store.begin(isolation).await?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Commit the transaction
    ///
    /// After calling this, the transaction is consumed and cannot be used further.
    pub async fn commit(mut self) -> StoreResult<()> {
        match self.transaction.take() {
            Some(tx) => tx.commit().await,
            None => Ok(()),
        }
    }

    /// Rollback the transaction
    ///
    /// After calling this, the transaction is consumed and cannot be used further.
    pub async fn rollback(mut self) -> StoreResult<()> {
        match self.transaction.take() {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }
}

impl<T: StoreTransaction> Deref for TransactionGuard<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.transaction
            .as_ref()
            .expect("Transaction was already committed or rolled back")
    }
}

impl<T: StoreTransaction> DerefMut for TransactionGuard<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.transaction
            .as_mut()
            .expect("Transaction was already committed or rolled back")
    }
}

impl<T: StoreTransaction> Drop for TransactionGuard<T> {
    fn drop(&mut self) {
        // Both backends discard uncommitted work when their transaction is dropped
        if self.transaction.take().is_some() {
            tracing::warn!(
                "Transaction was dropped without explicit commit or rollback - rolling back"
            );
        }
    }
}
