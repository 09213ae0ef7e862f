//! # Batch Mutator
//!
//! Atomic multi-row delete.
//!
//! ```text
//! Open ──▶ Resolving ──▶ Deleting ──▶ Committed
//!              │             │
//!              └─────────────┴──────▶ RolledBack
//! ```
//!
//! Ids are validated before any transaction opens. Inside the transaction
//! each requested id is resolved; ids with no row are skipped, the rest form
//! the removal set, which is deleted with one multi-row statement. Any
//! failure after the transaction opens rolls it back before the error is
//! returned, so readers see either every row or none of the removal set.

use std::collections::HashSet;
use std::fmt;

use crate::error::{PersistenceError, Result};
use crate::repository::{ProductTransaction, SharedRepository};
use shop_domain::ProductId;

/// Lifecycle of one batch delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Open,
    Resolving,
    Deleting,
    Committed,
    RolledBack,
}

impl BatchPhase {
    /// `Committed` and `RolledBack` admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolving => "resolving",
            Self::Deleting => "deleting",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a committed batch delete did
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Ids in the request, duplicates included
    pub requested: usize,
    /// Rows removed
    pub removed: u64,
    /// Requested ids with no row at resolution time, in request order
    pub not_found: Vec<ProductId>,
}

/// Tracks the phase of one batch and logs every transition.
#[derive(Debug)]
struct BatchRun {
    phase: BatchPhase,
}

impl BatchRun {
    const fn new() -> Self {
        Self {
            phase: BatchPhase::Open,
        }
    }

    fn advance(&mut self, next: BatchPhase) {
        debug_assert!(!self.phase.is_terminal(), "batch already {}", self.phase);
        tracing::debug!(from = %self.phase, to = %next, "Batch delete phase");
        self.phase = next;
    }

    /// Roll back and wrap `cause` with the phase it interrupted.
    async fn abort(
        &mut self,
        tx: Box<dyn ProductTransaction>,
        cause: PersistenceError,
    ) -> PersistenceError {
        let phase = self.phase;
        if let Err(e) = tx.rollback().await {
            // The handle is gone either way; dropping it rolls back.
            tracing::warn!(error = %e, "Explicit rollback failed");
        }
        self.advance(BatchPhase::RolledBack);
        tracing::warn!(phase = %phase, error = %cause, "Batch delete rolled back");

        PersistenceError::TransactionFailed {
            phase,
            source: Box::new(cause),
        }
    }
}

/// Multi-row delete executed as one transaction
#[derive(Clone)]
pub struct BatchMutator {
    repo: SharedRepository,
}

impl BatchMutator {
    pub const fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    /// Delete every listed product that exists, atomically.
    ///
    /// Returns the number of rows removed. Unknown ids are skipped, so a
    /// batch of only unknown ids commits and returns 0.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::InvalidRequest`] for an id that can never exist,
    ///   before anything is opened
    /// - [`PersistenceError::TransactionFailed`] if resolution, the delete or
    ///   the commit fails; nothing was removed
    /// - the store's own error if the transaction cannot be opened
    pub async fn delete_batch(&self, ids: &[ProductId]) -> Result<u64> {
        Ok(self.delete_batch_detailed(ids).await?.removed)
    }

    /// Like [`delete_batch`](Self::delete_batch), also reporting which ids
    /// were not found.
    ///
    /// # Errors
    ///
    /// Same as [`delete_batch`](Self::delete_batch).
    pub async fn delete_batch_detailed(&self, ids: &[ProductId]) -> Result<BatchOutcome> {
        if let Some(bad) = ids.iter().find(|id| !id.is_valid()) {
            return Err(PersistenceError::InvalidRequest(format!(
                "product id {bad} is not a valid identity"
            )));
        }

        let mut run = BatchRun::new();
        let mut tx = self.repo.begin().await?;

        run.advance(BatchPhase::Resolving);
        let resolved = resolve_all(tx.as_mut(), ids).await;
        let (removal, not_found) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return Err(run.abort(tx, e).await),
        };

        run.advance(BatchPhase::Deleting);
        let removed = if removal.is_empty() {
            0
        } else {
            match tx.delete_many(&removal).await {
                Ok(removed) => removed,
                Err(e) => return Err(run.abort(tx, e).await),
            }
        };

        if let Err(e) = tx.commit().await {
            // A failed commit leaves nothing applied.
            run.advance(BatchPhase::RolledBack);
            tracing::warn!(error = %e, "Batch delete commit failed");
            return Err(PersistenceError::TransactionFailed {
                phase: BatchPhase::Deleting,
                source: Box::new(e),
            });
        }
        run.advance(BatchPhase::Committed);

        tracing::info!(
            requested = ids.len(),
            removed,
            not_found = not_found.len(),
            "Batch delete committed"
        );

        Ok(BatchOutcome {
            requested: ids.len(),
            removed,
            not_found,
        })
    }
}

/// Split requested ids into rows to remove and ids with no row.
async fn resolve_all(
    tx: &mut dyn ProductTransaction,
    ids: &[ProductId],
) -> Result<(Vec<ProductId>, Vec<ProductId>)> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut removal = Vec::with_capacity(ids.len());
    let mut not_found = Vec::new();

    for &id in ids {
        if !seen.insert(id) {
            continue;
        }
        match tx.resolve(id).await? {
            Some(product) => {
                tracing::debug!(id = %product.id, name = %product.name, "Resolved for delete");
                removal.push(product.id);
            }
            None => {
                tracing::debug!(id = %id, "Not found, skipping");
                not_found.push(id);
            }
        }
    }

    Ok((removal, not_found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryProductRepository, ProductRepository};
    use crate::testing::{Fault, FaultyRepository, UnreachableRepository, memory_repo};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn ids(raw: &[i64]) -> Vec<ProductId> {
        raw.iter().copied().map(ProductId::new).collect()
    }

    async fn catalog() -> MemoryProductRepository {
        memory_repo(&["a", "b", "c", "d", "e"]).await
    }

    async fn surviving_ids(repo: &MemoryProductRepository) -> Vec<i64> {
        repo.list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.get())
            .collect()
    }

    #[tokio::test]
    async fn test_removes_exactly_the_existing_subset() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(repo.clone()));

        let outcome = mutator
            .delete_batch_detailed(&ids(&[2, 4, 99, 100]))
            .await
            .unwrap();

        assert_eq!(outcome.requested, 4);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.not_found, ids(&[99, 100]));
        assert_eq!(surviving_ids(&repo).await, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_only_missing_ids_commit_with_zero() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(repo.clone()));

        assert_eq!(assert_ok!(mutator.delete_batch(&ids(&[41, 42])).await), 0);
        assert_eq!(assert_ok!(mutator.delete_batch(&[]).await), 0);
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_ids_count_once() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(repo.clone()));

        assert_eq!(mutator.delete_batch(&ids(&[3, 3, 3])).await.unwrap(), 1);
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_before_transaction() {
        // An unreachable store proves no transaction was attempted.
        let mutator = BatchMutator::new(Arc::new(UnreachableRepository));

        let err = mutator.delete_batch(&ids(&[1, 0, 2])).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRequest(_)));

        let err = mutator.delete_batch(&ids(&[-7])).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_failed_begin_propagates_store_error() {
        let mutator = BatchMutator::new(Arc::new(UnreachableRepository));
        let err = assert_err!(mutator.delete_batch(&ids(&[1])).await);
        assert!(matches!(err, PersistenceError::Database(_)));
    }

    #[tokio::test]
    async fn test_midway_delete_failure_removes_nothing() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(FaultyRepository::new(
            repo.clone(),
            Fault::DeleteMidway,
        )));

        let err = mutator
            .delete_batch(&ids(&[1, 2, 3, 4, 77]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PersistenceError::TransactionFailed {
                phase: BatchPhase::Deleting,
                ..
            }
        ));
        assert_eq!(surviving_ids(&repo).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_resolve_failure_rolls_back() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(FaultyRepository::new(
            repo.clone(),
            Fault::Resolve(ProductId::new(3)),
        )));

        let err = mutator.delete_batch(&ids(&[1, 2, 3])).await.unwrap_err();

        assert!(matches!(
            err,
            PersistenceError::TransactionFailed {
                phase: BatchPhase::Resolving,
                ..
            }
        ));
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_commit_failure_removes_nothing() {
        let repo = catalog().await;
        let mutator = BatchMutator::new(Arc::new(FaultyRepository::new(repo.clone(), Fault::Commit)));

        let err = mutator.delete_batch(&ids(&[1, 5])).await.unwrap_err();

        assert!(matches!(err, PersistenceError::TransactionFailed { .. }));
        assert_eq!(surviving_ids(&repo).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_store_usable_after_rollback() {
        let repo = catalog().await;
        let faulty = BatchMutator::new(Arc::new(FaultyRepository::new(
            repo.clone(),
            Fault::DeleteMidway,
        )));
        assert!(faulty.delete_batch(&ids(&[1, 2])).await.is_err());

        // The lock was released, so a healthy batch goes through.
        let healthy = BatchMutator::new(Arc::new(repo.clone()));
        assert_eq!(healthy.delete_batch(&ids(&[1, 2])).await.unwrap(), 2);
        assert_eq!(surviving_ids(&repo).await, vec![3, 4, 5]);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_batch_delete() {
        use crate::repository::{SqliteConfig, SqliteProductRepository};
        use crate::testing::new_product;

        let repo = SqliteProductRepository::connect(&SqliteConfig::default())
            .await
            .unwrap();
        let rows: Vec<_> = (1..=10).map(|i| new_product(&format!("Apple Dog Plush #{i}"), 5)).collect();
        repo.bulk_insert(&rows).await.unwrap();
        let mutator = BatchMutator::new(Arc::new(repo.clone()));

        let outcome = mutator
            .delete_batch_detailed(&ids(&[2, 4, 6, 8, 10, 12]))
            .await
            .unwrap();

        assert_eq!(outcome.removed, 5);
        assert_eq!(outcome.not_found, ids(&[12]));
        let left: Vec<i64> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.get())
            .collect();
        assert_eq!(left, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(BatchPhase::Committed.is_terminal());
        assert!(BatchPhase::RolledBack.is_terminal());
        assert!(!BatchPhase::Resolving.is_terminal());
        assert_eq!(BatchPhase::RolledBack.to_string(), "rolled_back");
    }
}
