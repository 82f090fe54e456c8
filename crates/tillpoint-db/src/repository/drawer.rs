//! # Cash Drawer Repository
//!
//! Persistence for the append-only cash drawer ledger.
//!
//! ## Ledger Append Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Serialized Ledger Append                            │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Re-read chain head (newest entry by seq)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  apply_operation(open, previous_balance, op, amount)  ← pure rules    │
//! │       │                                                                 │
//! │       ├── Err(rule violation) → ROLLBACK, nothing persisted            │
//! │       ▼                                                                 │
//! │  INSERT entry { previous_balance = head.balance, balance = new }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  SQLite serializes writers, so two concurrent appends can never both   │
//! │  read the same head: chain continuity holds without extra locking.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! System-generated entries (sale, expense, tax payment) reuse
//! [`DrawerRepository::append_in_tx`] inside the originating transaction, so
//! the business record and its ledger entry commit or roll back together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tillpoint_core::drawer::{self, Reconciliation};
use tillpoint_core::{DrawerOperation, DrawerTransaction, Money};

/// Columns selected for every [`DrawerTransaction`] read.
const ENTRY_COLUMNS: &str = "id, date, operation, amount_cents, \
     previous_balance_cents, balance_cents, notes, reference_id";

/// Drawer open/closed state returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerStatus {
    /// True while a drawer period is open.
    pub open: bool,
    /// When the current period's `initialization` was recorded.
    pub opened_at: Option<DateTime<Utc>>,
    /// Current balance in cents (zero when closed).
    pub balance_cents: i64,
}

/// Repository for cash drawer ledger operations.
#[derive(Debug, Clone)]
pub struct DrawerRepository {
    pool: SqlitePool,
}

impl DrawerRepository {
    /// Creates a new DrawerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DrawerRepository { pool }
    }

    // =========================================================================
    // Appending
    // =========================================================================

    /// Appends a manually submitted operation in its own transaction.
    ///
    /// ## Arguments
    /// * `operation` - add/remove/count/initialization/close
    /// * `amount` - submitted magnitude; ignored for `close`
    /// * `notes` - user-supplied reason
    pub async fn append(
        &self,
        operation: DrawerOperation,
        amount: Option<Money>,
        notes: Option<String>,
    ) -> DbResult<DrawerTransaction> {
        let mut tx = self.pool.begin().await?;
        let entry = Self::append_in_tx(&mut tx, operation, amount, notes, None).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Appends an entry inside the caller's transaction.
    ///
    /// Used by the expense, tax, and sale repositories so a cash movement and
    /// the record that caused it commit atomically. Rule violations roll the
    /// whole transaction back.
    pub async fn append_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        operation: DrawerOperation,
        amount: Option<Money>,
        notes: Option<String>,
        reference_id: Option<String>,
    ) -> DbResult<DrawerTransaction> {
        let head = Self::chain_head(&mut *tx).await?;
        let open = drawer::is_open(head.as_ref().map(|e| e.operation));
        let previous = head
            .map(|e| Money::from_cents(e.balance_cents))
            .unwrap_or_else(Money::zero);

        let applied = drawer::apply_operation(open, previous, operation, amount)?;

        let entry = DrawerTransaction {
            id: Uuid::new_v4().to_string(),
            date: Utc::now(),
            operation,
            amount_cents: applied.amount.cents(),
            previous_balance_cents: previous.cents(),
            balance_cents: applied.balance.cents(),
            notes,
            reference_id,
        };

        debug!(
            id = %entry.id,
            operation = operation.as_str(),
            amount_cents = entry.amount_cents,
            balance_cents = entry.balance_cents,
            "Appending drawer entry"
        );

        sqlx::query(
            r#"
            INSERT INTO drawer_transactions (
                id, date, operation, amount_cents,
                previous_balance_cents, balance_cents, notes, reference_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.date)
        .bind(entry.operation)
        .bind(entry.amount_cents)
        .bind(entry.previous_balance_cents)
        .bind(entry.balance_cents)
        .bind(&entry.notes)
        .bind(&entry.reference_id)
        .execute(&mut **tx)
        .await?;

        Ok(entry)
    }

    /// Reads the newest ledger entry (by insertion order, not timestamp).
    async fn chain_head(conn: &mut SqliteConnection) -> DbResult<Option<DrawerTransaction>> {
        let entry = sqlx::query_as::<_, DrawerTransaction>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM drawer_transactions ORDER BY seq DESC LIMIT 1"
        ))
        .fetch_optional(conn)
        .await?;
        Ok(entry)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current drawer balance in cents. Zero for an empty ledger.
    pub async fn balance(&self) -> DbResult<i64> {
        let balance: Option<i64> = sqlx::query_scalar(
            "SELECT balance_cents FROM drawer_transactions ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(balance.unwrap_or(0))
    }

    /// Most recent entries, newest first.
    pub async fn history(&self, limit: u32) -> DbResult<Vec<DrawerTransaction>> {
        let entries = sqlx::query_as::<_, DrawerTransaction>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM drawer_transactions ORDER BY seq DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// The full ledger in chronological order (CSV export).
    pub async fn all_entries(&self) -> DbResult<Vec<DrawerTransaction>> {
        let entries = sqlx::query_as::<_, DrawerTransaction>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM drawer_transactions ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Open/closed state plus the current period's opening timestamp.
    pub async fn status(&self) -> DbResult<DrawerStatus> {
        let mut conn = self.pool.acquire().await?;
        let head = Self::chain_head(&mut conn).await?;
        let open = drawer::is_open(head.as_ref().map(|e| e.operation));
        let balance_cents = head.map(|e| e.balance_cents).unwrap_or(0);

        let opened_at = if open {
            sqlx::query_scalar::<_, DateTime<Utc>>(
                "SELECT date FROM drawer_transactions \
                 WHERE operation = 'initialization' ORDER BY seq DESC LIMIT 1",
            )
            .fetch_optional(&mut *conn)
            .await?
        } else {
            None
        };

        Ok(DrawerStatus {
            open,
            opened_at,
            balance_cents,
        })
    }

    /// Expected-vs-actual summary for the current drawer period.
    ///
    /// The period runs from the most recent `initialization` to the chain
    /// head. An empty ledger reconciles to all zeros.
    pub async fn reconciliation(&self) -> DbResult<Reconciliation> {
        let period = sqlx::query_as::<_, DrawerTransaction>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM drawer_transactions \
             WHERE seq >= COALESCE((SELECT MAX(seq) FROM drawer_transactions \
                                    WHERE operation = 'initialization'), 0) \
             ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(drawer::reconcile(&period))
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use tillpoint_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn open_drawer(db: &Database, float_cents: i64) {
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(float_cents)),
                Some("Opening float".to_string()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_reflects_in_balance_and_history() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;

        // Add 5000 cents with a reason.
        let entry = db
            .drawer()
            .append(
                DrawerOperation::Add,
                Some(Money::from_cents(5_000)),
                Some("till top-up".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(entry.previous_balance_cents, 10_000);
        assert_eq!(entry.balance_cents, 15_000);
        assert_eq!(db.drawer().balance().await.unwrap(), 15_000);

        // Newest history entry chains correctly.
        let history = db.drawer().history(50).await.unwrap();
        assert_eq!(history[0].id, entry.id);
        assert_eq!(history[0].operation, DrawerOperation::Add);
        assert_eq!(history[0].amount_cents, 5_000);
        assert_eq!(history[0].notes.as_deref(), Some("till top-up"));
    }

    #[tokio::test]
    async fn operations_rejected_while_closed() {
        let db = test_db().await;

        let err = db
            .drawer()
            .append(DrawerOperation::Add, Some(Money::from_cents(100)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::DrawerClosed)));

        // Rollback: nothing was persisted.
        assert_eq!(db.drawer().balance().await.unwrap(), 0);
        assert!(db.drawer().history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_zeroes_and_next_period_starts_fresh() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;

        let close = db
            .drawer()
            .append(DrawerOperation::Close, None, None)
            .await
            .unwrap();
        assert_eq!(close.amount_cents, 10_000);
        assert_eq!(close.balance_cents, 0);

        let status = db.drawer().status().await.unwrap();
        assert!(!status.open);

        // Re-initialization deposits the new float on top of zero.
        open_drawer(&db, 7_500).await;
        assert_eq!(db.drawer().balance().await.unwrap(), 7_500);
        let status = db.drawer().status().await.unwrap();
        assert!(status.open);
        assert!(status.opened_at.is_some());
    }

    #[tokio::test]
    async fn remove_cannot_overdraw() {
        let db = test_db().await;
        open_drawer(&db, 5_000).await;

        let err = db
            .drawer()
            .append(DrawerOperation::Remove, Some(Money::from_cents(8_000)), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientFunds {
                available: 5_000,
                requested: 8_000
            })
        ));
        assert_eq!(db.drawer().balance().await.unwrap(), 5_000);
    }

    #[tokio::test]
    async fn count_sets_balance_and_reconciliation_shows_difference() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;

        db.drawer()
            .append(DrawerOperation::Count, Some(Money::from_cents(9_900)), None)
            .await
            .unwrap();
        assert_eq!(db.drawer().balance().await.unwrap(), 9_900);

        let summary = db.drawer().reconciliation().await.unwrap();
        assert_eq!(summary.expected_cents, 10_000);
        assert_eq!(summary.current_cents, 9_900);
        assert_eq!(summary.difference_cents, -100);
    }

    #[tokio::test]
    async fn reconciliation_covers_only_current_period() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;
        db.drawer()
            .append(DrawerOperation::Close, None, None)
            .await
            .unwrap();
        open_drawer(&db, 2_000).await;
        db.drawer()
            .append(DrawerOperation::Add, Some(Money::from_cents(500)), None)
            .await
            .unwrap();

        let summary = db.drawer().reconciliation().await.unwrap();
        assert_eq!(summary.opening_cents, 2_000);
        assert_eq!(summary.added_cents, 500);
        assert_eq!(summary.expected_cents, 2_500);
        assert_eq!(summary.difference_cents, 0);
    }
}
