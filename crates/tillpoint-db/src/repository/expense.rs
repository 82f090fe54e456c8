//! # Expense Repository
//!
//! Expense CRUD plus the dynamic category list.
//!
//! ## Cash Expense Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Cash Expense → Drawer Entry (atomic)                       │
//! │                                                                         │
//! │  create(expense { payment_method: cash })                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │    INSERT expense                                                      │
//! │    INSERT OR IGNORE category          ← new names create categories    │
//! │    DrawerRepository::append_in_tx     ← 'expense' ledger entry         │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Overdraw or closed drawer rolls back the expense too: the expense     │
//! │  table and the ledger never disagree.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-cash expenses skip the ledger entirely.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::drawer::DrawerRepository;
use tillpoint_core::{DrawerOperation, Expense, ExpenseCategory, Money, PaymentMethod};

const EXPENSE_COLUMNS: &str = "id, category, amount_cents, payment_method, \
     expense_date, description, created_at, updated_at";

/// Fields accepted when creating or updating an expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub category: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    /// Defaults to today when omitted.
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// List filters for the expenses endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Creates an expense.
    ///
    /// Cash expenses additionally append a drawer `expense` entry in the
    /// same transaction; the drawer rules (open period, no overdraw) gate
    /// the whole operation.
    pub async fn create(&self, input: ExpenseInput) -> DbResult<Expense> {
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            category: input.category.clone(),
            amount_cents: input.amount_cents,
            payment_method: input.payment_method,
            expense_date: input.expense_date.unwrap_or_else(|| now.date_naive()),
            description: input.description,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %expense.id, category = %expense.category, "Creating expense");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, category, amount_cents, payment_method,
                expense_date, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.category)
        .bind(expense.amount_cents)
        .bind(expense.payment_method)
        .bind(expense.expense_date)
        .bind(&expense.description)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::ensure_category(&mut tx, &expense.category).await?;

        if expense.payment_method.affects_drawer() {
            DrawerRepository::append_in_tx(
                &mut tx,
                DrawerOperation::Expense,
                Some(Money::from_cents(expense.amount_cents)),
                Some(format!("Expense: {}", expense.category)),
                Some(expense.id.clone()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(expense)
    }

    /// Updates an expense by id. Does not retroactively adjust the ledger;
    /// drawer corrections are made with explicit drawer operations.
    pub async fn update(&self, id: &str, input: ExpenseInput) -> DbResult<Expense> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category = ?2,
                amount_cents = ?3,
                payment_method = ?4,
                expense_date = COALESCE(?5, expense_date),
                description = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.category)
        .bind(input.amount_cents)
        .bind(input.payment_method)
        .bind(input.expense_date)
        .bind(&input.description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Self::ensure_category(&mut tx, &input.category).await?;
        tx.commit().await?;

        self.get(id).await
    }

    /// Deletes an expense by id.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }
        Ok(())
    }

    /// Gets an expense by id.
    pub async fn get(&self, id: &str) -> DbResult<Expense> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Expense", id))
    }

    /// Lists expenses, newest first, with optional date-range and category
    /// filters.
    pub async fn list(&self, filter: ExpenseFilter) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE (?1 IS NULL OR expense_date >= ?1) \
               AND (?2 IS NULL OR expense_date <= ?2) \
               AND (?3 IS NULL OR category = ?3) \
             ORDER BY expense_date DESC, created_at DESC"
        ))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.category)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    /// All known categories, alphabetical, for the form dropdown.
    pub async fn categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, created_at FROM expense_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Creates the category if its name is new.
    async fn ensure_category(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        name: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO expense_categories (id, name, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tillpoint_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cash_expense(category: &str, amount_cents: i64) -> ExpenseInput {
        ExpenseInput {
            category: category.to_string(),
            amount_cents,
            payment_method: PaymentMethod::Cash,
            expense_date: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn cash_expense_debits_drawer_and_creates_category() {
        let db = test_db().await;
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(200_000)),
                None,
            )
            .await
            .unwrap();

        // 1200.00 rent paid in cash, category typed in fresh.
        let expense = db
            .expenses()
            .create(cash_expense("Rent", 120_000))
            .await
            .unwrap();

        assert_eq!(db.drawer().balance().await.unwrap(), 80_000);

        let history = db.drawer().history(1).await.unwrap();
        assert_eq!(history[0].operation, DrawerOperation::Expense);
        assert_eq!(history[0].amount_cents, 120_000);
        assert_eq!(history[0].reference_id.as_deref(), Some(expense.id.as_str()));

        let categories = db.expenses().categories().await.unwrap();
        assert!(categories.iter().any(|c| c.name == "Rent"));
    }

    #[tokio::test]
    async fn cash_expense_rolls_back_on_overdraw() {
        let db = test_db().await;
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(50_000)),
                None,
            )
            .await
            .unwrap();

        let err = db
            .expenses()
            .create(cash_expense("Rent", 120_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientFunds { .. })
        ));

        // Neither the expense nor the ledger entry survived.
        assert!(db.expenses().list(ExpenseFilter::default()).await.unwrap().is_empty());
        assert_eq!(db.drawer().balance().await.unwrap(), 50_000);
    }

    #[tokio::test]
    async fn non_cash_expense_skips_drawer() {
        let db = test_db().await;

        let input = ExpenseInput {
            payment_method: PaymentMethod::BankTransfer,
            ..cash_expense("Utilities", 30_000)
        };
        db.expenses().create(input).await.unwrap();

        // Works with the drawer closed; ledger untouched.
        assert_eq!(db.drawer().balance().await.unwrap(), 0);
        assert_eq!(
            db.expenses().list(ExpenseFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn list_filters_by_date_and_category() {
        let db = test_db().await;
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        for (category, date) in [
            ("Rent", "2026-01-05"),
            ("Rent", "2026-02-05"),
            ("Fuel", "2026-02-10"),
        ] {
            let input = ExpenseInput {
                payment_method: PaymentMethod::Other,
                expense_date: Some(d(date)),
                ..cash_expense(category, 1_000)
            };
            db.expenses().create(input).await.unwrap();
        }

        let filter = ExpenseFilter {
            start_date: Some(d("2026-02-01")),
            end_date: Some(d("2026-02-28")),
            category: Some("Rent".to_string()),
        };
        let results = db.expenses().list(filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].expense_date, d("2026-02-05"));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let db = test_db().await;
        let input = ExpenseInput {
            payment_method: PaymentMethod::Check,
            ..cash_expense("Supplies", 5_000)
        };
        let expense = db.expenses().create(input.clone()).await.unwrap();

        let updated = db
            .expenses()
            .update(
                &expense.id,
                ExpenseInput {
                    amount_cents: 7_500,
                    ..input
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount_cents, 7_500);

        db.expenses().delete(&expense.id).await.unwrap();
        assert!(matches!(
            db.expenses().get(&expense.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
