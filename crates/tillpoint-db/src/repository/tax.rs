//! # Tax Record Repository
//!
//! Tax record CRUD and payment posting.
//!
//! ## Payment Posting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 record_payment(id, amount, method)                      │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │    SELECT record                                                       │
//! │    validate_payment(amount, tax, paid)   ← core rule, property-checked │
//! │    paid += amount                                                      │
//! │    status = derive_payment_status(paid, tax)                           │
//! │    UPDATE record                                                       │
//! │    method == cash?                                                     │
//! │       └── DrawerRepository::append_in_tx('expense', ref: record id)    │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  A cash payment that would overdraw the drawer rolls everything back,  │
//! │  including the paid-amount update.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::drawer::DrawerRepository;
use tillpoint_core::tax;
use tillpoint_core::{
    DrawerOperation, Money, PaymentMethod, TaxPaymentStatus, TaxRecord, TaxType,
};

const TAX_COLUMNS: &str = "id, tax_type, taxable_amount_cents, tax_rate_bps, \
     tax_amount_cents, payment_status, paid_amount_cents, payment_date, \
     payment_method, period_start, period_end, reference, description, \
     is_manual_entry, is_final_assessment, created_at, updated_at";

/// Fields accepted when creating or updating a tax record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRecordInput {
    pub tax_type: TaxType,
    pub taxable_amount_cents: i64,
    /// Rate in basis points (1500 = 15%).
    pub tax_rate_bps: i64,
    /// When omitted, auto-computed as taxable × rate. Supplying a value
    /// overrides the computation (manual assessments).
    pub tax_amount_cents: Option<i64>,
    /// Explicit status edit; when omitted the status is derived from the
    /// paid amount.
    pub payment_status: Option<TaxPaymentStatus>,
    pub paid_amount_cents: Option<i64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_manual_entry: bool,
    #[serde(default)]
    pub is_final_assessment: bool,
}

/// Repository for tax record database operations.
#[derive(Debug, Clone)]
pub struct TaxRepository {
    pool: SqlitePool,
}

impl TaxRepository {
    /// Creates a new TaxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TaxRepository { pool }
    }

    /// Resolves amounts, status, and payment date from an input.
    ///
    /// Applies the same derivation the form runs: auto-compute the tax
    /// amount unless overridden, then either honor an explicit status edit
    /// (with its forced side effects) or derive the status from the paid
    /// amount.
    fn resolve(input: &TaxRecordInput, now: DateTime<Utc>) -> (i64, i64, TaxPaymentStatus, Option<DateTime<Utc>>) {
        let tax_amount = input.tax_amount_cents.unwrap_or_else(|| {
            tax::tax_amount(
                Money::from_cents(input.taxable_amount_cents),
                input.tax_rate_bps.clamp(0, 10_000) as u32,
            )
            .cents()
        });

        let paid = input.paid_amount_cents.unwrap_or(0).max(0);

        match input.payment_status {
            Some(status) => {
                let effects = tax::apply_status_change(
                    status,
                    Money::from_cents(tax_amount),
                    Money::from_cents(paid),
                    input.payment_date,
                    now,
                );
                (tax_amount, effects.paid_amount.cents(), status, effects.payment_date)
            }
            None => {
                let status = tax::derive_payment_status(
                    Money::from_cents(paid),
                    Money::from_cents(tax_amount),
                );
                (tax_amount, paid, status, input.payment_date)
            }
        }
    }

    /// Creates a tax record.
    pub async fn create(&self, input: TaxRecordInput) -> DbResult<TaxRecord> {
        let now = Utc::now();
        let (tax_amount, paid, status, payment_date) = Self::resolve(&input, now);

        let record = TaxRecord {
            id: Uuid::new_v4().to_string(),
            tax_type: input.tax_type,
            taxable_amount_cents: input.taxable_amount_cents,
            tax_rate_bps: input.tax_rate_bps,
            tax_amount_cents: tax_amount,
            payment_status: status,
            paid_amount_cents: paid,
            payment_date,
            payment_method: input.payment_method,
            period_start: input.period_start,
            period_end: input.period_end,
            reference: input.reference,
            description: input.description,
            is_manual_entry: input.is_manual_entry,
            is_final_assessment: input.is_final_assessment,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %record.id, tax_type = ?record.tax_type, "Creating tax record");

        sqlx::query(
            r#"
            INSERT INTO tax_records (
                id, tax_type, taxable_amount_cents, tax_rate_bps,
                tax_amount_cents, payment_status, paid_amount_cents,
                payment_date, payment_method, period_start, period_end,
                reference, description, is_manual_entry, is_final_assessment,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&record.id)
        .bind(record.tax_type)
        .bind(record.taxable_amount_cents)
        .bind(record.tax_rate_bps)
        .bind(record.tax_amount_cents)
        .bind(record.payment_status)
        .bind(record.paid_amount_cents)
        .bind(record.payment_date)
        .bind(record.payment_method)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(&record.reference)
        .bind(&record.description)
        .bind(record.is_manual_entry)
        .bind(record.is_final_assessment)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Updates a tax record by id with the same derivation rules as create.
    pub async fn update(&self, id: &str, input: TaxRecordInput) -> DbResult<TaxRecord> {
        let now = Utc::now();
        let (tax_amount, paid, status, payment_date) = Self::resolve(&input, now);

        let result = sqlx::query(
            r#"
            UPDATE tax_records SET
                tax_type = ?2,
                taxable_amount_cents = ?3,
                tax_rate_bps = ?4,
                tax_amount_cents = ?5,
                payment_status = ?6,
                paid_amount_cents = ?7,
                payment_date = ?8,
                payment_method = ?9,
                period_start = ?10,
                period_end = ?11,
                reference = ?12,
                description = ?13,
                is_manual_entry = ?14,
                is_final_assessment = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.tax_type)
        .bind(input.taxable_amount_cents)
        .bind(input.tax_rate_bps)
        .bind(tax_amount)
        .bind(status)
        .bind(paid)
        .bind(payment_date)
        .bind(input.payment_method)
        .bind(input.period_start)
        .bind(input.period_end)
        .bind(&input.reference)
        .bind(&input.description)
        .bind(input.is_manual_entry)
        .bind(input.is_final_assessment)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tax record", id));
        }
        self.get(id).await
    }

    /// Deletes a tax record by id.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tax_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tax record", id));
        }
        Ok(())
    }

    /// Gets a tax record by id.
    pub async fn get(&self, id: &str) -> DbResult<TaxRecord> {
        sqlx::query_as::<_, TaxRecord>(&format!(
            "SELECT {TAX_COLUMNS} FROM tax_records WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Tax record", id))
    }

    /// Lists tax records, newest period first.
    pub async fn list(&self) -> DbResult<Vec<TaxRecord>> {
        let records = sqlx::query_as::<_, TaxRecord>(&format!(
            "SELECT {TAX_COLUMNS} FROM tax_records ORDER BY period_end DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Posts a payment against a record.
    ///
    /// Rejected when the amount is not positive or exceeds the remaining
    /// balance. Cash payments debit the drawer in the same transaction.
    pub async fn record_payment(
        &self,
        id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> DbResult<TaxRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, TaxRecord>(&format!(
            "SELECT {TAX_COLUMNS} FROM tax_records WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Tax record", id))?;

        tax::validate_payment(
            amount,
            Money::from_cents(record.tax_amount_cents),
            Money::from_cents(record.paid_amount_cents),
        )?;

        let new_paid = record.paid_amount_cents + amount.cents();
        let status = tax::derive_payment_status(
            Money::from_cents(new_paid),
            Money::from_cents(record.tax_amount_cents),
        );

        debug!(
            id = %id,
            amount_cents = amount.cents(),
            new_paid_cents = new_paid,
            status = ?status,
            "Recording tax payment"
        );

        sqlx::query(
            r#"
            UPDATE tax_records SET
                paid_amount_cents = ?2,
                payment_status = ?3,
                payment_date = ?4,
                payment_method = ?5,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(new_paid)
        .bind(status)
        .bind(now)
        .bind(method)
        .execute(&mut *tx)
        .await?;

        if method.affects_drawer() {
            DrawerRepository::append_in_tx(
                &mut tx,
                DrawerOperation::Expense,
                Some(amount),
                Some("Tax payment".to_string()),
                Some(id.to_string()),
            )
            .await?;
        }

        tx.commit().await?;
        self.get(id).await
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

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sales_tax_input() -> TaxRecordInput {
        TaxRecordInput {
            tax_type: TaxType::SalesTax,
            taxable_amount_cents: 1_000_000,
            tax_rate_bps: 1_500,
            tax_amount_cents: None,
            payment_status: None,
            paid_amount_cents: None,
            payment_date: None,
            payment_method: None,
            period_start: d("2026-01-01"),
            period_end: d("2026-03-31"),
            reference: None,
            description: None,
            is_manual_entry: true,
            is_final_assessment: false,
        }
    }

    #[tokio::test]
    async fn tax_amount_auto_computed_until_overridden() {
        let db = test_db().await;

        // taxable 10000.00 at 15% → 1500.00, status derived as pending
        let record = db.taxes().create(sales_tax_input()).await.unwrap();
        assert_eq!(record.tax_amount_cents, 150_000);
        assert_eq!(record.payment_status, TaxPaymentStatus::Pending);

        // Manual override sticks.
        let overridden = db
            .taxes()
            .update(
                &record.id,
                TaxRecordInput {
                    tax_amount_cents: Some(140_000),
                    ..sales_tax_input()
                },
            )
            .await
            .unwrap();
        assert_eq!(overridden.tax_amount_cents, 140_000);
    }

    #[tokio::test]
    async fn payment_transitions_status() {
        let db = test_db().await;
        let record = db.taxes().create(sales_tax_input()).await.unwrap();

        let partial = db
            .taxes()
            .record_payment(&record.id, Money::from_cents(50_000), PaymentMethod::Check)
            .await
            .unwrap();
        assert_eq!(partial.paid_amount_cents, 50_000);
        assert_eq!(partial.payment_status, TaxPaymentStatus::PartiallyPaid);
        assert!(partial.payment_date.is_some());

        let paid = db
            .taxes()
            .record_payment(&record.id, Money::from_cents(100_000), PaymentMethod::Check)
            .await
            .unwrap();
        assert_eq!(paid.paid_amount_cents, 150_000);
        assert_eq!(paid.payment_status, TaxPaymentStatus::Paid);
    }

    #[tokio::test]
    async fn payment_above_remaining_rejected() {
        let db = test_db().await;
        let record = db.taxes().create(sales_tax_input()).await.unwrap();

        db.taxes()
            .record_payment(&record.id, Money::from_cents(100_000), PaymentMethod::Check)
            .await
            .unwrap();

        let err = db
            .taxes()
            .record_payment(&record.id, Money::from_cents(50_001), PaymentMethod::Check)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::PaymentExceedsRemaining { .. })
        ));

        // Paid amount unchanged.
        let record = db.taxes().get(&record.id).await.unwrap();
        assert_eq!(record.paid_amount_cents, 100_000);
    }

    #[tokio::test]
    async fn cash_payment_debits_drawer_atomically() {
        let db = test_db().await;
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(200_000)),
                None,
            )
            .await
            .unwrap();
        let record = db.taxes().create(sales_tax_input()).await.unwrap();

        db.taxes()
            .record_payment(&record.id, Money::from_cents(150_000), PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(db.drawer().balance().await.unwrap(), 50_000);
        let history = db.drawer().history(1).await.unwrap();
        assert_eq!(history[0].operation, DrawerOperation::Expense);
        assert_eq!(history[0].reference_id.as_deref(), Some(record.id.as_str()));
    }

    #[tokio::test]
    async fn cash_payment_rolls_back_when_drawer_short() {
        let db = test_db().await;
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(10_000)),
                None,
            )
            .await
            .unwrap();
        let record = db.taxes().create(sales_tax_input()).await.unwrap();

        let err = db
            .taxes()
            .record_payment(&record.id, Money::from_cents(150_000), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientFunds { .. })
        ));

        // The paid-amount update rolled back with the ledger entry.
        let record = db.taxes().get(&record.id).await.unwrap();
        assert_eq!(record.paid_amount_cents, 0);
        assert_eq!(record.payment_status, TaxPaymentStatus::Pending);
        assert_eq!(db.drawer().balance().await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn explicit_paid_status_forces_amounts() {
        let db = test_db().await;
        let record = db
            .taxes()
            .create(TaxRecordInput {
                payment_status: Some(TaxPaymentStatus::Paid),
                ..sales_tax_input()
            })
            .await
            .unwrap();

        assert_eq!(record.paid_amount_cents, record.tax_amount_cents);
        assert!(record.payment_date.is_some());
    }
}
