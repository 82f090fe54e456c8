//! # Sale Repository
//!
//! POS sale completion and receipt bookkeeping.
//!
//! ## Sale Completion (single transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      complete_sale(input)                               │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │    1. Load each cart item; verify stock covers quantity                │
//! │       └── short stock → InsufficientStock, ROLLBACK                    │
//! │    2. Rebuild totals server-side (subtotal, clamped discount, total)   │
//! │    3. Cash tender: change = cash − total (cash < total rejected)       │
//! │    4. UPDATE stock per line                                            │
//! │    5. Allocate receipt number (daily counter)                          │
//! │    6. INSERT sale + line snapshots (frozen sku/name/price)             │
//! │    7. Cash tender: DrawerRepository::append_in_tx('sale')              │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure leaves stock, sales, and the drawer ledger untouched.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `mark_printed` is deliberately separate and best-effort; the front end
//! calls it after the print dialog and ignores failures.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::drawer::DrawerRepository;
use tillpoint_core::cart::{change_due, Cart};
use tillpoint_core::error::ValidationError;
use tillpoint_core::{
    CoreError, DrawerOperation, Money, PaymentMethod, Sale, SaleLine,
};

const SALE_COLUMNS: &str = "id, receipt_number, customer_name, subtotal_cents, \
     discount_cents, total_cents, payment_method, cash_received_cents, \
     change_cents, printed, created_at";

const LINE_COLUMNS: &str = "id, sale_id, item_id, sku_snapshot, name_snapshot, \
     unit_price_cents, quantity, line_total_cents";

/// One requested cart line. Quantities are merged per item id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub item_id: String,
    pub quantity: i64,
}

/// A sale completion request.
///
/// Prices are NOT taken from the client; the server snapshots them from
/// inventory inside the transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    pub lines: Vec<SaleLineInput>,
    #[serde(default)]
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    /// Required for cash tenders.
    pub cash_received_cents: Option<i64>,
    pub customer_name: Option<String>,
}

/// A completed sale with its line snapshots.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSale {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Completes a sale in a single transaction.
    pub async fn complete_sale(&self, input: SaleInput) -> DbResult<CompletedSale> {
        if input.lines.is_empty() {
            return Err(DbError::Rule(CoreError::Validation(
                ValidationError::Required {
                    field: "lines".to_string(),
                },
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Rebuild the cart from inventory rows so prices and names are
        // authoritative (snapshot pattern).
        let mut cart = Cart::new();
        for line in &input.lines {
            let item: Option<(String, String, i64, i64)> = sqlx::query_as(
                "SELECT sku, name, price_cents, stock FROM inventory_items WHERE id = ?1",
            )
            .bind(&line.item_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (sku, name, price_cents, stock) = item
                .ok_or_else(|| DbError::not_found("Inventory item", line.item_id.clone()))?;

            cart.add_item(&line.item_id, &sku, &name, price_cents, line.quantity)?;

            let requested: i64 = cart
                .lines
                .iter()
                .find(|l| l.item_id == line.item_id)
                .map(|l| l.quantity)
                .unwrap_or(0);
            if requested > stock {
                return Err(DbError::Rule(CoreError::InsufficientStock {
                    sku,
                    available: stock,
                    requested,
                }));
            }
        }

        let totals = cart.totals(Money::from_cents(input.discount_cents));

        // Cash handling: reject short tenders before any write.
        let (cash_received_cents, change_cents) = match input.payment_method {
            PaymentMethod::Cash => {
                let received = input.cash_received_cents.ok_or_else(|| {
                    DbError::Rule(CoreError::Validation(ValidationError::Required {
                        field: "cashReceivedCents".to_string(),
                    }))
                })?;
                let change = change_due(
                    Money::from_cents(totals.total_cents),
                    Money::from_cents(received),
                )?;
                (Some(received), Some(change.cents()))
            }
            _ => (None, None),
        };

        // Decrement stock per merged line.
        for line in &cart.lines {
            sqlx::query(
                "UPDATE inventory_items \
                 SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let receipt_number = Self::allocate_receipt_number(&mut tx).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            receipt_number,
            customer_name: input.customer_name,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            total_cents: totals.total_cents,
            payment_method: input.payment_method,
            cash_received_cents,
            change_cents,
            printed: false,
            created_at: now,
        };

        debug!(
            id = %sale.id,
            receipt = %sale.receipt_number,
            total_cents = sale.total_cents,
            "Completing sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, customer_name, subtotal_cents,
                discount_cents, total_cents, payment_method,
                cash_received_cents, change_cents, printed, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(&sale.customer_name)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.cash_received_cents)
        .bind(sale.change_cents)
        .bind(sale.printed)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let snapshot = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                item_id: line.item_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total_cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, item_id, sku_snapshot, name_snapshot,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&snapshot.id)
            .bind(&snapshot.sale_id)
            .bind(&snapshot.item_id)
            .bind(&snapshot.sku_snapshot)
            .bind(&snapshot.name_snapshot)
            .bind(snapshot.unit_price_cents)
            .bind(snapshot.quantity)
            .bind(snapshot.line_total_cents)
            .execute(&mut *tx)
            .await?;

            lines.push(snapshot);
        }

        // Cash tenders move through the drawer; other methods never touch it.
        if sale.payment_method.affects_drawer() {
            DrawerRepository::append_in_tx(
                &mut tx,
                DrawerOperation::Sale,
                Some(Money::from_cents(sale.total_cents)),
                Some(format!("Sale {}", sale.receipt_number)),
                Some(sale.id.clone()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(CompletedSale { sale, lines })
    }

    /// Allocates the next receipt number: `YYYYMMDD-NNNN` with a per-day
    /// counter. Runs inside the sale transaction so two concurrent sales
    /// cannot draw the same number.
    async fn allocate_receipt_number(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    ) -> DbResult<String> {
        let date_part = Utc::now().format("%Y%m%d").to_string();
        let today_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE receipt_number LIKE ?1",
        )
        .bind(format!("{date_part}-%"))
        .fetch_one(&mut **tx)
        .await?;

        Ok(format!("{date_part}-{:04}", today_count + 1))
    }

    /// Marks a sale's receipt as printed. Best-effort from the caller's
    /// point of view; failures here never undo the sale.
    pub async fn mark_printed(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET printed = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }

    /// Gets a sale with its line snapshots.
    pub async fn get(&self, id: &str) -> DbResult<CompletedSale> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CompletedSale { sale, lines })
    }

    /// Recent sales, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::inventory::InventoryInput;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, name: &str, sku: &str, price_cents: i64, stock: i64) -> String {
        let item = db
            .inventory()
            .create(InventoryInput {
                name: name.to_string(),
                sku: sku.to_string(),
                category: None,
                subcategory: None,
                subcategory2: None,
                brand: None,
                supplier: None,
                vehicle: None,
                price_cents,
                purchase_price_cents: None,
                stock,
                reorder_level: 0,
                location: None,
                unit: None,
                tags: None,
                image_url: None,
                expiry_date: None,
            })
            .await
            .unwrap();
        item.id
    }

    async fn open_drawer(db: &Database, float_cents: i64) {
        db.drawer()
            .append(
                DrawerOperation::Initialization,
                Some(Money::from_cents(float_cents)),
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cash_checkout_end_to_end() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;
        let a = seed_item(&db, "Widget", "W-1", 10_000, 5).await;
        let b = seed_item(&db, "Gadget", "G-1", 5_000, 5).await;

        // Cart [{100.00 × 2}, {50.00 × 1}], discount 20.00, cash 250.00
        let completed = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![
                    SaleLineInput { item_id: a.clone(), quantity: 2 },
                    SaleLineInput { item_id: b.clone(), quantity: 1 },
                ],
                discount_cents: 2_000,
                payment_method: PaymentMethod::Cash,
                cash_received_cents: Some(25_000),
                customer_name: Some("Walk-in".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(completed.sale.subtotal_cents, 25_000);
        assert_eq!(completed.sale.total_cents, 23_000);
        assert_eq!(completed.sale.change_cents, Some(2_000));
        assert_eq!(completed.lines.len(), 2);
        assert!(!completed.sale.printed);

        // Stock decremented.
        assert_eq!(db.inventory().get(&a).await.unwrap().stock, 3);
        assert_eq!(db.inventory().get(&b).await.unwrap().stock, 4);

        // Drawer credited with the total, referencing the sale.
        assert_eq!(db.drawer().balance().await.unwrap(), 33_000);
        let head = db.drawer().history(1).await.unwrap();
        assert_eq!(head[0].operation, DrawerOperation::Sale);
        assert_eq!(head[0].reference_id.as_deref(), Some(completed.sale.id.as_str()));
    }

    #[tokio::test]
    async fn short_cash_rejected_before_any_write() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;
        let a = seed_item(&db, "Widget", "W-1", 10_000, 5).await;

        let err = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![SaleLineInput { item_id: a.clone(), quantity: 1 }],
                discount_cents: 0,
                payment_method: PaymentMethod::Cash,
                cash_received_cents: Some(9_000),
                customer_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InsufficientCash { .. })));

        assert_eq!(db.inventory().get(&a).await.unwrap().stock, 5);
        assert_eq!(db.drawer().balance().await.unwrap(), 10_000);
        assert!(db.sales().list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_aborts_sale() {
        let db = test_db().await;
        open_drawer(&db, 10_000).await;
        let a = seed_item(&db, "Widget", "W-1", 10_000, 2).await;

        let err = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![SaleLineInput { item_id: a.clone(), quantity: 3 }],
                discount_cents: 0,
                payment_method: PaymentMethod::Cash,
                cash_received_cents: Some(50_000),
                customer_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(db.inventory().get(&a).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn card_sale_skips_drawer_and_works_while_closed() {
        let db = test_db().await;
        let a = seed_item(&db, "Widget", "W-1", 10_000, 5).await;

        let completed = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![SaleLineInput { item_id: a, quantity: 1 }],
                discount_cents: 0,
                payment_method: PaymentMethod::CreditCard,
                cash_received_cents: None,
                customer_name: None,
            })
            .await
            .unwrap();

        assert_eq!(completed.sale.cash_received_cents, None);
        assert_eq!(completed.sale.change_cents, None);
        assert_eq!(db.drawer().balance().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn receipt_numbers_count_up_within_a_day() {
        let db = test_db().await;
        let a = seed_item(&db, "Widget", "W-1", 1_000, 10).await;

        let mut receipts = Vec::new();
        for _ in 0..2 {
            let sale = db
                .sales()
                .complete_sale(SaleInput {
                    lines: vec![SaleLineInput { item_id: a.clone(), quantity: 1 }],
                    discount_cents: 0,
                    payment_method: PaymentMethod::Other,
                    cash_received_cents: None,
                    customer_name: None,
                })
                .await
                .unwrap();
            receipts.push(sale.sale.receipt_number);
        }

        assert!(receipts[0].ends_with("-0001"));
        assert!(receipts[1].ends_with("-0002"));
    }

    #[tokio::test]
    async fn mark_printed_flips_flag() {
        let db = test_db().await;
        let a = seed_item(&db, "Widget", "W-1", 1_000, 10).await;
        let sale = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![SaleLineInput { item_id: a, quantity: 1 }],
                discount_cents: 0,
                payment_method: PaymentMethod::Other,
                cash_received_cents: None,
                customer_name: None,
            })
            .await
            .unwrap();

        db.sales().mark_printed(&sale.sale.id).await.unwrap();
        assert!(db.sales().get(&sale.sale.id).await.unwrap().sale.printed);
    }

    #[tokio::test]
    async fn duplicate_line_ids_merge_before_stock_check() {
        let db = test_db().await;
        let a = seed_item(&db, "Widget", "W-1", 1_000, 3).await;

        let err = db
            .sales()
            .complete_sale(SaleInput {
                lines: vec![
                    SaleLineInput { item_id: a.clone(), quantity: 2 },
                    SaleLineInput { item_id: a, quantity: 2 },
                ],
                discount_cents: 0,
                payment_method: PaymentMethod::Other,
                cash_received_cents: None,
                customer_name: None,
            })
            .await
            .unwrap_err();
        // Merged quantity 4 exceeds stock 3.
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { requested: 4, .. })
        ));
    }
}
