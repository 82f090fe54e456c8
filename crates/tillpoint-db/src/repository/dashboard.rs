//! # Dashboard Repository
//!
//! Read-only aggregations backing the dashboard endpoints. Every method is
//! a straight SELECT; nothing here mutates state.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::error::DbResult;

/// Today-at-a-glance numbers for the dashboard header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub sales_today_cents: i64,
    pub sales_today_count: i64,
    pub expenses_today_cents: i64,
    /// sales − expenses for the day.
    pub profit_today_cents: i64,
    pub drawer_balance_cents: i64,
}

/// One category's share of spending over a range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total_cents: i64,
    pub count: i64,
}

/// One day's sales/expenses/profit inside a period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub day: NaiveDate,
    pub sales_cents: i64,
    pub expenses_cents: i64,
    pub profit_cents: i64,
}

/// Purchase-price valuation of the stock on hand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetPurchase {
    /// Σ purchase_price × stock over items with a known purchase price.
    pub total_cents: i64,
    pub items_with_purchase_price: i64,
}

/// Repository for dashboard aggregation queries.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    /// Creates a new DashboardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Today's headline numbers.
    pub async fn summary(&self) -> DbResult<DashboardSummary> {
        let (sales_cents, sales_count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_cents), 0), COUNT(*) FROM sales \
             WHERE date(created_at) = date('now')",
        )
        .fetch_one(&self.pool)
        .await?;

        let expenses_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses \
             WHERE expense_date = date('now')",
        )
        .fetch_one(&self.pool)
        .await?;

        let drawer_balance: Option<i64> = sqlx::query_scalar(
            "SELECT balance_cents FROM drawer_transactions ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(DashboardSummary {
            sales_today_cents: sales_cents,
            sales_today_count: sales_count,
            expenses_today_cents: expenses_cents,
            profit_today_cents: sales_cents - expenses_cents,
            drawer_balance_cents: drawer_balance.unwrap_or(0),
        })
    }

    /// Spending grouped by category over an inclusive date range, largest
    /// first.
    pub async fn expenses_by_category(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<CategoryTotal>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT category, COALESCE(SUM(amount_cents), 0), COUNT(*) \
             FROM expenses \
             WHERE expense_date >= ?1 AND expense_date <= ?2 \
             GROUP BY category \
             ORDER BY SUM(amount_cents) DESC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category, total_cents, count)| CategoryTotal {
                category,
                total_cents,
                count,
            })
            .collect())
    }

    /// Per-day sales/expenses/profit between two dates (inclusive).
    ///
    /// Days with activity on only one side still appear; fully quiet days
    /// are omitted.
    pub async fn period_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<DaySummary>> {
        let sales: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT date(created_at) AS day, COALESCE(SUM(total_cents), 0) \
             FROM sales \
             WHERE date(created_at) >= ?1 AND date(created_at) <= ?2 \
             GROUP BY day",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let expenses: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT expense_date AS day, COALESCE(SUM(amount_cents), 0) \
             FROM expenses \
             WHERE expense_date >= ?1 AND expense_date <= ?2 \
             GROUP BY day",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for (day, cents) in sales {
            days.entry(day).or_default().0 = cents;
        }
        for (day, cents) in expenses {
            days.entry(day).or_default().1 = cents;
        }

        Ok(days
            .into_iter()
            .map(|(day, (sales_cents, expenses_cents))| DaySummary {
                day,
                sales_cents,
                expenses_cents,
                profit_cents: sales_cents - expenses_cents,
            })
            .collect())
    }

    /// Purchase-price valuation of current stock.
    pub async fn net_purchase(&self) -> DbResult<NetPurchase> {
        let (total_cents, items): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(purchase_price_cents * MAX(stock, 0)), 0), COUNT(*) \
             FROM inventory_items \
             WHERE purchase_price_cents IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(NetPurchase {
            total_cents,
            items_with_purchase_price: items,
        })
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================
