//! # Inventory Repository
//!
//! Inventory CRUD, server-driven filtering, aggregate statistics, and
//! faceted lookups.
//!
//! ## Server-Driven Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                GET /inventory?category=...&search=...                   │
//! │                                                                         │
//! │  Structured filters (category, brand, supplier, vehicle) and           │
//! │  free-text search run in SQL; the derived stock-status filter runs     │
//! │  over the fetched rows because status is computed, never stored.       │
//! │                                                                         │
//! │  The response carries the filtered rows PLUS the aggregate stats       │
//! │  recomputed over exactly those rows, so the header numbers always      │
//! │  match the table beneath them.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tillpoint_core::{InventoryItem, StockStatus};

const ITEM_COLUMNS: &str = "id, name, sku, category, subcategory, subcategory2, \
     brand, supplier, vehicle, price_cents, purchase_price_cents, stock, \
     reorder_level, location, unit, tags, image_url, expiry_date, \
     created_at, updated_at";

/// Fields accepted when creating or updating an inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub subcategory2: Option<String>,
    pub brand: Option<String>,
    pub supplier: Option<String>,
    pub vehicle: Option<String>,
    pub price_cents: i64,
    pub purchase_price_cents: Option<i64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub reorder_level: i64,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// List filters for the inventory endpoint. All optional and combinable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    /// Free-text match against name, SKU, brand, and tags.
    pub search: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub subcategory2: Option<String>,
    pub brand: Option<String>,
    pub vehicle: Option<String>,
    pub supplier: Option<String>,
    /// Derived-status filter, applied after the SQL filters.
    pub status: Option<StockStatus>,
}

/// Aggregate statistics recomputed over a filtered result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: i64,
    /// Retail valuation: Σ price × stock over the filtered rows.
    pub total_stock_value_cents: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
}

/// A filtered inventory listing with matching statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPage {
    pub items: Vec<InventoryItem>,
    pub stats: InventoryStats,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Creates an inventory item. Duplicate SKUs are rejected by the unique
    /// index and surface as [`DbError::UniqueViolation`].
    pub async fn create(&self, input: InventoryInput) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            sku: input.sku,
            category: input.category,
            subcategory: input.subcategory,
            subcategory2: input.subcategory2,
            brand: input.brand,
            supplier: input.supplier,
            vehicle: input.vehicle,
            price_cents: input.price_cents,
            purchase_price_cents: input.purchase_price_cents,
            stock: input.stock,
            reorder_level: input.reorder_level,
            location: input.location,
            unit: input.unit,
            tags: input.tags,
            image_url: input.image_url,
            expiry_date: input.expiry_date,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, sku = %item.sku, "Creating inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, sku, category, subcategory, subcategory2,
                brand, supplier, vehicle, price_cents, purchase_price_cents,
                stock, reorder_level, location, unit, tags, image_url,
                expiry_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category)
        .bind(&item.subcategory)
        .bind(&item.subcategory2)
        .bind(&item.brand)
        .bind(&item.supplier)
        .bind(&item.vehicle)
        .bind(item.price_cents)
        .bind(item.purchase_price_cents)
        .bind(item.stock)
        .bind(item.reorder_level)
        .bind(&item.location)
        .bind(&item.unit)
        .bind(&item.tags)
        .bind(&item.image_url)
        .bind(item.expiry_date)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Updates an inventory item by id (full replace of editable fields).
    pub async fn update(&self, id: &str, input: InventoryInput) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?2, sku = ?3, category = ?4, subcategory = ?5,
                subcategory2 = ?6, brand = ?7, supplier = ?8, vehicle = ?9,
                price_cents = ?10, purchase_price_cents = ?11, stock = ?12,
                reorder_level = ?13, location = ?14, unit = ?15, tags = ?16,
                image_url = ?17, expiry_date = ?18, updated_at = ?19
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.category)
        .bind(&input.subcategory)
        .bind(&input.subcategory2)
        .bind(&input.brand)
        .bind(&input.supplier)
        .bind(&input.vehicle)
        .bind(input.price_cents)
        .bind(input.purchase_price_cents)
        .bind(input.stock)
        .bind(input.reorder_level)
        .bind(&input.location)
        .bind(&input.unit)
        .bind(&input.tags)
        .bind(&input.image_url)
        .bind(input.expiry_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }
        self.get(id).await
    }

    /// Deletes an inventory item by id.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }
        Ok(())
    }

    /// Gets an inventory item by id.
    pub async fn get(&self, id: &str) -> DbResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory item", id))
    }

    // =========================================================================
    // Stock Updates
    // =========================================================================

    /// Adjusts stock by a delta, clamped at zero.
    ///
    /// Distinct from a full edit so barcode-scan receiving flows can touch
    /// nothing but the count.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<InventoryItem> {
        let result = sqlx::query(
            "UPDATE inventory_items \
             SET stock = MAX(0, stock + ?2), updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }
        self.get(id).await
    }

    /// Sets the absolute stock count (physical recount).
    pub async fn set_stock(&self, id: &str, stock: i64) -> DbResult<InventoryItem> {
        let result = sqlx::query(
            "UPDATE inventory_items SET stock = MAX(0, ?2), updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }
        self.get(id).await
    }

    // =========================================================================
    // Listing & Stats
    // =========================================================================

    /// Lists items matching the filter, with statistics recomputed over the
    /// result set.
    pub async fn list(&self, filter: InventoryFilter) -> DbResult<InventoryPage> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));

        let mut items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE (?1 IS NULL OR name LIKE ?1 OR sku LIKE ?1 \
                    OR brand LIKE ?1 OR tags LIKE ?1) \
               AND (?2 IS NULL OR category = ?2) \
               AND (?3 IS NULL OR subcategory = ?3) \
               AND (?4 IS NULL OR subcategory2 = ?4) \
               AND (?5 IS NULL OR brand = ?5) \
               AND (?6 IS NULL OR vehicle = ?6) \
               AND (?7 IS NULL OR supplier = ?7) \
             ORDER BY name"
        ))
        .bind(search)
        .bind(filter.category)
        .bind(filter.subcategory)
        .bind(filter.subcategory2)
        .bind(filter.brand)
        .bind(filter.vehicle)
        .bind(filter.supplier)
        .fetch_all(&self.pool)
        .await?;

        // The status facet is derived from stock vs reorder level, so it
        // filters the fetched rows rather than the SQL.
        if let Some(status) = filter.status {
            items.retain(|item| item.stock_status() == status);
        }

        let stats = InventoryStats {
            total_items: items.len() as i64,
            total_stock_value_cents: items.iter().map(|i| i.stock_value().cents()).sum(),
            low_stock_count: items
                .iter()
                .filter(|i| i.stock_status() == StockStatus::LowStock)
                .count() as i64,
            out_of_stock_count: items
                .iter()
                .filter(|i| i.stock_status() == StockStatus::OutOfStock)
                .count() as i64,
        };

        Ok(InventoryPage { items, stats })
    }

    // =========================================================================
    // Facets
    // =========================================================================

    /// Distinct non-empty categories, alphabetical.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        self.distinct_values("category").await
    }

    /// Distinct subcategories, optionally limited to one category.
    pub async fn subcategories(&self, category: Option<&str>) -> DbResult<Vec<String>> {
        match category {
            Some(parent) => {
                let values = sqlx::query_scalar::<_, String>(
                    "SELECT DISTINCT subcategory FROM inventory_items \
                     WHERE subcategory IS NOT NULL AND subcategory != '' \
                       AND category = ?1 ORDER BY subcategory",
                )
                .bind(parent)
                .fetch_all(&self.pool)
                .await?;
                Ok(values)
            }
            None => self.distinct_values("subcategory").await,
        }
    }

    /// Distinct second-level subcategories, optionally limited to one
    /// subcategory.
    pub async fn subcategories2(&self, subcategory: Option<&str>) -> DbResult<Vec<String>> {
        match subcategory {
            Some(parent) => {
                let values = sqlx::query_scalar::<_, String>(
                    "SELECT DISTINCT subcategory2 FROM inventory_items \
                     WHERE subcategory2 IS NOT NULL AND subcategory2 != '' \
                       AND subcategory = ?1 ORDER BY subcategory2",
                )
                .bind(parent)
                .fetch_all(&self.pool)
                .await?;
                Ok(values)
            }
            None => self.distinct_values("subcategory2").await,
        }
    }

    /// Distinct brands.
    pub async fn brands(&self) -> DbResult<Vec<String>> {
        self.distinct_values("brand").await
    }

    /// Distinct vehicle fitments.
    pub async fn vehicles(&self) -> DbResult<Vec<String>> {
        self.distinct_values("vehicle").await
    }

    /// Distinct suppliers.
    pub async fn suppliers(&self) -> DbResult<Vec<String>> {
        self.distinct_values("supplier").await
    }

    async fn distinct_values(&self, column: &str) -> DbResult<Vec<String>> {
        // `column` is always one of our own identifiers, never user input.
        let values = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT {column} FROM inventory_items \
             WHERE {column} IS NOT NULL AND {column} != '' ORDER BY {column}"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn item(name: &str, sku: &str) -> InventoryInput {
        InventoryInput {
            name: name.to_string(),
            sku: sku.to_string(),
            category: Some("Filters".to_string()),
            subcategory: Some("Oil".to_string()),
            subcategory2: None,
            brand: Some("Bosch".to_string()),
            supplier: None,
            vehicle: Some("Corolla".to_string()),
            price_cents: 2_500,
            purchase_price_cents: Some(1_500),
            stock: 10,
            reorder_level: 3,
            location: None,
            unit: Some("pc".to_string()),
            tags: None,
            image_url: None,
            expiry_date: None,
        }
    }

    #[tokio::test]
    async fn duplicate_sku_rejected() {
        let db = test_db().await;
        db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();

        let err = db
            .inventory()
            .create(item("Another Filter", "OF-100"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn list_recomputes_stats_over_filtered_rows() {
        let db = test_db().await;
        db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();

        let mut low = item("Air Filter", "AF-200");
        low.stock = 2; // at or below reorder level 3
        db.inventory().create(low).await.unwrap();

        let mut out = item("Fuel Filter", "FF-300");
        out.stock = 0;
        out.brand = Some("Mann".to_string());
        db.inventory().create(out).await.unwrap();

        let page = db.inventory().list(InventoryFilter::default()).await.unwrap();
        assert_eq!(page.stats.total_items, 3);
        assert_eq!(page.stats.low_stock_count, 1);
        assert_eq!(page.stats.out_of_stock_count, 1);
        // 10×2500 + 2×2500 + 0×2500
        assert_eq!(page.stats.total_stock_value_cents, 30_000);

        // Brand filter narrows both the rows and the stats.
        let page = db
            .inventory()
            .list(InventoryFilter {
                brand: Some("Bosch".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.stats.total_items, 2);
        assert_eq!(page.stats.out_of_stock_count, 0);
    }

    #[tokio::test]
    async fn status_filter_applies_to_derived_status() {
        let db = test_db().await;
        db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();
        let mut low = item("Air Filter", "AF-200");
        low.stock = 1;
        db.inventory().create(low).await.unwrap();

        let page = db
            .inventory()
            .list(InventoryFilter {
                status: Some(StockStatus::LowStock),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].sku, "AF-200");
    }

    #[tokio::test]
    async fn search_matches_name_and_sku() {
        let db = test_db().await;
        db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();
        db.inventory().create(item("Brake Pad", "BP-900")).await.unwrap();

        let page = db
            .inventory()
            .list(InventoryFilter {
                search: Some("oil".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);

        let page = db
            .inventory()
            .list(InventoryFilter {
                search: Some("BP-9".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Brake Pad");
    }

    #[tokio::test]
    async fn stock_adjustments_clamp_at_zero() {
        let db = test_db().await;
        let created = db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();

        let updated = db.inventory().adjust_stock(&created.id, -4).await.unwrap();
        assert_eq!(updated.stock, 6);

        let updated = db.inventory().adjust_stock(&created.id, -100).await.unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.stock_status(), StockStatus::OutOfStock);

        let updated = db.inventory().set_stock(&created.id, 25).await.unwrap();
        assert_eq!(updated.stock, 25);
    }

    #[tokio::test]
    async fn facets_filter_by_parent() {
        let db = test_db().await;
        db.inventory().create(item("Oil Filter", "OF-100")).await.unwrap();

        let mut other = item("Wiper Blade", "WB-400");
        other.category = Some("Exterior".to_string());
        other.subcategory = Some("Wipers".to_string());
        db.inventory().create(other).await.unwrap();

        assert_eq!(
            db.inventory().categories().await.unwrap(),
            vec!["Exterior".to_string(), "Filters".to_string()]
        );
        assert_eq!(
            db.inventory().subcategories(Some("Filters")).await.unwrap(),
            vec!["Oil".to_string()]
        );
    }
}
