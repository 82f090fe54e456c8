//! # Settings Repository
//!
//! The business profile is a single row (id = 1) seeded by the initial
//! migration, so reads never miss and writes are plain UPDATEs.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tillpoint_core::BusinessProfile;

/// Fields accepted by the settings form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfileInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub receipt_header: Option<String>,
    pub receipt_footer: Option<String>,
    pub logo_url: Option<String>,
}

/// Repository for the business profile row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the business profile.
    pub async fn get(&self) -> DbResult<BusinessProfile> {
        let profile = sqlx::query_as::<_, BusinessProfile>(
            "SELECT name, address, phone, email, receipt_header, receipt_footer, \
             logo_url, updated_at FROM business_profile WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Replaces the business profile.
    pub async fn update(&self, input: BusinessProfileInput) -> DbResult<BusinessProfile> {
        debug!(name = %input.name, "Updating business profile");

        sqlx::query(
            r#"
            UPDATE business_profile SET
                name = ?1, address = ?2, phone = ?3, email = ?4,
                receipt_header = ?5, receipt_footer = ?6, logo_url = ?7,
                updated_at = ?8
            WHERE id = 1
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.receipt_header)
        .bind(&input.receipt_footer)
        .bind(&input.logo_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get().await
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn seeded_profile_exists_and_updates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let profile = db.settings().get().await.unwrap();
        assert_eq!(profile.name, "My Business");

        let updated = db
            .settings()
            .update(BusinessProfileInput {
                name: "Khan Auto Parts".to_string(),
                address: Some("12 Mall Road".to_string()),
                phone: None,
                email: None,
                receipt_header: Some("Khan Auto Parts".to_string()),
                receipt_footer: Some("Thank you!".to_string()),
                logo_url: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Khan Auto Parts");
        assert_eq!(updated.receipt_footer.as_deref(), Some("Thank you!"));
    }
}
