//! PostgreSQL lead store: one JSONB document per lead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::StoreError;
use crate::record::{StoredLead, IDENTITY_FIELD};
use crate::LeadStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS leads (
    id          TEXT PRIMARY KEY,
    data        JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_IDENTITY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS leads_source_id_idx ON leads ((data->>'sourceId'))";

#[derive(sqlx::FromRow)]
struct LeadRow {
    id: String,
    data: sqlx::types::Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRow> for StoredLead {
    fn from(row: LeadRow) -> Self {
        StoredLead {
            id: row.id,
            data: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    /// Connect and make sure the `leads` table exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("postgres connect failed: {}", e)))?;
        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        info!("PostgreSQL lead store ready");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        sqlx::query(CREATE_IDENTITY_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError> {
        let row = sqlx::query_as::<_, LeadRow>(
            "SELECT id, data, created_at, updated_at FROM leads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredLead::from))
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError> {
        let row = sqlx::query_as::<_, LeadRow>(
            "SELECT id, data, created_at, updated_at FROM leads
             WHERE data->>$1 = $2
             ORDER BY created_at
             LIMIT 1",
        )
        .bind(IDENTITY_FIELD)
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredLead::from))
    }

    async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError> {
        let id = lead.id.clone();
        sqlx::query(
            "INSERT INTO leads (id, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE
             SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
        )
        .bind(&lead.id)
        .bind(sqlx::types::Json(&lead.data))
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Record { message, .. } => StoreError::Record { id, message },
            other => other,
        })?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredLead>, StoreError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            "SELECT id, data, created_at, updated_at FROM leads ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StoredLead::from).collect())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
