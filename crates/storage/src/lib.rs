pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod record;

use std::sync::Arc;

use async_trait::async_trait;
use leadsync_core::config::{StoreBackend, StoreConfig};
use tracing::info;

pub use error::StoreError;
pub use file::JsonFileLeadStore;
pub use memory::MemoryLeadStore;
pub use postgres::PgLeadStore;
pub use record::{StoredLead, IDENTITY_FIELD};

/// Persistence for CRM lead records.
///
/// Implementations must make `upsert` atomic per record: a reader sees either
/// the previous document or the new one, never a mix.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError>;

    /// Look a record up by its call-center identity (`sourceId`), whatever
    /// its storage key happens to be.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError>;

    /// Insert or replace the record stored under `lead.id`. `created_at` of an
    /// existing record is kept.
    async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<StoredLead>, StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Open the store selected by `STORE_BACKEND`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn LeadStore>, StoreError> {
    let store: Arc<dyn LeadStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryLeadStore::new()),
        StoreBackend::File => Arc::new(JsonFileLeadStore::new(&config.data_dir)?),
        StoreBackend::Postgres => {
            let url = config
                .pg_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    StoreError::Unavailable("STORE_BACKEND=postgres but PG_URL is not set".into())
                })?;
            Arc::new(PgLeadStore::connect(url, config.pg_max_connections).await?)
        }
    };
    info!(backend = store.backend_name(), "lead store opened");
    Ok(store)
}
