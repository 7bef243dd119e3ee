//! JSON-file lead store at `{DATA_DIR}/leads.json`.
//!
//! The whole table is read, modified and rewritten per write. Writes go to a
//! temporary file first and are renamed into place, so a crash never leaves a
//! half-written table behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::record::StoredLead;
use crate::LeadStore;

pub struct JsonFileLeadStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileLeadStore {
    pub fn new(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {}", data_dir.display(), e))
        })?;
        Ok(Self {
            path: data_dir.join("leads.json"),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredLead>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Unavailable(format!("corrupt lead table {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, leads: &[StoredLead]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(leads)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = leads.len(), "lead table written");
        Ok(())
    }
}

#[async_trait]
impl LeadStore for JsonFileLeadStore {
    async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError> {
        Ok(self.load().await?.into_iter().find(|l| l.id == id))
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|l| l.identity() == Some(identity)))
    }

    async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut leads = self.load().await?;
        match leads.iter_mut().find(|l| l.id == lead.id) {
            Some(existing) => {
                existing.data = lead.data;
                existing.updated_at = lead.updated_at;
            }
            None => leads.push(lead),
        }
        self.save(&leads).await
    }

    async fn list(&self) -> Result<Vec<StoredLead>, StoreError> {
        self.load().await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
