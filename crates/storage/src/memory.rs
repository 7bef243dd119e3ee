use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::StoredLead;
use crate::LeadStore;

/// Process-local store; insertion order is kept for listing.
#[derive(Default)]
pub struct MemoryLeadStore {
    leads: RwLock<IndexMap<String, StoredLead>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.leads.read().await.len()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn get(&self, id: &str) -> Result<Option<StoredLead>, StoreError> {
        Ok(self.leads.read().await.get(id).cloned())
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<StoredLead>, StoreError> {
        let leads = self.leads.read().await;
        Ok(leads.values().find(|l| l.identity() == Some(identity)).cloned())
    }

    async fn upsert(&self, lead: StoredLead) -> Result<(), StoreError> {
        let mut leads = self.leads.write().await;
        match leads.get_mut(&lead.id) {
            Some(existing) => {
                existing.data = lead.data;
                existing.updated_at = lead.updated_at;
            }
            None => {
                leads.insert(lead.id.clone(), lead);
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredLead>, StoreError> {
        Ok(self.leads.read().await.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
