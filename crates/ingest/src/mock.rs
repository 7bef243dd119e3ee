//! In-process call-center used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use leadsync_core::SourceLead;
use serde_json::{json, Value};

use crate::error::UpstreamError;
use crate::source::{CallCenter, SourceList};

#[derive(Default)]
pub struct FakeCallCenter {
    pub lists: Vec<SourceList>,
    pub leads: HashMap<String, Vec<SourceLead>>,
    pub details: HashMap<String, SourceLead>,
    /// Lead ids whose interaction lookup fails.
    pub broken_interactions: Vec<String>,
    pub fail_lists: bool,
    pub detail_calls: AtomicUsize,
    pub interaction_calls: Mutex<Vec<String>>,
}

impl FakeCallCenter {
    pub fn list(mut self, id: &str, name: &str, active: bool, leads: Vec<SourceLead>) -> Self {
        self.lists.push(SourceList {
            list_id: id.to_string(),
            list_name: name.to_string(),
            active,
        });
        self.leads.insert(id.to_string(), leads);
        self
    }
}

pub fn lead(id: &str, name: &str) -> SourceLead {
    let mut lead = SourceLead::new(id);
    lead.name = Some(name.to_string());
    lead
}

#[async_trait]
impl CallCenter for FakeCallCenter {
    async fn lists(&self) -> Result<Vec<SourceList>, UpstreamError> {
        if self.fail_lists {
            return Err(UpstreamError::Status {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(self.lists.clone())
    }

    async fn sale_leads(&self, list_id: &str) -> Result<Vec<SourceLead>, UpstreamError> {
        Ok(self.leads.get(list_id).cloned().unwrap_or_default())
    }

    async fn lead_detail(&self, lead_id: &str) -> Result<SourceLead, UpstreamError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details.get(lead_id).cloned().ok_or(UpstreamError::Status {
            status: 404,
            body: String::new(),
        })
    }

    async fn interactions(&self, lead_id: &str) -> Result<Value, UpstreamError> {
        self.interaction_calls.lock().unwrap().push(lead_id.to_string());
        if self.broken_interactions.iter().any(|id| id == lead_id) {
            return Err(UpstreamError::Decode("truncated".into()));
        }
        Ok(json!({ "calls": [{ "leadId": lead_id, "status": "SALE" }] }))
    }
}
