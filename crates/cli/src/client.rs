//! Typed access to the lead sync API through the endpoint resolver.

use async_trait::async_trait;
use leadsync_core::{
    DiscoveryResponse, ImportAccepted, ImportRequest, QuickImportResponse, SourceLead,
    SyncJobSnapshot,
};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::resolver::EndpointResolver;

/// Decode a JSON body, telling markup apart from other garbage.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(ClientError::UnexpectedContentType {
            snippet: trimmed.chars().take(60).collect(),
        });
    }
    serde_json::from_str(trimmed).map_err(|e| ClientError::Decode(e.to_string()))
}

fn require_selection(leads: &[SourceLead]) -> Result<(), ClientError> {
    if leads.is_empty() {
        return Err(ClientError::Validation(
            "select at least one lead to import".to_string(),
        ));
    }
    Ok(())
}

/// Anything that can report the sync job's current state.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn sync_status(&self) -> Result<SyncJobSnapshot, ClientError>;
}

pub struct SourceAdapter {
    resolver: EndpointResolver,
}

impl SourceAdapter {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Sale leads available for import. An empty result is not an error.
    pub async fn discover(&self) -> Result<DiscoveryResponse, ClientError> {
        let body = self.resolver.get("/api/source/leads?countsOnly=true").await?;
        decode(&body)
    }

    pub async fn start_full_import(
        &self,
        leads: &[SourceLead],
    ) -> Result<ImportAccepted, ClientError> {
        require_selection(leads)?;
        let body = self
            .resolver
            .post_json("/api/source/sync", &ImportRequest::selective(leads.to_vec()))
            .await?;
        decode(&body)
    }

    pub async fn quick_import(
        &self,
        leads: &[SourceLead],
    ) -> Result<QuickImportResponse, ClientError> {
        require_selection(leads)?;
        let body = self
            .resolver
            .post_json(
                "/api/source/quick-import",
                &ImportRequest::selective(leads.to_vec()),
            )
            .await?;
        let resp: QuickImportResponse = decode(&body)?;
        if !resp.success {
            return Err(ClientError::ApplicationError {
                message: resp.message,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl StatusSource for SourceAdapter {
    async fn sync_status(&self) -> Result<SyncJobSnapshot, ClientError> {
        let body = self.resolver.get("/api/source/sync-status").await?;
        decode(&body)
    }
}
