//! Client for the call-center's non-agent JSON API.

use async_trait::async_trait;
use leadsync_core::config::SourceConfig;
use leadsync_core::lead::string_or_number;
use leadsync_core::SourceLead;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;

/// A call-center list as reported by `GET {base}/lists`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceList {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub list_id: String,
    #[serde(alias = "name", default)]
    pub list_name: String,
    #[serde(default = "active_default", deserialize_with = "yes_no")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

// The dialer reports flags as "Y"/"N"; newer endpoints use booleans.
fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_uppercase().as_str(), "Y" | "YES" | "TRUE" | "1"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}

/// Read access to the call-center.
#[async_trait]
pub trait CallCenter: Send + Sync {
    async fn lists(&self) -> Result<Vec<SourceList>, UpstreamError>;

    /// Sale-dispositioned leads of one list.
    async fn sale_leads(&self, list_id: &str) -> Result<Vec<SourceLead>, UpstreamError>;

    async fn lead_detail(&self, lead_id: &str) -> Result<SourceLead, UpstreamError>;

    /// Interaction history used to enrich a lead on full import.
    async fn interactions(&self, lead_id: &str) -> Result<Value, UpstreamError>;
}

pub struct HttpCallCenter {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpCallCenter {
    pub fn new(config: &SourceConfig) -> Result<Self, UpstreamError> {
        let base_url = config
            .api_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .ok_or(UpstreamError::NotConfigured)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "call-center request");
        let mut request = self.client.get(&url).query(query);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_ref());
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl CallCenter for HttpCallCenter {
    async fn lists(&self) -> Result<Vec<SourceList>, UpstreamError> {
        self.get_json("/lists", &[]).await
    }

    async fn sale_leads(&self, list_id: &str) -> Result<Vec<SourceLead>, UpstreamError> {
        self.get_json(&format!("/lists/{}/leads", list_id), &[("status", "SALE")])
            .await
    }

    async fn lead_detail(&self, lead_id: &str) -> Result<SourceLead, UpstreamError> {
        self.get_json(&format!("/leads/{}", lead_id), &[]).await
    }

    async fn interactions(&self, lead_id: &str) -> Result<Value, UpstreamError> {
        self.get_json(&format!("/leads/{}/interactions", lead_id), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_payload_accepts_dialer_shapes() {
        let lists: Vec<SourceList> = serde_json::from_value(json!([
            { "id": 998, "name": "Hunter A", "active": "Y" },
            { "id": "1001", "name": "Grant B", "active": false },
            { "listId": "1007", "listName": "Carson" },
        ]))
        .unwrap();
        assert_eq!(lists[0].list_id, "998");
        assert!(lists[0].active);
        assert!(!lists[1].active);
        assert!(lists[2].active);
    }

    #[test]
    fn unconfigured_source_is_rejected() {
        let config = SourceConfig {
            name: "ViciDial".into(),
            api_url: None,
            username: None,
            password: None,
            timeout_secs: 5,
            accept_invalid_certs: false,
        };
        assert!(matches!(
            HttpCallCenter::new(&config),
            Err(UpstreamError::NotConfigured)
        ));
    }
}
