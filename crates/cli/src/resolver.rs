//! Candidate endpoint resolution.
//!
//! The API may be reachable under several base addresses depending on how the
//! client is deployed. Each logical call tries them in priority order, once
//! each, and returns the first successful response body.

use std::time::Duration;

use leadsync_core::config::ClientConfig;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

/// Candidate bases in priority order: configured URL, origin host at the API
/// port, then the origin itself (reverse proxy). Duplicates are dropped.
pub fn candidate_bases(api_url: Option<&str>, origin: &str, api_port: u16) -> Vec<String> {
    let mut bases = Vec::new();
    if let Some(url) = api_url.map(str::trim).filter(|u| !u.is_empty()) {
        bases.push(url.to_string());
    }
    if let Ok(mut url) = Url::parse(origin) {
        if url.set_port(Some(api_port)).is_ok() {
            bases.push(url.as_str().to_string());
        }
    }
    bases.push(origin.to_string());
    dedupe(bases)
}

fn normalize(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn dedupe(bases: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for base in bases.iter().map(|b| normalize(b)) {
        if !base.is_empty() && !out.contains(&base) {
            out.push(base);
        }
    }
    out
}

enum Failure {
    Transport(String),
    Status { status: u16, body: String },
}

impl Failure {
    fn describe(&self) -> String {
        match self {
            Self::Transport(msg) => msg.clone(),
            Self::Status { status, body } => format!("HTTP {}: {}", status, body),
        }
    }
}

/// Pull a human message out of an error body such as `{ "error": "..." }`.
fn application_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

pub struct EndpointResolver {
    http: Client,
    candidates: Vec<String>,
}

impl EndpointResolver {
    pub fn new(candidates: Vec<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            candidates: dedupe(candidates),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(candidate_bases(
            config.api_url.as_deref(),
            &config.origin,
            config.api_port,
        ))
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub async fn get(&self, path: &str) -> Result<String, ClientError> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<String, ClientError> {
        let mut last: Option<Failure> = None;
        let mut attempts = 0;

        for base in &self.candidates {
            attempts += 1;
            let url = format!("{}{}", base, path);
            debug!(%method, url = %url, attempt = attempts, "trying endpoint");

            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            let failure = match request.send().await {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(text) => return Ok(text),
                    Err(e) => Failure::Transport(e.to_string()),
                },
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    Failure::Status { status, body }
                }
                Err(e) => Failure::Transport(e.to_string()),
            };
            warn!(url = %url, error = %failure.describe(), "endpoint failed");
            last = Some(failure);
        }

        let Some(failure) = last else {
            return Err(ClientError::Connectivity {
                attempts: 0,
                last: "no endpoint candidates configured".to_string(),
            });
        };
        if let Failure::Status { body, .. } = &failure {
            if let Some(message) = application_message(body) {
                return Err(ClientError::ApplicationError { message });
            }
        }
        Err(ClientError::Connectivity {
            attempts,
            last: failure.describe(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_priority_order() {
        let bases = candidate_bases(Some("https://api.example.com/"), "http://crm.local", 3001);
        assert_eq!(
            bases,
            [
                "https://api.example.com",
                "http://crm.local:3001",
                "http://crm.local"
            ]
        );
    }

    #[test]
    fn duplicate_candidates_are_dropped() {
        let bases = candidate_bases(Some("http://crm.local:3001"), "http://crm.local:3001", 3001);
        assert_eq!(bases, ["http://crm.local:3001"]);
    }

    #[test]
    fn missing_configured_url_is_skipped() {
        let bases = candidate_bases(None, "http://localhost", 3001);
        assert_eq!(bases, ["http://localhost:3001", "http://localhost"]);
    }

    #[test]
    fn error_bodies_yield_messages() {
        assert_eq!(
            application_message(r#"{"success":false,"error":"A sync job is already running"}"#)
                .as_deref(),
            Some("A sync job is already running")
        );
        assert_eq!(application_message("<html>502</html>"), None);
    }

    #[tokio::test]
    async fn no_candidates_is_connectivity_error() {
        let resolver = EndpointResolver::new(Vec::new());
        assert!(matches!(
            resolver.get("/health").await,
            Err(ClientError::Connectivity { attempts: 0, .. })
        ));
    }
}
