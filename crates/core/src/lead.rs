//! Lead types shared between the upstream client, the import pipeline and the
//! HTTP surface. All wire forms are camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

fn default_true() -> bool {
    true
}

/// A sale-qualified lead as reported by the call-center.
///
/// `id` is the external identity and the only dedup key. Attributes the
/// pipeline does not model explicitly are kept in `extra` so they still reach
/// the stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLead {
    /// Missing or unusable ids decode as empty and are rejected per lead by
    /// [`SourceLead::identity`].
    #[serde(default, deserialize_with = "identity_or_empty")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub list_id: Option<String>,
    #[serde(default)]
    pub list_name: Option<String>,
    /// Interaction history or other per-lead payload, attached on full import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Value>,
    #[serde(default = "default_true")]
    pub sale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    /// Raw renewal date as the call-center stores it (usually `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceLead {
    /// Minimal lead with only an identity; handy for tests and builders.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            phone: None,
            email: None,
            state: None,
            list_id: None,
            list_name: None,
            enrichment: None,
            sale: true,
            contact: None,
            city: None,
            vendor_id: None,
            renewal_date: None,
            notes: None,
            extra: Map::new(),
        }
    }

    /// Trimmed identity, or an error when it is missing.
    pub fn identity(&self) -> Result<&str, CoreError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(CoreError::InvalidLead("lead has no identity".to_string()));
        }
        Ok(id)
    }

    /// Numeric list id, when the list id parses as one.
    pub fn numeric_list_id(&self) -> Option<i64> {
        self.list_id.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// Per-list coverage row shown to operators, zero-count lists included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub list_id: String,
    pub list_name: String,
    pub lead_count: usize,
    pub active: bool,
}

/// Body of `GET /api/source/leads`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub sale_leads: Vec<SourceLead>,
    #[serde(default)]
    pub all_lists_summary: Vec<ListSummary>,
    #[serde(default)]
    pub total_leads: usize,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl DiscoveryResponse {
    pub fn new(sale_leads: Vec<SourceLead>, all_lists_summary: Vec<ListSummary>) -> Self {
        let total_leads = sale_leads.len();
        let message = if total_leads == 0 {
            "No sale leads found".to_string()
        } else {
            format!("Fetched {} leads for selection", total_leads)
        };
        Self {
            sale_leads,
            all_lists_summary,
            total_leads,
            success: true,
            message,
        }
    }
}

/// Body of the import endpoints (`/api/source/sync`, `/api/source/quick-import`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub selected_leads: Vec<SourceLead>,
    #[serde(default = "default_true")]
    pub selective: bool,
}

impl ImportRequest {
    pub fn selective(leads: Vec<SourceLead>) -> Self {
        Self {
            selected_leads: leads,
            selective: true,
        }
    }
}

/// Body of a quick-import response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickImportResponse {
    pub success: bool,
    #[serde(default)]
    pub imported: usize,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<crate::job::LeadError>,
}

/// 202 acknowledgement returned when a full import is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAccepted {
    pub accepted: bool,
    pub job_id: uuid::Uuid,
    pub total_leads: usize,
    pub message: String,
}

// Call-center payloads send ids as numbers or strings depending on the endpoint.

pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn identity_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_null_id_fails_identity_not_decoding() {
        let missing: SourceLead = serde_json::from_value(json!({ "name": "No Id" })).unwrap();
        let null: SourceLead = serde_json::from_value(json!({ "id": null })).unwrap();
        assert_eq!(missing.id, "");
        assert!(missing.identity().is_err());
        assert!(null.identity().is_err());
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let lead: SourceLead = serde_json::from_value(json!({
            "id": 132511,
            "listId": 998,
            "listName": "OH Hunter",
        }))
        .unwrap();
        assert_eq!(lead.id, "132511");
        assert_eq!(lead.numeric_list_id(), Some(998));
        assert!(lead.sale);
    }

    #[test]
    fn unknown_attributes_land_in_extra() {
        let lead: SourceLead = serde_json::from_value(json!({
            "id": "7",
            "dotNumber": "123456",
            "assignedTo": "GRANT",
        }))
        .unwrap();
        assert_eq!(lead.extra.get("dotNumber"), Some(&json!("123456")));
        assert_eq!(lead.extra.get("assignedTo"), Some(&json!("GRANT")));
    }

    #[test]
    fn blank_identity_is_rejected() {
        let lead = SourceLead::new("   ");
        assert!(lead.identity().is_err());
        assert_eq!(SourceLead::new(" 42 ").identity().unwrap(), "42");
    }

    #[test]
    fn empty_discovery_is_not_an_error() {
        let resp = DiscoveryResponse::new(Vec::new(), Vec::new());
        assert!(resp.success);
        assert_eq!(resp.total_leads, 0);
        assert_eq!(resp.message, "No sale leads found");
    }
}
