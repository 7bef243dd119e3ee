use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document field that carries the call-center identity of a lead.
pub const IDENTITY_FIELD: &str = "sourceId";

/// A lead as the CRM keeps it: a stable key plus an open JSON document.
///
/// Sync only ever overlays fields onto `data`; workflow fields written by
/// other parts of the CRM (stage, notes, reach-out state) stay untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLead {
    pub id: String,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredLead {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Storage key for a lead first seen under `identity`.
    pub fn key_for_identity(identity: &str) -> String {
        format!("8{}", identity)
    }

    pub fn identity(&self) -> Option<&str> {
        self.data.get(IDENTITY_FIELD).and_then(Value::as_str)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_comes_from_document() {
        let mut data = Map::new();
        data.insert(IDENTITY_FIELD.to_string(), json!("132511"));
        let lead = StoredLead::new(StoredLead::key_for_identity("132511"), data);
        assert_eq!(lead.id, "8132511");
        assert_eq!(lead.identity(), Some("132511"));
    }
}
