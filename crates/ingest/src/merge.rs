//! Overlay an incoming call-center lead onto the CRM's stored record.
//!
//! Only fields the source actually provides are written. Anything else in
//! the stored document (manual edits, workflow state) is left as it was.

use chrono::{DateTime, Utc};
use leadsync_core::normalize::{
    clean_display_name, derive_contact, format_phone, format_renewal_date,
};
use leadsync_core::{AssignmentRule, CoreError, SourceLead};
use leadsync_storage::{StoredLead, IDENTITY_FIELD};
use serde_json::{json, Map, Value};

/// Document keys the merge owns; source extras never overwrite them.
const RESERVED_KEYS: &[&str] = &[
    "id",
    IDENTITY_FIELD,
    "createdAt",
    "updatedAt",
    "lastSyncedAt",
    "tags",
    "stage",
    "status",
    "source",
    "assignedTo",
    "assignmentColor",
    "assignmentBgColor",
    "autoAssigned",
    "assignmentReason",
];

pub struct MergeContext<'a> {
    /// Call-center label, e.g. `ViciDial`.
    pub source_name: &'a str,
    pub assignment: Option<&'a AssignmentRule>,
    pub now: DateTime<Utc>,
}

fn put_str(data: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        data.insert(key.to_string(), Value::String(v));
    }
}

fn set_default(data: &mut Map<String, Value>, key: &str, value: Value) {
    let absent = matches!(data.get(key), None | Some(Value::Null));
    if absent {
        data.insert(key.to_string(), value);
    }
}

/// Merge `lead` into `existing` (or a fresh record when there is none).
pub fn merge_lead(
    existing: Option<StoredLead>,
    lead: &SourceLead,
    ctx: &MergeContext<'_>,
) -> Result<StoredLead, CoreError> {
    let identity = lead.identity()?.to_string();
    let mut record = existing.unwrap_or_else(|| {
        StoredLead::new(StoredLead::key_for_identity(&identity), Map::new())
    });
    let now = ctx.now.to_rfc3339();
    let data = &mut record.data;

    data.insert(IDENTITY_FIELD.to_string(), json!(identity));

    for (key, value) in &lead.extra {
        if !value.is_null() && !RESERVED_KEYS.contains(&key.as_str()) {
            data.insert(key.clone(), value.clone());
        }
    }

    put_str(data, "name", lead.name.as_deref().map(clean_display_name));
    put_str(data, "phone", lead.phone.as_deref().map(format_phone));
    put_str(data, "email", lead.email.clone());
    put_str(data, "state", lead.state.clone());
    put_str(data, "city", lead.city.as_deref().map(|c| c.trim().to_uppercase()));
    put_str(
        data,
        "contact",
        derive_contact(lead.contact.as_deref(), lead.email.as_deref()),
    );
    put_str(data, "listId", lead.list_id.clone());
    put_str(data, "listName", lead.list_name.clone());
    put_str(data, "vendorId", lead.vendor_id.clone());
    put_str(
        data,
        "renewalDate",
        lead.renewal_date.as_deref().and_then(format_renewal_date),
    );
    put_str(data, "notes", lead.notes.clone());
    if let Some(enrichment) = lead.enrichment.as_ref().filter(|v| !v.is_null()) {
        data.insert("enrichment".to_string(), enrichment.clone());
    }

    if let Some(rule) = ctx.assignment {
        data.insert("assignedTo".to_string(), json!(rule.tag));
        data.insert("assignmentColor".to_string(), json!(rule.color));
        data.insert("assignmentBgColor".to_string(), json!(rule.bg_color));
        data.insert("autoAssigned".to_string(), json!(true));
        data.insert(
            "assignmentReason".to_string(),
            json!(format!(
                "List {} ({})",
                lead.list_id.as_deref().unwrap_or("?"),
                lead.list_name.as_deref().unwrap_or("unnamed")
            )),
        );
    }

    // Create-only defaults.
    set_default(data, "stage", json!("new"));
    set_default(data, "status", json!("hot_lead"));
    set_default(data, "createdAt", json!(now));
    set_default(data, "source", json!(ctx.source_name));
    set_default(
        data,
        "notes",
        json!(format!(
            "SALE from {} list {}.",
            ctx.source_name,
            lead.list_id.as_deref().unwrap_or("unknown")
        )),
    );

    let mut tags: Vec<Value> = match data.remove("tags") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(scalar) => vec![scalar],
    };
    let mut wanted = vec![ctx.source_name.to_string(), "Sale".to_string()];
    if let Some(list_id) = &lead.list_id {
        wanted.push(format!("List-{}", list_id));
    }
    for tag in wanted {
        if !tags.iter().any(|t| t.as_str() == Some(tag.as_str())) {
            tags.push(Value::String(tag));
        }
    }
    data.insert("tags".to_string(), Value::Array(tags));

    data.insert("updatedAt".to_string(), json!(now));
    data.insert("lastSyncedAt".to_string(), json!(now));
    record.updated_at = ctx.now;

    Ok(record)
}
