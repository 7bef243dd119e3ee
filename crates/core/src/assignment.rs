//! List-based agent assignment.
//!
//! A static table maps call-center lists to the agent who owns them. Numeric
//! list ids are matched first across every rule; only when no rule claims the
//! id does a case-insensitive substring match against the list name run.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lead::SourceLead;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRule {
    /// Agent tag written to `assignedTo`, e.g. `HUNTER`.
    pub tag: String,
    pub color: String,
    pub bg_color: String,
    #[serde(default)]
    pub list_ids: BTreeSet<i64>,
    /// Lower-cased on load.
    #[serde(default)]
    pub name_patterns: Vec<String>,
}

impl AssignmentRule {
    fn new(tag: &str, color: &str, bg_color: &str, ids: &[i64], pattern: &str) -> Self {
        Self {
            tag: tag.to_string(),
            color: color.to_string(),
            bg_color: bg_color.to_string(),
            list_ids: ids.iter().copied().collect(),
            name_patterns: vec![pattern.to_string()],
        }
    }

    fn matches_name(&self, lowered_name: &str) -> bool {
        self.name_patterns
            .iter()
            .any(|p| !p.is_empty() && lowered_name.contains(p.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentTable {
    rules: Vec<AssignmentRule>,
}

impl Default for AssignmentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AssignmentTable {
    /// The agency's standing list ownership.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                AssignmentRule::new("HUNTER", "#3b82f6", "#dbeafe", &[998, 999, 1000], "hunter"),
                AssignmentRule::new("GRANT", "#7c3aed", "#ede9fe", &[1001, 1005, 1006], "grant"),
                AssignmentRule::new("CARSON", "#059669", "#d1fae5", &[1007, 1008, 1009], "carson"),
            ],
        }
    }

    /// Build a table from rules, normalizing patterns and checking that no
    /// list id or tag is claimed twice.
    pub fn new(mut rules: Vec<AssignmentRule>) -> Result<Self, CoreError> {
        let mut seen_ids = HashSet::new();
        let mut seen_tags = HashSet::new();
        for rule in &mut rules {
            if rule.tag.trim().is_empty() {
                return Err(CoreError::InvalidRules("rule with empty tag".to_string()));
            }
            if !seen_tags.insert(rule.tag.to_uppercase()) {
                return Err(CoreError::InvalidRules(format!("duplicate tag '{}'", rule.tag)));
            }
            for id in &rule.list_ids {
                if !seen_ids.insert(*id) {
                    return Err(CoreError::InvalidRules(format!(
                        "list id {} is claimed by more than one rule",
                        id
                    )));
                }
            }
            for pattern in &mut rule.name_patterns {
                *pattern = pattern.trim().to_lowercase();
            }
        }
        Ok(Self { rules })
    }

    /// Parse a YAML document of the form `rules: [{ tag, color, bgColor, listIds, namePatterns }]`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        let raw: AssignmentTable = serde_yaml::from_str(yaml)?;
        Self::new(raw.rules)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let yaml = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.display(),
            rules = table.rules.len(),
            "assignment rules loaded"
        );
        Ok(table)
    }

    /// Load from `path` when given, otherwise fall back to the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CoreError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn rules(&self) -> &[AssignmentRule] {
        &self.rules
    }

    pub fn resolve(&self, list_id: Option<i64>, list_name: Option<&str>) -> Option<&AssignmentRule> {
        if let Some(id) = list_id {
            if let Some(rule) = self.rules.iter().find(|r| r.list_ids.contains(&id)) {
                return Some(rule);
            }
        }
        let lowered = list_name?.to_lowercase();
        self.rules.iter().find(|r| r.matches_name(&lowered))
    }

    pub fn resolve_lead(&self, lead: &SourceLead) -> Option<&AssignmentRule> {
        self.resolve(lead.numeric_list_id(), lead.list_name.as_deref())
    }
}
