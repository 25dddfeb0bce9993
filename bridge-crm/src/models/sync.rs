//! Sync/import request and report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How a batch is reconciled against the CRM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Look up by email, update if found, create otherwise
    #[default]
    Sync,
    /// Always create
    Import,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Sync => "sync",
            SyncMode::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sync" => Some(SyncMode::Sync),
            "import" => Some(SyncMode::Import),
            _ => None,
        }
    }
}

/// One locally-known contact in a sync/import batch
///
/// Built per item from the submitted JSON by
/// [`parse_contact_item`](crate::validators::parse_contact_item); a missing
/// required field is an empty string until item validation rejects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_strength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Raw `POST /sync` body, before validation
///
/// Items stay untyped so a malformed item fails on its own during the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub contacts: Option<Vec<Value>>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// What happened to a successfully reconciled item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
            SyncAction::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSuccess {
    /// Position in the submitted batch
    pub index: usize,
    pub email: String,
    pub contact_id: String,
    pub action: SyncAction,
}

/// A failed item, with its original input kept for manual retry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub index: usize,
    /// The item exactly as submitted
    pub contact: Value,
    pub reason: String,
}

impl SyncFailure {
    /// Submitted email, when the item carried one as a string
    pub fn email(&self) -> Option<&str> {
        self.contact.get("email").and_then(Value::as_str)
    }
}

/// Aggregate result of a sync or import batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub mode: SyncMode,
    pub total: usize,
    pub succeeded: Vec<SyncSuccess>,
    pub failed: Vec<SyncFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn created_count(&self) -> usize {
        self.count_action(SyncAction::Created)
    }

    pub fn updated_count(&self) -> usize {
        self.count_action(SyncAction::Updated)
    }

    fn count_action(&self, action: SyncAction) -> usize {
        self.succeeded.iter().filter(|s| s.action == action).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_malformed_items() {
        let request: SyncRequest = serde_json::from_value(serde_json::json!({
            "contacts": [{"email": null}, 42, "ada@example.org"]
        }))
        .unwrap();
        assert_eq!(request.contacts.map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_failure_email_only_when_string() {
        let failure = SyncFailure {
            index: 0,
            contact: serde_json::json!({"email": "Ada@Example.org"}),
            reason: "lastName is required".into(),
        };
        assert_eq!(failure.email(), Some("Ada@Example.org"));

        let failure = SyncFailure {
            contact: serde_json::json!({"email": 7}),
            ..failure
        };
        assert_eq!(failure.email(), None);
    }

    #[test]
    fn test_sync_mode_parse() {
        assert_eq!(SyncMode::parse("sync"), Some(SyncMode::Sync));
        assert_eq!(SyncMode::parse("import"), Some(SyncMode::Import));
        assert_eq!(SyncMode::parse("merge"), None);
        assert_eq!(SyncMode::default(), SyncMode::Sync);
    }
}
