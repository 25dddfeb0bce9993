//! Contact sync and bulk import
//!
//! Both modes walk the batch in order and isolate failures per item: a
//! malformed item, a bad email or a CRM error on one contact is recorded with
//! its reason and the original input, and the batch continues.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::contact_store::{ContactStore, StoreError};
use crate::models::{
    Category, Contact, ContactInput, ContactUpdate, NewContact, SyncAction, SyncFailure, SyncMode,
    SyncReport, SyncSuccess,
};
use crate::validators::{parse_contact_item, validate_contact_input};

/// Reconcile by email: update when found, create otherwise
pub async fn sync_contacts(store: &dyn ContactStore, contacts: Vec<ContactInput>) -> SyncReport {
    run_sync(store, SyncMode::Sync, to_items(contacts)).await
}

/// Create every contact without an existence check
pub async fn bulk_import_contacts(
    store: &dyn ContactStore,
    contacts: Vec<ContactInput>,
) -> SyncReport {
    run_sync(store, SyncMode::Import, to_items(contacts)).await
}

fn to_items(contacts: Vec<ContactInput>) -> Vec<Value> {
    contacts
        .into_iter()
        .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
        .collect()
}

/// Run one batch of submitted JSON items in the given mode
pub async fn run_sync(store: &dyn ContactStore, mode: SyncMode, contacts: Vec<Value>) -> SyncReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let total = contacts.len();

    info!(%run_id, mode = mode.as_str(), total, backend = store.backend_name(), "Starting contact sync");

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for (index, item) in contacts.into_iter().enumerate() {
        match reconcile_one(store, mode, index, &item).await {
            Ok(success) => succeeded.push(success),
            Err(reason) => {
                let failure = SyncFailure {
                    index,
                    contact: item,
                    reason,
                };
                warn!(
                    %run_id,
                    index,
                    email = failure.email().unwrap_or("-"),
                    reason = %failure.reason,
                    "Contact sync item failed"
                );
                failed.push(failure);
            }
        }
    }

    let report = SyncReport {
        run_id,
        mode,
        total,
        succeeded,
        failed,
        started_at,
        completed_at: Utc::now(),
    };

    info!(
        %run_id,
        mode = mode.as_str(),
        succeeded = report.succeeded.len(),
        created = report.created_count(),
        updated = report.updated_count(),
        failed = report.failed.len(),
        "Contact sync complete"
    );

    report
}

/// Parse, validate and apply one item; the error is the recorded failure reason
async fn reconcile_one(
    store: &dyn ContactStore,
    mode: SyncMode,
    index: usize,
    item: &Value,
) -> Result<SyncSuccess, String> {
    let input = parse_contact_item(item)?;
    let clean = validate_contact_input(&input)?;
    let outcome = match mode {
        SyncMode::Sync => sync_one(store, &clean).await,
        SyncMode::Import => import_one(store, &clean).await,
    };
    let (contact, action) = outcome.map_err(|e| e.to_string())?;

    Ok(SyncSuccess {
        index,
        email: clean.email,
        contact_id: contact.id,
        action,
    })
}

async fn sync_one(
    store: &dyn ContactStore,
    input: &ContactInput,
) -> Result<(Contact, SyncAction), StoreError> {
    match store.find_by_email(&input.email).await? {
        Some(existing) => {
            let update = differing_fields(&existing, input);
            if update.is_empty() {
                return Ok((existing, SyncAction::Unchanged));
            }
            let updated = store.update_contact(&existing.id, update).await?;
            Ok((updated, SyncAction::Updated))
        }
        None => {
            let created = store.create_contact(new_contact(input, None)).await?;
            Ok((created, SyncAction::Created))
        }
    }
}

async fn import_one(
    store: &dyn ContactStore,
    input: &ContactInput,
) -> Result<(Contact, SyncAction), StoreError> {
    let category = Category::from_engagement_level(input.engagement_level.as_deref());
    let created = store.create_contact(new_contact(input, Some(category))).await?;
    Ok((created, SyncAction::Created))
}

fn new_contact(input: &ContactInput, category: Option<Category>) -> NewContact {
    NewContact {
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        relationship: input.relationship.clone(),
        connection_strength: input.connection_strength.clone(),
        tags: input.tags.clone().unwrap_or_default(),
        category,
    }
}

/// Update carrying only the input fields that differ from the stored contact
///
/// Absent optional input fields leave the stored value alone. The engagement
/// level is never taken from input; it follows the stored score.
fn differing_fields(existing: &Contact, input: &ContactInput) -> ContactUpdate {
    fn changed(current: &str, wanted: &str) -> Option<String> {
        (current != wanted).then(|| wanted.to_string())
    }
    fn changed_opt(current: &Option<String>, wanted: &Option<String>) -> Option<String> {
        match wanted {
            Some(w) if current.as_ref() != Some(w) => Some(w.clone()),
            _ => None,
        }
    }

    ContactUpdate {
        first_name: changed(&existing.first_name, &input.first_name),
        last_name: changed(&existing.last_name, &input.last_name),
        phone: changed_opt(&existing.phone, &input.phone),
        relationship: changed_opt(&existing.relationship, &input.relationship),
        connection_strength: changed_opt(&existing.connection_strength, &input.connection_strength),
        tags: input.tags.clone().filter(|t| *t != existing.tags),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::contact_store::InMemoryContactStore;

    fn input(first: &str, last: &str, email: &str) -> ContactInput {
        ContactInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sync_creates_then_updates_then_unchanged() {
        let store = InMemoryContactStore::new();

        let report = sync_contacts(&store, vec![input("Ada", "Lovelace", "ada@example.org")]).await;
        assert_eq!(report.created_count(), 1);
        let id = report.succeeded[0].contact_id.clone();

        let mut changed = input("Ada", "Lovelace", "ADA@example.org");
        changed.relationship = Some("mentor".to_string());
        let report = sync_contacts(&store, vec![changed.clone()]).await;
        assert_eq!(report.succeeded[0].action, SyncAction::Updated);
        assert_eq!(report.succeeded[0].contact_id, id);

        let report = sync_contacts(&store, vec![changed]).await;
        assert_eq!(report.succeeded[0].action, SyncAction::Unchanged);
        assert_eq!(store.len().await, 1);

        let stored = store.get_contact_by_id(&id).await.unwrap();
        assert_eq!(stored.relationship.as_deref(), Some("mentor"));
    }

    #[tokio::test]
    async fn test_one_bad_email_fails_only_that_item() {
        let store = InMemoryContactStore::new();
        let batch = vec![
            input("Ada", "Lovelace", "ada@example.org"),
            input("Bad", "Email", "not-an-email"),
            input("Grace", "Hopper", "grace@example.org"),
        ];

        let report = sync_contacts(&store, batch).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);

        let failure = &report.failed[0];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.email(), Some("not-an-email"));
        assert!(failure.reason.contains("invalid email"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_malformed_items_fail_alone() {
        let store = InMemoryContactStore::new();
        let batch = vec![
            serde_json::json!({"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.org"}),
            serde_json::json!({"firstName": "C", "lastName": "D", "email": null}),
            serde_json::json!({"firstName": "E", "lastName": "F", "email": 12}),
            serde_json::json!(null),
        ];

        let report = run_sync(&store, SyncMode::Sync, batch).await;
        assert_eq!(report.total, 4);
        assert_eq!(report.created_count(), 1);

        let reasons: Vec<&str> = report.failed.iter().map(|f| f.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "email is required",
                "email must be a string",
                "contact must be a JSON object"
            ]
        );
        assert_eq!(report.failed[1].contact["email"], 12);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sync_ignores_input_engagement_level() {
        let mut seeded = Contact::new("c1", "Ada", "Lovelace", "ada@example.org");
        seeded.lead_score = 5;
        let store = InMemoryContactStore::with_contacts([seeded]);

        let mut claimed = input("Ada", "Lovelace", "ada@example.org");
        claimed.engagement_level = Some("high".to_string());
        let report = sync_contacts(&store, vec![claimed]).await;

        assert_eq!(report.succeeded[0].action, SyncAction::Unchanged);
        let stored = store.get_contact_by_id("c1").await.unwrap();
        assert_eq!(stored.engagement_level.as_str(), "low");
    }

    #[tokio::test]
    async fn test_import_always_creates() {
        let store = InMemoryContactStore::new();
        let mut first = input("Ada", "Lovelace", "ada@example.org");
        first.engagement_level = Some("high".to_string());

        let report = bulk_import_contacts(&store, vec![first.clone(), first]).await;
        assert_eq!(report.mode, SyncMode::Import);
        assert_eq!(report.created_count(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn test_differing_fields_only_sets_changes() {
        let mut existing = Contact::new("c1", "Ada", "Lovelace", "ada@example.org");
        existing.phone = Some("555-0100".to_string());

        let mut same = input("Ada", "Lovelace", "ada@example.org");
        same.phone = Some("555-0100".to_string());
        assert!(differing_fields(&existing, &same).is_empty());

        let mut renamed = input("Augusta", "Lovelace", "ada@example.org");
        renamed.tags = Some(vec!["donor".to_string()]);
        let update = differing_fields(&existing, &renamed);
        assert_eq!(update.first_name.as_deref(), Some("Augusta"));
        assert_eq!(update.last_name, None);
        assert_eq!(update.phone, None);
        assert_eq!(update.tags, Some(vec!["donor".to_string()]));
    }
}
