//! `POST /sync` validation
//!
//! Request-level problems (missing batch, bad mode, oversized batch) reject
//! the whole request. Item-level problems only fail that item, so they are
//! checked separately by [`parse_contact_item`] and [`validate_contact_input`]
//! during the batch run.

use bridge_common::api::FieldIssue;
use serde_json::{Map, Value};

use super::email::{is_valid_email, normalize_email};
use crate::models::{ContactInput, SyncMode, SyncRequest};

/// Largest batch accepted in one request
pub const MAX_BATCH_SIZE: usize = 500;

/// Validate the batch envelope; items are not inspected here
pub fn validate_sync_request(
    request: SyncRequest,
) -> Result<(SyncMode, Vec<Value>), Vec<FieldIssue>> {
    let mut issues = Vec::new();

    let mode = match request.mode.as_deref() {
        None => Some(SyncMode::default()),
        Some(s) => match SyncMode::parse(s) {
            Some(mode) => Some(mode),
            None => {
                issues.push(FieldIssue::new("mode", "must be \"sync\" or \"import\""));
                None
            }
        },
    };

    let contacts = match request.contacts {
        None => {
            issues.push(FieldIssue::new("contacts", "is required"));
            None
        }
        Some(contacts) if contacts.is_empty() => {
            issues.push(FieldIssue::new("contacts", "must contain at least one contact"));
            None
        }
        Some(contacts) if contacts.len() > MAX_BATCH_SIZE => {
            issues.push(FieldIssue::new(
                "contacts",
                format!("must contain at most {} contacts", MAX_BATCH_SIZE),
            ));
            None
        }
        Some(contacts) => Some(contacts),
    };

    match (mode, contacts) {
        (Some(mode), Some(contacts)) if issues.is_empty() => Ok((mode, contacts)),
        _ => Err(issues),
    }
}

/// Read one submitted batch item into a [`ContactInput`]
///
/// `null` counts as absent. A field of the wrong JSON type is a failure of
/// this item; the error string is the recorded reason.
pub fn parse_contact_item(item: &Value) -> Result<ContactInput, String> {
    let Some(fields) = item.as_object() else {
        return Err("contact must be a JSON object".to_string());
    };

    let mut problems = Vec::new();
    let mut text = |name: &str| string_field(fields, name, &mut problems);

    let first_name = text("firstName").unwrap_or_default();
    let last_name = text("lastName").unwrap_or_default();
    let email = text("email").unwrap_or_default();
    let phone = text("phone");
    let relationship = text("relationship");
    let connection_strength = text("connectionStrength");
    let engagement_level = text("engagementLevel");

    let tags = match fields.get("tags") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            let tags: Option<Vec<String>> = items
                .iter()
                .map(|t| t.as_str().map(str::to_string))
                .collect();
            if tags.is_none() {
                problems.push("tags must be a list of strings".to_string());
            }
            tags
        }
        Some(_) => {
            problems.push("tags must be a list of strings".to_string());
            None
        }
    };

    if !problems.is_empty() {
        return Err(problems.join("; "));
    }

    Ok(ContactInput {
        first_name,
        last_name,
        email,
        phone,
        relationship,
        connection_strength,
        engagement_level,
        tags,
    })
}

fn string_field(
    fields: &Map<String, Value>,
    name: &str,
    problems: &mut Vec<String>,
) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            problems.push(format!("{} must be a string", name));
            None
        }
    }
}

/// Check one batch item and return it with trimmed names and a normalized email
///
/// The error string is the human-readable reason recorded for the failed item.
pub fn validate_contact_input(input: &ContactInput) -> Result<ContactInput, String> {
    let mut problems = Vec::new();

    let first_name = input.first_name.trim();
    let last_name = input.last_name.trim();
    let email = normalize_email(&input.email);

    if first_name.is_empty() {
        problems.push("firstName is required".to_string());
    }
    if last_name.is_empty() {
        problems.push("lastName is required".to_string());
    }
    if email.is_empty() {
        problems.push("email is required".to_string());
    } else if !is_valid_email(&email) {
        problems.push(format!("invalid email address: {}", input.email.trim()));
    }

    if !problems.is_empty() {
        return Err(problems.join("; "));
    }

    Ok(ContactInput {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        phone: trimmed_non_empty(&input.phone),
        relationship: trimmed_non_empty(&input.relationship),
        connection_strength: trimmed_non_empty(&input.connection_strength),
        engagement_level: input.engagement_level.clone(),
        tags: input.tags.clone(),
    })
}

fn trimmed_non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn input(first: &str, last: &str, email: &str) -> ContactInput {
        ContactInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    fn item() -> Value {
        json!({"firstName": "A", "lastName": "B", "email": "a@b.org"})
    }

    #[test]
    fn test_mode_defaults_to_sync() {
        let (mode, contacts) = validate_sync_request(SyncRequest {
            contacts: Some(vec![item()]),
            mode: None,
        })
        .unwrap();
        assert_eq!(mode, SyncMode::Sync);
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn test_envelope_problems() {
        let issues = validate_sync_request(SyncRequest {
            contacts: Some(vec![]),
            mode: Some("merge".to_string()),
        })
        .unwrap_err();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["mode", "contacts"]);

        let issues = validate_sync_request(SyncRequest::default()).unwrap_err();
        assert_eq!(issues[0].field, "contacts");
        assert_eq!(issues[0].message, "is required");
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let contacts = vec![item(); MAX_BATCH_SIZE + 1];
        let issues = validate_sync_request(SyncRequest {
            contacts: Some(contacts),
            mode: Some("import".to_string()),
        })
        .unwrap_err();
        assert!(issues[0].message.contains("at most"));
    }

    #[test]
    fn test_parse_item_reads_known_fields() {
        let parsed = parse_contact_item(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.org",
            "phone": null,
            "tags": ["donor", "mentor"],
            "favouriteColour": "green"
        }))
        .unwrap();
        assert_eq!(parsed.first_name, "Ada");
        assert_eq!(parsed.phone, None);
        assert_eq!(parsed.tags, Some(vec!["donor".to_string(), "mentor".to_string()]));
    }

    #[test]
    fn test_parse_item_null_required_field_fails_validation() {
        let parsed = parse_contact_item(&json!({"firstName": "C", "lastName": "D", "email": null}))
            .unwrap();
        assert_eq!(validate_contact_input(&parsed).unwrap_err(), "email is required");
    }

    #[test]
    fn test_parse_item_wrong_types() {
        let reason =
            parse_contact_item(&json!({"firstName": 1, "lastName": "D", "email": true, "tags": [3]}))
                .unwrap_err();
        assert!(reason.contains("firstName must be a string"));
        assert!(reason.contains("email must be a string"));
        assert!(reason.contains("tags must be a list of strings"));

        assert_eq!(
            parse_contact_item(&json!("ada@example.org")).unwrap_err(),
            "contact must be a JSON object"
        );
    }

    #[test]
    fn test_item_normalization() {
        let mut raw = input("  Ada ", "Lovelace", " ADA@Example.org ");
        raw.phone = Some("   ".to_string());
        raw.relationship = Some(" mentor ".to_string());

        let clean = validate_contact_input(&raw).unwrap();
        assert_eq!(clean.first_name, "Ada");
        assert_eq!(clean.email, "ada@example.org");
        assert_eq!(clean.phone, None);
        assert_eq!(clean.relationship.as_deref(), Some("mentor"));
    }

    #[test]
    fn test_item_reasons() {
        let reason = validate_contact_input(&input("", "Lovelace", "not-an-email")).unwrap_err();
        assert!(reason.contains("firstName is required"));
        assert!(reason.contains("invalid email address: not-an-email"));

        let reason = validate_contact_input(&input("Ada", "Lovelace", "")).unwrap_err();
        assert_eq!(reason, "email is required");
    }
}
