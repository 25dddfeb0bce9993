//! Contact ↔ ClickUp custom field mapping
//!
//! Two lookup tables:
//! 1. [`ContactField`] ↔ custom field *name* (fixed, in code)
//! 2. custom field name → field *id* (per list, read from
//!    `GET /list/{id}/field` and held in a [`FieldMap`])
//!
//! Writes to a field with no id on the list fail with
//! [`MappingError::Unmapped`]; nothing is dropped silently.
//!
//! Value encoding:
//! - text/email/phone → string
//! - score and seconds → number
//! - flags → checkbox boolean
//! - last engagement → Unix millis
//! - visited pages, stories read → JSON array in a text field
//! - category → drop-down option id

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use bridge_common::time::{from_unix_millis, to_unix_millis};

use super::clickup_client::{ClickUpTask, CustomFieldValue, DropdownOption, ListField};
use crate::models::{Contact, EngagementLevel, NewContact};

/// Internal contact attributes stored as custom fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    FirstName,
    LastName,
    Email,
    Phone,
    PagesVisited,
    TimeOnSite,
    StoriesRead,
    LetterSubmitted,
    VolunteerSignup,
    WillingToTestify,
    LeadScore,
    LastEngagement,
    EngagementLevel,
    Relationship,
    ConnectionStrength,
    Category,
}

impl ContactField {
    pub const ALL: [ContactField; 16] = [
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::Email,
        ContactField::Phone,
        ContactField::PagesVisited,
        ContactField::TimeOnSite,
        ContactField::StoriesRead,
        ContactField::LetterSubmitted,
        ContactField::VolunteerSignup,
        ContactField::WillingToTestify,
        ContactField::LeadScore,
        ContactField::LastEngagement,
        ContactField::EngagementLevel,
        ContactField::Relationship,
        ContactField::ConnectionStrength,
        ContactField::Category,
    ];

    /// Custom field name on the ClickUp list
    pub fn crm_name(self) -> &'static str {
        match self {
            ContactField::FirstName => "First Name",
            ContactField::LastName => "Last Name",
            ContactField::Email => "Email",
            ContactField::Phone => "Phone",
            ContactField::PagesVisited => "Pages Visited",
            ContactField::TimeOnSite => "Time on Site",
            ContactField::StoriesRead => "Stories Read",
            ContactField::LetterSubmitted => "Letter Submitted",
            ContactField::VolunteerSignup => "Volunteer Signup",
            ContactField::WillingToTestify => "Willing to Testify",
            ContactField::LeadScore => "Lead Score",
            ContactField::LastEngagement => "Last Engagement",
            ContactField::EngagementLevel => "Engagement Level",
            ContactField::Relationship => "Relationship",
            ContactField::ConnectionStrength => "Connection Strength",
            ContactField::Category => "Category",
        }
    }

    /// Reverse lookup; case and surrounding whitespace are ignored
    pub fn from_crm_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.crm_name().eq_ignore_ascii_case(name))
    }

    fn kind(self) -> FieldKind {
        match self {
            ContactField::PagesVisited | ContactField::StoriesRead => FieldKind::List,
            ContactField::TimeOnSite | ContactField::LeadScore => FieldKind::Number,
            ContactField::LetterSubmitted
            | ContactField::VolunteerSignup
            | ContactField::WillingToTestify => FieldKind::Flag,
            ContactField::LastEngagement => FieldKind::Date,
            ContactField::EngagementLevel | ContactField::Category => FieldKind::Choice,
            _ => FieldKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Flag,
    Date,
    List,
    Choice,
}

/// A typed value headed for one custom field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Flag(bool),
    Date(DateTime<Utc>),
    List(Vec<String>),
    /// Drop-down option by name
    Choice(String),
}

/// Mapping failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("contact field '{}' has no matching custom field on the CRM list", .0.crm_name())]
    Unmapped(ContactField),

    #[error("custom field '{}' has no option named '{option}'", .field.crm_name())]
    UnknownOption { field: ContactField, option: String },
}

/// A resolved custom field on the list
#[derive(Debug, Clone)]
pub struct MappedField {
    pub id: String,
    pub field_type: String,
    pub options: Vec<DropdownOption>,
}

impl MappedField {
    fn is_drop_down(&self) -> bool {
        self.field_type == "drop_down"
    }

    fn option_id(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .map(|o| o.id.as_str())
    }

    /// Drop-down values come back as an orderindex (or occasionally the option id)
    fn option_name(&self, value: &Value) -> Option<String> {
        let by_index = decode_number(value);
        self.options
            .iter()
            .find(|o| {
                let index_match = match (&o.orderindex, by_index) {
                    (Some(idx), Some(wanted)) => decode_number(idx) == Some(wanted),
                    _ => false,
                };
                index_match || value.as_str() == Some(o.id.as_str())
            })
            .and_then(|o| o.name.clone())
    }
}

/// Field ids of one ClickUp list
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: HashMap<ContactField, MappedField>,
}

impl FieldMap {
    /// Build from the list's custom field definitions; unknown names are ignored
    pub fn from_list_fields(list_fields: &[ListField]) -> Self {
        let mut fields = HashMap::new();
        for lf in list_fields {
            if let Some(field) = ContactField::from_crm_name(&lf.name) {
                fields.insert(
                    field,
                    MappedField {
                        id: lf.id.clone(),
                        field_type: lf.field_type.clone(),
                        options: lf
                            .type_config
                            .as_ref()
                            .map(|c| c.options.clone())
                            .unwrap_or_default(),
                    },
                );
            }
        }
        Self { fields }
    }

    pub fn get(&self, field: ContactField) -> Result<&MappedField, MappingError> {
        self.fields.get(&field).ok_or(MappingError::Unmapped(field))
    }

    pub fn field_id(&self, field: ContactField) -> Result<&str, MappingError> {
        self.get(field).map(|m| m.id.as_str())
    }

    pub fn mapped(&self) -> Vec<ContactField> {
        ContactField::ALL
            .into_iter()
            .filter(|f| self.fields.contains_key(f))
            .collect()
    }

    pub fn unmapped(&self) -> Vec<ContactField> {
        ContactField::ALL
            .into_iter()
            .filter(|f| !self.fields.contains_key(f))
            .collect()
    }

    /// Encode one value for a ClickUp write
    pub fn encode(
        &self,
        field: ContactField,
        value: &FieldValue,
    ) -> Result<CustomFieldValue, MappingError> {
        let mapped = self.get(field)?;
        let json = match value {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => Value::from(*n),
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::Date(ts) => Value::from(to_unix_millis(ts)),
            FieldValue::List(items) => Value::String(Value::from(items.clone()).to_string()),
            FieldValue::Choice(name) if mapped.is_drop_down() => {
                let id = mapped.option_id(name).ok_or_else(|| MappingError::UnknownOption {
                    field,
                    option: name.clone(),
                })?;
                Value::String(id.to_string())
            }
            FieldValue::Choice(name) => Value::String(name.clone()),
        };

        Ok(CustomFieldValue {
            id: mapped.id.clone(),
            value: json,
        })
    }

    /// Encode a batch of values; fails on the first unmapped field
    pub fn encode_all(
        &self,
        values: &[(ContactField, FieldValue)],
    ) -> Result<Vec<CustomFieldValue>, MappingError> {
        values.iter().map(|(f, v)| self.encode(*f, v)).collect()
    }

    /// Read a task into a contact
    ///
    /// Fields missing from the task keep their defaults. Names fall back to
    /// splitting the task name. The engagement level is re-derived from the
    /// score rather than trusted from the CRM.
    pub fn decode_task(&self, task: &ClickUpTask) -> Contact {
        let ids: HashMap<&str, ContactField> = self
            .fields
            .iter()
            .map(|(field, mapped)| (mapped.id.as_str(), *field))
            .collect();

        let (fallback_first, fallback_last) = split_name(&task.name);
        let mut contact = Contact::new(task.id.clone(), fallback_first, fallback_last, "");
        contact.tags = task.tags.iter().map(|t| t.name.clone()).collect();

        for cf in &task.custom_fields {
            let Some(field) = ids.get(cf.id.as_str()).copied() else {
                continue;
            };
            let Some(value) = cf.value.as_ref().filter(|v| !v.is_null()) else {
                continue;
            };
            self.apply_decoded(&mut contact, field, value);
        }

        contact.engagement_level = EngagementLevel::from_score(contact.lead_score);
        contact
    }

    fn apply_decoded(&self, contact: &mut Contact, field: ContactField, value: &Value) {
        match field.kind() {
            FieldKind::Text => {
                let Some(text) = decode_text(value) else { return };
                match field {
                    ContactField::FirstName => contact.first_name = text,
                    ContactField::LastName => contact.last_name = text,
                    ContactField::Email => contact.email = text,
                    ContactField::Phone => contact.phone = Some(text),
                    ContactField::Relationship => contact.relationship = Some(text),
                    ContactField::ConnectionStrength => contact.connection_strength = Some(text),
                    _ => {}
                }
            }
            FieldKind::Number => {
                let Some(n) = decode_number(value) else { return };
                match field {
                    ContactField::TimeOnSite => contact.time_on_site = n,
                    ContactField::LeadScore => {
                        contact.lead_score = u32::try_from(n).unwrap_or(u32::MAX)
                    }
                    _ => {}
                }
            }
            FieldKind::Flag => {
                let flag = decode_flag(value);
                match field {
                    ContactField::LetterSubmitted => contact.letter_submitted = flag,
                    ContactField::VolunteerSignup => contact.volunteer_signup = flag,
                    ContactField::WillingToTestify => contact.willing_to_testify = flag,
                    _ => {}
                }
            }
            FieldKind::Date => {
                contact.last_engagement = decode_number(value)
                    .and_then(|n| i64::try_from(n).ok())
                    .and_then(from_unix_millis);
            }
            FieldKind::List => {
                let items = decode_list(value);
                match field {
                    ContactField::PagesVisited => contact.pages_visited = items,
                    ContactField::StoriesRead => contact.stories_read = items,
                    _ => {}
                }
            }
            // Engagement level is derived; category is write-only
            FieldKind::Choice => {}
        }
    }

    /// Drop-down value of a task field, as the option name
    pub fn decode_choice(&self, task: &ClickUpTask, field: ContactField) -> Option<String> {
        let mapped = self.fields.get(&field)?;
        let cf = task.custom_fields.iter().find(|cf| cf.id == mapped.id)?;
        let value = cf.value.as_ref()?;
        if mapped.is_drop_down() {
            mapped.option_name(value)
        } else {
            decode_text(value)
        }
    }
}

/// Every field that differs between two states of a contact
///
/// Identity (`id`) and tags are not custom fields and are not compared.
pub fn changed_fields(current: &Contact, next: &Contact) -> Vec<(ContactField, FieldValue)> {
    let mut changes = Vec::new();

    let mut text = |field, a: &str, b: &str| {
        if a != b {
            changes.push((field, FieldValue::Text(b.to_string())));
        }
    };
    text(ContactField::FirstName, &current.first_name, &next.first_name);
    text(ContactField::LastName, &current.last_name, &next.last_name);
    text(ContactField::Email, &current.email, &next.email);

    let optional = [
        (ContactField::Phone, &current.phone, &next.phone),
        (ContactField::Relationship, &current.relationship, &next.relationship),
        (
            ContactField::ConnectionStrength,
            &current.connection_strength,
            &next.connection_strength,
        ),
    ];
    for (field, a, b) in optional {
        if a != b {
            if let Some(b) = b {
                changes.push((field, FieldValue::Text(b.clone())));
            }
        }
    }

    if current.pages_visited != next.pages_visited {
        changes.push((ContactField::PagesVisited, FieldValue::List(next.pages_visited.clone())));
    }
    if current.time_on_site != next.time_on_site {
        changes.push((ContactField::TimeOnSite, FieldValue::Number(next.time_on_site)));
    }
    if current.stories_read != next.stories_read {
        changes.push((ContactField::StoriesRead, FieldValue::List(next.stories_read.clone())));
    }

    let flags = [
        (ContactField::LetterSubmitted, current.letter_submitted, next.letter_submitted),
        (ContactField::VolunteerSignup, current.volunteer_signup, next.volunteer_signup),
        (ContactField::WillingToTestify, current.willing_to_testify, next.willing_to_testify),
    ];
    for (field, a, b) in flags {
        if a != b {
            changes.push((field, FieldValue::Flag(b)));
        }
    }

    if current.lead_score != next.lead_score {
        changes.push((ContactField::LeadScore, FieldValue::Number(u64::from(next.lead_score))));
    }
    if current.last_engagement != next.last_engagement {
        if let Some(ts) = next.last_engagement {
            changes.push((ContactField::LastEngagement, FieldValue::Date(ts)));
        }
    }
    if current.engagement_level != next.engagement_level {
        changes.push((
            ContactField::EngagementLevel,
            FieldValue::Choice(next.engagement_level.as_str().to_string()),
        ));
    }

    changes
}

/// Custom field values for a brand-new contact
pub fn new_contact_fields(contact: &NewContact) -> Vec<(ContactField, FieldValue)> {
    let mut values = vec![
        (ContactField::FirstName, FieldValue::Text(contact.first_name.clone())),
        (ContactField::LastName, FieldValue::Text(contact.last_name.clone())),
        (ContactField::Email, FieldValue::Text(contact.email.clone())),
    ];
    if let Some(phone) = &contact.phone {
        values.push((ContactField::Phone, FieldValue::Text(phone.clone())));
    }
    if let Some(relationship) = &contact.relationship {
        values.push((ContactField::Relationship, FieldValue::Text(relationship.clone())));
    }
    if let Some(strength) = &contact.connection_strength {
        values.push((ContactField::ConnectionStrength, FieldValue::Text(strength.clone())));
    }
    if let Some(category) = contact.category {
        values.push((ContactField::Category, FieldValue::Choice(category.as_str().to_string())));
    }
    values
}

fn split_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn decode_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// ClickUp returns numbers as JSON numbers or numeric strings
fn decode_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}

fn decode_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim(), "true" | "1"),
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

/// JSON array (native or encoded in a string); plain text falls back to comma-separated
fn decode_list(value: &Value) -> Vec<String> {
    let from_array = |items: &Vec<Value>| -> Vec<String> {
        items.iter().filter_map(decode_text).collect()
    };
    match value {
        Value::Array(items) => from_array(items),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => from_array(&items),
            _ => s
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::services::clickup_client::{ClickUpTag, TaskCustomField, TypeConfig};
    use chrono::TimeZone;
    use serde_json::json;

    fn list_field(id: &str, name: &str, field_type: &str) -> ListField {
        ListField {
            id: id.to_string(),
            name: name.to_string(),
            field_type: field_type.to_string(),
            type_config: None,
        }
    }

    fn category_field() -> ListField {
        ListField {
            id: "f-cat".to_string(),
            name: "Category".to_string(),
            field_type: "drop_down".to_string(),
            type_config: Some(TypeConfig {
                options: ["CONSULTING", "MARKETING", "SOFTWARE"]
                    .iter()
                    .enumerate()
                    .map(|(i, n)| DropdownOption {
                        id: format!("opt-{}", n.to_lowercase()),
                        name: Some(n.to_string()),
                        orderindex: Some(json!(i)),
                    })
                    .collect(),
            }),
        }
    }

    fn full_map() -> FieldMap {
        let mut fields: Vec<ListField> = ContactField::ALL
            .iter()
            .filter(|f| **f != ContactField::Category)
            .map(|f| list_field(&format!("f-{:?}", f), f.crm_name(), "short_text"))
            .collect();
        fields.push(category_field());
        FieldMap::from_list_fields(&fields)
    }

    fn task_field(map: &FieldMap, field: ContactField, value: Value) -> TaskCustomField {
        TaskCustomField {
            id: map.field_id(field).unwrap().to_string(),
            name: Some(field.crm_name().to_string()),
            field_type: None,
            value: Some(value),
        }
    }

    #[test]
    fn test_name_lookup_round_trip_and_case() {
        for field in ContactField::ALL {
            assert_eq!(ContactField::from_crm_name(field.crm_name()), Some(field));
        }
        assert_eq!(ContactField::from_crm_name("  lead score "), Some(ContactField::LeadScore));
        assert_eq!(ContactField::from_crm_name("Favourite Color"), None);
    }

    #[test]
    fn test_unmapped_field_surfaces() {
        let map = FieldMap::from_list_fields(&[list_field("f1", "Email", "email")]);
        assert_eq!(map.field_id(ContactField::Email), Ok("f1"));

        let err = map
            .encode(ContactField::LeadScore, &FieldValue::Number(5))
            .unwrap_err();
        assert_eq!(err, MappingError::Unmapped(ContactField::LeadScore));
        assert!(err.to_string().contains("Lead Score"));
        assert_eq!(map.unmapped().len(), ContactField::ALL.len() - 1);
    }

    #[test]
    fn test_encode_values() {
        let map = full_map();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let date = map.encode(ContactField::LastEngagement, &FieldValue::Date(ts)).unwrap();
        assert_eq!(date.value, json!(1_704_067_200_000i64));

        let list = map
            .encode(
                ContactField::PagesVisited,
                &FieldValue::List(vec!["/home".into(), "/stories".into()]),
            )
            .unwrap();
        assert_eq!(list.value, json!("[\"/home\",\"/stories\"]"));

        let flag = map.encode(ContactField::LetterSubmitted, &FieldValue::Flag(true)).unwrap();
        assert_eq!(flag.value, json!(true));
    }

    #[test]
    fn test_drop_down_encodes_option_id() {
        let map = full_map();
        let encoded = map
            .encode(ContactField::Category, &FieldValue::Choice("MARKETING".into()))
            .unwrap();
        assert_eq!(encoded.id, "f-cat");
        assert_eq!(encoded.value, json!("opt-marketing"));

        let err = map
            .encode(ContactField::Category, &FieldValue::Choice("NONPROFIT".into()))
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownOption { .. }));
    }

    #[test]
    fn test_decode_task() {
        let map = full_map();
        let task = ClickUpTask {
            id: "86abc".to_string(),
            name: "Ada Lovelace".to_string(),
            custom_fields: vec![
                task_field(&map, ContactField::Email, json!("ada@example.org")),
                task_field(&map, ContactField::LeadScore, json!("42")),
                task_field(&map, ContactField::TimeOnSite, json!(90)),
                task_field(&map, ContactField::PagesVisited, json!("[\"/home\"]")),
                task_field(&map, ContactField::StoriesRead, json!("s1, s2")),
                task_field(&map, ContactField::LetterSubmitted, json!("true")),
                task_field(&map, ContactField::LastEngagement, json!("1704067200000")),
                task_field(&map, ContactField::Category, json!(2)),
            ],
            tags: vec![ClickUpTag { name: "family".to_string() }],
        };

        let contact = map.decode_task(&task);
        assert_eq!(contact.id, "86abc");
        assert_eq!(contact.first_name, "Ada");
        assert_eq!(contact.last_name, "Lovelace");
        assert_eq!(contact.email, "ada@example.org");
        assert_eq!(contact.lead_score, 42);
        assert_eq!(contact.engagement_level, EngagementLevel::Medium);
        assert_eq!(contact.time_on_site, 90);
        assert_eq!(contact.pages_visited, vec!["/home".to_string()]);
        assert_eq!(contact.stories_read, vec!["s1".to_string(), "s2".to_string()]);
        assert!(contact.letter_submitted);
        assert!(!contact.volunteer_signup);
        assert_eq!(
            contact.last_engagement,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(contact.tags, vec!["family".to_string()]);
        assert_eq!(
            map.decode_choice(&task, ContactField::Category).as_deref(),
            Some("SOFTWARE")
        );
    }

    #[test]
    fn test_changed_fields_only_reports_differences() {
        let current = Contact::new("c1", "Ada", "Lovelace", "ada@example.org");
        let mut next = current.clone();
        next.lead_score = 30;
        next.engagement_level = EngagementLevel::Medium;
        next.pages_visited.push("/home".into());

        let changes = changed_fields(&current, &next);
        let fields: Vec<ContactField> = changes.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            fields,
            vec![
                ContactField::PagesVisited,
                ContactField::LeadScore,
                ContactField::EngagementLevel
            ]
        );
        assert!(changed_fields(&current, &current).is_empty());
    }

    #[test]
    fn test_new_contact_fields_include_category() {
        let new = NewContact {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            phone: None,
            relationship: Some("mentor".into()),
            connection_strength: None,
            tags: vec![],
            category: Some(Category::Consulting),
        };
        let values = new_contact_fields(&new);
        assert!(values.contains(&(ContactField::Relationship, FieldValue::Text("mentor".into()))));
        assert!(values.contains(&(ContactField::Category, FieldValue::Choice("CONSULTING".into()))));
        assert!(!values.iter().any(|(f, _)| *f == ContactField::Phone));
    }
}
