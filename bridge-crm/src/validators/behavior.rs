//! `POST /behavior` body validation

use bridge_common::api::FieldIssue;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{BehaviorEvent, BehaviorEventRequest, EventData, EventType};

/// Validate a raw behavior event body
///
/// `now` is used as the event timestamp when the body carries none.
/// All problems are collected so the caller gets field-level detail.
pub fn validate_behavior_request(
    request: BehaviorEventRequest,
    now: DateTime<Utc>,
) -> Result<BehaviorEvent, Vec<FieldIssue>> {
    let mut issues = Vec::new();

    let contact_id = match request.contact_id {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(Value::String(_)) => {
            issues.push(FieldIssue::new("contactId", "must not be empty"));
            None
        }
        Some(_) => {
            issues.push(FieldIssue::new("contactId", "must be a string"));
            None
        }
        None => {
            issues.push(FieldIssue::new("contactId", "is required"));
            None
        }
    };

    let event_type = match request.event_type {
        Some(Value::String(s)) => match EventType::parse(&s) {
            Some(t) => Some(t),
            None => {
                issues.push(FieldIssue::new(
                    "eventType",
                    format!("must be one of: {}", allowed_event_types()),
                ));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new("eventType", "must be a string"));
            None
        }
        None => {
            issues.push(FieldIssue::new("eventType", "is required"));
            None
        }
    };

    let event_data = match request.event_data {
        None | Some(Value::Null) => Some(EventData::default()),
        Some(value @ Value::Object(_)) => match serde_json::from_value::<EventData>(value) {
            Ok(data) => Some(data),
            Err(e) => {
                issues.push(FieldIssue::new("eventData", e.to_string()));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new("eventData", "must be an object"));
            None
        }
    };

    let timestamp = match request.timestamp {
        None | Some(Value::Null) => Some(now),
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                issues.push(FieldIssue::new("timestamp", "must be an ISO-8601 datetime"));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new("timestamp", "must be an ISO-8601 datetime string"));
            None
        }
    };

    if let (Some(event_type), Some(data)) = (event_type, &event_data) {
        check_event_shape(event_type, data, &mut issues);
    }

    match (contact_id, event_type, event_data, timestamp) {
        (Some(contact_id), Some(event_type), Some(event_data), Some(timestamp))
            if issues.is_empty() =>
        {
            Ok(BehaviorEvent {
                contact_id,
                event_type,
                event_data,
                timestamp,
            })
        }
        _ => Err(issues),
    }
}

/// Per-type required payload keys
fn check_event_shape(event_type: EventType, data: &EventData, issues: &mut Vec<FieldIssue>) {
    match event_type {
        EventType::PageView => {
            if data.page_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                issues.push(FieldIssue::new(
                    "eventData.pageUrl",
                    "is required for page_view events",
                ));
            }
        }
        EventType::StoryRead => {
            if data.story_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
                issues.push(FieldIssue::new(
                    "eventData.storyId",
                    "is required for story_read events",
                ));
            }
        }
        _ => {}
    }
}

fn allowed_event_types() -> String {
    EventType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
