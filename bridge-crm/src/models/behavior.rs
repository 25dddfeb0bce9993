//! Behavior events and their results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EngagementLevel;

/// Closed set of engagement event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    StoryRead,
    LetterSubmitted,
    VolunteerSignup,
    TestimonyWillingness,
    VideoWatched,
    ResourceDownloaded,
    Custom,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::PageView,
        EventType::StoryRead,
        EventType::LetterSubmitted,
        EventType::VolunteerSignup,
        EventType::TestimonyWillingness,
        EventType::VideoWatched,
        EventType::ResourceDownloaded,
        EventType::Custom,
    ];

    /// Points added to the lead score for one event of this type
    pub fn points(self) -> u32 {
        match self {
            EventType::PageView => 1,
            EventType::StoryRead => 5,
            EventType::LetterSubmitted => 50,
            EventType::VolunteerSignup => 75,
            EventType::TestimonyWillingness => 100,
            EventType::VideoWatched => 10,
            EventType::ResourceDownloaded => 15,
            EventType::Custom => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::StoryRead => "story_read",
            EventType::LetterSubmitted => "letter_submitted",
            EventType::VolunteerSignup => "volunteer_signup",
            EventType::TestimonyWillingness => "testimony_willingness",
            EventType::VideoWatched => "video_watched",
            EventType::ResourceDownloaded => "resource_downloaded",
            EventType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Event payload; which keys matter depends on the event type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// `page_view`: URL of the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// `page_view`: seconds spent on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    /// `story_read`: story identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    /// Any other keys are carried through for logging
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A validated engagement event
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorEvent {
    pub contact_id: String,
    pub event_type: EventType,
    pub event_data: EventData,
    pub timestamp: DateTime<Utc>,
}

/// Raw `POST /behavior` body, before validation
///
/// Everything is optional so that validation can report each missing or
/// malformed field instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEventRequest {
    #[serde(default)]
    pub contact_id: Option<Value>,
    #[serde(default)]
    pub event_type: Option<Value>,
    #[serde(default)]
    pub event_data: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// Result of processing one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorOutcome {
    pub contact_id: String,
    pub event_processed: bool,
    pub new_lead_score: u32,
}

/// Engagement view of a contact returned by `GET /behavior`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSummary {
    pub contact_id: String,
    pub pages_visited: Vec<String>,
    pub time_on_site: u64,
    pub stories_read: Vec<String>,
    pub letter_submitted: bool,
    pub volunteer_signup: bool,
    pub willing_to_testify: bool,
    pub lead_score: u32,
    pub last_engagement: Option<DateTime<Utc>>,
    pub engagement_level: EngagementLevel,
}
