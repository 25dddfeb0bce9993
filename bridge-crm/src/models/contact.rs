//! Contact records and partial updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engagement classification, derived from the lead score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    /// Lowest score classified as `medium`
    pub const MEDIUM_THRESHOLD: u32 = 25;
    /// Lowest score classified as `high`
    pub const HIGH_THRESHOLD: u32 = 100;

    pub fn from_score(score: u32) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            EngagementLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::Low => "low",
            EngagementLevel::Medium => "medium",
            EngagementLevel::High => "high",
        }
    }
}

/// One person tracked for outreach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// CRM-assigned identifier
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,

    /// Visited page URLs, first-seen order, no duplicates
    #[serde(default)]
    pub pages_visited: Vec<String>,
    /// Total seconds on site
    #[serde(default)]
    pub time_on_site: u64,
    /// Story ids read, first-seen order, no duplicates
    #[serde(default)]
    pub stories_read: Vec<String>,

    #[serde(default)]
    pub letter_submitted: bool,
    #[serde(default)]
    pub volunteer_signup: bool,
    #[serde(default)]
    pub willing_to_testify: bool,

    #[serde(default)]
    pub lead_score: u32,
    #[serde(default)]
    pub last_engagement: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engagement_level: EngagementLevel,

    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub connection_strength: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Contact {
    /// New contact with empty engagement state
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            pages_visited: Vec::new(),
            time_on_site: 0,
            stories_read: Vec::new(),
            letter_submitted: false,
            volunteer_signup: false,
            willing_to_testify: false,
            lead_score: 0,
            last_engagement: None,
            engagement_level: EngagementLevel::Low,
            relationship: None,
            connection_strength: None,
            tags: Vec::new(),
        }
    }

    /// `"First Last"`, trimmed when either part is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Apply a partial update, returning the merged contact
    ///
    /// Fields left as `None` are untouched. Lead score and time on site only
    /// move up. Set-valued fields are deduplicated and conversion flags never
    /// go back to `false`. The engagement level is re-derived from the score.
    pub fn merged(&self, update: &ContactUpdate) -> Result<Contact, UpdateRejected> {
        if let Some(score) = update.lead_score {
            if score < self.lead_score {
                return Err(UpdateRejected::LeadScoreDecrease {
                    current: self.lead_score,
                    requested: score,
                });
            }
        }
        if let Some(seconds) = update.time_on_site {
            if seconds < self.time_on_site {
                return Err(UpdateRejected::TimeOnSiteDecrease {
                    current: self.time_on_site,
                    requested: seconds,
                });
            }
        }

        let mut next = self.clone();

        if let Some(v) = &update.first_name {
            next.first_name = v.clone();
        }
        if let Some(v) = &update.last_name {
            next.last_name = v.clone();
        }
        if let Some(v) = &update.email {
            next.email = v.clone();
        }
        if let Some(v) = &update.phone {
            next.phone = Some(v.clone());
        }
        if let Some(v) = &update.pages_visited {
            next.pages_visited = dedup_preserving_order(v);
        }
        if let Some(v) = update.time_on_site {
            next.time_on_site = v;
        }
        if let Some(v) = &update.stories_read {
            next.stories_read = dedup_preserving_order(v);
        }

        // One-way latches
        next.letter_submitted |= update.letter_submitted.unwrap_or(false);
        next.volunteer_signup |= update.volunteer_signup.unwrap_or(false);
        next.willing_to_testify |= update.willing_to_testify.unwrap_or(false);

        if let Some(v) = update.lead_score {
            next.lead_score = v;
        }
        if let Some(v) = update.last_engagement {
            next.last_engagement = Some(v);
        }
        if let Some(v) = &update.relationship {
            next.relationship = Some(v.clone());
        }
        if let Some(v) = &update.connection_strength {
            next.connection_strength = Some(v.clone());
        }
        if let Some(v) = &update.tags {
            next.tags = v.clone();
        }

        next.engagement_level = EngagementLevel::from_score(next.lead_score);
        Ok(next)
    }
}

/// Partial contact update; `None` means "leave as is"
///
/// Engagement level has no field here; it follows the score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pages_visited: Option<Vec<String>>,
    pub time_on_site: Option<u64>,
    pub stories_read: Option<Vec<String>>,
    pub letter_submitted: Option<bool>,
    pub volunteer_signup: Option<bool>,
    pub willing_to_testify: Option<bool>,
    pub lead_score: Option<u32>,
    pub last_engagement: Option<DateTime<Utc>>,
    pub relationship: Option<String>,
    pub connection_strength: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ContactUpdate {
    /// True when the update would not touch any field
    pub fn is_empty(&self) -> bool {
        *self == ContactUpdate::default()
    }
}

/// Reasons a partial update is refused before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateRejected {
    #[error("lead score cannot decrease (current {current}, requested {requested})")]
    LeadScoreDecrease { current: u32, requested: u32 },

    #[error("time on site cannot decrease (current {current}s, requested {requested}s)")]
    TimeOnSiteDecrease { current: u64, requested: u64 },
}

/// CRM category assigned on bulk import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Consulting,
    Marketing,
    Software,
}

impl Category {
    /// Fixed import rule: `"high"` → CONSULTING, `"medium"` → MARKETING,
    /// anything else (including missing) → SOFTWARE. Matching is exact.
    pub fn from_engagement_level(level: Option<&str>) -> Self {
        match level {
            Some("high") => Category::Consulting,
            Some("medium") => Category::Marketing,
            _ => Category::Software,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Consulting => "CONSULTING",
            Category::Marketing => "MARKETING",
            Category::Software => "SOFTWARE",
        }
    }
}

/// A contact to be created in the CRM
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub relationship: Option<String>,
    pub connection_strength: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<Category>,
}

impl NewContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn dedup_preserving_order(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Contact {
        Contact::new("c1", "Ada", "Lovelace", "ada@example.org")
    }

    #[test]
    fn test_engagement_level_thresholds() {
        assert_eq!(EngagementLevel::from_score(0), EngagementLevel::Low);
        assert_eq!(EngagementLevel::from_score(24), EngagementLevel::Low);
        assert_eq!(EngagementLevel::from_score(25), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_score(99), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_score(100), EngagementLevel::High);
    }

    #[test]
    fn test_merge_leaves_unspecified_fields() {
        let mut contact = sample();
        contact.relationship = Some("family".to_string());
        contact.lead_score = 10;

        let update = ContactUpdate {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let merged = contact.merged(&update).unwrap();

        assert_eq!(merged.phone.as_deref(), Some("555-0100"));
        assert_eq!(merged.relationship.as_deref(), Some("family"));
        assert_eq!(merged.lead_score, 10);
        assert_eq!(merged.first_name, "Ada");
    }

    #[test]
    fn test_merge_rejects_lower_lead_score() {
        let mut contact = sample();
        contact.lead_score = 50;

        let update = ContactUpdate {
            lead_score: Some(49),
            ..Default::default()
        };
        assert_eq!(
            contact.merged(&update),
            Err(UpdateRejected::LeadScoreDecrease { current: 50, requested: 49 })
        );

        let same = ContactUpdate {
            lead_score: Some(50),
            ..Default::default()
        };
        assert!(contact.merged(&same).is_ok());
    }

    #[test]
    fn test_merge_rejects_lower_time_on_site() {
        let mut contact = sample();
        contact.time_on_site = 120;

        let update = ContactUpdate {
            time_on_site: Some(90),
            lead_score: Some(3),
            ..Default::default()
        };
        assert_eq!(
            contact.merged(&update),
            Err(UpdateRejected::TimeOnSiteDecrease { current: 120, requested: 90 })
        );

        let same = ContactUpdate {
            time_on_site: Some(120),
            ..Default::default()
        };
        assert_eq!(contact.merged(&same).unwrap().time_on_site, 120);
    }

    #[test]
    fn test_merge_never_resets_flags() {
        let mut contact = sample();
        contact.letter_submitted = true;

        let update = ContactUpdate {
            letter_submitted: Some(false),
            volunteer_signup: Some(true),
            ..Default::default()
        };
        let merged = contact.merged(&update).unwrap();
        assert!(merged.letter_submitted);
        assert!(merged.volunteer_signup);
        assert!(!merged.willing_to_testify);
    }

    #[test]
    fn test_merge_dedups_sets_and_derives_level() {
        let contact = sample();
        let update = ContactUpdate {
            pages_visited: Some(vec!["/a".into(), "/b".into(), "/a".into()]),
            lead_score: Some(130),
            ..Default::default()
        };
        let merged = contact.merged(&update).unwrap();
        assert_eq!(merged.pages_visited, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(merged.engagement_level, EngagementLevel::High);
    }

    #[test]
    fn test_category_mapping_is_exact() {
        assert_eq!(Category::from_engagement_level(Some("high")), Category::Consulting);
        assert_eq!(Category::from_engagement_level(Some("medium")), Category::Marketing);
        assert_eq!(Category::from_engagement_level(Some("low")), Category::Software);
        assert_eq!(Category::from_engagement_level(Some("High")), Category::Software);
        assert_eq!(Category::from_engagement_level(None), Category::Software);
        assert_eq!(Category::Consulting.as_str(), "CONSULTING");
        assert_eq!(Category::Marketing.as_str(), "MARKETING");
        assert_eq!(Category::Software.as_str(), "SOFTWARE");
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["leadScore"], 0);
        assert_eq!(json["engagementLevel"], "low");
        assert!(json["pagesVisited"].is_array());
    }

    #[test]
    fn test_empty_update() {
        assert!(ContactUpdate::default().is_empty());
        let update = ContactUpdate {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
