//! CRM-wide engagement analytics

use serde::Serialize;
use std::collections::BTreeMap;

use super::contact_store::{ContactStore, StoreError};
use crate::models::Contact;

/// Bucket used for contacts with no relationship or connection strength
pub const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversions {
    pub letters: usize,
    pub volunteers: usize,
    pub testimonies: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmAnalytics {
    pub total_contacts: usize,
    pub by_relationship: BTreeMap<String, usize>,
    pub by_engagement_level: BTreeMap<String, usize>,
    pub by_connection_strength: BTreeMap<String, usize>,
    pub conversions: Conversions,
    /// Mean lead score, rounded to one decimal; 0 for an empty CRM
    pub average_lead_score: f64,
}

impl CrmAnalytics {
    pub fn from_contacts(contacts: &[Contact]) -> Self {
        let mut analytics = CrmAnalytics {
            total_contacts: contacts.len(),
            ..Default::default()
        };

        // Every level appears, even at zero
        for level in ["low", "medium", "high"] {
            analytics.by_engagement_level.insert(level.to_string(), 0);
        }

        let mut score_sum: u64 = 0;
        for contact in contacts {
            *analytics
                .by_relationship
                .entry(bucket(&contact.relationship))
                .or_default() += 1;
            *analytics
                .by_connection_strength
                .entry(bucket(&contact.connection_strength))
                .or_default() += 1;
            *analytics
                .by_engagement_level
                .entry(contact.engagement_level.as_str().to_string())
                .or_default() += 1;

            analytics.conversions.letters += usize::from(contact.letter_submitted);
            analytics.conversions.volunteers += usize::from(contact.volunteer_signup);
            analytics.conversions.testimonies += usize::from(contact.willing_to_testify);
            score_sum += u64::from(contact.lead_score);
        }

        if !contacts.is_empty() {
            let mean = score_sum as f64 / contacts.len() as f64;
            analytics.average_lead_score = (mean * 10.0).round() / 10.0;
        }

        analytics
    }
}

fn bucket(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNSPECIFIED)
        .to_string()
}

pub async fn get_crm_analytics(store: &dyn ContactStore) -> Result<CrmAnalytics, StoreError> {
    let contacts = store.list_contacts().await?;
    Ok(CrmAnalytics::from_contacts(&contacts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EngagementLevel;

    fn contact(id: &str, score: u32, relationship: Option<&str>) -> Contact {
        let mut c = Contact::new(id, "F", "L", format!("{}@example.org", id));
        c.lead_score = score;
        c.engagement_level = EngagementLevel::from_score(score);
        c.relationship = relationship.map(str::to_string);
        c
    }

    #[test]
    fn test_empty_crm() {
        let analytics = CrmAnalytics::from_contacts(&[]);
        assert_eq!(analytics.total_contacts, 0);
        assert_eq!(analytics.average_lead_score, 0.0);
        assert_eq!(analytics.by_engagement_level["high"], 0);
        assert!(analytics.by_relationship.is_empty());
    }

    #[test]
    fn test_counts_and_average() {
        let mut a = contact("a", 10, Some("family"));
        a.letter_submitted = true;
        let mut b = contact("b", 120, Some("family"));
        b.volunteer_signup = true;
        b.willing_to_testify = true;
        let c = contact("c", 31, None);

        let analytics = CrmAnalytics::from_contacts(&[a, b, c]);
        assert_eq!(analytics.total_contacts, 3);
        assert_eq!(analytics.by_relationship["family"], 2);
        assert_eq!(analytics.by_relationship[UNSPECIFIED], 1);
        assert_eq!(analytics.by_engagement_level["low"], 1);
        assert_eq!(analytics.by_engagement_level["medium"], 1);
        assert_eq!(analytics.by_engagement_level["high"], 1);
        assert_eq!(
            analytics.conversions,
            Conversions {
                letters: 1,
                volunteers: 1,
                testimonies: 1
            }
        );
        assert_eq!(analytics.average_lead_score, 53.7);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(CrmAnalytics::from_contacts(&[])).unwrap();
        assert!(json.get("totalContacts").is_some());
        assert!(json.get("byConnectionStrength").is_some());
        assert!(json["conversions"].get("testimonies").is_some());
    }
}
