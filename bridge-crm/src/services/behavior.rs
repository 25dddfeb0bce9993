//! Behavior event processing
//!
//! [`apply_event`] is a pure reducer from (contact, event) to the partial
//! update that records it. [`process_behavior_event`] loads the contact,
//! reduces, and writes the result through one `update_contact` call.
//!
//! Another event for the same contact can land between the load and the
//! write. The store then refuses the stale update as a score decrease, and
//! the event is re-applied to a fresh read.

use tracing::{debug, info, warn};

use super::contact_store::{ContactStore, StoreError};
use crate::models::{
    BehaviorEvent, BehaviorOutcome, BehaviorSummary, Contact, ContactUpdate, EventType,
};

/// Partial update recording `event` against `contact`
///
/// Only touched fields are set. The score always rises by the event's
/// points; visited sets gain the new entry only if it is absent.
pub fn apply_event(contact: &Contact, event: &BehaviorEvent) -> ContactUpdate {
    let mut update = ContactUpdate {
        lead_score: Some(contact.lead_score.saturating_add(event.event_type.points())),
        last_engagement: Some(event.timestamp),
        ..Default::default()
    };

    match event.event_type {
        EventType::PageView => {
            if let Some(url) = &event.event_data.page_url {
                if !contact.pages_visited.contains(url) {
                    let mut pages = contact.pages_visited.clone();
                    pages.push(url.clone());
                    update.pages_visited = Some(pages);
                }
            }
            let spent = event.event_data.time_spent.unwrap_or(0);
            if spent > 0 {
                update.time_on_site = Some(contact.time_on_site.saturating_add(spent));
            }
        }
        EventType::StoryRead => {
            if let Some(story) = &event.event_data.story_id {
                if !contact.stories_read.contains(story) {
                    let mut stories = contact.stories_read.clone();
                    stories.push(story.clone());
                    update.stories_read = Some(stories);
                }
            }
        }
        EventType::LetterSubmitted => update.letter_submitted = Some(true),
        EventType::VolunteerSignup => update.volunteer_signup = Some(true),
        EventType::TestimonyWillingness => update.willing_to_testify = Some(true),
        EventType::VideoWatched | EventType::ResourceDownloaded | EventType::Custom => {}
    }

    update
}

/// Attempts at recording one event before a conflicting write is reported
pub const MAX_EVENT_ATTEMPTS: usize = 3;

/// Load, reduce, write
///
/// An unknown contact fails with `NotFound` before anything is written.
pub async fn process_behavior_event(
    store: &dyn ContactStore,
    event: &BehaviorEvent,
) -> Result<BehaviorOutcome, StoreError> {
    let mut attempt = 1;
    let updated = loop {
        match record_once(store, event).await {
            Err(StoreError::InvalidUpdate(reason)) if attempt < MAX_EVENT_ATTEMPTS => {
                warn!(
                    contact_id = %event.contact_id,
                    attempt,
                    %reason,
                    "Contact changed while recording event, retrying"
                );
                attempt += 1;
            }
            result => break result?,
        }
    };

    info!(
        contact_id = %updated.id,
        event_type = event.event_type.as_str(),
        lead_score = updated.lead_score,
        engagement_level = updated.engagement_level.as_str(),
        "Behavior event processed"
    );

    Ok(BehaviorOutcome {
        contact_id: updated.id,
        event_processed: true,
        new_lead_score: updated.lead_score,
    })
}

async fn record_once(
    store: &dyn ContactStore,
    event: &BehaviorEvent,
) -> Result<Contact, StoreError> {
    let contact = store.get_contact_by_id(&event.contact_id).await?;
    let update = apply_event(&contact, event);

    debug!(
        contact_id = %event.contact_id,
        event_type = event.event_type.as_str(),
        extra_keys = event.event_data.extra.len(),
        "Applying behavior event"
    );

    store.update_contact(&event.contact_id, update).await
}

/// Engagement view of one contact
pub async fn behavior_summary(
    store: &dyn ContactStore,
    contact_id: &str,
) -> Result<BehaviorSummary, StoreError> {
    let contact = store.get_contact_by_id(contact_id).await?;
    Ok(BehaviorSummary {
        contact_id: contact.id,
        pages_visited: contact.pages_visited,
        time_on_site: contact.time_on_site,
        stories_read: contact.stories_read,
        letter_submitted: contact.letter_submitted,
        volunteer_signup: contact.volunteer_signup,
        willing_to_testify: contact.willing_to_testify,
        lead_score: contact.lead_score,
        last_engagement: contact.last_engagement,
        engagement_level: contact.engagement_level,
    })
}
