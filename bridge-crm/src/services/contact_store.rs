//! Contact accessor
//!
//! [`ContactStore`] is the only way handlers and services read or write
//! contacts. Two backends exist: the ClickUp list
//! ([`ClickUpContactStore`](super::clickup_store::ClickUpContactStore)) and
//! the process-local [`InMemoryContactStore`].
//!
//! Updates are read-modify-write without locking across requests: two
//! concurrent updates to one contact are last-write-wins.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::clickup_client::ClickUpError;
use super::field_mapping::{ContactField, MappingError};
use crate::models::{Contact, ContactUpdate, NewContact, UpdateRejected};
use crate::validators::normalize_email;

/// Contact store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Contact not found: {0}")]
    NotFound(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(#[from] UpdateRejected),

    #[error("Field mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("CRM request failed: {0}")]
    Upstream(#[from] ClickUpError),
}

/// One custom field as seen on the backing list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub id: String,
    pub name: String,
    pub field_type: String,
}

/// Field diagnostic: what the backend has and which contact fields resolve
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub backend: String,
    pub fields: Vec<FieldEntry>,
    pub mapped: Vec<String>,
    pub unmapped: Vec<String>,
}

/// Read/write access to contact state
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Full contact, or `NotFound`
    async fn get_contact_by_id(&self, id: &str) -> Result<Contact, StoreError>;

    /// Merge `update` into the stored contact and return the result
    ///
    /// Fails with `InvalidUpdate` (nothing written) if the update would
    /// lower the lead score or time on site.
    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Contact, StoreError>;

    /// Contact whose email matches, ignoring case
    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, StoreError>;

    async fn create_contact(&self, contact: NewContact) -> Result<Contact, StoreError>;

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError>;

    /// Field-id diagnostic for the admin endpoint
    async fn field_report(&self) -> Result<FieldReport, StoreError>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Process-local contact store
///
/// Used for tests and for running without CRM credentials.
#[derive(Default)]
pub struct InMemoryContactStore {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with contacts, keyed by their ids
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self {
            contacts: RwLock::new(contacts.into_iter().map(|c| (c.id.clone(), c)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn get_contact_by_id(&self, id: &str) -> Result<Contact, StoreError> {
        self.contacts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Contact, StoreError> {
        let mut contacts = self.contacts.write().await;
        let current = contacts
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let next = current.merged(&update)?;
        contacts.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, StoreError> {
        let wanted = normalize_email(email);
        let contacts = self.contacts.read().await;
        let mut matches: Vec<&Contact> = contacts
            .values()
            .filter(|c| normalize_email(&c.email) == wanted)
            .collect();
        // Deterministic pick when duplicates exist
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches.first().map(|c| (*c).clone()))
    }

    async fn create_contact(&self, new: NewContact) -> Result<Contact, StoreError> {
        let mut contact = Contact::new(
            format!("mem-{}", Uuid::new_v4()),
            new.first_name,
            new.last_name,
            new.email,
        );
        contact.phone = new.phone;
        contact.relationship = new.relationship;
        contact.connection_strength = new.connection_strength;
        contact.tags = new.tags;

        self.contacts
            .write()
            .await
            .insert(contact.id.clone(), contact.clone());
        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let mut all: Vec<Contact> = self.contacts.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn field_report(&self) -> Result<FieldReport, StoreError> {
        Ok(FieldReport {
            backend: self.backend_name().to_string(),
            fields: Vec::new(),
            mapped: ContactField::ALL.iter().map(|f| f.crm_name().to_string()).collect(),
            unmapped: Vec::new(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
