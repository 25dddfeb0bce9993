//! ClickUp-backed contact store
//!
//! Each contact is a task in the configured list. The list's field ids are
//! fetched on first use and cached; the admin field diagnostic refreshes
//! the cache.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::clickup_client::{ClickUpClient, ClickUpError, ClickUpTask, CreateTaskRequest};
use super::contact_store::{ContactStore, FieldEntry, FieldReport, StoreError};
use super::field_mapping::{changed_fields, new_contact_fields, ContactField, FieldMap};
use crate::models::{Contact, ContactUpdate, NewContact};
use crate::validators::normalize_email;

pub struct ClickUpContactStore {
    client: ClickUpClient,
    field_map: RwLock<Option<Arc<FieldMap>>>,
}

impl ClickUpContactStore {
    pub fn new(client: ClickUpClient) -> Self {
        Self {
            client,
            field_map: RwLock::new(None),
        }
    }

    /// Cached field map, loading it on first use
    pub async fn field_map(&self) -> Result<Arc<FieldMap>, StoreError> {
        if let Some(map) = self.field_map.read().await.as_ref() {
            return Ok(Arc::clone(map));
        }
        self.refresh_field_map().await.map(|(map, _)| map)
    }

    async fn refresh_field_map(
        &self,
    ) -> Result<(Arc<FieldMap>, Vec<super::clickup_client::ListField>), StoreError> {
        let fields = self.client.get_list_fields().await?;
        let map = Arc::new(FieldMap::from_list_fields(&fields));

        let unmapped = map.unmapped();
        if !unmapped.is_empty() {
            warn!(
                list_id = %self.client.list_id(),
                unmapped = ?unmapped.iter().map(|f| f.crm_name()).collect::<Vec<_>>(),
                "ClickUp list is missing custom fields; writes to them will fail"
            );
        }

        *self.field_map.write().await = Some(Arc::clone(&map));
        Ok((map, fields))
    }

    async fn fetch_task_contact(&self, id: &str) -> Result<Contact, StoreError> {
        let map = self.field_map().await?;
        let task = self.client.get_task(id).await.map_err(|e| match e {
            ClickUpError::NotFound(_) => StoreError::NotFound(id.to_string()),
            other => StoreError::Upstream(other),
        })?;
        Ok(map.decode_task(&task))
    }
}

#[async_trait]
impl ContactStore for ClickUpContactStore {
    async fn get_contact_by_id(&self, id: &str) -> Result<Contact, StoreError> {
        self.fetch_task_contact(id).await
    }

    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Contact, StoreError> {
        let map = self.field_map().await?;
        let current = self.fetch_task_contact(id).await?;
        let next = current.merged(&update)?;

        // Encode everything before the first write so a mapping error leaves the task untouched
        let encoded = map.encode_all(&changed_fields(&current, &next))?;

        if current.full_name() != next.full_name() {
            self.client.update_task_name(id, &next.full_name()).await?;
        }
        for value in &encoded {
            self.client.set_custom_field(id, &value.id, &value.value).await?;
        }
        for tag in next.tags.iter().filter(|t| !current.tags.contains(t)) {
            self.client.add_tag(id, tag).await?;
        }
        for tag in current.tags.iter().filter(|t| !next.tags.contains(t)) {
            self.client.remove_tag(id, tag).await?;
        }

        debug!(contact_id = %id, fields = encoded.len(), "Updated ClickUp contact");
        Ok(next)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, StoreError> {
        let map = self.field_map().await?;
        let field_id = map.field_id(ContactField::Email)?;
        let wanted = normalize_email(email);

        let tasks = self.client.find_tasks_by_field(field_id, &wanted).await?;
        let mut matches = matching_email(&map, &tasks, &wanted);

        // The field filter compares exactly, so a stored address in another case is missed
        if matches.is_empty() {
            debug!(email = %wanted, "No exact email match, scanning list");
            let tasks = self.client.list_tasks().await?;
            matches = matching_email(&map, &tasks, &wanted);
        }

        if matches.len() > 1 {
            warn!(email = %wanted, count = matches.len(), "Multiple CRM contacts share an email");
        }
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches.into_iter().next())
    }

    async fn create_contact(&self, new: NewContact) -> Result<Contact, StoreError> {
        let map = self.field_map().await?;
        let custom_fields = map.encode_all(&new_contact_fields(&new))?;

        let task = self
            .client
            .create_task(&CreateTaskRequest {
                name: new.full_name(),
                tags: new.tags.clone(),
                custom_fields,
            })
            .await?;

        let mut contact = Contact::new(task.id, new.first_name, new.last_name, new.email);
        contact.phone = new.phone;
        contact.relationship = new.relationship;
        contact.connection_strength = new.connection_strength;
        contact.tags = new.tags;
        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let map = self.field_map().await?;
        let tasks = self.client.list_tasks().await?;
        Ok(tasks.iter().map(|t| map.decode_task(t)).collect())
    }

    async fn field_report(&self) -> Result<FieldReport, StoreError> {
        let (map, fields) = self.refresh_field_map().await?;

        info!(list_id = %self.client.list_id(), count = fields.len(), "ClickUp custom fields");
        for field in &fields {
            info!(id = %field.id, name = %field.name, field_type = %field.field_type, "  field");
        }

        Ok(FieldReport {
            backend: self.backend_name().to_string(),
            fields: fields
                .into_iter()
                .map(|f| FieldEntry {
                    id: f.id,
                    name: f.name,
                    field_type: f.field_type,
                })
                .collect(),
            mapped: map.mapped().iter().map(|f| f.crm_name().to_string()).collect(),
            unmapped: map.unmapped().iter().map(|f| f.crm_name().to_string()).collect(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "clickup"
    }
}

fn matching_email(map: &FieldMap, tasks: &[ClickUpTask], wanted: &str) -> Vec<Contact> {
    tasks
        .iter()
        .map(|t| map.decode_task(t))
        .filter(|c| normalize_email(&c.email) == wanted)
        .collect()
}
