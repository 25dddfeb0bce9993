//! ClickUp API client
//!
//! Contacts live as tasks in one ClickUp list; contact attributes are the
//! list's custom fields. Only the endpoints this service needs are wrapped:
//!
//! - `GET  /list/{list_id}/field` - custom field definitions
//! - `GET  /list/{list_id}/task` - paged task listing, optional field filter
//! - `POST /list/{list_id}/task` - create task
//! - `GET  /task/{task_id}` - single task
//! - `PUT  /task/{task_id}` - rename task
//! - `POST /task/{task_id}/field/{field_id}` - set one custom field
//! - `POST|DELETE /task/{task_id}/tag/{tag}` - add or remove a tag

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ClickUpConfig;

const USER_AGENT: &str = concat!("bridge-crm/", env!("CARGO_PKG_VERSION"));
/// Upper bound on pages fetched by [`ClickUpClient::list_tasks`]
const MAX_TASK_PAGES: u32 = 200;

/// ClickUp client errors
#[derive(Debug, Error)]
pub enum ClickUpError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("ClickUp rejected the API key")]
    Unauthorized,

    #[error("ClickUp rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClickUpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClickUpError::Timeout
        } else if e.is_decode() {
            ClickUpError::Parse(e.to_string())
        } else {
            ClickUpError::Network(e.to_string())
        }
    }
}

/// Custom field definition on a list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListField {
    pub id: String,
    pub name: String,
    /// ClickUp field type (`short_text`, `number`, `checkbox`, `drop_down`, ...)
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub type_config: Option<TypeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TypeConfig {
    #[serde(default)]
    pub options: Vec<DropdownOption>,
}

/// One option of a `drop_down` field
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DropdownOption {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub orderindex: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ListFieldsResponse {
    #[serde(default)]
    fields: Vec<ListField>,
}

/// A ClickUp task (one contact)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClickUpTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom_fields: Vec<TaskCustomField>,
    #[serde(default)]
    pub tags: Vec<ClickUpTag>,
}

/// Custom field value as returned on a task
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskCustomField {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClickUpTag {
    pub name: String,
}

/// One page of a task listing
#[derive(Debug, Deserialize)]
pub struct TaskPage {
    #[serde(default)]
    pub tasks: Vec<ClickUpTask>,
    #[serde(default)]
    pub last_page: Option<bool>,
}

/// Custom field value sent when creating a task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFieldValue {
    pub id: String,
    pub value: Value,
}

/// `POST /list/{list_id}/task` body
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldValue>,
}

/// ClickUp API client
pub struct ClickUpClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    list_id: String,
}

impl ClickUpClient {
    pub fn new(config: &ClickUpConfig) -> Result<Self, ClickUpError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClickUpError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            list_id: config.list_id.clone(),
        })
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    /// Custom field definitions of the contact list
    pub async fn get_list_fields(&self) -> Result<Vec<ListField>, ClickUpError> {
        let url = format!("{}/list/{}/field", self.base_url, self.list_id);
        let response: ListFieldsResponse = self
            .send(self.http_client.get(&url), &format!("list {}", self.list_id))
            .await?;
        Ok(response.fields)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<ClickUpTask, ClickUpError> {
        let url = format!("{}/task/{}", self.base_url, task_id);
        self.send(self.http_client.get(&url), &format!("task {}", task_id))
            .await
    }

    /// One page (0-based) of the list's tasks, closed tasks included
    pub async fn list_tasks_page(
        &self,
        page: u32,
        field_filter: Option<(&str, &str)>,
    ) -> Result<TaskPage, ClickUpError> {
        let url = format!("{}/list/{}/task", self.base_url, self.list_id);
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("include_closed", "true".to_string()),
        ];
        if let Some((field_id, value)) = field_filter {
            let filter = json!([{ "field_id": field_id, "operator": "=", "value": value }]);
            query.push(("custom_fields", filter.to_string()));
        }

        self.send(
            self.http_client.get(&url).query(&query),
            &format!("list {}", self.list_id),
        )
        .await
    }

    /// All tasks of the list, following pagination
    pub async fn list_tasks(&self) -> Result<Vec<ClickUpTask>, ClickUpError> {
        self.collect_pages(None).await
    }

    /// Tasks whose custom field equals `value`
    pub async fn find_tasks_by_field(
        &self,
        field_id: &str,
        value: &str,
    ) -> Result<Vec<ClickUpTask>, ClickUpError> {
        self.collect_pages(Some((field_id, value))).await
    }

    async fn collect_pages(
        &self,
        field_filter: Option<(&str, &str)>,
    ) -> Result<Vec<ClickUpTask>, ClickUpError> {
        let mut tasks = Vec::new();
        for page in 0..MAX_TASK_PAGES {
            let batch = self.list_tasks_page(page, field_filter).await?;
            let done = batch.tasks.is_empty() || batch.last_page.unwrap_or(false);
            tasks.extend(batch.tasks);
            if done {
                return Ok(tasks);
            }
        }
        tracing::warn!(
            list_id = %self.list_id,
            pages = MAX_TASK_PAGES,
            "Task listing truncated at page limit"
        );
        Ok(tasks)
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<ClickUpTask, ClickUpError> {
        let url = format!("{}/list/{}/task", self.base_url, self.list_id);
        let task: ClickUpTask = self
            .send(
                self.http_client.post(&url).json(request),
                &format!("list {}", self.list_id),
            )
            .await?;

        tracing::info!(task_id = %task.id, name = %task.name, "Created ClickUp task");
        Ok(task)
    }

    pub async fn update_task_name(&self, task_id: &str, name: &str) -> Result<(), ClickUpError> {
        let url = format!("{}/task/{}", self.base_url, task_id);
        let _: Value = self
            .send(
                self.http_client.put(&url).json(&json!({ "name": name })),
                &format!("task {}", task_id),
            )
            .await?;
        Ok(())
    }

    pub async fn set_custom_field(
        &self,
        task_id: &str,
        field_id: &str,
        value: &Value,
    ) -> Result<(), ClickUpError> {
        let url = format!("{}/task/{}/field/{}", self.base_url, task_id, field_id);
        let _: Value = self
            .send(
                self.http_client.post(&url).json(&json!({ "value": value })),
                &format!("task {}", task_id),
            )
            .await?;
        Ok(())
    }

    pub async fn add_tag(&self, task_id: &str, tag: &str) -> Result<(), ClickUpError> {
        let url = self.tag_url(task_id, tag)?;
        let _: Value = self
            .send(self.http_client.post(url), &format!("task {}", task_id))
            .await?;
        Ok(())
    }

    pub async fn remove_tag(&self, task_id: &str, tag: &str) -> Result<(), ClickUpError> {
        let url = self.tag_url(task_id, tag)?;
        let _: Value = self
            .send(self.http_client.delete(url), &format!("task {}", task_id))
            .await?;
        Ok(())
    }

    /// Tag names are free text and need path-segment encoding
    fn tag_url(&self, task_id: &str, tag: &str) -> Result<reqwest::Url, ClickUpError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClickUpError::Network(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClickUpError::Network("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["task", task_id, "tag", tag]);
        Ok(url)
    }

    /// Attach auth, send, map status codes, decode JSON
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ClickUpError> {
        let response = request
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, resource = %resource, "ClickUp response");

        match status {
            StatusCode::NOT_FOUND => return Err(ClickUpError::NotFound(resource.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ClickUpError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ClickUpError::RateLimited),
            s if !s.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                return Err(ClickUpError::Api(s.as_u16(), error_text));
            }
            _ => {}
        }

        // Some endpoints answer with an empty body
        let bytes = response.bytes().await?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes[..]
        };
        serde_json::from_slice(body).map_err(|e| ClickUpError::Parse(e.to_string()))
    }
}
