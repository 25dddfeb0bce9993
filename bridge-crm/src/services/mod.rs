//! Business logic services
//!
//! # Services
//! 1. **clickup_client** - ClickUp REST API client
//! 2. **field_mapping** - Contact fields ↔ ClickUp custom fields
//! 3. **contact_store** - Contact accessor trait and in-memory backend
//! 4. **clickup_store** - ClickUp-backed contact accessor
//! 5. **behavior** - Engagement event scoring
//! 6. **sync** - Batch sync and bulk import
//! 7. **analytics** - CRM-wide counts
//! 8. **rate_limiter** - Fixed-window limiter for batch requests

pub mod analytics;
pub mod behavior;
pub mod clickup_client;
pub mod clickup_store;
pub mod contact_store;
pub mod field_mapping;
pub mod rate_limiter;
pub mod sync;

pub use analytics::{get_crm_analytics, CrmAnalytics};
pub use behavior::{apply_event, behavior_summary, process_behavior_event, MAX_EVENT_ATTEMPTS};
pub use clickup_client::{ClickUpClient, ClickUpError};
pub use clickup_store::ClickUpContactStore;
pub use contact_store::{ContactStore, FieldReport, InMemoryContactStore, StoreError};
pub use field_mapping::{ContactField, FieldMap, MappingError};
pub use rate_limiter::{FixedWindowRateLimiter, RateLimiter};
pub use sync::{bulk_import_contacts, run_sync, sync_contacts};
