//! Request validation
//!
//! Everything that can be rejected is rejected here, before any contact is
//! loaded or written.
//!
//! # Validators
//! 1. **email** - Syntactic email address check
//! 2. **behavior** - `POST /behavior` body → [`BehaviorEvent`](crate::models::BehaviorEvent)
//! 3. **sync** - `POST /sync` body and per-item contact checks

pub mod behavior;
pub mod email;
pub mod sync;

pub use behavior::validate_behavior_request;
pub use email::{is_valid_email, normalize_email};
pub use sync::{parse_contact_item, validate_contact_input, validate_sync_request, MAX_BATCH_SIZE};
