//! Data models for the engagement and sync service

pub mod behavior;
pub mod contact;
pub mod sync;

pub use behavior::{
    BehaviorEvent, BehaviorEventRequest, BehaviorOutcome, BehaviorSummary, EventData, EventType,
};
pub use contact::{
    Category, Contact, ContactUpdate, EngagementLevel, NewContact, UpdateRejected,
};
pub use sync::{
    ContactInput, SyncAction, SyncFailure, SyncMode, SyncReport, SyncRequest, SyncSuccess,
};
