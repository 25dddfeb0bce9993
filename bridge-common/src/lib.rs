//! # Bridge Common Library
//!
//! Shared code for the Bridge Project services including:
//! - Common error type
//! - Configuration file and environment resolution
//! - API response envelope and admin bearer-token checks
//! - Timestamp helpers

pub mod api;
pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
