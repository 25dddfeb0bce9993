//! HTTP API handlers for bridge-crm

pub mod behavior;
pub mod client_ip;
pub mod health;
pub mod sync;

pub use behavior::behavior_routes;
pub use client_ip::ClientIp;
pub use health::health_routes;
pub use sync::sync_routes;
