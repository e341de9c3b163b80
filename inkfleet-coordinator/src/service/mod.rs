//! Service Module
//!
//! Business logic layer for the coordinator.
//! Services orchestrate between the registry, connection table and API.

pub mod agent;
pub mod dispatch;

// Re-export for convenience
pub use agent as agent_service;
pub use dispatch as dispatch_service;
