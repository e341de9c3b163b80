//! Core domain types
//!
//! This module contains the core domain structures used across Inkfleet
//! services. These types represent the fundamental business entities and are
//! shared between the coordinator (for dispatch/presence) and the agent
//! (for spooling and rendering).

pub mod agent;
pub mod job;
