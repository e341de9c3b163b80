//! Inkfleet Core
//!
//! Core types and abstractions for the Inkfleet print dispatch system.
//!
//! This crate contains:
//! - Domain types: Core business entities (PrintJob, AgentRecord, etc.)
//! - DTOs: Data transfer objects for coordinator/agent communication

pub mod domain;
pub mod dto;
