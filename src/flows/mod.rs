//! Flows module - Operations combining the collector, projector and reader
//!
//! Provides:
//! - project: Group collected events into per-file results
//! - auth: Authorization collaborator for search and view
//! - service: Search and view entry points

pub mod auth;
pub mod project;
pub mod service;
