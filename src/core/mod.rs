//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Search request, event and report model
//! - Runtime configuration and error types
//! - Rendering functions for different output formats
//! - Path normalization and root confinement
//! - File reading for the view operation
//! - Common utilities

pub mod config;
pub mod error;
pub mod file_reader;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
