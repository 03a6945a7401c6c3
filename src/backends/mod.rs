//! Backends module - External tool integrations
//!
//! Provides:
//! - rg: ripgrep invocation and `--json` decoding
//! - collector: Bounded streaming collection from the search process
//! - doctor: Dependency checking

pub mod collector;
pub mod doctor;
pub mod rg;
