//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Messaging backends (Webex REST, local console)

pub mod config;
pub mod adapters;
