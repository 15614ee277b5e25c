//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Commands: Built-in commands and the command builder
//! - Services: Approval policy
//! - Errors: Domain-specific errors
//! - Messaging: Parsing, matching, execution, reply routing, dispatching

pub mod commands;
pub mod errors;
pub mod services;
pub mod messaging;
