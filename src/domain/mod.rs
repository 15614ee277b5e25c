//! Domain layer - Core business logic
//! 
//! This layer contains:
//! - Entities: Core business objects (Command, IncomingEvent, Reply, Person)
//! - Traits: Abstractions for infrastructure (MessagingApi)

pub mod entities;
pub mod traits;
