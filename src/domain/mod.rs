//! Domain layer - Pure business abstractions
//!
//! Trait definitions, DTOs and the domain error type. Only the
//! `From<DbErr>` conversion knows about SeaORM.

pub mod errors;
pub mod repositories;

pub use errors::DomainError;
pub use repositories::*;
