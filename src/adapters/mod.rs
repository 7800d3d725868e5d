//! Infrastructure adapters. Implement outbound ports.
//!
//! SQLite collections, the uploads directory, log sinks. Map errors to DomainError.

pub mod logging;
pub mod persistence;
