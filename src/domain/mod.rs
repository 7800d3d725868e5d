//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod repair;

pub use entities::{Conversation, Friendship, Media, Message, RecordId, User};
pub use errors::DomainError;
pub use repair::{
    CreatorSelection, DeleteReason, ReconcileOptions, Repair, random_index, repair_conversation,
};
