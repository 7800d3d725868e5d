//! user-cleanup: cascading removal of a deleted user's footprint, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
