//! Driven adapters: PostgreSQL persistence, filesystem media and the
//! in-memory fallbacks.

pub mod media;
pub mod memory;
pub mod persistence;
