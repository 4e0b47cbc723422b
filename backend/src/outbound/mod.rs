//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: the in-memory document store
//! - **security**: Argon2id password hashing
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod persistence;
pub mod security;
