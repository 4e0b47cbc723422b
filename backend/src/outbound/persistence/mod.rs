//! Document persistence adapters.
//!
//! The in-memory store keeps each collection as an ordered list of JSON
//! documents and applies the collection schemas on every read and write:
//! filters are cast to field types, hidden fields and invisible documents
//! are withheld and references are populated.

mod in_memory_store;
mod matching;
mod ordering;
mod presentation;

pub use in_memory_store::InMemoryDocumentStore;
