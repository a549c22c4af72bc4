//! Aggregate stores
//!
//! In-memory reference implementations of the external persistence
//! contracts. A durable backend must keep the same semantics: keyed
//! get/save/update/delete plus serialized per-id read-modify-write.

pub mod memory;

pub use memory::{MemoryProposalStore, MemoryTransactionStore};
