//! Storage backends: the `Store` trait, an in-memory store and a Fjall-backed store.

mod fjall_store;
mod memory;
mod store;

pub use fjall_store::FjallStore;
pub use memory::MemoryStore;
pub use store::{PostingsRecord, Store};
