// Adapters layer: concrete implementations of the domain ports.

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::{InMemoryCategoryDirectory, InMemoryPlanogramStore};
