//! Model storage: the live model store and its collaborator traits.

mod document;
mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use document::ModelDocument;
pub use memory::{InMemoryPersistence, InMemorySeedCorpus, ModelHandle, ModelStore};
pub use traits::{ModelPersistence, SeedCorpus, SeedEntity, SeedGraph, SeedLink, StorageError};

pub(crate) use memory::lock_err;
