mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::{MemoryStore, MemoryWriter};
pub use store::{CollectionData, Keys, Records, Snapshot, Store, Writer};
