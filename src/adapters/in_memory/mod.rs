pub mod entity_store;
pub mod seed;
pub mod transaction;

pub use entity_store::{EntityStore as InMemoryEntityStore, InMemoryStoreError};
pub use seed::{Seed, SeedError};
pub use transaction::InMemoryTransaction;
