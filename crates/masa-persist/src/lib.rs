pub mod error;
pub mod trait_client;
pub mod memory;
pub mod feedback;
pub mod dbs;

pub use error::{PersistError, Result};
pub use trait_client::PersistenceClient;
pub use memory::{InMemoryPersistence, DEFAULT_MAX_SESSIONS};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
