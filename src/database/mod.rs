pub mod manager;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use repository::Repository;
pub use store::{DocumentStore, FindOptions};
