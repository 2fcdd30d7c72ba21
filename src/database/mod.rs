pub mod document_store;
pub mod memory_store;
pub mod pg_store;
pub mod pool;

pub use document_store::{DocumentStore, SharedStore};
pub use memory_store::MemoryDocumentStore;
pub use pg_store::PgDocumentStore;
