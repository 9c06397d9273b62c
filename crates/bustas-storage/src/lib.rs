//! Storage backends for the brokerage API.
//!
//! Two backends implement the store traits and the ownership resolver:
//! [`memory::MemoryStore`] for tests and development, and
//! [`postgres::PostgresStore`] backed by a `PgPool`.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{
    AccountStore, PropertyStore, ReferenceStore, SchedulingStore, SessionStore, StorageError,
    Store,
};
