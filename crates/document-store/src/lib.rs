//! Document store client for the `products` and `users` collections.
//!
//! The [`DocumentStore`] trait is the only way the core reaches storage.
//! Every user update is scoped to a single user document and applied as one
//! statement; nothing spans statements, so multi-step operations built on
//! top of it are not atomic.

pub mod error;
pub mod filter;
pub mod memory;
pub mod pipeline;
pub mod postgres;
pub mod store;
pub mod update;

pub use common::{ProductId, UserId};
pub use error::{Result, StoreError};
pub use filter::ProductFilter;
pub use memory::InMemoryDocumentStore;
pub use pipeline::{Accumulator, GroupRow, Pipeline, Stage, UserArray};
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt};
pub use update::{UpdateKind, UpdateResult, UserUpdate};
