//! Infrastructure layer: storage backends, configuration and sample data.

pub mod config;
pub mod seed;
pub mod store;
pub mod stores;

pub use config::AppConfig;
pub use store::{DynStore, InMemoryStore, PostgresJsonStore, Store, StoreError};
pub use stores::{Collection, Stores};
