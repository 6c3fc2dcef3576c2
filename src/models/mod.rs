//! Data models for sqlkv.
//!
//! Backend identities and store definitions shared by the storage layer,
//! the factory and the CLI.

mod store;

pub use store::{BackendType, StoreDefinition, is_plain_identifier};
