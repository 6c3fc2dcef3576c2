//! Storage traits.
//!
//! The generic engine only ever sees these seams: a [`DialectStrategy`] per
//! store, a [`StorageConfiguration`] per backend, and the
//! [`ConnectionSource`] both of them are built on.

mod configuration;
mod source;
mod strategy;

pub use configuration::StorageConfiguration;
pub use source::{ConnectionSource, SqlConnection};
pub use strategy::DialectStrategy;
