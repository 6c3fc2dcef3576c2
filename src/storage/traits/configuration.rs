//! Backend configuration trait.

use crate::models::{BackendType, StoreDefinition};
use crate::storage::DialectStrategy;
use crate::Result;
use std::sync::Arc;

/// A configured backend instance: one pool plus the dialect that speaks to it.
///
/// The registration layer maps a backend type name to one of these and asks
/// it for a strategy per store.
pub trait StorageConfiguration: Send + Sync {
    /// Backend type this configuration was built for.
    fn backend_type(&self) -> BackendType;

    /// Returns a strategy bound to `name` and the shared pool.
    ///
    /// Does not check whether the table exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`](crate::Error::ConfigurationFailure)
    /// after [`close`](Self::close).
    fn open_store(&self, name: &str) -> Result<Arc<dyn DialectStrategy>>;

    /// Forgets a store. Stores share one pool, so there is nothing to dispose.
    fn remove_store(&self, name: &str);

    /// Updates a store definition.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation).
    fn update(&self, definition: &StoreDefinition) -> Result<()>;

    /// Closes the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`](crate::Error::ConfigurationFailure)
    /// if the pool fails to close.
    fn close(&self) -> Result<()>;
}
