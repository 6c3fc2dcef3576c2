//! Services.
//!
//! The [`BackendFactory`] turns a [`BackendConfig`](crate::config::BackendConfig)
//! into a running backend.

mod backend_factory;

pub use backend_factory::BackendFactory;
