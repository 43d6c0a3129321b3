//! Core types for dmodel
//!
//! This crate defines the foundational types used throughout the workspace:
//! - StoreId / ItemId: identities of data stores and the items they own
//! - Error: error type hierarchy, including the structured SystemError used
//!   for integrity faults
//! - StoreConfig / AspectConfig: TOML-loadable store configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{AspectConfig, ConfigError, StoreConfig};
pub use error::{
    ErrComponent, ErrCondition, ErrSystem, Error, ErrorCode, Result, SystemError,
};
pub use types::{ItemId, StoreId};
