//! Data store builder for fluent configuration
//!
//! Provides a builder pattern for naming a store, choosing its default
//! aspects and binding it to a scheduling domain before any item exists.

use std::path::Path;

use dmodel_core::{AspectConfig, Result, StoreConfig};
use dmodel_runtime::Affinity;

use crate::store::DataStore;

// ============================================================================
// DataStore Builder Pattern
// ============================================================================

/// Builder for DataStore configuration
///
/// # Three Ways to Create a Store
///
/// ```ignore
/// use dmodel_store::DataStore;
///
/// // 1. Unbound store with default aspects (lock + audit)
/// let store = DataStore::new();
///
/// // 2. From a configuration
/// let store = DataStore::with_config(StoreConfig::from_file(path)?)?;
///
/// // 3. Builder, usually to bind the affinity up front
/// let store = DataStore::builder()
///     .name("vehicle")
///     .affinity(Affinity::new(domain))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataStoreBuilder {
    /// Name, default aspects
    config: StoreConfig,
    /// Scheduling domain binding for the store and its items
    affinity: Affinity,
}

impl DataStoreBuilder {
    /// Create new builder with default configuration and no affinity
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the default aspect configuration
    pub fn aspects(mut self, aspects: AspectConfig) -> Self {
        self.config.aspects = aspects;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn config_file(mut self, path: &Path) -> Result<Self> {
        self.config = StoreConfig::from_file(path)?;
        Ok(self)
    }

    /// Bind the store to a scheduling domain
    pub fn affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = affinity;
        self
    }

    /// Build the store
    ///
    /// # Errors
    ///
    /// Returns an error if the aspect configuration is invalid.
    pub fn build(self) -> Result<DataStore> {
        self.config.aspects.validate()?;
        Ok(DataStore::from_parts(self.config, self.affinity))
    }
}
