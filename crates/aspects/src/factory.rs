//! Aspect factories: which aspects a new data item receives.
//!
//! A data store asks a factory for the chain of every item it creates.
//! Items created without an explicit factory get the store's
//! [`DefaultAspectFactory`], built from its [`AspectConfig`].

use crate::access::ItemDescriptor;
use crate::audit::AuditAspect;
use crate::chain::AspectChain;
use crate::lock::LockAspect;
use dmodel_core::AspectConfig;

/// Produces the ordered aspect chain for a data item under construction
pub trait AspectFactory: Send + Sync {
    /// Build the chain for `item`
    fn create_aspects(&self, item: &ItemDescriptor) -> AspectChain;
}

/// The standard protections, selected by an [`AspectConfig`]
///
/// Chain order: audit first, so it also sees accesses refused by a lock
/// timeout; lock after it.
#[derive(Debug, Clone, Default)]
pub struct DefaultAspectFactory {
    config: AspectConfig,
}

impl DefaultAspectFactory {
    /// Factory for `config`
    pub fn new(config: AspectConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &AspectConfig {
        &self.config
    }
}

impl AspectFactory for DefaultAspectFactory {
    fn create_aspects(&self, _item: &ItemDescriptor) -> AspectChain {
        let mut chain = AspectChain::new();
        if self.config.audit {
            chain = chain.with(AuditAspect::new());
        }
        if self.config.locking {
            chain = chain.with(LockAspect::new(self.config.lock_timeout()));
        }
        chain
    }
}

/// No aspects at all, for single-writer internal state
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAspects;

impl AspectFactory for NoAspects {
    fn create_aspects(&self, _item: &ItemDescriptor) -> AspectChain {
        AspectChain::new()
    }
}

/// Factory backed by a closure; see [`factory_fn`]
pub struct FnFactory<F>(F);

impl<F> AspectFactory for FnFactory<F>
where
    F: Fn(&ItemDescriptor) -> AspectChain + Send + Sync,
{
    fn create_aspects(&self, item: &ItemDescriptor) -> AspectChain {
        (self.0)(item)
    }
}

/// Build a factory from a closure
///
/// ```ignore
/// let odd_only = factory_fn(|_item| {
///     AspectChain::new().with(ValidationAspect::new("odd", |v: &i64| v % 2 != 0))
/// });
/// ```
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(&ItemDescriptor) -> AspectChain + Send + Sync,
{
    FnFactory(f)
}
