//! Aspect layer for dmodel
//!
//! Every read and write of a data item passes through an ordered chain of
//! aspects. This crate implements:
//! - Access / ItemDescriptor: what an aspect sees of an access
//! - Aspect: the four-hook guard interface
//! - AspectChain / Passage: ordered composition with short-circuiting pre
//!   hooks and drop-driven post hooks
//! - AspectFactory: chooses the chain for a new item (default, none, closure)
//! - LockAspect, AuditAspect, ValidationAspect: the standard protections

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod aspect;
pub mod audit;
pub mod chain;
pub mod factory;
pub mod lock;
pub mod validation;

pub use access::{Access, ItemDescriptor};
pub use aspect::Aspect;
pub use audit::{AuditAspect, AuditStats, AUDIT_ASPECT};
pub use chain::{AspectChain, Passage};
pub use factory::{factory_fn, AspectFactory, DefaultAspectFactory, FnFactory, NoAspects};
pub use lock::{LockAspect, LOCK_ASPECT};
pub use validation::ValidationAspect;
