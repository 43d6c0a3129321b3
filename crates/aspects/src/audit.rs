//! Access auditing.
//!
//! [`AuditAspect`] never refuses anything. It counts every completed access
//! by outcome and emits one `tracing` event per access under the
//! `dmodel::audit` target.

use crate::access::Access;
use crate::aspect::Aspect;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Name reported by [`AuditAspect::name`]
pub const AUDIT_ASPECT: &str = "audit";

/// Audit counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditStats {
    /// Writes that were stored
    pub writes: u64,
    /// Writes refused by the chain
    pub vetoed_writes: u64,
    /// Reads that returned a value
    pub reads: u64,
    /// Reads refused by the chain
    pub refused_reads: u64,
}

/// Records every guarded access to one item
#[derive(Debug, Default)]
pub struct AuditAspect {
    writes: AtomicU64,
    vetoed_writes: AtomicU64,
    reads: AtomicU64,
    refused_reads: AtomicU64,
}

impl AuditAspect {
    /// Create an aspect with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of the counters.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            writes: self.writes.load(Ordering::Relaxed),
            vetoed_writes: self.vetoed_writes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            refused_reads: self.refused_reads.load(Ordering::Relaxed),
        }
    }
}

impl Aspect for AuditAspect {
    fn name(&self) -> &str {
        AUDIT_ASPECT
    }

    fn after_write(&self, permitted: bool, access: &Access<'_>) {
        let counter = if permitted {
            &self.writes
        } else {
            &self.vetoed_writes
        };
        counter.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "dmodel::audit",
            item = %access.item().id(),
            name = access.item().name(),
            size = access.size(),
            permitted,
            "write"
        );
    }

    fn after_read(&self, permitted: bool, access: &Access<'_>) {
        let counter = if permitted {
            &self.reads
        } else {
            &self.refused_reads
        };
        counter.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "dmodel::audit",
            item = %access.item().id(),
            name = access.item().name(),
            size = access.size(),
            permitted,
            "read"
        );
    }
}
