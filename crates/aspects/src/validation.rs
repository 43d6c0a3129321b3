//! Predicate validation of item values.
//!
//! [`ValidationAspect`] refuses writes whose candidate fails a predicate.
//! With [`ValidationAspect::check_reads`] it also re-checks the stored
//! value on every read, which turns a value that no longer satisfies the
//! predicate into a corrupt-read fault instead of handing it out.
//!
//! A value of an unexpected type is always refused: the aspect was attached
//! to the wrong item.

use crate::access::Access;
use crate::aspect::Aspect;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Refuses values that fail a predicate
pub struct ValidationAspect<T> {
    name: String,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
    check_reads: bool,
    rejections: AtomicU64,
}

impl<T: Any> ValidationAspect<T> {
    /// Validate writes with `predicate`
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            check_reads: false,
            rejections: AtomicU64::new(0),
        }
    }

    /// Also validate the stored value on every read
    pub fn check_reads(mut self, enabled: bool) -> Self {
        self.check_reads = enabled;
        self
    }

    /// Number of refused accesses
    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    fn check(&self, access: &Access<'_>, op: &'static str) -> bool {
        let Some(value) = access.downcast::<T>() else {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            warn!(
                aspect = %self.name,
                item = %access.item().id(),
                expected = std::any::type_name::<T>(),
                actual = access.item().type_name(),
                "Validation aspect attached to an item of another type"
            );
            return false;
        };
        if (self.predicate)(value) {
            return true;
        }
        self.rejections.fetch_add(1, Ordering::Relaxed);
        debug!(
            aspect = %self.name,
            item = %access.item().id(),
            name = access.item().name(),
            op,
            "Value rejected by validation"
        );
        false
    }
}

impl<T: Any> Aspect for ValidationAspect<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_write(&self, access: &Access<'_>) -> bool {
        self.check(access, "write")
    }

    fn before_read(&self, access: &Access<'_>) -> bool {
        !self.check_reads || self.check(access, "read")
    }
}

impl<T> fmt::Debug for ValidationAspect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationAspect")
            .field("name", &self.name)
            .field("check_reads", &self.check_reads)
            .field("rejections", &self.rejections.load(Ordering::Relaxed))
            .finish()
    }
}
