//! Timed mutual exclusion for one data item.
//!
//! [`LockAspect`] takes the item in every pre hook and gives it back in the
//! matching post hook, so at most one guarded access per item is in flight.
//! Acquisition waits at most the configured timeout; a timeout is a refusal
//! (`false`), which the item treats as a vetoed write or a corrupt read.
//!
//! The holder is recorded by the access ticket the chain stamps on each
//! pass. A post hook releases the lock only when its ticket is the holder's,
//! so a stray `after_*` call cannot open the lock under another access.
//!
//! The lock is not reentrant. Reading or writing an item from inside its own
//! hooks, or from a trigger handler that a domain runs synchronously, waits
//! for the timeout and is then refused.

use crate::access::Access;
use crate::aspect::Aspect;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Name reported by [`LockAspect::name`]
pub const LOCK_ASPECT: &str = "lock";

/// Serializes guarded accesses to one item
pub struct LockAspect {
    holder: Mutex<Option<u64>>,
    released: Condvar,
    timeout: Duration,
    timeouts: AtomicU64,
}

impl LockAspect {
    /// Create an unlocked aspect that waits at most `timeout` per access
    pub fn new(timeout: Duration) -> Self {
        Self {
            holder: Mutex::new(None),
            released: Condvar::new(),
            timeout,
            timeouts: AtomicU64::new(0),
        }
    }

    /// Acquisition timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of accesses refused because the lock was not acquired in time
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Whether an access currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.holder.lock().is_some()
    }

    fn acquire(&self, access: &Access<'_>, op: &'static str) -> bool {
        let deadline = Instant::now().checked_add(self.timeout);
        let mut holder = self.holder.lock();
        while holder.is_some() {
            let timed_out = match deadline {
                Some(deadline) => self.released.wait_until(&mut holder, deadline).timed_out(),
                None => {
                    self.released.wait(&mut holder);
                    false
                }
            };
            if timed_out && holder.is_some() {
                drop(holder);
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    item = %access.item().id(),
                    name = access.item().name(),
                    op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Item lock acquisition timed out"
                );
                return false;
            }
        }
        *holder = Some(access.ticket());
        true
    }

    fn release(&self, access: &Access<'_>) {
        let mut holder = self.holder.lock();
        if *holder == Some(access.ticket()) {
            *holder = None;
            drop(holder);
            self.released.notify_one();
        } else {
            debug!(
                item = %access.item().id(),
                ticket = access.ticket(),
                "Ignoring release from an access that does not hold the item lock"
            );
        }
    }
}

impl Aspect for LockAspect {
    fn name(&self) -> &str {
        LOCK_ASPECT
    }

    fn before_write(&self, access: &Access<'_>) -> bool {
        self.acquire(access, "write")
    }

    fn after_write(&self, _permitted: bool, access: &Access<'_>) {
        self.release(access);
    }

    fn before_read(&self, access: &Access<'_>) -> bool {
        self.acquire(access, "read")
    }

    fn after_read(&self, _permitted: bool, access: &Access<'_>) {
        self.release(access);
    }
}

impl std::fmt::Debug for LockAspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockAspect")
            .field("locked", &self.is_locked())
            .field("timeout", &self.timeout)
            .field("timeouts", &self.timeouts())
            .finish()
    }
}
