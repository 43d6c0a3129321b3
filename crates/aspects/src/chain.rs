//! Ordered aspect chain and its two-phase hook protocol.
//!
//! ## Protocol
//!
//! ```text
//! before_write / before_read
//!   aspect[0].before_*  -> true
//!   aspect[1].before_*  -> true
//!   aspect[2].before_*  -> false   (veto: aspect[3..] are not asked)
//!   => Passage { entered: 2, permitted: false }
//!
//! drop(Passage)
//!   aspect[1].after_*(false)
//!   aspect[0].after_*(false)
//! ```
//!
//! The post phase runs from `Drop`, so it also runs when the guarded
//! operation unwinds. Locks taken in a pre hook are released on every path.

use crate::access::Access;
use crate::aspect::Aspect;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tickets start at 1; 0 marks an access that never entered a chain.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Read,
    Write,
}

/// Ordered set of aspects attached to one data item
///
/// Order is fixed when the chain is built; the chain cannot be changed once
/// attached to an item.
#[derive(Clone, Default)]
pub struct AspectChain {
    aspects: SmallVec<[Arc<dyn Aspect>; 4]>,
}

impl AspectChain {
    /// Empty chain: every access is permitted
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an aspect
    pub fn with<A: Aspect + 'static>(self, aspect: A) -> Self {
        self.with_shared(Arc::new(aspect))
    }

    /// Append an aspect the caller keeps a handle to
    pub fn with_shared(mut self, aspect: Arc<dyn Aspect>) -> Self {
        self.aspects.push(aspect);
        self
    }

    /// Number of aspects
    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    /// Whether the chain has no aspects
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    /// Aspect names in chain order
    pub fn names(&self) -> Vec<&str> {
        self.aspects.iter().map(|a| a.name()).collect()
    }

    /// Run the pre-write phase over a candidate value
    ///
    /// The returned [`Passage`] runs the post-write phase when dropped.
    pub fn before_write<'c, 'a>(&'c self, access: Access<'a>) -> Passage<'c, 'a> {
        self.enter(Phase::Write, access)
    }

    /// Run the pre-read phase over the stored value
    ///
    /// The returned [`Passage`] runs the post-read phase when dropped.
    pub fn before_read<'c, 'a>(&'c self, access: Access<'a>) -> Passage<'c, 'a> {
        self.enter(Phase::Read, access)
    }

    fn enter<'c, 'a>(&'c self, phase: Phase, access: Access<'a>) -> Passage<'c, 'a> {
        let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        let mut passage = Passage {
            chain: self,
            access: access.stamped(ticket),
            phase,
            entered: 0,
            permitted: true,
        };
        for aspect in &self.aspects {
            let admitted = match phase {
                Phase::Write => aspect.before_write(&passage.access),
                Phase::Read => aspect.before_read(&passage.access),
            };
            if !admitted {
                passage.permitted = false;
                break;
            }
            passage.entered += 1;
        }
        passage
    }
}

impl fmt::Debug for AspectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Outcome of a pre phase; runs the matching post phase on drop
#[must_use = "dropping a Passage immediately runs the post hooks"]
pub struct Passage<'c, 'a> {
    chain: &'c AspectChain,
    access: Access<'a>,
    phase: Phase,
    entered: usize,
    permitted: bool,
}

impl Passage<'_, '_> {
    /// Whether every aspect admitted the access
    pub fn permitted(&self) -> bool {
        self.permitted
    }

    /// Name of the aspect that refused, if any
    pub fn vetoed_by(&self) -> Option<&str> {
        if self.permitted {
            None
        } else {
            self.chain.aspects.get(self.entered).map(|a| a.name())
        }
    }
}

impl Drop for Passage<'_, '_> {
    fn drop(&mut self) {
        for aspect in self.chain.aspects[..self.entered].iter().rev() {
            match self.phase {
                Phase::Write => aspect.after_write(self.permitted, &self.access),
                Phase::Read => aspect.after_read(self.permitted, &self.access),
            }
        }
    }
}
