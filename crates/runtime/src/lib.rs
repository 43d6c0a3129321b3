//! Trigger and thread-affinity contract for dmodel
//!
//! This crate defines how data items wake dependent logic:
//! - TriggerSource / TriggerEvent: who fired, and which write it was
//! - Triggerable: dependent logic a domain can wake
//! - SchedulingDomain / Affinity: the cooperative execution context and the
//!   binding of items and stores to it
//! - CooperativeDomain: deterministic domain driven by explicit runs
//! - testing::RecordingDomain: records triggers for assertions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod affinity;
pub mod cooperative;
pub mod testing;
pub mod trigger;

pub use affinity::{Affinity, SchedulingDomain};
pub use cooperative::{CooperativeDomain, DomainStats, RunStats};
pub use trigger::{TriggerEvent, TriggerSource, Triggerable};
