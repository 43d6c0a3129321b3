//! Domain Model Integration Tests
//!
//! Data items, data stores and their scheduling domains used together the
//! way a model uses them.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod lifecycle;
mod scheduling;
