//! GateMesh irrigation core.
//!
//! Pure-logic scheduling and zone coordination for mesh irrigation
//! controllers: a time-based schedule evaluation engine and a
//! hierarchical admission controller (farm → field → zone). All
//! hardware, clock, storage, and telemetry access goes through the
//! port traits in [`app::ports`], so the whole crate runs and tests
//! on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hierarchy;
pub mod schedule;
pub mod weather;
