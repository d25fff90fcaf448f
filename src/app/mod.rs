//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the GateMesh irrigation
//! engine: schedule evaluation, hierarchical admission control, and
//! weather-adjusted run execution. All interaction with the outside
//! world happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real hardware or a real clock.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
