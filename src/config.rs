//! System configuration parameters
//!
//! All tunable parameters for the GateMesh irrigation core.
//! Values can be overridden via the node's provisioning channel; the
//! library only sees the resulting struct.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationConfig {
    // --- Time ---
    /// Offset from UTC in minutes, applied before decomposing timestamps
    /// into local hour/minute/weekday. Negative west of Greenwich.
    pub utc_offset_minutes: i32,

    // --- Schedule evaluation ---
    /// Minimum seconds between evaluation passes (coarse rate limit,
    /// independent of how often the host ticks the service).
    pub check_interval_secs: u32,
    /// Due-window tolerance in minutes around a schedule's start time,
    /// absorbing tick jitter.
    pub due_tolerance_minutes: u16,
    /// Seconds after an execution during which the same record cannot
    /// fire again (double-fire guard inside one evaluation minute).
    pub refire_guard_secs: u32,

    // --- Concurrency ---
    /// Concurrent-zone ceiling applied to fields that do not configure
    /// their own limit.
    pub default_max_concurrent_zones: u8,

    // --- Weather hook ---
    /// Precipitation (inches) above which scheduled run durations are
    /// scaled down.
    pub rain_threshold_inches: f32,
    /// Multiplier applied to run durations when precipitation exceeds
    /// the threshold.
    pub rain_duration_factor: f32,
}

impl Default for IrrigationConfig {
    fn default() -> Self {
        Self {
            // Time
            utc_offset_minutes: 0,

            // Schedule evaluation
            check_interval_secs: 60,
            due_tolerance_minutes: 1,
            refire_guard_secs: 60,

            // Concurrency
            default_max_concurrent_zones: 2,

            // Weather hook
            rain_threshold_inches: 0.1,
            rain_duration_factor: 0.5,
        }
    }
}
