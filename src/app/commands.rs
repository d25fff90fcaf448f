//! Inbound commands to the irrigation service.
//!
//! These represent actions requested by the outside world (mesh command
//! packets, the web interface, serial console) that the
//! [`IrrigationService`](super::service::IrrigationService) interprets
//! and acts upon. Each maps directly onto a store, coordinator, or
//! weather operation.

use crate::schedule::{ScheduleId, ScheduleRecord, ZoneId};
use crate::weather::WeatherSample;

/// Commands that external adapters can send into the irrigation core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Store a new schedule. The caller assigns the identifier.
    AddSchedule(ScheduleRecord),

    /// Replace the fields of an existing schedule.
    UpdateSchedule {
        id: ScheduleId,
        record: ScheduleRecord,
    },

    /// Remove a schedule.
    DeleteSchedule(ScheduleId),

    /// Enable or disable a schedule without removing it.
    EnableSchedule { id: ScheduleId, enabled: bool },

    /// Drop every stored schedule.
    ClearSchedules,

    /// Start a zone immediately (manual override, still subject to
    /// admission control). Runs until an explicit `StopZone`.
    StartZone(ZoneId),

    /// Stop a zone immediately.
    StopZone(ZoneId),

    /// Report water drawn by a zone, for allocation accounting.
    ReportWaterUsage { zone_id: ZoneId, liters: f32 },

    /// Feed a local weather observation into the adjustment hook.
    UpdateWeather(WeatherSample),
}
