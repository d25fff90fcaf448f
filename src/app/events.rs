//! Outbound application events.
//!
//! The [`IrrigationService`](super::service::IrrigationService) emits
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them — log to
//! serial, publish as a mesh packet, push to the web dashboard.

use crate::schedule::{ScheduleId, ZoneId};

/// Schedule event discriminant. Wire values 0–3 match the mesh
/// `ScheduleEvent` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Execution began for a schedule.
    Started = 0,
    /// A run's duration elapsed and the zone was stopped.
    Completed = 1,
    /// Admission was denied; the schedule remains pending.
    Denied = 2,
    /// Actuation or configuration failure during execution.
    Error = 3,
}

/// Structured events emitted by the irrigation core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The engine finished startup (carries loaded schedule count).
    EngineStarted { schedule_count: usize },

    /// Lifecycle notification for a schedule execution.
    Schedule {
        kind: EventKind,
        schedule_id: ScheduleId,
        zone_id: ZoneId,
        message: &'static str,
    },

    /// A zone was started directly by the dispatcher.
    ZoneStarted { zone_id: ZoneId },

    /// A zone was stopped directly by the dispatcher.
    ZoneStopped { zone_id: ZoneId },

    /// Actuation failed outside a schedule context.
    ZoneFault {
        zone_id: ZoneId,
        message: &'static str,
    },
}
