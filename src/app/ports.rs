//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IrrigationService (domain)
//! ```
//!
//! Driven adapters (valve/pump drivers, flash storage, the mesh event
//! publisher) implement these traits. The
//! [`IrrigationService`](super::service::IrrigationService) consumes them
//! via generics, so the domain core never touches radios, GPIO, or flash
//! directly — and tests drive it with recording mocks and a fabricated
//! clock.

use heapless::Vec;

use crate::schedule::{ScheduleRecord, MAX_SCHEDULES};

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC/NTP → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source, injected so tests can control time.
pub trait ClockPort {
    /// Current unix time in seconds.
    fn now(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain commands valves/pumps for a zone.
/// Invoked only *after* the coordinator has admitted the zone.
pub trait ActuatorPort {
    /// Begin irrigating a zone. Returns `false` if actuation failed.
    fn start_zone(&mut self, zone_id: &str) -> bool;

    /// Stop irrigating a zone. Returns `false` if actuation failed.
    fn stop_zone(&mut self, zone_id: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → telemetry / mesh)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go — serial log, mesh
/// packet, web dashboard. Implementations must not block the caller.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence port (domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Durable storage for the schedule table.
///
/// Called by the service once at startup (`load_all`) and after every
/// mutation (`save_all`). Blob format, integrity checks, and wear
/// levelling are the adapter's concern; the core only sees well-formed
/// records or a coarse [`PersistError`].
pub trait PersistPort {
    fn load_all(&self) -> Result<Vec<ScheduleRecord, MAX_SCHEDULES>, PersistError>;

    fn save_all(&mut self, records: &[ScheduleRecord]) -> Result<(), PersistError>;
}

/// Errors from [`PersistPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// No stored schedule blob exists (first boot).
    NotFound,
    /// Stored blob failed integrity / deserialization check.
    Corrupted,
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for PersistError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored schedules"),
            Self::Corrupted => write!(f, "stored schedules corrupted"),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
