//! Schedule records and the bounded schedule store.
//!
//! Schedules arrive fully formed from the command dispatcher (the web
//! interface on the far side of the mesh) and are stored locally on the
//! node. The store enforces identifier uniqueness and a fixed capacity
//! ceiling; all temporal logic lives in [`recurrence`] and the execution
//! pass in [`runner`].

pub mod recurrence;
pub mod runner;

use heapless::Vec;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use recurrence::RecurrencePolicy;

/// Maximum number of schedules per node.
pub const MAX_SCHEDULES: usize = 10;

/// Sentinel "never" timestamp: the schedule will not run again.
pub const NEVER: u32 = u32::MAX;

/// Schedule identifier (fixed capacity, mirrors the 24-byte wire field).
pub type ScheduleId = heapless::String<24>;

/// Zone identifier referenced by a schedule.
pub type ZoneId = heapless::String<24>;

// ═══════════════════════════════════════════════════════════════
//  Record types
// ═══════════════════════════════════════════════════════════════

/// Repeat cadence of a schedule. Wire discriminants 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// Fire a single time, then never re-arm.
    Once,
    /// Fire every day at the start time.
    Daily,
    /// Fire on the days enabled in `days_of_week`.
    Weekly,
    /// Like `Weekly`, but the mask is user-edited per day.
    Custom,
}

impl Repeat {
    /// Whether this cadence filters on the day-of-week mask.
    pub const fn uses_day_mask(self) -> bool {
        matches!(self, Self::Weekly | Self::Custom)
    }
}

/// One recurring irrigation event.
///
/// `last_run`, `next_run`, and `run_count` are engine-owned: they change
/// only through store operations, never through caller edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Stable identifier, unique within the store. Caller-assigned.
    pub id: ScheduleId,
    /// Display label, non-authoritative.
    pub name: heapless::String<32>,
    /// Zone this schedule irrigates.
    pub zone_id: ZoneId,
    /// Disabled records are never evaluated as due.
    pub enabled: bool,

    /// Minutes since local midnight, 0–1439.
    pub start_time_minutes: u16,
    /// Run length in minutes, positive.
    pub duration_minutes: u16,

    pub repeat: Repeat,
    /// Sun..Sat mask; meaningful only when `repeat.uses_day_mask()`.
    pub days_of_week: [u8; 7],
    /// Optional bounding start date (unix seconds). Stored, not gated.
    pub start_date: u32,
    /// Optional bounding end date (unix seconds); 0 means unbounded.
    pub end_date: u32,

    /// Last execution timestamp. Engine-owned.
    pub last_run: u32,
    /// Next scheduled timestamp, or [`NEVER`]. Engine-owned.
    pub next_run: u32,
    /// Monotonically increasing execution counter. Engine-owned.
    pub run_count: u32,

    pub created_at: u32,
    pub updated_at: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Schedule store
// ═══════════════════════════════════════════════════════════════

/// Bounded, ordered collection of schedule records keyed by `id`.
///
/// Lookup is linear; the table is small by construction. Removal is
/// stable (shifts, does not swap) so index-based iteration in `records()`
/// observes a consistent order across mutations.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    records: Vec<ScheduleRecord, MAX_SCHEDULES>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Insert a new record. Computes `next_run` and stamps `updated_at`.
    pub fn add(
        &mut self,
        mut record: ScheduleRecord,
        now: u32,
        policy: &RecurrencePolicy,
    ) -> Result<(), ScheduleError> {
        validate(&record)?;
        if self.records.is_full() {
            warn!(
                "Cannot add schedule: maximum limit reached ({})",
                MAX_SCHEDULES
            );
            return Err(ScheduleError::CapacityExceeded);
        }
        if self.find_by_id(&record.id).is_some() {
            warn!("Schedule ID already exists: {}", record.id);
            return Err(ScheduleError::DuplicateId);
        }

        record.next_run = recurrence::next_run(&record, now, policy);
        record.updated_at = now;

        info!("Added schedule: {} ({})", record.name, record.id);
        // Capacity was checked above; push cannot fail here.
        let _ = self.records.push(record);
        Ok(())
    }

    /// Replace the record stored under `id` with the caller's fields.
    ///
    /// Engine-owned fields (`last_run`, `run_count`, `created_at`) and the
    /// key itself survive the update; `next_run` and `updated_at` are
    /// recomputed.
    pub fn update(
        &mut self,
        id: &str,
        record: ScheduleRecord,
        now: u32,
        policy: &RecurrencePolicy,
    ) -> Result<(), ScheduleError> {
        validate(&record)?;
        let Some(idx) = self.index_of(id) else {
            warn!("Schedule not found: {}", id);
            return Err(ScheduleError::NotFound);
        };

        let old = &self.records[idx];
        let mut rec = record;
        rec.id = old.id.clone();
        rec.last_run = old.last_run;
        rec.run_count = old.run_count;
        rec.created_at = old.created_at;
        rec.next_run = recurrence::next_run(&rec, now, policy);
        rec.updated_at = now;

        info!("Updated schedule: {}", id);
        self.records[idx] = rec;
        Ok(())
    }

    /// Remove a record, compacting the remainder in place.
    pub fn remove(&mut self, id: &str) -> Result<(), ScheduleError> {
        let Some(idx) = self.index_of(id) else {
            warn!("Schedule not found: {}", id);
            return Err(ScheduleError::NotFound);
        };
        self.records.remove(idx);
        info!("Deleted schedule: {}", id);
        Ok(())
    }

    /// Enable or disable a record. Re-enabling recomputes `next_run` from
    /// now; disabling leaves it stale until the next enable.
    pub fn set_enabled(
        &mut self,
        id: &str,
        enabled: bool,
        now: u32,
        policy: &RecurrencePolicy,
    ) -> Result<(), ScheduleError> {
        let Some(idx) = self.index_of(id) else {
            warn!("Schedule not found: {}", id);
            return Err(ScheduleError::NotFound);
        };

        let rec = &mut self.records[idx];
        rec.enabled = enabled;
        rec.updated_at = now;
        if enabled {
            rec.next_run = recurrence::next_run(rec, now, policy);
        }

        info!("{} schedule: {}", if enabled { "Enabled" } else { "Disabled" }, id);
        Ok(())
    }

    /// Execution bookkeeping: stamp `last_run`, bump `run_count`, and
    /// re-arm `next_run`. Called by the runner after admission succeeds.
    pub fn mark_executed(
        &mut self,
        id: &str,
        now: u32,
        policy: &RecurrencePolicy,
    ) -> Result<(), ScheduleError> {
        let Some(idx) = self.index_of(id) else {
            return Err(ScheduleError::NotFound);
        };
        let rec = &mut self.records[idx];
        rec.last_run = now;
        rec.run_count = rec.run_count.saturating_add(1);
        rec.next_run = recurrence::next_run(rec, now, policy);
        Ok(())
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        info!("Cleared all schedules");
    }

    /// Replace the whole table (startup load). Records beyond capacity
    /// are dropped with a warning.
    pub fn replace_all(&mut self, records: &[ScheduleRecord]) {
        self.records.clear();
        for rec in records {
            if self.records.push(rec.clone()).is_err() {
                warn!("Schedule table full while loading; dropping {}", rec.id);
                break;
            }
        }
    }

    /// Index-stable snapshot of the current records.
    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ScheduleRecord> {
        self.records.get(index)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ScheduleRecord> {
        self.records.iter().find(|r| r.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id.as_str() == id)
    }
}

/// Bounds check on caller-supplied fields. A start time past 23:59
/// could never match a due window, and a zero duration would complete
/// a run in the same tick it starts; both are rejected at the boundary
/// rather than stored as dormant records.
fn validate(record: &ScheduleRecord) -> Result<(), ScheduleError> {
    if record.start_time_minutes > 1439 || record.duration_minutes == 0 {
        warn!(
            "Rejecting schedule {}: start {} / duration {} out of bounds",
            record.id, record.start_time_minutes, record.duration_minutes
        );
        return Err(ScheduleError::InvalidRecord);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
