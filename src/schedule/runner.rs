//! Schedule runner: the per-tick evaluation pass.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ host tick ──▶ 60 s gate ──▶ finish elapsed runs           │
//! │                       └──▶ for each due record:           │
//! │                             Coordinator admission         │
//! │                  granted ──▶ ActuatorPort ──▶ bookkeeping │
//! │                  denied  ──▶ EventSink (record untouched) │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The runner never raises: a denied admission or a failed actuation is
//! reported through the event sink and the schedule simply remains
//! pending. A denial deliberately does NOT advance `next_run` — the
//! record stays due for the rest of the ±1-minute window and the fire
//! opportunity is lost once the window closes (best-effort contention
//! handling, see the store docs).

use heapless::Vec;
use log::{info, warn};

use crate::app::events::{AppEvent, EventKind};
use crate::app::ports::{ActuatorPort, EventSink};
use crate::coordinator::HierarchicalCoordinator;
use crate::error::AdmissionError;

use super::recurrence::{self, RecurrencePolicy};
use super::{ScheduleId, ScheduleStore, ZoneId, MAX_SCHEDULES};

/// Maximum simultaneously tracked schedule runs.
pub const MAX_ACTIVE_RUNS: usize = 8;

/// Bookkeeping for a run started by the scheduler.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub schedule_id: ScheduleId,
    pub zone_id: ZoneId,
    /// When the run's (weather-adjusted) duration elapses.
    pub ends_at: u32,
}

/// Ticks on the host's cadence, fires due schedules, and winds down
/// completed runs.
pub struct ScheduleRunner {
    /// Minimum seconds between evaluation passes.
    check_interval_secs: u32,
    last_check: u32,
    active: Vec<ActiveRun, MAX_ACTIVE_RUNS>,
}

impl ScheduleRunner {
    pub fn new(check_interval_secs: u32) -> Self {
        Self {
            check_interval_secs,
            last_check: 0,
            active: Vec::new(),
        }
    }

    /// Currently tracked runs.
    pub fn active_runs(&self) -> &[ActiveRun] {
        &self.active
    }

    /// Stop tracking runs on `zone_id` after an external stop. The
    /// valve and the admission slot are the caller's concern; an
    /// aborted run emits no completion event and is never stopped a
    /// second time at its original end.
    pub fn abort_zone(&mut self, zone_id: &str) {
        self.active.retain(|run| run.zone_id.as_str() != zone_id);
    }

    /// One evaluation pass. Returns `true` if any schedule record was
    /// mutated (the caller persists on change).
    ///
    /// `duration_factor` scales run lengths (weather hook); 1.0 is
    /// pass-through.
    pub fn tick(
        &mut self,
        now: u32,
        store: &mut ScheduleStore,
        coordinator: &mut HierarchicalCoordinator,
        policy: &RecurrencePolicy,
        duration_factor: f32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        // Coarse rate limit, independent of how fast the host ticks.
        if now.saturating_sub(self.last_check) < self.check_interval_secs {
            return false;
        }
        self.last_check = now;

        self.finish_elapsed_runs(now, coordinator, hw, sink);
        self.evaluate_due(now, store, coordinator, policy, duration_factor, hw, sink)
    }

    // ── Completion ────────────────────────────────────────────

    fn finish_elapsed_runs(
        &mut self,
        now: u32,
        coordinator: &mut HierarchicalCoordinator,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let mut i = 0;
        while i < self.active.len() {
            if now < self.active[i].ends_at {
                i += 1;
                continue;
            }
            let run = self.active.remove(i);
            coordinator.request_stop(&run.zone_id);
            if hw.stop_zone(&run.zone_id) {
                info!("Schedule {} completed on zone {}", run.schedule_id, run.zone_id);
                sink.emit(&AppEvent::Schedule {
                    kind: EventKind::Completed,
                    schedule_id: run.schedule_id,
                    zone_id: run.zone_id,
                    message: "",
                });
            } else {
                warn!("Failed to stop zone {} after run", run.zone_id);
                sink.emit(&AppEvent::Schedule {
                    kind: EventKind::Error,
                    schedule_id: run.schedule_id,
                    zone_id: run.zone_id,
                    message: "stop actuation failed",
                });
            }
        }
    }

    // ── Due evaluation ────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn evaluate_due(
        &mut self,
        now: u32,
        store: &mut ScheduleStore,
        coordinator: &mut HierarchicalCoordinator,
        policy: &RecurrencePolicy,
        duration_factor: f32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        // Snapshot the due identifiers first; execution mutates the store.
        let mut due: Vec<ScheduleId, MAX_SCHEDULES> = Vec::new();
        for record in store.records() {
            if recurrence::is_due(record, now, policy) {
                let _ = due.push(record.id.clone());
            }
        }

        let mut mutated = false;
        for id in &due {
            let Some(record) = store.find_by_id(id) else {
                continue;
            };
            let zone_id = record.zone_id.clone();
            let duration_minutes = record.duration_minutes;

            match coordinator.request_start(&zone_id) {
                Err(err) => {
                    // next_run is intentionally left untouched: the record
                    // stays due and retries on the next tick in-window.
                    info!("Schedule {} held back: {}", id, err);
                    sink.emit(&AppEvent::Schedule {
                        kind: denial_kind(err),
                        schedule_id: id.clone(),
                        zone_id,
                        message: err.as_str(),
                    });
                }
                Ok(()) => {
                    mutated |= self.launch(
                        now,
                        id,
                        &zone_id,
                        duration_minutes,
                        duration_factor,
                        store,
                        coordinator,
                        policy,
                        hw,
                        sink,
                    );
                }
            }
        }
        mutated
    }

    #[allow(clippy::too_many_arguments)]
    fn launch(
        &mut self,
        now: u32,
        id: &ScheduleId,
        zone_id: &ZoneId,
        duration_minutes: u16,
        duration_factor: f32,
        store: &mut ScheduleStore,
        coordinator: &mut HierarchicalCoordinator,
        policy: &RecurrencePolicy,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.active.is_full() {
            coordinator.request_stop(zone_id);
            warn!("Run table full; cannot execute schedule {}", id);
            sink.emit(&AppEvent::Schedule {
                kind: EventKind::Error,
                schedule_id: id.clone(),
                zone_id: zone_id.clone(),
                message: "run table full",
            });
            return false;
        }

        if !hw.start_zone(zone_id) {
            coordinator.request_stop(zone_id);
            warn!("Actuation failed for zone {}", zone_id);
            sink.emit(&AppEvent::Schedule {
                kind: EventKind::Error,
                schedule_id: id.clone(),
                zone_id: zone_id.clone(),
                message: "start actuation failed",
            });
            return false;
        }

        let minutes = scale_duration(duration_minutes, duration_factor);
        let _ = store.mark_executed(id, now, policy);
        let _ = self.active.push(ActiveRun {
            schedule_id: id.clone(),
            zone_id: zone_id.clone(),
            ends_at: now + u32::from(minutes) * 60,
        });

        info!("Executing schedule {}: zone {} for {} minutes", id, zone_id, minutes);
        sink.emit(&AppEvent::Schedule {
            kind: EventKind::Started,
            schedule_id: id.clone(),
            zone_id: zone_id.clone(),
            message: "",
        });
        true
    }
}

/// A denial is normal contention; an unknown zone is a config problem.
fn denial_kind(err: AdmissionError) -> EventKind {
    match err {
        AdmissionError::UnknownZone => EventKind::Error,
        AdmissionError::FieldConcurrencyLimitReached | AdmissionError::AllocationExceeded => {
            EventKind::Denied
        }
    }
}

/// Apply the weather factor, keeping at least one minute of runtime.
fn scale_duration(minutes: u16, factor: f32) -> u16 {
    let scaled = (f32::from(minutes) * factor + 0.5) as u16;
    scaled.max(1)
}
