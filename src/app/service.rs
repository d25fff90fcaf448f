//! Application service — the hexagonal core.
//!
//! [`IrrigationService`] owns the schedule store, the runner, the
//! hierarchical coordinator, and the weather monitor. It exposes a
//! clean, hardware-agnostic API. All I/O flows through port traits
//! injected at call sites, making the entire service testable with
//! mock adapters and a fabricated clock.
//!
//! ```text
//!   ClockPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │      IrrigationService       │
//! ActuatorPort ◀──│ Store · Runner · Coordinator │ ◀─▶ PersistPort
//!                 └─────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::IrrigationConfig;
use crate::coordinator::HierarchicalCoordinator;
use crate::error::Result;
use crate::hierarchy::FieldHierarchy;
use crate::schedule::recurrence::RecurrencePolicy;
use crate::schedule::runner::ScheduleRunner;
use crate::schedule::ScheduleStore;
use crate::weather::WeatherMonitor;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ClockPort, EventSink, PersistError, PersistPort};

// ───────────────────────────────────────────────────────────────
// IrrigationService
// ───────────────────────────────────────────────────────────────

/// The irrigation service orchestrates all domain logic.
pub struct IrrigationService {
    config: IrrigationConfig,
    policy: RecurrencePolicy,
    store: ScheduleStore,
    runner: ScheduleRunner,
    coordinator: HierarchicalCoordinator,
    weather: WeatherMonitor,
    /// Set whenever the schedule table changes; cleared on save.
    schedules_dirty: bool,
}

impl IrrigationService {
    /// Construct the service from configuration and a built hierarchy.
    ///
    /// Does **not** load stored schedules — call [`start`](Self::start)
    /// next.
    pub fn new(config: IrrigationConfig, hierarchy: FieldHierarchy) -> Self {
        let policy = RecurrencePolicy::from(&config);
        let runner = ScheduleRunner::new(config.check_interval_secs);
        let weather = WeatherMonitor::new(&config);
        Self {
            config,
            policy,
            store: ScheduleStore::new(),
            runner,
            coordinator: HierarchicalCoordinator::new(hierarchy),
            weather,
            schedules_dirty: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load persisted schedules and announce readiness.
    ///
    /// A missing blob is a normal first boot; a corrupted one starts
    /// the engine with an empty table rather than refusing to run.
    pub fn start(&mut self, persist: &impl PersistPort, sink: &mut impl EventSink) {
        match persist.load_all() {
            Ok(records) => {
                self.store.replace_all(&records);
                info!("Loaded {} schedules from storage", self.store.len());
            }
            Err(PersistError::NotFound) => {
                info!("No stored schedules; starting with empty table");
            }
            Err(e) => {
                warn!("Failed to load schedules: {}; starting empty", e);
            }
        }
        sink.emit(&AppEvent::EngineStarted {
            schedule_count: self.store.len(),
        });
    }

    /// One host tick: evaluate due schedules and wind down finished
    /// runs. Cheap to call every second; the runner rate-limits itself.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let factor = self.weather.duration_factor();
        let mutated = self.runner.tick(
            clock.now(),
            &mut self.store,
            &mut self.coordinator,
            &self.policy,
            factor,
            hw,
            sink,
        );
        if mutated {
            self.schedules_dirty = true;
        }
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Interpret one inbound command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        clock: &impl ClockPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let now = clock.now();
        match cmd {
            AppCommand::AddSchedule(record) => {
                self.store.add(record, now, &self.policy)?;
                self.schedules_dirty = true;
            }
            AppCommand::UpdateSchedule { id, record } => {
                self.store.update(&id, record, now, &self.policy)?;
                self.schedules_dirty = true;
            }
            AppCommand::DeleteSchedule(id) => {
                self.store.remove(&id)?;
                self.schedules_dirty = true;
            }
            AppCommand::EnableSchedule { id, enabled } => {
                self.store.set_enabled(&id, enabled, now, &self.policy)?;
                self.schedules_dirty = true;
            }
            AppCommand::ClearSchedules => {
                self.store.clear();
                self.schedules_dirty = true;
            }
            AppCommand::StartZone(zone_id) => {
                self.coordinator.request_start(&zone_id)?;
                if hw.start_zone(&zone_id) {
                    info!("Manual start: zone {}", zone_id);
                    sink.emit(&AppEvent::ZoneStarted { zone_id });
                } else {
                    // Release the admission slot; the valve never opened.
                    self.coordinator.request_stop(&zone_id);
                    warn!("Manual start failed for zone {}", zone_id);
                    sink.emit(&AppEvent::ZoneFault {
                        zone_id,
                        message: "start actuation failed",
                    });
                }
            }
            AppCommand::StopZone(zone_id) => {
                // Forget any scheduled run on this zone so its timer
                // cannot stop the valve a second time later.
                self.runner.abort_zone(&zone_id);
                self.coordinator.request_stop(&zone_id);
                if hw.stop_zone(&zone_id) {
                    info!("Manual stop: zone {}", zone_id);
                    sink.emit(&AppEvent::ZoneStopped { zone_id });
                } else {
                    warn!("Manual stop failed for zone {}", zone_id);
                    sink.emit(&AppEvent::ZoneFault {
                        zone_id,
                        message: "stop actuation failed",
                    });
                }
            }
            AppCommand::ReportWaterUsage { zone_id, liters } => {
                self.coordinator.record_water_usage(&zone_id, liters);
            }
            AppCommand::UpdateWeather(sample) => {
                self.weather.update(sample);
            }
        }
        Ok(())
    }

    // ── Persistence ───────────────────────────────────────────

    /// Save the schedule table if it changed since the last save.
    /// Returns `true` on a successful write; a failed write keeps the
    /// dirty flag so the next call retries.
    pub fn persist_if_dirty(&mut self, persist: &mut impl PersistPort) -> bool {
        if !self.schedules_dirty {
            return false;
        }
        match persist.save_all(self.store.records()) {
            Ok(()) => {
                self.schedules_dirty = false;
                info!("Saved {} schedules", self.store.len());
                true
            }
            Err(e) => {
                warn!("Failed to save schedules: {}", e);
                false
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn schedules(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn coordinator(&self) -> &HierarchicalCoordinator {
        &self.coordinator
    }

    pub fn weather(&self) -> &WeatherMonitor {
        &self.weather
    }

    pub fn config(&self) -> &IrrigationConfig {
        &self.config
    }

    pub fn is_schedules_dirty(&self) -> bool {
        self.schedules_dirty
    }
}
