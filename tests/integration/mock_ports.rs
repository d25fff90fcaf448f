//! Mock port adapters for integration tests.
//!
//! Records every actuator call and emitted event so tests can assert
//! on the full history without real valves, flash, or a wall clock.

use std::cell::Cell;

use gatemesh::app::events::AppEvent;
use gatemesh::app::ports::{ActuatorPort, ClockPort, EventSink, PersistError, PersistPort};
use gatemesh::schedule::{ScheduleRecord, MAX_SCHEDULES};

// ── MockClock ─────────────────────────────────────────────────

/// Settable clock; tests advance time explicitly.
pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: u32) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u32) {
        self.now.set(self.now.get() + secs);
    }
}

impl ClockPort for MockClock {
    fn now(&self) -> u32 {
        self.now.get()
    }
}

// ── MockValves ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValveCall {
    Start(String),
    Stop(String),
}

/// Recording actuator; `fail_next` makes the next call report failure.
pub struct MockValves {
    pub calls: Vec<ValveCall>,
    pub fail_next: bool,
}

#[allow(dead_code)]
impl MockValves {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_next: false,
        }
    }

    pub fn starts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ValveCall::Start(z) => Some(z.as_str()),
                ValveCall::Stop(_) => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ValveCall::Stop(z) => Some(z.as_str()),
                ValveCall::Start(_) => None,
            })
            .collect()
    }
}

impl ActuatorPort for MockValves {
    fn start_zone(&mut self, zone_id: &str) -> bool {
        self.calls.push(ValveCall::Start(zone_id.to_string()));
        !std::mem::take(&mut self.fail_next)
    }

    fn stop_zone(&mut self, zone_id: &str) -> bool {
        self.calls.push(ValveCall::Stop(zone_id.to_string()));
        !std::mem::take(&mut self.fail_next)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockPersist ───────────────────────────────────────────────

/// In-memory stand-in for the flash blob, using the same wire format.
pub struct MockPersist {
    pub blob: Option<Vec<u8>>,
    pub save_count: usize,
    pub fail_saves: bool,
}

#[allow(dead_code)]
impl MockPersist {
    pub fn new() -> Self {
        Self {
            blob: None,
            save_count: 0,
            fail_saves: false,
        }
    }
}

impl PersistPort for MockPersist {
    fn load_all(&self) -> Result<heapless::Vec<ScheduleRecord, MAX_SCHEDULES>, PersistError> {
        let Some(blob) = &self.blob else {
            return Err(PersistError::NotFound);
        };
        postcard::from_bytes(blob).map_err(|_| PersistError::Corrupted)
    }

    fn save_all(&mut self, records: &[ScheduleRecord]) -> Result<(), PersistError> {
        if self.fail_saves {
            return Err(PersistError::IoError);
        }
        let bytes =
            postcard::to_allocvec(records).map_err(|_| PersistError::IoError)?;
        self.blob = Some(bytes);
        self.save_count += 1;
        Ok(())
    }
}
