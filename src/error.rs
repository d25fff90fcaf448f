//! Unified error types for the GateMesh irrigation core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! surrounding control loop's error handling uniform. All variants are `Copy`
//! and allocation-free.
//!
//! None of these are fatal: a denied admission is an expected outcome of
//! normal contention, and every store error is reported back to the caller
//! and the event sink rather than halting the scheduler.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level core error
// ---------------------------------------------------------------------------

/// Every fallible operation in the irrigation core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A schedule store operation failed.
    Schedule(ScheduleError),
    /// The coordinator refused a zone-start request.
    Admission(AdmissionError),
    /// The farm/field/zone tree rejected a mutation or lookup.
    Hierarchy(HierarchyError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Admission(e) => write!(f, "admission: {e}"),
            Self::Hierarchy(e) => write!(f, "hierarchy: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// A record with the same identifier already exists in the store.
    DuplicateId,
    /// No record with the requested identifier.
    NotFound,
    /// The store is at its fixed capacity.
    CapacityExceeded,
    /// Record fields violate their bounds (start time past 23:59 or a
    /// zero duration).
    InvalidRecord,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId => write!(f, "schedule ID already exists"),
            Self::NotFound => write!(f, "schedule not found"),
            Self::CapacityExceeded => write!(f, "schedule limit reached"),
            Self::InvalidRecord => write!(f, "schedule fields out of bounds"),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Admission errors
// ---------------------------------------------------------------------------

/// Reasons the coordinator can deny a zone-start request.
///
/// These are *expected* outcomes under contention, not faults: the runner
/// reports them through the event sink and leaves the schedule pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// The zone is not present in the hierarchy.
    UnknownZone,
    /// The parent field already has its maximum concurrent zones active.
    FieldConcurrencyLimitReached,
    /// The field or farm water allocation is exhausted.
    AllocationExceeded,
}

impl AdmissionError {
    /// Short tag suitable for event messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownZone => "unknown zone",
            Self::FieldConcurrencyLimitReached => "field limit reached",
            Self::AllocationExceeded => "allocation exceeded",
        }
    }
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AdmissionError> for Error {
    fn from(e: AdmissionError) -> Self {
        Self::Admission(e)
    }
}

// ---------------------------------------------------------------------------
// Hierarchy errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// The field or zone arena is at its fixed capacity.
    TableFull,
    /// A zone was added under a field handle that does not exist.
    UnknownField,
    /// A field or zone with the same identifier already exists.
    DuplicateId,
    /// A node binding referenced a zone that does not exist.
    UnknownZone,
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "hierarchy table full"),
            Self::UnknownField => write!(f, "unknown field"),
            Self::DuplicateId => write!(f, "duplicate hierarchy ID"),
            Self::UnknownZone => write!(f, "unknown zone"),
        }
    }
}

impl From<HierarchyError> for Error {
    fn from(e: HierarchyError) -> Self {
        Self::Hierarchy(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Core-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
