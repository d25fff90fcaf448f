//! Recurrence evaluation: "is this schedule due?" and "when does it run
//! next?".
//!
//! Both entry points are pure and deterministic given `(record, now)`,
//! which keeps them independently testable with a fabricated clock.
//!
//! The runner is not guaranteed to tick exactly on minute boundaries, so
//! exact-equality time checks would miss or duplicate fires. The policy
//! therefore carries a ±1-minute due window plus a 60-second re-fire
//! guard, trading a little timing slop for reliability.

use super::{Repeat, ScheduleRecord, NEVER};
use crate::config::IrrigationConfig;

const SECS_PER_DAY: i64 = 86_400;

// ═══════════════════════════════════════════════════════════════
//  Policy
// ═══════════════════════════════════════════════════════════════

/// Timing knobs for due evaluation, taken from [`IrrigationConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RecurrencePolicy {
    /// Offset from UTC in minutes for local-time decomposition.
    pub utc_offset_minutes: i32,
    /// Due-window half-width in minutes around the start time.
    pub tolerance_minutes: u16,
    /// Seconds after `last_run` during which the record cannot re-fire.
    pub refire_guard_secs: u32,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self::from(&IrrigationConfig::default())
    }
}

impl From<&IrrigationConfig> for RecurrencePolicy {
    fn from(config: &IrrigationConfig) -> Self {
        Self {
            utc_offset_minutes: config.utc_offset_minutes,
            tolerance_minutes: config.due_tolerance_minutes,
            refire_guard_secs: config.refire_guard_secs,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Local-time decomposition
// ═══════════════════════════════════════════════════════════════

/// Local wall-clock parts of a unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    /// Minutes since local midnight, 0–1439.
    pub minutes_of_day: u16,
    /// Weekday, 0 = Sunday .. 6 = Saturday.
    pub weekday: u8,
}

/// Decompose `now` into local minutes-of-day and weekday.
pub fn local_parts(now: u32, utc_offset_minutes: i32) -> LocalTime {
    let local = i64::from(now) + i64::from(utc_offset_minutes) * 60;
    LocalTime {
        minutes_of_day: (local.rem_euclid(SECS_PER_DAY) / 60) as u16,
        weekday: weekday_of_local(local),
    }
}

/// Weekday of a local-seconds timestamp. 1970-01-01 was a Thursday.
fn weekday_of_local(local_secs: i64) -> u8 {
    ((local_secs.div_euclid(SECS_PER_DAY) + 4).rem_euclid(7)) as u8
}

// ═══════════════════════════════════════════════════════════════
//  Due check
// ═══════════════════════════════════════════════════════════════

/// Whether `record` should execute at `now`.
///
/// Ordered cheapest-first: enabled flag, next-run gate, re-fire guard,
/// end date, then the local-time window and (for weekly/custom) the
/// day-of-week mask.
pub fn is_due(record: &ScheduleRecord, now: u32, policy: &RecurrencePolicy) -> bool {
    if !record.enabled {
        return false;
    }
    if now < record.next_run {
        return false;
    }
    // Prevent double execution inside the same evaluation minute.
    if now.saturating_sub(record.last_run) < policy.refire_guard_secs {
        return false;
    }
    if record.end_date != 0 && now > record.end_date {
        return false;
    }

    let local = local_parts(now, policy.utc_offset_minutes);
    let delta =
        (i32::from(local.minutes_of_day) - i32::from(record.start_time_minutes)).abs();
    if delta > i32::from(policy.tolerance_minutes) {
        return false;
    }

    if record.repeat.uses_day_mask() && record.days_of_week[usize::from(local.weekday)] == 0 {
        return false;
    }

    true
}

// ═══════════════════════════════════════════════════════════════
//  Next-run computation
// ═══════════════════════════════════════════════════════════════

/// Next timestamp at which `record` is scheduled to run, or [`NEVER`].
///
/// A ONCE record that has already executed never re-arms. A weekly or
/// custom record whose day mask is all zero is treated as permanently
/// dormant rather than firing on an arbitrary 7th-iteration day.
pub fn next_run(record: &ScheduleRecord, now: u32, policy: &RecurrencePolicy) -> u32 {
    if record.repeat == Repeat::Once && record.run_count > 0 {
        return NEVER;
    }

    let offset = i64::from(policy.utc_offset_minutes) * 60;
    let local_now = i64::from(now) + offset;

    // Today at the scheduled time, seconds zeroed.
    let day_start = local_now - local_now.rem_euclid(SECS_PER_DAY);
    let mut candidate = day_start + i64::from(record.start_time_minutes) * 60;

    // Already passed (or exactly now): move to tomorrow.
    if candidate <= local_now {
        candidate += SECS_PER_DAY;
    }

    if record.repeat.uses_day_mask() {
        if record.days_of_week.iter().all(|d| *d == 0) {
            return NEVER;
        }
        let mut days_checked = 0;
        while days_checked < 7 {
            let weekday = weekday_of_local(candidate);
            if record.days_of_week[usize::from(weekday)] != 0 {
                break;
            }
            candidate += SECS_PER_DAY;
            days_checked += 1;
        }
    }

    let utc = candidate - offset;
    if utc <= 0 || utc >= i64::from(NEVER) {
        return NEVER;
    }
    utc as u32
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
