//! End-to-end service tests: command dispatch, schedule firing,
//! admission under contention, persistence, and weather adjustment —
//! all against mock ports with a fabricated clock.

use gatemesh::app::commands::AppCommand;
use gatemesh::app::events::{AppEvent, EventKind};
use gatemesh::app::service::IrrigationService;
use gatemesh::config::IrrigationConfig;
use gatemesh::error::{AdmissionError, Error};
use gatemesh::hierarchy::loader::load_farm_config;
use gatemesh::schedule::{Repeat, ScheduleId, ScheduleRecord, ZoneId};
use gatemesh::weather::WeatherSample;

use crate::mock_ports::{MockClock, MockPersist, MockValves, RecordingSink};

/// 2021-01-03 00:00:00 UTC, a Sunday.
const SUNDAY_MIDNIGHT: u32 = 1_609_632_000;
/// Sunday 06:00 UTC.
const SUNDAY_0600: u32 = SUNDAY_MIDNIGHT + 6 * 3600;

const FARM_JSON: &str = r#"{
    "farm": {
        "id": "willow_creek",
        "name": "Willow Creek Farm",
        "fields": [
            {
                "id": "north_40",
                "display_name": "North 40",
                "acres": 40.0,
                "crop": { "type": "corn" },
                "max_concurrent_zones": 2,
                "zones": [
                    { "id": "zone_a", "display_name": "A", "acres": 10.0, "priority": 5 },
                    { "id": "zone_b", "display_name": "B", "acres": 10.0, "priority": 5 },
                    { "id": "zone_c", "display_name": "C", "acres": 10.0, "priority": 5 }
                ]
            }
        ]
    }
}"#;

fn service() -> IrrigationService {
    let hierarchy = load_farm_config(FARM_JSON, &IrrigationConfig::default()).unwrap();
    IrrigationService::new(IrrigationConfig::default(), hierarchy)
}

fn daily(id: &str, zone: &str, start_minutes: u16, duration_minutes: u16) -> ScheduleRecord {
    ScheduleRecord {
        id: ScheduleId::try_from(id).unwrap(),
        name: heapless::String::try_from(id).unwrap(),
        zone_id: ZoneId::try_from(zone).unwrap(),
        enabled: true,
        start_time_minutes: start_minutes,
        duration_minutes,
        repeat: Repeat::Daily,
        days_of_week: [0; 7],
        start_date: 0,
        end_date: 0,
        last_run: 0,
        next_run: 0,
        run_count: 0,
        created_at: SUNDAY_MIDNIGHT,
        updated_at: SUNDAY_MIDNIGHT,
    }
}

fn started_zones(sink: &RecordingSink) -> Vec<String> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Schedule {
                kind: EventKind::Started,
                zone_id,
                ..
            } => Some(zone_id.as_str().to_string()),
            _ => None,
        })
        .collect()
}

fn denied_count(sink: &RecordingSink) -> usize {
    sink.events
        .iter()
        .filter(|e| {
            matches!(
                e,
                AppEvent::Schedule {
                    kind: EventKind::Denied,
                    ..
                }
            )
        })
        .count()
}

// ── Schedule firing ───────────────────────────────────────────

#[test]
fn daily_schedule_fires_at_start_time() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    // Well before start time: nothing fires.
    clock.set(SUNDAY_0600 - 600);
    svc.tick(&clock, &mut valves, &mut sink);
    assert!(valves.starts().is_empty());

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);
    assert_eq!(valves.starts(), vec!["zone_a"]);
    assert_eq!(started_zones(&sink), vec!["zone_a"]);

    let rec = svc.schedules().find_by_id("morning").unwrap();
    assert_eq!(rec.run_count, 1);
    assert_eq!(rec.last_run, SUNDAY_0600);
    // Re-armed for tomorrow 06:00.
    assert_eq!(rec.next_run, SUNDAY_0600 + 86_400);
}

#[test]
fn schedule_does_not_refire_within_window() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);
    clock.advance(60);
    svc.tick(&clock, &mut valves, &mut sink);

    assert_eq!(valves.starts().len(), 1);
}

#[test]
fn run_completes_after_duration() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);
    assert!(svc.coordinator().is_active("zone_a"));

    // Half-way through: still running.
    clock.advance(15 * 60);
    svc.tick(&clock, &mut valves, &mut sink);
    assert!(svc.coordinator().is_active("zone_a"));
    assert!(valves.stops().is_empty());

    clock.advance(16 * 60);
    svc.tick(&clock, &mut valves, &mut sink);
    assert_eq!(valves.stops(), vec!["zone_a"]);
    assert!(!svc.coordinator().is_active("zone_a"));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Schedule {
            kind: EventKind::Completed,
            ..
        }
    )));
}

// ── Contention ────────────────────────────────────────────────

#[test]
fn field_limit_denies_third_concurrent_zone() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    for (id, zone) in [("a", "zone_a"), ("b", "zone_b"), ("c", "zone_c")] {
        svc.handle_command(
            AppCommand::AddSchedule(daily(id, zone, 360, 10)),
            &clock,
            &mut valves,
            &mut sink,
        )
        .unwrap();
    }

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);

    assert_eq!(valves.starts(), vec!["zone_a", "zone_b"]);
    assert_eq!(denied_count(&sink), 1);

    // The denied schedule is untouched: still armed for today.
    let c = svc.schedules().find_by_id("c").unwrap();
    assert_eq!(c.run_count, 0);
    assert_eq!(c.next_run, SUNDAY_0600);
}

#[test]
fn contended_zone_misses_cycle_after_window() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    for (id, zone) in [("a", "zone_a"), ("b", "zone_b"), ("c", "zone_c")] {
        svc.handle_command(
            AppCommand::AddSchedule(daily(id, zone, 360, 10)),
            &clock,
            &mut valves,
            &mut sink,
        )
        .unwrap();
    }

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);

    // Eleven minutes later the siblings are done, freeing the field,
    // but zone_c's window has closed: it waits for tomorrow.
    clock.advance(11 * 60);
    svc.tick(&clock, &mut valves, &mut sink);

    assert_eq!(valves.starts(), vec!["zone_a", "zone_b"]);
    let c = svc.schedules().find_by_id("c").unwrap();
    assert_eq!(c.run_count, 0);
}

// ── Manual zone control ───────────────────────────────────────

#[test]
fn manual_start_and_stop() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::StartZone(ZoneId::try_from("zone_a").unwrap()),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();
    assert!(svc.coordinator().is_active("zone_a"));
    assert!(matches!(sink.last(), Some(AppEvent::ZoneStarted { .. })));

    svc.handle_command(
        AppCommand::StopZone(ZoneId::try_from("zone_a").unwrap()),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();
    assert!(!svc.coordinator().is_active("zone_a"));
    assert!(matches!(sink.last(), Some(AppEvent::ZoneStopped { .. })));
}

#[test]
fn manual_stop_aborts_scheduled_run() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);
    assert!(svc.coordinator().is_active("zone_a"));

    // Operator cuts the run short five minutes in.
    clock.advance(5 * 60);
    svc.handle_command(
        AppCommand::StopZone(ZoneId::try_from("zone_a").unwrap()),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();
    assert!(!svc.coordinator().is_active("zone_a"));

    // Past the original end: no second stop, no completion event.
    clock.advance(30 * 60);
    svc.tick(&clock, &mut valves, &mut sink);
    assert_eq!(valves.stops(), vec!["zone_a"]);
    assert!(!sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Schedule {
            kind: EventKind::Completed,
            ..
        }
    )));
}

#[test]
fn manual_start_releases_slot_on_actuation_failure() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    valves.fail_next = true;
    svc.handle_command(
        AppCommand::StartZone(ZoneId::try_from("zone_a").unwrap()),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    assert!(!svc.coordinator().is_active("zone_a"));
    assert!(matches!(sink.last(), Some(AppEvent::ZoneFault { .. })));
}

#[test]
fn unknown_zone_is_an_admission_error() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    let err = svc
        .handle_command(
            AppCommand::StartZone(ZoneId::try_from("nope").unwrap()),
            &clock,
            &mut valves,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Admission(AdmissionError::UnknownZone));
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn schedules_persist_on_change_and_reload() {
    let mut persist = MockPersist::new();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    let mut svc = service();
    svc.start(&persist, &mut sink);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::EngineStarted { schedule_count: 0 })
    ));

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    assert!(svc.persist_if_dirty(&mut persist));
    assert_eq!(persist.save_count, 1);
    // Nothing changed since: no rewrite.
    assert!(!svc.persist_if_dirty(&mut persist));

    // A fresh service sees the saved table.
    let mut svc2 = service();
    let mut sink2 = RecordingSink::new();
    svc2.start(&persist, &mut sink2);
    assert!(matches!(
        sink2.last(),
        Some(AppEvent::EngineStarted { schedule_count: 1 })
    ));
    assert!(svc2.schedules().find_by_id("morning").is_some());
}

#[test]
fn failed_save_keeps_dirty_flag() {
    let mut persist = MockPersist::new();
    persist.fail_saves = true;
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    let mut svc = service();
    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    assert!(!svc.persist_if_dirty(&mut persist));
    assert!(svc.is_schedules_dirty());

    persist.fail_saves = false;
    assert!(svc.persist_if_dirty(&mut persist));
    assert!(!svc.is_schedules_dirty());
}

#[test]
fn corrupted_blob_starts_with_empty_table() {
    let mut persist = MockPersist::new();
    persist.blob = Some(vec![0xFF, 0x00, 0xAB]);
    let mut sink = RecordingSink::new();

    let mut svc = service();
    svc.start(&persist, &mut sink);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::EngineStarted { schedule_count: 0 })
    ));
}

// ── Weather adjustment ────────────────────────────────────────

#[test]
fn rain_halves_run_duration() {
    let mut svc = service();
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::AddSchedule(daily("morning", "zone_a", 360, 30)),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();
    svc.handle_command(
        AppCommand::UpdateWeather(WeatherSample {
            temperature_c: 18.0,
            humidity_pct: 90.0,
            wind_mps: 1.0,
            precipitation_inches: 0.2,
        }),
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    clock.set(SUNDAY_0600);
    svc.tick(&clock, &mut valves, &mut sink);
    assert_eq!(valves.starts(), vec!["zone_a"]);

    // 30 minutes scaled by 0.5: the run ends after 15.
    clock.advance(16 * 60);
    svc.tick(&clock, &mut valves, &mut sink);
    assert_eq!(valves.stops(), vec!["zone_a"]);
}

// ── Water accounting ──────────────────────────────────────────

#[test]
fn reported_usage_rolls_up_and_gates_admission() {
    let json = r#"{ "farm": { "fields": [
        { "id": "f1", "water_allocation_l": 100.0, "zones": [
            { "id": "zone_a" }, { "id": "zone_b" }
        ] }
    ] } }"#;
    let config = IrrigationConfig::default();
    let hierarchy = load_farm_config(json, &config).unwrap();
    let mut svc = IrrigationService::new(config, hierarchy);
    let clock = MockClock::new(SUNDAY_MIDNIGHT);
    let mut valves = MockValves::new();
    let mut sink = RecordingSink::new();

    svc.handle_command(
        AppCommand::ReportWaterUsage {
            zone_id: ZoneId::try_from("zone_a").unwrap(),
            liters: 150.0,
        },
        &clock,
        &mut valves,
        &mut sink,
    )
    .unwrap();

    let err = svc
        .handle_command(
            AppCommand::StartZone(ZoneId::try_from("zone_b").unwrap()),
            &clock,
            &mut valves,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Admission(AdmissionError::AllocationExceeded));
}
