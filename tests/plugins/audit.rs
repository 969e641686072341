use arborist::core::config::QuotaConfig;
use arborist::core::db;
use arborist::core::entry::{ActionKind, NewEntry};
use arborist::core::error::ArboristError;
use arborist::core::gateway::{Collection, StorageGateway};
use arborist::core::store::Store;
use arborist::plugins::audit::{DailyAnomaly, WeeklyAnomaly};
use arborist::plugins::journal::Journal;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::{TempDir, tempdir};

fn setup() -> (TempDir, Journal) {
    let tmp = tempdir().expect("tempdir");
    db::initialize_journal_db(tmp.path()).expect("journal init");
    let gateway = StorageGateway::new(&Store::new(tmp.path()));
    let journal = Journal::new(gateway, QuotaConfig::default()).expect("journal");
    (tmp, journal)
}

fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn record(journal: &Journal, kind: ActionKind, ts: DateTime<Utc>, amount: f64) -> String {
    journal
        .record_action(kind, &NewEntry::new("r1", ts, amount))
        .expect("record")
        .entry_id
}

#[test]
fn missing_water_day_is_synthesized_and_flagged() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Water, at(1, 1, 9), 1.5);
    record(&journal, ActionKind::Water, at(1, 3, 9), 1.5);

    let anomalies = journal.audit_water().unwrap();
    assert_eq!(
        anomalies,
        vec![DailyAnomaly {
            date: date(1, 2),
            amount: 0.0
        }]
    );
}

#[test]
fn water_bounds_are_inclusive() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Water, at(1, 1, 9), 1.0);
    record(&journal, ActionKind::Water, at(1, 2, 9), 2.0);
    record(&journal, ActionKind::Water, at(1, 3, 9), 0.5);
    record(&journal, ActionKind::Water, at(1, 4, 9), 2.0);
    record(&journal, ActionKind::Water, at(1, 4, 18), 0.5);

    let anomalies = journal.audit_water().unwrap();
    assert_eq!(
        anomalies,
        vec![
            DailyAnomaly {
                date: date(1, 3),
                amount: 0.5
            },
            DailyAnomaly {
                date: date(1, 4),
                amount: 2.5
            },
        ]
    );
}

#[test]
fn single_water_day_is_audited_on_its_own() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Water, at(1, 1, 9), 3.0);
    assert_eq!(
        journal.audit_water().unwrap(),
        vec![DailyAnomaly {
            date: date(1, 1),
            amount: 3.0
        }]
    );
}

#[test]
fn range_audits_need_data() {
    let (_tmp, journal) = setup();
    assert!(matches!(
        journal.audit_water(),
        Err(ArboristError::InsufficientData(_))
    ));
    assert!(matches!(
        journal.audit_cuts(),
        Err(ArboristError::InsufficientData(_))
    ));
}

#[test]
fn missing_cut_weeks_are_synthesized_up_to_the_last_week() {
    let (_tmp, journal) = setup();
    // Weeks starting 2024-01-01 (ISO 1), 01-08 (2), 01-15 (3), 01-22 (4).
    record(&journal, ActionKind::Cut, at(1, 2, 9), 6.0);
    record(&journal, ActionKind::Cut, at(1, 23, 9), 3.0);

    let anomalies = journal.audit_cuts().unwrap();
    assert_eq!(
        anomalies,
        vec![
            WeeklyAnomaly {
                week_start: date(1, 8),
                week_number: 2,
                amount: 0.0
            },
            WeeklyAnomaly {
                week_start: date(1, 15),
                week_number: 3,
                amount: 0.0
            },
            WeeklyAnomaly {
                week_start: date(1, 22),
                week_number: 4,
                amount: 3.0
            },
        ]
    );
}

#[test]
fn cut_weeks_within_bounds_pass() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Cut, at(1, 1, 9), 4.0);
    record(&journal, ActionKind::Cut, at(1, 7, 9), 4.0);
    record(&journal, ActionKind::Cut, at(1, 8, 9), 4.0);
    record(&journal, ActionKind::Cut, at(1, 15, 9), 9.0);

    let anomalies = journal.audit_cuts().unwrap();
    assert_eq!(
        anomalies,
        vec![WeeklyAnomaly {
            week_start: date(1, 15),
            week_number: 3,
            amount: 9.0
        }]
    );
}

#[test]
fn backdated_entry_is_flagged_by_ordering_audit() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Water, at(1, 1, 10), 0.5);
    let backdated = record(&journal, ActionKind::Water, at(1, 1, 9), 0.5);
    record(&journal, ActionKind::Water, at(1, 1, 11), 0.5);

    let report = journal.audit_ordering().unwrap();
    assert_eq!(report.get(&Collection::WaterJournal), Some(&vec![backdated]));
    assert_eq!(report.get(&Collection::CutJournal), Some(&Vec::new()));
}

#[test]
fn in_order_journal_reports_every_collection_empty() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Cut, at(1, 1, 9), 4.0);
    record(&journal, ActionKind::Cut, at(1, 2, 9), 4.0);
    record(&journal, ActionKind::Water, at(1, 1, 9), 1.0);

    let report = journal.audit_ordering().unwrap();
    assert_eq!(report.len(), 2);
    assert!(report.values().all(|ids| ids.is_empty()));
}

#[test]
fn equal_timestamps_are_not_inversions() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Cut, at(1, 1, 9), 1.0);
    record(&journal, ActionKind::Cut, at(1, 1, 9), 2.0);

    let report = journal.audit_ordering().unwrap();
    assert_eq!(report.get(&Collection::CutJournal), Some(&Vec::new()));
}

#[test]
fn audits_are_idempotent_and_read_only() {
    let (_tmp, journal) = setup();
    record(&journal, ActionKind::Cut, at(1, 9, 9), 5.0);
    record(&journal, ActionKind::Cut, at(1, 2, 9), 5.0);
    record(&journal, ActionKind::Water, at(1, 1, 9), 1.5);
    record(&journal, ActionKind::Water, at(1, 4, 9), 1.5);

    let first = journal.audit_ordering().unwrap();
    let second = journal.audit_ordering().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get(&Collection::CutJournal).map(Vec::len), Some(1));

    assert_eq!(journal.audit_water().unwrap(), journal.audit_water().unwrap());
    assert_eq!(journal.audit_cuts().unwrap(), journal.audit_cuts().unwrap());

    assert_eq!(journal.last_n(ActionKind::Cut, 10).unwrap().len(), 2);
    assert_eq!(journal.last_n(ActionKind::Water, 10).unwrap().len(), 2);
}
