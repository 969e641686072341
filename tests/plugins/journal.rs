use arborist::core::config::{self, QuotaConfig};
use arborist::core::db;
use arborist::core::entry::{ActionKind, NewEntry};
use arborist::core::error::ArboristError;
use arborist::core::gateway::{Collection, Direction, Field, StorageGateway};
use arborist::core::store::Store;
use arborist::plugins::journal::Journal;
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use tempfile::{TempDir, tempdir};

fn setup() -> (TempDir, Journal) {
    let tmp = tempdir().expect("tempdir");
    db::initialize_journal_db(tmp.path()).expect("journal init");
    let journal = Journal::open(&Store::new(tmp.path())).expect("journal");
    (tmp, journal)
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap()
}

#[test]
fn record_action_routes_by_kind() {
    let (_tmp, journal) = setup();
    let cut = journal
        .record_action(ActionKind::Cut, &NewEntry::new("c1", at(8), 2.0))
        .unwrap();
    let water = journal
        .record_action(ActionKind::Water, &NewEntry::new("w1", at(9), 1.0))
        .unwrap();
    assert_eq!(cut.kind, ActionKind::Cut);
    assert_eq!(water.kind, ActionKind::Water);

    let cuts = journal
        .gateway()
        .find_all_sorted_by(Collection::CutJournal, Field::Seq, Direction::Ascending)
        .unwrap();
    let waters = journal
        .gateway()
        .find_all_sorted_by(Collection::WaterJournal, Field::Seq, Direction::Ascending)
        .unwrap();
    assert_eq!(cuts, vec![cut]);
    assert_eq!(waters, vec![water]);
}

#[test]
fn last_n_returns_newest_insertions_first() {
    let (_tmp, journal) = setup();
    // Insertion order, not timestamp order, decides recency.
    for (hour, amount) in [(12, 0.1), (8, 0.2), (10, 0.3), (9, 0.4)] {
        journal
            .record_action(ActionKind::Water, &NewEntry::new("w1", at(hour), amount))
            .unwrap();
    }

    let last = journal.last_n(ActionKind::Water, 3).unwrap();
    let amounts: Vec<f64> = last.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![0.4, 0.3, 0.2]);

    assert!(journal.last_n(ActionKind::Cut, 10).unwrap().is_empty());
    assert!(journal.last_n(ActionKind::Water, 0).unwrap().is_empty());
}

#[test]
fn last_n_by_name_rejects_unknown_actions() {
    let (_tmp, journal) = setup();
    journal
        .record_action(ActionKind::Cut, &NewEntry::new("c1", at(8), 2.0))
        .unwrap();

    assert_eq!(journal.last_n_by_name("cut", 10).unwrap().len(), 1);
    assert!(matches!(
        journal.last_n_by_name("prune", 10),
        Err(ArboristError::InvalidConfiguration(_))
    ));
}

#[test]
fn open_reads_limits_from_the_store() {
    let tmp = tempdir().expect("tempdir");
    db::initialize_journal_db(tmp.path()).expect("journal init");
    fs::write(
        config::config_path(tmp.path()),
        "[quota]\nmax_water_per_day = 4.0\n",
    )
    .unwrap();

    let journal = Journal::open(&Store::new(tmp.path())).unwrap();
    assert_eq!(journal.config().max_water_per_day, 4.0);
    assert_eq!(journal.water_quota(at(8)).unwrap(), 4.0);
}

#[test]
fn new_rejects_invalid_limits() {
    let tmp = tempdir().expect("tempdir");
    let gateway = StorageGateway::new(&Store::new(tmp.path()));
    let config = QuotaConfig {
        min_branches_per_week: 9,
        ..QuotaConfig::default()
    };
    assert!(matches!(
        Journal::new(gateway, config),
        Err(ArboristError::InvalidConfiguration(_))
    ));
}
