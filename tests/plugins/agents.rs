use arborist::core::config::QuotaConfig;
use arborist::core::db;
use arborist::core::entry::{ActionKind, NewEntry};
use arborist::core::error::ArboristError;
use arborist::core::gateway::StorageGateway;
use arborist::core::store::Store;
use arborist::plugins::agents::{CutAgent, CutOutcome, WaterAgent, WaterOutcome};
use arborist::plugins::cycles::{run_cut_cycle, run_water_cycle};
use arborist::plugins::journal::Journal;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::{TempDir, tempdir};

fn setup() -> (TempDir, Journal) {
    let tmp = tempdir().expect("tempdir");
    db::initialize_journal_db(tmp.path()).expect("journal init");
    let gateway = StorageGateway::new(&Store::new(tmp.path()));
    let journal = Journal::new(gateway, QuotaConfig::default()).expect("journal");
    (tmp, journal)
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn count(journal: &Journal, kind: ActionKind) -> usize {
    journal.last_n(kind, 1000).unwrap().len()
}

#[test]
fn water_agent_pours_the_daily_allowance() {
    let (_tmp, journal) = setup();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();

    match agent.water_if_due(&journal, at(14, 9)).unwrap() {
        WaterOutcome::Watered { entry } => {
            assert_eq!(entry.amount, 2.0);
            assert_eq!(entry.robot_id, "w1");
            assert_eq!(entry.kind, ActionKind::Water);
            assert_eq!(entry.timestamp, at(14, 9));
        }
        other => panic!("expected Watered, got {:?}", other),
    }
    assert_eq!(agent.water_level(), 3.0);
    assert_eq!(count(&journal, ActionKind::Water), 1);
}

#[test]
fn water_agent_is_a_no_op_once_satisfied() {
    let (_tmp, journal) = setup();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();
    agent.water_if_due(&journal, at(14, 9)).unwrap();

    let outcome = agent.water_if_due(&journal, at(14, 15)).unwrap();
    assert_eq!(outcome, WaterOutcome::AlreadySatisfied);
    assert_eq!(agent.water_level(), 3.0);
    assert_eq!(count(&journal, ActionKind::Water), 1);
}

#[test]
fn water_agent_tops_up_a_partial_day() {
    let (_tmp, journal) = setup();
    journal
        .record_action(ActionKind::Water, &NewEntry::new("w0", at(14, 7), 1.5))
        .unwrap();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();

    match agent.water_if_due(&journal, at(14, 9)).unwrap() {
        WaterOutcome::Watered { entry } => assert_eq!(entry.amount, 0.5),
        other => panic!("expected Watered, got {:?}", other),
    }
    assert_eq!(agent.water_level(), 4.5);
}

#[test]
fn water_agent_reports_short_tank_without_recording() {
    let (_tmp, journal) = setup();
    let mut agent = WaterAgent::new("w1", 1.0).unwrap();

    let outcome = agent.water_if_due(&journal, at(14, 9)).unwrap();
    assert_eq!(
        outcome,
        WaterOutcome::InsufficientSupply {
            required: 2.0,
            available: 1.0
        }
    );
    assert_eq!(agent.water_level(), 1.0);
    assert_eq!(count(&journal, ActionKind::Water), 0);
}

#[test]
fn water_cycle_refills_once_then_pours() {
    let (_tmp, journal) = setup();
    let mut agent = WaterAgent::new("w1", 3.0).unwrap();

    let first = run_water_cycle(&journal, &mut agent, at(14, 9)).unwrap();
    assert!(!first.refilled);
    assert_eq!(agent.water_level(), 1.0);

    let second = run_water_cycle(&journal, &mut agent, at(15, 9)).unwrap();
    assert!(second.refilled);
    assert!(matches!(second.outcome, WaterOutcome::Watered { .. }));
    assert_eq!(agent.water_level(), 1.0);
    assert_eq!(count(&journal, ActionKind::Water), 2);
}

#[test]
fn water_cycle_surfaces_a_second_shortfall() {
    let (_tmp, journal) = setup();
    let mut agent = WaterAgent::new("w1", 1.5).unwrap();

    let result = run_water_cycle(&journal, &mut agent, at(14, 9));
    match result {
        Err(ArboristError::InsufficientSupply {
            required,
            available,
        }) => {
            assert_eq!(required, 2.0);
            assert_eq!(available, 1.5);
        }
        other => panic!("expected InsufficientSupply, got {:?}", other),
    }
    assert_eq!(count(&journal, ActionKind::Water), 0);
}

#[test]
fn cut_agent_cuts_exactly_the_remaining_quota() {
    let (_tmp, journal) = setup();
    journal
        .record_action(ActionKind::Cut, &NewEntry::new("c0", at(11, 9), 3.0))
        .unwrap();
    let agent = CutAgent::new("c1");

    match agent.cut_if_due(&journal, at(14, 9)).unwrap() {
        CutOutcome::Cut { entry } => {
            assert_eq!(entry.amount, 5.0);
            assert_eq!(entry.robot_id, "c1");
            assert_eq!(entry.kind, ActionKind::Cut);
        }
        other => panic!("expected Cut, got {:?}", other),
    }
    assert_eq!(journal.cut_quota(at(14, 10)).unwrap(), 0);
}

#[test]
fn cut_agent_does_nothing_after_eight_branches() {
    let (_tmp, journal) = setup();
    journal
        .record_action(ActionKind::Cut, &NewEntry::new("c0", at(11, 9), 8.0))
        .unwrap();

    let outcome = run_cut_cycle(&journal, "c1", at(14, 9)).unwrap();
    assert_eq!(outcome, CutOutcome::NothingToDo);
    assert_eq!(count(&journal, ActionKind::Cut), 1);
}

#[test]
fn agents_surface_an_unreachable_store() {
    let tmp = tempdir().expect("tempdir");
    let gateway = StorageGateway::new(&Store::new(tmp.path().join("gone")));
    let journal = Journal::new(gateway, QuotaConfig::default()).unwrap();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();

    assert!(matches!(
        agent.water_if_due(&journal, at(14, 9)),
        Err(ArboristError::StorageUnavailable(_))
    ));
    assert!(matches!(
        run_cut_cycle(&journal, "c1", at(14, 9)),
        Err(ArboristError::StorageUnavailable(_))
    ));
}

#[test]
fn rejected_pour_leaves_the_tank_untouched() {
    let (_tmp, journal) = setup();
    let conn = db::db_connect(journal.gateway().db_path()).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_water BEFORE INSERT ON WaterJournal \
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .unwrap();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();

    assert!(matches!(
        agent.water_if_due(&journal, at(14, 9)),
        Err(ArboristError::RusqliteError(_))
    ));
    assert_eq!(agent.water_level(), 5.0);
    assert_eq!(count(&journal, ActionKind::Water), 0);
}

#[test]
fn committed_pour_survives_a_lost_trail_line() {
    let (tmp, journal) = setup();
    std::fs::create_dir(tmp.path().join("journal.events.jsonl")).unwrap();
    let mut agent = WaterAgent::new("w1", 5.0).unwrap();

    let outcome = agent.water_if_due(&journal, at(14, 9)).unwrap();
    assert!(matches!(outcome, WaterOutcome::Watered { .. }));
    assert_eq!(agent.water_level(), 3.0);
    assert_eq!(count(&journal, ActionKind::Water), 1);
}
