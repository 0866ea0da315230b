//! End-to-end runs of the job against an in-memory warehouse.

mod common;

use common::{account, customer, date, due, open_exception, payment, store, transaction};
use exledger_core::{
    config::JobConfig,
    error::LedgerError,
    model::{ExceptionReason, ExceptionStatus, SourceKind, CLOSED_REMARK},
    pipeline::{Pipeline, RunSummary},
    sample::{SampleSpec, SampleWarehouse},
    store::WarehouseStore,
};
use std::collections::HashSet;

fn run(store: &WarehouseStore, on: chrono::NaiveDate) -> RunSummary {
    Pipeline::new(store, JobConfig::standard()).run(on).expect("run")
}

#[test]
fn qualifying_customer_gets_one_exception_per_reason() {
    let store = store();
    customer(&store, "C1", "Active");
    account(&store, "A1", "C1", "Savings");
    transaction(&store, "T1", "C1", "Purchase");
    due(&store, "D1", "C1", "Credit Card");

    let summary = run(&store, date(2024, 6, 1));
    assert_eq!(summary.derivation.total(), 4);

    let rows = store.ledger_rows_for_customer("C1").unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.exception_status == ExceptionStatus::Open));
    let reasons: HashSet<_> = rows.iter().map(|r| r.exception_reason.as_str()).collect();
    let expected: HashSet<_> = SourceKind::ALL.iter().map(|s| s.reason().as_str()).collect();
    assert_eq!(reasons, expected);
}

#[test]
fn yesterdays_exception_ends_up_only_in_history() {
    let store = store();
    customer(&store, "C1", "Dormant");
    let yesterday = open_exception(&store, 7, "C1", None, date(2024, 5, 31));

    let summary = run(&store, date(2024, 6, 1));
    assert_eq!(summary.archived, 1);
    assert!(store.exception(7).unwrap().is_none());
    assert_eq!(store.history_rows().unwrap(), vec![yesterday]);
}

#[test]
fn paid_due_is_closed_in_the_same_run() {
    let store = store();
    customer(&store, "C1", "Dormant");
    due(&store, "D1", "C1", "Credit Card");
    payment(&store, "D1", "Paid");

    let summary = run(&store, date(2024, 6, 1));
    assert_eq!(summary.reconciliation.closed, 1);

    let rows = store.ledger_rows_for_customer("C1").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].exception_reason, ExceptionReason::CreditCardPaymentDue.as_str());
    assert_eq!(rows[0].due_id.as_deref(), Some("D1"));
    assert_eq!(rows[0].exception_status, ExceptionStatus::Closed);
    assert_eq!(rows[0].exception_update_remarks.as_deref(), Some(CLOSED_REMARK));
}

#[test]
fn staging_tables_are_gone_after_a_run() {
    let store = store();
    customer(&store, "C1", "Active");
    run(&store, date(2024, 6, 1));
    for source in SourceKind::ALL {
        assert!(!store.staging_exists(source).unwrap(), "{source}");
    }
}

#[test]
fn failed_run_tears_down_and_is_audited() {
    let store = store();
    customer(&store, "C1", "Active");
    // History already holds id 1, so archiving the legacy duplicate fails.
    open_exception(&store, 1, "C1", None, date(2024, 5, 1));
    store.archive_before(date(2024, 5, 2)).unwrap();
    open_exception(&store, 1, "C1", None, date(2024, 5, 3));

    let err = Pipeline::new(&store, JobConfig::standard())
        .run(date(2024, 6, 1))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Database(_)));

    for source in SourceKind::ALL {
        assert!(!store.staging_exists(source).unwrap(), "{source}");
    }
    // Derivation committed before archival failed; archival did not.
    assert_eq!(store.table_count("exception_records_hist").unwrap(), 1);
    assert_eq!(store.table_count("exception_records").unwrap(), 2);

    let runs = store.job_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    let recorded: RunSummary =
        serde_json::from_str(runs[0].summary_json.as_deref().unwrap()).unwrap();
    assert!(recorded.error.is_some());
}

#[test]
fn successful_run_is_audited_with_its_summary() {
    let store = store();
    customer(&store, "C1", "Active");
    let summary = run(&store, date(2024, 6, 1));

    let row = store.job_run(&summary.run_id).unwrap().expect("job_run row");
    assert_eq!(row.status, "succeeded");
    assert_eq!(row.run_date, "2024-06-01");
    let recorded: RunSummary = serde_json::from_str(row.summary_json.as_deref().unwrap()).unwrap();
    assert_eq!(recorded, summary);
}

#[test]
fn consecutive_runs_keep_ids_unique() {
    let store = store();
    SampleWarehouse::generate(&SampleSpec {
        seed: 77,
        customers: 80,
        as_of: date(2024, 6, 1),
        stale_exceptions: 20,
    })
    .load_into(&store)
    .unwrap();

    run(&store, date(2024, 6, 1));
    run(&store, date(2024, 6, 2));
    run(&store, date(2024, 6, 3));

    let mut ids: Vec<_> = store.ledger_rows().unwrap().iter().map(|r| r.exception_id).collect();
    ids.extend(store.history_rows().unwrap().iter().map(|r| r.exception_id));
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
}

#[test]
fn sample_run_leaves_only_current_rows_in_the_ledger() {
    let store = store();
    let spec = SampleSpec {
        seed: 2024,
        customers: 120,
        as_of: date(2024, 6, 1),
        stale_exceptions: 30,
    };
    let sample = SampleWarehouse::generate(&spec);
    sample.load_into(&store).unwrap();

    let summary = run(&store, spec.as_of);
    assert_eq!(summary.archived, 30);
    assert!(store
        .ledger_rows()
        .unwrap()
        .iter()
        .all(|r| r.exception_date == spec.as_of));

    // Archival precedes reconciliation, so aged rows move untouched.
    let history = store.history_rows().unwrap();
    assert_eq!(history, sample.stale_exceptions);
}
