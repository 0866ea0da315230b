//! Integration tests for payment reconciliation.
//!
//! 1. A paid record closes the linked exception with the closed remark
//! 2. A linked but unpaid record keeps it Open with the pending remark
//! 3. Rows without a linked record are untouched
//! 4. Closed is terminal

mod common;

use common::{customer, date, open_exception, payment, store};
use exledger_core::{
    config::ReconcilePolicy,
    model::{ExceptionStatus, CLOSED_REMARK, PENDING_REMARK},
};

#[test]
fn paid_record_closes_exception() {
    let store = store();
    customer(&store, "C1", "Active");
    open_exception(&store, 1, "C1", Some("D1"), date(2024, 6, 1));
    payment(&store, "D1", "Paid");

    let outcome = store
        .reconcile_payments(date(2024, 6, 1), &ReconcilePolicy::default())
        .unwrap();
    assert_eq!(outcome.closed, 1);
    assert_eq!(outcome.still_open, 0);

    let row = store.exception(1).unwrap().unwrap();
    assert_eq!(row.exception_status, ExceptionStatus::Closed);
    assert_eq!(row.exception_update_remarks.as_deref(), Some(CLOSED_REMARK));
    assert_eq!(row.exception_update_date, Some(date(2024, 6, 1)));
}

#[test]
fn unpaid_record_keeps_exception_open() {
    let store = store();
    customer(&store, "C1", "Active");
    open_exception(&store, 1, "C1", Some("D1"), date(2024, 6, 1));
    payment(&store, "D1", "Pending");

    let outcome = store
        .reconcile_payments(date(2024, 6, 1), &ReconcilePolicy::default())
        .unwrap();
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.still_open, 1);

    let row = store.exception(1).unwrap().unwrap();
    assert_eq!(row.exception_status, ExceptionStatus::Open);
    assert_eq!(row.exception_update_remarks.as_deref(), Some(PENDING_REMARK));
}

#[test]
fn any_paid_record_among_several_closes() {
    let store = store();
    customer(&store, "C1", "Active");
    open_exception(&store, 1, "C1", Some("D1"), date(2024, 6, 1));
    payment(&store, "D1", "Failed");
    payment(&store, "D1", "Paid");

    let outcome = store
        .reconcile_payments(date(2024, 6, 1), &ReconcilePolicy::default())
        .unwrap();
    assert_eq!(outcome.closed, 1);
    assert_eq!(outcome.still_open, 0);
}

#[test]
fn unlinked_rows_are_untouched() {
    let store = store();
    customer(&store, "C1", "Active");
    let no_due = open_exception(&store, 1, "C1", None, date(2024, 6, 1));
    let no_record = open_exception(&store, 2, "C1", Some("D2"), date(2024, 6, 1));
    payment(&store, "D9", "Paid");

    let outcome = store
        .reconcile_payments(date(2024, 6, 2), &ReconcilePolicy::default())
        .unwrap();
    assert_eq!(outcome.closed + outcome.still_open, 0);
    assert_eq!(store.ledger_rows().unwrap(), vec![no_due, no_record]);
}

#[test]
fn closed_is_terminal() {
    let store = store();
    customer(&store, "C1", "Active");
    open_exception(&store, 1, "C1", Some("D1"), date(2024, 6, 1));
    payment(&store, "D1", "Paid");
    store
        .reconcile_payments(date(2024, 6, 1), &ReconcilePolicy::default())
        .unwrap();
    let closed = store.exception(1).unwrap().unwrap();

    // A later reversal in the payment feed does not reopen the exception.
    payment(&store, "D1", "Failed");
    let outcome = store
        .reconcile_payments(date(2024, 6, 2), &ReconcilePolicy::default())
        .unwrap();
    assert_eq!(outcome.closed + outcome.still_open, 0);
    assert_eq!(store.exception(1).unwrap().unwrap(), closed);
}

#[test]
fn custom_policy_drives_status_and_remarks() {
    let store = store();
    customer(&store, "C1", "Active");
    open_exception(&store, 1, "C1", Some("D1"), date(2024, 6, 1));
    open_exception(&store, 2, "C1", Some("D2"), date(2024, 6, 1));
    payment(&store, "D1", "Settled");
    payment(&store, "D2", "Paid");

    let policy = ReconcilePolicy {
        paid_status: "Settled".into(),
        closed_remark: "Settled by bank transfer".into(),
        pending_remark: "Awaiting settlement".into(),
    };
    let outcome = store.reconcile_payments(date(2024, 6, 1), &policy).unwrap();
    assert_eq!(outcome.closed, 1);
    assert_eq!(outcome.still_open, 1);

    let settled = store.exception(1).unwrap().unwrap();
    assert_eq!(settled.exception_update_remarks.as_deref(), Some("Settled by bank transfer"));
    let other = store.exception(2).unwrap().unwrap();
    assert_eq!(other.exception_status, ExceptionStatus::Open);
    assert_eq!(other.exception_update_remarks.as_deref(), Some("Awaiting settlement"));
}
