//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use exledger_core::{
    model::{
        CardTransaction, CustomerInfo, ExceptionReason, ExceptionRecord, PaymentDue,
        PaymentRecord, SavingsAccount,
    },
    store::WarehouseStore,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh, migrated in-memory warehouse.
pub fn store() -> WarehouseStore {
    init_logging();
    let store = WarehouseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn customer(store: &WarehouseStore, id: &str, status: &str) {
    store
        .insert_customer(&CustomerInfo {
            customer_id: id.into(),
            name: format!("Customer {id}"),
            address: "1 High Street".into(),
            phone: "07000000000".into(),
            email: format!("{}@example.com", id.to_lowercase()),
            status: status.into(),
        })
        .expect("insert customer");
}

pub fn account(store: &WarehouseStore, id: &str, customer_id: &str, account_type: &str) {
    store
        .insert_savings_account(&SavingsAccount {
            account_id: id.into(),
            customer_id: customer_id.into(),
            balance: 1_250.00,
            open_date: date(2020, 1, 1),
            status: "Active".into(),
            account_type: account_type.into(),
        })
        .expect("insert account");
}

pub fn transaction(store: &WarehouseStore, id: &str, customer_id: &str, transaction_type: &str) {
    store
        .insert_card_transaction(&CardTransaction {
            transaction_id: id.into(),
            customer_id: customer_id.into(),
            card_number: "4111-XXXX-XXXX-0001".into(),
            transaction_date: date(2024, 5, 30),
            amount: 42.50,
            merchant: "Book Nook".into(),
            status: "Posted".into(),
            transaction_type: transaction_type.into(),
        })
        .expect("insert transaction");
}

pub fn due(store: &WarehouseStore, id: &str, customer_id: &str, payment_type: &str) {
    store
        .insert_payment_due(&PaymentDue {
            due_id: id.into(),
            customer_id: customer_id.into(),
            due_date: date(2024, 6, 15),
            amount: 310.00,
            payment_status: "Due".into(),
            payment_type: payment_type.into(),
        })
        .expect("insert due");
}

pub fn payment(store: &WarehouseStore, due_id: &str, status: &str) {
    store
        .insert_payment_record(&PaymentRecord {
            due_id: due_id.into(),
            payment_status: status.into(),
        })
        .expect("insert payment record");
}

/// Insert an Open ledger row directly, bypassing derivation.
pub fn open_exception(
    store: &WarehouseStore,
    id: i64,
    customer_id: &str,
    due_id: Option<&str>,
    on: NaiveDate,
) -> ExceptionRecord {
    let reason = if due_id.is_some() {
        ExceptionReason::CreditCardPaymentDue
    } else {
        ExceptionReason::ActiveCustomer
    };
    let ex = ExceptionRecord::open(id, customer_id, due_id.map(str::to_string), reason, on);
    store.insert_exception(&ex).expect("insert exception");
    ex
}
