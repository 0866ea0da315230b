//! Deterministic sample warehouse.
//!
//! Produces a plausible mix of source rows (most of which do not meet the
//! staging predicates) plus optional pre-aged ledger rows, so the job can
//! be exercised end to end. Same seed, same warehouse.

use crate::{
    error::LedgerResult,
    model::{
        CardTransaction, CustomerInfo, ExceptionRecord, ExceptionStatus, PaymentDue,
        PaymentRecord, SavingsAccount, SourceKind,
    },
    rng::{SampleRng, SampleStream},
    store::WarehouseStore,
    types::RunDate,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

const FIRST_NAMES: &[&str] = &[
    "Amara", "Bilal", "Chloe", "Dmitri", "Esi", "Farah", "Gareth", "Hana", "Idris", "Joanna",
    "Kwame", "Leila", "Mateo", "Nadia", "Owen", "Priya", "Quentin", "Rosa", "Soren", "Tamsin",
];

const LAST_NAMES: &[&str] = &[
    "Achebe", "Brennan", "Castillo", "Dunmore", "Eriksen", "Fairfax", "Gupta", "Hollis",
    "Ibrahim", "Jansen", "Kowalski", "Lindqvist", "Mensah", "Novak", "Okafor", "Pereira",
];

const STREETS: &[&str] = &[
    "High Street", "Station Road", "Church Lane", "Mill Road", "Park Avenue", "Queens Road",
];

const MERCHANTS: &[&str] = &[
    "Grocer & Co", "Rail Tickets", "City Fuel", "Book Nook", "Electro Mart", "Cafe Verde",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSpec {
    pub seed: u64,
    pub customers: usize,
    /// Business date the sample is generated "as of".
    pub as_of: RunDate,
    /// Ledger rows dated before `as_of`, to exercise archival.
    pub stale_exceptions: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    pub customers: usize,
    pub accounts: usize,
    pub transactions: usize,
    pub dues: usize,
    pub payment_records: usize,
    pub stale_exceptions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleWarehouse {
    pub customers: Vec<CustomerInfo>,
    pub accounts: Vec<SavingsAccount>,
    pub transactions: Vec<CardTransaction>,
    pub dues: Vec<PaymentDue>,
    pub payment_records: Vec<PaymentRecord>,
    pub stale_exceptions: Vec<ExceptionRecord>,
}

impl SampleWarehouse {
    pub fn generate(spec: &SampleSpec) -> Self {
        let mut cust_rng = SampleRng::new(spec.seed, SampleStream::Customer);
        let mut acct_rng = SampleRng::new(spec.seed, SampleStream::Account);
        let mut txn_rng = SampleRng::new(spec.seed, SampleStream::Transaction);
        let mut due_rng = SampleRng::new(spec.seed, SampleStream::PaymentDue);
        let mut pay_rng = SampleRng::new(spec.seed, SampleStream::PaymentRecord);

        let mut warehouse = Self {
            customers: Vec::with_capacity(spec.customers),
            accounts: Vec::new(),
            transactions: Vec::new(),
            dues: Vec::new(),
            payment_records: Vec::new(),
            stale_exceptions: Vec::new(),
        };

        for i in 1..=spec.customers {
            let customer = Self::customer(i, &mut cust_rng);
            let customer_id = customer.customer_id.clone();
            warehouse.customers.push(customer);

            for n in 1..=(1 + acct_rng.next_u64_below(2)) {
                warehouse.accounts.push(SavingsAccount {
                    account_id: format!("A{i:05}-{n}"),
                    customer_id: customer_id.clone(),
                    balance: acct_rng.amount(0.0, 25_000.0),
                    open_date: spec.as_of - Duration::days(30 + acct_rng.next_u64_below(3_000) as i64),
                    status: acct_rng.weighted(&[("Active", 0.85), ("Frozen", 0.15)]).to_string(),
                    account_type: acct_rng
                        .weighted(&[("Savings", 0.5), ("Current", 0.35), ("Fixed Deposit", 0.15)])
                        .to_string(),
                });
            }

            for n in 1..=txn_rng.next_u64_below(4) {
                warehouse.transactions.push(CardTransaction {
                    transaction_id: format!("T{i:05}-{n}"),
                    customer_id: customer_id.clone(),
                    card_number: format!("4111-XXXX-XXXX-{:04}", txn_rng.next_u64_below(10_000)),
                    transaction_date: spec.as_of - Duration::days(txn_rng.next_u64_below(30) as i64),
                    amount: txn_rng.amount(2.0, 900.0),
                    merchant: txn_rng.pick(MERCHANTS).to_string(),
                    status: txn_rng.weighted(&[("Posted", 0.8), ("Declined", 0.2)]).to_string(),
                    transaction_type: txn_rng
                        .weighted(&[("Purchase", 0.6), ("Refund", 0.25), ("Cash Advance", 0.15)])
                        .to_string(),
                });
            }

            for n in 1..=due_rng.next_u64_below(3) {
                let due_id = format!("D{i:05}-{n}");
                warehouse.dues.push(PaymentDue {
                    due_id: due_id.clone(),
                    customer_id: customer_id.clone(),
                    due_date: spec.as_of + Duration::days(due_rng.next_u64_below(28) as i64),
                    amount: due_rng.amount(25.0, 2_500.0),
                    payment_status: due_rng.weighted(&[("Due", 0.7), ("Overdue", 0.3)]).to_string(),
                    payment_type: due_rng
                        .weighted(&[("Credit Card", 0.5), ("Loan", 0.3), ("Mortgage", 0.2)])
                        .to_string(),
                });
                if pay_rng.chance(0.6) {
                    warehouse.payment_records.push(PaymentRecord {
                        due_id,
                        payment_status: pay_rng
                            .weighted(&[("Paid", 0.5), ("Pending", 0.3), ("Failed", 0.2)])
                            .to_string(),
                    });
                }
            }
        }

        warehouse.stale_exceptions = Self::stale_exceptions(spec, &warehouse.customers, &warehouse.dues);
        warehouse
    }

    /// Insert every generated row in one transaction.
    pub fn load_into(&self, store: &WarehouseStore) -> LedgerResult<SampleCounts> {
        store.in_transaction(|store| {
            for c in &self.customers {
                store.insert_customer(c)?;
            }
            for a in &self.accounts {
                store.insert_savings_account(a)?;
            }
            for t in &self.transactions {
                store.insert_card_transaction(t)?;
            }
            for d in &self.dues {
                store.insert_payment_due(d)?;
            }
            for p in &self.payment_records {
                store.insert_payment_record(p)?;
            }
            for ex in &self.stale_exceptions {
                store.insert_exception(ex)?;
            }
            Ok(self.counts())
        })
    }

    pub fn counts(&self) -> SampleCounts {
        SampleCounts {
            customers: self.customers.len(),
            accounts: self.accounts.len(),
            transactions: self.transactions.len(),
            dues: self.dues.len(),
            payment_records: self.payment_records.len(),
            stale_exceptions: self.stale_exceptions.len(),
        }
    }

    fn customer(i: usize, rng: &mut SampleRng) -> CustomerInfo {
        let first = *rng.pick(FIRST_NAMES);
        let last = *rng.pick(LAST_NAMES);
        CustomerInfo {
            customer_id: format!("C{i:05}"),
            name: format!("{first} {last}"),
            address: format!("{} {}", 1 + rng.next_u64_below(250), rng.pick(STREETS)),
            phone: format!("07{:09}", rng.next_u64_below(1_000_000_000)),
            email: format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i),
            status: rng
                .weighted(&[("Active", 0.7), ("Dormant", 0.2), ("Closed", 0.1)])
                .to_string(),
        }
    }

    /// Open exceptions left by earlier runs, dated 1..=30 days before `as_of`.
    fn stale_exceptions(
        spec: &SampleSpec,
        customers: &[CustomerInfo],
        dues: &[PaymentDue],
    ) -> Vec<ExceptionRecord> {
        if customers.is_empty() {
            return Vec::new();
        }
        let mut rng = SampleRng::new(spec.seed, SampleStream::Ledger);
        (1..=spec.stale_exceptions)
            .map(|id| {
                let date = spec.as_of - Duration::days(1 + rng.next_u64_below(30) as i64);
                let linked_due = if !dues.is_empty() && rng.chance(0.4) {
                    Some(rng.pick(dues))
                } else {
                    None
                };
                match linked_due {
                    Some(due) => ExceptionRecord::open(
                        id as i64,
                        due.customer_id.clone(),
                        Some(due.due_id.clone()),
                        SourceKind::PaymentDue.reason(),
                        date,
                    ),
                    None => {
                        let source = *rng.pick(&SourceKind::ALL[..3]);
                        let mut ex = ExceptionRecord::open(
                            id as i64,
                            rng.pick(customers).customer_id.clone(),
                            None,
                            source.reason(),
                            date,
                        );
                        if rng.chance(0.1) {
                            ex.exception_status = ExceptionStatus::Closed;
                            ex.exception_update_date = Some(date);
                            ex.exception_update_remarks = Some("Closed manually".into());
                        }
                        ex
                    }
                }
            })
            .collect()
    }
}
