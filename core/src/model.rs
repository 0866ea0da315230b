//! Warehouse entities and the fixed vocabulary of the exception ledger.
//!
//! Source rows mirror the warehouse tables one-to-one. They are only
//! materialised in Rust by the sample generator and by tests; the job
//! itself moves them with set-based SQL.

use crate::{
    error::LedgerError,
    types::{EntityId, ExceptionId, RunDate},
};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Remark written when a linked payment shows as paid.
pub const CLOSED_REMARK: &str = "Payment received and exception closed";
/// Remark written when a linked payment exists but is not paid yet.
pub const PENDING_REMARK: &str = "Payment not yet received";
/// `payment_records.payment_status` value that closes an exception.
pub const PAID_STATUS: &str = "Paid";

// ── Sources ────────────────────────────────────────────────────────

/// The four warehouse tables that feed the ledger.
/// Order matters: derivation allocates ids in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Customer,
    SavingsAccount,
    CardTransaction,
    PaymentDue,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Customer,
        SourceKind::SavingsAccount,
        SourceKind::CardTransaction,
        SourceKind::PaymentDue,
    ];

    pub fn source_table(&self) -> &'static str {
        match self {
            Self::Customer => "customer_info",
            Self::SavingsAccount => "bank_savings_account",
            Self::CardTransaction => "credit_card_transactions",
            Self::PaymentDue => "payment_due",
        }
    }

    pub fn staging_table(&self) -> &'static str {
        match self {
            Self::Customer => "stg_customer_info",
            Self::SavingsAccount => "stg_bank_savings_account",
            Self::CardTransaction => "stg_credit_card_transactions",
            Self::PaymentDue => "stg_payment_due",
        }
    }

    /// Primary key of the source table. Breaks ties when numbering rows.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Customer => "customer_id",
            Self::SavingsAccount => "account_id",
            Self::CardTransaction => "transaction_id",
            Self::PaymentDue => "due_id",
        }
    }

    /// Every column a staging filter may reference.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Customer => &["customer_id", "name", "address", "phone", "email", "status"],
            Self::SavingsAccount => &[
                "account_id",
                "customer_id",
                "balance",
                "open_date",
                "status",
                "type",
            ],
            Self::CardTransaction => &[
                "transaction_id",
                "customer_id",
                "card_number",
                "transaction_date",
                "amount",
                "merchant",
                "status",
                "type",
            ],
            Self::PaymentDue => &[
                "due_id",
                "customer_id",
                "due_date",
                "amount",
                "payment_status",
                "payment_type",
            ],
        }
    }

    pub fn reason(&self) -> ExceptionReason {
        match self {
            Self::Customer => ExceptionReason::ActiveCustomer,
            Self::SavingsAccount => ExceptionReason::SavingsAccount,
            Self::CardTransaction => ExceptionReason::PurchaseTransaction,
            Self::PaymentDue => ExceptionReason::CreditCardPaymentDue,
        }
    }

    /// Only payment-due exceptions link back to a due and can reconcile.
    pub fn carries_due_id(&self) -> bool {
        matches!(self, Self::PaymentDue)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::SavingsAccount => "savings_account",
            Self::CardTransaction => "card_transaction",
            Self::PaymentDue => "payment_due",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Exception vocabulary ───────────────────────────────────────────

/// Fixed category string identifying which source raised an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionReason {
    ActiveCustomer,
    SavingsAccount,
    PurchaseTransaction,
    CreditCardPaymentDue,
}

impl ExceptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveCustomer => "Active customer under review",
            Self::SavingsAccount => "Savings account under review",
            Self::PurchaseTransaction => "Purchase transaction under review",
            Self::CreditCardPaymentDue => "Credit card payment due",
        }
    }

    /// Reverse lookup. Returns None for reasons written by other jobs.
    pub fn from_label(label: &str) -> Option<Self> {
        SourceKind::ALL
            .iter()
            .map(|s| s.reason())
            .find(|r| r.as_str() == label)
    }
}

impl fmt::Display for ExceptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger status. Open -> Closed is the only transition; Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionStatus {
    Open,
    Closed,
}

impl ExceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

impl FromStr for ExceptionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Closed" => Ok(Self::Closed),
            other => Err(LedgerError::InvalidStatus(other.to_string())),
        }
    }
}

impl ToSql for ExceptionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExceptionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: LedgerError| FromSqlError::Other(Box::new(e)))
    }
}

/// One row of `exception_records` / `exception_records_hist`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    pub exception_id: ExceptionId,
    pub due_id: Option<EntityId>,
    pub customer_id: EntityId,
    pub exception_date: RunDate,
    pub exception_reason: String,
    pub exception_status: ExceptionStatus,
    pub exception_update_date: Option<RunDate>,
    pub exception_update_remarks: Option<String>,
}

impl ExceptionRecord {
    /// A freshly raised exception as the deriver writes it.
    pub fn open(
        exception_id: ExceptionId,
        customer_id: impl Into<EntityId>,
        due_id: Option<EntityId>,
        reason: ExceptionReason,
        exception_date: RunDate,
    ) -> Self {
        Self {
            exception_id,
            due_id,
            customer_id: customer_id.into(),
            exception_date,
            exception_reason: reason.as_str().to_string(),
            exception_status: ExceptionStatus::Open,
            exception_update_date: None,
            exception_update_remarks: None,
        }
    }
}

// ── Source rows ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_id: EntityId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub status: String, // Active | Dormant | Closed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAccount {
    pub account_id: EntityId,
    pub customer_id: EntityId,
    pub balance: f64,
    pub open_date: RunDate,
    pub status: String,
    pub account_type: String, // Savings | Current | Fixed Deposit
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTransaction {
    pub transaction_id: EntityId,
    pub customer_id: EntityId,
    pub card_number: String,
    pub transaction_date: RunDate,
    pub amount: f64,
    pub merchant: String,
    pub status: String,
    pub transaction_type: String, // Purchase | Refund | Cash Advance
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDue {
    pub due_id: EntityId,
    pub customer_id: EntityId,
    pub due_date: RunDate,
    pub amount: f64,
    pub payment_status: String,
    pub payment_type: String, // Credit Card | Loan | Mortgage
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub due_id: EntityId,
    pub payment_status: String, // Paid | Pending | Failed
}
