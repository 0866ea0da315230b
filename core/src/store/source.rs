use super::WarehouseStore;
use crate::{
    error::LedgerResult,
    model::{CardTransaction, CustomerInfo, PaymentDue, PaymentRecord, SavingsAccount},
};
use rusqlite::params;

impl WarehouseStore {
    // ── Source feeds ──────────────────────────────────────────────
    // Upstream systems own these tables. The job only reads them;
    // these writers exist for seeding and tests.

    pub fn insert_customer(&self, c: &CustomerInfo) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO customer_info (customer_id, name, address, phone, email, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![c.customer_id, c.name, c.address, c.phone, c.email, c.status],
        )?;
        Ok(())
    }

    pub fn insert_savings_account(&self, a: &SavingsAccount) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO bank_savings_account (account_id, customer_id, balance, open_date, status, \"type\")
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![a.account_id, a.customer_id, a.balance, a.open_date, a.status, a.account_type],
        )?;
        Ok(())
    }

    pub fn insert_card_transaction(&self, t: &CardTransaction) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO credit_card_transactions (
                transaction_id, customer_id, card_number, transaction_date,
                amount, merchant, status, \"type\"
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                t.transaction_id,
                t.customer_id,
                t.card_number,
                t.transaction_date,
                t.amount,
                t.merchant,
                t.status,
                t.transaction_type,
            ],
        )?;
        Ok(())
    }

    pub fn insert_payment_due(&self, d: &PaymentDue) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO payment_due (due_id, customer_id, due_date, amount, payment_status, payment_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![d.due_id, d.customer_id, d.due_date, d.amount, d.payment_status, d.payment_type],
        )?;
        Ok(())
    }

    pub fn insert_payment_record(&self, p: &PaymentRecord) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO payment_records (due_id, payment_status) VALUES (?1, ?2)",
            params![p.due_id, p.payment_status],
        )?;
        Ok(())
    }
}
