use crate::{
    error::{LedgerError, LedgerResult},
    model::{SourceKind, CLOSED_REMARK, PAID_STATUS, PENDING_REMARK},
};
use serde::{Deserialize, Serialize};

/// A single `column = value` condition of a staging predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub column: String,
    pub equals: String,
}

/// Equality predicate selecting which source rows get staged.
/// Conditions are ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingFilter {
    pub conditions: Vec<FieldMatch>,
}

impl StagingFilter {
    pub fn equals(column: &str, value: &str) -> Self {
        Self {
            conditions: vec![FieldMatch {
                column: column.into(),
                equals: value.into(),
            }],
        }
    }

    pub fn and(mut self, column: &str, value: &str) -> Self {
        self.conditions.push(FieldMatch {
            column: column.into(),
            equals: value.into(),
        });
        self
    }

    /// Render the predicate as SQL with positional parameters `?1..?n`.
    ///
    /// Column names are checked against the source's column list, since
    /// identifiers cannot be bound. Values are returned by [`Self::values`]
    /// in the same order.
    pub fn where_clause(&self, source: SourceKind) -> LedgerResult<String> {
        if self.conditions.is_empty() {
            return Err(LedgerError::EmptyFilter {
                table: source.source_table(),
            });
        }
        let allowed = source.columns();
        let mut parts = Vec::with_capacity(self.conditions.len());
        for (i, cond) in self.conditions.iter().enumerate() {
            if !allowed.contains(&cond.column.as_str()) {
                return Err(LedgerError::UnknownColumn {
                    table: source.source_table(),
                    column: cond.column.clone(),
                });
            }
            parts.push(format!("\"{}\" = ?{}", cond.column, i + 1));
        }
        Ok(parts.join(" AND "))
    }

    pub fn values(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.equals.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    pub customer: StagingFilter,
    pub savings_account: StagingFilter,
    pub card_transaction: StagingFilter,
    pub payment_due: StagingFilter,
}

impl StagingConfig {
    pub fn filter_for(&self, source: SourceKind) -> &StagingFilter {
        match source {
            SourceKind::Customer => &self.customer,
            SourceKind::SavingsAccount => &self.savings_account,
            SourceKind::CardTransaction => &self.card_transaction,
            SourceKind::PaymentDue => &self.payment_due,
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            customer: StagingFilter::equals("status", "Active"),
            savings_account: StagingFilter::equals("type", "Savings"),
            card_transaction: StagingFilter::equals("type", "Purchase"),
            payment_due: StagingFilter::equals("payment_type", "Credit Card"),
        }
    }
}

/// How a linked payment record moves an open exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// `payment_records.payment_status` value that closes the exception.
    pub paid_status: String,
    pub closed_remark: String,
    pub pending_remark: String,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            paid_status: PAID_STATUS.into(),
            closed_remark: CLOSED_REMARK.into(),
            pending_remark: PENDING_REMARK.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub reconciliation: ReconcilePolicy,
}

impl JobConfig {
    /// The production predicates and remarks.
    pub fn standard() -> Self {
        Self {
            staging: StagingConfig::default(),
            reconciliation: ReconcilePolicy::default(),
        }
    }

    /// Load from a JSON file. Missing sections fall back to `standard()`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: JobConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject filters that would fail at staging time.
    pub fn validate(&self) -> LedgerResult<()> {
        for source in SourceKind::ALL {
            self.staging.filter_for(source).where_clause(source)?;
        }
        Ok(())
    }
}
