//! Deterministic random number generation for sample warehouses.
//!
//! RULE: sample data never touches a platform RNG.
//! Each table is generated from its own stream, seeded from
//! (master_seed XOR stream_index). This means:
//!   - Adding a new stream never changes the rows of existing tables.
//!   - Each table's rows are reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for one generated table.
pub struct SampleRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SampleRng {
    pub fn new(master_seed: u64, stream: SampleStream) -> Self {
        let derived_seed = master_seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: stream.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let index = self.next_u64_below(items.len() as u64) as usize;
        &items[index]
    }

    /// Pick from `(value, weight)` pairs. Weights need not sum to 1.
    pub fn weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> &'a T {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (item, weight) in items {
            if roll < *weight {
                return item;
            }
            roll -= weight;
        }
        &items[items.len() - 1].0
    }

    /// Money amount in [min, max), rounded to cents.
    pub fn amount(&mut self, min: f64, max: f64) -> f64 {
        let raw = min + self.next_f64() * (max - min);
        (raw * 100.0).round() / 100.0
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SampleStream {
    Customer = 0,
    Account = 1,
    Transaction = 2,
    PaymentDue = 3,
    PaymentRecord = 4,
    Ledger = 5,
}

impl SampleStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Account => "account",
            Self::Transaction => "transaction",
            Self::PaymentDue => "payment_due",
            Self::PaymentRecord => "payment_record",
            Self::Ledger => "ledger",
        }
    }
}
