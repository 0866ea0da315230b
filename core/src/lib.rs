//! exledger-core: the exception ledger batch job.
//!
//! Stages four source tables, derives exception rows into the ledger,
//! archives stale rows to history and reconciles open exceptions against
//! incoming payment records. See `pipeline` for the execution order.

pub mod bteq;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod repository;
pub mod rng;
pub mod sample;
pub mod store;
pub mod types;
