//! exledger-runner: command-line driver for the exception ledger job.
//!
//! Usage:
//!   exledger-runner init    --db warehouse.db
//!   exledger-runner seed    --db warehouse.db --seed 42 --customers 500
//!   exledger-runner run     --db warehouse.db --run-date 2024-06-01
//!   exledger-runner convert legacy.bteq spark.sql

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use exledger_core::{
    bteq,
    config::JobConfig,
    pipeline::{Pipeline, RunSummary},
    sample::{SampleSpec, SampleWarehouse},
    store::WarehouseStore,
};
use std::path::PathBuf;

/// Exception ledger batch job
#[derive(Parser, Debug)]
#[command(name = "exledger-runner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or migrate the warehouse schema
    Init {
        #[arg(long, default_value = "warehouse.db")]
        db: String,
    },

    /// Run the job once
    Run {
        #[arg(long, default_value = "warehouse.db")]
        db: String,

        /// Business date of the run (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        run_date: Option<NaiveDate>,

        /// JSON job configuration (defaults to the standard predicates)
        #[arg(long, value_name = "FILE")]
        config: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a deterministic sample warehouse
    Seed {
        #[arg(long, default_value = "warehouse.db")]
        db: String,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 500)]
        customers: usize,

        /// Pre-aged ledger rows to create
        #[arg(long, default_value_t = 50)]
        stale: usize,

        /// Date the sample is generated as of (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        run_date: Option<NaiveDate>,
    },

    /// Convert a BTEQ script to Spark SQL
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Init { db } => {
            open_store(&db)?;
            println!("Schema ready in {db}");
        }
        Commands::Run {
            db,
            run_date,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => JobConfig::load(&path)?,
                None => JobConfig::standard(),
            };
            let store = open_store(&db)?;
            let run_date = run_date.unwrap_or_else(today);
            let summary = Pipeline::new(&store, config)
                .run(run_date)
                .with_context(|| format!("Run for {run_date} failed"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary, &store)?;
            }
        }
        Commands::Seed {
            db,
            seed,
            customers,
            stale,
            run_date,
        } => {
            let store = open_store(&db)?;
            let spec = SampleSpec {
                seed,
                customers,
                as_of: run_date.unwrap_or_else(today),
                stale_exceptions: stale,
            };
            let counts = SampleWarehouse::generate(&spec)
                .load_into(&store)
                .context("Failed to load sample warehouse")?;
            println!("=== SAMPLE LOADED ===");
            println!("  db:               {db}");
            println!("  seed:             {seed}");
            println!("  as of:            {}", spec.as_of);
            println!("  customers:        {}", counts.customers);
            println!("  accounts:         {}", counts.accounts);
            println!("  transactions:     {}", counts.transactions);
            println!("  payment dues:     {}", counts.dues);
            println!("  payment records:  {}", counts.payment_records);
            println!("  stale exceptions: {}", counts.stale_exceptions);
        }
        Commands::Convert { input, output } => {
            bteq::convert_file(&input, &output)
                .with_context(|| format!("Cannot convert {}", input.display()))?;
            println!("Conversion complete. Spark SQL saved to {}", output.display());
        }
    }
    Ok(())
}

fn open_store(db: &str) -> Result<WarehouseStore> {
    let store = WarehouseStore::open(db).with_context(|| format!("Cannot open {db}"))?;
    store.migrate().context("Schema migration failed")?;
    Ok(store)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_summary(summary: &RunSummary, store: &WarehouseStore) -> Result<()> {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:        {}", summary.run_id);
    println!("  run date:      {}", summary.run_date);
    for (source, staged) in &summary.staged {
        println!("  staged {:<17} {staged}", format!("{source}:"));
    }
    println!("  derived:       {}", summary.derivation.total());
    println!(
        "  id range:      {}..{}",
        summary.derivation.first_id, summary.derivation.next_id
    );
    println!("  archived:      {}", summary.archived);
    println!("  closed:        {}", summary.reconciliation.closed);
    println!("  still open:    {}", summary.reconciliation.still_open);

    println!();
    println!("=== LEDGER ===");
    println!("  rows:          {}", store.table_count("exception_records")?);
    println!("  open:          {}", store.open_exception_count()?);
    println!("  history rows:  {}", store.table_count("exception_records_hist")?);
    Ok(())
}
