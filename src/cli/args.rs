//! CLI argument definitions using clap
//!
//! Commands:
//! - aerorepo find-all   --dataset <path> --collection <name> --query <path>
//! - aerorepo find-page  --dataset <path> --collection <name> --query <path> --page <n> --size <n>
//! - aerorepo find-slice --dataset <path> --collection <name> --query <path> --page <n> --size <n>
//! - aerorepo find-one   --dataset <path> --collection <name> --query <path> [--lock <mode>]
//! - aerorepo count      --dataset <path> --collection <name>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::backend::LockMode;

/// aerorepo - deterministic repository queries over a JSON dataset
#[derive(Parser, Debug)]
#[command(name = "aerorepo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct Source {
    /// Path to the dataset file (schemas + records)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Collection to query
    #[arg(long)]
    pub collection: String,

    /// Path to an engine configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Page selection
#[derive(Args, Debug, Clone, Copy)]
pub struct Paging {
    /// Zero-based page index
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub page: i64,

    /// Page size; defaults to the configured default page size
    #[arg(long, allow_negative_numbers = true)]
    pub size: Option<i64>,
}

/// Lock mode accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockArg {
    #[default]
    None,
    PessimisticRead,
    PessimisticWrite,
}

impl From<LockArg> for LockMode {
    fn from(arg: LockArg) -> Self {
        match arg {
            LockArg::None => LockMode::None,
            LockArg::PessimisticRead => LockMode::PessimisticRead,
            LockArg::PessimisticWrite => LockMode::PessimisticWrite,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Every matching record (or projection view)
    FindAll {
        #[command(flatten)]
        source: Source,

        /// Path to the query file
        #[arg(long)]
        query: PathBuf,
    },

    /// One page with total count
    FindPage {
        #[command(flatten)]
        source: Source,

        /// Path to the query file
        #[arg(long)]
        query: PathBuf,

        #[command(flatten)]
        paging: Paging,
    },

    /// One page with a has-next flag only
    FindSlice {
        #[command(flatten)]
        source: Source,

        /// Path to the query file
        #[arg(long)]
        query: PathBuf,

        #[command(flatten)]
        paging: Paging,
    },

    /// Exactly one matching record
    FindOne {
        #[command(flatten)]
        source: Source,

        /// Path to the query file
        #[arg(long)]
        query: PathBuf,

        /// Lock mode forwarded to the backend
        #[arg(long, value_enum, default_value_t = LockArg::None)]
        lock: LockArg,
    },

    /// Number of records in the collection
    Count {
        #[command(flatten)]
        source: Source,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
