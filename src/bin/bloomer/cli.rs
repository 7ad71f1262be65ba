use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Spell-check against a Bloom filter kept on a record store
#[derive(Parser, Debug)]
#[command(name = "bloomer", version, about = "Bloom filter spell-check CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Где лежит фильтр: локальный файл или драйв за TCP-мостом.
#[derive(Args, Debug, Clone)]
pub struct Backend {
    /// Filter file (raw bit array, record n at offset n*R)
    #[arg(long, conflicts_with_all = ["drive", "data"])]
    pub filter: Option<PathBuf>,

    /// Drive bridge command-channel address (host:port)
    #[arg(long, requires = "data")]
    pub drive: Option<String>,

    /// Drive bridge data-channel address (host:port)
    #[arg(long, requires = "drive")]
    pub data: Option<String>,

    /// Filter file name on the drive
    #[arg(long, default_value = "BLOOM.DAT")]
    pub name: String,

    /// Data channel number on the drive
    #[arg(long, default_value_t = 2)]
    pub channel: u8,
}

impl Backend {
    pub fn is_set(&self) -> bool {
        self.filter.is_some() || self.drive.is_some()
    }
}

/// Переопределения BLOOMER_* (флаги сильнее env).
#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    /// Filter size in bits (M)
    #[arg(long)]
    pub bits: Option<u64>,

    /// Number of hash functions (K, 1..=5)
    #[arg(long)]
    pub hashes: Option<usize>,

    /// Record size in bytes (R)
    #[arg(long)]
    pub record_size: Option<usize>,

    /// Probe order: desc | asc | none
    #[arg(long)]
    pub order: Option<String>,

    /// Transport retries per record read
    #[arg(long)]
    pub retries: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Check words against the filter
    ///
    /// Пример:
    ///   bloomer check --filter ./BLOOM.DAT cat dog
    ///   bloomer check --drive 127.0.0.1:6400 --data 127.0.0.1:6401 --words-file - --json
    Check {
        #[command(flatten)]
        backend: Backend,
        #[command(flatten)]
        opts: FilterOpts,
        /// Words to check
        words: Vec<String>,
        /// Read words from a file ("-" = stdin), whitespace separated
        #[arg(long)]
        words_file: Option<PathBuf>,
        /// Show probe coordinates (record/byte/bit) for each word
        #[arg(long, default_value_t = false)]
        trace: bool,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print filter parameters, geometry and false-positive estimates
    Info {
        #[command(flatten)]
        backend: Backend,
        #[command(flatten)]
        opts: FilterOpts,
        /// Dictionary size for the theoretical estimates
        #[arg(long)]
        words: Option<u64>,
        /// Read every record and count set bits (needs --filter or --drive)
        #[arg(long, default_value_t = false)]
        scan: bool,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
