use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_check;
mod cmd_info;
mod util;

fn init_logger() {
    // RUST_LOG=debug покажет отчёты статус-канала и чтения записей
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();
    if let Err(e) = run() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Check {
            backend,
            opts,
            words,
            words_file,
            trace,
            json,
        } => cmd_check::exec(backend, opts, words, words_file, trace, json),

        cli::Cmd::Info {
            backend,
            opts,
            words,
            scan,
            json,
        } => cmd_info::exec(backend, opts, words, scan, json),
    }
}
