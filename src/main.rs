//! Tessera CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use tessera::cli::args::TesseraArgs;
use tessera::cli::commands::execute_command;

fn main() {
    let args = TesseraArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // -q
        1 => LevelFilter::Warn,  // ref count misuse
        2 => LevelFilter::Info,  // slow reopens
        3 => LevelFilter::Debug, // reuse stats, generation releases
        _ => LevelFilter::Trace,
    };

    // RUST_LOG, when set, refines the level chosen on the command line.
    Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
