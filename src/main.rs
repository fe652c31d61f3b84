#![allow(dead_code)]
#[macro_use]
mod errors;
mod cli;
mod record;
mod storage;

use std::fs::OpenOptions;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pagedb", version = VERSION, about = "Embedded B+-tree row store.")]
struct Cli {
    /// Path to the table's single backing file. Created if it doesn't exist.
    filename: String,
}

fn main() -> ExitCode {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("pagedb.log")
        .expect("Failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut engine = match storage::Engine::open(&cli.filename) {
        Ok(engine) => engine,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = cli::repl::run(&mut engine);
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(code as u8)
    }
}
