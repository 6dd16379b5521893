//! # Regi Terminal Entry Point
//!
//! The actual setup is in lib.rs so it can be tested.

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let args = regi_terminal::Args::parse();

    match regi_terminal::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("regi-terminal: {}", e);
            ExitCode::FAILURE
        }
    }
}
