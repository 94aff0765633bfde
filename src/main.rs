//! Etiquetar CLI
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! etiquetar train config.yml
//!
//! # Train with overrides
//! etiquetar train config.yml --epochs 10 --lr 0.001
//!
//! # Validate config
//! etiquetar validate config.yml
//!
//! # Show the effective config
//! etiquetar info config.yml
//! ```

use clap::Parser;
use etiquetar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
