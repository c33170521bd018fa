//! Sand CLI
//!
//! Command-line interface for Sand documents.

use std::process;

fn main() {
    let matches = sand_cli::build_cli().get_matches();
    sand_cli::init_tracing(matches.get_flag("verbose"));

    match sand_cli::run(&matches) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
