//! Billbook Desk entry point.
//!
//! ```bash
//! billbook-desk                       # config from $BILLBOOK_CONFIG or platform dir
//! billbook-desk --config ./shop.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billbook Desk");
                println!();
                println!("Reads one JSON command per line on stdin, replies on stdout.");
                println!();
                println!("Usage: billbook-desk [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: $BILLBOOK_CONFIG or platform dir)");
                println!("  -h, --help           Show this help message");
                return ExitCode::SUCCESS;
            }
            _ => {}
        }
        i += 1;
    }

    match billbook_desk::run(config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("billbook-desk: {}", e);
            ExitCode::FAILURE
        }
    }
}
