//! snmptrapd: receive SNMP traps and print them as JSON lines.

use clap::Parser;
use snmptrap_input::cli::Args;
use snmptrap_input::{JsonLinesSink, Supervisor};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.init_tracing();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let supervisor = match Supervisor::from_config(&config, JsonLinesSink::stdout()) {
        Ok(supervisor) => Arc::new(supervisor),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
            supervisor.stop();
        }
    });

    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
