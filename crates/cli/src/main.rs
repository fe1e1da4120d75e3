mod cli;
mod logging;
mod metrics;
mod server;

use tracing::error;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    if let Err(e) = CliCommand::run_from_args().await {
        error!("Fatal error: {:#}", e);
        eprintln!("chapterbay error: {:#}", e);
        std::process::exit(1);
    }
}
