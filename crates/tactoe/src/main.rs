//! CLI entry point for the tic-tac-toe game server.

use std::process::ExitCode;

use clap::Parser;

use tactoe::{install_signal_handlers, Server, ServerError, DEFAULT_CLIENT_CAPACITY};

/// A tic-tac-toe game server speaking the tactoe wire protocol over TCP.
#[derive(Parser, Debug)]
#[command(name = "tactoe", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short = 'p', long = "port")]
    port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli.port) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

fn run(port: u16) -> Result<(), ServerError> {
    let server = Server::bind(&format!("0.0.0.0:{port}"), DEFAULT_CLIENT_CAPACITY)?;
    install_signal_handlers(server.clients()).map_err(ServerError::Signal)?;
    server.run()
}
