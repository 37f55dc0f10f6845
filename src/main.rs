//! Credential Gate - signed, revocable bearer credentials for HTTP services

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use credential_gate::{
    auth::KeyMaterial,
    cli::{Cli, Command},
    config::Config,
    gateway::Server,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match cli.command {
        Some(Command::CheckKeys) => check_keys(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config, ExitCode> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}

/// Validate the key pair without starting the server
fn check_keys(config: &Config) -> ExitCode {
    match KeyMaterial::from_pem_files(&config.auth.private_key_path, &config.auth.public_key_path) {
        Ok(_) => {
            println!(
                "✅ Key pair OK: {} / {}",
                config.auth.private_key_path.display(),
                config.auth.public_key_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Key pair rejected: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the server
async fn run_server(config: Config) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        users = config.auth.users.len(),
        "Starting credential gate"
    );

    let server = match Server::new(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
