// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyfold - a split-key credential vault.
//!
//! Binary entry point: `serve` runs the vault server, the remaining
//! subcommands form the CLI client.

use clap::{Parser, Subcommand};

mod client;
mod creds;
mod serve;

/// Keyfold - a split-key credential vault.
#[derive(Parser, Debug)]
#[command(name = "keyfold", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the vault server.
    Serve,
    /// Create an account and store the device credentials.
    Signup,
    /// Refresh the session token using the memorized code.
    Login,
    /// Encrypt and store a secret.
    SetSecret {
        /// Name of the secret, unique per account.
        name: String,
    },
    /// Retrieve and decrypt a secret.
    GetSecret {
        /// Name of the secret.
        name: String,
    },
    /// List stored secret names.
    ListSecrets,
    /// Show the locally cached identity.
    Whoami,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let config = match keyfold_config::load_and_validate() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("keyfold: {err}");
            std::process::exit(1);
        }
    };

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Serve => serve::run(config).await.map_err(Into::into),
        Commands::Signup => client::signup(&config).await.map_err(Into::into),
        Commands::Login => client::login(&config).await.map_err(Into::into),
        Commands::SetSecret { name } => client::set_secret(&config, &name).await.map_err(Into::into),
        Commands::GetSecret { name } => client::get_secret(&config, &name).await.map_err(Into::into),
        Commands::ListSecrets => client::list_secrets(&config).await.map_err(Into::into),
        Commands::Whoami => client::whoami().map_err(Into::into),
    };

    if let Err(err) = result {
        eprintln!("keyfold: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyfold=info")),
        )
        .with_target(false)
        .init();
}
