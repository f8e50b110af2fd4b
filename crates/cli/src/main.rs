//! Tableside CLI - Inspect and edit session carts from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the storage key a session resolves to
//! tableside key --customer "Jane Doe"
//!
//! # Add two spring rolls with extra sauce to table 5
//! tableside cart add --table 5 --item A --name "Spring rolls" --price 6.50 --qty 2 --add-on sauce=0.50
//!
//! # Show table 5's cart
//! tableside cart show --table 5
//!
//! # Apply a promotion code
//! tableside discount apply --table 5 SAVE10
//! ```
//!
//! # Commands
//!
//! - `key` - Print the resolved storage key
//! - `cart` - Show, add, remove, re-quantify or clear cart lines
//! - `discount` - Apply or remove a discount code

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{CartAction, CommandError, DiscountAction, SessionArgs};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "tableside")]
#[command(author, version, about = "Tableside session cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the storage key a session resolves to
    Key {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Manage a session's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage a session's discount code
    Discount {
        #[command(subcommand)]
        action: DiscountAction,
    },
}

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so command output stays pipeable
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tableside_cli=info,tableside_cart=warn".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Key { session } => commands::print_key(&session),
        Commands::Cart { action } => {
            let config = CliConfig::from_env()?;
            commands::cart::run(&config, action).await?;
        }
        Commands::Discount { action } => {
            let config = CliConfig::from_env()?;
            commands::discount::run(&config, action).await?;
        }
    }
    Ok(())
}
