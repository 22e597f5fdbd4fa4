//! Punchcard CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! punchcard-cli migrate
//!
//! # Hash a staff password for ADMIN_PASSWORD_HASH
//! punchcard-cli admin hash-password
//!
//! # Seed demo customer accounts
//! punchcard-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin hash-password` - Produce an Argon2 hash for staff credentials
//! - `seed` - Seed the database with demo accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "punchcard-cli")]
#[command(author, version, about = "Punchcard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff credentials
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo customer accounts
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash a password for the ADMIN_PASSWORD_HASH environment variable
    HashPassword {
        /// The password to hash (prompted for on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                commands::admin::hash_password(password.as_deref())?;
            }
        },
        Commands::Seed => commands::seed::demo_accounts().await?,
    }
    Ok(())
}
