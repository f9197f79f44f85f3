//! Storeroom CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! storeroom migrate
//!
//! # Seed the default groups and an admin account
//! storeroom seed
//!
//! # Create a user
//! storeroom user create -n "Pat Jones" -u pat -p secret -l 3
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed default groups, an admin account and sample stock
//! - `user create` - Create user accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storeroom")]
#[command(author, version, about = "Storeroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed default groups, an admin account and sample stock
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user account
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (hashed before storage)
        #[arg(short, long)]
        password: String,

        /// Permission level (1 = admin, 2 = special, 3 = user)
        #[arg(short, long, default_value_t = 3)]
        level: i64,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storeroom_cli=info,storeroom_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed => commands::seed::run().await,
        Commands::User {
            action:
                UserAction::Create {
                    name,
                    username,
                    password,
                    level,
                },
        } => commands::user::create(&name, &username, &password, level).await,
    };

    if let Err(err) = result {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}
