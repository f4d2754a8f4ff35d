//! Threadline CLI - migrations, catalog seeding and catalog browsing.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront and session-store migrations
//! threadline-cli migrate
//!
//! # Seed the catalog from a YAML document, or generate 50 demo products
//! threadline-cli seed --file catalog.yaml
//! threadline-cli seed --demo 50
//!
//! # Page through a running storefront's catalog
//! threadline-cli browse --tag 2 --tag 3
//!
//! # ...and price a shopper's cart against it
//! threadline-cli browse --email shopper@example.com --password hunter22
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "threadline-cli")]
#[command(author, version, about = "Threadline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert catalog tags and products
    Seed {
        /// YAML seed document; demo data is generated when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Number of demo products to generate
        #[arg(long, default_value_t = 30)]
        demo: usize,
    },
    /// Load the whole catalog from a running storefront
    Browse {
        /// API base URL (overrides `THREADLINE_API_URL`)
        #[arg(long)]
        api_url: Option<String>,

        /// Products per page (overrides `THREADLINE_PAGE_LIMIT`)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only list products carrying one of these tag ids
        #[arg(short, long = "tag")]
        tags: Vec<i64>,

        /// Log in and price this account's cart
        #[arg(short, long, requires = "password")]
        email: Option<String>,

        #[arg(short, long, requires = "email")]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threadline_cli=info,threadline_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file, demo } => commands::seed::run(file.as_deref(), demo).await,
        Commands::Browse {
            api_url,
            limit,
            tags,
            email,
            password,
        } => {
            let login = email.zip(password);
            commands::browse::run(commands::browse::BrowseOptions {
                api_url,
                limit,
                tags,
                login,
            })
            .await
        }
    }
}
