//! Clarity Pixel CLI - Migrations and store settings tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! clarity-cli migrate
//!
//! # Inspect or edit a shop's settings
//! clarity-cli store show --shop demo.myshopify.com
//! clarity-cli store set --shop demo.myshopify.com --tracking-id k2x9abc1de
//! clarity-cli store toggle --shop demo.myshopify.com --event addToCart
//!
//! # Print the custom pixel code
//! clarity-cli snippet --tracking-id k2x9abc1de
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `store` - Show, set, or toggle a shop's stored settings
//! - `snippet` - Generate custom pixel code

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::store::TrackingIdChange;

#[derive(Parser)]
#[command(name = "clarity-cli")]
#[command(author, version, about = "Clarity Pixel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage a shop's stored settings
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Print custom pixel code
    Snippet {
        /// Clarity ID to embed (omit for the placeholder)
        #[arg(short, long)]
        tracking_id: Option<String>,

        /// One subscription per event instead of checkout only
        #[arg(long)]
        all_events: bool,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Show stored settings
    Show {
        /// Shop domain (`*.myshopify.com`)
        #[arg(short, long)]
        shop: String,
    },
    /// Set or clear the Clarity ID
    Set {
        /// Shop domain (`*.myshopify.com`)
        #[arg(short, long)]
        shop: String,

        /// New Clarity ID
        #[arg(short, long, conflicts_with = "clear")]
        tracking_id: Option<String>,

        /// Remove the Clarity ID
        #[arg(long)]
        clear: bool,
    },
    /// Flip one tracked event
    Toggle {
        /// Shop domain (`*.myshopify.com`)
        #[arg(short, long)]
        shop: String,

        /// Event key (`viewCategory`, `viewItem`, `search`, `addToCart`, `beginCheckout`, `purchase`)
        #[arg(short, long)]
        event: String,
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
        Commands::Store { action } => match action {
            StoreAction::Show { shop } => commands::store::show(&shop).await?,
            StoreAction::Set {
                shop,
                tracking_id,
                clear,
            } => {
                commands::store::set(&shop, TrackingIdChange::from_flags(tracking_id, clear))
                    .await?;
            }
            StoreAction::Toggle { shop, event } => {
                commands::store::toggle(&shop, &event).await?;
            }
        },
        Commands::Snippet {
            tracking_id,
            all_events,
        } => commands::snippet::print(tracking_id.as_deref(), all_events)?,
    }
    Ok(())
}
