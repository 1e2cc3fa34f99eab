//! Harvest Control - CLI client for the Harvest daemon

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::ApiClient;
use harvest_core::models::UserId;

#[derive(Parser)]
#[command(name = "harvestctl")]
#[command(about = "Harvest - idle farming game client", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon address (overrides $HARVESTD_URL and the default)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new player
    Register { username: String, password: String },

    /// Log in and show the player profile
    Login { username: String, password: String },

    /// Collect one yield of a product
    Collect { user_id: i64, product: String },

    /// Sell part of a resource balance
    Sell {
        user_id: i64,
        product: String,
        quantity: i64,
    },

    /// Sell every held resource
    SellAll { user_id: i64 },

    /// Upgrade a product's production level
    Upgrade { user_id: i64, product: String },

    /// List resource balances
    Resources { user_id: i64 },

    /// Show the achievement catalog with progress
    Achievements { user_id: i64 },

    /// Re-evaluate all achievements
    Evaluate { user_id: i64 },

    /// Show the leaderboard
    Ranking {
        /// Number of entries
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Ping the daemon
    Health,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let server = cli
        .server
        .or_else(|| std::env::var("HARVESTD_URL").ok())
        .unwrap_or_else(|| client::DEFAULT_SERVER.to_string());
    let api = ApiClient::new(server)?;

    match cli.command {
        Commands::Register { username, password } => {
            commands::register(&api.register(&username, &password)?);
        }
        Commands::Login { username, password } => {
            commands::login(&api.login(&username, &password)?);
        }
        Commands::Collect { user_id, product } => {
            commands::collect(&api.collect(UserId(user_id), &product)?);
        }
        Commands::Sell {
            user_id,
            product,
            quantity,
        } => {
            commands::sell(&api.sell(UserId(user_id), &product, quantity)?);
        }
        Commands::SellAll { user_id } => {
            commands::sell_all(&api.sell_all(UserId(user_id))?);
        }
        Commands::Upgrade { user_id, product } => {
            commands::upgrade(&api.upgrade(UserId(user_id), &product)?);
        }
        Commands::Resources { user_id } => {
            commands::resources(&api.resources(UserId(user_id))?);
        }
        Commands::Achievements { user_id } => {
            commands::achievements(&api.achievements(UserId(user_id))?);
        }
        Commands::Evaluate { user_id } => {
            commands::evaluate(&api.evaluate(UserId(user_id))?);
        }
        Commands::Ranking { limit } => {
            commands::ranking(&api.ranking(limit)?);
        }
        Commands::Health => {
            commands::health(&api.health()?);
        }
    }

    Ok(())
}
