use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod learning;
mod storage;

/// larder - household consumption tracker
/// Learns usage patterns from consumption history and suggests order quantities
#[derive(Parser)]
#[command(name = "larder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Household consumption tracker and learning engine", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize larder configuration and database
    Init,

    /// Record a consumption event for an item
    Add {
        /// Item name (e.g. "Milk")
        item: String,
        /// Quantity used
        quantity: f64,
        /// Unit of measure (e.g. liters, kg)
        unit: String,
        /// Date of consumption (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Quantity discarded unused
        #[arg(long)]
        waste: Option<f64>,
        /// Servings actually produced
        #[arg(long)]
        servings: Option<u32>,
        /// Meal plan this consumption belongs to
        #[arg(long)]
        meal_plan: Option<String>,
    },

    /// Learn the consumption pattern for one item
    Learn {
        /// Item name
        item: String,
    },

    /// Learn patterns for every item with enough history
    LearnAll,

    /// Show the stored pattern and recommendation for an item
    Pattern {
        /// Item name
        item: String,
    },

    /// Show the household-level consumption summary
    Summary,

    /// Show current status
    Status,

    /// Show detailed statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => {
            info!("Initializing larder");
            storage::init().await?;
        }
        Commands::Add {
            item,
            quantity,
            unit,
            date,
            waste,
            servings,
            meal_plan,
        } => {
            storage::add_record(&item, quantity, &unit, date, waste, servings, meal_plan).await?;
        }
        Commands::Learn { item } => {
            learning::learn_item(&item).await?;
        }
        Commands::LearnAll => {
            learning::learn_all().await?;
        }
        Commands::Pattern { item } => {
            learning::show_pattern(&item).await?;
        }
        Commands::Summary => {
            learning::show_summary().await?;
        }
        Commands::Status => {
            storage::show_status().await?;
        }
        Commands::Stats => {
            storage::show_stats().await?;
        }
    }

    Ok(())
}
