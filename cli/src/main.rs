mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_entry, cmd_food, cmd_remove_foods, cmd_remove_record, cmd_show_foods, cmd_show_record,
};
use crate::config::Config;
use nosh_core::db::Database;

#[derive(Parser)]
#[command(
    name = "nosh",
    version,
    about = "Keep track of calories consumed each day",
    long_about = "\n\n  ███╗   ██╗ ██████╗ ███████╗██╗  ██╗
  ████╗  ██║██╔═══██╗██╔════╝██║  ██║
  ██╔██╗ ██║██║   ██║███████╗███████║
  ██║╚██╗██║██║   ██║╚════██║██╔══██║
  ██║ ╚████║╚██████╔╝███████║██║  ██║
  ╚═╝  ╚═══╝ ╚═════╝ ╚══════╝╚═╝  ╚═╝
        every serving counted.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a food to the catalog
    Food {
        /// Food name
        name: String,
        /// Calories per serving
        calories: i64,
        /// Portion type (e.g. cup, slice, bowl)
        #[arg(short = 't', long = "type", default_value = "")]
        portion: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a food you ate
    Entry {
        /// Food name
        name: String,
        /// Portion type (e.g. cup, slice, bowl)
        #[arg(short = 't', long = "type", default_value = "")]
        portion: String,
        /// Number of servings
        #[arg(short, long, default_value = "1")]
        servings: i64,
        /// Day to record on: today, yesterday, tomorrow, or DD-MM[-YYYY] (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List catalog foods or record entries
    Show {
        #[command(subcommand)]
        command: ShowCommands,
    },
    /// Delete catalog foods or record entries
    Remove {
        #[command(subcommand)]
        command: RemoveCommands,
    },
}

#[derive(Subcommand)]
enum ShowCommands {
    /// List cataloged foods
    Foods {
        /// Filter by food name (exact)
        #[arg(short, long)]
        name: Option<String>,
        /// Filter by portion type (exact)
        #[arg(short = 't', long = "type")]
        portion: Option<String>,
        /// Filter by calories per serving
        #[arg(long)]
        calories: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List record entries
    Record {
        /// Filter by day: today, yesterday, tomorrow, or DD-MM[-YYYY]
        #[arg(short, long)]
        date: Option<String>,
        /// Filter by food name (exact)
        #[arg(short, long)]
        name: Option<String>,
        /// Filter by portion type (exact)
        #[arg(short = 't', long = "type")]
        portion: Option<String>,
        /// Filter by servings count
        #[arg(short, long)]
        servings: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RemoveCommands {
    /// Delete cataloged foods matching the given filters
    Foods {
        /// Match food name (exact)
        #[arg(short, long)]
        name: Option<String>,
        /// Match portion type (exact)
        #[arg(short = 't', long = "type")]
        portion: Option<String>,
        /// Match calories per serving
        #[arg(long)]
        calories: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete record entries matching the given filters
    Record {
        /// Match day: today, yesterday, tomorrow, or DD-MM[-YYYY]
        #[arg(short, long)]
        date: Option<String>,
        /// Match food name (exact)
        #[arg(short, long)]
        name: Option<String>,
        /// Match portion type (exact)
        #[arg(short = 't', long = "type")]
        portion: Option<String>,
        /// Match servings count
        #[arg(short, long)]
        servings: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {}", config.db_path.display()))?;

    match cli.command {
        Commands::Food {
            name,
            calories,
            portion,
            json,
        } => cmd_food(&db, &name, &portion, calories, json),
        Commands::Entry {
            name,
            portion,
            servings,
            date,
            json,
        } => cmd_entry(&db, &name, &portion, servings, date.as_deref(), json),
        Commands::Show { command } => match command {
            ShowCommands::Foods {
                name,
                portion,
                calories,
                json,
            } => cmd_show_foods(&db, name.as_deref(), portion.as_deref(), calories, json),
            ShowCommands::Record {
                date,
                name,
                portion,
                servings,
                json,
            } => cmd_show_record(
                &db,
                date.as_deref(),
                name.as_deref(),
                portion.as_deref(),
                servings,
                json,
            ),
        },
        Commands::Remove { command } => match command {
            RemoveCommands::Foods {
                name,
                portion,
                calories,
                json,
            } => cmd_remove_foods(&db, name.as_deref(), portion.as_deref(), calories, json),
            RemoveCommands::Record {
                date,
                name,
                portion,
                servings,
                json,
            } => cmd_remove_record(
                &db,
                date.as_deref(),
                name.as_deref(),
                portion.as_deref(),
                servings,
                json,
            ),
        },
    }
}
