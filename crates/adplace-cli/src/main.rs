//! AdPlace CLI
//!
//! Command-line interface for the advertisement store

use clap::{Parser, Subcommand};

use adplace_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "adplace")]
#[command(about = "AdPlace - Advertisement placement store", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    /// Logging profile: dev, prod or test
    #[arg(long, global = true, env = "ADPLACE_LOG_PROFILE", default_value = "dev")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Advertisement operations
    Ads(commands::ads::AdsArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging_facility::init(cli.log);

    let result = match cli.command {
        Commands::Migrate => commands::migrate::execute(&cli.global),
        Commands::Ads(args) => commands::ads::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
