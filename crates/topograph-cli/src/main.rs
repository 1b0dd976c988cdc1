use anyhow::Result;
use clap::{Parser, Subcommand};
use topograph_core::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "topograph")]
#[command(about = "Topograph data pipeline - ingest graphs and precompute filter functions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest raw graphs from the source directory and run the
    /// filter-function batch over every canonical graph
    Generate {
        /// Wall-clock budget per datafile, in seconds
        #[arg(long, default_value_t = 1)]
        budget: u64,
    },

    /// Scan the data tree and print the dataset catalog as JSON
    Scan,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topograph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    match cli.command {
        Commands::Generate { budget } => {
            settings.batch.time_budget_secs = budget;
            topograph_pipeline::generate_data(&settings)?;
        }
        Commands::Scan => {
            let catalog = topograph_pipeline::scan(&settings.storage.data_dir);
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
    }

    Ok(())
}
