mod aggregator;
mod charts;
mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod pipeline;
mod scorer;
mod settings;
#[cfg(feature = "tui")]
mod tui;
mod upload;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hearth=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Upload {
            file,
            media_type,
            rows,
        } => cli::upload::run(&file, media_type.as_deref(), rows),
        Commands::Report {
            chart,
            file,
            media_type,
        } => cli::report::run(chart, file.as_deref(), media_type.as_deref()),
        Commands::Export {
            file,
            media_type,
            output,
            scored_csv,
        } => cli::export::run(file.as_deref(), media_type.as_deref(), output, scored_csv),
        #[cfg(feature = "tui")]
        Commands::Dashboard { file, media_type } => {
            cli::dashboard::run(file.as_deref(), media_type.as_deref())
        }
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
