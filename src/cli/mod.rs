#[cfg(feature = "tui")]
pub mod dashboard;
pub mod export;
pub mod init;
pub mod report;
pub mod status;
pub mod upload;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::{HearthError, Result};
use crate::pipeline::{self, Dashboard};
use crate::settings::{load_settings, shellexpand_path};
use crate::upload::{Upload, UploadStore};

#[derive(Parser)]
#[command(
    name = "hearth",
    about = "Household financial health dashboard for transaction spreadsheets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory for uploads and exports.
    Init {
        /// Path for hearth data (default: ~/Documents/hearth)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Upload a transaction spreadsheet, score it and print every chart.
    Upload {
        /// Path to an XLSX/XLS/ODS or CSV file
        file: String,
        /// Declared media type (default: inferred from the file extension)
        #[arg(long = "media-type")]
        media_type: Option<String>,
        /// Rows of the scored table to preview (default from settings)
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Print one chart as a table.
    Report {
        /// Which chart to print
        #[arg(value_enum)]
        chart: ChartChoice,
        /// File to chart (default: the latest upload)
        file: Option<String>,
        #[arg(long = "media-type")]
        media_type: Option<String>,
    },
    /// Export chart specifications as JSON.
    Export {
        /// File to chart (default: the latest upload)
        file: Option<String>,
        #[arg(long = "media-type")]
        media_type: Option<String>,
        /// Output path (default: <data_dir>/exports/charts-YYYY-MM-DD.json)
        #[arg(long)]
        output: Option<String>,
        /// Also write the scored table as CSV to this path
        #[arg(long = "scored-csv")]
        scored_csv: Option<String>,
    },
    /// Interactive dashboard with one tab per chart.
    #[cfg(feature = "tui")]
    Dashboard {
        /// File to chart (default: the latest upload)
        file: Option<String>,
        #[arg(long = "media-type")]
        media_type: Option<String>,
    },
    /// Show the data directory and stored uploads.
    Status,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartChoice {
    /// Spending distribution by category
    Category,
    /// Mean financial score per family
    Family,
    /// Spending per member
    Member,
    /// Income vs savings per row
    Scatter,
    /// All four charts
    All,
}

/// Pick the upload to work on: the named file, or the latest stored upload.
pub(crate) fn resolve_upload(
    file: Option<&str>,
    media_type: Option<&str>,
    store: &UploadStore,
) -> Result<Upload> {
    let path = match file {
        Some(f) => PathBuf::from(shellexpand_path(f)),
        None => store.latest()?.ok_or_else(|| {
            HearthError::Other("No uploads yet. Run `hearth upload FILE` first.".to_string())
        })?,
    };
    Upload::from_path(&path, media_type)
}

pub(crate) fn run_pipeline(file: Option<&str>, media_type: Option<&str>) -> Result<Dashboard> {
    let settings = load_settings();
    let store = UploadStore::in_data_dir(Path::new(&settings.data_dir))
        .with_limit(settings.keep_uploads);
    let upload = resolve_upload(file, media_type, &store)?;
    pipeline::run(&upload, &store)
}
