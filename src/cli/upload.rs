use std::path::{Path, PathBuf};

use crate::cli::report::{print_chart, print_preview};
use crate::cli::ChartChoice;
use crate::error::Result;
use crate::pipeline;
use crate::settings::{load_settings, shellexpand_path};
use crate::upload::{Upload, UploadStore};

pub fn run(file: &str, media_type: Option<&str>, rows: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let store =
        UploadStore::in_data_dir(Path::new(&settings.data_dir)).with_limit(settings.keep_uploads);
    let upload = Upload::from_path(&PathBuf::from(shellexpand_path(file)), media_type)?;

    let dashboard = pipeline::run(&upload, &store)?;

    println!("Stored {} at {}", upload.file_name, dashboard.stored_at.display());
    println!("{} rows scored\n", dashboard.table.len());
    print_preview(&dashboard.table, rows.unwrap_or(settings.preview_rows));
    println!();
    print_chart(&dashboard.charts, ChartChoice::All);
    Ok(())
}
