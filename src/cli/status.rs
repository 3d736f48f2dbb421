use std::path::PathBuf;

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;
use crate::upload::UploadStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let store = UploadStore::in_data_dir(&data_dir);

    println!("Data dir:     {}", data_dir.display());
    println!("Uploads:      {}", store.dir().display());
    println!("Preview rows: {}", settings.preview_rows);
    match settings.keep_uploads {
        0 => println!("Keep uploads: all"),
        n => println!("Keep uploads: {n} newest"),
    }

    let uploads = store.list()?;
    println!();
    if uploads.is_empty() {
        println!("No uploads yet. Run `hearth upload FILE` to add one.");
        return Ok(());
    }

    let total: u64 = uploads.iter().map(|u| u.size).sum();
    println!("Stored uploads: {} ({})", uploads.len(), format_bytes(total));
    if let Some(latest) = uploads.first() {
        let modified: chrono::DateTime<chrono::Local> = latest.modified.into();
        println!(
            "Latest:         {} ({}, {})",
            latest.path.display(),
            format_bytes(latest.size),
            modified.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
