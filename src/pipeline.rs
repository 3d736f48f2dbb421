use std::path::PathBuf;

use tracing::{info, info_span, warn};

use crate::aggregator;
use crate::charts::ChartSet;
use crate::error::Result;
use crate::loader;
use crate::models::Table;
use crate::scorer;
use crate::upload::{Upload, UploadStore};

/// Everything one upload produces.
#[derive(Debug)]
pub struct Dashboard {
    pub stored_at: PathBuf,
    pub table: Table,
    pub charts: ChartSet,
}

/// Persist the raw upload, then load, score and aggregate it. The upload is
/// written before it is parsed, so a file that later fails to load is still
/// kept. The first failing stage ends the run.
pub fn run(upload: &Upload, store: &UploadStore) -> Result<Dashboard> {
    let _span = info_span!("pipeline", file = %upload.file_name).entered();

    let format = upload.format()?;
    let stored_at = store.persist(upload)?;
    let table = loader::load(&upload.bytes, format)?;
    if table.is_empty() {
        warn!(file = %upload.file_name, "header row but no transactions");
    }
    let table = scorer::score(table)?;
    let charts = aggregator::aggregate(&table)?;

    info!(rows = table.len(), "pipeline complete");
    Ok(Dashboard {
        stored_at,
        table,
        charts,
    })
}
