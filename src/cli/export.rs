use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{Cell, Table};
use crate::settings::get_data_dir;

fn default_path(name: &str, ext: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir()
        .join("exports")
        .join(format!("{name}-{date}.{ext}"))
}

fn write_file(bytes: &[u8], path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    let display = format!("{}", path.display());
    println!("Wrote {display}");
    Ok(display)
}

/// Dates go back out in the same DD-MM-YYYY form they came in as.
fn csv_field(cell: &Cell) -> String {
    match cell {
        Cell::Date(d) => d.format("%d-%m-%Y").to_string(),
        other => other.to_string(),
    }
}

pub fn write_scored_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(csv_field))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(
    file: Option<&str>,
    media_type: Option<&str>,
    output: Option<String>,
    scored_csv: Option<String>,
) -> Result<()> {
    let dashboard = super::run_pipeline(file, media_type)?;

    let json = dashboard.charts.to_json_pretty()?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path("charts", "json"));
    write_file(format!("{json}\n").as_bytes(), &path)?;

    if let Some(csv_path) = scored_csv {
        let csv_path = PathBuf::from(csv_path);
        write_scored_csv(&dashboard.table, &csv_path)?;
        println!("Wrote {}", csv_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_write_scored_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("scored.csv");
        let mut table = Table::new(vec![
            "Transaction Date".into(),
            "Financial Score".into(),
            "Category".into(),
        ]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            Cell::Number(f64::NAN),
            Cell::Text("Food, groceries".into()),
        ]);
        write_scored_csv(&table, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Transaction Date,Financial Score,Category\n15-01-2025,NaN,\"Food, groceries\"\n"
        );
    }

    #[test]
    fn test_write_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("charts.json");
        write_file(b"{}\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
