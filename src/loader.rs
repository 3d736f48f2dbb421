use std::io::Cursor;
use std::sync::OnceLock;

use calamine::{Data, Reader};
use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::error::{HearthError, Result};
use crate::models::{Cell, Table, TRANSACTION_DATE};

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// How the raw upload bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Any workbook the spreadsheet reader understands (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
    Csv,
}

/// Parse an upload into a table and normalize its `Transaction Date` column.
/// Any failure rejects the whole file.
pub fn load(bytes: &[u8], format: SourceFormat) -> Result<Table> {
    let mut table = match format {
        SourceFormat::Workbook => read_workbook(bytes)?,
        SourceFormat::Csv => read_csv(bytes)?,
    };
    normalize_dates(&mut table)?;
    debug!(
        rows = table.len(),
        columns = table.headers().len(),
        ?format,
        "loaded transaction table"
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("valid date pattern"))
}

/// Parse a `DD-MM-YYYY` date. Anything else, including impossible calendar
/// dates, is rejected.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !date_pattern().is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%d-%m-%Y").ok()
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::try_days(serial.floor() as i64)?)
}

fn normalize_dates(table: &mut Table) -> Result<()> {
    let col = table
        .require(TRANSACTION_DATE)
        .map_err(|e| HearthError::Load(e.to_string()))?;
    for row in 0..table.len() {
        // Spreadsheet row number: header is row 1.
        let line = row + 2;
        let date = match table.cell(row, col) {
            Cell::Date(d) => *d,
            Cell::Text(s) => parse_date_dmy(s).ok_or_else(|| {
                HearthError::Load(format!(
                    "{TRANSACTION_DATE} \"{s}\" on row {line} does not match format DD-MM-YYYY"
                ))
            })?,
            // Blank dates stay missing; only malformed values reject the file.
            Cell::Empty => continue,
            Cell::Number(n) => {
                return Err(HearthError::Load(format!(
                    "{TRANSACTION_DATE} {n} on row {line} does not match format DD-MM-YYYY"
                )))
            }
        };
        table.set_cell(row, col, Cell::Date(date));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Workbook reader
// ---------------------------------------------------------------------------

fn read_workbook(bytes: &[u8]) -> Result<Table> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| HearthError::Load(format!("failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HearthError::Load("workbook has no sheets".to_string()))?
        .map_err(|e| HearthError::Load(format!("failed to read first sheet: {e}")))?;
    table_from_rows(range.rows())
}

/// First row is the header; fully blank rows are skipped.
fn table_from_rows<'a, I>(mut rows: I) -> Result<Table>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header = rows
        .next()
        .ok_or_else(|| HearthError::Load("first sheet is empty".to_string()))?;
    let mut table = Table::new(header.iter().map(header_text).collect());
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        table.push_row(cells);
    }
    Ok(table)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        other => cell_from_data(other).to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(bytes: &[u8]) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| HearthError::Load(format!("malformed CSV header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut table = Table::new(headers);
    for result in rdr.records() {
        let record = result.map_err(|e| HearthError::Load(format!("malformed CSV: {e}")))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(cell_from_text).collect());
    }
    Ok(table)
}

fn cell_from_text(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Empty;
    }
    match s.parse::<f64>() {
        Ok(n) => Cell::Number(n),
        Err(_) => Cell::Text(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Family ID,Member ID,Category,Amount,Transaction Date,Income,Savings";

    fn csv_bytes(rows: &[&str]) -> Vec<u8> {
        let mut content = format!("{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content.into_bytes()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_dmy() {
        assert_eq!(parse_date_dmy("15-01-2025"), Some(date(2025, 1, 15)));
        assert_eq!(parse_date_dmy("5-1-2025"), Some(date(2025, 1, 5)));
        assert_eq!(parse_date_dmy(" 01-12-2024 "), Some(date(2024, 12, 1)));
        assert_eq!(parse_date_dmy("2025-01-15"), None);
        assert_eq!(parse_date_dmy("01/15/2025"), None);
        assert_eq!(parse_date_dmy("15-01-25"), None);
    }

    #[test]
    fn test_parse_date_dmy_rejects_invalid_dates() {
        assert_eq!(parse_date_dmy("30-02-2025"), None); // Feb 30
        assert_eq!(parse_date_dmy("01-13-2025"), None); // month 13
        assert_eq!(parse_date_dmy("00-01-2025"), None); // day 0
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), Some(date(2025, 1, 10)));
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_load_csv_parses_dates_and_numbers() {
        let bytes = csv_bytes(&[
            "1,11,Food,10.5,15-01-2025,1000,200",
            "2,21,Rent,50,01-02-2025,2000,",
        ]);
        let table = load(&bytes, SourceFormat::Csv).unwrap();
        assert_eq!(table.len(), 2);
        let date_col = table.column_index(TRANSACTION_DATE).unwrap();
        assert_eq!(table.cell(0, date_col), &Cell::Date(date(2025, 1, 15)));
        assert_eq!(table.cell(1, date_col), &Cell::Date(date(2025, 2, 1)));
        assert_eq!(table.cell(0, 3), &Cell::Number(10.5));
        assert_eq!(table.cell(0, 2), &Cell::Text("Food".into()));
        assert_eq!(table.cell(1, 6), &Cell::Empty);
    }

    #[test]
    fn test_load_skips_blank_rows() {
        let bytes = csv_bytes(&["1,11,Food,10,15-01-2025,1000,200", ",,,,,,"]);
        let table = load(&bytes, SourceFormat::Csv).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_load_rejects_missing_date_column() {
        let bytes = b"Family ID,Amount\n1,10\n".to_vec();
        let err = load(&bytes, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, HearthError::Load(_)));
        assert!(err.to_string().contains("column not found: Transaction Date"));
    }

    #[test]
    fn test_load_rejects_whole_file_on_one_bad_date() {
        let bytes = csv_bytes(&[
            "1,11,Food,10,15-01-2025,1000,200",
            "1,12,Food,10,2025-01-16,1000,200",
        ]);
        let err = load(&bytes, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, HearthError::Load(_)));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_load_keeps_blank_date_as_missing() {
        let bytes = csv_bytes(&[
            "1,11,Food,10,15-01-2025,1000,200",
            "1,12,Food,5,,1000,200",
        ]);
        let table = load(&bytes, SourceFormat::Csv).unwrap();
        assert_eq!(table.len(), 2);
        let date_col = table.column_index(TRANSACTION_DATE).unwrap();
        assert_eq!(table.cell(0, date_col), &Cell::Date(date(2025, 1, 15)));
        assert_eq!(table.cell(1, date_col), &Cell::Empty);
    }

    fn xlsx_bytes() -> Vec<u8> {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in HEADER.split(',').enumerate() {
            sheet.write_string(0, col as u16, name).unwrap();
        }
        let date_format = Format::new().set_num_format("dd-mm-yyyy");
        let jan_15 = ExcelDateTime::from_ymd(2025, 1, 15).unwrap();

        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_number(1, 1, 11.0).unwrap();
        sheet.write_string(1, 2, "Food").unwrap();
        sheet.write_number(1, 3, 12.5).unwrap();
        sheet.write_with_format(1, 4, &jan_15, &date_format).unwrap();
        sheet.write_number(1, 5, 1000.0).unwrap();
        sheet.write_number(1, 6, 200.0).unwrap();

        sheet.write_number(2, 0, 2.0).unwrap();
        sheet.write_number(2, 1, 21.0).unwrap();
        sheet.write_string(2, 2, "Rent").unwrap();
        sheet.write_number(2, 3, 50.0).unwrap();
        sheet.write_string(2, 4, "01-02-2025").unwrap();
        sheet.write_number(2, 5, 2000.0).unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_load_xlsx_reads_first_sheet() {
        let table = load(&xlsx_bytes(), SourceFormat::Workbook).unwrap();
        assert_eq!(table.headers().join(","), HEADER);
        assert_eq!(table.len(), 2);
        let date_col = table.column_index(TRANSACTION_DATE).unwrap();
        // Native date cell and DD-MM-YYYY text both normalize.
        assert_eq!(table.cell(0, date_col), &Cell::Date(date(2025, 1, 15)));
        assert_eq!(table.cell(1, date_col), &Cell::Date(date(2025, 2, 1)));
        assert_eq!(table.cell(0, 0), &Cell::Number(1.0));
        assert_eq!(table.cell(0, 2), &Cell::Text("Food".into()));
        assert_eq!(table.cell(0, 3), &Cell::Number(12.5));
        assert_eq!(table.cell(1, 6), &Cell::Empty);
    }

    #[test]
    fn test_load_rejects_garbage_workbook() {
        let err = load(b"definitely not a workbook", SourceFormat::Workbook).unwrap_err();
        assert!(matches!(err, HearthError::Load(_)));
    }

    #[test]
    fn test_table_from_rows_converts_sheet_cells() {
        let rows: Vec<Vec<Data>> = vec![
            vec![
                Data::String("Family ID".into()),
                Data::String("Category".into()),
                Data::String("Transaction Date".into()),
                Data::String("Amount".into()),
            ],
            vec![
                Data::Int(3),
                Data::String("Food".into()),
                Data::String("15-01-2025".into()),
                Data::Float(12.5),
            ],
            vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            vec![
                Data::Float(4.0),
                Data::String(String::new()),
                Data::DateTimeIso("2025-01-16T00:00:00".into()),
            ],
        ];
        let mut table = table_from_rows(rows.iter().map(|r| r.as_slice())).unwrap();
        normalize_dates(&mut table).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), &Cell::Number(3.0));
        assert_eq!(table.cell(0, 2), &Cell::Date(date(2025, 1, 15)));
        assert_eq!(table.cell(1, 1), &Cell::Empty);
        assert_eq!(table.cell(1, 2), &Cell::Date(date(2025, 1, 16)));
        assert_eq!(table.cell(1, 3), &Cell::Empty);
    }

    #[test]
    fn test_table_from_rows_rejects_empty_sheet() {
        let rows: Vec<Vec<Data>> = Vec::new();
        assert!(matches!(
            table_from_rows(rows.iter().map(|r| r.as_slice())),
            Err(HearthError::Load(_))
        ));
    }
}
