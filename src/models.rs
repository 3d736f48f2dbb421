use std::fmt;

use chrono::NaiveDate;

use crate::error::MissingColumn;

pub const FAMILY_ID: &str = "Family ID";
pub const MEMBER_ID: &str = "Member ID";
pub const CATEGORY: &str = "Category";
pub const AMOUNT: &str = "Amount";
pub const TRANSACTION_DATE: &str = "Transaction Date";
pub const INCOME: &str = "Income";
pub const SAVINGS: &str = "Savings";
pub const MONTHLY_EXPENSES: &str = "Monthly Expenses";
pub const LOAN_PAYMENTS: &str = "Loan Payments";
pub const CREDIT_CARD_SPENDING: &str = "Credit Card Spending";

pub const SAVINGS_TO_INCOME: &str = "Savings-to-Income Ratio";
pub const EXPENSES_TO_INCOME: &str = "Expenses-to-Income Ratio";
pub const LOAN_TO_INCOME: &str = "Loan-to-Income Ratio";
pub const FINANCIAL_SCORE: &str = "Financial Score";

/// Parse a numeric cell written as text. Accepts thousands separators, a
/// leading currency sign and accounting-style parenthesized negatives.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok()
}

/// Render a float the way a spreadsheet would show an identifier or total:
/// integral values without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One spreadsheet cell after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    /// Numeric view of the cell. Anything that is not a number reads as NaN
    /// so it propagates through arithmetic instead of becoming zero.
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => parse_number(s).unwrap_or(f64::NAN),
            Cell::Empty | Cell::Date(_) => f64::NAN,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Row-oriented transaction table. Every row holds exactly one cell per
/// header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build an empty table. Blank headers become `Unnamed: N` and repeated
    /// headers get `.1`, `.2`, ... suffixes so every column is addressable.
    pub fn new(headers: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(headers.len());
        for (i, raw) in headers.into_iter().enumerate() {
            let base = if raw.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                raw
            };
            let mut name = base.clone();
            let mut n = 1;
            while unique.contains(&name) {
                name = format!("{base}.{n}");
                n += 1;
            }
            unique.push(name);
        }
        Self {
            headers: unique,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with empty cells and dropping
    /// cells beyond the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require(&self, name: &str) -> std::result::Result<usize, MissingColumn> {
        self.column_index(name)
            .ok_or_else(|| MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.rows[row][col] = cell;
    }

    /// Numeric view of a whole column.
    pub fn numbers(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[col].as_f64()).collect()
    }

    /// Replace the column called `name` in place, or append it as the last
    /// column when it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[col] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }
}
