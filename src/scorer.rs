use tracing::{debug, warn};

use crate::error::{HearthError, Result};
use crate::models::{
    Cell, Table, CREDIT_CARD_SPENDING, EXPENSES_TO_INCOME, FINANCIAL_SCORE, INCOME,
    LOAN_PAYMENTS, LOAN_TO_INCOME, MONTHLY_EXPENSES, SAVINGS, SAVINGS_TO_INCOME,
};

/// Columns that must be present before any ratio is computed.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    SAVINGS,
    INCOME,
    MONTHLY_EXPENSES,
    LOAN_PAYMENTS,
    CREDIT_CARD_SPENDING,
];

/// `numerator / income * 100`, or NaN when income is zero or not a number.
pub fn ratio(numerator: f64, income: f64) -> f64 {
    if income == 0.0 || !income.is_finite() {
        return f64::NAN;
    }
    numerator / income * 100.0
}

/// Clip to the closed interval [0, 100]. NaN stays NaN.
pub fn clip(value: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn financial_score(expenses_ratio: f64, loan_ratio: f64, savings_ratio: f64) -> f64 {
    clip(100.0 - expenses_ratio - loan_ratio + savings_ratio)
}

fn ratio_column(numerators: &[f64], income: &[f64]) -> Vec<f64> {
    numerators
        .iter()
        .zip(income)
        .map(|(n, i)| ratio(*n, *i))
        .collect()
}

fn to_cells(values: &[f64]) -> Vec<Cell> {
    values.iter().copied().map(Cell::Number).collect()
}

/// Add the income ratios and the composite financial score to every row.
///
/// Adds `Savings-to-Income Ratio`, `Expenses-to-Income Ratio` and
/// `Loan-to-Income Ratio`, rewrites `Credit Card Spending` as a percentage of
/// income (the absolute value is not kept), then adds `Financial Score`.
/// Rows keep their order. A missing input column fails before anything is
/// written.
pub fn score(mut table: Table) -> Result<Table> {
    let mut cols = [0usize; 5];
    for (slot, name) in cols.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = table
            .require(name)
            .map_err(|e| HearthError::Score(e.to_string()))?;
    }
    let [savings, income, expenses, loans, card] = cols.map(|c| table.numbers(c));

    let savings_ratio = ratio_column(&savings, &income);
    let expenses_ratio = ratio_column(&expenses, &income);
    let loan_ratio = ratio_column(&loans, &income);
    let card_ratio = ratio_column(&card, &income);
    let scores: Vec<f64> = (0..table.len())
        .map(|i| financial_score(expenses_ratio[i], loan_ratio[i], savings_ratio[i]))
        .collect();

    let undefined = income
        .iter()
        .filter(|i| **i == 0.0 || !i.is_finite())
        .count();
    if undefined > 0 {
        warn!(rows = undefined, "income is zero or missing; ratios are undefined for these rows");
    }

    table.set_column(SAVINGS_TO_INCOME, to_cells(&savings_ratio));
    table.set_column(EXPENSES_TO_INCOME, to_cells(&expenses_ratio));
    table.set_column(LOAN_TO_INCOME, to_cells(&loan_ratio));
    table.set_column(CREDIT_CARD_SPENDING, to_cells(&card_ratio));
    table.set_column(FINANCIAL_SCORE, to_cells(&scores));

    debug!(rows = table.len(), "scored transaction table");
    Ok(table)
}
