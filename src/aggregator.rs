use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::charts::{ChartKind, ChartSet, ScatterChart, ScatterPoint, SeriesChart, SeriesPoint};
use crate::error::{HearthError, Result};
use crate::models::{
    format_number, Cell, Table, AMOUNT, CATEGORY, FAMILY_ID, FINANCIAL_SCORE, INCOME, MEMBER_ID,
    SAVINGS,
};

// ---------------------------------------------------------------------------
// Group keys
// ---------------------------------------------------------------------------

/// A grouping value. Numbers sort before text; numbers compare numerically,
/// text lexically.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    /// Empty and NaN cells do not belong to any group.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => None,
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) => Some(Self::Number(*n)),
            Cell::Text(s) => Some(Self::Text(s.clone())),
            Cell::Date(_) => Some(Self::Text(cell.to_string())),
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

fn column(table: &Table, name: &str) -> Result<usize> {
    table
        .require(name)
        .map_err(|e| HearthError::Aggregate(e.to_string()))
}

/// Sum `value` per `key` group in ascending key order. NaN values are
/// skipped, so a group of only NaN values sums to 0.
pub fn group_sum(table: &Table, key: usize, value: usize) -> Vec<(GroupKey, f64)> {
    let mut groups: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for row in table.rows() {
        let Some(k) = GroupKey::from_cell(&row[key]) else {
            continue;
        };
        let total = groups.entry(k).or_insert(0.0);
        let v = row[value].as_f64();
        if !v.is_nan() {
            *total += v;
        }
    }
    groups.into_iter().collect()
}

/// Mean of `value` per `key` group in ascending key order. NaN values are
/// skipped; a group with nothing left has a NaN mean.
pub fn group_mean(table: &Table, key: usize, value: usize) -> Vec<(GroupKey, f64)> {
    let mut groups: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let Some(k) = GroupKey::from_cell(&row[key]) else {
            continue;
        };
        let (sum, count) = groups.entry(k).or_insert((0.0, 0));
        let v = row[value].as_f64();
        if !v.is_nan() {
            *sum += v;
            *count += 1;
        }
    }
    groups
        .into_iter()
        .map(|(k, (sum, count))| {
            let mean = if count == 0 { f64::NAN } else { sum / count as f64 };
            (k, mean)
        })
        .collect()
}

/// Stable, so equal totals keep ascending key order.
fn sort_descending(mut groups: Vec<(GroupKey, f64)>) -> Vec<(GroupKey, f64)> {
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
}

fn to_points(groups: Vec<(GroupKey, f64)>) -> Vec<SeriesPoint> {
    groups
        .into_iter()
        .map(|(k, value)| SeriesPoint {
            label: k.to_string(),
            value,
        })
        .collect()
}

pub fn category_spending(table: &Table) -> Result<SeriesChart> {
    let category = column(table, CATEGORY)?;
    let amount = column(table, AMOUNT)?;
    let totals = sort_descending(group_sum(table, category, amount));
    Ok(SeriesChart::new(
        ChartKind::Bar,
        "Spending Distribution by Category",
        CATEGORY,
        AMOUNT,
    )
    .with_points(to_points(totals)))
}

/// Mean score per family, in group order. Not sorted by score.
pub fn family_scores(table: &Table) -> Result<SeriesChart> {
    let family = column(table, FAMILY_ID)?;
    let score = column(table, FINANCIAL_SCORE)?;
    let means = group_mean(table, family, score);
    Ok(SeriesChart::new(
        ChartKind::Bar,
        "Family Financial Scores",
        FAMILY_ID,
        FINANCIAL_SCORE,
    )
    .with_points(to_points(means)))
}

/// Total spending per member, largest first. The x axis is the member, not
/// time.
pub fn member_spending(table: &Table) -> Result<SeriesChart> {
    let member = column(table, MEMBER_ID)?;
    let amount = column(table, AMOUNT)?;
    let totals = sort_descending(group_sum(table, member, amount));
    Ok(SeriesChart::new(
        ChartKind::LineMarkers,
        "Member Spending Trends",
        MEMBER_ID,
        AMOUNT,
    )
    .with_points(to_points(totals)))
}

/// One point per row, in row order, tagged with the row's family.
pub fn income_vs_savings(table: &Table) -> Result<ScatterChart> {
    let family = column(table, FAMILY_ID)?;
    let income = column(table, INCOME)?;
    let savings = column(table, SAVINGS)?;
    let points = table
        .rows()
        .iter()
        .map(|row| ScatterPoint {
            group: row[family].to_string(),
            x: row[income].as_f64(),
            y: row[savings].as_f64(),
        })
        .collect();
    Ok(ScatterChart::new(
        "Income vs Savings",
        INCOME,
        SAVINGS,
        FAMILY_ID,
        points,
    ))
}

/// Build all four charts from a scored table. Any failure discards the
/// whole set.
pub fn aggregate(table: &Table) -> Result<ChartSet> {
    let charts = ChartSet {
        category: category_spending(table)?,
        family: family_scores(table)?,
        member: member_spending(table)?,
        scatter: income_vs_savings(table)?,
    };
    debug!(
        categories = charts.category.points.len(),
        families = charts.family.points.len(),
        members = charts.member.points.len(),
        points = charts.scatter.points.len(),
        "aggregated charts"
    );
    Ok(charts)
}
