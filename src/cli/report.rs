use colored::Colorize;
use comfy_table::{Cell as TableCell, CellAlignment, Table as TextTable};

use crate::charts::{ChartSet, ScatterChart, SeriesChart};
use crate::cli::ChartChoice;
use crate::error::Result;
use crate::fmt::money;
use crate::models::{Cell, Table};

const BAR_WIDTH: usize = 30;

/// Horizontal bar scaled against `max`. Non-finite and negative values get
/// no bar.
fn bar(value: f64, max: f64) -> String {
    if !value.is_finite() || value <= 0.0 || !max.is_finite() || max <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len.min(BAR_WIDTH))
}

fn preview_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) if n.is_finite() && n.fract() != 0.0 => format!("{n:.2}"),
        other => other.to_string(),
    }
}

pub fn print_series(chart: &SeriesChart) {
    let max = chart.max_value().unwrap_or(0.0);
    let mut table = TextTable::new();
    table.set_header(vec![chart.x_label.as_str(), chart.y_label.as_str(), ""]);
    for p in &chart.points {
        table.add_row(vec![
            TableCell::new(&p.label),
            TableCell::new(chart.format_value(p.value)).set_alignment(CellAlignment::Right),
            TableCell::new(bar(p.value, max)),
        ]);
    }
    println!("{}\n{table}", chart.title.bold());
}

pub fn print_scatter(chart: &ScatterChart) {
    let mut table = TextTable::new();
    table.set_header(vec![
        chart.group_label.as_str(),
        chart.x_label.as_str(),
        chart.y_label.as_str(),
    ]);
    for (group, points) in chart.by_group() {
        for (x, y) in points {
            table.add_row(vec![
                TableCell::new(group),
                TableCell::new(money(x)).set_alignment(CellAlignment::Right),
                TableCell::new(money(y)).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    println!("{}\n{table}", chart.title.bold());
}

pub fn print_chart(charts: &ChartSet, choice: ChartChoice) {
    match choice {
        ChartChoice::Category => print_series(&charts.category),
        ChartChoice::Family => print_series(&charts.family),
        ChartChoice::Member => print_series(&charts.member),
        ChartChoice::Scatter => print_scatter(&charts.scatter),
        ChartChoice::All => {
            print_series(&charts.category);
            println!();
            print_series(&charts.family);
            println!();
            print_series(&charts.member);
            println!();
            print_scatter(&charts.scatter);
        }
    }
}

/// First `rows` rows of the scored table.
pub fn print_preview(data: &Table, rows: usize) {
    if rows == 0 {
        return;
    }
    let mut table = TextTable::new();
    table.set_header(data.headers().to_vec());
    for row in data.rows().iter().take(rows) {
        table.add_row(row.iter().map(preview_cell).collect::<Vec<_>>());
    }
    let shown = rows.min(data.len());
    println!(
        "{}\n{table}",
        format!("Scored transactions ({shown} of {})", data.len()).bold()
    );
}

pub fn run(chart: ChartChoice, file: Option<&str>, media_type: Option<&str>) -> Result<()> {
    let dashboard = super::run_pipeline(file, media_type)?;
    print_chart(&dashboard.charts, chart);
    Ok(())
}
