use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use crate::charts::{ChartSet, ScatterChart, SeriesChart};
use crate::error::Result;
use crate::fmt::money;
use crate::tui::{
    run_view, wrap_text, View, ViewAction, BAR_STYLE, FOOTER_STYLE, HEADER_STYLE, LINE_STYLE,
    PALETTE, SELECTED_STYLE,
};

const TABS: &[&str] = &[
    "Spending by Category",
    "Family Financial Scores",
    "Member Spending Trends",
    "Income vs Savings",
];

const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub struct ChartDashboard {
    charts: ChartSet,
    summary: String,
    tab: usize,
}

impl ChartDashboard {
    pub fn new(charts: ChartSet, summary: String) -> Self {
        Self {
            charts,
            summary,
            tab: 0,
        }
    }
}

impl View for ChartDashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let (summary, summary_lines) =
            wrap_text(&self.summary, area.width.saturating_sub(2) as usize);

        let [header_area, tabs_area, chart_area, summary_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(summary_lines),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(" Financial Dashboard").style(HEADER_STYLE),
            header_area,
        );

        let tabs = Tabs::new(TABS.iter().map(|t| t.to_string()))
            .select(self.tab)
            .highlight_style(SELECTED_STYLE)
            .divider("|");
        frame.render_widget(tabs, tabs_area);

        match self.tab {
            0 => draw_bar_chart(frame, chart_area, &self.charts.category),
            1 => draw_bar_chart(frame, chart_area, &self.charts.family),
            2 => draw_line_chart(frame, chart_area, &self.charts.member),
            _ => draw_scatter(frame, chart_area, &self.charts.scatter),
        }

        frame.render_widget(Paragraph::new(summary).style(FOOTER_STYLE), summary_area);
        frame.render_widget(
            Paragraph::new(" Left/Right=switch chart  1-4=jump  q=quit").style(FOOTER_STYLE),
            hints_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => {
                self.tab = (self.tab + 1) % TABS.len();
            }
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
                self.tab = (self.tab + TABS.len() - 1) % TABS.len();
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.tab = c as usize - '1' as usize;
            }
            _ => {}
        }
        ViewAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Chart widgets
// ---------------------------------------------------------------------------

fn chart_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(TITLE_STYLE)
        .borders(Borders::ALL)
        .border_style(FOOTER_STYLE)
}

/// Axis bounds covering every finite value and zero, padded 5% at the top.
fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return [0.0, 1.0];
    }
    let lo = min.min(0.0);
    let hi = max.max(lo + 1.0);
    [lo, hi + (hi - lo) * 0.05]
}

fn axis_labels(bounds: [f64; 2], format: fn(f64) -> String) -> Vec<Span<'static>> {
    let [lo, hi] = bounds;
    vec![
        Span::styled(format(lo), FOOTER_STYLE),
        Span::styled(format((lo + hi) / 2.0), FOOTER_STYLE),
        Span::styled(format(hi), FOOTER_STYLE),
    ]
}

/// First, middle and last labels of a categorical axis.
fn edge_labels(labels: &[&str]) -> Vec<Span<'static>> {
    match labels.len() {
        0 => Vec::new(),
        1 => vec![Span::styled(labels[0].to_string(), FOOTER_STYLE)],
        2 => labels
            .iter()
            .map(|l| Span::styled(l.to_string(), FOOTER_STYLE))
            .collect(),
        n => [labels[0], labels[n / 2], labels[n - 1]]
            .iter()
            .map(|l| Span::styled(l.to_string(), FOOTER_STYLE))
            .collect(),
    }
}

fn draw_bar_chart(frame: &mut Frame, area: Rect, chart: &SeriesChart) {
    let bars: Vec<Bar> = chart
        .points
        .iter()
        .map(|p| {
            let value = if p.value.is_finite() {
                p.value.max(0.0).round() as u64
            } else {
                0
            };
            Bar::default()
                .value(value)
                .label(Line::from(p.label.clone()))
                .text_value(chart.format_value(p.value))
                .style(BAR_STYLE)
        })
        .collect();

    let n = bars.len().max(1) as u16;
    let bar_width = (area.width.saturating_sub(2) / n)
        .saturating_sub(1)
        .clamp(3, 14);
    let widget = BarChart::default()
        .block(chart_block(&chart.title))
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(widget, area);
}

fn draw_line_chart(frame: &mut Frame, area: Rect, chart: &SeriesChart) {
    let data: Vec<(f64, f64)> = chart
        .points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.value.is_finite())
        .map(|(i, p)| (i as f64, p.value))
        .collect();
    let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
    let x_max = chart.points.len().saturating_sub(1).max(1) as f64;
    let y = bounds(data.iter().map(|(_, v)| *v));

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(LINE_STYLE)
            .data(&data),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(HEADER_STYLE)
            .data(&data),
    ];
    let widget = Chart::new(datasets)
        .block(chart_block(&chart.title))
        .x_axis(
            Axis::default()
                .title(chart.x_label.clone())
                .style(FOOTER_STYLE)
                .bounds([0.0, x_max])
                .labels(edge_labels(&labels)),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.clone())
                .style(FOOTER_STYLE)
                .bounds(y)
                .labels(axis_labels(y, money)),
        );
    frame.render_widget(widget, area);
}

fn draw_scatter(frame: &mut Frame, area: Rect, chart: &ScatterChart) {
    let groups: Vec<(String, Vec<(f64, f64)>)> = chart
        .by_group()
        .into_iter()
        .map(|(name, points)| {
            let finite = points
                .into_iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect();
            (format!("{} {name}", chart.group_label), finite)
        })
        .collect();
    let x = bounds(groups.iter().flat_map(|(_, pts)| pts.iter().map(|(x, _)| *x)));
    let y = bounds(groups.iter().flat_map(|(_, pts)| pts.iter().map(|(_, y)| *y)));

    let datasets: Vec<Dataset> = groups
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(points)
        })
        .collect();
    let widget = Chart::new(datasets)
        .block(chart_block(&chart.title))
        .x_axis(
            Axis::default()
                .title(chart.x_label.clone())
                .style(FOOTER_STYLE)
                .bounds(x)
                .labels(axis_labels(x, money)),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.clone())
                .style(FOOTER_STYLE)
                .bounds(y)
                .labels(axis_labels(y, money)),
        );
    frame.render_widget(widget, area);
}

pub fn run(file: Option<&str>, media_type: Option<&str>) -> Result<()> {
    let dashboard = super::run_pipeline(file, media_type)?;
    let summary = format!(
        " {} rows scored from {}",
        dashboard.table.len(),
        dashboard.stored_at.display()
    );
    let mut view = ChartDashboard::new(dashboard.charts, summary);
    run_view(&mut view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::models::{Cell, Table};
    use ratatui::{backend::TestBackend, Terminal};

    fn sample_charts() -> ChartSet {
        let mut t = Table::new(
            ["Family ID", "Member ID", "Category", "Amount", "Income", "Savings", "Financial Score"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        t.push_row(vec![
            Cell::Number(1.0),
            Cell::Number(11.0),
            Cell::Text("Food".into()),
            Cell::Number(25.0),
            Cell::Number(1000.0),
            Cell::Number(200.0),
            Cell::Number(80.0),
        ]);
        t.push_row(vec![
            Cell::Number(2.0),
            Cell::Number(21.0),
            Cell::Text("Rent".into()),
            Cell::Number(50.0),
            Cell::Number(0.0),
            Cell::Number(100.0),
            Cell::Number(f64::NAN),
        ]);
        aggregate(&t).unwrap()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let mut view = ChartDashboard::new(sample_charts(), String::new());
        view.handle_key(KeyCode::Left);
        assert_eq!(view.tab, 3);
        view.handle_key(KeyCode::Right);
        assert_eq!(view.tab, 0);
        view.handle_key(KeyCode::Char('3'));
        assert_eq!(view.tab, 2);
        assert!(matches!(view.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }

    #[test]
    fn test_every_tab_renders() {
        let mut view = ChartDashboard::new(sample_charts(), "2 rows scored".to_string());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for (tab, title) in [
            "Spending Distribution by Category",
            "Family Financial Scores",
            "Member Spending Trends",
            "Income vs Savings",
        ]
        .iter()
        .enumerate()
        {
            view.tab = tab;
            terminal.draw(|f| view.draw(f)).unwrap();
            let text = screen_text(&terminal);
            assert!(text.contains(title), "tab {tab} missing {title}");
        }
    }

    #[test]
    fn test_bounds_ignore_nan_and_include_zero() {
        assert_eq!(bounds([f64::NAN].into_iter()), [0.0, 1.0]);
        let [lo, hi] = bounds([10.0, 20.0, f64::NAN].into_iter());
        assert_eq!(lo, 0.0);
        assert!(hi >= 20.0);
    }

    #[test]
    fn test_edge_labels() {
        assert!(edge_labels(&[]).is_empty());
        assert_eq!(edge_labels(&["a", "b", "c", "d"]).len(), 3);
    }
}
