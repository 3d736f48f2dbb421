use serde::Serialize;

use crate::error::Result;
use crate::fmt::{money, score};
use crate::models::FINANCIAL_SCORE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    LineMarkers,
    Scatter,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A labelled one-dimensional series: bar or line chart.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesChart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeriesPoint>,
}

impl SeriesChart {
    pub fn new(kind: ChartKind, title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<SeriesPoint>) -> Self {
        self.points = points;
        self
    }

    /// Scores read as plain numbers, everything else as money.
    pub fn format_value(&self, value: f64) -> String {
        if self.y_label == FINANCIAL_SCORE {
            score(value)
        } else {
            money(value)
        }
    }

    /// Largest finite value, if any.
    pub fn max_value(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub group: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Column the points are colored by.
    pub group_label: String,
    pub points: Vec<ScatterPoint>,
}

impl ScatterChart {
    pub fn new(
        title: &str,
        x_label: &str,
        y_label: &str,
        group_label: &str,
        points: Vec<ScatterPoint>,
    ) -> Self {
        Self {
            kind: ChartKind::Scatter,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            group_label: group_label.to_string(),
            points,
        }
    }

    /// Points split by group, groups in order of first appearance.
    pub fn by_group(&self) -> Vec<(&str, Vec<(f64, f64)>)> {
        let mut groups: Vec<(&str, Vec<(f64, f64)>)> = Vec::new();
        for p in &self.points {
            match groups.iter_mut().find(|(g, _)| *g == p.group) {
                Some((_, pts)) => pts.push((p.x, p.y)),
                None => groups.push((p.group.as_str(), vec![(p.x, p.y)])),
            }
        }
        groups
    }
}

/// The four dashboard charts produced from one upload.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub category: SeriesChart,
    pub family: SeriesChart,
    pub member: SeriesChart,
    pub scatter: ScatterChart,
}

impl ChartSet {
    /// NaN values serialize as `null`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
