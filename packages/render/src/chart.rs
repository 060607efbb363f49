//! Horizontal bar charts.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Color group, e.g. the health-based flag on the violations chart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
}

impl Bar {
    #[must_use]
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            series: None,
        }
    }

    #[must_use]
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChart {
    pub title: String,
    pub x_title: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// Bars are ordered by value descending. Equal values keep their input
    /// order.
    #[must_use]
    pub fn new(title: impl Into<String>, x_title: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| b.value.total_cmp(&a.value));
        Self {
            title: title.into(),
            x_title: x_title.into(),
            bars,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Sum of all bar values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.bars.iter().map(|b| b.value).sum()
    }
}
