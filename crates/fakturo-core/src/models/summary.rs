//! Income/expense summary models.

use serde::Deserialize;

/// Monthly (or all-time) income and expense totals with chart data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlySummary {
    pub income: f64,
    pub expenses: f64,
    pub profit: f64,
    #[serde(default)]
    pub chart: Vec<ChartPoint>,
}

/// One bucket of the summary chart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub income: f64,
    pub expenses: f64,
}

/// Query parameters for the summary endpoint. The default (no year, no
/// month, not all-time) asks the backend for the current month.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub all_time: bool,
}

impl SummaryQuery {
    /// Render the query string, omitting unset parameters.
    pub(crate) fn to_query_string(self) -> String {
        let mut params = Vec::new();
        if let Some(year) = self.year {
            params.push(format!("year={}", year));
        }
        if let Some(month) = self.month {
            params.push(format!("month={}", month));
        }
        if self.all_time {
            params.push("allTime=true".to_string());
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}
