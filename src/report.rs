//! Timing reports and the before/after comparison
//!
//! A `BatteryReport` records what each explained query cost during one pass
//! of the battery. Two of them (without and with indexes) make a comparison.

use std::fmt;

use prettytable::{format, Cell, Row, Table};

use crate::plan::PlanSummary;

/// Result of explaining one battery query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTiming {
    pub label: String,
    pub plan: PlanSummary,
}

/// Timings of one pass over the battery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatteryReport {
    /// Whether indexes had been built before this pass
    pub with_indexes: bool,
    pub timings: Vec<QueryTiming>,
}

impl BatteryReport {
    pub fn new(with_indexes: bool) -> Self {
        BatteryReport {
            with_indexes,
            timings: Vec::new(),
        }
    }

    pub fn push(&mut self, label: &str, plan: PlanSummary) {
        self.timings.push(QueryTiming {
            label: label.to_string(),
            plan,
        });
    }

    /// Sum of the execution times the server reported
    pub fn total_millis(&self) -> i64 {
        self.timings.iter().filter_map(|t| t.plan.execution_millis).sum()
    }

    /// Number of queries whose winning plan used an index
    pub fn indexed_count(&self) -> usize {
        self.timings.iter().filter(|t| t.plan.has_index()).count()
    }

    /// Column heading for this pass's timings
    pub fn heading(&self) -> &'static str {
        if self.with_indexes {
            "indexed (ms)"
        } else {
            "no index (ms)"
        }
    }

    fn find(&self, label: &str) -> Option<&QueryTiming> {
        self.timings.iter().find(|t| t.label == label)
    }
}

/// Before/after view of two battery passes
pub struct Comparison<'a> {
    pub before: &'a BatteryReport,
    pub after: &'a BatteryReport,
}

impl<'a> Comparison<'a> {
    pub fn new(before: &'a BatteryReport, after: &'a BatteryReport) -> Self {
        Comparison { before, after }
    }

    /// How many times faster the second pass was; `None` when it took no measurable time
    pub fn speedup(&self) -> Option<f64> {
        let after = self.after.total_millis();
        if after <= 0 {
            return None;
        }
        Some(self.before.total_millis() as f64 / after as f64)
    }

    /// Per-query table, in the order of the first pass
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(Row::new(vec![
            Cell::new("query"),
            Cell::new(self.before.heading()),
            Cell::new(self.after.heading()),
            Cell::new("index"),
        ]));

        for timing in &self.before.timings {
            let after = self.after.find(&timing.label);
            table.add_row(Row::new(vec![
                Cell::new(&timing.label),
                Cell::new(&millis_cell(timing.plan.execution_millis)),
                Cell::new(&millis_cell(after.and_then(|t| t.plan.execution_millis))),
                Cell::new(after.and_then(|t| t.plan.index_name()).unwrap_or("-")),
            ]));
        }

        table.add_row(Row::new(vec![
            Cell::new("total"),
            Cell::new(&self.before.total_millis().to_string()),
            Cell::new(&self.after.total_millis().to_string()),
            Cell::new(""),
        ]));
        table
    }
}

impl fmt::Display for Comparison<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

fn millis_cell(millis: Option<i64>) -> String {
    millis.map(|ms| ms.to_string()).unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::AccessPath;

    fn plan(ms: Option<i64>, index: Option<&str>) -> PlanSummary {
        PlanSummary {
            execution_millis: ms,
            access: match index {
                Some(name) => AccessPath::Index(name.to_string()),
                None => AccessPath::Scan("COLLSCAN".to_string()),
            },
        }
    }

    fn passes() -> (BatteryReport, BatteryReport) {
        let mut before = BatteryReport::new(false);
        before.push("users aged 18", plan(Some(30), None));
        before.push("books by author", plan(Some(50), None));
        before.push("user by id", plan(None, None));

        let mut after = BatteryReport::new(true);
        after.push("users aged 18", plan(Some(2), Some("users_by_age")));
        after.push("books by author", plan(Some(3), Some("books_by_author")));
        after.push("user by id", plan(Some(0), Some("users_by_id")));
        (before, after)
    }

    #[test]
    fn test_totals_skip_unknown_times() {
        let (before, after) = passes();
        assert_eq!(before.total_millis(), 80);
        assert_eq!(after.total_millis(), 5);
        assert_eq!(before.indexed_count(), 0);
        assert_eq!(after.indexed_count(), 3);
    }

    #[test]
    fn test_heading_follows_pass() {
        let (before, after) = passes();
        assert_eq!(before.heading(), "no index (ms)");
        assert_eq!(after.heading(), "indexed (ms)");
    }

    #[test]
    fn test_speedup() {
        let (before, after) = passes();
        let speedup = Comparison::new(&before, &after).speedup().unwrap();
        assert!((speedup - 16.0).abs() < f64::EPSILON);

        let empty = BatteryReport::new(true);
        assert_eq!(Comparison::new(&before, &empty).speedup(), None);
    }

    #[test]
    fn test_table_rows() {
        let (before, after) = passes();
        let rendered = Comparison::new(&before, &after).to_string();

        assert!(rendered.contains("books by author"));
        assert!(rendered.contains("books_by_author"));
        assert!(rendered.contains("total"));
        assert!(rendered.contains("no index (ms)"));
        assert!(rendered.contains("indexed (ms)"));
        // 3 queries + total, titles excluded
        assert_eq!(Comparison::new(&before, &after).table().len(), 4);
    }
}
