//! Execution plan interpretation
//!
//! Turns the document returned by an `explain` command into a small
//! summary: how long the query took and whether it used an index.
//! Kept free of any connection so it can be checked against recorded plans.

use std::fmt;

use bson::Document;

use crate::value::get_i64;

/// Stage reported when the plan carries no winning plan at all
pub const UNKNOWN_STAGE: &str = "UNKNOWN_STATUS";

/// Number of `inputStage` hops inspected below the winning plan
const MAX_DEPTH: usize = 2;

/// How the optimizer chose to reach the documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPath {
    /// An index scan through the named index
    Index(String),
    /// No index: the deepest stage seen (usually `COLLSCAN`)
    Scan(String),
}

/// What an explained query tells us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    /// `executionStats.executionTimeMillis`, when the server reported it
    pub execution_millis: Option<i64>,
    /// Access path of the winning plan
    pub access: AccessPath,
}

impl PlanSummary {
    /// Whether the winning plan scans an index
    pub fn has_index(&self) -> bool {
        matches!(self.access, AccessPath::Index(_))
    }

    /// Name of the index used, if any
    pub fn index_name(&self) -> Option<&str> {
        match &self.access {
            AccessPath::Index(name) => Some(name),
            AccessPath::Scan(_) => None,
        }
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = match self.execution_millis {
            Some(ms) => format!("{} ms", ms),
            None => "unknown ms".to_string(),
        };
        match &self.access {
            AccessPath::Index(name) => write!(f, "INDEXED: time: {}, index: {}", time, name),
            AccessPath::Scan(stage) => write!(f, "No index: time: {}, stage: {}", time, stage),
        }
    }
}

/// Summarize an explain result.
///
/// Looks for an `indexName` on the winning plan and on up to two levels of
/// `inputStage` below it. This is a shallow heuristic: plans that bury the
/// index scan deeper (OR, SORT_MERGE...) are reported as scans.
pub fn interpret_plan(explain: &Document) -> PlanSummary {
    let execution_millis = explain
        .get_document("executionStats")
        .ok()
        .and_then(|stats| get_i64(stats, "executionTimeMillis"));

    PlanSummary {
        execution_millis,
        access: access_path(explain),
    }
}

fn access_path(explain: &Document) -> AccessPath {
    let winning = match explain
        .get_document("queryPlanner")
        .and_then(|planner| planner.get_document("winningPlan"))
    {
        Ok(plan) => plan,
        Err(_) => return AccessPath::Scan(UNKNOWN_STAGE.to_string()),
    };

    // Slot-based engine wraps the classic tree in `queryPlan`
    let mut node = winning.get_document("queryPlan").unwrap_or(winning);
    let mut stage = None;

    for depth in 0..=MAX_DEPTH {
        if let Ok(name) = node.get_str("indexName") {
            if !name.is_empty() {
                return AccessPath::Index(name.to_string());
            }
        }
        if let Ok(s) = node.get_str("stage") {
            stage = Some(s);
        }
        if depth == MAX_DEPTH {
            break;
        }
        match node.get_document("inputStage") {
            Ok(child) => node = child,
            Err(_) => break,
        }
    }

    AccessPath::Scan(stage.unwrap_or(UNKNOWN_STAGE).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn explain_with(winning_plan: Document) -> Document {
        doc! {
            "queryPlanner": { "namespace": "books.Book", "winningPlan": winning_plan },
            "executionStats": { "executionTimeMillis": 42, "nReturned": 3 },
        }
    }

    #[test]
    fn test_index_at_depth_one() {
        let plan = explain_with(doc! {
            "stage": "FETCH",
            "inputStage": { "stage": "IXSCAN", "indexName": "users_by_age" },
        });

        let summary = interpret_plan(&plan);
        assert!(summary.has_index());
        assert_eq!(summary.index_name(), Some("users_by_age"));
        assert_eq!(summary.execution_millis, Some(42));
    }

    #[test]
    fn test_index_at_depth_two() {
        let plan = explain_with(doc! {
            "stage": "PROJECTION_SIMPLE",
            "inputStage": {
                "stage": "FETCH",
                "inputStage": { "stage": "IXSCAN", "indexName": "books_by_author" },
            },
        });

        let summary = interpret_plan(&plan);
        assert_eq!(summary.access, AccessPath::Index("books_by_author".into()));
    }

    #[test]
    fn test_collection_scan() {
        let plan = explain_with(doc! {
            "stage": "PROJECTION_SIMPLE",
            "inputStage": { "stage": "COLLSCAN", "direction": "forward" },
        });

        let summary = interpret_plan(&plan);
        assert!(!summary.has_index());
        assert_eq!(summary.access, AccessPath::Scan("COLLSCAN".into()));
    }

    #[test]
    fn test_bare_collscan_winning_plan() {
        let plan = explain_with(doc! { "stage": "COLLSCAN", "direction": "forward" });
        assert_eq!(interpret_plan(&plan).access, AccessPath::Scan("COLLSCAN".into()));
    }

    #[test]
    fn test_index_below_two_levels_is_not_seen() {
        let plan = explain_with(doc! {
            "stage": "LIMIT",
            "inputStage": {
                "stage": "PROJECTION_SIMPLE",
                "inputStage": {
                    "stage": "FETCH",
                    "inputStage": { "stage": "IXSCAN", "indexName": "books_by_author" },
                },
            },
        });

        assert_eq!(interpret_plan(&plan).access, AccessPath::Scan("FETCH".into()));
    }

    #[test]
    fn test_query_plan_wrapper() {
        let plan = explain_with(doc! {
            "queryPlan": {
                "stage": "FETCH",
                "inputStage": { "stage": "IXSCAN", "indexName": "users_by_city" },
            },
            "slotBasedPlan": { "stages": "..." },
        });

        assert_eq!(interpret_plan(&plan).index_name(), Some("users_by_city"));
    }

    #[test]
    fn test_missing_sections() {
        let summary = interpret_plan(&doc! { "ok": 1.0 });
        assert_eq!(summary.execution_millis, None);
        assert_eq!(summary.access, AccessPath::Scan(UNKNOWN_STAGE.into()));
    }

    #[test]
    fn test_display() {
        let summary = PlanSummary {
            execution_millis: Some(7),
            access: AccessPath::Index("users_by_id".into()),
        };
        assert_eq!(summary.to_string(), "INDEXED: time: 7 ms, index: users_by_id");

        let summary = PlanSummary {
            execution_millis: None,
            access: AccessPath::Scan("COLLSCAN".into()),
        };
        assert_eq!(summary.to_string(), "No index: time: unknown ms, stage: COLLSCAN");
    }
}
