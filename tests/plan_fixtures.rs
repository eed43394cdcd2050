//! Recorded `explain` outputs run through the plan heuristic

use bson::{Bson, Document};
use docbench::{interpret_plan, AccessPath};

fn fixture(json: &str) -> Document {
    let value: serde_json::Value = serde_json::from_str(json).expect("fixture is valid JSON");
    match Bson::try_from(value).expect("fixture is valid extended JSON") {
        Bson::Document(doc) => doc,
        other => panic!("fixture is not a document: {:?}", other),
    }
}

#[test]
fn collscan_without_index() {
    let plan = interpret_plan(&fixture(include_str!("fixtures/explain_collscan.json")));

    assert!(!plan.has_index());
    assert_eq!(plan.access, AccessPath::Scan("COLLSCAN".to_string()));
    assert_eq!(plan.execution_millis, Some(14));
}

#[test]
fn fetch_over_index_scan() {
    let plan = interpret_plan(&fixture(include_str!("fixtures/explain_fetch_ixscan.json")));

    assert!(plan.has_index());
    assert_eq!(plan.index_name(), Some("books_by_rating_value"));
    assert_eq!(plan.execution_millis, Some(3));
}

#[test]
fn projection_over_fetch_over_index_scan() {
    let plan = interpret_plan(&fixture(include_str!(
        "fixtures/explain_projection_fetch_ixscan.json"
    )));

    assert_eq!(plan.index_name(), Some("books_by_author"));
}

#[test]
fn slot_based_collscan() {
    let plan = interpret_plan(&fixture(include_str!("fixtures/explain_sbe_collscan.json")));

    assert_eq!(plan.access, AccessPath::Scan("COLLSCAN".to_string()));
    assert_eq!(plan.execution_millis, Some(21));
}

#[test]
fn slot_based_index_scan() {
    let plan = interpret_plan(&fixture(include_str!("fixtures/explain_sbe_ixscan.json")));

    assert_eq!(plan.index_name(), Some("users_by_city"));
    assert_eq!(plan.execution_millis, Some(1));
}
