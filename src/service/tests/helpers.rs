//! Pure layout helper tests: ordering, row assignment, hidden filtering.

use std::collections::HashSet;

use super::support::instance;
use crate::service::{
    apply_hidden_filter, apply_order_override, apply_row_overrides, LAYOUT_KEY,
};
use crate::{LayoutRow, WidgetInstance, WidgetSlot};

fn widgets(ids: &[&str]) -> Vec<WidgetInstance> {
    ids.iter()
        .map(|id| instance(id, "acme.widget.stats", "admin.dashboard.main"))
        .collect()
}

fn ids(widgets: &[WidgetInstance]) -> Vec<String> {
    widgets.iter().map(|w| w.id.clone()).collect()
}

fn order(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

#[test]
fn order_override_emits_named_ids_first_then_rest_in_store_order() {
    let result = apply_order_override(widgets(&["w1", "w2", "w3"]), &order(&["w2", "w1"]));
    assert_eq!(ids(&result), vec!["w2", "w1", "w3"]);
}

#[test]
fn order_override_skips_ids_not_in_live_set() {
    let result = apply_order_override(widgets(&["w1", "w2"]), &order(&["ghost", "w2"]));
    assert_eq!(ids(&result), vec!["w2", "w1"]);
}

#[test]
fn order_override_never_drops_instances() {
    let input = widgets(&["w1", "w2", "w3", "w4"]);
    let result = apply_order_override(input.clone(), &order(&["w3"]));
    assert_eq!(result.len(), input.len());
    let result_ids: HashSet<String> = ids(&result).into_iter().collect();
    let input_ids: HashSet<String> = ids(&input).into_iter().collect();
    assert_eq!(result_ids, input_ids);
}

#[test]
fn order_override_is_idempotent() {
    let override_ids = order(&["w2", "w1"]);
    let once = apply_order_override(widgets(&["w1", "w2", "w3"]), &override_ids);
    let twice = apply_order_override(once.clone(), &override_ids);
    assert_eq!(ids(&once), ids(&twice), "pure function of input + override");
}

#[test]
fn empty_order_override_is_identity() {
    let result = apply_order_override(widgets(&["w1", "w2"]), &[]);
    assert_eq!(ids(&result), vec!["w1", "w2"]);
}

#[test]
fn hidden_filter_result_is_a_subset_without_hidden_ids() {
    let input = widgets(&["w1", "w2", "w3"]);
    let hidden: HashSet<String> = ["w3".to_string()].into_iter().collect();
    let result = apply_hidden_filter(input.clone(), &hidden);

    assert!(result.len() <= input.len());
    assert_eq!(ids(&result), vec!["w1", "w2"]);
    assert!(result.iter().all(|w| !hidden.contains(&w.id)));
}

#[test]
fn hidden_filter_with_empty_set_is_identity() {
    let result = apply_hidden_filter(widgets(&["w1", "w2"]), &HashSet::new());
    assert_eq!(ids(&result), vec!["w1", "w2"]);
}

#[test]
fn row_overrides_assign_row_column_width_triples() {
    let mut input = widgets(&["w1", "w2", "w3"]);
    let rows = vec![
        LayoutRow {
            widgets: vec![
                WidgetSlot {
                    id: "w2".to_string(),
                    width: 4,
                },
                WidgetSlot {
                    id: "w1".to_string(),
                    width: 8,
                },
            ],
        },
        LayoutRow {
            widgets: vec![WidgetSlot {
                id: "w3".to_string(),
                width: 12,
            }],
        },
    ];
    apply_row_overrides(&mut input, &rows);

    assert_eq!(
        input[0].metadata[LAYOUT_KEY],
        serde_json::json!({"row": 0, "column": 1, "width": 8})
    );
    assert_eq!(
        input[1].metadata[LAYOUT_KEY],
        serde_json::json!({"row": 0, "column": 0, "width": 4})
    );
    assert_eq!(
        input[2].metadata[LAYOUT_KEY],
        serde_json::json!({"row": 1, "column": 0, "width": 12})
    );
}

#[test]
fn row_overrides_clamp_widths_into_bounds() {
    for bad_width in [-5, 0, 13, 100] {
        let mut input = widgets(&["w1"]);
        let rows = vec![LayoutRow {
            widgets: vec![WidgetSlot {
                id: "w1".to_string(),
                width: bad_width,
            }],
        }];
        apply_row_overrides(&mut input, &rows);
        let stored = input[0].metadata[LAYOUT_KEY]["width"]
            .as_i64()
            .expect("width stored");
        assert_eq!(stored, 12, "width {bad_width} clamps to 12");
    }
}

#[test]
fn row_overrides_ignore_unknown_ids() {
    let mut input = widgets(&["w1"]);
    let rows = vec![LayoutRow {
        widgets: vec![WidgetSlot {
            id: "ghost".to_string(),
            width: 6,
        }],
    }];
    apply_row_overrides(&mut input, &rows);
    assert!(!input[0].metadata.contains_key(LAYOUT_KEY));
}
