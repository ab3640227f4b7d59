use std::collections::HashSet;

use pretty_assertions::assert_eq;
use transitivity::{EdgeEntry, EdgeList, Error, TransitiveRelation};

fn sample() -> TransitiveRelation<String> {
    let mut r = TransitiveRelation::new();
    for (s, o) in [("a", "b"), ("b", "c"), ("a", "d"), ("c", "a"), ("e", "f")] {
        r.relate(s.to_string(), o.to_string()).unwrap();
    }
    r
}

#[test]
fn edge_list_holds_only_direct_edges() {
    let list = sample().to_edge_list();
    let mut edges: Vec<(String, String)> =
        list.edges().map(|(s, o)| (s.clone(), o.clone())).collect();
    edges.sort();
    let expected: Vec<(String, String)> =
        [("a", "b"), ("a", "d"), ("b", "c"), ("c", "a"), ("e", "f")]
            .into_iter()
            .map(|(s, o)| (s.to_string(), o.to_string()))
            .collect();
    assert_eq!(edges, expected);
    assert!(list.0.iter().all(|entry| !entry.related.is_empty()));
}

#[test]
fn json_round_trip_preserves_the_relation() {
    let original = sample();
    let json = original.to_json().unwrap();
    let restored: TransitiveRelation<String> = TransitiveRelation::from_json(&json).unwrap();

    let names = ["a", "b", "c", "d", "e", "f", "g"].map(String::from);
    for x in &names {
        for y in &names {
            assert_eq!(original.are_related(x, y), restored.are_related(x, y), "{x} -> {y}");
            assert_eq!(
                original.are_directly_related(x, y),
                restored.are_directly_related(x, y),
                "direct {x} -> {y}"
            );
        }
    }
    let pairs = |r: &TransitiveRelation<String>| -> HashSet<(String, String)> {
        r.to_edge_list().edges().map(|(s, o)| (s.clone(), o.clone())).collect()
    };
    assert_eq!(pairs(&restored), pairs(&original));
}

#[test]
fn json_layout_is_a_list_of_subjects() {
    let mut r = TransitiveRelation::new();
    r.relate(2, 3).unwrap();
    r.relate(1, 2).unwrap();
    r.relate(1, 3).unwrap();
    let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            { "subject": 2, "related": [3] },
            { "subject": 1, "related": [2, 3] },
        ])
    );
}

#[test]
fn edge_list_replays_in_order() {
    let list = EdgeList(vec![
        EdgeEntry { subject: 'x', related: vec!['y', 'z'] },
        EdgeEntry { subject: 'z', related: vec!['x'] },
    ]);
    let r = TransitiveRelation::from_edge_list(list).unwrap();
    assert!(r.are_related(&'y', &'y'));
    assert!(r.are_related(&'z', &'y'));
    assert!(!r.are_related(&'y', &'x'));
}

#[test]
fn malformed_json_is_reported() {
    let err = TransitiveRelation::<u32>::from_json("{\"subject\": 1}").unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
