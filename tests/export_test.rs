//! Tests for flat and nested exports

use rstest::{fixture, rstest};
use serde::Serialize;
use serde_json::{json, Value};

use listree::util::testing;
use listree::{ListTreeBuilder, NodeId, SortFn, Tree, TreeBuilder, TreeBuilderConfig};

#[fixture]
fn tree() -> Tree<Value> {
    testing::init_test_setup();
    let records = vec![
        json!({ "id": 1, "name": "root", "rank": 0 }),
        json!({ "id": 2, "fk": 1, "name": "b", "rank": 2 }),
        json!({ "id": 3, "fk": 1, "name": "a", "rank": 1 }),
        json!({ "id": 4, "fk": 2, "name": "c" }),
        json!({ "id": 5, "fk": 2, "name": "d", "rank": 1 }),
    ];
    ListTreeBuilder::new()
        .build_tree(&TreeBuilderConfig::new("fk"), records)
        .unwrap()
}

fn ids_of(list: &[listree::Fields]) -> Vec<Value> {
    list.iter().map(|f| f["id"].clone()).collect()
}

// ============================================================
// to_list
// ============================================================

#[rstest]
fn given_tree_when_listing_without_keys_then_full_payloads_preorder(tree: Tree<Value>) {
    let list = tree.to_list(None, None);

    assert_eq!(list.len(), 5);
    assert_eq!(ids_of(&list), vec![json!(1), json!(2), json!(4), json!(5), json!(3)]);
    assert_eq!(
        Value::Object(list[0].clone()),
        json!({ "id": 1, "name": "root", "rank": 0 })
    );
}

#[rstest]
fn given_keys_when_listing_then_only_those_keys(tree: Tree<Value>) {
    let list = tree.to_list(Some(&["id", "name"]), None);

    for entry in &list {
        assert!(entry.keys().all(|k| k == "id" || k == "name"));
    }
    assert_eq!(Value::Object(list[1].clone()), json!({ "id": 2, "name": "b" }));
}

#[rstest]
fn given_missing_key_when_listing_then_key_omitted(tree: Tree<Value>) {
    let list = tree.to_list(Some(&["rank"]), None);

    // node 4 has no rank
    assert_eq!(Value::Object(list[2].clone()), json!({}));
    assert!(!list[2].contains_key("rank"));
}

#[rstest]
fn given_sort_fn_when_listing_then_siblings_sorted_and_kept(tree: Tree<Value>) {
    let by_name = |a: &Tree<Value>, b: &Tree<Value>| {
        let a = a.data()["name"].as_str().map(str::to_string);
        let b = b.data()["name"].as_str().map(str::to_string);
        a.cmp(&b)
    };

    let sort_fn: SortFn<'_, Value> = &by_name;

    let list = tree.to_list(Some(&["id"]), Some(sort_fn));

    assert_eq!(ids_of(&list), vec![json!(1), json!(3), json!(2), json!(4), json!(5)]);
    // the sort is stored: a later unsorted traversal sees the new order
    let ids: Vec<NodeId> = [1, 3, 2, 4, 5].into_iter().map(NodeId::from).collect();
    assert_eq!(tree.to_list_id(), ids);
}

#[rstest]
fn given_equal_keys_when_sorting_then_order_is_stable(tree: Tree<Value>) {
    let list = tree.to_list_sorted_by_key(Some(&["id"]), |_| 0);

    assert_eq!(ids_of(&list), vec![json!(1), json!(2), json!(4), json!(5), json!(3)]);
}

#[rstest]
fn given_missing_sort_field_when_sorting_by_key_then_missing_first(tree: Tree<Value>) {
    // None < Some(_) in Option's ordering
    let list = tree.to_list_sorted_by_key(Some(&["id"]), |n| n.data()["rank"].as_i64());

    assert_eq!(ids_of(&list), vec![json!(1), json!(3), json!(2), json!(4), json!(5)]);
}

#[rstest]
fn given_subtree_when_listing_then_starts_at_subtree(tree: Tree<Value>) {
    let two = tree.find_node(&NodeId::from(2)).unwrap();

    let list = two.to_list(Some(&["id"]), None);

    assert_eq!(ids_of(&list), vec![json!(2), json!(4), json!(5)]);
}

// ============================================================
// get_child_list
// ============================================================

#[rstest]
fn given_node_when_listing_children_then_direct_children_only(tree: Tree<Value>) {
    let children = tree.get_child_list(None);

    assert_eq!(children.len(), 2);
    assert_eq!(ids_of(&children), vec![json!(2), json!(3)]);
    assert!(children.iter().all(|c| !c.contains_key("children")));
}

#[rstest]
fn given_leaf_when_listing_children_then_empty(tree: Tree<Value>) {
    let leaf = tree.find_node(&NodeId::from(4)).unwrap();

    assert!(leaf.get_child_list(Some(&["id"])).is_empty());
}

// ============================================================
// to_json
// ============================================================

#[rstest]
fn given_tree_when_exporting_json_then_nested_structure(tree: Tree<Value>) {
    let exported = tree.to_json("children");

    assert_eq!(
        exported,
        json!({
            "id": 1, "name": "root", "rank": 0,
            "children": [
                {
                    "id": 2, "fk": 1, "name": "b", "rank": 2,
                    "children": [
                        { "id": 4, "fk": 2, "name": "c" },
                        { "id": 5, "fk": 2, "name": "d", "rank": 1 }
                    ]
                },
                { "id": 3, "fk": 1, "name": "a", "rank": 1 }
            ]
        })
    );
}

#[rstest]
fn given_any_node_when_exporting_json_then_children_count_matches(tree: Tree<Value>) {
    for node in tree.iter() {
        let exported = node.to_json("children");
        match exported.get("children") {
            Some(Value::Array(children)) => assert_eq!(children.len(), node.len_children()),
            Some(other) => panic!("unexpected children value {}", other),
            None => assert!(node.is_leaf()),
        }
    }
}

#[test]
fn given_unsorted_payload_keys_when_exporting_then_field_order_kept() {
    let root = Tree::new(1, json!({ "zeta": 1, "alpha": 2 }));
    root.add_child(&Tree::new(2, json!({ "name": "leaf", "id": 2 })));

    let exported = serde_json::to_string(&root.to_json("children")).unwrap();
    assert_eq!(
        exported,
        r#"{"zeta":1,"alpha":2,"children":[{"name":"leaf","id":2}]}"#
    );

    let list = serde_json::to_string(&root.to_list(None, None)).unwrap();
    assert_eq!(list, r#"[{"zeta":1,"alpha":2},{"name":"leaf","id":2}]"#);
}

#[rstest]
fn given_custom_children_field_when_exporting_then_used(tree: Tree<Value>) {
    let exported = tree.to_json("nodes");

    assert!(exported.get("children").is_none());
    assert_eq!(exported["nodes"].as_array().map(Vec::len), Some(2));
}

#[test]
fn given_exported_json_when_modified_then_tree_unchanged() {
    let tree = Tree::new(1, json!({ "id": 1, "name": "root" }));

    let mut exported = tree.to_json("children");
    exported["name"] = json!("changed");

    assert_eq!(tree.data()["name"], json!("root"));
}

#[test]
fn given_struct_payload_when_exporting_then_serialized_fields() {
    #[derive(Serialize)]
    struct Folder {
        id: u32,
        path: String,
    }

    let root = Tree::new(1, Folder { id: 1, path: "/".into() });
    root.add_child(&Tree::new(2, Folder { id: 2, path: "/etc".into() }));

    assert_eq!(
        root.to_json("children"),
        json!({ "id": 1, "path": "/", "children": [{ "id": 2, "path": "/etc" }] })
    );
    let list = root.to_list(Some(&["path"]), None);
    assert_eq!(list[1]["path"], json!("/etc"));
}

#[test]
fn given_scalar_payload_when_exporting_then_no_fields() {
    let root = Tree::new(1, 42_u8);
    root.add_child(&Tree::new(2, 7_u8));

    assert_eq!(root.to_json("children"), json!({ "children": [{}] }));
    assert_eq!(root.to_list(None, None).len(), 2);
}
