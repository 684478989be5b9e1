//! Merge, comment and concurrency behaviour of the metadata store.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use codebase_view_mcp::metadata::{LineRange, MetadataStore, NewComment, TestReference};

fn test_ref(file: &str, name: &str, comment: &str) -> TestReference {
    TestReference {
        test_file: file.to_string(),
        test_name: name.to_string(),
        comment: Some(comment.to_string()),
        line_range: LineRange::new(1, 10),
        covered_lines: LineRange::new(20, 30),
        input_lines: None,
        output_lines: None,
    }
}

fn note(line: u32, content: &str) -> NewComment {
    NewComment {
        line,
        content: content.to_string(),
        ..NewComment::default()
    }
}

// =============================================================================
// Test Metadata
// =============================================================================

#[test]
fn test_union_with_later_batch_winning() {
    let store = MetadataStore::in_memory();
    let first = vec![
        test_ref("a_test.go", "TestA", "v1"),
        test_ref("a_test.go", "TestB", "v1"),
    ];
    let second = vec![
        test_ref("a_test.go", "TestB", "v2"),
        test_ref("b_test.go", "TestB", "v2"),
    ];

    store.add_test_metadata("a.go", first).unwrap();
    store.add_test_metadata("a.go", second).unwrap();

    let tests = store.get_test_metadata("a.go").unwrap().tests;
    let keyed: HashSet<_> = tests
        .iter()
        .map(|t| (t.test_file.as_str(), t.test_name.as_str(), t.comment.as_deref()))
        .collect();

    let expected: HashSet<_> = [
        ("a_test.go", "TestA", Some("v1")),
        ("a_test.go", "TestB", Some("v2")),
        ("b_test.go", "TestB", Some("v2")),
    ]
    .into_iter()
    .collect();

    assert_eq!(keyed, expected);
}

#[test]
fn test_resubmission_replaces_whole_entry() {
    let store = MetadataStore::in_memory();
    let mut original = test_ref("a_test.go", "TestA", "old");
    original.input_lines = Some(LineRange::new(2, 3));
    store.add_test_metadata("a.go", vec![original]).unwrap();

    store
        .add_test_metadata("a.go", vec![test_ref("a_test.go", "TestA", "new")])
        .unwrap();

    let tests = store.get_test_metadata("a.go").unwrap().tests;
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].comment.as_deref(), Some("new"));
    assert!(tests[0].input_lines.is_none());
}

#[test]
fn test_set_empty_clears_tests() {
    let store = MetadataStore::in_memory();
    store
        .add_test_metadata("a.go", vec![test_ref("a_test.go", "TestA", "c")])
        .unwrap();
    store.set_test_metadata("a.go", Vec::new()).unwrap();

    assert!(store.get_test_metadata("a.go").unwrap().tests.is_empty());
}

#[test]
fn test_paths_are_not_normalised() {
    let store = MetadataStore::in_memory();
    store
        .add_test_metadata("./a.go", vec![test_ref("a_test.go", "TestA", "c")])
        .unwrap();

    assert!(store.get_test_metadata("a.go").is_none());
    assert!(store.get_test_metadata("./a.go").is_some());
}

// =============================================================================
// Comments
// =============================================================================

#[test]
fn test_added_comment_gets_fresh_id() {
    let store = MetadataStore::in_memory();
    let first = store.add_comment("a.go", note(1, "one")).unwrap();
    let second = store.add_comment("a.go", note(1, "one")).unwrap();

    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);
    assert_eq!(second.created_at, second.updated_at);

    let comments = store.get_comments("a.go");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1].id, second.id);
}

#[test]
fn test_update_bumps_updated_at() {
    let store = MetadataStore::in_memory();
    let comment = store.add_comment("a.go", note(4, "draft")).unwrap();

    assert!(store.update_comment("a.go", &comment.id, "x").unwrap());

    let updated = &store.get_comments("a.go")[0];
    assert_eq!(updated.content, "x");
    assert!(updated.updated_at > comment.updated_at);
    assert_eq!(updated.created_at, comment.created_at);
    assert_eq!(updated.id, comment.id);
}

#[test]
fn test_update_absent_id_leaves_sequence_unchanged() {
    let store = MetadataStore::in_memory();
    store.add_comment("a.go", note(4, "keep")).unwrap();
    let before = store.get_comments("a.go");

    assert!(!store.update_comment("a.go", "no-such-id", "x").unwrap());
    assert!(!store.delete_comment("a.go", "no-such-id").unwrap());
    assert!(!store.toggle_comment_resolved("a.go", "no-such-id").unwrap());

    assert_eq!(store.get_comments("a.go"), before);
}

#[test]
fn test_toggle_twice_restores_flag() {
    let store = MetadataStore::in_memory();
    let comment = store.add_comment("a.go", note(2, "flaky?")).unwrap();

    store.toggle_comment_resolved("a.go", &comment.id).unwrap();
    assert!(store.get_comments("a.go")[0].resolved);

    store.toggle_comment_resolved("a.go", &comment.id).unwrap();
    let after = &store.get_comments("a.go")[0];
    assert!(!after.resolved);
    assert!(after.updated_at > comment.updated_at);
}

#[test]
fn test_delete_removes_only_target() {
    let store = MetadataStore::in_memory();
    let keep = store.add_comment("a.go", note(1, "keep")).unwrap();
    let drop = store.add_comment("a.go", note(2, "drop")).unwrap();

    assert!(store.delete_comment("a.go", &drop.id).unwrap());

    let comments = store.get_comments("a.go");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, keep.id);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_writers_are_serialised() {
    let store = Arc::new(MetadataStore::in_memory());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .add_comment("shared.rs", note(i, &format!("worker {worker} note {i}")))
                        .unwrap();
                    store
                        .add_test_metadata(
                            "shared.rs",
                            vec![test_ref("shared_test.rs", &format!("t{worker}_{i}"), "c")],
                        )
                        .unwrap();
                    let _ = store.get_comments("shared.rs");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let comments = store.get_comments("shared.rs");
    assert_eq!(comments.len(), 200);
    let ids: HashSet<_> = comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), 200);

    let tests = store.get_test_metadata("shared.rs").unwrap().tests;
    assert_eq!(tests.len(), 200);
}
