//! Run naming tests: unique-name suffixing and random tree names

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use trueno_runlog::run::{
    generate_random_name, generate_random_name_with, make_unique, POSITIVE_ADJECTIVES, TREE_NAMES,
};

fn names(list: &[&str]) -> HashSet<String> {
    list.iter().map(ToString::to_string).collect()
}

// =============================================================================
// make_unique Tests
// =============================================================================

#[test]
fn test_unique_no_collision() {
    assert_eq!(make_unique("new", &names(&["other"])), "new");
    assert_eq!(make_unique("new", &HashSet::new()), "new");
}

#[test]
fn test_unique_appends_suffix() {
    assert_eq!(make_unique("run", &names(&["run"])), "run-1");
}

#[test]
fn test_unique_increments_numeric_tail() {
    assert_eq!(make_unique("run-1", &names(&["run", "run-1"])), "run-2");
}

#[test]
fn test_unique_non_numeric_tail_gets_literal_one() {
    assert_eq!(make_unique("exp-a", &names(&["exp-a"])), "exp-a-1");
}

#[test]
fn test_unique_skips_taken_suffixes() {
    let existing = names(&["lush-oak-1", "lush-oak-2", "lush-oak-3", "lush-oak-5"]);
    assert_eq!(make_unique("lush-oak-1", &existing), "lush-oak-4");
}

#[test]
fn test_unique_is_exact_match() {
    assert_eq!(make_unique("Run", &names(&["run"])), "Run");
}

#[test]
fn test_unique_large_numeric_tail() {
    let big = "run-18446744073709551615";
    assert_eq!(make_unique(big, &names(&[big])), "run-18446744073709551616");
}

#[test]
fn test_unique_does_not_touch_inputs() {
    let existing = names(&["run"]);
    let _ = make_unique("run", &existing);
    assert_eq!(existing, names(&["run"]));
}

// =============================================================================
// generate_random_name Tests
// =============================================================================

fn assert_tree_name(name: &str, suffix: usize) {
    let parts: Vec<&str> = name.split('-').collect();
    assert_eq!(parts.len(), 3, "unexpected name {name}");
    assert!(POSITIVE_ADJECTIVES.contains(&parts[0]), "bad adjective in {name}");
    assert!(TREE_NAMES.contains(&parts[1]), "bad tree in {name}");
    assert_eq!(parts[2], suffix.to_string());
}

#[test]
fn test_random_name_empty_existing() {
    let empty: [&str; 0] = [];
    for _ in 0..50 {
        assert_tree_name(&generate_random_name(&empty), 1);
    }
}

#[test]
fn test_random_name_suffix_counts_existing() {
    let existing = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert_tree_name(&generate_random_name(&existing), 4);
}

#[test]
fn test_random_name_covers_word_lists() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen_trees = HashSet::new();
    let mut seen_adjectives = HashSet::new();
    for _ in 0..2000 {
        let name = generate_random_name_with(&mut rng, 0);
        let mut parts = name.split('-');
        seen_adjectives.insert(parts.next().unwrap_or_default().to_string());
        seen_trees.insert(parts.next().unwrap_or_default().to_string());
    }
    assert_eq!(seen_trees.len(), TREE_NAMES.len());
    assert_eq!(seen_adjectives.len(), POSITIVE_ADJECTIVES.len());
}

#[test]
fn test_random_name_through_make_unique() {
    let mut rng = StdRng::seed_from_u64(1);
    let candidate = generate_random_name_with(&mut rng, 0);
    let existing = names(&[candidate.as_str()]);
    let unique = make_unique(&candidate, &existing);
    assert_ne!(unique, candidate);
    assert!(unique.ends_with("-2"));
}
