//! Integration tests for quorum evaluation through parsed policies.

use std::collections::HashSet;

use vouch_core::{KeyHash, Signer};
use vouch_policy::{parse_policy, Entity, PolicyBuilder, PolicyError, Threshold};
use vouch_testing::{log_signer, witness_signer, PolicyTextBuilder};

fn witnesses(count: usize) -> Vec<KeyHash> {
    (0..count).map(|i| witness_signer(i).key_hash()).collect()
}

fn with_witnesses(count: usize) -> PolicyTextBuilder {
    (0..count).fold(
        PolicyTextBuilder::new().log(&log_signer().public_key(), None),
        |builder, i| builder.witness(&format!("w{i}"), &witness_signer(i).public_key(), None),
    )
}

fn set(hashes: &[KeyHash], indices: &[usize]) -> HashSet<KeyHash> {
    indices.iter().map(|&i| hashes[i]).collect()
}

#[test]
fn three_of_four_threshold() {
    let text = with_witnesses(4)
        .group("q", 3, &["w0", "w1", "w2", "w3"])
        .quorum("q")
        .build();
    let policy = parse_policy(text.as_bytes()).unwrap();
    let w = witnesses(4);

    assert!(policy.is_quorum_satisfied(&set(&w, &[0, 1, 2])));
    assert!(!policy.is_quorum_satisfied(&set(&w, &[0, 1])));
    assert!(policy.is_quorum_satisfied(&set(&w, &[0, 1, 2, 3])));
}

#[test]
fn nested_any_groups() {
    let text = with_witnesses(6)
        .group("g0", "any", &["w0", "w1"])
        .group("g1", "any", &["w2", "w3"])
        .group("g2", "any", &["g1", "w4", "w5"])
        .group("root", "any", &["g0", "g2"])
        .quorum("root")
        .build();
    let policy = parse_policy(text.as_bytes()).unwrap();
    let w = witnesses(6);

    assert!(policy.is_quorum_satisfied(&set(&w, &[0])));
    assert!(policy.is_quorum_satisfied(&set(&w, &[0, 4])));
    assert!(policy.is_quorum_satisfied(&set(&w, &[3])));
    assert!(!policy.is_quorum_satisfied(&set(&w, &[])));
}

#[test]
fn nested_all_requires_both_branches() {
    let text = with_witnesses(6)
        .group("g0", "any", &["w0", "w1"])
        .group("g1", "any", &["w2", "w3"])
        .group("g2", "any", &["g1", "w4", "w5"])
        .group("root", "all", &["g0", "g2"])
        .quorum("root")
        .build();
    let policy = parse_policy(text.as_bytes()).unwrap();
    let w = witnesses(6);

    assert!(!policy.is_quorum_satisfied(&set(&w, &[0])));
    assert!(policy.is_quorum_satisfied(&set(&w, &[0, 4])));
    assert!(policy.is_quorum_satisfied(&set(&w, &[1, 2])));
    assert!(!policy.is_quorum_satisfied(&set(&w, &[4, 5])));
}

#[test]
fn witness_cannot_join_two_groups() {
    let text = with_witnesses(3)
        .group("a", "any", &["w0", "w1"])
        .group("b", "any", &["w0", "w2"])
        .group("root", 2, &["a", "b"])
        .quorum("root")
        .build();

    let err = parse_policy(text.as_bytes()).unwrap_err();

    assert_eq!(err.line(), Some(6));
    assert_eq!(
        err.root(),
        &PolicyError::AlreadyMember { member: "w0".to_string(), group: "a".to_string() }
    );
}

#[test]
fn group_cannot_join_two_groups() {
    let text = with_witnesses(3)
        .group("a", "any", &["w0", "w1"])
        .group("b", "any", &["a", "w2"])
        .group("c", "any", &["a"])
        .quorum("b")
        .build();

    let err = parse_policy(text.as_bytes()).unwrap_err();

    assert_eq!(err.code(), "E3008");
}

#[test]
fn duplicate_witness_key_poisons_builder() {
    let key = witness_signer(0).public_key();
    let mut builder = PolicyBuilder::new();
    builder.add_witness("first", Entity::new(key, None)).unwrap();

    let err = builder.add_witness("second", Entity::new(key, None)).unwrap_err();
    assert_eq!(err.code(), "E3004");

    assert_eq!(
        builder.add_group("g", Threshold::Any, &["first"]),
        Err(PolicyError::BuilderPoisoned)
    );
    assert_eq!(builder.build().unwrap_err(), PolicyError::BuilderPoisoned);
}

#[test]
fn duplicate_witness_key_in_text() {
    let key = witness_signer(0).public_key();
    let text = PolicyTextBuilder::new()
        .witness("first", &key, None)
        .witness("second", &key, Some("https://w.example/"))
        .quorum("first")
        .build();

    let err = parse_policy(text.as_bytes()).unwrap_err();

    assert_eq!(err.line(), Some(2));
    assert_eq!(err.code(), "E3004");
}

#[test]
fn same_key_may_be_log_and_witness() {
    let key = log_signer().public_key();
    let text =
        PolicyTextBuilder::new().log(&key, None).witness("w", &key, None).quorum("w").build();

    let policy = parse_policy(text.as_bytes()).unwrap();

    assert!(policy.log(&key.key_hash()).is_some());
    assert!(policy.witness(&key.key_hash()).is_some());
}
