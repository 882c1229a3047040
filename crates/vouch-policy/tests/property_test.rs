//! Property-based tests for quorum evaluation.

use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use vouch_policy::parse_policy;
use vouch_testing::{
    strategies::{policy_strategy, select, subset_mask_strategy},
    Invariants,
};

/// Creates property test configuration based on environment.
///
/// Uses environment variables:
/// - `PROPTEST_CASES`: Number of test cases (default: 20 for dev, 100 for CI)
/// - `CI`: If set to "true", uses CI configuration
fn proptest_config() -> ProptestConfig {
    let is_ci = std::env::var("CI").unwrap_or_default() == "true";
    let default_cases = if is_ci { 100 } else { 20 };

    let cases =
        std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(default_cases);

    ProptestConfig::with_cases(cases)
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Adding verified witnesses never un-satisfies a quorum.
    #[test]
    fn quorum_is_monotonic(
        generated in policy_strategy(),
        subset in subset_mask_strategy(),
        extra in subset_mask_strategy(),
    ) {
        let policy = parse_policy(generated.text.as_bytes()).unwrap();
        let small = select(&generated.witnesses, subset);
        let large = select(&generated.witnesses, subset | extra);

        Invariants::quorum_monotonic(&policy, &small, &large).unwrap();
    }

    /// Generated policies always parse and keep their structural invariants.
    #[test]
    fn generated_policies_are_well_formed(generated in policy_strategy()) {
        let policy = parse_policy(generated.text.as_bytes()).unwrap();

        prop_assert_eq!(policy.witnesses().len(), generated.witnesses.len());
        Invariants::quorum_witnesses_registered(&policy).unwrap();
        Invariants::thresholds_in_range(policy.quorum()).unwrap();
        Invariants::all_witnesses_satisfy(&policy).unwrap();
    }

    /// Arbitrary bytes never panic the parser.
    #[test]
    fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = parse_policy(&input);
    }

    /// Arbitrary keyword soup never panics the parser.
    #[test]
    fn parser_never_panics_on_structured_input(
        lines in prop::collection::vec(
            "(log|witness|group|quorum|none|any|all|w[0-3]|g[0-3]|[0-9]{1,2}|#| ){0,6}",
            0..12,
        ),
    ) {
        let _ = parse_policy(lines.join("\n").as_bytes());
    }
}
