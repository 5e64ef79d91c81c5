//! Property-based tests for the UL2.0 grammar.

use proptest::prelude::*;
use ulprims_codec::{
    encode_command, encode_measures, encode_result, parse_command, parse_measures, parse_result,
    CommandInvocation, CommandResult, MeasureGroup,
};

/// A non-empty token free of UL2.0 separators.
fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.:-]{1,8}"
}

fn group() -> impl Strategy<Value = MeasureGroup> {
    prop::collection::vec((token(), token()), 1..6).prop_map(MeasureGroup::from_iter)
}

proptest! {
    #[test]
    fn prop_measures_roundtrip(groups in prop::collection::vec(group(), 1..5)) {
        let wire = encode_measures(&groups);
        let parsed = parse_measures(&wire).expect("encoded measures should parse");
        prop_assert_eq!(&parsed, &groups);
        prop_assert_eq!(encode_measures(&parsed), wire);
    }
}

proptest! {
    #[test]
    fn prop_command_roundtrip(
        device in token(),
        command in token(),
        params in prop::collection::btree_map(token(), "[A-Za-z0-9_.:-]{0,8}", 0..5),
    ) {
        let invocation = CommandInvocation { device_id: device, command, params };
        let wire = encode_command(&invocation);
        prop_assert_eq!(parse_command(&wire).expect("encoded command should parse"), invocation);
    }
}

proptest! {
    #[test]
    fn prop_result_roundtrip(device in token(), command in token(), result in token()) {
        let report = CommandResult { device_id: device, command, result };
        let wire = encode_result(&report);
        prop_assert_eq!(parse_result(&wire).expect("encoded result should parse"), report);
    }
}

proptest! {
    #[test]
    fn prop_measure_parser_never_panics(payload in "[a-z0-9=|#@]{0,32}") {
        let _ = parse_measures(&payload);
    }
}
