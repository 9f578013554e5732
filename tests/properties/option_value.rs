//! Property tests for option value conversion.

use proptest::prelude::*;

use livebuild::options::{OptionAssignment, OptionValue};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Converting a token never panics and gives the same value twice.
    #[test]
    fn property_parse_is_total_and_deterministic(s in "(?s).{0,64}") {
        let first = OptionValue::parse(Some(&s));
        let second = OptionValue::parse(Some(&s));
        prop_assert_eq!(first, second);
    }

    /// PROPERTY: Integers written in decimal convert to themselves.
    #[test]
    fn property_integers_convert(n in any::<i64>()) {
        prop_assert_eq!(OptionValue::parse(Some(&n.to_string())), OptionValue::Int(n));
    }

    /// PROPERTY: Plain words without separators or quotes stay strings.
    #[test]
    fn property_words_stay_strings(word in "[a-z][a-z_-]{0,15}") {
        prop_assume!(word != "true" && word != "false");
        prop_assert_eq!(OptionValue::parse(Some(&word)), OptionValue::Str(word.clone()));
    }

    /// PROPERTY: A list never contains an empty string element.
    #[test]
    fn property_lists_have_no_empty_elements(s in "[a-z:]{1,32}") {
        if let OptionValue::List(items) = OptionValue::parse(Some(&s)) {
            for item in items {
                prop_assert_ne!(item, OptionValue::Str(String::new()));
            }
        }
    }

    /// PROPERTY: Assignment parsing returns a result for any input, never a panic.
    #[test]
    fn property_assignment_parse_never_panics(s in "(?s).{0,64}") {
        if let Ok(assignment) = OptionAssignment::parse(&s) {
            prop_assert!(!assignment.extension.is_empty());
            prop_assert!(!assignment.key.is_empty());
        }
    }
}
