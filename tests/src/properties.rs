use quickcheck::{QuickCheck, TestResult};
use regexp_compiler::{compile, Regex};

const META: &str = "^$.[()|?+*\\";

/// Escapes every metacharacter so the pattern matches `literal` verbatim.
fn escape(literal: &str) -> String {
    literal
        .chars()
        .flat_map(|c| match META.contains(c) {
            true => vec!['\\', c],
            false => vec![c],
        })
        .collect()
}

/// Maps arbitrary bytes onto lowercase ASCII letters.
fn lowercase(bytes: &[u8]) -> String {
    bytes.iter().map(|b| (b'a' + b % 26) as char).collect()
}

#[test]
fn should_match_escaped_literal_at_its_leftmost_occurrence() {
    fn prop(prefix: String, literal: String, suffix: String) -> TestResult {
        if [&prefix, &literal, &suffix].iter().any(|s| s.contains('\0')) {
            return TestResult::discard();
        }

        let re = match Regex::new(escape(&literal).as_str()) {
            Ok(re) => re,
            Err(_) => return TestResult::failed(),
        };
        let haystack = format!("{}{}{}", prefix, literal, suffix);
        let expected = haystack
            .find(literal.as_str())
            .map(|start| start..start + literal.len());

        let found = re
            .find(haystack.as_str())
            .and_then(|captures| captures.get(0))
            .map(|m| m.range());
        TestResult::from_bool(found == expected)
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(String, String, String) -> TestResult);
}

#[test]
fn should_compile_deterministically() {
    fn prop(pattern: String) -> bool {
        compile(pattern.as_str()) == compile(pattern.as_str())
    }

    QuickCheck::new().quickcheck(prop as fn(String) -> bool);
}

#[test]
fn should_never_match_anchored_pattern_past_offset_zero() {
    fn prop(literal: Vec<u8>, haystack: Vec<u8>) -> bool {
        let pattern = format!("^{}", lowercase(&literal));
        let haystack = lowercase(&haystack);

        match Regex::new(pattern.as_str()) {
            Ok(re) => re
                .find(haystack.as_str())
                .and_then(|captures| captures.get(0))
                .map_or(true, |m| m.start() == 0),
            Err(_) => false,
        }
    }

    QuickCheck::new().quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> bool);
}

#[test]
fn should_find_identical_results_on_repeated_searches() {
    fn prop(literal: Vec<u8>, haystack: Vec<u8>) -> bool {
        let pattern = format!("({})*z", lowercase(&literal));
        let haystack = lowercase(&haystack);

        let re = match Regex::new(pattern.as_str()) {
            Ok(re) => re,
            // an empty literal leaves the star without an operand.
            Err(_) => return literal.is_empty(),
        };

        let spans = |re: &Regex| {
            re.find(haystack.as_str())
                .map(|captures| captures.iter().map(|m| m.map(|m| m.range())).collect::<Vec<_>>())
        };
        spans(&re) == spans(&re)
    }

    QuickCheck::new().quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> bool);
}
