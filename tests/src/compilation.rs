use regexp_compiler::{compile, CompileError, Regex};

#[test]
fn should_reject_malformed_patterns_with_distinct_errors() {
    let ten_groups = "(a)".repeat(10);

    let input_output = [
        ("a**", CompileError::NestedQuantifier),
        ("(unterminated", CompileError::UnmatchedParentheses),
        ("[unterminated", CompileError::UnmatchedBracket),
        (ten_groups.as_str(), CompileError::TooManyGroups),
    ];

    for (test_id, (input, expected_err)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, Err(expected_err)), (test_id, compile(input)));
    }
}

#[test]
fn should_render_errors_for_display() {
    let input_output = [
        (CompileError::NestedQuantifier, "nested *?+"),
        (CompileError::UnmatchedParentheses, "unmatched parentheses"),
        (CompileError::UnmatchedBracket, "unmatched []"),
        (CompileError::TooManyGroups, "too many parentheses"),
    ];

    for (test_id, (err, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected.to_string()), (test_id, err.to_string()));
    }
}

#[test]
fn should_leave_only_the_latest_pattern_observable() {
    let mut re = Regex::new("abc").unwrap();
    assert!(re.is_match("xxabcxx"));

    re.compile("x(y)z").unwrap();
    assert!(!re.is_match("xxabcxx"));

    let captures = re.find("wxyz").unwrap();
    assert_eq!(Some(1..4), captures.get(0).map(|m| m.range()));
    assert_eq!(Some(2..3), captures.get(1).map(|m| m.range()));
    assert_eq!(Regex::new("x(y)z").unwrap(), re);
}

#[test]
fn should_compile_identical_programs_for_identical_patterns() {
    let patterns = ["", "a", "^ab*c$", "(a|b)+[^x-z]?", "\\(.\\)"];

    for (test_id, pattern) in patterns.into_iter().enumerate() {
        let first = compile(pattern).unwrap();
        let second = compile(pattern).unwrap();

        assert_eq!((test_id, first.as_bytes()), (test_id, second.as_bytes()));
        assert_eq!((test_id, first.hints()), (test_id, second.hints()));
    }
}
