use regexp_compiler::{compile, Regex};
use regexp_runtime::{run, MatchError, SaveGroupSlot};

fn find_range(pattern: &str, input: &str) -> Option<std::ops::Range<usize>> {
    let re = Regex::new(pattern).unwrap();
    re.find(input)
        .and_then(|captures| captures.get(0))
        .map(|m| m.range())
}

#[test]
fn should_match_leftmost_occurrence() {
    let input_output = [
        ("abc", "abc", Some(0..3)),
        ("abc", "xxabcabc", Some(2..5)),
        ("b", "abc", Some(1..2)),
        ("abc", "ab", None),
        ("a.c", "xxabcxx", Some(2..5)),
        ("", "abc", Some(0..0)),
        ("x*", "", Some(0..0)),
        ("a|b", "xxbxa", Some(2..3)),
        ("\\.", "a.b", Some(1..2)),
        // a leading star yields a required literal, checked before any attempt.
        (".*abc", "xxabxx", None),
        (".*abc", "xabcx", Some(0..4)),
        ("x*abc.de", "xxabcyde", Some(0..8)),
        ("x*abc.de", "xxabyde", None),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find_range(pattern, input)));
    }
}

#[test]
fn should_only_match_anchors_at_input_boundaries() {
    let input_output = [
        ("^ab", "abab", Some(0..2)),
        ("^ab", "xab", None),
        ("ab$", "abab", Some(2..4)),
        ("ab$", "abx", None),
        ("^$", "", Some(0..0)),
        ("^$", "a", None),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find_range(pattern, input)));
    }
}

#[test]
fn should_match_greedily() {
    let input_output = [
        ("a*", "aaab", Some(0..3)),
        ("a+", "baaab", Some(1..4)),
        ("a*b", "aaab", Some(0..4)),
        ("a*ab", "aaab", Some(0..4)),
        ("(ab)*", "ababx", Some(0..4)),
        ("(ab)+c", "xababc", Some(1..6)),
        ("ab?c", "acabc", Some(0..2)),
        (".*c", "abcabc", Some(0..6)),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find_range(pattern, input)));
    }
}

#[test]
fn should_populate_capture_groups() {
    let program = compile("(a)(b)").unwrap();
    let captures = run(&program, "ab").unwrap().unwrap();

    assert_eq!(
        [
            SaveGroupSlot::complete(0, 2),
            SaveGroupSlot::complete(0, 1),
            SaveGroupSlot::complete(1, 2),
            SaveGroupSlot::None,
        ],
        [
            captures.slot(0),
            captures.slot(1),
            captures.slot(2),
            captures.slot(3)
        ]
    );
    assert_eq!(Some(&b"a"[..]), captures.get(1).map(|m| m.as_bytes()));
    assert_eq!(Some(&b"b"[..]), captures.get(2).map(|m| m.as_bytes()));
}

#[test]
fn should_prefer_the_first_listed_alternative() {
    let re = Regex::new("(a|ab)").unwrap();
    let captures = re.find("ab").unwrap();

    assert_eq!(Some(&b"a"[..]), captures.get(0).map(|m| m.as_bytes()));
    assert_eq!(Some(&b"a"[..]), captures.get(1).map(|m| m.as_bytes()));
}

#[test]
fn should_leave_groups_outside_the_taken_alternative_unset() {
    let re = Regex::new("(a)|(b)").unwrap();
    let captures = re.find("b").unwrap();

    assert_eq!(None, captures.get(1));
    assert_eq!(Some(0..1), captures.get(2).map(|m| m.range()));
}

#[test]
fn should_record_last_iteration_of_repeated_group() {
    let re = Regex::new("(a|b)*c").unwrap();
    let captures = re.find("abac").unwrap();

    assert_eq!(Some(0..4), captures.get(0).map(|m| m.range()));
    assert_eq!(Some(2..3), captures.get(1).map(|m| m.range()));
}

#[test]
fn should_match_bracket_expressions() {
    let negated = Regex::new("[^abc]").unwrap();
    for input in ["a", "b", "c", ""] {
        assert!(!negated.is_match(input), "{:?}", input);
    }
    for input in ["d", "z", "A", "-", "]"] {
        assert!(negated.is_match(input), "{:?}", input);
    }

    let input_output = [
        ("[a-c]+", "xxbcaz", Some(2..5)),
        ("[]x]", "a]", Some(1..2)),
        ("[x-]+", "a-x-", Some(1..4)),
        ("[0-9][0-9]*", "ab123c", Some(2..5)),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find_range(pattern, input)));
    }
}

#[test]
fn should_match_non_utf8_haystacks() {
    let re = Regex::new("b.d").unwrap();
    let captures = re.find(&[b'a', b'b', 0xff, b'd'][..]).unwrap();

    assert_eq!(Some(1..4), captures.get(0).map(|m| m.range()));
}

#[test]
fn should_share_a_program_across_threads() {
    let program = compile("(a|b)+c").unwrap();
    let inputs = ["abc", "xxbbc", "c", "bac"];

    std::thread::scope(|s| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let program = &program;
                s.spawn(move || {
                    run(program, input)
                        .unwrap()
                        .map(|captures| captures.slot(0))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            vec![
                Some(SaveGroupSlot::complete(0, 3)),
                Some(SaveGroupSlot::complete(2, 5)),
                None,
                Some(SaveGroupSlot::complete(0, 3)),
            ],
            results
        );
    });
}

#[test]
fn should_bound_recursion_of_complex_repetition() {
    let re = Regex::new("(a|b)*").unwrap();

    let short = "ab".repeat(50);
    assert_eq!(
        Some(0..100),
        re.find(short.as_str())
            .and_then(|captures| captures.get(0))
            .map(|m| m.range())
    );

    let long = "ab".repeat(20_000);
    assert_eq!(
        Err(MatchError::RecursionLimitExceeded),
        re.try_find(long.as_str()).map(|c| c.map(|c| c.slot(0)))
    );
    assert!(re.find(long.as_str()).is_none());
}

#[test]
fn should_treat_nul_in_haystack_as_an_ordinary_byte() {
    let input_output = [
        ("a$", "a\0", None),
        ("a.", "a\0b", Some(0..2)),
        ("[^x]b", "\0b", Some(0..2)),
        ("b$", "a\0b", Some(2..3)),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find_range(pattern, input)));
    }
}
