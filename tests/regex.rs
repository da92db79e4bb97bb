//! Integration tests seeded from the engine's documented scenario table.

use triregex::Regex;

#[test]
fn anchored_alternating_class_and_group_repetition() {
    let mut re = Regex::new(r"^([abc]+\d)*(a|b)+3\w2e").unwrap();
    assert!(re.is_match(b"a3b3c2e"));
    assert!(!re.is_match(b"ab32ab32e"));
}

#[test]
fn tail_anchored_bounded_group_repetition() {
    let mut re = Regex::new(r"(abc)+\d((ev){2,5})?$").unwrap();
    assert!(re.is_match(b"abc3evevev"));
    assert!(!re.is_match(b"abc3evevevevevev"));
}

#[test]
fn partial_match_with_negated_class() {
    let mut re = Regex::builder().partial_match(true).build(r"ab[^qwerty]vn").unwrap();
    assert!(!re.is_match(b"abqvn"));
    assert!(re.is_match(b"abgvn"));
}

#[test]
fn bounded_repetition_rejects_too_many_copies() {
    let mut re = Regex::new(r"(ab){2,4}").unwrap();
    assert!(re.is_match(b"abab"));
    assert!(!re.is_match(b"ababababab"));
}

#[cfg(feature = "backreferences")]
#[test]
fn back_references_must_match_captured_text_exactly() {
    let mut re = Regex::builder()
        .partial_match(false)
        .build(r"a(bc)(\0df)(g\1)e")
        .unwrap();
    let caps = re.captures(b"abcbcdfgbcdfe").unwrap();
    assert_eq!(&b"abcbcdfgbcdfe"[caps.get(0).unwrap().as_range()], b"bc");
    assert_eq!(&b"abcbcdfgbcdfe"[caps.get(1).unwrap().as_range()], b"bcdf");
    assert_eq!(&b"abcbcdfgbcdfe"[caps.get(2).unwrap().as_range()], b"gbcdf");
}

#[cfg(feature = "backreferences")]
#[test]
fn alternation_branch_is_reproduced_by_back_reference() {
    let mut re = Regex::builder().partial_match(false).build(r"(ming|dong)\0").unwrap();
    assert!(re.is_match(b"mingming"));
    assert!(!re.is_match(b"mingdong"));
}

#[test]
fn partial_match_is_equivalent_to_wrapping_in_dot_star() {
    let mut unanchored = Regex::builder().partial_match(true).build("needle").unwrap();
    let mut wrapped = Regex::builder().partial_match(false).build(".*needle.*").unwrap();
    for input in [&b"needle"[..], b"xxneedlexx", b"nee", b"xxx"] {
        assert_eq!(unanchored.is_match(input), wrapped.is_match(input), "input {:?}", input);
    }
}

#[test]
fn capture_spans_are_well_ordered_and_numbered_by_opening_paren() {
    let mut re = Regex::new(r"(a)(b(c))").unwrap();
    let caps = re.captures(b"abc").unwrap();
    for i in 0..caps.len() {
        if let Some(span) = caps.get(i) {
            assert!(span.end >= span.start);
        }
    }
    assert_eq!(caps.get(0).unwrap().as_range(), 0..1);
    assert_eq!(caps.get(1).unwrap().as_range(), 1..3);
    assert_eq!(caps.get(2).unwrap().as_range(), 2..3);
}

#[test]
fn one_or_more_group_does_not_absorb_the_trailing_literal() {
    let mut re = Regex::new(r"(a)+a").unwrap();
    let caps = re.captures(b"aa").unwrap();
    assert_eq!(caps.get(0).unwrap().as_range(), 0..1);
}

#[test]
fn alternation_with_an_empty_side_can_match_the_empty_string() {
    let mut re = Regex::new("a|").unwrap();
    assert!(re.is_match(b""));
    assert!(re.is_match(b"a"));
}

#[test]
fn group_count_matches_opening_parenthesis_count() {
    let re = Regex::new(r"(a(b))(c)").unwrap();
    assert_eq!(re.group_count(), 3);
}

#[test]
fn malformed_patterns_report_parse_errors() {
    assert!(Regex::new("(abc").is_err());
    assert!(Regex::new("abc)").is_err());
    assert!(Regex::new("a[bc").is_err());
    assert!(Regex::new("[z-a]").is_err());
    assert!(Regex::new("*abc").is_err());
}

#[test]
fn unmatched_bracket_is_reported_distinctly_from_unmatched_parenthesis() {
    use triregex::ParseErrorKind;
    assert_eq!(Regex::new("abc]").unwrap_err().kind(), &ParseErrorKind::UnmatchedBracket);
    assert_eq!(Regex::new("abc)").unwrap_err().kind(), &ParseErrorKind::UnmatchedParenthesis);
}

#[cfg(feature = "backreferences")]
#[test]
fn back_reference_to_an_unseen_group_is_a_parse_error() {
    assert!(Regex::new(r"(a)\5").is_err());
}
