use triregex::Regex;

fn main() {
    let mut re = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
    assert!(re.is_match(b"2010-03-14"));
    assert!(!re.is_match(b"2010-3-14"));

    let mut re = Regex::new(r"(abc)+\d((ev){2,5})?$").unwrap();
    let caps = re.captures(b"abc3evevev").unwrap();
    assert_eq!(caps.get(0).unwrap().as_range(), 0..3);
    assert_eq!(caps.get(1).unwrap().as_range(), 4..10);

    // Unanchored (partial_match) is the default: the pattern may match
    // anywhere in the input.
    let mut re = Regex::builder().build(r"ab[^qwerty]vn").unwrap();
    assert!(!re.is_match(b"xxabqvnxx"));
    assert!(re.is_match(b"xxabgvnxx"));

    // With the `backreferences` feature, `\0`..`\99` matches whatever text
    // that numbered group matched earlier in the pattern.
    let mut re = Regex::builder()
        .partial_match(false)
        .build(r"^(\w+)=\1$")
        .unwrap();
    assert!(re.is_match(b"echo=echo"));
    assert!(!re.is_match(b"echo=shout"));
}
