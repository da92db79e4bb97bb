/*!
A byte-oriented regular expression engine with capture groups and
back-references.

Matching is 8-bit and byte-indexed — there is no Unicode-aware matching, no
look-around, no named groups, and no non-greedy quantifiers. What it does
support:

- literals, `.`, `^`, `$`
- `\s`, `\w`, `\d` and character classes `[...]`/`[^...]`
- repetition `*`, `+`, `?`, `{m}`, `{m,}`, `{,n}`, `{m,n}`
- alternation `a|b`
- capture groups `(...)`, and, with the `backreferences` feature (on by
  default), back-references `\0`..`\99`

See the [`regex`] module for the full syntax and the [`Regex`] type for the
public API.

## Usage
```
use triregex::Regex;

let mut re = Regex::new(r"^([abc]+\d)*(a|b)+3\w2e").unwrap();
assert!(re.is_match(b"a3b3c2e"));
assert!(!re.is_match(b"ab32ab32e"));
```

## Crate features
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod captures;
pub mod error;
pub mod regex;

pub use captures::{Captures, Span};
pub use error::{ParseError, ParseErrorKind};
pub use regex::Regex;

#[cfg(test)]
mod tests {
    use crate::Regex;

    #[test]
    fn seed_scenarios_from_the_matrix() {
        let mut re = Regex::new(r"^([abc]+\d)*(a|b)+3\w2e").unwrap();
        assert!(re.is_match(b"a3b3c2e"));
        assert!(!re.is_match(b"ab32ab32e"));

        let mut re = Regex::new(r"(abc)+\d((ev){2,5})?$").unwrap();
        assert!(re.is_match(b"abc3evevev"));
        assert!(!re.is_match(b"abc3evevevevevev"));

        let mut re = Regex::builder().partial_match(true).build(r"ab[^qwerty]vn").unwrap();
        assert!(!re.is_match(b"abqvn"));
        assert!(re.is_match(b"abgvn"));

        let mut re = Regex::new(r"(ab){2,4}").unwrap();
        assert!(re.is_match(b"abab"));
        assert!(!re.is_match(b"ababababab"));
    }
}
