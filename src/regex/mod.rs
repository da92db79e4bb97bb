/*!
A byte-oriented regular expression engine.

A pattern is compiled in three stages — [`tokenizer`] classifies byte ranges
of the pattern text, [`syntax`] parses it into a tree, and [`nfa`] compiles
that tree into a non-deterministic state machine and executes it against an
input byte range. [`Regex`] is the façade that ties the three together.

# Syntax

- Literals: any non-meta byte.
- Meta: `. ^ $ * + ? | ( ) [ ]`.
- Escapes: `\s \w \d` plus `\` before any meta character to match it literally.
- Character classes: `[abc]`, `[a-z]`, `[^abc]`, with `\-` for a literal
  hyphen inside a class.
- Repetition: `*`, `+`, `?`, `{m}`, `{m,}`, `{,n}`, `{m,n}`.
- Grouping: `(...)` opens a capture group; with the `backreferences` feature,
  `\0`..`\99` matches the text last captured by that group.
- Alternation: `a|b`.

There is no Unicode-aware matching (the alphabet is raw bytes 1..253), no
look-around, no named groups, and no non-greedy quantifiers — none of that is
in scope for this engine.

# Example

```
use triregex::Regex;

let mut re = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
assert!(re.is_match(b"2010-03-14"));
```
*/

pub(crate) mod nfa;
pub(crate) mod syntax;
pub(crate) mod tokenizer;

use bon::bon;

use crate::captures::Captures;
use crate::error::ParseError;
use nfa::Nfa;

/// A compiled regular expression.
///
/// Matching mutates internal NFA state (back-reference materialization), so
/// [`Regex::is_match`] and [`Regex::captures`] both take `&mut self`: the
/// borrow checker enforces the single-threaded, non-reentrant match
/// discipline this engine requires, rather than a runtime check.
pub struct Regex {
    nfa: Nfa,
    partial_match: bool,
}

#[bon]
impl Regex {
    /// Compiles `pattern` with partial-match mode enabled (the pattern may
    /// match anywhere in the input, as if wrapped in an implicit `.*` on
    /// each side unless anchored with `^`/`$`).
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        Self::builder().build(pattern)
    }

    /// Returns a builder for configuring construction of a [`Regex`].
    ///
    /// # Example: disabling partial-match mode
    ///
    /// ```
    /// use triregex::Regex;
    ///
    /// let mut re = Regex::builder().partial_match(false).build("abc").unwrap();
    /// assert!(re.is_match(b"abc"));
    /// assert!(!re.is_match(b"xabcx"));
    /// ```
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,
        /// When `true` (the default), a pattern with no `^`/`$` matches if it
        /// appears anywhere in the input. When `false`, every match is
        /// implicitly anchored at both ends.
        #[builder(default = true)]
        partial_match: bool,
    ) -> Result<Regex, ParseError> {
        let tree = syntax::build(pattern.as_bytes())?;
        let nfa = Nfa::compile(tree.as_ref(), partial_match);
        Ok(Regex { nfa, partial_match })
    }
}

impl Regex {
    /// Reports whether `input` matches this pattern.
    pub fn is_match(&mut self, input: &[u8]) -> bool {
        self.nfa.run(input).0
    }

    /// Runs the match and, if it succeeds, returns the recorded capture
    /// groups.
    pub fn captures(&mut self, input: &[u8]) -> Option<Captures> {
        let (matched, captures) = self.nfa.run(input);
        if matched {
            Some(captures)
        } else {
            None
        }
    }

    /// How many capture groups this pattern declares.
    pub fn group_count(&self) -> u32 {
        self.nfa.group_count()
    }

    /// Whether this regex was built with partial-match mode enabled.
    pub fn partial_match(&self) -> bool {
        self.partial_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_matches_a_simple_pattern() {
        let mut re = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
        assert!(re.is_match(b"2010-03-14"));
        assert!(!re.is_match(b"2010-3-14"));
    }

    #[test]
    fn builder_can_disable_partial_match() {
        let mut re = Regex::builder().partial_match(false).build("abc").unwrap();
        assert!(re.is_match(b"abc"));
        assert!(!re.is_match(b"xabcx"));
    }

    #[test]
    fn reports_group_count() {
        let re = Regex::new(r"(a)(b(c))").unwrap();
        assert_eq!(re.group_count(), 3);
    }

    #[test]
    fn bad_pattern_is_a_parse_error() {
        assert!(Regex::new("(abc").is_err());
    }
}
