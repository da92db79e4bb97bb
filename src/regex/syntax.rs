//! Recursive-descent parse of a pattern into a binary syntax tree.
//!
//! The tree is a tagged sum type rather than a class hierarchy: [`SyntaxNode`]
//! has exactly the four shapes a pattern can produce (`Leaf`, `Concat`, `Or`,
//! `Star`), and a capture-group wrapper is represented by incrementing
//! `is_unit` on whichever node it wraps rather than introducing a fifth
//! node kind.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::{ParseError, ParseErrorKind};
use crate::regex::tokenizer::{self, classify_token, extract_unit, is_escaped};

/// The kind of leaf a pattern atom produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LeafKind {
    /// An ordinary literal byte.
    Normal(u8),
    /// `\s`, `\w` or `\d`, already expanded to its byte set.
    Escape(Vec<u8>),
    /// A `[...]` class, already expanded to its byte set.
    CharClass(Vec<u8>),
    /// `.`
    Dot,
    /// `^`
    Head,
    /// `$`
    Tail,
    /// `\k` — matches the text last captured by group `k`.
    #[cfg(feature = "backreferences")]
    BackRef(u32),
    /// Zero-width, always matches. Produced only for a capture group that
    /// wraps nothing (`()`), possibly nested inside another group — never
    /// by any pattern syntax directly.
    Empty,
}

/// A node of the syntax tree. `is_unit` counts how many pairs of capture
/// parentheses wrap this node; a value greater than one means several
/// groups open and close at exactly the same span (e.g. `((a))` wraps the
/// leaf `a` twice with nothing in between).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SyntaxNode {
    Leaf { kind: LeafKind, position: u32, is_unit: u32 },
    Concat { left: Box<SyntaxNode>, right: Box<SyntaxNode>, is_unit: u32 },
    Or { left: Box<SyntaxNode>, right: Box<SyntaxNode>, is_unit: u32 },
    Star { body: Box<SyntaxNode>, min: u32, max: Option<u32>, is_unit: u32 },
}

impl SyntaxNode {
    /// Reconstructs a pattern string equivalent to the one this tree was
    /// parsed from: un-escaping is reversed, quantifier suffixes are
    /// re-emitted from `(min, max)`, and units are re-wrapped in parens.
    /// Character classes and `\s`/`\w`/`\d` escapes are printed from their
    /// already-expanded byte sets, so original negation (`[^...]`) and range
    /// shorthand (`a-z`) are not recovered — the output matches the same
    /// language but not necessarily the same bytes for those leaves.
    pub(crate) fn to_pattern_string(&self) -> alloc::string::String {
        let mut out = alloc::string::String::new();
        self.write_pattern(&mut out);
        out
    }

    fn write_pattern(&self, out: &mut alloc::string::String) {
        match self {
            SyntaxNode::Leaf { kind, is_unit, .. } => {
                let mut body = alloc::string::String::new();
                write_leaf(kind, &mut body);
                wrap_unit(&body, *is_unit, out);
            }
            SyntaxNode::Concat { left, right, is_unit } => {
                let mut body = alloc::string::String::new();
                left.write_pattern(&mut body);
                right.write_pattern(&mut body);
                wrap_unit(&body, *is_unit, out);
            }
            SyntaxNode::Or { left, right, is_unit } => {
                let mut body = alloc::string::String::new();
                left.write_pattern(&mut body);
                body.push('|');
                right.write_pattern(&mut body);
                wrap_unit(&body, *is_unit, out);
            }
            SyntaxNode::Star { body, min, max, is_unit } => {
                let mut inner = alloc::string::String::new();
                body.write_pattern(&mut inner);
                inner.push_str(&quantifier_suffix(*min, *max));
                wrap_unit(&inner, *is_unit, out);
            }
        }
    }

    pub(crate) fn is_unit(&self) -> u32 {
        match self {
            SyntaxNode::Leaf { is_unit, .. }
            | SyntaxNode::Concat { is_unit, .. }
            | SyntaxNode::Or { is_unit, .. }
            | SyntaxNode::Star { is_unit, .. } => *is_unit,
        }
    }

    fn bump_unit(&mut self) {
        match self {
            SyntaxNode::Leaf { is_unit, .. }
            | SyntaxNode::Concat { is_unit, .. }
            | SyntaxNode::Or { is_unit, .. }
            | SyntaxNode::Star { is_unit, .. } => *is_unit += 1,
        }
    }
}

struct Fault(ParseErrorKind, usize);

impl From<(ParseErrorKind, usize)> for Fault {
    fn from((kind, pos): (ParseErrorKind, usize)) -> Self {
        Fault(kind, pos)
    }
}

struct Builder<'p> {
    pattern: &'p [u8],
    leaf_index: u32,
    /// Number of non-empty capture groups opened so far, in parse order.
    /// Used only to validate back-reference numbers as they're seen; actual
    /// group numbering happens later, during NFA construction.
    unit_counter: i64,
}

/// Parses `pattern` into a syntax tree, or `None` if it matches only the
/// empty string (e.g. the pattern is literally `()`).
pub(crate) fn build(pattern: &[u8]) -> Result<Option<SyntaxNode>, ParseError> {
    let mut b = Builder { pattern, leaf_index: 0, unit_counter: -1 };
    b.parse_alt(0, pattern.len()).map_err(|Fault(kind, pos)| {
        let text = core::str::from_utf8(pattern).unwrap_or("");
        ParseError::new(kind, text, pos)
    })
}

impl<'p> Builder<'p> {
    /// Splits on the first unescaped top-level `|`, producing a right-leaning
    /// tree for 3+ alternatives — preserved as-is; it affects only which
    /// sub-tree a given group index lives under, never match results.
    fn parse_alt(&mut self, ps: usize, pe: usize) -> Result<Option<SyntaxNode>, Fault> {
        let mut p = ps;
        let mut depth: i32 = 0;
        while p < pe {
            if !is_escaped(self.pattern, ps, p) {
                if self.pattern[p] == b'|' && depth == 0 {
                    break;
                }
                match self.pattern[p] {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth < 0 {
                            return Err((ParseErrorKind::UnmatchedParenthesis, p).into());
                        }
                    }
                    _ => {}
                }
            }
            p += 1;
        }

        if p == pe {
            return self.parse_concat(ps, pe);
        }

        let left = self.parse_concat(ps, p)?;
        let right = self.parse_alt(p + 1, pe)?;
        let left_absent = left.is_none();
        let right_absent = right.is_none();
        let node = SyntaxNode::Or {
            left: Box::new(left.unwrap_or_else(empty_leaf)),
            right: Box::new(right.unwrap_or_else(empty_leaf)),
            is_unit: 0,
        };
        Ok(combine(node, left_absent, right_absent))
    }

    fn parse_concat(&mut self, ps: usize, pe: usize) -> Result<Option<SyntaxNode>, Fault> {
        if ps >= pe {
            return Ok(None);
        }

        if classify_token(self.pattern, ps, pe) {
            return self.make_leaf(ps, pe).map(Some);
        }

        let unit = extract_unit(self.pattern, ps, pe).map_err(|k| (k, pe.saturating_sub(1)))?;

        let left = if unit.before_unit > ps {
            self.parse_concat(ps, unit.before_unit)?
        } else {
            None
        };

        let right = if unit.is_paren {
            if unit.us == unit.ue {
                // `()` — matches empty, allocates no group number.
                None
            } else {
                self.unit_counter += 1;
                let mut r = self.parse_alt(unit.us, unit.ue)?.unwrap_or_else(empty_leaf);
                r.bump_unit();
                Some(r)
            }
        } else {
            self.parse_concat(unit.us, unit.ue)?
        };

        let mut right = right;
        if let Some(r) = right.take() {
            right = Some(self.maybe_wrap_quantifier(r, ps, unit.after_unit, pe)?);
        }

        Ok(match (left, right) {
            (None, None) => None,
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (Some(l), Some(r)) => {
                Some(SyntaxNode::Concat { left: Box::new(l), right: Box::new(r), is_unit: 0 })
            }
        })
    }

    fn maybe_wrap_quantifier(
        &mut self,
        node: SyntaxNode,
        ps: usize,
        after_unit: usize,
        pe: usize,
    ) -> Result<SyntaxNode, Fault> {
        if after_unit >= pe {
            return Ok(node);
        }
        if is_escaped(self.pattern, ps, after_unit) {
            return Ok(node);
        }

        let (min, max) = match self.pattern[after_unit] {
            b'*' => (0, None),
            b'+' => (1, None),
            b'?' => (0, Some(1)),
            b'{' => tokenizer::extract_repeat(self.pattern, after_unit, pe)
                .map_err(|k| (k, after_unit))?,
            _ => return Ok(node),
        };

        Ok(SyntaxNode::Star { body: Box::new(node), min, max, is_unit: 0 })
    }

    fn make_leaf(&mut self, s: usize, e: usize) -> Result<SyntaxNode, Fault> {
        let position = self.leaf_index;
        self.leaf_index += 1;

        let kind = if self.pattern[s] == b'[' {
            let bytes = tokenizer::expand_class(self.pattern, s + 1, e - 1)
                .map_err(|k| (k, s))?;
            LeafKind::CharClass(bytes)
        } else if self.pattern[s] == b'.' {
            LeafKind::Dot
        } else if self.pattern[s] == b'^' {
            LeafKind::Head
        } else if self.pattern[s] == b'$' {
            LeafKind::Tail
        } else if self.pattern[s] == b'\\' {
            #[cfg(feature = "backreferences")]
            if tokenizer::is_ref_token(self.pattern, s) {
                let mut n = (self.pattern[s + 1] - b'0') as i64;
                if s + 2 < e {
                    n = n * 10 + (self.pattern[s + 2] - b'0') as i64;
                }
                if n > self.unit_counter {
                    return Err((ParseErrorKind::BackReferenceOutOfRange, s).into());
                }
                return Ok(SyntaxNode::Leaf { kind: LeafKind::BackRef(n as u32), position, is_unit: 0 });
            }
            let c = self.pattern[s + 1];
            match c {
                b's' | b'w' | b'd' => LeafKind::Escape(tokenizer::expand_escape(c)),
                _ => LeafKind::Normal(c),
            }
        } else {
            LeafKind::Normal(self.pattern[s])
        };

        Ok(SyntaxNode::Leaf { kind, position, is_unit: 0 })
    }
}

fn wrap_unit(body: &str, is_unit: u32, out: &mut alloc::string::String) {
    if is_unit == 0 {
        out.push_str(body);
        return;
    }
    let mut s = alloc::string::String::from(body);
    for _ in 0..is_unit {
        s = alloc::format!("({})", s);
    }
    out.push_str(&s);
}

fn push_literal(b: u8, out: &mut alloc::string::String) {
    if matches!(b, b'.' | b'^' | b'$' | b'*' | b'+' | b'?' | b'|' | b'(' | b')' | b'[' | b']' | b'\\') {
        out.push('\\');
    }
    out.push(b as char);
}

fn write_leaf(kind: &LeafKind, out: &mut alloc::string::String) {
    match kind {
        LeafKind::Normal(b) => push_literal(*b, out),
        LeafKind::Dot => out.push('.'),
        LeafKind::Head => out.push('^'),
        LeafKind::Tail => out.push('$'),
        LeafKind::Empty => {}
        LeafKind::Escape(bytes) => {
            if *bytes == tokenizer::expand_escape(b's') {
                out.push_str("\\s");
            } else if *bytes == tokenizer::expand_escape(b'w') {
                out.push_str("\\w");
            } else if *bytes == tokenizer::expand_escape(b'd') {
                out.push_str("\\d");
            } else {
                out.push('[');
                for &b in bytes {
                    push_literal(b, out);
                }
                out.push(']');
            }
        }
        LeafKind::CharClass(bytes) => {
            out.push('[');
            for &b in bytes {
                push_literal(b, out);
            }
            out.push(']');
        }
        #[cfg(feature = "backreferences")]
        LeafKind::BackRef(k) => {
            out.push('\\');
            out.push_str(&alloc::format!("{}", k));
        }
    }
}

fn quantifier_suffix(min: u32, max: Option<u32>) -> alloc::string::String {
    match (min, max) {
        (0, None) => alloc::string::String::from("*"),
        (1, None) => alloc::string::String::from("+"),
        (0, Some(1)) => alloc::string::String::from("?"),
        (m, None) => alloc::format!("{{{},}}", m),
        (m, Some(n)) if m == n => alloc::format!("{{{}}}", m),
        (m, Some(n)) => alloc::format!("{{{},{}}}", m, n),
    }
}

fn empty_leaf() -> SyntaxNode {
    SyntaxNode::Leaf { kind: LeafKind::Empty, position: u32::MAX, is_unit: 0 }
}

/// An alternation with exactly one side absent (`"a|"`, `"|b"`) still needs
/// to match the empty string as its other alternative, so the `Or` against
/// `empty_leaf()` built above is kept rather than collapsed to the
/// non-empty side. Only when *both* sides are absent (`"|"`) does the whole
/// alternation reduce to "matches only the empty string".
fn combine(node: SyntaxNode, left_absent: bool, right_absent: bool) -> Option<SyntaxNode> {
    if left_absent && right_absent {
        None
    } else {
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> SyntaxNode {
        build(pattern.as_bytes()).unwrap().unwrap()
    }

    #[test]
    fn single_literal_is_a_leaf() {
        assert!(matches!(
            parse("a"),
            SyntaxNode::Leaf { kind: LeafKind::Normal(b'a'), .. }
        ));
    }

    #[test]
    fn concat_of_two_literals() {
        assert!(matches!(parse("ab"), SyntaxNode::Concat { .. }));
    }

    #[test]
    fn alternation_produces_or_node() {
        assert!(matches!(parse("a|b"), SyntaxNode::Or { .. }));
    }

    #[test]
    fn capture_group_marks_is_unit() {
        let tree = parse("(a)");
        assert_eq!(tree.is_unit(), 1);
    }

    #[test]
    fn nested_empty_content_groups_stack_is_unit() {
        let tree = parse("((a))");
        assert_eq!(tree.is_unit(), 2);
    }

    #[test]
    fn empty_group_allocates_no_counter_bump() {
        // "()" alone matches empty and carries no leaves.
        assert!(build(b"()").unwrap().is_none());
    }

    #[test]
    fn alternation_with_one_empty_side_keeps_the_or_node() {
        assert!(matches!(parse("a|"), SyntaxNode::Or { .. }));
        assert!(matches!(parse("|b"), SyntaxNode::Or { .. }));
    }

    #[test]
    fn alternation_of_two_empty_sides_matches_only_empty() {
        assert!(build(b"|").unwrap().is_none());
    }

    #[test]
    fn star_wraps_quantified_unit() {
        assert!(matches!(parse("a*"), SyntaxNode::Star { min: 0, max: None, .. }));
        assert!(matches!(parse("a+"), SyntaxNode::Star { min: 1, max: None, .. }));
        assert!(matches!(parse("a?"), SyntaxNode::Star { min: 0, max: Some(1), .. }));
        assert!(matches!(parse("a{2,4}"), SyntaxNode::Star { min: 2, max: Some(4), .. }));
    }

    #[test]
    fn back_reference_out_of_range_is_rejected() {
        #[cfg(feature = "backreferences")]
        assert!(build(br"(a)\1").is_err());
    }

    #[test]
    fn pattern_string_round_trips_literals_groups_and_quantifiers() {
        assert_eq!(parse("ab").to_pattern_string(), "ab");
        assert_eq!(parse("a|b").to_pattern_string(), "a|b");
        assert_eq!(parse("(a)").to_pattern_string(), "(a)");
        assert_eq!(parse("((a))").to_pattern_string(), "((a))");
        assert_eq!(parse("a*").to_pattern_string(), "a*");
        assert_eq!(parse("a{2,4}").to_pattern_string(), "a{2,4}");
        assert_eq!(parse(r"a\.b").to_pattern_string(), r"a\.b");
        assert_eq!(parse(r"\s").to_pattern_string(), r"\s");
    }

    #[test]
    fn back_reference_within_range_is_accepted() {
        #[cfg(feature = "backreferences")]
        assert!(build(br"(a)\0").is_ok());
    }
}
