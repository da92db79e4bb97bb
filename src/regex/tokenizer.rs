//! Pattern-text classification: what is this byte range, where does the
//! rightmost sub-unit of a pattern end, and what byte set does a bracket
//! class expand to.
//!
//! Every function here operates on half-open `[start, end)` byte ranges
//! into a borrowed pattern slice, never on owned substrings — the syntax
//! builder re-slices the same underlying pattern throughout a parse.

use alloc::vec::Vec;

use crate::error::ParseErrorKind;

/// True if the byte at `pos` is preceded by an odd number of consecutive
/// `\` bytes within `[start, pos)`. An even count means those backslashes
/// escape each other in pairs, leaving `pos` unescaped.
pub(crate) fn is_escaped(pattern: &[u8], start: usize, pos: usize) -> bool {
    if pos <= start {
        return false;
    }
    let mut p = pos - 1;
    if pattern[p] != b'\\' {
        return false;
    }
    let mut count = 1u32;
    while p > start {
        p -= 1;
        if pattern[p] == b'\\' {
            count += 1;
        } else {
            break;
        }
    }
    count % 2 == 1
}

fn is_placeholder_meta(c: u8) -> bool {
    matches!(c, b'.' | b'^' | b'$')
}

pub(crate) fn is_meta(c: u8) -> bool {
    is_placeholder_meta(c)
        || matches!(
            c,
            b'*' | b'+' | b'?' | b'|' | b'[' | b']' | b'(' | b')' | b'{' | b'}' | b'\\'
        )
}

pub(crate) fn can_escape(c: u8) -> bool {
    if is_meta(c) || matches!(c, b's' | b'w' | b'd') {
        return true;
    }
    #[cfg(feature = "backreferences")]
    if c.is_ascii_digit() {
        return true;
    }
    false
}

#[cfg(feature = "backreferences")]
pub(crate) fn is_ref_token(pattern: &[u8], s: usize) -> bool {
    pattern[s] == b'\\' && pattern.get(s + 1).is_some_and(u8::is_ascii_digit)
}

/// Does `pattern[s..e]` form exactly one atomic token: a bracket class, a
/// back-reference, an escape, a placeholder (`. ^ $`), or a single literal
/// byte?
pub(crate) fn classify_token(pattern: &[u8], s: usize, e: usize) -> bool {
    if s >= e {
        return false;
    }

    if pattern[s] == b'[' {
        let mut p = s + 1;
        while p < e && pattern[p] != b']' {
            p += 1;
        }
        return p + 1 == e && pattern[p] == b']';
    }

    #[cfg(feature = "backreferences")]
    if is_ref_token(pattern, s) {
        if e == s + 2 {
            return true;
        }
        if e == s + 3 && pattern[s + 2].is_ascii_digit() {
            return true;
        }
    }

    if pattern[s] == b'\\' && s + 1 < pattern.len() && can_escape(pattern[s + 1]) && e == s + 2 {
        return true;
    }

    if is_placeholder_meta(pattern[s]) && e == s + 1 {
        return true;
    }

    if e != s + 1 {
        return false;
    }

    !is_meta(pattern[s])
}

/// Parses `{m}`, `{m,}`, `{m,n}` or `{,n}` spanning `pattern[s..e]` (`s` must
/// point at `{`, `e` at the position just past the matching `}`). Returns
/// `(min, max)` with `max = None` standing in for unbounded.
pub(crate) fn extract_repeat(
    pattern: &[u8],
    s: usize,
    e: usize,
) -> Result<(u32, Option<u32>), ParseErrorKind> {
    debug_assert_eq!(pattern[s], b'{');
    let mut p = s + 1;
    let mut min: u32 = 0;
    while p < e && pattern[p] != b',' && pattern[p] != b'}' {
        if pattern[p].is_ascii_digit() {
            min = min * 10 + (pattern[p] - b'0') as u32;
        } else if pattern[p] != b' ' {
            return Err(ParseErrorKind::InvalidRepeatCount);
        }
        p += 1;
    }
    if p >= e {
        return Err(ParseErrorKind::InvalidRepeatCount);
    }

    if pattern[p] == b'}' {
        return Ok((min, Some(min)));
    }

    p += 1; // skip ','
    let mut max: u32 = 0;
    while p < e && pattern[p] != b'}' {
        if pattern[p].is_ascii_digit() {
            max = max * 10 + (pattern[p] - b'0') as u32;
        } else if pattern[p] != b' ' {
            return Err(ParseErrorKind::InvalidRepeatCount);
        }
        p += 1;
    }
    if p >= e {
        return Err(ParseErrorKind::InvalidRepeatCount);
    }

    let max = if max == 0 { None } else { Some(max) };
    if let Some(max) = max {
        if min > max {
            return Err(ParseErrorKind::InvalidRepeatCount);
        }
    }
    Ok((min, max))
}

/// The rightmost atomic sub-unit of `pattern[ps..pe]`, plus the boundaries
/// of what's left over on either side.
///
/// `us..ue` is the unit's interior (for a parenthesized unit, the brackets
/// themselves are excluded; for a bracket class they're included, matching
/// [`classify_token`]'s expectations when re-dispatching). `ps..before_unit`
/// is whatever remains to the left and must be parsed separately;
/// `after_unit..pe` is whatever trails the unit (typically empty, or a
/// quantifier).
pub(crate) struct ExtractedUnit {
    pub us: usize,
    pub ue: usize,
    pub before_unit: usize,
    pub after_unit: usize,
    pub is_paren: bool,
}

pub(crate) fn extract_unit(
    pattern: &[u8],
    ps: usize,
    pe: usize,
) -> Result<ExtractedUnit, ParseErrorKind> {
    debug_assert!(ps < pe);
    let mut p = pe - 1;
    let mut ec = pattern[p];

    if matches!(ec, b'+' | b'*' | b'?') && !is_escaped(pattern, ps, p) {
        if p == ps {
            return Err(ParseErrorKind::DanglingQuantifier);
        }
        p -= 1;
        ec = pattern[p];
    }

    if matches!(ec, b')' | b'}' | b']') && !is_escaped(pattern, ps, p) {
        let (open, close) = match ec {
            b']' => (b'[', b']'),
            b')' => (b'(', b')'),
            _ => (b'{', b'}'),
        };
        let closer_pos = p;
        let mut cc: i32 = 1;
        let mut qi = p as isize - 1;
        let mut open_pos = None;
        while qi >= ps as isize {
            let q = qi as usize;
            if !is_escaped(pattern, ps, q) {
                if pattern[q] == close {
                    cc += 1;
                } else if pattern[q] == open {
                    if cc == 1 {
                        open_pos = Some(q);
                        break;
                    }
                    cc -= 1;
                }
            }
            qi -= 1;
        }
        let unmatched = if ec == b']' {
            ParseErrorKind::UnmatchedBracket
        } else {
            ParseErrorKind::UnmatchedParenthesis
        };
        let open_pos = open_pos.ok_or(unmatched)?;

        return match ec {
            b']' => Ok(ExtractedUnit {
                us: open_pos,
                ue: closer_pos + 1,
                before_unit: open_pos,
                after_unit: closer_pos + 1,
                is_paren: false,
            }),
            b'}' => {
                // The trailing `}` belongs to a `{m,n}` repeat count, not a
                // grouping construct. Re-extract the unit the repeat count
                // actually quantifies, treating everything up to (not
                // including) the `{` as the working range.
                let inner = extract_unit(pattern, ps, open_pos)?;
                if inner.after_unit != open_pos {
                    return Err(ParseErrorKind::InvalidRepeatCount);
                }
                Ok(inner)
            }
            _ => Ok(ExtractedUnit {
                us: open_pos + 1,
                ue: closer_pos,
                before_unit: open_pos,
                after_unit: closer_pos + 1,
                is_paren: true,
            }),
        };
    }

    if matches!(ec, b'(' | b'{' | b'[' | b'|' | b'*' | b'?' | b'+') && !is_escaped(pattern, ps, p)
    {
        return Err(ParseErrorKind::StrayMetaCharacter);
    }

    let ue = p + 1;
    let after_unit = p + 1;
    if is_escaped(pattern, ps, p) {
        #[cfg(not(feature = "backreferences"))]
        if ec.is_ascii_digit() {
            return Err(ParseErrorKind::BackReferencesDisabled);
        }
        if !can_escape(ec) {
            return Err(ParseErrorKind::InvalidEscape);
        }
        Ok(ExtractedUnit { us: p - 1, ue, before_unit: p - 1, after_unit, is_paren: false })
    } else {
        Ok(ExtractedUnit { us: p, ue, before_unit: p, after_unit, is_paren: false })
    }
}

/// Expands a bracket class's interior `pattern[s..e]` (brackets themselves
/// excluded) into the explicit set of bytes it matches. Handles `a-z`
/// ranges, `\-` for a literal hyphen, and a leading `^` for negation.
pub(crate) fn expand_class(pattern: &[u8], s: usize, e: usize) -> Result<Vec<u8>, ParseErrorKind> {
    if s >= e {
        return Ok(Vec::new());
    }

    let negate = pattern[s] == b'^';
    let mut selected = [false; 256];
    let mut p = if negate { s + 1 } else { s };

    while p < e {
        if pattern[p] == b'-' && p > s && p + 1 < e {
            let lo = pattern[p - 1];
            let hi = pattern[p + 1];
            if lo > hi {
                return Err(ParseErrorKind::InvertedClassRange);
            }
            for b in lo..=hi {
                selected[b as usize] = true;
            }
        } else {
            let mut q = p;
            if q + 1 < e && pattern[q] == b'\\' && pattern[q + 1] == b'-' {
                q += 1;
            }
            selected[pattern[q] as usize] = true;
            p = q;
        }
        p += 1;
    }

    let mut out = Vec::new();
    for b in 1u16..254 {
        if selected[b as usize] != negate {
            out.push(b as u8);
        }
    }
    Ok(out)
}

/// Expands a single escape character into its literal byte set: `\s` is a
/// space, `\w` all ASCII letters, `\d` all ASCII digits, anything else is
/// itself.
pub(crate) fn expand_escape(c: u8) -> Vec<u8> {
    match c {
        b's' => alloc::vec![b' '],
        b'w' => {
            let mut v = Vec::with_capacity(52);
            for i in b'a'..=b'z' {
                v.push(i);
                v.push(i - b'a' + b'A');
            }
            v
        }
        b'd' => (b'0'..=b'9').collect(),
        other => alloc::vec![other],
    }
}
