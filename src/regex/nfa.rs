//! Compiles a syntax tree into an NFA and executes it against an input byte
//! range, via epsilon-closure subset simulation.
//!
//! States live in a flat arena (`Vec<State>`) addressed by `usize` id rather
//! than through owning pointers, since the state graph has cycles (epsilon
//! back-edges for `*`/`+`). A released id (returned when a back-reference
//! chain is undone) is recycled through `free_list` before a new one is
//! pushed onto the arena.

use alloc::vec;
use alloc::vec::Vec;

use bitflags::bitflags;

use crate::captures::{Captures, Span};
use crate::regex::syntax::{LeafKind, SyntaxNode};

/// Epsilon transitions are keyed on this symbol.
pub(crate) const EPSILON: usize = 254;
/// Back-reference meta-transitions are keyed on this symbol; the entry holds
/// exactly `[target_state, group_index]`.
pub(crate) const REF_META: usize = 255;
const SYMBOL_COUNT: usize = 256;

bitflags! {
    /// A state's role. Several bits can be set at once mid-construction
    /// (e.g. a freshly built leaf is both `START` and `ACCEPT`); composition
    /// demotes internal states to `NORM` while `HEAD`/`TAIL`/`REF` stick.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct StateKind: u8 {
        const NONE   = 0;
        const START  = 1 << 0;
        const ACCEPT = 1 << 1;
        const NORM   = 1 << 2;
        const HEAD   = 1 << 3;
        const TAIL   = 1 << 4;
        const REF    = 1 << 5;
    }
}

#[derive(Clone, Debug)]
struct State {
    kind: StateKind,
    /// Group numbers that begin at this state (usually at most one, unless
    /// several capture parentheses close on the same textual boundary).
    start_groups: Vec<u32>,
    /// Group numbers that end at this state.
    end_groups: Vec<u32>,
    /// Enclosing unit's start-state id, for `closure_has_trans`'s ancestor walk.
    parent_unit: Option<usize>,
}

impl State {
    fn fresh(kind: StateKind) -> Self {
        State { kind, start_groups: Vec::new(), end_groups: Vec::new(), parent_unit: None }
    }
}

/// A scoped mutation performed to match a back-reference: the linear chain
/// of states materialized to carry the referenced text, undone once the
/// match (successful or not) is over.
struct RefMaterialization {
    state: usize,
    first_byte: Option<u8>,
    created: Vec<usize>,
}

pub(crate) struct Nfa {
    states: Vec<State>,
    trans: Vec<Vec<Vec<usize>>>,
    free_list: Vec<usize>,
    start: usize,
    accept: usize,
    head_state: Option<usize>,
    tail_state: Option<usize>,
    group_count: u32,
}

impl Nfa {
    pub(crate) fn group_count(&self) -> u32 {
        self.group_count
    }

    /// Builds the NFA for `tree` (`None` meaning a pattern that matches only
    /// the empty string, e.g. `""` or `()`).
    pub(crate) fn compile(tree: Option<&SyntaxNode>, partial_match: bool) -> Nfa {
        let mut nfa = Nfa {
            states: Vec::new(),
            trans: Vec::new(),
            free_list: Vec::new(),
            start: 0,
            accept: 0,
            head_state: None,
            tail_state: None,
            group_count: 0,
        };

        let (start, accept) = match tree {
            Some(node) => {
                let mut next_group = 0u32;
                nfa.build_node(node, false, None, &mut next_group)
            }
            None => nfa.build_leaf(&LeafKind::Empty),
        };

        nfa.states[start].kind.insert(StateKind::START);
        nfa.states[accept].kind.insert(StateKind::ACCEPT);
        nfa.start = start;
        nfa.accept = accept;

        if partial_match && nfa.head_state.is_none() {
            for sym in 1..EPSILON {
                if nfa.trans[start][sym].is_empty() {
                    nfa.trans[start][sym].push(start);
                }
            }
        }
        if partial_match && nfa.tail_state.is_none() {
            for sym in 1..EPSILON {
                if nfa.trans[accept][sym].is_empty() {
                    nfa.trans[accept][sym].push(accept);
                }
            }
        }

        nfa
    }

    fn create_state(&mut self, kind: StateKind) -> usize {
        if let Some(id) = self.free_list.pop() {
            self.states[id] = State::fresh(kind);
            self.trans[id] = vec![Vec::new(); SYMBOL_COUNT];
            id
        } else {
            let id = self.states.len();
            self.states.push(State::fresh(kind));
            self.trans.push(vec![Vec::new(); SYMBOL_COUNT]);
            id
        }
    }

    fn release_state(&mut self, id: usize) {
        self.trans[id] = vec![Vec::new(); SYMBOL_COUNT];
        self.states[id].kind = StateKind::NONE;
        self.free_list.push(id);
    }

    fn demote_to_norm(&mut self, id: usize) {
        let st = &mut self.states[id];
        st.kind.remove(StateKind::START | StateKind::ACCEPT);
        st.kind.insert(StateKind::NORM);
    }

    fn add_epsilon(&mut self, from: usize, to: usize) {
        let v = &mut self.trans[from][EPSILON];
        if !v.contains(&to) {
            v.push(to);
        }
    }

    // ---- construction --------------------------------------------------

    /// Dispatches on `node`'s kind, then — unless `ignore_unit` suppresses it
    /// for a repeated quantifier copy — wraps the result in a fresh
    /// start/accept pair for every capture parenthesis this node is wrapped
    /// in (`node.is_unit()`), threading fresh group numbers from `next_group`
    /// in the same left-before-right order the parser assigned them.
    fn build_node(
        &mut self,
        node: &SyntaxNode,
        ignore_unit: bool,
        parent_unit: Option<usize>,
        next_group: &mut u32,
    ) -> (usize, usize) {
        let is_unit = node.is_unit();
        let wrap = is_unit > 0 && !ignore_unit;
        let unit_start = if wrap { Some(self.create_state(StateKind::START)) } else { None };
        let effective_parent = unit_start.or(parent_unit);

        let (mut start, mut accept) = match node {
            SyntaxNode::Leaf { kind, .. } => self.build_leaf(kind),
            SyntaxNode::Concat { left, right, .. } => {
                self.build_concat(left, right, ignore_unit, effective_parent, next_group)
            }
            SyntaxNode::Or { left, right, .. } => {
                self.build_or(left, right, ignore_unit, effective_parent, next_group)
            }
            SyntaxNode::Star { body, min, max, .. } => {
                self.build_star(body, *min, *max, ignore_unit, effective_parent, next_group)
            }
        };

        if self.states[start].parent_unit.is_none() {
            self.states[start].parent_unit = effective_parent;
        }
        if self.states[accept].parent_unit.is_none() {
            self.states[accept].parent_unit = effective_parent;
        }

        if let Some(unit_start) = unit_start {
            let unit_accept = self.create_state(StateKind::ACCEPT);

            self.demote_to_norm(start);
            self.demote_to_norm(accept);
            self.add_epsilon(unit_start, start);
            self.add_epsilon(accept, unit_accept);

            let groups: Vec<u32> = (0..is_unit)
                .map(|_| {
                    let g = *next_group;
                    *next_group += 1;
                    g
                })
                .collect();
            self.states[unit_start].start_groups = groups.clone();
            self.states[unit_accept].end_groups = groups;
            self.states[unit_start].parent_unit = parent_unit;
            self.states[unit_accept].parent_unit = Some(unit_start);

            start = unit_start;
            accept = unit_accept;
        }

        (start, accept)
    }

    fn build_leaf(&mut self, kind: &LeafKind) -> (usize, usize) {
        let start = self.create_state(StateKind::START);
        let accept = self.create_state(StateKind::ACCEPT);

        match kind {
            LeafKind::Normal(b) => self.trans[start][*b as usize].push(accept),
            LeafKind::Escape(bytes) | LeafKind::CharClass(bytes) => {
                for &b in bytes {
                    self.trans[start][b as usize].push(accept);
                }
            }
            LeafKind::Dot => {
                for b in 1..EPSILON {
                    self.trans[start][b].push(accept);
                }
            }
            LeafKind::Head => {
                self.add_epsilon(start, accept);
                self.states[start].kind.insert(StateKind::HEAD);
                self.head_state = Some(start);
            }
            LeafKind::Tail => {
                self.add_epsilon(start, accept);
                self.states[accept].kind.insert(StateKind::TAIL);
                self.tail_state = Some(accept);
            }
            #[cfg(feature = "backreferences")]
            LeafKind::BackRef(k) => {
                self.trans[start][REF_META] = alloc::vec![accept, *k as usize];
                self.states[start].kind.insert(StateKind::REF);
            }
            LeafKind::Empty => {
                self.add_epsilon(start, accept);
            }
        }

        (start, accept)
    }

    fn build_concat(
        &mut self,
        left: &SyntaxNode,
        right: &SyntaxNode,
        ignore_unit: bool,
        parent_unit: Option<usize>,
        next_group: &mut u32,
    ) -> (usize, usize) {
        let (ls, la) = self.build_node(left, ignore_unit, parent_unit, next_group);
        let (rs, ra) = self.build_node(right, ignore_unit, parent_unit, next_group);
        self.demote_to_norm(la);
        self.demote_to_norm(rs);
        self.add_epsilon(la, rs);
        (ls, ra)
    }

    /// `L` and `R` are wired `L.start --eps--> R.start` and
    /// `R.accept --eps--> L.accept`, exposing `L`'s own start/accept as the
    /// combined ones, rather than allocating a fresh shared entry/exit. This
    /// differs from the textbook Thompson shape — L.start/L.accept end up
    /// simultaneously an internal branch point and the externally visible
    /// boundary — but accepts the same language, so it's kept as is.
    fn build_or(
        &mut self,
        left: &SyntaxNode,
        right: &SyntaxNode,
        ignore_unit: bool,
        parent_unit: Option<usize>,
        next_group: &mut u32,
    ) -> (usize, usize) {
        let (ls, la) = self.build_node(left, ignore_unit, parent_unit, next_group);
        let (rs, ra) = self.build_node(right, ignore_unit, parent_unit, next_group);
        self.demote_to_norm(rs);
        self.demote_to_norm(ra);
        self.add_epsilon(ls, rs);
        self.add_epsilon(ra, la);
        (ls, la)
    }

    /// Only the first copy of a repeated body may open/close its capture
    /// group; later copies are built with `ignore_unit = true` so no extra
    /// wrapper states are created for them.
    fn build_star(
        &mut self,
        body: &SyntaxNode,
        min: u32,
        max: Option<u32>,
        ignore_unit: bool,
        parent_unit: Option<usize>,
        next_group: &mut u32,
    ) -> (usize, usize) {
        if max == Some(0) {
            let start = self.create_state(StateKind::START);
            let accept = self.create_state(StateKind::ACCEPT);
            self.add_epsilon(start, accept);
            return (start, accept);
        }

        match (min, max) {
            (0, None) => {
                let (s, a) = self.build_node(body, ignore_unit, parent_unit, next_group);
                self.add_epsilon(s, a);
                self.add_epsilon(a, s);
                (s, a)
            }
            (0, Some(n)) => {
                let final_accept = self.create_state(StateKind::NORM);
                let mut first_start = None;
                let mut prev_accept: Option<usize> = None;
                for i in 0..n {
                    let (cs, ca) = if i == 0 {
                        self.build_node(body, ignore_unit, parent_unit, next_group)
                    } else {
                        self.build_node(body, true, None, next_group)
                    };
                    if i == 0 {
                        first_start = Some(cs);
                    }
                    if let Some(pa) = prev_accept {
                        self.demote_to_norm(pa);
                        self.demote_to_norm(cs);
                        self.add_epsilon(pa, cs);
                    }
                    self.demote_to_norm(ca);
                    self.add_epsilon(ca, final_accept);
                    prev_accept = Some(ca);
                }
                let first_start = first_start.expect("n > 0 here");
                self.demote_to_norm(first_start);
                self.add_epsilon(first_start, final_accept);
                (first_start, final_accept)
            }
            (k, None) => {
                let mut start = None;
                let mut prev_accept = None;
                let mut last_start = 0;
                for i in 0..k {
                    let (cs, ca) = if i == 0 {
                        self.build_node(body, ignore_unit, parent_unit, next_group)
                    } else {
                        self.build_node(body, true, None, next_group)
                    };
                    if i == 0 {
                        start = Some(cs);
                    }
                    if let Some(pa) = prev_accept {
                        self.demote_to_norm(pa);
                        self.demote_to_norm(cs);
                        self.add_epsilon(pa, cs);
                    }
                    last_start = cs;
                    prev_accept = Some(ca);
                }
                let accept = prev_accept.expect("k >= 1 here");
                self.add_epsilon(accept, last_start);
                (start.expect("k >= 1 here"), accept)
            }
            (k, Some(n)) => {
                let final_accept = self.create_state(StateKind::NORM);
                let mut start = None;
                let mut prev_accept = None;
                for i in 0..k {
                    let (cs, ca) = if i == 0 {
                        self.build_node(body, ignore_unit, parent_unit, next_group)
                    } else {
                        self.build_node(body, true, None, next_group)
                    };
                    if i == 0 {
                        start = Some(cs);
                    }
                    if let Some(pa) = prev_accept {
                        self.demote_to_norm(pa);
                        self.demote_to_norm(cs);
                        self.add_epsilon(pa, cs);
                    }
                    prev_accept = Some(ca);
                }
                let min_end = prev_accept.expect("k >= 1 here");
                self.demote_to_norm(min_end);
                self.add_epsilon(min_end, final_accept);

                let mut prev = min_end;
                for _ in 0..(n - k) {
                    let (cs, ca) = self.build_node(body, true, None, next_group);
                    self.demote_to_norm(prev);
                    self.demote_to_norm(cs);
                    self.add_epsilon(prev, cs);
                    self.demote_to_norm(ca);
                    self.add_epsilon(ca, final_accept);
                    prev = ca;
                }

                (start.expect("k >= 1 here"), final_accept)
            }
        }
    }

    // ---- execution -------------------------------------------------------

    /// DFS through epsilon edges from `s`, restricted to states whose
    /// `parent_unit` ancestry passes through `parent`; returns true as soon
    /// as a visited state has a transition on `ch` or is itself a
    /// back-reference state. Keeps a group's "does it capture here" decision
    /// local to the group's own sub-graph.
    fn closure_has_trans(&self, s: usize, parent: usize, visited: &mut Vec<bool>, ch: usize) -> bool {
        if !self.trans[s][ch].is_empty() {
            return true;
        }
        visited[s] = true;
        for &next in &self.trans[s][EPSILON] {
            if next >= visited.len() {
                visited.resize(next + 1, false);
            }
            if visited[next] {
                continue;
            }

            let mut cur = self.states[next].parent_unit;
            while let Some(c) = cur {
                if c == parent {
                    break;
                }
                cur = self.states[c].parent_unit;
            }
            if cur.is_none() {
                continue;
            }

            if self.closure_has_trans(next, parent, visited, ch) || self.states[next].kind.contains(StateKind::REF) {
                return true;
            }
        }
        false
    }

    /// Whether `accept` is reachable from `s` by epsilon edges alone, i.e.
    /// whether a thread sitting at `s` would already match with no more
    /// input. Used only to decide which end-of-input unit-end states are
    /// real closes rather than dead loop-back branches.
    fn reaches_accept_via_epsilon(&self, s: usize) -> bool {
        let mut visited = vec![false; self.states.len()];
        let mut stack: Vec<usize> = vec![s];
        while let Some(st) = stack.pop() {
            if st == self.accept {
                return true;
            }
            if visited[st] {
                continue;
            }
            visited[st] = true;
            for &next in &self.trans[st][EPSILON] {
                if !visited[next] {
                    stack.push(next);
                }
            }
        }
        false
    }

    fn materialize_ref(&mut self, s: usize, captures: &[Option<Span>], input: &[u8]) -> RefMaterialization {
        let target = self.trans[s][REF_META][0];
        let group = self.trans[s][REF_META][1];

        self.states[s].kind.remove(StateKind::REF);

        let text: &[u8] = match captures.get(group).and_then(|c| c.as_ref()) {
            Some(span) => &input[span.start..span.end],
            None => &[],
        };

        if text.is_empty() {
            self.add_epsilon(s, target);
            return RefMaterialization { state: s, first_byte: None, created: Vec::new() };
        }

        let mut created = Vec::new();
        let mut prev = s;
        for &b in text {
            let next_state = self.create_state(StateKind::NORM);
            self.trans[prev][b as usize].push(next_state);
            created.push(next_state);
            prev = next_state;
        }
        self.trans[prev][EPSILON].push(target);

        RefMaterialization { state: s, first_byte: Some(text[0]), created }
    }

    fn restore_ref(&mut self, m: RefMaterialization) {
        match m.first_byte {
            None => {
                self.trans[m.state][EPSILON].clear();
            }
            Some(b) => {
                self.trans[m.state][b as usize].clear();
                if let Some(&last) = m.created.last() {
                    self.trans[last][EPSILON].clear();
                }
                for st in m.created {
                    self.release_state(st);
                }
            }
        }
        self.states[m.state].kind.insert(StateKind::REF);
    }

    fn close_epsilon(
        &mut self,
        seed: &[usize],
        captures: &[Option<Span>],
        input: &[u8],
        materializations: &mut Vec<RefMaterialization>,
    ) -> Vec<usize> {
        let mut in_set = vec![false; self.states.len()];
        let mut out = Vec::new();
        let mut stack: Vec<usize> = seed.to_vec();

        while let Some(s) = stack.pop() {
            if s >= in_set.len() {
                in_set.resize(self.states.len().max(s + 1), false);
            }
            if in_set[s] {
                continue;
            }
            in_set[s] = true;
            out.push(s);

            if self.states[s].kind.contains(StateKind::REF) {
                let m = self.materialize_ref(s, captures, input);
                if in_set.len() < self.states.len() {
                    in_set.resize(self.states.len(), false);
                }
                materializations.push(m);
            }

            for &eps in &self.trans[s][EPSILON] {
                if eps >= in_set.len() || !in_set[eps] {
                    stack.push(eps);
                }
            }
        }

        out
    }

    /// Runs the compiled machine against `input`, returning whether it
    /// matched and the capture groups recorded along the way. Back-reference
    /// materialization mutates the transition table for the duration of the
    /// call only; every mutation is undone before returning, successful
    /// match or not.
    pub(crate) fn run(&mut self, input: &[u8]) -> (bool, Captures) {
        let mut captures: Vec<Option<Span>> = vec![None; self.group_count as usize];
        let mut group_open: Vec<Option<usize>> = vec![None; self.group_count as usize];
        let mut materializations: Vec<RefMaterialization> = Vec::new();

        let mut current = self.close_epsilon(&[self.start], &captures, input, &mut materializations);

        let mut pos = 0usize;
        while pos < input.len() && !current.is_empty() {
            let ch = input[pos] as usize;

            // Candidate opens are computed up front but *applied* only after
            // this step's closes have read `group_open`: a `+`/`*` body's
            // unit-end and unit-start can be simultaneously live in `current`
            // (the loop-back epsilon), and a close must see the position the
            // group actually started at, not the one a same-step speculative
            // re-entry is about to claim for a later repetition.
            let mut opened: Vec<(u32, usize)> = Vec::new();
            for &s in &current {
                if self.states[s].start_groups.is_empty() {
                    continue;
                }
                let mut visited = vec![false; self.states.len()];
                if self.closure_has_trans(s, s, &mut visited, ch) {
                    for &g in &self.states[s].start_groups {
                        opened.push((g, pos));
                    }
                }
            }

            for &s in &current {
                if self.states[s].end_groups.is_empty() {
                    continue;
                }
                for &g in &self.states[s].end_groups {
                    let start = group_open[g as usize].unwrap_or(pos);
                    captures[g as usize] = Some(Span { start, end: pos });
                }
            }

            for (g, p) in opened {
                group_open[g as usize] = Some(p);
            }

            let mut next_seed: Vec<usize> = Vec::new();
            for &s in &current {
                for &t in &self.trans[s][ch] {
                    next_seed.push(t);
                }
            }
            current = self.close_epsilon(&next_seed, &captures, input, &mut materializations);
            pos += 1;
        }

        // At end of input there's no further step whose closure can settle
        // which simultaneously-live thread actually wins, so a unit-end
        // state only gets to report a group here if its own epsilon-only
        // closure still reaches `accept` — otherwise it's a dead branch
        // (e.g. a `+` loop-back that would need another repetition) that
        // happens to share `current` with the thread that actually matched,
        // and must not stomp that thread's already-recorded span.
        for &s in &current {
            if self.states[s].end_groups.is_empty() || !self.reaches_accept_via_epsilon(s) {
                continue;
            }
            for &g in &self.states[s].end_groups {
                let start = group_open[g as usize].unwrap_or(input.len());
                captures[g as usize] = Some(Span { start, end: input.len() });
            }
        }

        let matched = current.contains(&self.accept);

        for m in materializations {
            self.restore_ref(m);
        }

        (matched, Captures::new(captures))
    }

    /// Acknowledged but never implemented upstream; kept as a documented
    /// stub rather than a speculative DFA compiler.
    pub(crate) fn to_dfa_stub(&self) -> ! {
        unimplemented!("DFA conversion was never implemented upstream")
    }

    /// Likewise: no persisted NFA format exists.
    pub(crate) fn serialize_state(&self) {}

    /// Likewise.
    pub(crate) fn deserialize_state(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::syntax;

    fn run(pattern: &str, input: &str, partial_match: bool) -> (bool, Captures) {
        let tree = syntax::build(pattern.as_bytes()).unwrap();
        let mut nfa = Nfa::compile(tree.as_ref(), partial_match);
        nfa.run(input.as_bytes())
    }

    #[test]
    fn literal_concat_matches() {
        assert!(run("abc", "abc", false).0);
        assert!(!run("abc", "abd", false).0);
    }

    #[test]
    fn alternation_matches_either_branch() {
        assert!(run("a|b", "a", false).0);
        assert!(run("a|b", "b", false).0);
        assert!(!run("a|b", "c", false).0);
    }

    #[test]
    fn star_matches_zero_or_more() {
        assert!(run("a*", "", false).0);
        assert!(run("a*", "aaaa", false).0);
        assert!(!run("a*b", "aaac", false).0);
    }

    #[test]
    fn bounded_repetition_respects_bounds() {
        assert!(run("(ab){2,4}", "abab", false).0);
        assert!(!run("(ab){2,4}", "ababababab", false).0);
    }

    #[test]
    fn partial_match_finds_pattern_anywhere() {
        assert!(!run("ab[^qwerty]vn", "abqvn", true).0);
        assert!(run("ab[^qwerty]vn", "abgvn", true).0);
    }

    #[test]
    fn anchors_require_exact_boundaries() {
        let (matched, _) = run("^([abc]+\\d)*(a|b)+3\\w2e", "a3b3c2e", true);
        assert!(matched);
        let (matched, _) = run("^([abc]+\\d)*(a|b)+3\\w2e", "ab32ab32e", true);
        assert!(!matched);
    }

    #[test]
    fn capture_groups_record_matched_spans() {
        let (matched, captures) = run("(abc)+\\d((ev){2,5})?$", "abc3evevev", true);
        assert!(matched);
        assert_eq!(captures.get(0).map(|s| s.start..s.end), Some(0..3));
    }

    #[test]
    fn repeated_group_followed_by_literal_does_not_steal_the_second_byte() {
        let (matched, captures) = run("(a)+a", "aa", false);
        assert!(matched);
        assert_eq!(captures.get(0).map(|s| s.start..s.end), Some(0..1));
    }

    #[cfg(feature = "backreferences")]
    #[test]
    fn back_reference_requires_identical_repeated_text() {
        let (matched, captures) = run("a(bc)(\\0df)(g\\1)e", "abcbcdfgbcdfe", false);
        assert!(matched);
        assert_eq!(captures.get(0).map(|s| &"abcbcdfgbcdfe".as_bytes()[s.start..s.end]), Some(&b"bc"[..]));
        assert_eq!(captures.get(1).map(|s| &"abcbcdfgbcdfe".as_bytes()[s.start..s.end]), Some(&b"bcdf"[..]));
        assert_eq!(captures.get(2).map(|s| &"abcbcdfgbcdfe".as_bytes()[s.start..s.end]), Some(&b"gbcdf"[..]));
    }

    #[cfg(feature = "backreferences")]
    #[test]
    fn back_reference_rejects_mismatched_text() {
        assert!(run("(ming|dong)\\0", "mingming", false).0);
        assert!(!run("(ming|dong)\\0", "mingdong", false).0);
    }
}
