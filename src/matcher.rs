//! Drives the derivative engine across an input, one symbol at a time.

use crate::{Regex, RegexMatcher};
use log::trace;
use std::rc::Rc;

impl Regex {
    /// A fresh matcher positioned at this term.
    pub fn matcher(self: &Rc<Self>) -> Matcher {
        Matcher {
            state: self.clone(),
        }
    }

    /// Whole-input, anchored match: accepts iff the entire input sequence is
    /// a member of the denoted language. An empty input is accepted exactly
    /// when the term is nullable.
    pub fn matches(self: &Rc<Self>, input: impl IntoIterator<Item = u8>) -> bool {
        self.matcher().accepts(input)
    }

    /// The sequence of intermediate derivative states for `input`, starting
    /// with the term itself and ending with the state after the last symbol.
    /// Lazily computed and restartable (the iterator is `Clone`); consuming it
    /// has no effect on matching.
    pub fn trace<'a>(self: &Rc<Self>, input: &'a [u8]) -> Trace<'a> {
        Trace {
            state: Some(self.clone()),
            input,
        }
    }
}

/// A matcher whose state is a regular-expression term rather than a
/// precompiled automaton state: each accepted symbol replaces the term with
/// its derivative. States are materialized on demand, so arbitrary terms work
/// without an up-front compilation pass.
#[derive(Debug, Clone)]
pub struct Matcher {
    state: Rc<Regex>,
}

impl Matcher {
    /// The residual term after the symbols accepted so far.
    pub fn state(&self) -> &Rc<Regex> {
        &self.state
    }
}

impl RegexMatcher for Matcher {
    type Alphabet = u8;

    fn accept(&mut self, inp: u8) {
        self.state = self.state.derive(inp);
        trace!("D_{}: {}", inp.escape_ascii(), self.state);
    }

    fn is_accepting(&self) -> bool {
        self.state.is_nullable()
    }

    fn is_oblivion(&self) -> bool {
        // ∅ is a fixed point of the derivative, nothing can be accepted
        // from here
        matches!(*self.state, Regex::EmptySet)
    }
}

/// Read-only view of the derivative states a match of `input` steps through.
/// Produced by [`Regex::trace`].
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    state: Option<Rc<Regex>>,
    input: &'a [u8],
}

impl Iterator for Trace<'_> {
    type Item = Rc<Regex>;

    fn next(&mut self) -> Option<Rc<Regex>> {
        let current = self.state.take()?;
        if let Some((&c, rest)) = self.input.split_first() {
            self.input = rest;
            self.state = Some(current.derive(c));
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::{build, Ast, Regex, RegexMatcher};
    use std::rc::Rc;

    fn sym(c: u8) -> Box<Ast> {
        Box::new(Ast::Range(c, c))
    }

    fn word(s: &str) -> Box<Ast> {
        let mut bytes = s.bytes();
        let first = bytes.next().expect("empty word");
        bytes.fold(sym(first), |acc, c| Box::new(Ast::Concat(acc, sym(c))))
    }

    fn plus(inner: Box<Ast>) -> Box<Ast> {
        Box::new(Ast::Repetition {
            lower: 1,
            upper: -1,
            inner,
        })
    }

    #[test_log::test]
    fn range_matches_single_symbol() {
        let re = build(&Ast::Range(b'a', b'c')).unwrap();
        assert!(re.matches(*b"b"));
        assert!(!re.matches(*b"d"));
        assert!(!re.matches(*b""));
        assert!(!re.matches(*b"ab"));
    }

    #[test_log::test]
    fn star_matches_any_count() {
        let re = build(&Ast::Repetition {
            lower: 0,
            upper: -1,
            inner: sym(b'a'),
        })
        .unwrap();
        assert!(re.matches(*b""));
        assert!(re.matches(*b"a"));
        assert!(re.matches(*b"aaa"));
        assert!(!re.matches(*b"b"));
        assert!(!re.matches(*b"ab"));
    }

    #[test_log::test]
    fn intersection_requires_both() {
        let re = build(&Ast::Intersection(
            plus(Box::new(Ast::Range(b'a', b'e'))),
            plus(Box::new(Ast::Range(b'c', b'g'))),
        ))
        .unwrap();
        assert!(re.matches(*b"ccd"));
        assert!(!re.matches(*b"ccz"));
    }

    #[test_log::test]
    fn difference_subtracts() {
        let re = build(&Ast::Difference(
            plus(Box::new(Ast::Range(b'a', b'z'))),
            word("cat"),
        ))
        .unwrap();
        assert!(re.matches(*b"dog"));
        assert!(!re.matches(*b"cat"));
    }

    #[test_log::test]
    fn xor_matches_exactly_one_side() {
        let re = build(&Ast::Xor(
            plus(Box::new(Ast::Range(b'a', b'm'))),
            plus(Box::new(Ast::Range(b'h', b'z'))),
        ))
        .unwrap();
        assert!(re.matches(*b"aa")); // left only
        assert!(re.matches(*b"zz")); // right only
        assert!(!re.matches(*b"hh")); // both sides
        assert!(!re.matches(*b"az")); // neither side
    }

    #[test_log::test]
    fn reversed_concat_matches_backwards() {
        let re = build(&Ast::Reverse(Box::new(Ast::Concat(sym(b'a'), sym(b'b'))))).unwrap();
        assert!(re.matches(*b"ba"));
        assert!(!re.matches(*b"ab"));
    }

    #[test_log::test]
    fn bounded_repetition_counts() {
        let re = build(&Ast::Repetition {
            lower: 2,
            upper: 4,
            inner: sym(b'x'),
        })
        .unwrap();
        assert!(re.matches(*b"xx"));
        assert!(re.matches(*b"xxx"));
        assert!(re.matches(*b"xxxx"));
        assert!(!re.matches(*b"x"));
        assert!(!re.matches(*b"xxxxx"));
    }

    #[test_log::test]
    fn complement_flips_membership() {
        let re = build(&Ast::Not(word("ab"))).unwrap();
        assert!(!re.matches(*b"ab"));
        assert!(re.matches(*b"a"));
        assert!(re.matches(*b""));
        assert!(re.matches(*b"abc"));
    }

    #[test]
    fn empty_input_is_nullability() {
        let terms = [
            build(&Ast::Empty).unwrap(),
            build(&Ast::Range(b'a', b'a')).unwrap(),
            build(&Ast::Option(sym(b'q'))).unwrap(),
            build(&Ast::Not(sym(b'q'))).unwrap(),
        ];
        for t in terms {
            assert_eq!(t.matches(*b""), t.is_nullable(), "term {t}");
        }
    }

    #[test]
    fn accepts_short_circuits_in_oblivion() {
        let re = build(&Ast::Range(b'a', b'a')).unwrap();
        let mut m = re.matcher();
        m.accept(b'z');
        assert!(m.is_oblivion());
        // further symbols keep it dead
        m.accept(b'a');
        assert!(m.is_oblivion());
        assert!(!m.is_accepting());
    }

    #[test]
    fn trace_lists_every_state_and_restarts() {
        let re = build(&Ast::Concat(sym(b'a'), sym(b'b'))).unwrap();
        let trace = re.trace(b"ab");

        let states: Vec<Rc<Regex>> = trace.clone().collect();
        assert_eq!(states.len(), 3);
        assert_eq!(states[0], re);
        assert_eq!(*states[1], Regex::Range(b'b', b'b'));
        assert_eq!(*states[2], Regex::EmptyString);

        // restartable: a clone replays the identical sequence
        let replay: Vec<Rc<Regex>> = trace.collect();
        assert_eq!(states, replay);

        // consuming the trace did not disturb matching
        assert!(re.matches(*b"ab"));
    }

    #[test]
    fn matcher_exposes_residual_state() {
        let re = build(&Ast::Concat(sym(b'a'), sym(b'b'))).unwrap();
        let mut m = re.matcher();
        assert_eq!(m.state(), &re);
        m.accept(b'a');
        assert_eq!(**m.state(), Regex::Range(b'b', b'b'));
    }
}
