//! Symbolic regular-expression matching via Brzozowski derivatives.
//!
//! A regular expression is held as an algebraic term ([`Regex`]); matching an
//! input consumes one symbol at a time by replacing the term with its
//! [derivative](Regex::derive) with respect to that symbol, and accepts when
//! the residual term after the whole input is [nullable](Regex::is_nullable).
//! No automaton is ever built: each reachable term is a lazily materialized
//! state, and the derivative is its transition function.
//!
//! Because the term algebra carries complement and intersection as first-class
//! operators, languages that backtracking engines cannot express directly
//! (difference, xor, whole-string reversal) desugar into it naturally; see
//! [`Ast`] and [`build`].
//!
//! Matching is whole-input and anchored. The alphabet is the byte range
//! 0–255.

use thiserror::Error;

mod ast;
mod matcher;
mod regex;

#[cfg(feature = "dot")]
mod dot;

pub use ast::{build, Ast};
pub use matcher::{Matcher, Trace};
pub use regex::Regex;

/// Stateful acceptor for a symbol sequence, advanced one symbol at a time.
pub trait RegexMatcher {
    type Alphabet;

    /// Accept the specified symbol, advancing to the residual state.
    fn accept(&mut self, inp: Self::Alphabet);

    fn accept_many(&mut self, inp: impl IntoIterator<Item = Self::Alphabet>) {
        for i in inp {
            self.accept(i);
        }
    }

    /// Returns true if the regular expression accepts the input iterator.
    fn accepts(&mut self, iter: impl IntoIterator<Item = Self::Alphabet>) -> bool {
        for i in iter {
            self.accept(i);
            if self.is_oblivion() {
                return false;
            }
        }

        self.is_accepting()
    }

    /// Whether the input consumed so far is a member of the language.
    fn is_accepting(&self) -> bool;

    /// Whether the state denotes the empty language, from which no
    /// continuation of the input can be accepted.
    fn is_oblivion(&self) -> bool;
}

/// Failure while building a term from a front-end syntax tree. All failures
/// are construction-time; the term operations themselves are total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid repetition range {{{lower},{upper}}}")]
    InvalidRepetitionRange { lower: u32, upper: i32 },
    #[error("malformed ast node: {0}")]
    MalformedAst(String),
}
