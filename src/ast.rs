//! The abstract-syntax contract with the concrete-syntax front-end, and the
//! builder that desugars it into the primitive term algebra.

use crate::{BuildError, Regex};
use log::debug;
use std::mem;
use std::rc::Rc;

/// A syntax tree handed over by an external parser. The derived operators
/// ([`Option`](Ast::Option), [`Difference`](Ast::Difference),
/// [`Xor`](Ast::Xor), [`Repetition`](Ast::Repetition)) have no counterpart in
/// [`Regex`]; [`build`] expands them into the primitive combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Union(Box<Ast>, Box<Ast>),
    Intersection(Box<Ast>, Box<Ast>),
    Concat(Box<Ast>, Box<Ast>),
    /// `lower` mandatory repeats, then up to `upper` in total.
    /// `upper == -1` means unbounded.
    Repetition {
        lower: u32,
        upper: i32,
        inner: Box<Ast>,
    },
    Not(Box<Ast>),
    /// Inclusive symbol range. The front-end guarantees `lo <= hi`; a node
    /// violating that is rejected as malformed.
    Range(u8, u8),
    Option(Box<Ast>),
    /// The ε literal.
    Empty,
    Difference(Box<Ast>, Box<Ast>),
    Xor(Box<Ast>, Box<Ast>),
    Reverse(Box<Ast>),
}

/// Build a term from a front-end syntax tree. The result is simplified once
/// before it is returned.
///
/// Fails with [`BuildError::InvalidRepetitionRange`] on a bounded repetition
/// whose upper bound lies below its lower bound, and with
/// [`BuildError::MalformedAst`] on a structurally invalid node. On error no
/// partial term is returned.
pub fn build(ast: &Ast) -> Result<Rc<Regex>, BuildError> {
    let re = build_node(ast)?.simplify();
    debug!("built term: {re}");
    Ok(re)
}

fn pop(values: &mut Vec<Rc<Regex>>) -> Rc<Regex> {
    values.pop().expect("value stack underflow")
}

// Syntax trees arrive from an external front-end, so their depth is
// input-controlled; the walk carries its own stack instead of using the
// call stack. Children are evaluated left to right, so the first error in
// tree order aborts the build.
fn build_node(ast: &Ast) -> Result<Rc<Regex>, BuildError> {
    enum Walk<'a> {
        Enter(&'a Ast),
        Leave(&'a Ast),
    }

    let mut work = vec![Walk::Enter(ast)];
    let mut values: Vec<Rc<Regex>> = Vec::new();
    while let Some(step) = work.pop() {
        match step {
            Walk::Enter(node) => match node {
                Ast::Union(l, r)
                | Ast::Intersection(l, r)
                | Ast::Concat(l, r)
                | Ast::Difference(l, r)
                | Ast::Xor(l, r) => {
                    work.push(Walk::Leave(node));
                    work.push(Walk::Enter(r));
                    work.push(Walk::Enter(l));
                }
                Ast::Repetition { inner, .. } => {
                    work.push(Walk::Leave(node));
                    work.push(Walk::Enter(inner));
                }
                Ast::Not(r) | Ast::Option(r) | Ast::Reverse(r) => {
                    work.push(Walk::Leave(node));
                    work.push(Walk::Enter(r));
                }
                Ast::Range(lo, hi) => {
                    if lo > hi {
                        return Err(BuildError::MalformedAst(format!(
                            "range lower bound {lo} above upper bound {hi}"
                        )));
                    }
                    values.push(Regex::Range(*lo, *hi).into());
                }
                Ast::Empty => values.push(Regex::EmptyString.into()),
            },
            Walk::Leave(node) => {
                let re = match node {
                    Ast::Union(..) => {
                        let r = pop(&mut values);
                        Regex::Or(pop(&mut values), r).into()
                    }
                    Ast::Intersection(..) => {
                        let r = pop(&mut values);
                        Regex::And(pop(&mut values), r).into()
                    }
                    Ast::Concat(..) => {
                        let r = pop(&mut values);
                        Regex::Concat(pop(&mut values), r).into()
                    }
                    Ast::Repetition { lower, upper, .. } => {
                        expand_repetition(*lower, *upper, pop(&mut values))?
                    }
                    Ast::Not(_) => Regex::Complement(pop(&mut values)).into(),
                    // r? = r | ε
                    Ast::Option(_) => {
                        Regex::Or(pop(&mut values), Regex::EmptyString.into()).into()
                    }
                    // a - b = a & ~b
                    Ast::Difference(..) => {
                        let r = pop(&mut values);
                        Regex::And(pop(&mut values), Regex::Complement(r).into()).into()
                    }
                    // a ^ b = (~a & b) | (a & ~b)
                    Ast::Xor(..) => {
                        let r = pop(&mut values);
                        let l = pop(&mut values);
                        Regex::Or(
                            Regex::And(Regex::Complement(l.clone()).into(), r.clone()).into(),
                            Regex::And(l, Regex::Complement(r).into()).into(),
                        )
                        .into()
                    }
                    // reversal is applied eagerly, the term algebra has no
                    // reverse node
                    Ast::Reverse(_) => pop(&mut values).reverse(),
                    Ast::Range(..) | Ast::Empty => unreachable!("leaves are not re-entered"),
                };
                values.push(re);
            }
        }
    }
    Ok(pop(&mut values))
}

// The bound check sits after the child build, so errors inside `re` have
// already surfaced by the time the bounds are judged.
fn expand_repetition(lower: u32, upper: i32, re: Rc<Regex>) -> Result<Rc<Regex>, BuildError> {
    if upper >= 0 && (upper as u32) < lower {
        return Err(BuildError::InvalidRepetitionRange { lower, upper });
    }

    let mut acc: Rc<Regex> = Regex::EmptyString.into();
    for _ in 0..lower {
        acc = Regex::Concat(acc, re.clone()).into();
    }
    if upper == -1 {
        // open-ended tail
        acc = Regex::Concat(acc, Regex::Repeat(re).into()).into();
    } else {
        let optional: Rc<Regex> = Regex::Or(re, Regex::EmptyString.into()).into();
        for _ in lower..upper as u32 {
            acc = Regex::Concat(acc, optional.clone()).into();
        }
    }
    Ok(acc)
}

/// Same teardown discipline as the term algebra: children are detached into
/// a worklist first, so a deep tree from the front-end drops without
/// recursing to its depth.
impl Drop for Ast {
    fn drop(&mut self) {
        let mut work: Vec<Box<Ast>> = Vec::new();
        detach_children(self, &mut work);
        while let Some(mut node) = work.pop() {
            detach_children(&mut node, &mut work);
        }
    }
}

fn detach_children(ast: &mut Ast, work: &mut Vec<Box<Ast>>) {
    match ast {
        Ast::Union(l, r)
        | Ast::Intersection(l, r)
        | Ast::Concat(l, r)
        | Ast::Difference(l, r)
        | Ast::Xor(l, r) => {
            work.push(mem::replace(l, Box::new(Ast::Empty)));
            work.push(mem::replace(r, Box::new(Ast::Empty)));
        }
        Ast::Repetition { inner, .. } => work.push(mem::replace(inner, Box::new(Ast::Empty))),
        Ast::Not(r) | Ast::Option(r) | Ast::Reverse(r) => {
            work.push(mem::replace(r, Box::new(Ast::Empty)));
        }
        Ast::Range(..) | Ast::Empty => {}
    }
}
