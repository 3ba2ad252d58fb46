use std::fmt::{self, Display, Formatter};
use std::mem;
use std::rc::Rc;

/// Metacharacters of the concrete syntax, escaped when a literal symbol is
/// rendered.
const META: &[u8] = b"\\.*+()[]|^~&-?@";

/// A regular expression over the byte alphabet, represented as an algebraic
/// term. Matching never compiles this to an automaton; instead the term is
/// transformed symbol by symbol with [`derive`](Regex::derive).
///
/// Beyond the classical operators the algebra carries complement ([`Complement`](Regex::Complement))
/// and intersection ([`And`](Regex::And)), which make difference and xor
/// expressible by desugaring (see [`Ast`](crate::Ast)).
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// The empty language ∅. Accepts nothing.
    EmptySet,
    /// The language {ε} containing only the empty string.
    EmptyString,
    /// A single symbol in the inclusive range `lo..=hi`. Invariant: `lo <= hi`,
    /// established by the builder.
    Range(u8, u8),
    /// Σ*, every string over the alphabet. A canonical marker kept small by
    /// the simplifier; only simplification introduces it (as `~∅`), the
    /// builder never constructs it directly.
    SigmaStar,
    Concat(Rc<Regex>, Rc<Regex>),
    Or(Rc<Regex>, Rc<Regex>),
    And(Rc<Regex>, Rc<Regex>),
    Complement(Rc<Regex>),
    Repeat(Rc<Regex>),
}

/// Post-order traversal step. Terms can nest arbitrarily deep, so every core
/// operation walks with an explicit work stack instead of recursing.
enum Step {
    Enter(Rc<Regex>),
    Leave(Rc<Regex>),
}

fn pop(values: &mut Vec<Rc<Regex>>) -> Rc<Regex> {
    values.pop().expect("value stack underflow")
}

/// AND over the two-element nullability algebra: `EmptyString` is truth,
/// `EmptySet` is falsehood. Only ever applied to those two variants.
fn and(a: Rc<Regex>, b: Rc<Regex>) -> Rc<Regex> {
    match *a {
        Regex::EmptyString => b,
        _ => a,
    }
}

/// OR over the nullability algebra.
fn or(a: Rc<Regex>, b: Rc<Regex>) -> Rc<Regex> {
    match *a {
        Regex::EmptyString => a,
        _ => b,
    }
}

fn negate(a: &Regex) -> Rc<Regex> {
    match a {
        Regex::EmptyString => Regex::EmptySet.into(),
        _ => Regex::EmptyString.into(),
    }
}

impl Regex {
    /// Nullability as a term: `EmptyString` if ε ∈ L(self), `EmptySet`
    /// otherwise. The result is always one of exactly those two variants,
    /// which lets it stand in directly as an operand of a derivative (see the
    /// `Concat` case of [`derive`](Regex::derive)).
    pub fn nullable(&self) -> Rc<Regex> {
        enum Walk<'a> {
            Enter(&'a Regex),
            Leave(&'a Regex),
        }

        let mut work = vec![Walk::Enter(self)];
        let mut values: Vec<Rc<Regex>> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Walk::Enter(re) => match re {
                    Regex::EmptySet | Regex::Range(_, _) => {
                        values.push(Regex::EmptySet.into());
                    }
                    Regex::EmptyString | Regex::SigmaStar | Regex::Repeat(_) => {
                        values.push(Regex::EmptyString.into());
                    }
                    Regex::Complement(r) => {
                        work.push(Walk::Leave(re));
                        work.push(Walk::Enter(r));
                    }
                    Regex::Concat(l, r) | Regex::Or(l, r) | Regex::And(l, r) => {
                        work.push(Walk::Leave(re));
                        work.push(Walk::Enter(l));
                        work.push(Walk::Enter(r));
                    }
                },
                Walk::Leave(re) => {
                    let v = match re {
                        Regex::Complement(_) => negate(&pop(&mut values)),
                        Regex::Or(_, _) => or(pop(&mut values), pop(&mut values)),
                        Regex::Concat(_, _) | Regex::And(_, _) => {
                            and(pop(&mut values), pop(&mut values))
                        }
                        _ => unreachable!("leaves never reach the leave phase"),
                    };
                    values.push(v);
                }
            }
        }

        pop(&mut values)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(*self.nullable(), Regex::EmptyString)
    }

    // Node-local rewrite rules, one per operator, assuming the operands are
    // already simplified. Shared by `simplify` and `derive`; leaves simplify
    // to themselves.

    fn simplify_and(l: Rc<Regex>, r: Rc<Regex>) -> Rc<Regex> {
        match (&*l, &*r) {
            (Regex::EmptySet, _) | (_, Regex::EmptySet) => Regex::EmptySet.into(),
            (_, Regex::SigmaStar) => l,
            (Regex::SigmaStar, _) => r,
            _ => Regex::And(l, r).into(),
        }
    }

    fn simplify_or(l: Rc<Regex>, r: Rc<Regex>) -> Rc<Regex> {
        match (&*l, &*r) {
            (Regex::EmptySet, _) => r,
            (_, Regex::EmptySet) => l,
            (Regex::EmptyString, Regex::EmptyString) => l,
            (Regex::EmptyString, _) if r.is_nullable() => r,
            (_, Regex::EmptyString) if l.is_nullable() => l,
            (Regex::SigmaStar, _) | (_, Regex::SigmaStar) => Regex::SigmaStar.into(),
            _ => Regex::Or(l, r).into(),
        }
    }

    fn simplify_concat(l: Rc<Regex>, r: Rc<Regex>) -> Rc<Regex> {
        match (&*l, &*r) {
            (Regex::EmptySet, _) | (_, Regex::EmptySet) => Regex::EmptySet.into(),
            (Regex::EmptyString, _) => r,
            (_, Regex::EmptyString) => l,
            // Σ* absorbs whatever is concatenated onto it from the left
            (Regex::SigmaStar, _) => l,
            _ => Regex::Concat(l, r).into(),
        }
    }

    fn simplify_repeat(r: Rc<Regex>) -> Rc<Regex> {
        match &*r {
            // (a*)* = a*
            Regex::Repeat(_) => r,
            Regex::EmptySet | Regex::EmptyString => r,
            Regex::SigmaStar => r,
            _ => Regex::Repeat(r).into(),
        }
    }

    fn simplify_complement(r: Rc<Regex>) -> Rc<Regex> {
        match &*r {
            Regex::EmptySet => Regex::SigmaStar.into(),
            Regex::SigmaStar => Regex::EmptySet.into(),
            _ => Regex::Complement(r).into(),
        }
    }

    /// Bottom-up, language-preserving simplification. Idempotent on its own
    /// output. Commuted operands are not reordered, so semantically equal
    /// terms built along different paths may keep different shapes.
    pub fn simplify(self: &Rc<Self>) -> Rc<Regex> {
        let mut work = vec![Step::Enter(self.clone())];
        let mut values: Vec<Rc<Regex>> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Enter(re) => match &*re {
                    Regex::Concat(l, r) | Regex::Or(l, r) | Regex::And(l, r) => {
                        let (l, r) = (l.clone(), r.clone());
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(l));
                        work.push(Step::Enter(r));
                    }
                    Regex::Complement(r) | Regex::Repeat(r) => {
                        let r = r.clone();
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(r));
                    }
                    // leaves are already in simplest form
                    _ => values.push(re),
                },
                Step::Leave(re) => {
                    let v = match &*re {
                        Regex::Concat(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Self::simplify_concat(l, r)
                        }
                        Regex::Or(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Self::simplify_or(l, r)
                        }
                        Regex::And(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Self::simplify_and(l, r)
                        }
                        Regex::Complement(_) => Self::simplify_complement(pop(&mut values)),
                        Regex::Repeat(_) => Self::simplify_repeat(pop(&mut values)),
                        _ => unreachable!("leaves never reach the leave phase"),
                    };
                    values.push(v);
                }
            }
        }

        pop(&mut values)
    }

    /// The Brzozowski derivative with respect to `symbol`: the term denoting
    /// {w : symbol·w ∈ L(self)}, i.e. the residual language after consuming
    /// one symbol. The result is always simplified; callers never need to
    /// re-simplify.
    ///
    /// Term size can grow across repeated derivation since no subterm
    /// interning is performed.
    pub fn derive(self: &Rc<Self>, symbol: u8) -> Rc<Regex> {
        let mut work = vec![Step::Enter(self.clone())];
        let mut values: Vec<Rc<Regex>> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Enter(re) => match &*re {
                    // consuming a symbol empties ∅ and ε alike
                    Regex::EmptySet | Regex::EmptyString => {
                        values.push(Regex::EmptySet.into());
                    }
                    Regex::Range(lo, hi) => {
                        values.push(if *lo <= symbol && symbol <= *hi {
                            Regex::EmptyString.into()
                        } else {
                            Regex::EmptySet.into()
                        });
                    }
                    Regex::SigmaStar => values.push(re),
                    Regex::Concat(l, r) | Regex::Or(l, r) | Regex::And(l, r) => {
                        let (l, r) = (l.clone(), r.clone());
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(l));
                        work.push(Step::Enter(r));
                    }
                    Regex::Complement(r) | Regex::Repeat(r) => {
                        let r = r.clone();
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(r));
                    }
                },
                Step::Leave(re) => {
                    let v = match &*re {
                        // D(l r) = ν(l) D(r) | D(l) r
                        Regex::Concat(l, r) => {
                            let dl = pop(&mut values);
                            let dr = pop(&mut values);
                            let skipped = Self::simplify_concat(l.nullable(), dr);
                            let stepped = Self::simplify_concat(dl, r.clone());
                            Self::simplify_or(skipped, stepped)
                        }
                        Regex::Or(_, _) => {
                            let dl = pop(&mut values);
                            let dr = pop(&mut values);
                            Self::simplify_or(dl, dr)
                        }
                        Regex::And(_, _) => {
                            let dl = pop(&mut values);
                            let dr = pop(&mut values);
                            Self::simplify_and(dl, dr)
                        }
                        Regex::Complement(_) => Self::simplify_complement(pop(&mut values)),
                        // D(r*) = D(r) r*
                        Regex::Repeat(_) => {
                            Self::simplify_concat(pop(&mut values), re.clone())
                        }
                        _ => unreachable!("leaves never reach the leave phase"),
                    };
                    values.push(v);
                }
            }
        }

        // Original subterms embedded by the Concat and Repeat cases may not
        // have been simplified yet when the caller passes a raw term.
        pop(&mut values).simplify()
    }

    /// The term denoting the reversed language: L(result) = {wᴿ : w ∈ L(self)}.
    /// Only concatenation is order-sensitive; every other operator recurses on
    /// its children unchanged.
    pub fn reverse(self: &Rc<Self>) -> Rc<Regex> {
        let mut work = vec![Step::Enter(self.clone())];
        let mut values: Vec<Rc<Regex>> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Enter(re) => match &*re {
                    Regex::Concat(l, r) | Regex::Or(l, r) | Regex::And(l, r) => {
                        let (l, r) = (l.clone(), r.clone());
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(l));
                        work.push(Step::Enter(r));
                    }
                    Regex::Complement(r) | Regex::Repeat(r) => {
                        let r = r.clone();
                        work.push(Step::Leave(re));
                        work.push(Step::Enter(r));
                    }
                    // leaves reverse to themselves and can be shared
                    _ => values.push(re),
                },
                Step::Leave(re) => {
                    let v = match &*re {
                        Regex::Concat(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Regex::Concat(r, l).into()
                        }
                        Regex::Or(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Regex::Or(l, r).into()
                        }
                        Regex::And(_, _) => {
                            let l = pop(&mut values);
                            let r = pop(&mut values);
                            Regex::And(l, r).into()
                        }
                        Regex::Complement(_) => Regex::Complement(pop(&mut values)).into(),
                        Regex::Repeat(_) => Regex::Repeat(pop(&mut values)).into(),
                        _ => unreachable!("leaves never reach the leave phase"),
                    };
                    values.push(v);
                }
            }
        }

        pop(&mut values)
    }
}

/// Teardown matches the traversals: children are detached into a worklist
/// before a node is freed, so releasing a term never recurses to its depth.
/// The compiler-generated drop would, and derivative chains grow terms with
/// input length.
impl Drop for Regex {
    fn drop(&mut self) {
        let mut work: Vec<Rc<Regex>> = Vec::new();
        detach_children(self, &mut work);
        while let Some(child) = work.pop() {
            // shared subterms are torn down by their last holder
            if let Ok(mut node) = Rc::try_unwrap(child) {
                detach_children(&mut node, &mut work);
            }
        }
    }
}

fn detach_children(re: &mut Regex, work: &mut Vec<Rc<Regex>>) {
    match re {
        Regex::Concat(l, r) | Regex::Or(l, r) | Regex::And(l, r) => {
            work.push(mem::replace(l, Regex::EmptySet.into()));
            work.push(mem::replace(r, Regex::EmptySet.into()));
        }
        Regex::Complement(r) | Regex::Repeat(r) => {
            work.push(mem::replace(r, Regex::EmptySet.into()));
        }
        _ => {}
    }
}

fn escape_byte(b: u8) -> String {
    if b.is_ascii_graphic() || b == b' ' {
        if META.contains(&b) {
            format!("\\{}", b as char)
        } else {
            (b as char).to_string()
        }
    } else {
        format!("\\{b:03o}")
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Regex::EmptySet => write!(f, "~(.*)"),
            Regex::EmptyString => write!(f, "@"),
            Regex::SigmaStar => write!(f, ".*"),
            Regex::Range(lo, hi) => {
                if lo == hi {
                    write!(f, "{}", escape_byte(*lo))
                } else {
                    write!(f, "[{}-{}]", escape_byte(*lo), escape_byte(*hi))
                }
            }
            Regex::Concat(l, r) => write!(f, "(({l})({r}))"),
            Regex::Or(l, r) => write!(f, "({l})|({r})"),
            Regex::And(l, r) => write!(f, "({l})&({r})"),
            Regex::Complement(r) => write!(f, "~({r})"),
            Regex::Repeat(r) => write!(f, "({r})*"),
        }
    }
}
