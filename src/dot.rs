//! Graphviz export of the term tree, for external visualization tooling.

use crate::Regex;
use std::io;
use std::io::Write;

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Regex {
    /// Write the term as a Graphviz digraph: one node per term node, one edge
    /// per parent→child link, every node visited exactly once. Traversal is
    /// preorder with ids assigned in discovery order, so output is
    /// deterministic for a given term.
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;

        let mut next_id = 1usize;
        let mut work: Vec<(usize, &Regex)> = vec![(0, self)];

        while let Some((id, re)) = work.pop() {
            let label = match re {
                Regex::And(_, _) => "&".to_string(),
                Regex::Or(_, _) => "|".to_string(),
                Regex::Concat(_, _) => "C".to_string(),
                Regex::Repeat(_) => "*".to_string(),
                Regex::Complement(_) => "~".to_string(),
                leaf => leaf.to_string(),
            };
            writeln!(w, "n_{id} [label=\"{}\"]", escape_label(&label))?;

            match re {
                Regex::And(l, r) | Regex::Or(l, r) | Regex::Concat(l, r) => {
                    let (lid, rid) = (next_id, next_id + 1);
                    next_id += 2;
                    writeln!(w, "n_{id} -> n_{lid}")?;
                    writeln!(w, "n_{id} -> n_{rid}")?;
                    // left child on top of the stack, visited first
                    work.push((rid, r));
                    work.push((lid, l));
                }
                Regex::Repeat(r) | Regex::Complement(r) => {
                    let cid = next_id;
                    next_id += 1;
                    writeln!(w, "n_{id} -> n_{cid}")?;
                    work.push((cid, r));
                }
                _ => {}
            }
        }

        writeln!(w, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::{build, Ast};

    fn render(ast: &Ast) -> String {
        let re = build(ast).unwrap();
        let mut out = Vec::new();
        re.output_dot(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn every_node_and_edge_once() {
        let dot = render(&Ast::Intersection(
            Box::new(Ast::Concat(
                Box::new(Ast::Range(b'a', b'a')),
                Box::new(Ast::Range(b'b', b'b')),
            )),
            Box::new(Ast::Not(Box::new(Ast::Range(b'c', b'c')))),
        ));

        // 6 term nodes, 5 parent->child edges
        assert_eq!(dot.matches("[label=").count(), 6);
        assert_eq!(dot.matches(" -> ").count(), 5);
        assert!(dot.contains("n_0 [label=\"&\"]"));
        assert!(dot.contains("[label=\"C\"]"));
        assert!(dot.contains("[label=\"~\"]"));
        assert!(dot.contains("[label=\"a\"]"));
        assert!(dot.starts_with("digraph {\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn deterministic_output() {
        let ast = Ast::Union(
            Box::new(Ast::Repetition {
                lower: 1,
                upper: 2,
                inner: Box::new(Ast::Range(b'a', b'z')),
            }),
            Box::new(Ast::Range(b'0', b'9')),
        );
        assert_eq!(render(&ast), render(&ast));
    }

    #[test]
    fn labels_escape_backslashes() {
        // a literal '*' renders as "\*", which the dot label must double up
        let dot = render(&Ast::Range(b'*', b'*'));
        assert!(dot.contains("n_0 [label=\"\\\\*\"]"));
    }
}
