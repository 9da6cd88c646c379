//! Generic traversal and rewriting over command trees.
//!
//! Commands own their children uniquely, so rewriting mutates in place:
//! a pass moves a child out of its slot, transforms it, and moves the
//! result back. `Cmd::default()` is `Nop`, which makes the slot swap a
//! plain `mem::take`.

use super::{Cmd, Value};

/// Lazy pre-order walk over a command tree. Only `Seq`, `If`, `Loop` and
/// `For` have children; every other command is a leaf.
pub struct CmdIter<'a> {
    stack: Vec<&'a Cmd>,
}

impl<'a> Iterator for CmdIter<'a> {
    type Item = &'a Cmd;

    fn next(&mut self) -> Option<&'a Cmd> {
        let cmd = self.stack.pop()?;
        // Children are pushed in reverse so they pop in source order.
        match cmd {
            Cmd::Seq { cmds } => self.stack.extend(cmds.iter().rev()),
            Cmd::If { then_, else_, .. } => {
                self.stack.push(else_);
                self.stack.push(then_);
            }
            Cmd::Loop { body } | Cmd::For { body, .. } => self.stack.push(body),
            _ => {}
        }
        Some(cmd)
    }
}

/// Restartable pre-order iteration starting at `root` (inclusive).
pub fn iter(root: &Cmd) -> CmdIter<'_> {
    CmdIter { stack: vec![root] }
}

/// Materialises [`iter`] into a vector.
pub fn flatten(root: &Cmd) -> Vec<&Cmd> {
    iter(root).collect()
}

/// Rewrites the tree in place, children first. `f` receives each node
/// after its children have been rewritten; returning `None` keeps the
/// node as is.
pub fn map<F>(root: &mut Cmd, f: &mut F)
where
    F: FnMut(&Cmd) -> Option<Cmd>,
{
    match root {
        Cmd::Seq { cmds } => {
            for cmd in cmds.iter_mut() {
                map(cmd, f);
            }
        }
        Cmd::If { then_, else_, .. } => {
            map(then_, f);
            map(else_, f);
        }
        Cmd::Loop { body } | Cmd::For { body, .. } => map(body, f),
        _ => {}
    }
    if let Some(new) = f(root) {
        *root = new;
    }
}

/// Bottom-up algebraic simplification.
///
/// Inside a `Seq`, `Nop`s are dropped and nested `Seq`s spliced into the
/// parent; an empty `Seq` becomes `Nop` and a singleton collapses to its
/// child. An `If` whose branches are both `Nop` becomes `Nop`, and an
/// `If` on a literal boolean is replaced by the taken branch. `Loop` and
/// `For` bodies are cleaned but the loops themselves are kept; whether
/// they terminate is a runtime question.
///
/// The pass is idempotent.
pub fn clean(cmd: &mut Cmd) {
    match cmd {
        Cmd::Seq { cmds } => {
            let old = std::mem::take(cmds);
            let mut out = Vec::with_capacity(old.len());
            for mut child in old {
                clean(&mut child);
                match child {
                    Cmd::Nop => {}
                    Cmd::Seq { cmds: inner } => out.extend(inner),
                    other => out.push(other),
                }
            }
            *cmd = match out.len() {
                0 => Cmd::Nop,
                1 => out.pop().unwrap(),
                _ => Cmd::Seq { cmds: out },
            };
        }
        Cmd::If {
            src_condition,
            then_,
            else_,
            ..
        } => {
            clean(then_);
            clean(else_);
            match src_condition {
                Value::Bool(true) => *cmd = std::mem::take(&mut **then_),
                Value::Bool(false) => *cmd = std::mem::take(&mut **else_),
                _ => {
                    if matches!((&**then_, &**else_), (Cmd::Nop, Cmd::Nop)) {
                        *cmd = Cmd::Nop;
                    }
                }
            }
        }
        Cmd::Loop { body } | Cmd::For { body, .. } => clean(body),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::ToSymbol;
    use crate::ir::{LocalId, Module};
    use crate::types::Type;
    use crate::utils::metadata::Location;
    use crate::{function_t, integer_t};

    fn loc() -> Location {
        Location::new(0..0, "main.an".to_symbol())
    }

    fn mv(dst: u32, value: i64) -> Cmd {
        Cmd::Move {
            loc: loc(),
            dst: LocalId::from_index(dst as usize - 1),
            src: Value::Integer(value),
        }
    }

    fn seq(cmds: Vec<Cmd>) -> Cmd {
        Cmd::Seq { cmds }
    }

    fn cond_var() -> Value {
        Value::LocalVar(LocalId::from_index(0))
    }

    fn sample_tree() -> Cmd {
        seq(vec![
            mv(1, 10),
            Cmd::If {
                loc: loc(),
                src_condition: cond_var(),
                then_: Box::new(mv(2, 1)),
                else_: Box::new(Cmd::Loop {
                    body: Box::new(seq(vec![mv(3, 2), Cmd::Break])),
                }),
            },
            Cmd::CheckGC,
        ])
    }

    #[test]
    fn iter_is_preorder_and_restartable() {
        let tree = sample_tree();
        let tags: Vec<_> = iter(&tree).map(Cmd::tag).collect();
        assert_eq!(
            tags,
            vec![
                "ir.Cmd.Seq",
                "ir.Cmd.Move",
                "ir.Cmd.If",
                "ir.Cmd.Move",
                "ir.Cmd.Loop",
                "ir.Cmd.Seq",
                "ir.Cmd.Move",
                "ir.Cmd.Break",
                "ir.Cmd.CheckGC",
            ]
        );
        // A fresh iterator walks the same sequence again.
        assert_eq!(flatten(&tree), iter(&tree).collect::<Vec<_>>());
    }

    #[test]
    fn identity_map_keeps_the_tree() {
        let mut tree = sample_tree();
        let original = tree.clone();
        map(&mut tree, &mut |_| None);
        assert_eq!(tree, original);
    }

    #[test]
    fn map_rewrites_children_before_parents() {
        // Rewrite every Move into a Nop, then watch the parent hook see
        // the already-rewritten children.
        let mut tree = seq(vec![mv(1, 1), mv(2, 2)]);
        map(&mut tree, &mut |cmd| match cmd {
            Cmd::Move { .. } => Some(Cmd::Nop),
            Cmd::Seq { cmds } => {
                assert!(cmds.iter().all(|c| matches!(c, Cmd::Nop)));
                None
            }
            _ => None,
        });
        assert_eq!(tree, seq(vec![Cmd::Nop, Cmd::Nop]));
    }

    #[test]
    fn empty_seq_cleans_to_nop() {
        let mut cmd = seq(vec![]);
        clean(&mut cmd);
        assert_eq!(cmd, Cmd::Nop);
    }

    #[test]
    fn nested_seqs_splice_and_collapse() {
        let mut cmd = seq(vec![Cmd::Nop, seq(vec![Cmd::Nop, mv(1, 5)])]);
        clean(&mut cmd);
        assert_eq!(cmd, mv(1, 5));
    }

    #[test]
    fn if_folds_on_literal_conditions() {
        let mut t = Cmd::If {
            loc: loc(),
            src_condition: Value::Bool(true),
            then_: Box::new(mv(1, 1)),
            else_: Box::new(mv(2, 2)),
        };
        clean(&mut t);
        assert_eq!(t, mv(1, 1));

        let mut e = Cmd::If {
            loc: loc(),
            src_condition: Value::Bool(false),
            then_: Box::new(mv(1, 1)),
            else_: Box::new(mv(2, 2)),
        };
        clean(&mut e);
        assert_eq!(e, mv(2, 2));

        let mut n = Cmd::If {
            loc: loc(),
            src_condition: cond_var(),
            then_: Box::new(Cmd::Nop),
            else_: Box::new(seq(vec![])),
        };
        clean(&mut n);
        assert_eq!(n, Cmd::Nop);
    }

    #[test]
    fn loops_are_never_eliminated() {
        let mut lp = Cmd::Loop {
            body: Box::new(seq(vec![Cmd::Nop])),
        };
        clean(&mut lp);
        assert_eq!(
            lp,
            Cmd::Loop {
                body: Box::new(Cmd::Nop)
            }
        );
    }

    #[test]
    fn clean_is_idempotent_on_deep_nops() {
        let mut cmd = Cmd::Nop;
        for _ in 0..100 {
            cmd = seq(vec![cmd]);
        }
        clean(&mut cmd);
        assert_eq!(cmd, Cmd::Nop);
        clean(&mut cmd);
        assert_eq!(cmd, Cmd::Nop);
    }

    #[test]
    fn clean_is_idempotent_and_preserves_leaves() {
        let mut tree = seq(vec![
            Cmd::Nop,
            sample_tree(),
            seq(vec![seq(vec![mv(4, 4)]), Cmd::Nop]),
        ]);
        let leaves_of = |c: &Cmd| {
            flatten(c)
                .into_iter()
                .filter(|c| !matches!(c, Cmd::Nop | Cmd::Seq { .. }))
                .cloned()
                .collect::<Vec<_>>()
        };
        let before = leaves_of(&tree);
        clean(&mut tree);
        let after = leaves_of(&tree);
        assert_eq!(before, after);

        let once = tree.clone();
        clean(&mut tree);
        assert_eq!(tree, once);
    }

    // Keeps the module import exercised even when the other tests shrink;
    // building a tree against real locals mirrors frontend output.
    #[test]
    fn trees_reference_function_locals() {
        let mut module = Module::new();
        let f_typ = function_t!(vec![], vec![integer_t!()]).into_id();
        let f = module.add_function(loc(), "answer".to_symbol(), f_typ);
        let func = module.function_mut(f);
        let tmp = func.add_local(None, integer_t!().into_id());
        func.body = Some(seq(vec![
            Cmd::Move {
                loc: loc(),
                dst: tmp,
                src: Value::Integer(42),
            },
            Cmd::Return {
                loc: loc(),
                srcs: vec![Value::LocalVar(tmp)],
            },
        ]));
        let body = module.function(f).body.as_ref().unwrap();
        assert_eq!(flatten(body).len(), 3);
    }
}
