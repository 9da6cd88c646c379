//! Lowering from structured command trees to basic blocks.
//!
//! Every function gets a reserved empty entry block at index 0 and a
//! reserved empty exit block at the last index, whatever its body. In
//! between, the tree is walked once: straight-line commands accumulate in
//! the current block, `If` closes the current block and wires a
//! conditional-false edge, `Loop`/`Break` are resolved through a stack of
//! pending break lists, and `For` is first expanded into explicit
//! init/test/step commands and then lowered like any other tree.

use super::{BasicBlock, BinOp, BlockId, Cmd, Function, JmpFalse, LocalId, Module, Value};
use crate::types::Type;
use crate::utils::metadata::Location;


/// Populates `blocks` for every function in the module.
pub fn generate_basic_blocks(module: &mut Module) {
    for func in module.functions.iter_mut() {
        generate_function_blocks(func);
    }
}

fn generate_function_blocks(func: &mut Function) {
    // The body is taken out so `For` expansion can allocate fresh locals
    // on the function while the tree is being walked.
    let body = func.body.take();
    func.loop_headers.clear();
    let mut gen = BlockGenerator::new();
    gen.finish_block();
    if let Some(root) = &body {
        gen.gen_cmd(func, root);
    }
    gen.finish_block();
    debug_assert!(gen.break_stack.is_empty());
    log::debug!("{}: {} basic blocks", func.name, gen.blocks.len());
    func.body = body;
    func.blocks = Some(gen.blocks);
}

struct BlockGenerator {
    blocks: Vec<BasicBlock>,
    /// One entry per enclosing loop: the blocks whose `next` must be
    /// resolved to that loop's after-block.
    break_stack: Vec<Vec<BlockId>>,
}

impl BlockGenerator {
    fn new() -> Self {
        Self {
            blocks: vec![BasicBlock::default()],
            break_stack: Vec::new(),
        }
    }

    fn cur_id(&self) -> BlockId {
        BlockId::new(self.blocks.len() - 1)
    }

    fn cur_is_empty(&self) -> bool {
        self.blocks.last().expect("an open block").cmds.is_empty()
    }

    fn push_cmd(&mut self, cmd: Cmd) {
        self.blocks.last_mut().expect("an open block").cmds.push(cmd);
    }

    /// Seals the current block and opens a new one, returning the sealed
    /// index. `next` defaults to the successor index unless it was set
    /// already or the block ends in a terminator.
    fn finish_block(&mut self) -> BlockId {
        let idx = self.cur_id();
        let succ = BlockId::new(self.blocks.len());
        let block = self.blocks.last_mut().expect("an open block");
        if block.next.is_none() && !block.cmds.last().is_some_and(Cmd::is_terminator) {
            block.next = Some(succ);
        }
        self.blocks.push(BasicBlock::default());
        idx
    }

    /// Redirects `block` at `target`; terminated blocks keep their
    /// missing edge.
    fn set_next(&mut self, block: BlockId, target: BlockId) {
        let b = &mut self.blocks[block.index()];
        if !b.cmds.last().is_some_and(Cmd::is_terminator) {
            b.next = Some(target);
        }
    }

    fn gen_cmd(&mut self, func: &mut Function, cmd: &Cmd) {
        match cmd {
            // Nop contributes nothing; keeping blocks free of Nops is
            // what lets the If lowering detect empty merge points.
            Cmd::Nop => {}
            Cmd::Seq { cmds } => {
                for c in cmds {
                    self.gen_cmd(func, c);
                }
            }
            Cmd::If {
                src_condition,
                then_,
                else_,
                ..
            } => {
                // The branching block must end at the test.
                let branch = self.finish_block();
                self.gen_cmd(func, then_);
                let then_tail = self.finish_block();
                let else_target = self.cur_id();
                self.gen_cmd(func, else_);
                // Opening a merge block only when something was emitted
                // collapses elseif cascades into a shared merge point.
                if !self.cur_is_empty() {
                    self.finish_block();
                }
                let merge = self.cur_id();
                self.blocks[branch.index()].jmp_false = Some(JmpFalse {
                    target: else_target,
                    src_condition: *src_condition,
                });
                self.set_next(then_tail, merge);
            }
            Cmd::Break => {
                let block = self.finish_block();
                self.break_stack
                    .last_mut()
                    .expect("break outside of a loop")
                    .push(block);
            }
            Cmd::Loop { body } => {
                self.break_stack.push(Vec::new());
                self.finish_block();
                let header = self.cur_id();
                func.loop_headers.push(header);
                self.gen_cmd(func, body);
                let tail = self.finish_block();
                let after = self.cur_id();
                self.set_next(tail, header);
                for block in self.break_stack.pop().expect("loop break list") {
                    self.set_next(block, after);
                }
            }
            Cmd::For {
                loc,
                dst,
                src_start,
                src_limit,
                src_step,
                body,
            } => {
                let expanded =
                    expand_for(func, loc, *dst, *src_start, *src_limit, *src_step, body);
                self.gen_cmd(func, &expanded);
            }
            other => self.push_cmd(other.clone()),
        }
    }
}

/// Rewrites a `For` into a `Loop` with explicit init, bounds test and
/// step update:
///
/// ```text
/// dst := start
/// if step == 0 then error "'for' step is zero"
/// loop
///   if step >= 0 then max, min := limit, dst else max, min := dst, limit
///   if min > max then break
///   <body>
///   dst := dst + step
/// end
/// ```
///
/// The comparison and arithmetic operators are picked from the loop
/// variable's type tag; all temporaries are fresh locals.
fn expand_for(
    func: &mut Function,
    loc: &Location,
    dst: LocalId,
    src_start: Value,
    src_limit: Value,
    src_step: Value,
    body: &Cmd,
) -> Cmd {
    let var_typ = func.var(dst).typ;
    let is_flt = match var_typ.to_type() {
        Type::Integer => false,
        Type::Float => true,
        other => panic!("'for' variable must be integer or float, got {other}"),
    };

    let boolean = Type::Boolean.into_id();
    let step_zero = func.add_local(None, boolean);
    let max_var = func.add_local(None, var_typ);
    let min_var = func.add_local(None, var_typ);
    let step_sign = func.add_local(None, boolean);
    let loop_test_var = func.add_local(None, boolean);

    let zero = if is_flt {
        Value::Float(0.0)
    } else {
        Value::Integer(0)
    };
    let (op_eq, op_geq, op_gt, op_add) = if is_flt {
        (BinOp::FltEq, BinOp::FltGeq, BinOp::FltGt, BinOp::FltAdd)
    } else {
        (BinOp::IntEq, BinOp::IntGeq, BinOp::IntGt, BinOp::IntAdd)
    };
    let l = || loc.clone();

    Cmd::Seq {
        cmds: vec![
            Cmd::Move {
                loc: l(),
                dst,
                src: src_start,
            },
            Cmd::Binop {
                loc: l(),
                dst: step_zero,
                op: op_eq,
                src1: src_step,
                src2: zero,
            },
            Cmd::If {
                loc: l(),
                src_condition: Value::LocalVar(step_zero),
                then_: Box::new(Cmd::RuntimeError {
                    loc: l(),
                    msg: "'for' step is zero".to_string(),
                }),
                else_: Box::new(Cmd::Nop),
            },
            Cmd::Loop {
                body: Box::new(Cmd::Seq {
                    cmds: vec![
                        Cmd::Binop {
                            loc: l(),
                            dst: step_sign,
                            op: op_geq,
                            src1: src_step,
                            src2: zero,
                        },
                        Cmd::If {
                            loc: l(),
                            src_condition: Value::LocalVar(step_sign),
                            then_: Box::new(Cmd::Seq {
                                cmds: vec![
                                    Cmd::Move {
                                        loc: l(),
                                        dst: max_var,
                                        src: src_limit,
                                    },
                                    Cmd::Move {
                                        loc: l(),
                                        dst: min_var,
                                        src: Value::LocalVar(dst),
                                    },
                                ],
                            }),
                            else_: Box::new(Cmd::Seq {
                                cmds: vec![
                                    Cmd::Move {
                                        loc: l(),
                                        dst: max_var,
                                        src: Value::LocalVar(dst),
                                    },
                                    Cmd::Move {
                                        loc: l(),
                                        dst: min_var,
                                        src: src_limit,
                                    },
                                ],
                            }),
                        },
                        Cmd::Binop {
                            loc: l(),
                            dst: loop_test_var,
                            op: op_gt,
                            src1: Value::LocalVar(min_var),
                            src2: Value::LocalVar(max_var),
                        },
                        Cmd::If {
                            loc: l(),
                            src_condition: Value::LocalVar(loop_test_var),
                            then_: Box::new(Cmd::Break),
                            else_: Box::new(Cmd::Nop),
                        },
                        body.clone(),
                        Cmd::Binop {
                            loc: l(),
                            dst,
                            op: op_add,
                            src1: Value::LocalVar(dst),
                            src2: src_step,
                        },
                    ],
                }),
            },
        ],
    }
}
