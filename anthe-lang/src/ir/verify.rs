//! Post-lowering checks.
//!
//! The frontend is trusted to produce three-address trees, but the ids it
//! writes into operands and the edges produced by block generation are
//! cheap to check once per module, and a broken id would otherwise
//! surface as a panic deep inside a backend. Unreachable blocks are not
//! errors; explicit dead code is allowed to survive lowering.

use std::fmt;

use super::{transform, BlockId, Cmd, FunId, Function, LocalId, Module, UpvalId, Value};
use crate::interner::Symbol;
use crate::utils::error::ReportableError;
use crate::utils::metadata::Location;

#[derive(Debug, Clone)]
pub enum VerifyErrorKind {
    LocalOutOfRange(LocalId),
    UpvalueOutOfRange(UpvalId),
    FunctionOutOfRange(FunId),
    EdgeOutOfRange { block: BlockId, target: BlockId },
    EntryHasPredecessor { block: BlockId },
    SelfLoopNotHeader { block: BlockId },
    ExitHasEdge,
}

#[derive(Debug, Clone)]
pub struct VerifyError {
    pub kind: VerifyErrorKind,
    pub function: Symbol,
    pub loc: Location,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VerifyErrorKind::LocalOutOfRange(v) => {
                write!(f, "{}: local {v} is not declared", self.function)
            }
            VerifyErrorKind::UpvalueOutOfRange(u) => {
                write!(f, "{}: upvalue {u} is not declared", self.function)
            }
            VerifyErrorKind::FunctionOutOfRange(f_id) => {
                write!(f, "{}: function {f_id} does not exist", self.function)
            }
            VerifyErrorKind::EdgeOutOfRange { block, target } => {
                write!(f, "{}: {block} jumps to nonexistent {target}", self.function)
            }
            VerifyErrorKind::EntryHasPredecessor { block } => {
                write!(f, "{}: {block} jumps back to the entry block", self.function)
            }
            VerifyErrorKind::SelfLoopNotHeader { block } => {
                write!(
                    f,
                    "{}: {block} falls through to itself but is not a loop header",
                    self.function
                )
            }
            VerifyErrorKind::ExitHasEdge => {
                write!(f, "{}: the exit block has an outgoing edge", self.function)
            }
        }
    }
}

impl std::error::Error for VerifyError {}

impl ReportableError for VerifyError {
    fn get_labels(&self) -> Vec<(Location, String)> {
        vec![(self.loc.clone(), self.to_string())]
    }
}

/// Checks id resolution for every operand and, where blocks exist, the
/// block-edge post-conditions of lowering.
pub fn verify_module(module: &Module) -> Result<(), Vec<Box<dyn ReportableError>>> {
    let mut errs: Vec<Box<dyn ReportableError>> = Vec::new();
    for func in &module.functions {
        verify_function(module, func, &mut errs);
    }
    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

fn verify_function(module: &Module, func: &Function, errs: &mut Vec<Box<dyn ReportableError>>) {
    if let Some(body) = &func.body {
        for cmd in transform::iter(body) {
            check_cmd(module, func, cmd, errs);
        }
    }

    let Some(blocks) = &func.blocks else {
        return;
    };
    let len = blocks.len();
    for (i, block) in blocks.iter().enumerate() {
        for cmd in &block.cmds {
            check_cmd(module, func, cmd, errs);
        }
        let block_id = BlockId::new(i);
        let mut targets = Vec::new();
        if let Some(next) = block.next {
            targets.push(next);
        }
        if let Some(jmp) = &block.jmp_false {
            check_value(func, &jmp.src_condition, errs);
            targets.push(jmp.target);
        }
        if i == len - 1 && !targets.is_empty() {
            push(errs, func, VerifyErrorKind::ExitHasEdge);
            continue;
        }
        // A block may fall through to itself only as the back edge of a
        // loop with an empty body; lowering records those headers.
        if block.next == Some(block_id) && !func.loop_headers.contains(&block_id) {
            push(
                errs,
                func,
                VerifyErrorKind::SelfLoopNotHeader { block: block_id },
            );
        }
        for target in targets {
            if target.index() >= len {
                push(
                    errs,
                    func,
                    VerifyErrorKind::EdgeOutOfRange {
                        block: block_id,
                        target,
                    },
                );
            } else if target.index() == 0 {
                push(
                    errs,
                    func,
                    VerifyErrorKind::EntryHasPredecessor { block: block_id },
                );
            }
        }
    }

    let unreachable = count_unreachable(blocks);
    if unreachable > 0 {
        log::debug!("{}: {} unreachable blocks after lowering", func.name, unreachable);
    }
}

fn count_unreachable(blocks: &[super::BasicBlock]) -> usize {
    let len = blocks.len();
    let mut seen = vec![false; len];
    let mut stack = vec![0usize];
    while let Some(i) = stack.pop() {
        if i >= len || seen[i] {
            continue;
        }
        seen[i] = true;
        if let Some(next) = blocks[i].next {
            stack.push(next.index());
        }
        if let Some(jmp) = &blocks[i].jmp_false {
            stack.push(jmp.target.index());
        }
    }
    seen.iter().filter(|reached| !**reached).count()
}

fn check_cmd(module: &Module, func: &Function, cmd: &Cmd, errs: &mut Vec<Box<dyn ReportableError>>) {
    for value in cmd.get_srcs() {
        check_value(func, value, errs);
    }
    for dst in cmd.get_dsts() {
        if dst.index() >= func.vars.len() {
            push(errs, func, VerifyErrorKind::LocalOutOfRange(dst));
        }
    }
    match cmd {
        Cmd::NewClosure { f_id, .. } | Cmd::InitUpvalues { f_id, .. } => {
            if f_id.index() >= module.functions.len() {
                push(errs, func, VerifyErrorKind::FunctionOutOfRange(*f_id));
            }
        }
        _ => {}
    }
}

fn check_value(func: &Function, value: &Value, errs: &mut Vec<Box<dyn ReportableError>>) {
    match value {
        Value::LocalVar(v) => {
            if v.index() >= func.vars.len() {
                push(errs, func, VerifyErrorKind::LocalOutOfRange(*v));
            }
        }
        Value::Upvalue(u) => {
            if u.index() >= func.captured_vars.len() {
                push(errs, func, VerifyErrorKind::UpvalueOutOfRange(*u));
            }
        }
        _ => {}
    }
}

fn push(errs: &mut Vec<Box<dyn ReportableError>>, func: &Function, kind: VerifyErrorKind) {
    errs.push(Box::new(VerifyError {
        kind,
        function: func.name,
        loc: func.loc.clone(),
    }));
}
