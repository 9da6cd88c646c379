use std::fmt;

use crate::format_vec;

use super::*;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::LocalVar(v) => write!(f, "{v}"),
            Value::Upvalue(u) => write!(f, "{u}"),
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnOp::IntNeg => "negi",
            UnOp::IntBNot => "bnoti",
            UnOp::FltNeg => "negf",
            UnOp::BoolNot => "not",
            UnOp::StrLen => "lens",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::IntAdd => "addi",
            BinOp::IntSub => "subi",
            BinOp::IntMul => "muli",
            BinOp::IntDivi => "divi",
            BinOp::IntMod => "modi",
            BinOp::IntBAnd => "bandi",
            BinOp::IntBOr => "bori",
            BinOp::IntBXor => "bxori",
            BinOp::IntShl => "shli",
            BinOp::IntShr => "shri",
            BinOp::IntEq => "eqi",
            BinOp::IntNeq => "nei",
            BinOp::IntLt => "lti",
            BinOp::IntGt => "gti",
            BinOp::IntLeq => "lei",
            BinOp::IntGeq => "gei",
            BinOp::FltAdd => "addf",
            BinOp::FltSub => "subf",
            BinOp::FltMul => "mulf",
            BinOp::FltDiv => "divf",
            BinOp::FltMod => "modf",
            BinOp::FltPow => "powf",
            BinOp::FltEq => "eqf",
            BinOp::FltNeq => "nef",
            BinOp::FltLt => "ltf",
            BinOp::FltGt => "gtf",
            BinOp::FltLeq => "lef",
            BinOp::FltGeq => "gef",
            BinOp::StrEq => "eqs",
            BinOp::StrNeq => "nes",
            BinOp::StrLt => "lts",
            BinOp::StrGt => "gts",
            BinOp::StrLeq => "les",
            BinOp::StrGeq => "ges",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for VarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{name}: {}", self.typ.to_type()),
            None => write!(f, "_: {}", self.typ.to_type()),
        }
    }
}

// Leaf commands print as `<dsts> := <mnemonic> <srcs>` with the few
// non-operand annotations appended; the generic accessors keep this in
// sync with the variant declarations for free.
fn fmt_leaf(f: &mut fmt::Formatter<'_>, cmd: &Cmd) -> fmt::Result {
    let dsts = cmd.get_dsts();
    if !dsts.is_empty() {
        write!(f, "{} := ", format_vec!(dsts, ", "))?;
    }
    match cmd {
        Cmd::Unop { op, .. } => write!(f, "{op}")?,
        Cmd::Binop { op, .. } => write!(f, "{op}")?,
        _ => {
            let tag = cmd.tag().rsplit('.').next().unwrap_or_default();
            write!(f, "{}", tag.to_lowercase())?
        }
    }
    let srcs = cmd.get_srcs();
    if !srcs.is_empty() {
        write!(f, " {}", format_vec!(srcs, ", "))?;
    }
    match cmd {
        Cmd::GetField { field_name, .. } | Cmd::SetField { field_name, .. } => {
            write!(f, " .{field_name}")?
        }
        Cmd::NewClosure { f_id, .. } | Cmd::InitUpvalues { f_id, .. } => write!(f, " {f_id}")?,
        Cmd::RuntimeError { msg, .. } => write!(f, " {msg:?}")?,
        _ => {}
    }
    Ok(())
}

fn fmt_cmd(f: &mut fmt::Formatter<'_>, cmd: &Cmd, indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    match cmd {
        Cmd::Seq { cmds } => {
            writeln!(f, "{pad}seq")?;
            for c in cmds {
                fmt_cmd(f, c, indent + 1)?;
            }
            Ok(())
        }
        Cmd::If {
            src_condition,
            then_,
            else_,
            ..
        } => {
            writeln!(f, "{pad}if {src_condition}")?;
            fmt_cmd(f, then_, indent + 1)?;
            writeln!(f, "{pad}else")?;
            fmt_cmd(f, else_, indent + 1)
        }
        Cmd::Loop { body } => {
            writeln!(f, "{pad}loop")?;
            fmt_cmd(f, body, indent + 1)
        }
        Cmd::For {
            dst,
            src_start,
            src_limit,
            src_step,
            body,
            ..
        } => {
            writeln!(f, "{pad}for {dst} := {src_start}, {src_limit}, {src_step}")?;
            fmt_cmd(f, body, indent + 1)
        }
        leaf => {
            write!(f, "{pad}")?;
            fmt_leaf(f, leaf)?;
            writeln!(f)
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_cmd(f, self, 0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fn {} {}", self.name, self.typ.to_type())?;
        for (i, v) in self.vars.iter().enumerate() {
            writeln!(f, "  {} {v}", LocalId::from_index(i))?;
        }
        for (i, u) in self.captured_vars.iter().enumerate() {
            writeln!(f, "  {} {u}", UpvalId::from_index(i))?;
        }
        if let Some(blocks) = &self.blocks {
            for (i, block) in blocks.iter().enumerate() {
                write!(f, "  block {i}:")?;
                if let Some(JmpFalse {
                    target,
                    src_condition,
                }) = &block.jmp_false
                {
                    write!(f, " jmp_false({src_condition}) -> {target}")?;
                }
                match block.next {
                    Some(next) => writeln!(f, " next -> {next}")?,
                    None => writeln!(f)?,
                }
                for cmd in &block.cmds {
                    write!(f, "    ")?;
                    fmt_leaf(f, cmd)?;
                    writeln!(f)?;
                }
            }
            Ok(())
        } else if let Some(body) = &self.body {
            fmt_cmd(f, body, 1)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, typ) in self.record_types.iter().enumerate() {
            writeln!(f, "record {} {}", RecordId::from_index(i), typ.to_type())?;
        }
        for (i, g) in self.globals.iter().enumerate() {
            writeln!(f, "global {} {g}", GlobalId::from_index(i))?;
        }
        for func in self.functions.iter() {
            write!(f, "{func}")?;
        }
        if !self.exported_functions.is_empty() {
            writeln!(f, "exported functions: {}", format_vec!(self.exported_functions, ", "))?;
        }
        if !self.exported_globals.is_empty() {
            writeln!(f, "exported globals: {}", format_vec!(self.exported_globals, ", "))?;
        }
        Ok(())
    }
}
