//! Three-address intermediate representation.
//!
//! A [`Module`] owns record types, globals and [`Function`]s; a function
//! body is a tree of [`Cmd`]s whose operands are pure [`Value`]s. No
//! operand may contain another command: every computation names its
//! destination local explicitly. Field names carry the operand contract —
//! `src`/`srcs` are inputs, `dst`/`dsts` are output locals, a `_typ`
//! suffix marks a type handle, `loc` a source location — and the
//! [`Operands`] derive turns that convention into the generic
//! `get_srcs`/`get_dsts` accessors every later pass is built on.
//!
//! Ids handed out by the `add_*` operations are 1-based, strictly
//! monotonic, and never reused. Basic-block indices are the exception:
//! they are 0-based, and index 0 is always the entry block.

use std::collections::BTreeMap;

use anthe_macros::{Operands, Tagged};

use crate::interner::{Symbol, TypeNodeId};
use crate::utils::metadata::Location;

pub mod blockgen;
pub mod print;
pub mod transform;
pub mod verify;

macro_rules! define_id {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(idx: usize) -> Self {
                Self(idx as u32 + 1)
            }

            /// The 1-based id as handed out by the `add_*` operation.
            pub fn get(self) -> u32 {
                self.0
            }

            /// The 0-based position in the owning sequence.
            pub fn index(self) -> usize {
                self.0 as usize - 1
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Id of a function in its module.
    FunId, "f"
);
define_id!(
    /// Id of a module-level global variable.
    GlobalId, "g"
);
define_id!(
    /// Id of a record type in its module.
    RecordId, "rec"
);
define_id!(
    /// Id of a local variable in its function; the first `arity` locals
    /// are the parameters.
    LocalId, "x"
);
define_id!(
    /// Id of an upvalue captured by its function.
    UpvalId, "u"
);

/// Index of a basic block in a lowered function. 0-based: index 0 is the
/// entry block, the last index the exit block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// A declared variable. `name` is absent for compiler-synthesized
/// temporaries.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Option<Symbol>,
    pub typ: TypeNodeId,
}

/// One compilation unit. All cross-references inside it are by id, and
/// every id allocated here stays valid for the life of the module.
#[derive(Debug, Default)]
pub struct Module {
    pub record_types: Vec<TypeNodeId>,
    pub functions: Vec<Function>,
    pub globals: Vec<VarDecl>,
    /// Append-only, insertion-ordered export sets.
    pub exported_functions: Vec<FunId>,
    pub exported_globals: Vec<GlobalId>,
    /// Opaque location id the frontend attaches to the export table.
    pub loc_id_of_exports: Option<u32>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record_type(&mut self, typ: TypeNodeId) -> RecordId {
        let id = RecordId::from_index(self.record_types.len());
        self.record_types.push(typ);
        id
    }

    pub fn add_function(&mut self, loc: Location, name: Symbol, typ: TypeNodeId) -> FunId {
        let id = FunId::from_index(self.functions.len());
        self.functions.push(Function::new(loc, name, typ));
        id
    }

    pub fn add_global(&mut self, name: Symbol, typ: TypeNodeId) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        self.globals.push(VarDecl {
            name: Some(name),
            typ,
        });
        id
    }

    pub fn add_exported_function(&mut self, f_id: FunId) {
        assert!(
            !self.exported_functions.contains(&f_id),
            "function {f_id} is already exported"
        );
        self.exported_functions.push(f_id);
    }

    pub fn add_exported_global(&mut self, g_id: GlobalId) {
        assert!(
            !self.exported_globals.contains(&g_id),
            "global {g_id} is already exported"
        );
        self.exported_globals.push(g_id);
    }

    pub fn function(&self, f_id: FunId) -> &Function {
        &self.functions[f_id.index()]
    }

    pub fn function_mut(&mut self, f_id: FunId) -> &mut Function {
        &mut self.functions[f_id.index()]
    }
}

/// A function and its whole local name space.
#[derive(Debug)]
pub struct Function {
    pub loc: Location,
    pub name: Symbol,
    /// Handle to a `Type::Function` listing parameter and return types.
    pub typ: TypeNodeId,
    /// Locals; the first `arity` entries are the parameters in order.
    pub vars: Vec<VarDecl>,
    pub captured_vars: Vec<VarDecl>,
    /// Which function's closure provides each upvalue.
    pub f_id_of_upvalue: BTreeMap<UpvalId, FunId>,
    /// For locals that escape as upvalues, the capturing function.
    pub f_id_of_local: BTreeMap<LocalId, FunId>,
    /// Root command; absent until the frontend finishes lowering.
    pub body: Option<Cmd>,
    /// Absent until `generate_basic_blocks` runs.
    pub blocks: Option<Vec<BasicBlock>>,
    /// Header blocks opened by `Loop` lowering; the only blocks allowed
    /// to fall through to themselves. Filled by `generate_basic_blocks`.
    pub loop_headers: Vec<BlockId>,
}

impl Function {
    fn new(loc: Location, name: Symbol, typ: TypeNodeId) -> Self {
        Self {
            loc,
            name,
            typ,
            vars: Vec::new(),
            captured_vars: Vec::new(),
            f_id_of_upvalue: BTreeMap::new(),
            f_id_of_local: BTreeMap::new(),
            body: None,
            blocks: None,
            loop_headers: Vec::new(),
        }
    }

    pub fn add_local(&mut self, name: Option<Symbol>, typ: TypeNodeId) -> LocalId {
        let id = LocalId::from_index(self.vars.len());
        self.vars.push(VarDecl { name, typ });
        id
    }

    pub fn add_upvalue(&mut self, name: Option<Symbol>, typ: TypeNodeId) -> UpvalId {
        let id = UpvalId::from_index(self.captured_vars.len());
        self.captured_vars.push(VarDecl { name, typ });
        id
    }

    /// Number of parameters, read off the function type.
    pub fn arity(&self) -> usize {
        self.typ
            .to_type()
            .as_function()
            .expect("function must carry a function type")
            .0
            .len()
    }

    /// Local id of the `i`-th parameter, 1-based.
    pub fn arg_var(&self, i: usize) -> LocalId {
        assert!(
            i >= 1 && i <= self.arity(),
            "parameter index {i} out of range for {} parameters",
            self.arity()
        );
        LocalId::from_index(i - 1)
    }

    pub fn var(&self, v_id: LocalId) -> &VarDecl {
        &self.vars[v_id.index()]
    }
}

/// A pure operand; evaluating one never has side effects.
#[derive(Debug, Clone, Copy, PartialEq, Tagged)]
#[tag(prefix = "ir.Value")]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Symbol),
    LocalVar(LocalId),
    Upvalue(UpvalId),
}

/// Typed unary operators; the frontend selects the operator from the
/// operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    IntNeg,
    IntBNot,
    FltNeg,
    BoolNot,
    StrLen,
}

/// Typed binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    IntAdd,
    IntSub,
    IntMul,
    IntDivi,
    IntMod,
    IntBAnd,
    IntBOr,
    IntBXor,
    IntShl,
    IntShr,
    IntEq,
    IntNeq,
    IntLt,
    IntGt,
    IntLeq,
    IntGeq,
    FltAdd,
    FltSub,
    FltMul,
    FltDiv,
    FltMod,
    FltPow,
    FltEq,
    FltNeq,
    FltLt,
    FltGt,
    FltLeq,
    FltGeq,
    StrEq,
    StrNeq,
    StrLt,
    StrGt,
    StrLeq,
    StrGeq,
}

/// An effectful or control-flow node.
///
/// Only `Seq`, `If`, `Loop` and `For` contain child commands; every other
/// variant is a leaf for traversal purposes.
#[derive(Debug, Clone, PartialEq, Tagged, Operands)]
#[tag(prefix = "ir.Cmd")]
pub enum Cmd {
    Nop,
    Seq {
        cmds: Vec<Cmd>,
    },
    Move {
        loc: Location,
        dst: LocalId,
        src: Value,
    },
    Unop {
        loc: Location,
        dst: LocalId,
        op: UnOp,
        src: Value,
    },
    Binop {
        loc: Location,
        dst: LocalId,
        op: BinOp,
        src1: Value,
        src2: Value,
    },
    Concat {
        loc: Location,
        dst: LocalId,
        srcs: Vec<Value>,
    },
    ToFloat {
        loc: Location,
        dst: LocalId,
        src: Value,
    },
    /// Boxes a typed value into the host's dynamic representation.
    ToDyn {
        loc: Location,
        src_typ: TypeNodeId,
        dst: LocalId,
        src: Value,
    },
    /// Narrows a dynamic value back to `dst_typ`.
    FromDyn {
        loc: Location,
        dst_typ: TypeNodeId,
        dst: LocalId,
        src: Value,
    },
    IsTruthy {
        loc: Location,
        dst: LocalId,
        src: Value,
    },
    IsNil {
        loc: Location,
        dst: LocalId,
        src: Value,
    },
    NewArr {
        loc: Location,
        dst: LocalId,
        src_size: Value,
    },
    GetArr {
        loc: Location,
        dst_typ: TypeNodeId,
        dst: LocalId,
        src_arr: Value,
        src_i: Value,
    },
    SetArr {
        loc: Location,
        src_typ: TypeNodeId,
        src_arr: Value,
        src_i: Value,
        src_v: Value,
    },
    NewTable {
        loc: Location,
        dst: LocalId,
        src_size: Value,
    },
    GetTable {
        loc: Location,
        dst_typ: TypeNodeId,
        dst: LocalId,
        src_tab: Value,
        src_k: Value,
    },
    SetTable {
        loc: Location,
        src_typ: TypeNodeId,
        src_tab: Value,
        src_k: Value,
        src_v: Value,
    },
    NewRecord {
        loc: Location,
        rec_typ: TypeNodeId,
        dst: LocalId,
    },
    GetField {
        loc: Location,
        rec_typ: TypeNodeId,
        dst: LocalId,
        src_rec: Value,
        field_name: Symbol,
    },
    SetField {
        loc: Location,
        rec_typ: TypeNodeId,
        src_rec: Value,
        field_name: Symbol,
        src_v: Value,
    },
    /// Creates the closure object for `f_id` with an uninitialised
    /// upvalue vector.
    NewClosure {
        loc: Location,
        dst: LocalId,
        f_id: FunId,
    },
    /// Fills the upvalue vector of a closure created by `NewClosure`.
    /// Split from the creation so self- and mutually-recursive closures
    /// can name themselves without back-patching.
    InitUpvalues {
        loc: Location,
        src_f: Value,
        srcs: Vec<Value>,
        f_id: FunId,
    },
    /// Call of a statically-known function. `dsts` holds one entry per
    /// return slot; an absent entry discards that value.
    CallStatic {
        loc: Location,
        f_typ: TypeNodeId,
        dsts: Vec<Option<LocalId>>,
        src_f: Value,
        srcs: Vec<Value>,
    },
    /// Call through a first-class function value.
    CallDyn {
        loc: Location,
        f_typ: TypeNodeId,
        dsts: Vec<Option<LocalId>>,
        src_f: Value,
        srcs: Vec<Value>,
    },
    /// Terminates execution with a message when reached at run time.
    /// Never raised while building the IR.
    RuntimeError {
        loc: Location,
        msg: String,
    },
    BuiltinIoWrite {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathAbs {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathCeil {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathFloor {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathFmod {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathExp {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathLn {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathLog {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathModf {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathPow {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinMathSqrt {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinStringChar {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinStringSub {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinType {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    BuiltinTostring {
        loc: Location,
        dsts: Vec<Option<LocalId>>,
        srcs: Vec<Value>,
    },
    Return {
        loc: Location,
        srcs: Vec<Value>,
    },
    Break,
    Loop {
        body: Box<Cmd>,
    },
    If {
        loc: Location,
        src_condition: Value,
        then_: Box<Cmd>,
        else_: Box<Cmd>,
    },
    /// Counted loop over `dst`; lowering expands it into explicit
    /// init/test/step commands (see `blockgen`).
    For {
        loc: Location,
        dst: LocalId,
        src_start: Value,
        src_limit: Value,
        src_step: Value,
        body: Box<Cmd>,
    },
    /// Allocation-safe point where the host garbage collector may run.
    CheckGC,
}

impl Default for Cmd {
    fn default() -> Self {
        Cmd::Nop
    }
}

impl Cmd {
    /// True for commands that end a basic block with no fall-through.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Cmd::Return { .. } | Cmd::RuntimeError { .. })
    }
}

/// A maximal straight-line command sequence. `next` is the fall-through
/// successor (absent for terminal blocks); when `jmp_false` is present
/// and its condition is falsy, control transfers to its target instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicBlock {
    pub cmds: Vec<Cmd>,
    pub next: Option<BlockId>,
    pub jmp_false: Option<JmpFalse>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JmpFalse {
    pub target: BlockId,
    pub src_condition: Value,
}
