use std::fmt;

use crate::format_vec;
use crate::interner::{with_session_globals, Symbol, TypeNodeId};

pub mod builder;

/// Source-language types as the IR sees them. The IR never computes with
/// types; it stores handles, compares them, and dispatches on the tag in
/// the few places that need it (integer vs. float `for` loops, dynamic
/// boxing).
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    /// The boxed dynamic type of the host language.
    Any,
    Array(TypeNodeId),
    Table(Vec<(Symbol, TypeNodeId)>),
    Record(Symbol, Vec<(Symbol, TypeNodeId)>),
    /// Parameter types and return types; host functions return multiple
    /// values.
    Function(Vec<TypeNodeId>, Vec<TypeNodeId>),
}

impl Type {
    /// Interns the type in the session arena and returns its handle.
    pub fn into_id(self) -> TypeNodeId {
        with_session_globals(|session_globals| session_globals.store_type(self))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float)
    }

    pub fn as_function(&self) -> Option<(&[TypeNodeId], &[TypeNodeId])> {
        match self {
            Type::Function(params, rets) => Some((params, rets)),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nil => write!(f, "nil"),
            Type::Boolean => write!(f, "boolean"),
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Any => write!(f, "any"),
            Type::Array(elem) => write!(f, "{{{}}}", elem.to_type()),
            Type::Table(fields) => {
                let fs = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}: {}", ty.to_type()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{fs}}}")
            }
            Type::Record(name, _) => write!(f, "{name}"),
            Type::Function(params, rets) => {
                let ps = format_vec!(params.iter().map(|t| t.to_type()).collect::<Vec<_>>(), ", ");
                let rs = format_vec!(rets.iter().map(|t| t.to_type()).collect::<Vec<_>>(), ", ");
                write!(f, "({ps}) -> ({rs})")
            }
        }
    }
}
