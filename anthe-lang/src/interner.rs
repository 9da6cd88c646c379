use std::cell::RefCell;

use id_arena::{Arena, Id};
use string_interner::{backend::StringBackend, StringInterner};

use crate::types::Type;

/// Per-session storage shared by every compilation stage: the symbol
/// table and the arena that owns all interned types.
pub struct SessionGlobals {
    pub symbol_interner: StringInterner<StringBackend<usize>>,
    pub type_storage: Arena<Type>,
}

impl SessionGlobals {
    pub(crate) fn store_type(&mut self, ty: Type) -> TypeNodeId {
        TypeNodeId(self.type_storage.alloc(ty))
    }

    pub(crate) fn get_type(&self, type_id: TypeNodeId) -> &Type {
        self.type_storage
            .get(type_id.0)
            .expect("unknown TypeNodeId")
    }
}

thread_local!(static SESSION_GLOBALS: RefCell<SessionGlobals> = RefCell::new(
    SessionGlobals {
        symbol_interner: StringInterner::new(),
        type_storage: Arena::new(),
    }
));

pub fn with_session_globals<R, F>(f: F) -> R
where
    F: FnOnce(&mut SessionGlobals) -> R,
{
    SESSION_GLOBALS.with_borrow_mut(f)
}

/// An interned string. Identifiers, field names, string literals and
/// source paths are all stored once per session and compared by index.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Symbol(pub usize);

pub trait ToSymbol {
    fn to_symbol(&self) -> Symbol;
}

impl<T: AsRef<str>> ToSymbol for T {
    fn to_symbol(&self) -> Symbol {
        Symbol(with_session_globals(|session_globals| {
            session_globals.symbol_interner.get_or_intern(self.as_ref())
        }))
    }
}

impl Symbol {
    pub fn as_str(&self) -> &str {
        with_session_globals(|session_globals| unsafe {
            // This transmute is needed to convince the borrow checker. Since
            // the session globals exist until the end of the session, this
            // &str lives sufficiently long.
            std::mem::transmute::<&str, &str>(
                session_globals
                    .symbol_interner
                    .resolve(self.0)
                    .expect("invalid symbol"),
            )
        })
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque handle to an interned [`Type`]. The IR stores only handles;
/// the two supported operations are equality and inspecting the tag via
/// [`TypeNodeId::to_type`].
#[derive(Debug, Clone, Copy)]
pub struct TypeNodeId(pub Id<Type>);

impl TypeNodeId {
    pub fn to_type(&self) -> &Type {
        with_session_globals(|session_globals| unsafe {
            // Same lifetime argument as Symbol::as_str: the arena only
            // grows, so the reference stays valid for the session.
            std::mem::transmute::<&Type, &Type>(session_globals.get_type(*self))
        })
    }
}

// Handles are compared by the type they name, not by arena slot, so the
// same type interned twice still compares equal.
impl PartialEq for TypeNodeId {
    fn eq(&self, other: &Self) -> bool {
        self.to_type() == other.to_type()
    }
}

impl Eq for TypeNodeId {}
