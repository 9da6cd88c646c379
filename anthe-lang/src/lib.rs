//! Compiler core for anthe, a statically-typed companion language that
//! shares its surface syntax with a dynamically-typed host scripting
//! language.
//!
//! This crate owns everything between the type-checking frontend and the
//! backends: the three-address [`ir`] (module/function tables, the closed
//! `Value`/`Cmd` algebra, tree transforms, basic-block lowering and the
//! post-lowering verifier), the interned [`types`] handles the IR carries,
//! and the byte-faithful [`translator`] that erases type annotations to
//! recover legal host-language source.
//!
//! Frontends build an [`ir::Module`] through the `add_*` operations and
//! hand each function a command tree; backends read either the tree or,
//! after [`ir::blockgen::generate_basic_blocks`], the flat block list.

pub mod interner;
pub mod ir;
pub mod translator;
pub mod types;
pub mod utils;
