// Derive macros for the closed sum types of the anthe IR. The accessors
// they generate are driven purely by the enum declaration: variant names
// become stable tag strings, and operand lists are recovered from the
// `src`/`srcs`/`dst`/`dsts` field-name convention documented in
// `anthe-lang/src/ir.rs`.

mod output;

extern crate proc_macro;

use syn::{parse_macro_input, DeriveInput};

/// Derives `fn tag(&self) -> &'static str` returning a stable
/// `"<prefix>.<Variant>"` string for the active variant.
///
/// The prefix defaults to the enum name and can be overridden with
/// `#[tag(prefix = "ir.Cmd")]`.
#[proc_macro_derive(Tagged, attributes(tag))]
pub fn derive_tagged(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match output::generate_tagged(input) {
        Ok(out) => out.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives `fn get_srcs(&self) -> Vec<&Value>` and
/// `fn get_dsts(&self) -> Vec<LocalId>` from field names alone.
///
/// Classification: fields ending in `_typ` are type handles and never
/// operands; `srcs*` fields are operand vectors; other `src*` fields are
/// scalar operands; `dsts` fields are vectors of optional destinations
/// (absent entries are skipped); other `dst*` fields are scalar
/// destinations. Scalars come first in declaration order, then the
/// vectors, flattened.
///
/// The generated code names `crate::ir::Value` and `crate::ir::LocalId`,
/// so the derive is only meaningful inside the `ir` module of
/// `anthe-lang`.
#[proc_macro_derive(Operands)]
pub fn derive_operands(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match output::generate_operands(input) {
        Ok(out) => out.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
