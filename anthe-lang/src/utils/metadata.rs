use crate::interner::Symbol;

pub type Span = std::ops::Range<usize>;

/// A byte range inside a named source file. Every effectful command
/// carries one so diagnostics can point back at the surface program.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub span: Span,
    pub path: Symbol,
}

impl Location {
    pub fn new(span: Span, path: Symbol) -> Self {
        Self { span, path }
    }
}

impl ariadne::Span for Location {
    type SourceId = Symbol;

    fn source(&self) -> &Self::SourceId {
        &self.path
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}
