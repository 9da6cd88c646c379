use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::interner::Symbol;

use super::metadata::Location;

pub trait ReportableError: std::error::Error {
    /// Verbose message used as the report headline.
    fn get_message(&self) -> String {
        self.to_string()
    }
    /// Labels pointing at the positions involved in the error.
    fn get_labels(&self) -> Vec<(Location, String)>;
}

struct FileCache {
    src: ariadne::Source<String>,
}

impl ariadne::Cache<Symbol> for FileCache {
    type Storage = String;

    fn fetch(
        &mut self,
        _id: &Symbol,
    ) -> Result<&Source<Self::Storage>, Box<dyn std::fmt::Debug + '_>> {
        Ok(&self.src)
    }

    fn display<'a>(&self, id: &'a Symbol) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(id.to_string()))
    }
}

pub fn report(src: &str, errs: &[Box<dyn ReportableError>]) {
    let mut colors = ColorGenerator::new();
    for e in errs {
        let rawlabels = e.get_labels();
        let labels = rawlabels.iter().map(|(loc, message)| {
            Label::new(loc.clone())
                .with_message(message)
                .with_color(colors.next())
        });
        let path = rawlabels
            .first()
            .map(|(loc, _)| loc.path)
            .unwrap_or_default();
        Report::build(ReportKind::Error, path, 4)
            .with_message(e.get_message())
            .with_labels(labels)
            .finish()
            .eprint(FileCache {
                src: ariadne::Source::from(src.to_string()),
            })
            .unwrap();
    }
}

pub fn dump_to_string(errs: &[Box<dyn ReportableError>]) -> String {
    let mut res = String::new();
    for e in errs {
        res += e.get_message().as_str();
        res += "\n";
    }
    res
}
