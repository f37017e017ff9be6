use crate::*;

/// Error raised by a compilation step which points at shader source
pub trait CompileError {
    fn print(&self, w: &mut MessagePrinter) -> std::fmt::Result;
}

/// Writes diagnostics as `file:line:col: error: message` followed by the source line and a caret
pub struct MessagePrinter<'s, 'f> {
    source_manager: &'s SourceManager,
    formatter: &'s mut std::fmt::Formatter<'f>,
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Severity {
    Error,
    Note,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Callback writing the text of one message
pub type WriteMessage<'w> = &'w dyn Fn(&mut std::fmt::Formatter) -> std::fmt::Result;

impl<'s, 'f> MessagePrinter<'s, 'f> {
    pub fn write_message(&mut self, write: WriteMessage, loc: SourceLocation, severity: Severity) -> std::fmt::Result {
        let file_location = self.source_manager.get_file_location(loc);
        if file_location == FileLocation::Unknown {
            write!(self.formatter, "{severity}: ")?;
            write(self.formatter)?;
            return writeln!(self.formatter);
        }

        write!(self.formatter, "{file_location}: {severity}: ")?;
        write(self.formatter)?;
        writeln!(self.formatter)?;
        self.source_manager.write_source_for_error(self.formatter, loc)
    }

    pub fn error(&mut self, loc: SourceLocation, write: WriteMessage) -> std::fmt::Result {
        self.write_message(write, loc, Severity::Error)
    }

    pub fn note(&mut self, loc: SourceLocation, write: WriteMessage) -> std::fmt::Result {
        self.write_message(write, loc, Severity::Note)
    }
}

/// Extension trait for [CompileError]
pub trait CompileErrorExt {
    /// Pair the error with the files it points into so it can be printed
    fn display<'p>(&'p self, source_manager: &'p SourceManager) -> CompileErrorPrinter<'p>;

    /// Print the error into a string
    fn render(&self, source_manager: &SourceManager) -> String {
        self.display(source_manager).to_string()
    }
}

impl<T: CompileError + Sized> CompileErrorExt for T {
    fn display<'p>(&'p self, source_manager: &'p SourceManager) -> CompileErrorPrinter<'p> {
        CompileErrorPrinter {
            error: self,
            source_manager,
        }
    }
}

/// Implements [Display][std::fmt::Display] for a [CompileError]
pub struct CompileErrorPrinter<'p> {
    error: &'p dyn CompileError,
    source_manager: &'p SourceManager,
}

impl std::fmt::Display for CompileErrorPrinter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.error.print(&mut MessagePrinter {
            source_manager: self.source_manager,
            formatter: f,
        })
    }
}

#[test]
fn test_render_points_at_source() {
    struct UnknownName(SourceLocation);

    impl CompileError for UnknownName {
        fn print(&self, w: &mut MessagePrinter) -> std::fmt::Result {
            w.error(self.0, &|f| write!(f, "unknown identifier 'z'"))
        }
    }

    let mut source_manager = SourceManager::new();
    let file_id = source_manager.add_file(
        FileName(String::from("a.gfx")),
        String::from("int x;\n\tfloat y = z;\n"),
    );
    let loc = source_manager.get_source_location_from_file_offset(file_id, StreamLocation(18));

    assert_eq!(
        UnknownName(loc).render(&source_manager),
        "a.gfx:2:12: error: unknown identifier 'z'\n\tfloat y = z;\n\t          ^\n"
    );
    assert_eq!(
        UnknownName(SourceLocation::UNKNOWN).render(&source_manager),
        "error: unknown identifier 'z'\n"
    );
}
