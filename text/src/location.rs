/// Source file location
/// Requires `SourceManager` to decode
#[derive(PartialEq, Eq, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct SourceLocation(u32);

impl SourceLocation {
    /// Source location that represents an unknown source
    pub const UNKNOWN: SourceLocation = SourceLocation(u32::MAX);

    /// Create first source location
    pub fn first() -> Self {
        SourceLocation(0)
    }

    /// Add an offset to a source location
    /// Expects the offset to be within range of the stream
    pub fn offset(self, offset: u32) -> Self {
        if self == SourceLocation::UNKNOWN {
            self
        } else {
            SourceLocation(self.0 + offset)
        }
    }

    /// Get the raw integer inside the location
    pub fn get_raw(&self) -> u32 {
        self.0
    }
}

/// Trait for items that have a start location
pub trait Locate {
    fn get_location(&self) -> SourceLocation;
}

/// Trait for items that have an end location
pub trait LocateEnd {
    fn get_end_location(&self) -> SourceLocation;
}

/// Owns all source files loaded into the compiler
///
/// Every file gets a distinct range of [SourceLocation] values so a location alone identifies both file and offset.
pub struct SourceManager {
    files: Vec<SourceFile>,
    next_location: SourceLocation,
}

impl SourceManager {
    /// Create a new source manager with no files
    pub fn new() -> Self {
        SourceManager {
            files: Vec::new(),
            next_location: SourceLocation::first(),
        }
    }

    /// Add a file into the source manager
    pub fn add_file(&mut self, file_name: FileName, contents: String) -> FileId {
        assert!(contents.len() < u32::MAX as usize);
        assert!(self.files.len() < u32::MAX as usize);
        let file_id = FileId(self.files.len() as u32);
        let file_size = contents.len() as u32;
        self.files.push(SourceFile {
            file_name,
            file_size,
            contents,
            base_location: self.next_location,
        });
        // Base source location + file size is used for the trailing endline, so we reserve file size + 1 slots
        self.next_location = self.next_location.offset(file_size + 1);
        file_id
    }

    /// Add an unnamed block of text into the source manager
    pub fn add_fragment(&mut self, contents: &str) -> (FileId, SourceLocation) {
        let file_id = self.add_file(FileName(String::from("<fragment>")), contents.to_string());
        let location = self.get_source_location_from_file_offset(file_id, StreamLocation(0));
        (file_id, location)
    }

    /// Get the full source for a given file
    pub fn get_contents(&self, file_id: FileId) -> &str {
        &self.files[file_id.0 as usize].contents
    }

    /// Get the name of a file
    pub fn get_file_name(&self, file_id: FileId) -> &FileName {
        &self.files[file_id.0 as usize].file_name
    }

    /// Get the source location from a certain position in a file
    pub fn get_source_location_from_file_offset(
        &self,
        file_id: FileId,
        stream_location: StreamLocation,
    ) -> SourceLocation {
        let source_file = &self.files[file_id.0 as usize];
        assert!(stream_location.0 < source_file.file_size + 1);
        source_file.base_location.offset(stream_location.0)
    }

    /// Get the file id and offset from a source location
    pub fn get_file_offset_from_source_location(
        &self,
        source_location: SourceLocation,
    ) -> Option<(FileId, StreamLocation)> {
        if source_location == SourceLocation::UNKNOWN {
            return None;
        }
        for (i, source_file) in self.files.iter().enumerate() {
            let start = source_file.base_location.0;
            let end = start + source_file.file_size + 1;
            if source_location.0 >= start && source_location.0 < end {
                return Some((FileId(i as u32), StreamLocation(source_location.0 - start)));
            }
        }
        None
    }

    /// Get the full file location information from a source location
    pub fn get_file_location(&self, source_location: SourceLocation) -> FileLocation {
        let (file_id, offset) = match self.get_file_offset_from_source_location(source_location) {
            Some(found) => found,
            None => return FileLocation::Unknown,
        };

        let source_file = &self.files[file_id.0 as usize];
        let mut line = Line::first();
        let mut column = Column::first();
        for c in &source_file.contents.as_bytes()[..(offset.0 as usize)] {
            match c {
                b'\n' => {
                    line.increment();
                    column = Column::first();
                }
                _ => {
                    column.increment();
                }
            }
        }
        FileLocation::Known(source_file.file_name.clone(), line, column)
    }

    /// Write the source line holding a location with a caret under the located character
    ///
    /// Tabs before the caret are kept so the caret lines up in a terminal.
    pub fn write_source_for_error(&self, f: &mut std::fmt::Formatter, source_location: SourceLocation) -> std::fmt::Result {
        let (file_id, offset) = match self.get_file_offset_from_source_location(source_location) {
            Some(found) => found,
            None => return Ok(()),
        };

        let contents = self.get_contents(file_id);
        let index = (offset.0 as usize).min(contents.len());
        let line_start = contents[..index].rfind('\n').map_or(0, |i| i + 1);
        let line_end = contents[index..].find('\n').map_or(contents.len(), |i| index + i);
        let line = contents[line_start..line_end].trim_end_matches('\r');
        writeln!(f, "{line}")?;

        let indent = contents[line_start..index]
            .chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect::<String>();
        writeln!(f, "{indent}^")
    }
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer for a single loaded file
struct SourceFile {
    file_name: FileName,
    file_size: u32,
    contents: String,
    base_location: SourceLocation,
}

/// A source file identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileId(u32);

/// A file used as an input
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct FileName(pub String);

/// A line number in a file
#[derive(PartialEq, PartialOrd, Debug, Copy, Clone)]
pub struct Line(pub u32);

impl Line {
    /// Construct for the first line
    pub fn first() -> Self {
        Line(1)
    }

    /// Move to the next line
    pub fn increment(&mut self) {
        self.0 += 1
    }
}

/// The column index in a line
#[derive(PartialEq, PartialOrd, Debug, Copy, Clone)]
pub struct Column(pub u32);

impl Column {
    /// Construct for the first column
    pub fn first() -> Self {
        Column(1)
    }

    /// Move to the next column
    pub fn increment(&mut self) {
        self.0 += 1
    }
}

/// Fully qualified location
#[derive(PartialEq, Debug, Clone)]
pub enum FileLocation {
    Known(FileName, Line, Column),
    Unknown,
}

impl std::fmt::Display for FileLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            FileLocation::Known(file_name, line, column) => {
                write!(f, "{}:{}:{}", file_name.0, line.0, column.0)
            }
            FileLocation::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// The raw number of bytes from the start of a stream
#[derive(PartialEq, PartialOrd, Debug, Copy, Clone)]
pub struct StreamLocation(pub u32);

/// Wrapper to pair a node with a source location
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Located<T> {
    pub node: T,
    pub location: SourceLocation,
}

impl<T> Located<T> {
    /// Create a located object with a location
    pub fn new(node: T, loc: SourceLocation) -> Located<T> {
        Located {
            node,
            location: loc,
        }
    }

    // Extract the node and discard the location
    pub fn to_node(self) -> T {
        self.node
    }

    /// Create a located object with no location
    pub fn none(node: T) -> Located<T> {
        Located {
            node,
            location: SourceLocation::UNKNOWN,
        }
    }
}

impl<T> std::ops::Deref for Located<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.node
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Located<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?} @ {}", self.node, self.location.get_raw())
    }
}

#[test]
fn check_file_location() {
    let mut source_manager = SourceManager::new();
    let (a, a_loc) = source_manager.add_fragment("ab\ncd");
    let (b, b_loc) = source_manager.add_fragment("efg");
    assert_eq!(a_loc, SourceLocation::first());
    assert_eq!(b_loc.get_raw(), 6);

    assert_eq!(
        source_manager.get_file_offset_from_source_location(a_loc.offset(4)),
        Some((a, StreamLocation(4)))
    );
    assert_eq!(
        source_manager.get_file_offset_from_source_location(b_loc.offset(1)),
        Some((b, StreamLocation(1)))
    );
    assert_eq!(
        format!("{}", source_manager.get_file_location(a_loc.offset(4))),
        "<fragment>:2:2"
    );
    assert_eq!(
        source_manager.get_file_location(SourceLocation::UNKNOWN),
        FileLocation::Unknown
    );
}
