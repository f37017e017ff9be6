use std::path::{Path, PathBuf};

/// Error cases for file loading
#[derive(PartialEq, Debug, Clone)]
pub enum IncludeError {
    FileNotFound,
    FileNotText,
}

impl std::fmt::Display for IncludeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IncludeError::FileNotFound => write!(f, "file not found"),
            IncludeError::FileNotText => write!(f, "file is not valid UTF-8 text"),
        }
    }
}

/// Return data after loading from a file
pub struct FileData {
    /// Resolved name of the file, used for diagnostics and as the parent of nested includes
    pub real_name: String,
    pub contents: String,
}

/// Trait for loading shader files and the targets of #include directives
pub trait IncludeHandler {
    /// Load a file
    ///
    /// `parent` is the resolved name of the including file - or None for the top level shader
    fn load(&mut self, file_name: &str, parent: Option<&str>) -> Result<FileData, IncludeError>;
}

/// A file loader that fails to load any files
pub struct NullIncludeHandler;

impl IncludeHandler for NullIncludeHandler {
    fn load(&mut self, _: &str, _: Option<&str>) -> Result<FileData, IncludeError> {
        Err(IncludeError::FileNotFound)
    }
}

/// In memory set of files - useful for tests and embedded shader libraries
impl IncludeHandler for [(&str, &str)] {
    fn load(&mut self, file_name: &str, _: Option<&str>) -> Result<FileData, IncludeError> {
        for (name, contents) in self.iter() {
            if *name == file_name {
                return Ok(FileData {
                    real_name: name.to_string(),
                    contents: contents.to_string(),
                });
            }
        }
        Err(IncludeError::FileNotFound)
    }
}

impl<const N: usize> IncludeHandler for [(&str, &str); N] {
    fn load(&mut self, file_name: &str, parent: Option<&str>) -> Result<FileData, IncludeError> {
        self.as_mut_slice().load(file_name, parent)
    }
}

/// Loads files from disk
///
/// Names on the library whitelist are searched for in the shader library directory first.
/// All other names are resolved relative to the directory of the including file.
pub struct FileSystemIncludeHandler {
    library_directory: Option<PathBuf>,
    library_whitelist: Vec<String>,
}

impl FileSystemIncludeHandler {
    /// Create a loader which only resolves paths relative to the including file
    pub fn new() -> Self {
        FileSystemIncludeHandler {
            library_directory: None,
            library_whitelist: Vec::new(),
        }
    }

    /// Set the shader library directory and the names that are resolved from it
    pub fn with_library(mut self, directory: impl Into<PathBuf>, whitelist: &[&str]) -> Self {
        self.library_directory = Some(directory.into());
        self.library_whitelist = whitelist.iter().map(|s| s.to_string()).collect();
        self
    }

    fn candidates(&self, file_name: &str, parent: Option<&str>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(library_directory) = &self.library_directory {
            if self.library_whitelist.iter().any(|name| name == file_name) {
                candidates.push(library_directory.join(file_name));
            }
        }

        match parent.and_then(|parent| Path::new(parent).parent()) {
            Some(directory) => candidates.push(directory.join(file_name)),
            None => candidates.push(PathBuf::from(file_name)),
        }

        candidates
    }
}

impl Default for FileSystemIncludeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeHandler for FileSystemIncludeHandler {
    fn load(&mut self, file_name: &str, parent: Option<&str>) -> Result<FileData, IncludeError> {
        for path in self.candidates(file_name, parent) {
            if !path.is_file() {
                continue;
            }

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            };

            return match String::from_utf8(bytes) {
                Ok(contents) => Ok(FileData {
                    real_name: path.to_string_lossy().into_owned(),
                    contents,
                }),
                Err(_) => Err(IncludeError::FileNotText),
            };
        }

        Err(IncludeError::FileNotFound)
    }
}
