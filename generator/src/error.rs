/// Error result when generating target source fails
#[derive(PartialEq, Debug, thiserror::Error)]
pub enum GenerateError {
    /// The module has no entry point for a requested stage
    #[error("shader has no entry point for the {0} stage")]
    MissingEntryPoint(&'static str),

    /// A system value was used by a stage that does not provide it
    #[error("system value `{0}` is not available in the {1} stage")]
    SystemValueOutsideStage(String, &'static str),

    /// A derivative or implicit lod sample was used outside of the fragment stage
    #[error("`{0}` requires derivatives which are not available in the {1} stage")]
    DerivativesOutsideFragment(String, &'static str),

    /// The backend has no translation for a construct
    #[error("{backend} does not support {construct}")]
    Unsupported {
        backend: &'static str,
        construct: String,
    },

    /// The backend is not implemented
    #[error("the {0} backend is not supported")]
    UnsupportedBackend(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Error result when registering a declaration shared between shaders fails
#[derive(PartialEq, Debug, thiserror::Error)]
pub enum RegistryError {
    /// The same name was registered with a different member sequence
    #[error("{kind} `{name}` already declared with a different layout")]
    LayoutMismatch { kind: &'static str, name: String },

    /// Two different names produced the same name checksum
    #[error("{kind} `{name}` has the same checksum as `{existing}`")]
    ChecksumCollision {
        kind: &'static str,
        name: String,
        existing: String,
    },

    /// A shader with the same name was already compiled in this session
    #[error("shader `{0}` was already compiled")]
    DuplicateShader(String),
}

/// Result type for generator functions
pub type GenerateResult<T> = Result<T, GenerateError>;

impl GenerateError {
    /// Build an error for a construct a backend can not express
    pub fn unsupported(backend: &'static str, construct: impl Into<String>) -> Self {
        GenerateError::Unsupported {
            backend,
            construct: construct.into(),
        }
    }
}
