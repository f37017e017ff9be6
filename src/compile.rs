use crate::*;
use generator::{Backend, GenerateError, Registries, ShaderEntry, StageEntry, StubBackend};
use metal_invoker::{ExecuteError, FindError, MetalCompiler};
use std::path::{Path, PathBuf};
use text::CompileErrorExt;

/// File name of the host header
pub const HEADER_FILE_NAME: &str = "gfx.generated.hpp";

/// File name of the host source
pub const SOURCE_FILE_NAME: &str = "gfx.generated.cpp";

/// File name of the graphics API header
pub const API_HEADER_FILE_NAME: &str = "gfx.api.generated.hpp";

/// File name of the graphics API source
pub const API_SOURCE_FILE_NAME: &str = "gfx.api.generated.cpp";

/// File name of the shared shader binary
pub const BINARY_FILE_NAME: &str = "gfx.generated.bin";

#[derive(PartialEq, Eq, Debug, Copy, Clone, Default)]
pub enum Target {
    /// Generate GLSL 4.10 for OpenGL
    #[default]
    Glsl,

    /// Generate Metal shading language source
    Msl,

    /// Generate Metal shading language and compile it into bytecode with the native compiler
    MetalBytecode,

    /// Generate HLSL for shader model 5
    Hlsl,

    /// Direct3D 12 is not supported yet
    D3D12,

    /// Vulkan is not supported yet
    Vulkan,
}

impl Target {
    /// Macro defined for every shader compiled for the target
    pub fn pipeline_macro(self) -> &'static str {
        match self {
            Target::Glsl => "GRAPHICS_OPENGL",
            Target::Msl | Target::MetalBytecode => "GRAPHICS_METAL",
            Target::Hlsl => "GRAPHICS_HLSL",
            Target::D3D12 => "GRAPHICS_D3D12",
            Target::Vulkan => "GRAPHICS_VULKAN",
        }
    }

    /// Backend which generates source for the target
    pub fn backend(self) -> &'static dyn Backend {
        match self {
            Target::Glsl => &glsl::GlslBackend,
            Target::Msl | Target::MetalBytecode => &msl::MslBackend,
            Target::Hlsl => &hlsl::HlslBackend,
            Target::D3D12 => &StubBackend::D3D12,
            Target::Vulkan => &StubBackend::VULKAN,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Target::MetalBytecode => write!(f, "Metal bytecode"),
            _ => write!(f, "{}", self.backend().name()),
        }
    }
}

/// Settings shared by every shader of a build
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SessionConfig {
    pub target: Target,

    /// Directory searched first for the names on the library whitelist
    pub library_directory: Option<PathBuf>,
    pub library_whitelist: Vec<String>,

    /// Arguments passed to the native Metal compiler
    pub metal_args: Vec<String>,
}

impl SessionConfig {
    pub fn new(target: Target) -> Self {
        SessionConfig {
            target,
            library_directory: None,
            library_whitelist: Vec::new(),
            metal_args: vec![String::from("-std=metal3.1")],
        }
    }

    /// Set the shader library directory and the include names that are resolved from it
    pub fn library(mut self, directory: impl Into<PathBuf>, whitelist: &[&str]) -> Self {
        self.library_directory = Some(directory.into());
        self.library_whitelist = whitelist.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Replace the arguments passed to the native Metal compiler
    pub fn metal_args(mut self, args: &[&str]) -> Self {
        self.metal_args = args.iter().map(|arg| arg.to_string()).collect();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Target::default())
    }
}

/// Arguments for [CompilationSession::compile]
pub struct CompileArgs<'a> {
    entry_file_name: &'a str,
    include_handler: &'a mut dyn text::IncludeHandler,
    pipeline_macros: Vec<String>,
    shader_name: Option<&'a str>,
}

impl<'a> CompileArgs<'a> {
    /// Create new args with required arguments
    pub fn new(entry_file_name: &'a str, include_handler: &'a mut dyn text::IncludeHandler) -> Self {
        CompileArgs {
            entry_file_name,
            include_handler,
            pipeline_macros: Vec::new(),
            shader_name: None,
        }
    }

    /// Add a pipeline macro in the form `NAME` or `NAME=VALUE`
    pub fn define(mut self, pipeline_macro: &str) -> Self {
        self.pipeline_macros.push(pipeline_macro.to_string());
        self
    }

    /// Name the shader instead of using the entry file stem
    pub fn shader_name(mut self, name: &'a str) -> Self {
        self.shader_name = Some(name);
        self
    }
}

/// Error for [CompilationSession]
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A preprocessor or parser error rendered with its source location
    #[error("{0}")]
    Text(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    MetalCompilerNotFound(#[from] FindError),

    #[error(transparent)]
    MetalCompilerFailed(#[from] ExecuteError),

    #[error("cannot merge a {1} session into a {0} session")]
    TargetMismatch(Target, Target),

    #[error("shader binary is larger than 4GiB")]
    BinaryTooLarge,
}

/// Every file generated by a build
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct GeneratedOutput {
    pub header: String,
    pub source: String,
    pub api_header: String,
    pub api_source: String,
    pub binary: Vec<u8>,
}

impl GeneratedOutput {
    /// Write every output into a directory
    pub fn write_to(&self, directory: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(directory)?;
        std::fs::write(directory.join(HEADER_FILE_NAME), &self.header)?;
        std::fs::write(directory.join(SOURCE_FILE_NAME), &self.source)?;
        std::fs::write(directory.join(API_HEADER_FILE_NAME), &self.api_header)?;
        std::fs::write(directory.join(API_SOURCE_FILE_NAME), &self.api_source)?;
        std::fs::write(directory.join(BINARY_FILE_NAME), &self.binary)?;
        log::debug!("wrote generated files to {}", directory.display());
        Ok(())
    }
}

/// State of one build
///
/// Shaders compiled in the same session share their struct, uniform buffer and vertex format
/// declarations. Sessions run on separate threads can be combined with [CompilationSession::merge].
pub struct CompilationSession {
    config: SessionConfig,

    /// Owns the text of every loaded file so errors can point into it
    source_manager: text::SourceManager,
    include_cache: preprocess::IncludeCache,
    registries: Registries,
    binary: Vec<u8>,

    /// Found the first time a stage is compiled to bytecode
    metal_compiler: Option<MetalCompiler>,
}

impl CompilationSession {
    pub fn new(config: SessionConfig) -> Self {
        CompilationSession {
            config,
            source_manager: text::SourceManager::new(),
            include_cache: preprocess::IncludeCache::new(),
            registries: Registries::new(),
            binary: Vec::new(),
            metal_compiler: None,
        }
    }

    /// Use a known Metal compiler instead of searching for one
    pub fn with_metal_compiler(mut self, compiler: MetalCompiler) -> Self {
        self.metal_compiler = Some(compiler);
        self
    }

    pub fn target(&self) -> Target {
        self.config.target
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Create a file system include handler for the configured shader library
    pub fn include_handler(&self) -> text::FileSystemIncludeHandler {
        let handler = text::FileSystemIncludeHandler::new();
        match &self.config.library_directory {
            Some(directory) => {
                let whitelist = self
                    .config
                    .library_whitelist
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>();
                handler.with_library(directory.clone(), &whitelist)
            }
            None => handler,
        }
    }

    /// Compile one shader file and add it to the build
    ///
    /// Returns the id of the shader in the generated entry table.
    pub fn compile(&mut self, args: CompileArgs) -> Result<usize, CompileError> {
        let mut pipeline_macros = vec![self.config.target.pipeline_macro().to_string()];
        pipeline_macros.extend(args.pipeline_macros);

        let tokens = match preprocess::preprocess_shader(
            args.entry_file_name,
            &pipeline_macros,
            &mut self.source_manager,
            &mut self.include_cache,
            args.include_handler,
        ) {
            Ok(tokens) => tokens,
            Err(err) => return Err(CompileError::Text(err.render(&self.source_manager))),
        };

        let tokens = preprocess::prepare_tokens(&tokens);

        let name = match args.shader_name {
            Some(name) => name.to_string(),
            None => shader_name_from_path(args.entry_file_name),
        };

        let module = match parser::parse(&tokens, &name) {
            Ok(module) => module,
            Err(err) => return Err(CompileError::Text(err.render(&self.source_manager))),
        };

        // The session is only updated once the whole shader has compiled
        let mut registries = self.registries.clone();
        let shader = generator::generate_shader(&module, self.config.target.backend(), &mut registries)?;

        let mut data = Vec::new();
        let mut stages = Vec::new();
        for stage in shader.stages {
            let stage_data = self.stage_data(&stage.source)?;
            stages.push(StageEntry {
                stage: stage.stage,
                offset: binary_size(self.binary.len() + data.len())?,
                size: binary_size(stage_data.len())?,
                uniform_buffers: stage.uniform_buffers,
            });
            data.extend(stage_data);
        }

        let id = registries.register_shader(ShaderEntry {
            name: shader.name,
            stages,
            vertex_format: shader.vertex_format,
            instance_format: shader.instance_format,
        })?;
        self.registries = registries;
        self.binary.extend(data);

        log::info!("compiled `{}` for {}", args.entry_file_name, self.config.target);
        Ok(id)
    }

    /// Source bytes or bytecode of a generated stage
    fn stage_data(&mut self, source: &str) -> Result<Vec<u8>, CompileError> {
        if self.config.target != Target::MetalBytecode {
            return Ok(source.as_bytes().to_vec());
        }

        let compiler = match self.metal_compiler.take() {
            Some(compiler) => compiler,
            None => MetalCompiler::find()?,
        };
        let compiler = self.metal_compiler.insert(compiler);

        let args = self.config.metal_args.iter().map(String::as_str).collect::<Vec<_>>();
        Ok(compiler.execute(source, &args)?)
    }

    /// Add the shaders of another session for the same target
    ///
    /// Declarations shared by both sessions must have the same layout. The other session's binary is
    /// appended after this one.
    pub fn merge(&mut self, other: CompilationSession) -> Result<(), CompileError> {
        if other.config.target != self.config.target {
            return Err(CompileError::TargetMismatch(
                self.config.target,
                other.config.target,
            ));
        }

        let offset = binary_size(self.binary.len())?;
        binary_size(self.binary.len() + other.binary.len())?;
        self.registries.merge(&other.registries, offset)?;
        self.binary.extend(other.binary);

        log::debug!("merged {} shader(s) into the session", other.registries.shaders.len());
        Ok(())
    }

    /// Generate the host files of the build
    pub fn finish(self) -> GeneratedOutput {
        let output = GeneratedOutput {
            header: generator::generate_host_header(&self.registries),
            source: generator::generate_host_source(&self.registries),
            api_header: generator::generate_api_header(&self.registries),
            api_source: generator::generate_api_source(&self.registries),
            binary: self.binary,
        };

        log::info!(
            "generated {} shader(s) for {}: header {} bytes, source {} bytes, binary {} bytes",
            self.registries.shaders.len(),
            self.config.target,
            output.header.len(),
            output.source.len(),
            output.binary.len()
        );
        output
    }
}

/// Shader name of an entry file, `shaders/mesh.gfx` is `mesh`
fn shader_name_from_path(entry_file_name: &str) -> String {
    Path::new(entry_file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(entry_file_name)
        .to_string()
}

fn binary_size(size: usize) -> Result<u32, CompileError> {
    u32::try_from(size).map_err(|_| CompileError::BinaryTooLarge)
}
