//! # Metal shader compiler invoker
//!
//! Finds and runs the native Metal shader compiler to turn generated Metal source into bytecode

use std::io::Write;
use std::process::{Command, Stdio};

/// Default file path to the metal tools on Windows
const WINDOWS_COMPILER_PATH: &str = "C:\\Program Files\\Metal Developer Tools\\metal\\macos\\bin\\metal.exe";

/// Describes the location of a metal shader compiler program
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct MetalCompiler {
    program_path: String,

    /// Arguments which select the compiler, such as `-sdk macosx metal` for xcrun
    config_args: Vec<String>,
}

/// Error for [MetalCompiler::find]
#[derive(PartialEq, Eq, Debug, thiserror::Error)]
pub enum FindError {
    #[error("metal compiler not found at `{0}`")]
    ProgramNotFound(String),

    #[error("metal compiler is not supported on the current platform")]
    NotSupported,
}

/// Error for [MetalCompiler::execute]
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("failed to start `{0}`: {1}")]
    ProcessSpawnFailed(String, std::io::Error),

    #[error("failed to send source to the metal compiler: {0}")]
    SendSourceFailed(std::io::Error),

    #[error("failed to wait for the metal compiler: {0}")]
    ProcessJoinFailed(std::io::Error),

    #[error("{0}")]
    CompileError(String),
}

impl MetalCompiler {
    /// Attempt to find the path to the metal compiler
    pub fn find() -> Result<MetalCompiler, FindError> {
        if cfg!(target_os = "macos") {
            // xcrun will find the metal compiler
            Ok(MetalCompiler {
                program_path: String::from("xcrun"),
                config_args: vec![
                    String::from("-sdk"),
                    String::from("macosx"),
                    String::from("metal"),
                ],
            })
        } else if cfg!(target_os = "windows") {
            if !std::path::Path::new(WINDOWS_COMPILER_PATH).exists() {
                return Err(FindError::ProgramNotFound(WINDOWS_COMPILER_PATH.to_string()));
            }
            Ok(MetalCompiler::at_path(WINDOWS_COMPILER_PATH))
        } else {
            Err(FindError::NotSupported)
        }
    }

    /// Use a compiler program at a known path
    pub fn at_path(program_path: &str) -> MetalCompiler {
        MetalCompiler {
            program_path: program_path.to_string(),
            config_args: Vec::new(),
        }
    }

    pub fn program_path(&self) -> &str {
        &self.program_path
    }

    /// Full argument list passed to the compiler program
    pub fn command_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut process_args = self.config_args.iter().map(String::as_str).collect::<Vec<_>>();

        // Write the object to stdout and read the source from stdin
        process_args.extend_from_slice(&["-o", "-", "-x", "metal", "-c", "-"]);
        process_args.extend_from_slice(args);
        process_args
    }

    /// Execute the metal compiler on shader source and return the compiled bytecode
    pub fn execute(&self, source: &str, args: &[&str]) -> Result<Vec<u8>, ExecuteError> {
        let process_args = self.command_args(args);
        log::debug!("running {} {}", self.program_path, process_args.join(" "));

        let mut process = Command::new(self.program_path.as_str())
            .args(process_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ExecuteError::ProcessSpawnFailed(self.program_path.clone(), err))?;

        // Dropping stdin after writing closes the pipe so the compiler sees the end of the source
        {
            let mut stdin = process.stdin.take().ok_or_else(|| {
                ExecuteError::SendSourceFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stdin not captured",
                ))
            })?;
            stdin
                .write_all(source.as_bytes())
                .map_err(ExecuteError::SendSourceFailed)?;
        }

        let result = process
            .wait_with_output()
            .map_err(ExecuteError::ProcessJoinFailed)?;

        if !result.status.success() {
            let message = String::from_utf8(result.stderr).unwrap_or(String::from("Invalid UTF-8"));
            return Err(ExecuteError::CompileError(message));
        }

        log::debug!("metal compiler produced {} bytes", result.stdout.len());
        Ok(result.stdout)
    }
}

#[test]
fn test_command_args() {
    let compiler = MetalCompiler::at_path("metal");
    assert_eq!(compiler.program_path(), "metal");
    assert_eq!(
        compiler.command_args(&["-std=metal3.1"]),
        ["-o", "-", "-x", "metal", "-c", "-", "-std=metal3.1"]
    );
}

#[test]
fn test_missing_program() {
    let compiler = MetalCompiler::at_path("/nonexistent/gfxsl/metal");
    match compiler.execute("", &[]) {
        Err(ExecuteError::ProcessSpawnFailed(path, _)) => assert_eq!(path, "/nonexistent/gfxsl/metal"),
        other => panic!("unexpected result {other:?}"),
    }
}
