use gfxsl::*;

/// Compile one in-memory shader file into a session
#[track_caller]
pub fn compile_into<const N: usize>(
    session: &mut CompilationSession,
    files: [(&str, &str); N],
    entry: &str,
) -> usize {
    let mut include_handler = files;
    match session.compile(CompileArgs::new(entry, &mut include_handler)) {
        Ok(id) => id,
        Err(err) => panic!("{err}"),
    }
}

/// Compile every entry file of a set of in-memory files into one build
#[track_caller]
pub fn build<const N: usize>(target: Target, files: [(&str, &str); N], entries: &[&str]) -> GeneratedOutput {
    let mut session = CompilationSession::new(SessionConfig::new(target));
    for entry in entries {
        compile_into(&mut session, files, entry);
    }
    session.finish()
}

/// Ensure that compiling a file into a session fails
#[track_caller]
pub fn expect_compile_fail<const N: usize>(
    session: &mut CompilationSession,
    files: [(&str, &str); N],
    entry: &str,
) -> CompileError {
    let mut include_handler = files;
    match session.compile(CompileArgs::new(entry, &mut include_handler)) {
        Ok(_) => panic!("Expected `{entry}` to fail to compile"),
        Err(err) => err,
    }
}

/// Text of every stage in a build binary
#[track_caller]
pub fn binary_text(output: &GeneratedOutput) -> &str {
    match std::str::from_utf8(&output.binary) {
        Ok(text) => text,
        Err(err) => panic!("binary is not source text: {err}"),
    }
}

#[track_caller]
pub fn check_contains(output: &str, expected: &str) {
    assert!(
        output.contains(expected),
        "Expected to find:\n{expected}\nin:\n{output}"
    );
}

/// Check that the input text is valid metal shading language source
#[track_caller]
#[allow(unused)]
pub fn validate_metal(metal_source: &str) {
    use gfxsl::metal_invoker::*;

    if !std::env::vars().any(|v| v.0 == "VALIDATE_METAL" && v.1 != "0") {
        return;
    }

    let compiler = match MetalCompiler::find() {
        Ok(compiler) => compiler,
        Err(err) => panic!("{}", err),
    };

    if let Err(err) = compiler.execute(metal_source, &["-std=metal3.1"]) {
        panic!("{}", err);
    }
}
