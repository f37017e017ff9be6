use gfxsl_ast::{Module, ShaderStage};
use gfxsl_generator::{GenerateError, InputLayout};
use gfxsl_glsl::GlslBackend;
use gfxsl_text::*;

/// Turn a shader string into a module
#[track_caller]
pub fn parse_from_str(source: &str) -> Module {
    let mut source_manager = SourceManager::new();
    let source = source.to_string() + "\n";

    let tokens = match gfxsl_preprocess::preprocess_fragment(
        &source,
        FileName("glsl_test.gfx".to_string()),
        &mut source_manager,
    ) {
        Ok(tokens) => tokens,
        Err(err) => panic!("{}", err.display(&source_manager)),
    };

    let tokens = gfxsl_preprocess::prepare_tokens(&tokens);

    match gfxsl_parser::parse(&tokens, "glsl_test") {
        Ok(module) => module,
        Err(err) => panic!("{}", err.display(&source_manager)),
    }
}

#[track_caller]
pub fn check_text(output: &str, expected: &str) {
    for (output_line, expected_line) in output.lines().zip(expected.lines()) {
        assert_eq!(output_line, expected_line);
    }
    assert_eq!(output, expected);
}

/// Check the GLSL generated for one stage of a shader
#[track_caller]
pub fn check(source: &str, stage: ShaderStage, expected_glsl: &str) {
    let module = parse_from_str(source);
    match gfxsl_generator::generate_stage(&module, &GlslBackend, stage) {
        Ok(output) => check_text(&output, expected_glsl),
        Err(err) => panic!("{err}"),
    }
}

/// Ensure that generating a stage fails with the given error
#[track_caller]
pub fn expect_generate_fail(source: &str, stage: ShaderStage, expected_err: GenerateError) {
    let module = parse_from_str(source);
    match gfxsl_generator::generate_stage(&module, &GlslBackend, stage) {
        Ok(output) => panic!("Expected generation to fail, generated:\n{output}"),
        Err(err) => assert_eq!(err, expected_err),
    }
}

/// Build the memory layout of an input struct in a shader
#[track_caller]
pub fn input_layout(source: &str, name: &str) -> InputLayout {
    let module = parse_from_str(source);
    let ty = module.find_type(name).expect("input struct not found");
    gfxsl_generator::input_layout(&module, ty, "GLSL").unwrap()
}
