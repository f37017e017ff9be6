mod shared;
use gfxsl::generator::{GenerateError, RegistryError};
use gfxsl::*;
use shared::*;

const MESH_SHADER: &str = "
#include \"common.gfxh\"

vertex_output Interp { float4 position : POSITION; float2 uv : TEXCOORD; };
fragment_output Target { float4 color : COLOR; };
texture2D albedo;

void main_vertex(Vertex vertex, Transform transform, out Interp output) {
    output.position = mul(transform.mvp, float4(vertex.position, 1.0));
    output.uv = vertex.uv;
}

void main_fragment(Interp input, out Target target) {
    target.color = texture_sample(albedo, input.uv);
}
";

const SKY_SHADER: &str = "
uniform_buffer Camera (slot = 1) { float4x4 view; };

#include \"common.gfxh\"

vertex_output Interp { float4 position : POSITION; };

void main_vertex(Vertex vertex, Transform transform, Camera camera, out Interp output) {
    output.position = mul(camera.view, mul(transform.mvp, float4(vertex.position, 1.0)));
}
";

const COMMON_HEADER: &str = "
#pragma once
vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); };
uniform_buffer Transform { float4x4 mvp; };
";

const FILES: [(&str, &str); 3] = [
    ("mesh.gfx", MESH_SHADER),
    ("sky.gfx", SKY_SHADER),
    ("common.gfxh", COMMON_HEADER),
];

#[test]
fn check_shader_entry_table() {
    let output = build(Target::Glsl, FILES, &["mesh.gfx"]);

    let text = binary_text(&output);
    assert!(text.starts_with("#version 410 core"));
    let fragment_offset = match text[1..].find("#version") {
        Some(offset) => offset + 1,
        None => panic!("fragment stage missing from binary:\n{text}"),
    };
    let fragment_size = text.len() - fragment_offset;

    check_contains(&output.header, "enum class Shader : u32\n{\n    mesh = 0,\n};\nconstexpr u32 SHADER_COUNT = 1;\n");
    check_contains(
        &output.source,
        "static const UniformBufferBinding mesh_vertex_uniform_buffers[] = { { 0, 0 } };\n",
    );
    check_contains(
        &output.source,
        &format!(
            "    // mesh
    {{
        0x3, 0, NO_FORMAT,
        {{ {{ 0, {fragment_offset} }}, {{ {fragment_offset}, {fragment_size} }}, {{ 0, 0 }} }},
        {{ mesh_vertex_uniform_buffers, nullptr, nullptr }},
        {{ 1, 0, 0 }},
    }},
"
        ),
    );
    check_contains(&output.api_header, "#include \"gfx.generated.hpp\"");
}

#[test]
fn check_shared_declarations() {
    let output = build(Target::Glsl, FILES, &["mesh.gfx", "sky.gfx"]);

    // Both shaders use the same Transform and Vertex declarations
    let transform_id = "template <> struct UniformBufferId<Transform> { static constexpr u32 value = 0; };";
    check_contains(&output.header, transform_id);
    assert_eq!(output.header.matches(transform_id).count(), 1);
    check_contains(
        &output.header,
        "template <> struct UniformBufferId<Camera> { static constexpr u32 value = 1; };",
    );
    check_contains(
        &output.header,
        "template <> struct VertexFormatId<Vertex> { static constexpr u32 value = 0; };",
    );
    check_contains(&output.header, "    mesh = 0,\n    sky = 1,\n");
    check_contains(
        &output.source,
        "static const UniformBufferBinding sky_vertex_uniform_buffers[] = { { 0, 0 }, { 1, 1 } };\n",
    );
}

#[test]
fn check_layout_mismatch() {
    let mut session = CompilationSession::new(SessionConfig::new(Target::Glsl));
    compile_into(&mut session, FILES, "mesh.gfx");

    let err = expect_compile_fail(
        &mut session,
        [(
            "other.gfx",
            "
uniform_buffer Transform { float4 offset; };
vertex_output Interp { float4 position : POSITION; };
void main_vertex(Transform transform, out Interp output) { output.position = transform.offset; }
",
        )],
        "other.gfx",
    );
    match err {
        CompileError::Generate(GenerateError::Registry(RegistryError::LayoutMismatch { kind, name })) => {
            assert_eq!(kind, "uniform_buffer");
            assert_eq!(name, "Transform");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn check_duplicate_shader() {
    let mut session = CompilationSession::new(SessionConfig::new(Target::Hlsl));
    compile_into(&mut session, FILES, "mesh.gfx");

    let mut include_handler = FILES;
    let args = CompileArgs::new("sky.gfx", &mut include_handler).shader_name("mesh");
    match session.compile(args) {
        Err(CompileError::Generate(GenerateError::Registry(RegistryError::DuplicateShader(name)))) => {
            assert_eq!(name, "mesh")
        }
        Ok(_) => panic!("Expected the shader name to be rejected"),
        Err(err) => panic!("unexpected error: {err}"),
    }
    assert_eq!(session.registries().shaders.len(), 1);
    assert_eq!(session.finish().header.matches("    mesh = 0,").count(), 1);
}

#[test]
fn check_pipeline_macros() {
    let files = [(
        "tint.gfx",
        "
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) {
#ifdef GRAPHICS_METAL
    target.color = float4(1.0, 0.0, 0.0, 1.0);
#else
    target.color = float4(0.0, 0.0, QUALITY, 1.0);
#endif
}
",
    )];

    let mut session = CompilationSession::new(SessionConfig::new(Target::Glsl));
    let mut include_handler = files;
    if let Err(err) = session.compile(CompileArgs::new("tint.gfx", &mut include_handler).define("QUALITY=0.5")) {
        panic!("{err}");
    }
    let output = session.finish();
    check_contains(binary_text(&output), "Target_color = vec4(0.0, 0.0, 0.5, 1.0);");

    let output = build(Target::Msl, files, &["tint.gfx"]);
    check_contains(binary_text(&output), "float4(1.0, 0.0, 0.0, 1.0)");
    validate_metal(binary_text(&output));
}

#[test]
fn check_texture_origin() {
    // Only OpenGL has texture coordinates starting at the bottom
    let glsl = build(Target::Glsl, FILES, &["mesh.gfx"]);
    check_contains(binary_text(&glsl), "texture(albedo, flip_v(Interp_uv))");

    for target in [Target::Msl, Target::Hlsl] {
        let output = build(target, FILES, &["mesh.gfx"]);
        assert!(!binary_text(&output).contains("flip_v"), "{target} flipped a texture coordinate");
    }
}

#[test]
fn check_unsupported_targets() {
    for (target, name) in [(Target::D3D12, "D3D12"), (Target::Vulkan, "Vulkan")] {
        let mut session = CompilationSession::new(SessionConfig::new(target));
        match expect_compile_fail(&mut session, FILES, "mesh.gfx") {
            CompileError::Generate(GenerateError::UnsupportedBackend(backend)) => assert_eq!(backend, name),
            err => panic!("unexpected error: {err}"),
        }
        assert!(session.finish().binary.is_empty());
    }
}

#[test]
fn check_missing_include() {
    let mut session = CompilationSession::new(SessionConfig::default());
    let err = expect_compile_fail(
        &mut session,
        [("broken.gfx", "#include \"missing.gfxh\"\n")],
        "broken.gfx",
    );
    match err {
        CompileError::Text(message) => {
            check_contains(&message, "failed to load file: 'missing.gfxh': file not found");
            check_contains(&message, "broken.gfx");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn check_metal_compiler_failure() {
    let mut session = CompilationSession::new(SessionConfig::new(Target::MetalBytecode))
        .with_metal_compiler(metal_invoker::MetalCompiler::at_path("gfxsl-missing-metal-compiler"));

    match expect_compile_fail(&mut session, FILES, "mesh.gfx") {
        CompileError::MetalCompilerFailed(metal_invoker::ExecuteError::ProcessSpawnFailed(program, _)) => {
            assert_eq!(program, "gfxsl-missing-metal-compiler")
        }
        err => panic!("unexpected error: {err}"),
    }
    assert!(session.registries().shaders.is_empty());
    assert!(session.registries().uniform_buffers.is_empty());
    assert!(session.finish().binary.is_empty());
}

#[test]
fn check_unused_declarations() {
    let files = [
        (
            "a.gfx",
            "
uniform_buffer Unused { float4 a; };
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) { target.color = float4(1.0, 1.0, 1.0, 1.0); }
",
        ),
        (
            "b.gfx",
            "
uniform_buffer Unused { float a; };
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) { target.color = float4(0.0, 0.0, 0.0, 1.0); }
",
        ),
    ];

    // Declarations no entry point uses are not shared so their layouts can differ
    let output = build(Target::Glsl, files, &["a.gfx", "b.gfx"]);
    assert!(!output.header.contains("Unused"));
    assert!(!binary_text(&output).contains("Unused"));
}

#[test]
fn check_buffer_slots() {
    let mut session = CompilationSession::new(SessionConfig::new(Target::Glsl));
    compile_into(&mut session, FILES, "sky.gfx");
    let stage = &session.registries().shaders[0].stages[0];
    assert_eq!(stage.uniform_buffers, [(1, 0), (0, 1)]);

    let err = expect_compile_fail(
        &mut session,
        [(
            "slots.gfx",
            "
uniform_buffer Light { float4 color; };
uniform_buffer Shadow (slot = 0) { float4x4 view; };
",
        )],
        "slots.gfx",
    );
    match err {
        CompileError::Text(message) => {
            check_contains(&message, "slots.gfx:3:16: error: 'Shadow' binds slot 0 which is already used by another buffer")
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn check_merge_sessions() {
    let mut mesh = CompilationSession::new(SessionConfig::new(Target::Msl));
    compile_into(&mut mesh, FILES, "mesh.gfx");

    let mut sky = CompilationSession::new(SessionConfig::new(Target::Msl));
    compile_into(&mut sky, FILES, "sky.gfx");
    let sky_stage = sky.registries().shaders[0].stages[0].clone();
    assert_eq!(sky_stage.uniform_buffers, [(1, 0), (0, 1)]);

    let single = build(Target::Msl, FILES, &["mesh.gfx"]);
    mesh.merge(sky).unwrap();

    let registries = mesh.registries();
    assert_eq!(registries.shaders.len(), 2);
    assert_eq!(registries.uniform_buffers.len(), 2);
    assert_eq!(registries.vertex_formats.len(), 1);

    let merged_stage = registries.shaders[1].stages[0].clone();
    assert_eq!(merged_stage.offset, sky_stage.offset + single.binary.len() as u32);
    assert_eq!(merged_stage.size, sky_stage.size);
    assert_eq!(merged_stage.uniform_buffers, [(0, 0), (1, 1)]);

    let merged = mesh.finish();
    let sky_source = &merged.binary[merged_stage.offset as usize..];
    assert_eq!(sky_source.len(), merged_stage.size as usize);
    assert_eq!(&merged.binary[..single.binary.len()], &single.binary[..]);

    let other = CompilationSession::new(SessionConfig::new(Target::Glsl));
    let mut metal = CompilationSession::new(SessionConfig::new(Target::Msl));
    assert!(matches!(
        metal.merge(other),
        Err(CompileError::TargetMismatch(Target::Msl, Target::Glsl))
    ));
}

#[test]
fn check_library_files() {
    let root = tempfile::tempdir().unwrap();
    let library = root.path().join("library");
    let shaders = root.path().join("shaders");
    std::fs::create_dir_all(&library).unwrap();
    std::fs::create_dir_all(&shaders).unwrap();

    std::fs::write(library.join("common.gfxh"), COMMON_HEADER).unwrap();
    std::fs::write(shaders.join("mesh.gfx"), MESH_SHADER).unwrap();
    std::fs::write(shaders.join("sky.gfx"), SKY_SHADER).unwrap();

    let config = SessionConfig::new(Target::Hlsl).library(&library, &["common.gfxh"]);
    let mut session = CompilationSession::new(config);
    for name in ["mesh.gfx", "sky.gfx"] {
        let entry = shaders.join(name);
        let entry = entry.to_string_lossy();
        let mut include_handler = session.include_handler();
        if let Err(err) = session.compile(CompileArgs::new(&entry, &mut include_handler)) {
            panic!("{err}");
        }
    }
    assert_eq!(session.registries().shaders[1].name, "sky");

    let output = session.finish();
    let out = root.path().join("generated");
    output.write_to(&out).unwrap();

    assert_eq!(std::fs::read_to_string(out.join(HEADER_FILE_NAME)).unwrap(), output.header);
    assert_eq!(std::fs::read_to_string(out.join(SOURCE_FILE_NAME)).unwrap(), output.source);
    assert_eq!(std::fs::read_to_string(out.join(API_HEADER_FILE_NAME)).unwrap(), output.api_header);
    assert_eq!(std::fs::read_to_string(out.join(API_SOURCE_FILE_NAME)).unwrap(), output.api_source);
    assert_eq!(std::fs::read(out.join(BINARY_FILE_NAME)).unwrap(), output.binary);
    check_contains(&output.api_source, "d3d11_vertex_format_Vertex[2]");
}
