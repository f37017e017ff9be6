use crate::*;
use gfxsl_ast::*;
use gfxsl_text::*;

/// Minimal C-like backend which keeps source type names
struct TestBackend;

impl Backend for TestBackend {
    fn name(&self) -> &'static str {
        "test"
    }

    fn layout_rules(&self) -> LayoutRules {
        LayoutRules::Std140
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn primitive_name(&self, primitive: PrimitiveType) -> GenerateResult<String> {
        Ok(primitive.name())
    }

    fn texture_type_name(&self, kind: TextureKind) -> GenerateResult<String> {
        Ok(kind.name().to_string())
    }

    fn generate_header(&self, gen: &mut Generator) -> GenerateResult<()> {
        gen.write("// test");
        Ok(())
    }

    fn generate_structure(&self, gen: &mut Generator, sd: &Struct) -> GenerateResult<()> {
        let module = gen.module;
        gen.separate();
        if sd.kind.is_buffer() {
            gen.write(&format!("cbuffer {}", module.type_name(sd.type_id)));
        } else {
            gen.write(&format!("struct {}", module.type_name(sd.type_id)));
        }
        gen.line("{");
        gen.push_indent();
        for member in module.members(sd.type_id) {
            let name = if sd.kind.is_buffer() {
                gen.prefixed_member_name(sd.type_id, member)
            } else {
                member.name.clone()
            };
            let ty = gen.type_name(member.type_id)?;
            gen.line(&format!("{ty} {name}{};", member.array.suffix()));
        }
        gen.pop_indent();
        gen.line("};");
        Ok(())
    }

    fn generate_texture(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()> {
        gen.separate();
        gen.write(&format!("{} {};", texture.kind.name(), texture.name));
        Ok(())
    }

    fn generate_entry_point(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        gen.separate();
        self.generate_function_signature(gen, function)?;
        gen.new_line();
        gen.generate_function_body(function)
    }
}

/// Preprocess and parse a source string
#[track_caller]
fn parse(source: &str) -> Module {
    let mut source_manager = SourceManager::new();
    let source = source.to_string() + "\n";
    let tokens = match gfxsl_preprocess::preprocess_fragment(
        &source,
        FileName("generator_test.gfx".to_string()),
        &mut source_manager,
    ) {
        Ok(tokens) => tokens,
        Err(err) => panic!("{}", err.display(&source_manager)),
    };
    let tokens = gfxsl_preprocess::prepare_tokens(&tokens);
    match gfxsl_parser::parse(&tokens, "generator_test") {
        Ok(module) => module,
        Err(err) => panic!("{}", err.display(&source_manager)),
    }
}

#[track_caller]
fn check_text(actual: &str, expected: &str) {
    // Compare line by line first for more readable failures
    for (actual_line, expected_line) in actual.lines().zip(expected.lines()) {
        assert_eq!(actual_line, expected_line);
    }
    assert_eq!(actual, expected);
}

#[test]
fn test_statement_walk() {
    let module = parse(
        "
uniform_buffer Params { float scale; int count; };
fragment_output Target { float4 color : COLOR; };
float helper(float x) {
    float sum = 0.0;
    for (int i = 0; i < 4; i++) { sum += x; }
    if (sum > 1.0) sum = 1.0; else if (sum < 0.0) { sum = 0.0; }
    switch (2) { case 1: sum = -sum; break; default: break; }
    do { sum *= 0.5; } while (sum > 2.0);
    return (sum);
}
void main_fragment(Params params, out Target target) {
    target.color = float4(helper(params.scale), 0.0, 0.0, 1.0);
}
",
    );
    let output = generate_stage(&module, &TestBackend, ShaderStage::Fragment).unwrap();
    check_text(
        &output,
        "// test

cbuffer Params
{
    float Params_scale;
    int Params_count;
};

struct Target
{
    float4 color;
};

float helper(float x)
{
    float sum = 0.0;
    for (int i = 0; i < 4; i++) {
        sum += x;
    }
    if (sum > 1.0) {
        sum = 1.0;
    }
    else if (sum < 0.0) {
        sum = 0.0;
    }
    switch (2) {
        case 1:
            sum = -sum;
            break;
        default:
            break;
    }
    do {
        sum *= 0.5;
    } while (sum > 2.0);
    return (sum);
}

void main_fragment(out Target target)
{
    target.color = float4(helper(Params_scale), 0.0, 0.0, 1.0);
}
",
    );
}

#[test]
fn test_reachability_and_renaming() {
    let module = parse(
        "
fragment_output Target { float4 color : COLOR; };
const float HALF = 0.5;
const float UNUSED = 2.0;
float unused(float a) { return a; }
float shade(float input) { return input * HALF; }
void main_fragment(out Target target) {
    target.color = float4(shade(1.0), - -1.0, 0.0, 1.0);
}
",
    );
    let output = generate_stage(&module, &TestBackend, ShaderStage::Fragment).unwrap();
    check_text(
        &output,
        "// test

struct Target
{
    float4 color;
};

const float HALF = 0.5;

float shade(float input_)
{
    return input_ * HALF;
}

void main_fragment(out Target target)
{
    target.color = float4(shade(1.0), -(-1.0), 0.0, 1.0);
}
",
    );
}

#[test]
fn test_missing_entry_point() {
    let module = parse("fragment_output Target { float4 color : COLOR; };");
    assert_eq!(
        generate_stage(&module, &TestBackend, ShaderStage::Vertex),
        Err(GenerateError::MissingEntryPoint("vertex"))
    );
}

#[test]
fn test_system_value_outside_stage() {
    let module = parse(
        "
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) { target.color = float4(float(vertex_id), 0.0, 0.0, 1.0); }
",
    );
    assert_eq!(
        generate_stage(&module, &TestBackend, ShaderStage::Fragment),
        Err(GenerateError::SystemValueOutsideStage(
            "vertex_id".to_string(),
            "fragment"
        ))
    );
}

#[test]
fn test_derivatives_outside_fragment() {
    let module = parse(
        "
vertex_output O { float4 position : POSITION; };
void main_vertex(out O o) { o.position = ddx(float4(1.0, 1.0, 1.0, 1.0)); }
",
    );
    assert_eq!(
        generate_stage(&module, &TestBackend, ShaderStage::Vertex),
        Err(GenerateError::DerivativesOutsideFragment("ddx".to_string(), "vertex"))
    );
}

#[test]
fn test_texture_operations_need_backend() {
    let module = parse(
        "
fragment_output Target { float4 color : COLOR; };
texture2D albedo;
void main_fragment(out Target target) { target.color = texture_sample(albedo, float2(0.0, 0.0)); }
",
    );
    assert_eq!(
        generate_stage(&module, &TestBackend, ShaderStage::Fragment),
        Err(GenerateError::unsupported("test", "intrinsic `texture_sample`"))
    );
}

const LIGHTS: &str = "
shared_struct Light { float intensity; float3 direction; };
uniform_buffer Lights { Light lights[2]; float scale; };
vertex_input Vertex { float3 position : POSITION(FLOAT32); float4 color : COLOR(UNORM8); float2 uv : TEXCOORD(FLOAT16); };
";

#[test]
fn test_host_mirrors() {
    let module = parse(LIGHTS);
    let mut registries = Registries::new();
    register_structs(&module, &TestBackend, &mut registries, &module.structs).unwrap();
    assert_eq!(registries.shared_structs.len(), 1);
    assert_eq!(registries.uniform_buffers.len(), 1);
    assert_eq!(registries.vertex_formats.len(), 1);
    assert!(registries.instance_formats.is_empty());

    check_text(
        &registries.shared_structs.get(0).fragments.header,
        "struct Light
{
    float intensity;
    float_v3 direction;
};
static_assert(sizeof(Light) == 16, \"Light size mismatch\");

struct Light_aligned
{
    float intensity;
    u8 _pad0[12];
    float_v3 direction;
    u8 _pad1[4];
};
static_assert(sizeof(Light_aligned) == 32, \"Light_aligned size mismatch\");

void upload(const Light &data, Light_aligned &gpu);

",
    );

    let lights = &registries.uniform_buffers.get(0).fragments;
    check_text(
        &lights.header,
        "struct Lights
{
    Light lights[2];
    float scale;
};
static_assert(sizeof(Lights) == 36, \"Lights size mismatch\");

struct Lights_aligned
{
    std140_array_1d<Light_aligned, 2> lights;
    float scale;
    u8 _pad0[12];
};
static_assert(sizeof(Lights_aligned) == 80, \"Lights_aligned size mismatch\");

void upload(const Lights &data, Lights_aligned &gpu);
void zero(Lights_aligned &gpu);

",
    );
    check_text(
        &lights.source,
        "void upload(const Lights &data, Lights_aligned &gpu)
{
    for (u32 i = 0; i < 2; i++)
    {
        upload(data.lights[i], gpu.lights[i]);
    }
    gpu.scale = data.scale;
}

void zero(Lights_aligned &gpu)
{
    memset(&gpu, 0, sizeof(gpu));
}

",
    );

    check_text(
        &registries.vertex_formats.get(0).fragments.header,
        "struct Vertex
{
    float_v3 position;
    u8_v4 color;
    half_v2 uv;
};
static_assert(sizeof(Vertex) == 20, \"Vertex size mismatch\");

",
    );

    // Ids are only assigned when the header is assembled
    let header = generate_host_header(&registries);
    assert!(header.contains("template <> struct UniformBufferId<Lights> { static constexpr u32 value = 0; };"));
    assert!(header.contains("template <> struct VertexFormatId<Vertex> { static constexpr u32 value = 0; };"));
    assert!(!header.contains("struct SharedStructId"));
}

#[test]
fn test_input_layout() {
    let module = parse(LIGHTS);
    let vertex = module.find_type("Vertex").unwrap();
    let layout = input_layout(&module, vertex, "test").unwrap();
    assert_eq!(layout.stride, 20);
    let offsets = layout.attributes.iter().map(|a| a.offset).collect::<Vec<_>>();
    assert_eq!(offsets, [0, 12, 16]);
    assert_eq!(layout.attributes[1].component_count, 4);
    assert_eq!(layout.attributes[1].format, InputFormat::Unorm8);
    assert_eq!(layout.attributes[2].scalar, ScalarType::Float);
}

#[test]
fn test_semantic_indices() {
    let module = parse(
        "vertex_output O { float4 position : POSITION; float2 a : TEXCOORD; float3 n : NORMAL; float2 b : TEXCOORD; };",
    );
    let ty = module.find_type("O").unwrap();
    assert_eq!(semantic_indices(module.members(ty)), [0, 0, 0, 1]);
}

#[test]
fn test_registration_across_modules() {
    let lights = parse(LIGHTS);
    let mut registries = Registries::new();
    register_structs(&lights, &TestBackend, &mut registries, &lights.structs).unwrap();

    // The same declarations from another file merge
    let again = parse(LIGHTS);
    register_structs(&again, &TestBackend, &mut registries, &again.structs).unwrap();
    assert_eq!(registries.shared_structs.len(), 1);
    assert_eq!(registries.uniform_buffers.len(), 1);
    assert_eq!(registries.vertex_formats.len(), 1);

    // A different member sequence under the same name is rejected
    let conflicting = parse("shared_struct Light { float intensity; };");
    assert_eq!(
        register_structs(&conflicting, &TestBackend, &mut registries, &conflicting.structs),
        Err(GenerateError::Registry(RegistryError::LayoutMismatch {
            kind: "shared_struct",
            name: "Light".to_string()
        }))
    );

    // A different input format is a different layout
    let conflicting = parse(
        "vertex_input Vertex { float3 position : POSITION(FLOAT32); float4 color : COLOR(FLOAT32); float2 uv : TEXCOORD(FLOAT16); };",
    );
    assert!(register_structs(&conflicting, &TestBackend, &mut registries, &conflicting.structs).is_err());
}

#[test]
fn test_only_reachable_structs_register() {
    let module = parse(
        "
uniform_buffer Used { float4 tint; };
uniform_buffer Unused { float4 a; };
shared_struct Orphan { float a; };
fragment_output Target { float4 color : COLOR; };
void main_fragment(Used used, out Target target) { target.color = used.tint; }
",
    );
    let mut registries = Registries::new();
    let shader = generate_shader(&module, &TestBackend, &mut registries).unwrap();
    assert_eq!(registries.uniform_buffers.len(), 1);
    assert_eq!(registries.uniform_buffers.find("Used"), Some(0));
    assert_eq!(registries.uniform_buffers.find("Unused"), None);
    assert!(registries.shared_structs.is_empty());
    assert_eq!(shader.stages[0].uniform_buffers, [(0, 0)]);

    // An unused declaration with another layout does not conflict
    let other = parse(
        "
uniform_buffer Unused { float a; };
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) { target.color = float4(1.0, 1.0, 1.0, 1.0); }
",
    );
    assert!(generate_shader(&other, &TestBackend, &mut registries).is_ok());
    assert_eq!(registries.uniform_buffers.len(), 1);
}

#[test]
fn test_failed_stage_registers_nothing() {
    let module = parse(
        "
uniform_buffer Tint { float4 color; };
fragment_output Target { float4 color : COLOR; };
texture2D albedo;
void main_fragment(Tint tint, out Target target) { target.color = texture_sample(albedo, tint.color.xy); }
",
    );
    let mut registries = Registries::new();
    assert!(generate_shader(&module, &TestBackend, &mut registries).is_err());
    assert!(registries.uniform_buffers.is_empty());
}

#[test]
fn test_shader_table() {
    let mut registries = Registries::new();
    registries
        .register_shader(ShaderEntry {
            name: "basic".to_string(),
            stages: vec![
                StageEntry {
                    stage: ShaderStage::Vertex,
                    offset: 0,
                    size: 100,
                    uniform_buffers: vec![(0, 1)],
                },
                StageEntry {
                    stage: ShaderStage::Fragment,
                    offset: 100,
                    size: 50,
                    uniform_buffers: Vec::new(),
                },
            ],
            vertex_format: Some(0),
            instance_format: None,
        })
        .unwrap();

    let header = generate_host_header(&registries);
    assert!(header.starts_with("#pragma once\n"));
    assert!(header.contains("enum class Shader : u32\n{\n    basic = 0,\n};\n"));
    assert!(header.contains("extern const ShaderEntry SHADER_ENTRIES[SHADER_COUNT];"));

    let source = generate_host_source(&registries);
    assert!(source.contains(
        "static const UniformBufferBinding basic_vertex_uniform_buffers[] = { { 0, 1 } };\n"
    ));
    assert!(source.contains(
        "    // basic
    {
        0x3, 0, NO_FORMAT,
        { { 0, 100 }, { 100, 50 }, { 0, 0 } },
        { basic_vertex_uniform_buffers, nullptr, nullptr },
        { 1, 0, 0 },
    },
"
    ));
}

#[test]
fn test_host_identifier() {
    assert_eq!(host_identifier("basic"), "basic");
    assert_eq!(host_identifier("post/blur-h"), "post_blur_h");
    assert_eq!(host_identifier("2d"), "_2d");
}
