mod shared;
use gfxsl_ast::ShaderStage;
use gfxsl_generator::{Backend, GenerateError};
use gfxsl_glsl::GlslBackend;
use shared::*;

const TRANSFORM_SHADER: &str = "
vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); };
uniform_buffer Transform { float4x4 mvp; };
vertex_output Interp { float4 position : POSITION; float2 uv : TEXCOORD; };
fragment_output Target { float4 color : COLOR; };
texture2D albedo;

float4 expand(float3 v) { return float4(v, 1.0); }

void main_vertex(Vertex vertex, Transform transform, out Interp output) {
    output.position = mul(transform.mvp, expand(vertex.position));
    output.uv = vertex.uv;
}

void main_fragment(Interp input, out Target target) {
    target.color = texture_sample(albedo, input.uv);
}
";

#[test]
fn check_vertex_stage() {
    check(
        TRANSFORM_SHADER,
        ShaderStage::Vertex,
        "#version 410 core

layout(location = 0) in vec3 Vertex_position;
layout(location = 1) in vec2 Vertex_uv;

layout(std140) uniform Transform
{
    mat4 Transform_mvp;
};

layout(location = 0) out vec2 Interp_uv;

vec4 expand(vec3 v)
{
    return vec4(v, 1.0);
}

void main()
{
    gl_Position = (Transform_mvp * expand(Vertex_position));
    Interp_uv = Vertex_uv;
}
",
    );
}

#[test]
fn check_fragment_stage() {
    check(
        TRANSFORM_SHADER,
        ShaderStage::Fragment,
        "#version 410 core

vec2 flip_v(vec2 uv)
{
    return vec2(uv.x, 1.0 - uv.y);
}

layout(location = 0) in vec2 Interp_uv;

layout(location = 0) out vec4 Target_color;

uniform sampler2D albedo;

void main()
{
    Target_color = texture(albedo, flip_v(Interp_uv));
}
",
    );
}

#[test]
fn check_compute_stage() {
    check(
        "
mutable_buffer Particles { float4 positions[64]; };
uniform_buffer Params (slot = 3) { float dt; uint count; };

[threads(64, 1, 1)]
void main_compute(Particles particles, Params params) {
    uint i = dispatch_thread_id.x;
    if (i < params.count) {
        particles.positions[i] += float4(0.0, params.dt, 0.0, 0.0);
    }
}
",
        ShaderStage::Compute,
        "#version 430 core

layout(std140, binding = 0) buffer Particles
{
    vec4 Particles_positions[64];
};

layout(std140) uniform Params
{
    float Params_dt;
    uint Params_count;
};

layout(local_size_x = 64, local_size_y = 1, local_size_z = 1) in;
void main()
{
    uint i = gl_GlobalInvocationID.x;
    if (i < Params_count) {
        Particles_positions[i] += vec4(0.0, Params_dt, 0.0, 0.0);
    }
}
",
    );
}

#[test]
fn check_fragment_system_values() {
    check(
        "
fragment_output Target { float4 color : COLOR; float depth : DEPTH; };
void main_fragment(out Target target) {
    target.color = front_facing ? float4(1.0, 1.0, 1.0, 1.0) : float4(float(primitive_id), 0.0, 0.0, 1.0);
    target.depth = 0.5;
}
",
        ShaderStage::Fragment,
        "#version 410 core

layout(location = 0) out vec4 Target_color;

void main()
{
    Target_color = gl_FrontFacing ? vec4(1.0, 1.0, 1.0, 1.0) : vec4(float(uint(gl_PrimitiveID)), 0.0, 0.0, 1.0);
    gl_FragDepth = 0.5;
}
",
    );
}

#[test]
fn check_intrinsics() {
    check(
        "
fragment_output Target { float4 color : COLOR; };
texture2DArray layers;
textureCube sky;
void main_fragment(out Target target) {
    float x = lerp(0.0, 1.0, 0.25) + frac(1.5) + saturate(2.0);
    uint bits = countbits(7u);
    float4 layered = texture_sample_array(layers, float2(x, x), 1.0);
    float4 sky_color = texture_sample_level(sky, float3(x, x, x), 0.0);
    target.color = layered + sky_color + float4(asfloat(bits), 0.0, 0.0, 0.0);
}
",
        ShaderStage::Fragment,
        "#version 410 core

vec2 flip_v(vec2 uv)
{
    return vec2(uv.x, 1.0 - uv.y);
}

layout(location = 0) out vec4 Target_color;

uniform sampler2DArray layers;

uniform samplerCube sky;

void main()
{
    float x = mix(0.0, 1.0, 0.25) + fract(1.5) + clamp(2.0, 0.0, 1.0);
    uint bits = uint(bitCount(7u));
    vec4 layered = texture(layers, vec3(flip_v(vec2(x, x)), 1.0));
    vec4 sky_color = textureLod(sky, vec3(x, x, x), 0.0);
    Target_color = layered + sky_color + vec4(uintBitsToFloat(bits), 0.0, 0.0, 0.0);
}
",
    );
}

#[test]
fn check_texture_load_is_not_flipped() {
    check(
        "
fragment_output Target { float4 color : COLOR; };
texture2D image;
void main_fragment(out Target target) {
    uint2 size = texture_size(image);
    target.color = texture_load(image, int2(size / 2u), 0);
}
",
        ShaderStage::Fragment,
        "#version 410 core

layout(location = 0) out vec4 Target_color;

uniform sampler2D image;

void main()
{
    uvec2 size = uvec2(textureSize(image, 0));
    Target_color = texelFetch(image, ivec2(size / 2u), 0);
}
",
    );
}

#[test]
fn check_missing_stage() {
    expect_generate_fail(
        TRANSFORM_SHADER,
        ShaderStage::Compute,
        GenerateError::MissingEntryPoint("compute"),
    );
}

const VERTEX_FORMAT: &str =
    "vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); };";

#[test]
fn check_vertex_format_glue() {
    let layout = input_layout(VERTEX_FORMAT, "Vertex");
    let glue = GlslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_header,
        "void opengl_bind_attributes_Vertex(GLuint program);
void opengl_vertex_format_Vertex();

",
    );
    check_text(
        &glue.api_source,
        "void opengl_bind_attributes_Vertex(GLuint program)
{
    glBindAttribLocation(program, 0, \"Vertex_position\");
    glBindAttribLocation(program, 1, \"Vertex_uv\");
}

void opengl_vertex_format_Vertex()
{
    glEnableVertexAttribArray(0);
    glVertexAttribPointer(0, 3, GL_FLOAT, GL_FALSE, 16, reinterpret_cast<const void *>(0));
    glEnableVertexAttribArray(1);
    glVertexAttribPointer(1, 2, GL_UNSIGNED_SHORT, GL_TRUE, 16, reinterpret_cast<const void *>(12));
}

",
    );
}

#[test]
fn check_instance_format_glue() {
    let layout = input_layout(
        "instance_input Inst { float4 offset : POSITION(FLOAT32); uint id : TEXCOORD(UINT32); };",
        "Inst",
    );
    let glue = GlslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_source,
        "void opengl_bind_attributes_Inst(GLuint program, GLuint base_location)
{
    glBindAttribLocation(program, base_location + 0, \"Inst_offset\");
    glBindAttribLocation(program, base_location + 1, \"Inst_id\");
}

void opengl_instance_format_Inst(GLuint base_location)
{
    glEnableVertexAttribArray(base_location + 0);
    glVertexAttribPointer(base_location + 0, 4, GL_FLOAT, GL_FALSE, 20, reinterpret_cast<const void *>(0));
    glVertexAttribDivisor(base_location + 0, 1);
    glEnableVertexAttribArray(base_location + 1);
    glVertexAttribIPointer(base_location + 1, 1, GL_UNSIGNED_INT, 20, reinterpret_cast<const void *>(16));
    glVertexAttribDivisor(base_location + 1, 1);
}

",
    );
}

#[test]
fn check_glue_rejects_mismatched_format() {
    let layout = input_layout(
        "vertex_input Bad { int4 index : COLOR(FLOAT32); };",
        "Bad",
    );
    assert_eq!(
        GlslBackend.generate_input_glue(&layout),
        Err(GenerateError::unsupported(
            "GLSL",
            "FLOAT32 attribute `Bad.index` read as int"
        ))
    );
}

#[test]
fn check_instance_locations_follow_vertex() {
    check(
        "
vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(FLOAT32); };
instance_input Inst { float4 offset : POSITION(FLOAT32); };
vertex_output Interp { float4 position : POSITION; };
void main_vertex(Vertex vertex, Inst inst, out Interp output) {
    output.position = float4(vertex.position, 1.0) + inst.offset;
}
",
        ShaderStage::Vertex,
        "#version 410 core

layout(location = 0) in vec3 Vertex_position;
layout(location = 1) in vec2 Vertex_uv;

layout(location = 2) in vec4 Inst_offset;

void main()
{
    gl_Position = vec4(Vertex_position, 1.0) + Inst_offset;
}
",
    );
}
