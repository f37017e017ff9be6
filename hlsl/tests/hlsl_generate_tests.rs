mod shared;
use gfxsl_ast::ShaderStage;
use gfxsl_generator::{Backend, GenerateError};
use gfxsl_hlsl::HlslBackend;
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
        "struct Vertex
{
    float3 position : POSITION0;
    float2 uv : TEXCOORD0;
};

cbuffer Transform : register(b0)
{
    float4x4 Transform_mvp;
};

struct Interp
{
    float4 position : SV_Position;
    float2 uv : TEXCOORD0;
};

float4 expand(float3 v)
{
    return float4(v, 1.0);
}

void main_vertex(Vertex vertex, out Interp output)
{
    output.position = mul(Transform_mvp, expand(vertex.position));
    output.uv = vertex.uv;
}
",
    );
}

#[test]
fn check_fragment_stage() {
    check(
        TRANSFORM_SHADER,
        ShaderStage::Fragment,
        "SamplerState global_sampler : register(s0);

struct Interp
{
    float4 position : SV_Position;
    float2 uv : TEXCOORD0;
};

struct Target
{
    float4 color : SV_Target0;
};

Texture2D albedo : register(t0);

void main_fragment(Interp input, out Target target)
{
    target.color = albedo.Sample(global_sampler, input.uv);
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
        "static uint3 dispatch_thread_id;

struct Particles
{
    float4 positions[64];
};

RWStructuredBuffer<Particles> Particles_data : register(u0);

cbuffer Params : register(b3)
{
    float Params_dt;
    uint Params_count;
};

void main_compute_impl()
{
    uint i = dispatch_thread_id.x;
    if (i < Params_count) {
        Particles_data[0].positions[i] += float4(0.0, Params_dt, 0.0, 0.0);
    }
}

[numthreads(64, 1, 1)]
void main_compute(uint3 sv_dispatch_thread_id : SV_DispatchThreadID)
{
    dispatch_thread_id = sv_dispatch_thread_id;
    main_compute_impl();
}
",
    );
}

#[test]
fn check_instance_input() {
    check(
        "
vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(FLOAT32); };
instance_input Inst { float4 offset : POSITION(FLOAT32); float4 tint : COLOR(UNORM8); };
vertex_output Interp { float4 position : POSITION; float4 tint : COLOR; uint id : TEXCOORD; };
void main_vertex(Vertex vertex, Inst inst, out Interp output) {
    output.position = float4(vertex.position, 1.0) + inst.offset;
    output.tint = inst.tint;
    output.id = vertex_id;
}
",
        ShaderStage::Vertex,
        "static uint vertex_id;

struct Vertex
{
    float3 position : POSITION0;
    float2 uv : TEXCOORD0;
};

struct Inst
{
    float4 offset : INSTANCE_POSITION0;
    float4 tint : INSTANCE_COLOR0;
};

struct Interp
{
    float4 position : SV_Position;
    float4 tint : COLOR0;
    uint id : TEXCOORD0;
};

void main_vertex_impl(Vertex vertex, Inst inst, out Interp output)
{
    output.position = float4(vertex.position, 1.0) + inst.offset;
    output.tint = inst.tint;
    output.id = vertex_id;
}

void main_vertex(Vertex vertex, Inst inst, out Interp output, uint sv_vertex_id : SV_VertexID)
{
    vertex_id = sv_vertex_id;
    main_vertex_impl(vertex, inst, output);
}
",
    );
}

#[test]
fn check_constants_and_functions() {
    check(
        "
fragment_output Target { float4 color : COLOR; };
const float SCALE = 2.0;
void scale(inout float4 color) { color *= SCALE; }
void main_fragment(out Target target) {
    float4 color = float4(1.0, 0.5, 0.25, 1.0);
    scale(color);
    if (primitive_id == 0u) { discard; }
    target.color = color;
}
",
        ShaderStage::Fragment,
        "static uint primitive_id;

struct Target
{
    float4 color : SV_Target0;
};

static const float SCALE = 2.0;

void scale(inout float4 color)
{
    color *= SCALE;
}

void main_fragment_impl(out Target target)
{
    float4 color = float4(1.0, 0.5, 0.25, 1.0);
    scale(color);
    if (primitive_id == 0u) {
        discard;
    }
    target.color = color;
}

void main_fragment(out Target target, uint sv_primitive_id : SV_PrimitiveID)
{
    primitive_id = sv_primitive_id;
    main_fragment_impl(target);
}
",
    );
}

#[test]
fn check_texture_operations() {
    // Textures use the same V origin as the source so nothing is flipped
    check(
        "
fragment_output Target { float4 color : COLOR; float depth : DEPTH; };
texture2DArray layers;
textureCube sky;
texture3D volume : 4;
void main_fragment(out Target target) {
    uint3 size = texture_size(layers) + texture_size(volume, 1u);
    float4 texel = texture_load(volume, int3(1, 2, 3), 0);
    float4 layered = texture_sample_array_level(layers, float2(0.5, 0.5), 1.0, 0.0);
    float4 sky_color = texture_sample_bias(sky, float3(0.0, 1.0, 0.0), 0.5);
    target.color = texel + layered + sky_color;
    target.depth = saturate(frac(asfloat(countbits(size.x))));
}
",
        ShaderStage::Fragment,
        "SamplerState global_sampler : register(s0);

uint3 texture_size(Texture2DArray t, uint lod)
{
    uint width;
    uint height;
    uint elements;
    uint levels;
    t.GetDimensions(lod, width, height, elements, levels);
    return uint3(width, height, elements);
}

uint3 texture_size(Texture3D t, uint lod)
{
    uint width;
    uint height;
    uint depth;
    uint levels;
    t.GetDimensions(lod, width, height, depth, levels);
    return uint3(width, height, depth);
}

struct Target
{
    float4 color : SV_Target0;
    float depth : SV_Depth;
};

Texture2DArray layers : register(t0);

TextureCube sky : register(t1);

Texture3D volume : register(t4);

void main_fragment(out Target target)
{
    uint3 size = texture_size(layers, 0u) + texture_size(volume, 1u);
    float4 texel = volume.Load(int4(int3(1, 2, 3), 0));
    float4 layered = layers.SampleLevel(global_sampler, float3(float2(0.5, 0.5), 1.0), 0.0);
    float4 sky_color = sky.SampleBias(global_sampler, float3(0.0, 1.0, 0.0), 0.5);
    target.color = texel + layered + sky_color;
    target.depth = saturate(frac(asfloat(countbits(size.x))));
}
",
    );
}

#[test]
fn check_system_value_outside_stage() {
    expect_generate_fail(
        "
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) {
    target.color = float4(float(vertex_id), 0.0, 0.0, 1.0);
}
",
        ShaderStage::Fragment,
        GenerateError::SystemValueOutsideStage("vertex_id".to_string(), "fragment"),
    );
}

#[test]
fn check_vertex_format_glue() {
    let layout = input_layout(
        "vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); float4 color : COLOR(UNORM8); };",
        "Vertex",
    );
    let glue = HlslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_header,
        "extern const D3D11_INPUT_ELEMENT_DESC d3d11_vertex_format_Vertex[3];

",
    );
    check_text(
        &glue.api_source,
        "const D3D11_INPUT_ELEMENT_DESC d3d11_vertex_format_Vertex[3] =
{
    { \"POSITION\", 0, DXGI_FORMAT_R32G32B32_FLOAT, 0, 0, D3D11_INPUT_PER_VERTEX_DATA, 0 },
    { \"TEXCOORD\", 0, DXGI_FORMAT_R16G16_UNORM, 0, 12, D3D11_INPUT_PER_VERTEX_DATA, 0 },
    { \"COLOR\", 0, DXGI_FORMAT_R8G8B8A8_UNORM, 0, 16, D3D11_INPUT_PER_VERTEX_DATA, 0 },
};

",
    );
}

#[test]
fn check_instance_format_glue() {
    let layout = input_layout(
        "instance_input Inst { float4 offset : POSITION(FLOAT32); float2 uv : TEXCOORD(FLOAT16); uint id : TEXCOORD(UINT32); };",
        "Inst",
    );
    let glue = HlslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_source,
        "const D3D11_INPUT_ELEMENT_DESC d3d11_instance_format_Inst[3] =
{
    { \"INSTANCE_POSITION\", 0, DXGI_FORMAT_R32G32B32A32_FLOAT, 1, 0, D3D11_INPUT_PER_INSTANCE_DATA, 1 },
    { \"INSTANCE_TEXCOORD\", 0, DXGI_FORMAT_R16G16_FLOAT, 1, 16, D3D11_INPUT_PER_INSTANCE_DATA, 1 },
    { \"INSTANCE_TEXCOORD\", 1, DXGI_FORMAT_R32_UINT, 1, 20, D3D11_INPUT_PER_INSTANCE_DATA, 1 },
};

",
    );
}

#[test]
fn check_glue_rejects_three_component_short_formats() {
    let layout = input_layout(
        "vertex_input Packed { float3 normal : NORMAL(SNORM16); };",
        "Packed",
    );
    assert_eq!(
        HlslBackend.generate_input_glue(&layout),
        Err(GenerateError::unsupported(
            "HLSL",
            "SNORM16 attribute `Packed.normal` has no three component DXGI format"
        ))
    );
}
