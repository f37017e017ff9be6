mod shared;
use gfxsl_ast::ShaderStage;
use gfxsl_generator::{Backend, GenerateError};
use gfxsl_msl::MslBackend;
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
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
};

struct Vertex
{
    float3 position [[attribute(0)]];
    float2 uv [[attribute(1)]];
};

struct Transform
{
    float4x4 mvp;
};

struct Interp
{
    float4 position [[position]];
    float2 uv [[user(locn0)]];
};

float4 expand(Global global, float3 v)
{
    return float4(v, 1.0);
}

void main_vertex_impl(Global global, Vertex vertex_, constant Transform &transform, thread Interp &output)
{
    output.position = (transform.mvp * expand(global, vertex_.position));
    output.uv = vertex_.uv;
}

vertex Interp main_vertex(Vertex vertex_ [[stage_in]], constant Transform &transform [[buffer(0)]])
{
    Global global;
    Interp output;
    main_vertex_impl(global, vertex_, transform, output);
    return output;
}
",
    );
}

#[test]
fn check_fragment_stage() {
    // Metal textures share the source V convention so sampling is not flipped
    check(
        TRANSFORM_SHADER,
        ShaderStage::Fragment,
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
    texture2d<float> albedo;
    sampler global_sampler;
};

struct Interp
{
    float4 position [[position]];
    float2 uv [[user(locn0)]];
};

struct Target
{
    float4 color [[color(0)]];
};

void main_fragment_impl(Global global, Interp input, thread Target &target)
{
    target.color = global.albedo.sample(global.global_sampler, input.uv);
}

fragment Target main_fragment(Interp input [[stage_in]], texture2d<float> albedo [[texture(0)]], sampler global_sampler [[sampler(0)]])
{
    Global global;
    global.albedo = albedo;
    global.global_sampler = global_sampler;
    Target target;
    main_fragment_impl(global, input, target);
    return target;
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
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
    uint3 dispatch_thread_id;
};

struct Particles
{
    float4 positions[64];
};

struct Params
{
    float dt;
    uint count;
};

void main_compute_impl(Global global, device Particles &particles, constant Params &params)
{
    uint i = global.dispatch_thread_id.x;
    if (i < params.count) {
        particles.positions[i] += float4(0.0, params.dt, 0.0, 0.0);
    }
}

kernel void main_compute(device Particles &particles [[buffer(0)]], constant Params &params [[buffer(3)]], uint3 dispatch_thread_id [[thread_position_in_grid]])
{
    Global global;
    global.dispatch_thread_id = dispatch_thread_id;
    main_compute_impl(global, particles, params);
}
",
    );
}

#[test]
fn check_instance_folding() {
    check(
        "
vertex_input Vertex { float3 position : POSITION(FLOAT32); };
instance_input Inst { float4 offset : POSITION(FLOAT32); uint id : TEXCOORD(UINT32); };
vertex_output Interp { float4 position : POSITION; uint id : TEXCOORD; };
void main_vertex(Vertex vertex, Inst inst, out Interp output) {
    output.position = float4(vertex.position, 1.0) + inst.offset;
    output.id = inst.id + instance_id;
}
",
        ShaderStage::Vertex,
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
    uint instance_id;
};

struct Vertex
{
    float3 position [[attribute(0)]];
    float4 Inst_offset [[attribute(1)]];
    uint Inst_id [[attribute(2)]];
};

struct Interp
{
    float4 position [[position]];
    uint id [[user(locn0), flat]];
};

void main_vertex_impl(Global global, Vertex vertex_, thread Interp &output)
{
    output.position = float4(vertex_.position, 1.0) + vertex_.Inst_offset;
    output.id = vertex_.Inst_id + global.instance_id;
}

vertex Interp main_vertex(Vertex vertex_ [[stage_in]], uint instance_id [[instance_id]])
{
    Global global;
    global.instance_id = instance_id;
    Interp output;
    main_vertex_impl(global, vertex_, output);
    return output;
}
",
    );
}

#[test]
fn check_functions_and_system_values() {
    check(
        "
fragment_output Target { float4 color : COLOR; float depth : DEPTH; };
void shade(out float4 color) { color = float4(float(sample_id), 0.0, 0.0, 1.0); }
void main_fragment(out Target target) {
    if (front_facing) { discard; }
    shade(target.color);
    target.depth = 0.5;
}
",
        ShaderStage::Fragment,
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
    uint sample_id;
    bool front_facing;
};

struct Target
{
    float4 color [[color(0)]];
    float depth [[depth(any)]];
};

void shade(Global global, thread float4 &color)
{
    color = float4(float(global.sample_id), 0.0, 0.0, 1.0);
}

void main_fragment_impl(Global global, thread Target &target)
{
    if (global.front_facing) {
        discard_fragment();
    }
    shade(global, target.color);
    target.depth = 0.5;
}

fragment Target main_fragment(uint sample_id [[sample_id]], bool front_facing [[front_facing]])
{
    Global global;
    global.sample_id = sample_id;
    global.front_facing = front_facing;
    Target target;
    main_fragment_impl(global, target);
    return target;
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
texture3D volume;
void main_fragment(out Target target) {
    uint bits = firstbithigh(8u) + countbits(7u);
    uint3 size = texture_size(volume, 1u);
    float4 texel = texture_load(layers, int3(1, 2, 3), 0);
    float4 layered = texture_sample_array_level(layers, float2(0.5, 0.5), 1.0, 0.0);
    target.color = texel + layered + float4(lerp(0.0, 1.0, asfloat(bits)), float(size.x), 0.0, 1.0);
}
",
        ShaderStage::Fragment,
        "#include <metal_stdlib>
using namespace metal;

struct Global
{
    texture2d_array<float> layers;
    texture3d<float> volume;
    sampler global_sampler;
};

struct Target
{
    float4 color [[color(0)]];
};

void main_fragment_impl(Global global, thread Target &target)
{
    uint bits = uint(31 - clz(8u)) + uint(popcount(7u));
    uint3 size = uint3(global.volume.get_width(1u), global.volume.get_height(1u), global.volume.get_depth(1u));
    float4 texel = global.layers.read(uint2((int3(1, 2, 3)).xy), uint((int3(1, 2, 3)).z), uint(0));
    float4 layered = global.layers.sample(global.global_sampler, float2(0.5, 0.5), uint(1.0), level(0.0));
    target.color = texel + layered + float4(mix(0.0, 1.0, as_type<float>(bits)), float(size.x), 0.0, 1.0);
}

fragment Target main_fragment(texture2d_array<float> layers [[texture(0)]], texture3d<float> volume [[texture(1)]], sampler global_sampler [[sampler(0)]])
{
    Global global;
    global.layers = layers;
    global.volume = volume;
    global.global_sampler = global_sampler;
    Target target;
    main_fragment_impl(global, target);
    return target;
}
",
    );
}

#[test]
fn check_double_unsupported() {
    expect_generate_fail(
        "
fragment_output Target { float4 color : COLOR; };
void main_fragment(out Target target) {
    double d = double(1.0);
    target.color = float4(float(d), 0.0, 0.0, 1.0);
}
",
        ShaderStage::Fragment,
        GenerateError::unsupported("Metal", "double"),
    );
}

#[test]
fn check_vertex_format_glue() {
    let layout = input_layout(
        "vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); float4 color : COLOR(UNORM8); };",
        "Vertex",
    );
    let glue = MslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_header,
        "void metal_vertex_format_Vertex(MTLVertexDescriptor *descriptor);

",
    );
    check_text(
        &glue.api_source,
        "void metal_vertex_format_Vertex(MTLVertexDescriptor *descriptor)
{
    descriptor.attributes[0].format = MTLVertexFormatFloat3;
    descriptor.attributes[0].offset = 0;
    descriptor.attributes[0].bufferIndex = 30;
    descriptor.attributes[1].format = MTLVertexFormatUShort2Normalized;
    descriptor.attributes[1].offset = 12;
    descriptor.attributes[1].bufferIndex = 30;
    descriptor.attributes[2].format = MTLVertexFormatUChar4Normalized;
    descriptor.attributes[2].offset = 16;
    descriptor.attributes[2].bufferIndex = 30;
    descriptor.layouts[30].stride = 20;
    descriptor.layouts[30].stepFunction = MTLVertexStepFunctionPerVertex;
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
    let glue = MslBackend.generate_input_glue(&layout).unwrap();
    check_text(
        &glue.api_source,
        "void metal_instance_format_Inst(MTLVertexDescriptor *descriptor, u32 base_attribute)
{
    descriptor.attributes[base_attribute + 0].format = MTLVertexFormatFloat4;
    descriptor.attributes[base_attribute + 0].offset = 0;
    descriptor.attributes[base_attribute + 0].bufferIndex = 29;
    descriptor.attributes[base_attribute + 1].format = MTLVertexFormatUInt;
    descriptor.attributes[base_attribute + 1].offset = 16;
    descriptor.attributes[base_attribute + 1].bufferIndex = 29;
    descriptor.layouts[29].stride = 20;
    descriptor.layouts[29].stepFunction = MTLVertexStepFunctionPerInstance;
    descriptor.layouts[29].stepRate = 1;
}

",
    );
}

#[test]
fn check_glue_rejects_double_attributes() {
    let layout = input_layout(
        "vertex_input Wide { double3 position : POSITION(FLOAT64); };",
        "Wide",
    );
    assert_eq!(
        MslBackend.generate_input_glue(&layout),
        Err(GenerateError::unsupported(
            "Metal",
            "FLOAT64 attribute `Wide.position` read as double"
        ))
    );
}
