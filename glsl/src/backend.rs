use crate::glue::generate_opengl_glue;
use crate::intrinsics::generate_glsl_intrinsic;
use gfxsl_ast::*;
use gfxsl_generator::*;

/// Names which are valid source identifiers but keywords or built ins in GLSL
const RESERVED_WORDS: &[&str] = &[
    "active",
    "attribute",
    "buffer",
    "centroid",
    "coherent",
    "common",
    "dFdx",
    "dFdy",
    "filter",
    "flat",
    "flip_v",
    "fract",
    "highp",
    "input",
    "inversesqrt",
    "invariant",
    "layout",
    "lowp",
    "main",
    "mat2",
    "mat3",
    "mat4",
    "mediump",
    "mix",
    "noperspective",
    "output",
    "partition",
    "patch",
    "precision",
    "readonly",
    "restrict",
    "sample",
    "sampler",
    "shared",
    "smooth",
    "subroutine",
    "texture",
    "uniform",
    "varying",
    "vec2",
    "vec3",
    "vec4",
    "volatile",
    "writeonly",
];

/// Backend generating GLSL source for OpenGL
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct GlslBackend;

impl Backend for GlslBackend {
    fn name(&self) -> &'static str {
        "GLSL"
    }

    fn layout_rules(&self) -> LayoutRules {
        LayoutRules::Std140
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    fn primitive_name(&self, primitive: PrimitiveType) -> GenerateResult<String> {
        primitive_name(primitive)
    }

    fn texture_type_name(&self, kind: TextureKind) -> GenerateResult<String> {
        let name = match kind {
            TextureKind::Texture1D => "sampler1D",
            TextureKind::Texture2D => "sampler2D",
            TextureKind::Texture2DArray => "sampler2DArray",
            TextureKind::Texture3D => "sampler3D",
            TextureKind::TextureCube => "samplerCube",
            TextureKind::TextureCubeArray => "samplerCubeArray",
        };
        Ok(name.to_string())
    }

    fn generate_header(&self, gen: &mut Generator) -> GenerateResult<()> {
        let version = required_version(gen);
        log::debug!("using GLSL {version} for the {} stage", gen.stage.name());
        gen.write(&format!("#version {version} core"));
        generate_flip_helpers(gen);
        Ok(())
    }

    fn generate_structure(&self, gen: &mut Generator, sd: &Struct) -> GenerateResult<()> {
        let module = gen.module;
        let name = gen.type_name(sd.type_id)?;
        match sd.kind {
            StructKind::Struct | StructKind::SharedStruct => {
                gen.separate();
                gen.write(&format!("struct {name}"));
                gen.line("{");
                gen.push_indent();
                for member in module.members(sd.type_id) {
                    let declaration = gen.declaration(member)?;
                    gen.line(&format!("{declaration};"));
                }
                gen.pop_indent();
                gen.line("};");
            }
            StructKind::UniformBuffer | StructKind::ConstantBuffer | StructKind::MutableBuffer => {
                let qualifier = match sd.kind {
                    StructKind::MutableBuffer => {
                        format!("layout(std140, binding = {}) buffer", sd.slot.unwrap_or(0))
                    }
                    _ => "layout(std140) uniform".to_string(),
                };
                gen.separate();
                gen.write(&format!("{qualifier} {name}"));
                gen.line("{");
                gen.push_indent();
                for member in module.members(sd.type_id) {
                    let ty = gen.type_name(member.type_id)?;
                    let member_name = gen.identifier(&gen.prefixed_member_name(sd.type_id, member));
                    gen.line(&format!("{ty} {member_name}{};", member.array.suffix()));
                }
                gen.pop_indent();
                gen.line("};");
            }
            _ => generate_stage_io(gen, sd)?,
        }
        Ok(())
    }

    fn generate_texture(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()> {
        let ty = self.texture_type_name(texture.kind)?;
        let name = gen.identifier(&texture.name);
        gen.separate();
        gen.write(&format!("uniform {ty} {name};"));
        Ok(())
    }

    fn generate_entry_point(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        gen.separate();
        if gen.stage == ShaderStage::Compute {
            let [x, y, z] = function.threads;
            gen.write(&format!(
                "layout(local_size_x = {x}, local_size_y = {y}, local_size_z = {z}) in;"
            ));
            gen.new_line();
        }
        gen.write("void main()");
        gen.new_line();
        gen.generate_function_body(function)
    }

    fn is_param_elided(&self, gen: &Generator, param: &Variable) -> bool {
        gen.struct_kind(param.type_id)
            .map(|kind| kind.is_buffer() || kind.is_stage_io())
            .unwrap_or(false)
    }

    fn generate_variable(&self, gen: &mut Generator, variable: &Variable) -> GenerateResult<()> {
        if variable.kind == VariableKind::SystemValue {
            let name = variable.semantic.and_then(system_value_name).ok_or_else(|| {
                GenerateError::unsupported(self.name(), format!("system value `{}`", variable.name))
            })?;
            gen.write(name);
            return Ok(());
        }
        if gen.struct_kind(variable.type_id).map(StructKind::is_stage_io).unwrap_or(false) {
            return Err(GenerateError::unsupported(
                self.name(),
                format!("use of stage struct `{}` as a whole value", variable.name),
            ));
        }
        gen.write_variable_name(variable)
    }

    fn generate_member(&self, gen: &mut Generator, object: NodeId, member: &Variable) -> GenerateResult<()> {
        let owner = gen.module.nodes.value_type(object).type_id;
        match gen.struct_kind(owner) {
            Some(kind) if kind.is_stage_io() => {
                let name = gen.identifier(&gen.prefixed_member_name(owner, member));
                gen.write(&name);
                Ok(())
            }
            _ => gen.generate_member_default(object, member),
        }
    }

    fn generate_intrinsic(&self, gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
        generate_glsl_intrinsic(gen, intrinsic, args)
    }

    fn generate_input_glue(&self, layout: &InputLayout) -> GenerateResult<Fragments> {
        generate_opengl_glue(layout)
    }
}

/// GLSL name of a primitive type
pub(crate) fn primitive_name(primitive: PrimitiveType) -> GenerateResult<String> {
    let prefix = match primitive.scalar {
        ScalarType::Bool => "b",
        ScalarType::Int => "i",
        ScalarType::UInt => "u",
        ScalarType::Float => "",
        ScalarType::Double => "d",
    };
    match primitive.dimension {
        Dimension::Scalar => Ok(primitive.scalar.name().to_string()),
        Dimension::Vector(n) => Ok(format!("{prefix}vec{n}")),
        Dimension::Matrix(n) if primitive.scalar == ScalarType::Float => Ok(format!("mat{n}")),
        Dimension::Matrix(_) => Err(GenerateError::unsupported("GLSL", primitive.name())),
    }
}

/// GLSL expression for a system value
fn system_value_name(semantic: Semantic) -> Option<&'static str> {
    Some(match semantic {
        Semantic::Vertex => "uint(gl_VertexID)",
        Semantic::Instance => "uint(gl_InstanceID)",
        Semantic::Primitive => "uint(gl_PrimitiveID)",
        Semantic::Sample => "uint(gl_SampleID)",
        Semantic::FrontFacing => "gl_FrontFacing",
        Semantic::DispatchThread => "gl_GlobalInvocationID",
        Semantic::GroupThread => "gl_LocalInvocationID",
        Semantic::Group => "gl_WorkGroupID",
        _ => return None,
    })
}

/// Built in variable which replaces a pipeline managed stage member
fn builtin_member(kind: StructKind, stage: ShaderStage, semantic: Option<Semantic>) -> Option<&'static str> {
    match (semantic?, kind, stage) {
        (Semantic::Position, StructKind::VertexOutput, ShaderStage::Vertex) => Some("gl_Position"),
        (Semantic::Position, StructKind::VertexOutput | StructKind::FragmentInput, ShaderStage::Fragment) => {
            Some("gl_FragCoord")
        }
        (Semantic::Depth, StructKind::FragmentOutput, ShaderStage::Fragment) => Some("gl_FragDepth"),
        _ => None,
    }
}

/// Emit the members of a stage struct as located globals
fn generate_stage_io(gen: &mut Generator, sd: &Struct) -> GenerateResult<()> {
    let module = gen.module;
    let (direction, interpolated) = match (sd.kind, gen.stage) {
        (StructKind::VertexInput | StructKind::InstanceInput, _) => ("in", false),
        (StructKind::VertexOutput, ShaderStage::Vertex) => ("out", true),
        (StructKind::VertexOutput | StructKind::FragmentInput, _) => ("in", true),
        (StructKind::FragmentOutput, _) => ("out", false),
        _ => return Ok(()),
    };

    // Instance attributes follow the vertex attributes
    let mut location = match sd.kind {
        StructKind::InstanceInput => module
            .find_param_of_kind(gen.entry.id, StructKind::VertexInput)
            .map(|param| module.get_type(param.type_id).member_count)
            .unwrap_or(0),
        _ => 0,
    };

    let mut lines = Vec::new();
    for member in module.members(sd.type_id) {
        let name = gen.identifier(&gen.prefixed_member_name(sd.type_id, member));
        if let Some(builtin) = builtin_member(sd.kind, gen.stage, member.semantic) {
            gen.add_substitution(name, builtin.to_string());
            continue;
        }
        let ty = gen.type_name(member.type_id)?;
        let integer = module
            .get_type(member.type_id)
            .as_primitive()
            .map(|p| p.scalar != ScalarType::Float)
            .unwrap_or(false);
        let flat = if interpolated && integer { "flat " } else { "" };
        lines.push(format!("layout(location = {location}) {flat}{direction} {ty} {name};"));
        location += 1;
    }

    if !lines.is_empty() {
        gen.separate();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                gen.new_line();
            }
            gen.write(line);
        }
    }
    Ok(())
}

/// Minimum GLSL version for the features a stage uses
fn required_version(gen: &Generator) -> u32 {
    let module = gen.module;
    let nested = |variable: &Variable| matches!(variable.array, ArrayDims::Two(..));

    let mutable_buffers = gen
        .reachable
        .structs(module)
        .iter()
        .any(|sd| sd.kind == StructKind::MutableBuffer);
    let nested_members = gen
        .reachable
        .structs(module)
        .iter()
        .any(|sd| module.members(sd.type_id).iter().any(nested));
    let nested_variables = gen.reachable.nodes.iter().any(|id| match module.nodes.get(*id) {
        Node::Variable(variable) | Node::VariableDeclaration(variable, _) => {
            nested(module.get_variable(*variable))
        }
        _ => false,
    });

    if gen.stage == ShaderStage::Compute || mutable_buffers || nested_members || nested_variables {
        430
    } else {
        410
    }
}

/// Component count of the coordinate given to `flip_v` when sampling a texture kind
pub(crate) fn flipped_coordinate_size(kind: TextureKind) -> Option<u32> {
    if !kind.has_flippable_v() {
        return None;
    }
    match kind {
        TextureKind::Texture3D => Some(3),
        _ => Some(2),
    }
}

/// Emit the `flip_v` overloads used by texture sampling in the stage
fn generate_flip_helpers(gen: &mut Generator) {
    for size in [2, 3] {
        let reader: &Generator = gen;
        let used = reader.uses_intrinsic(|intrinsic, args| {
            intrinsic.is_texture_sample()
                && reader.texture_kind(args[0]).and_then(flipped_coordinate_size) == Some(size)
        });
        if !used {
            continue;
        }

        let body = match size {
            2 => "return vec2(uv.x, 1.0 - uv.y);",
            _ => "return vec3(uv.x, 1.0 - uv.y, uv.z);",
        };
        gen.separate();
        gen.write(&format!("vec{size} flip_v(vec{size} uv)"));
        gen.line("{");
        gen.push_indent();
        gen.line(body);
        gen.pop_indent();
        gen.line("}");
    }
}
