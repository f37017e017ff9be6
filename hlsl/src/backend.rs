use crate::glue::generate_d3d11_glue;
use crate::intrinsics::{generate_hlsl_intrinsic, TEXTURE_SIZE_HELPER};
use gfxsl_ast::*;
use gfxsl_generator::*;

/// Names which are valid source identifiers but keywords or built ins in HLSL
const RESERVED_WORDS: &[&str] = &[
    "RWStructuredBuffer",
    "SamplerState",
    "Texture1D",
    "Texture2D",
    "Texture2DArray",
    "Texture3D",
    "TextureCube",
    "TextureCubeArray",
    "cbuffer",
    "centroid",
    "column_major",
    "compile",
    "export",
    "extern",
    "global_sampler",
    "groupshared",
    "half",
    "line",
    "linear",
    "matrix",
    "nointerpolation",
    "numthreads",
    "packoffset",
    "pass",
    "point",
    "precise",
    "register",
    "row_major",
    "sample",
    "sampler",
    "shared",
    "snorm",
    "static",
    "string",
    "tbuffer",
    "technique",
    "texture",
    "triangle",
    "typedef",
    "uniform",
    "unorm",
    "vector",
    "volatile",
];

/// Name of the sampler every texture is sampled with
pub(crate) const GLOBAL_SAMPLER: &str = "global_sampler";

/// Backend generating HLSL source for shader model 5
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct HlslBackend;

impl Backend for HlslBackend {
    fn name(&self) -> &'static str {
        "HLSL"
    }

    fn layout_rules(&self) -> LayoutRules {
        LayoutRules::Std140
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    fn primitive_name(&self, primitive: PrimitiveType) -> GenerateResult<String> {
        Ok(match primitive.dimension {
            Dimension::Scalar => primitive.scalar.name().to_string(),
            Dimension::Vector(n) => format!("{}{n}", primitive.scalar.name()),
            Dimension::Matrix(n) => format!("{}{n}x{n}", primitive.scalar.name()),
        })
    }

    fn texture_type_name(&self, kind: TextureKind) -> GenerateResult<String> {
        Ok(texture_type_name(kind).to_string())
    }

    fn generate_header(&self, gen: &mut Generator) -> GenerateResult<()> {
        let module = gen.module;

        let mut statics = Vec::new();
        for semantic in &gen.reachable.system_values {
            let variable = module
                .find_system_value(*semantic)
                .ok_or_else(|| GenerateError::unsupported(self.name(), format!("system value {}", semantic.name())))?;
            let variable = module.get_variable(variable);
            statics.push(format!(
                "static {} {};",
                gen.type_name(variable.type_id)?,
                gen.identifier(&variable.name)
            ));
        }
        write_group(gen, &statics);

        if !gen.reachable.textures(module).is_empty() {
            gen.separate();
            gen.write(&format!("SamplerState {GLOBAL_SAMPLER} : register(s0);"));
        }

        for (kind, helper) in TEXTURE_SIZE_HELPER {
            let reader: &Generator = gen;
            let used = reader.uses_intrinsic(|intrinsic, args| {
                intrinsic == Intrinsic::TextureSize && reader.texture_kind(args[0]) == Some(kind)
            });
            if used {
                write_group(gen, &helper_lines(kind, helper));
            }
        }
        Ok(())
    }

    fn generate_structure(&self, gen: &mut Generator, sd: &Struct) -> GenerateResult<()> {
        let module = gen.module;
        let name = gen.type_name(sd.type_id)?;
        let slot = sd.slot.unwrap_or(0);
        match sd.kind {
            StructKind::UniformBuffer | StructKind::ConstantBuffer => {
                let mut lines = Vec::new();
                for member in module.members(sd.type_id) {
                    let ty = gen.type_name(member.type_id)?;
                    let member_name = gen.identifier(&gen.prefixed_member_name(sd.type_id, member));
                    lines.push(format!("{ty} {member_name}{};", member.array.suffix()));
                }
                write_block(gen, &format!("cbuffer {name} : register(b{slot})"), &lines);
            }
            StructKind::MutableBuffer => {
                let mut lines = Vec::new();
                for member in module.members(sd.type_id) {
                    lines.push(format!("{};", gen.declaration(member)?));
                }
                write_block(gen, &format!("struct {name}"), &lines);
                gen.separate();
                gen.write(&format!(
                    "RWStructuredBuffer<{name}> {} : register(u{slot});",
                    data_name(gen, sd.type_id)
                ));
            }
            kind if kind.is_stage_io() => {
                let members = module.members(sd.type_id);
                let mut lines = Vec::new();
                let mut target = 0;
                for (member, index) in members.iter().zip(semantic_indices(members)) {
                    let declaration = gen.declaration(member)?;
                    let semantic = match (kind, member.semantic) {
                        (StructKind::FragmentOutput, Some(Semantic::Depth)) => "SV_Depth".to_string(),
                        (StructKind::FragmentOutput, _) => {
                            target += 1;
                            format!("SV_Target{}", target - 1)
                        }
                        (StructKind::VertexOutput | StructKind::FragmentInput, Some(Semantic::Position)) => {
                            "SV_Position".to_string()
                        }
                        (StructKind::InstanceInput, Some(semantic)) => {
                            format!("INSTANCE_{}{index}", semantic.name())
                        }
                        (_, Some(semantic)) => format!("{}{index}", semantic.name()),
                        (_, None) => {
                            return Err(GenerateError::unsupported(
                                self.name(),
                                format!("stage member `{}.{}` without a semantic", name, member.name),
                            ))
                        }
                    };
                    lines.push(format!("{declaration} : {semantic};"));
                }
                write_block(gen, &format!("struct {name}"), &lines);
            }
            _ => {
                let mut lines = Vec::new();
                for member in module.members(sd.type_id) {
                    lines.push(format!("{};", gen.declaration(member)?));
                }
                write_block(gen, &format!("struct {name}"), &lines);
            }
        }
        Ok(())
    }

    fn generate_texture(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()> {
        let ty = texture_type_name(texture.kind);
        let name = gen.identifier(&texture.name);
        gen.separate();
        gen.write(&format!("{ty} {name} : register(t{});", texture.slot));
        Ok(())
    }

    fn generate_entry_point(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        let module = gen.module;
        let name = gen.identifier(&function.name);
        let params = gen.param_list(function)?;

        let mut system_values = Vec::new();
        for semantic in &gen.reachable.system_values {
            let unsupported = || GenerateError::unsupported(self.name(), format!("system value {}", semantic.name()));
            let variable = module.find_system_value(*semantic).ok_or_else(unsupported)?;
            let variable = module.get_variable(variable);
            let system_semantic = system_value_semantic(*semantic).ok_or_else(unsupported)?;
            system_values.push((
                gen.type_name(variable.type_id)?,
                gen.identifier(&variable.name),
                system_semantic,
            ));
        }

        if system_values.is_empty() {
            gen.separate();
            generate_threads_attribute(gen, function);
            gen.write(&format!("void {name}({params})"));
            gen.new_line();
            return gen.generate_function_body(function);
        }

        // System values are copied into statics so every function can read them
        gen.separate();
        gen.write(&format!("void {name}_impl({params})"));
        gen.new_line();
        gen.generate_function_body(function)?;

        let mut wrapper_params = Vec::new();
        if !params.is_empty() {
            wrapper_params.push(params);
        }
        for (ty, value, semantic) in &system_values {
            wrapper_params.push(format!("{ty} sv_{value} : {semantic}"));
        }
        let args = module
            .params(function.id)
            .iter()
            .filter(|param| !self.is_param_elided(gen, param))
            .map(|param| gen.identifier(&param.name))
            .collect::<Vec<_>>();

        gen.separate();
        generate_threads_attribute(gen, function);
        gen.write(&format!("void {name}({})", wrapper_params.join(", ")));
        gen.line("{");
        gen.push_indent();
        for (_, value, _) in &system_values {
            gen.line(&format!("{value} = sv_{value};"));
        }
        gen.line(&format!("{name}_impl({});", args.join(", ")));
        gen.pop_indent();
        gen.line("}");
        Ok(())
    }

    fn global_constant_prefix(&self) -> &'static str {
        "static const "
    }

    fn generate_member(&self, gen: &mut Generator, object: NodeId, member: &Variable) -> GenerateResult<()> {
        let owner = gen.module.nodes.value_type(object).type_id;
        if gen.struct_kind(owner) == Some(StructKind::MutableBuffer) {
            let name = format!("{}[0].{}", data_name(gen, owner), gen.identifier(&member.name));
            gen.write(&name);
            return Ok(());
        }
        gen.generate_member_default(object, member)
    }

    fn generate_intrinsic(&self, gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
        generate_hlsl_intrinsic(gen, intrinsic, args)
    }

    fn generate_input_glue(&self, layout: &InputLayout) -> GenerateResult<Fragments> {
        generate_d3d11_glue(layout)
    }
}

pub(crate) fn texture_type_name(kind: TextureKind) -> &'static str {
    match kind {
        TextureKind::Texture1D => "Texture1D",
        TextureKind::Texture2D => "Texture2D",
        TextureKind::Texture2DArray => "Texture2DArray",
        TextureKind::Texture3D => "Texture3D",
        TextureKind::TextureCube => "TextureCube",
        TextureKind::TextureCubeArray => "TextureCubeArray",
    }
}

/// Entry parameter semantic of a system value
fn system_value_semantic(semantic: Semantic) -> Option<&'static str> {
    Some(match semantic {
        Semantic::Vertex => "SV_VertexID",
        Semantic::Instance => "SV_InstanceID",
        Semantic::Primitive => "SV_PrimitiveID",
        Semantic::Sample => "SV_SampleIndex",
        Semantic::FrontFacing => "SV_IsFrontFace",
        Semantic::DispatchThread => "SV_DispatchThreadID",
        Semantic::GroupThread => "SV_GroupThreadID",
        Semantic::Group => "SV_GroupID",
        _ => return None,
    })
}

/// Name of the structured buffer holding a mutable buffer, `Particles_data`
fn data_name(gen: &Generator, type_id: TypeId) -> String {
    gen.identifier(&format!("{}_data", gen.module.type_name(type_id)))
}

fn generate_threads_attribute(gen: &mut Generator, function: &Function) {
    if gen.stage == ShaderStage::Compute {
        let [x, y, z] = function.threads;
        gen.write(&format!("[numthreads({x}, {y}, {z})]"));
        gen.new_line();
    }
}

/// Write consecutive lines as one top level declaration
fn write_group(gen: &mut Generator, lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            gen.separate();
            gen.write(line);
        } else {
            gen.line(line);
        }
    }
}

/// Write `header { lines };`
fn write_block(gen: &mut Generator, header: &str, lines: &[String]) {
    gen.separate();
    gen.write(header);
    gen.line("{");
    gen.push_indent();
    for line in lines {
        gen.line(line);
    }
    gen.pop_indent();
    gen.line("};");
}

/// Lines of a `texture_size` overload which wraps `GetDimensions`
fn helper_lines(kind: TextureKind, dimensions: &[&str]) -> Vec<String> {
    let return_type = match dimensions.len() {
        1 => "uint".to_string(),
        n => format!("uint{n}"),
    };
    let mut lines = vec![
        format!("{return_type} texture_size({} t, uint lod)", texture_type_name(kind)),
        "{".to_string(),
    ];
    for dimension in dimensions {
        lines.push(format!("    uint {dimension};"));
    }
    lines.push("    uint levels;".to_string());
    lines.push(format!(
        "    t.GetDimensions(lod, {}, levels);",
        dimensions.join(", ")
    ));
    match dimensions {
        [single] => lines.push(format!("    return {single};")),
        _ => lines.push(format!("    return {return_type}({});", dimensions.join(", "))),
    }
    lines.push("}".to_string());
    lines
}
