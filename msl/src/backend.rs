use crate::glue::generate_metal_glue;
use crate::intrinsics::generate_metal_intrinsic;
use gfxsl_ast::*;
use gfxsl_generator::*;

/// Names which are valid source identifiers but keywords or built ins in Metal
const RESERVED_WORDS: &[&str] = &[
    "Global",
    "as_type",
    "constant",
    "device",
    "dfdx",
    "dfdy",
    "discard_fragment",
    "fract",
    "fragment",
    "global",
    "half",
    "kernel",
    "main",
    "metal",
    "mix",
    "namespace",
    "popcount",
    "sampler",
    "template",
    "texture",
    "thread",
    "threadgroup",
    "typename",
    "using",
    "vertex",
];

/// Name of the sampler member of the `Global` struct
pub(crate) const GLOBAL_SAMPLER: &str = "global_sampler";

/// Backend generating Metal Shading Language source
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct MslBackend;

impl Backend for MslBackend {
    fn name(&self) -> &'static str {
        "Metal"
    }

    fn layout_rules(&self) -> LayoutRules {
        LayoutRules::Metal
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    fn primitive_name(&self, primitive: PrimitiveType) -> GenerateResult<String> {
        primitive_name(primitive)
    }

    fn texture_type_name(&self, kind: TextureKind) -> GenerateResult<String> {
        let name = match kind {
            TextureKind::Texture1D => "texture1d<float>",
            TextureKind::Texture2D => "texture2d<float>",
            TextureKind::Texture2DArray => "texture2d_array<float>",
            TextureKind::Texture3D => "texture3d<float>",
            TextureKind::TextureCube => "texturecube<float>",
            TextureKind::TextureCubeArray => "texturecube_array<float>",
        };
        Ok(name.to_string())
    }

    fn generate_header(&self, gen: &mut Generator) -> GenerateResult<()> {
        gen.write("#include <metal_stdlib>");
        gen.line("using namespace metal;");

        let fields = global_fields(self, gen)?;
        gen.separate();
        gen.write("struct Global");
        gen.line("{");
        gen.push_indent();
        for field in &fields {
            gen.line(&format!("{} {};", field.ty, field.name));
        }
        gen.pop_indent();
        gen.line("};");
        Ok(())
    }

    fn generate_structure(&self, gen: &mut Generator, sd: &Struct) -> GenerateResult<()> {
        let module = gen.module;

        // Instance members are declared inside the vertex input struct
        if sd.kind == StructKind::InstanceInput {
            return Ok(());
        }

        let name = gen.type_name(sd.type_id)?;
        let mut lines = Vec::new();
        match sd.kind {
            StructKind::VertexInput => {
                for member in module.members(sd.type_id) {
                    let ty = gen.type_name(member.type_id)?;
                    let member_name = gen.identifier(&member.name);
                    lines.push(format!("{ty} {member_name} [[attribute({})]];", lines.len()));
                }
                if let Some(instance) = module.find_param_of_kind(gen.entry.id, StructKind::InstanceInput) {
                    for member in module.members(instance.type_id) {
                        let ty = gen.type_name(member.type_id)?;
                        let member_name = gen.identifier(&gen.prefixed_member_name(instance.type_id, member));
                        lines.push(format!("{ty} {member_name} [[attribute({})]];", lines.len()));
                    }
                }
            }
            StructKind::VertexOutput | StructKind::FragmentInput => {
                let mut location = 0;
                for member in module.members(sd.type_id) {
                    let declaration = gen.declaration(member)?;
                    let attribute = match member.semantic {
                        Some(Semantic::Position) => "position".to_string(),
                        _ => {
                            let integer = module
                                .get_type(member.type_id)
                                .as_primitive()
                                .map(|p| p.scalar != ScalarType::Float)
                                .unwrap_or(false);
                            let flat = if integer { ", flat" } else { "" };
                            location += 1;
                            format!("user(locn{}){flat}", location - 1)
                        }
                    };
                    lines.push(format!("{declaration} [[{attribute}]];"));
                }
            }
            StructKind::FragmentOutput => {
                let mut color = 0;
                for member in module.members(sd.type_id) {
                    let declaration = gen.declaration(member)?;
                    let attribute = match member.semantic {
                        Some(Semantic::Depth) => "depth(any)".to_string(),
                        _ => {
                            color += 1;
                            format!("color({})", color - 1)
                        }
                    };
                    lines.push(format!("{declaration} [[{attribute}]];"));
                }
            }
            _ => {
                for member in module.members(sd.type_id) {
                    lines.push(format!("{};", gen.declaration(member)?));
                }
            }
        }

        gen.separate();
        gen.write(&format!("struct {name}"));
        gen.line("{");
        gen.push_indent();
        for line in &lines {
            gen.line(line);
        }
        gen.pop_indent();
        gen.line("};");
        Ok(())
    }

    fn generate_texture(&self, _: &mut Generator, _: &Texture) -> GenerateResult<()> {
        // Textures are members of the Global struct
        Ok(())
    }

    fn generate_entry_point(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        let module = gen.module;
        let name = gen.identifier(&function.name);

        gen.separate();
        let params = with_global(gen.param_list(function)?);
        gen.write(&format!("void {name}_impl({params})"));
        gen.new_line();
        gen.generate_function_body(function)?;

        let mut wrapper_params = Vec::new();
        let mut call_args = vec!["global".to_string()];
        let mut output = None;
        for param in module.params(function.id) {
            let ty = gen.type_name(param.type_id)?;
            let param_name = gen.identifier(&param.name);
            let slot = module
                .struct_for_type(param.type_id)
                .and_then(|sd| sd.slot)
                .unwrap_or(0);
            match gen.struct_kind(param.type_id) {
                Some(StructKind::InstanceInput) => continue,
                Some(StructKind::MutableBuffer) => {
                    wrapper_params.push(format!("device {ty} &{param_name} [[buffer({slot})]]"))
                }
                Some(kind) if kind.is_buffer() => {
                    wrapper_params.push(format!("constant {ty} &{param_name} [[buffer({slot})]]"))
                }
                Some(kind) if kind.is_stage_io() && param.qualifiers.is_out => {
                    output = Some((ty, param_name.clone()))
                }
                Some(kind) if kind.is_stage_io() => {
                    wrapper_params.push(format!("{ty} {param_name} [[stage_in]]"))
                }
                _ => {
                    return Err(GenerateError::unsupported(
                        self.name(),
                        format!("entry point parameter `{}`", param.name),
                    ))
                }
            }
            call_args.push(param_name);
        }

        let fields = global_fields(self, gen)?;
        for field in &fields {
            wrapper_params.push(format!("{} {} [[{}]]", field.ty, field.name, field.attribute));
        }

        let qualifier = match gen.stage {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "kernel",
        };
        let return_type = output.as_ref().map(|(ty, _)| ty.as_str()).unwrap_or("void");

        gen.separate();
        gen.write(&format!(
            "{qualifier} {return_type} {name}({})",
            wrapper_params.join(", ")
        ));
        gen.line("{");
        gen.push_indent();
        gen.line("Global global;");
        for field in &fields {
            gen.line(&format!("global.{0} = {0};", field.name));
        }
        if let Some((ty, output)) = &output {
            gen.line(&format!("{ty} {output};"));
        }
        gen.line(&format!("{name}_impl({});", call_args.join(", ")));
        if let Some((_, output)) = &output {
            gen.line(&format!("return {output};"));
        }
        gen.pop_indent();
        gen.line("}");
        Ok(())
    }

    fn global_constant_prefix(&self) -> &'static str {
        "constant "
    }

    fn discard_statement(&self) -> &'static str {
        "discard_fragment();"
    }

    fn is_param_elided(&self, gen: &Generator, param: &Variable) -> bool {
        gen.struct_kind(param.type_id) == Some(StructKind::InstanceInput)
    }

    fn generate_param(&self, gen: &Generator, param: &Variable) -> GenerateResult<Option<String>> {
        if self.is_param_elided(gen, param) {
            return Ok(None);
        }
        let ty = gen.type_name(param.type_id)?;
        let name = gen.identifier(&param.name);
        let declaration = match gen.struct_kind(param.type_id) {
            Some(StructKind::MutableBuffer) => format!("device {ty} &{name}"),
            Some(kind) if kind.is_buffer() => format!("constant {ty} &{name}"),
            _ if param.qualifiers.is_out => match param.array {
                ArrayDims::None => format!("thread {ty} &{name}"),
                array => format!("thread {ty} (&{name}){}", array.suffix()),
            },
            _ if param.qualifiers.is_const => format!("const {ty} {name}{}", param.array.suffix()),
            _ => format!("{ty} {name}{}", param.array.suffix()),
        };
        Ok(Some(declaration))
    }

    fn generate_function_signature(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        let params = with_global(gen.param_list(function)?);
        let return_type = gen.type_name(function.return_type)?;
        let name = gen.identifier(&function.name);
        gen.write(&format!("{return_type} {name}({params})"));
        Ok(())
    }

    fn generate_function_call(&self, gen: &mut Generator, function: &Function, args: &[NodeId]) -> GenerateResult<()> {
        let args = gen.visible_args(function, args);
        let name = gen.identifier(&function.name);
        gen.write(&format!("{name}(global"));
        for arg in args {
            gen.write(", ");
            gen.generate_expression(arg)?;
        }
        gen.write(")");
        Ok(())
    }

    fn generate_variable(&self, gen: &mut Generator, variable: &Variable) -> GenerateResult<()> {
        if variable.kind == VariableKind::SystemValue {
            let name = variable
                .semantic
                .and_then(Semantic::system_value_name)
                .ok_or_else(|| GenerateError::unsupported(self.name(), format!("system value `{}`", variable.name)))?;
            gen.write(&format!("global.{name}"));
            return Ok(());
        }
        gen.write_variable_name(variable)
    }

    fn generate_member(&self, gen: &mut Generator, object: NodeId, member: &Variable) -> GenerateResult<()> {
        let module = gen.module;
        let owner = module.nodes.value_type(object).type_id;
        match gen.struct_kind(owner) {
            Some(StructKind::InstanceInput) => {
                let vertex = module
                    .find_param_of_kind(gen.entry.id, StructKind::VertexInput)
                    .ok_or_else(|| {
                        GenerateError::unsupported(self.name(), "instance input without a vertex input")
                    })?;
                let name = format!(
                    "{}.{}",
                    gen.identifier(&vertex.name),
                    gen.identifier(&gen.prefixed_member_name(owner, member))
                );
                gen.write(&name);
                Ok(())
            }
            Some(_) => {
                // Buffers are references so their members are accessed directly
                gen.generate_expression(object)?;
                let name = gen.identifier(&member.name);
                gen.write(&format!(".{name}"));
                Ok(())
            }
            None => gen.generate_member_default(object, member),
        }
    }

    fn generate_intrinsic(&self, gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
        generate_metal_intrinsic(gen, intrinsic, args)
    }

    fn generate_texture_reference(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()> {
        let name = gen.identifier(&texture.name);
        gen.write(&format!("global.{name}"));
        Ok(())
    }

    fn generate_input_glue(&self, layout: &InputLayout) -> GenerateResult<Fragments> {
        generate_metal_glue(layout)
    }
}

/// Metal name of a primitive type
pub(crate) fn primitive_name(primitive: PrimitiveType) -> GenerateResult<String> {
    match (primitive.scalar, primitive.dimension) {
        (ScalarType::Double, _) => Err(GenerateError::unsupported("Metal", primitive.name())),
        (scalar, Dimension::Scalar) => Ok(scalar.name().to_string()),
        (scalar, Dimension::Vector(n)) => Ok(format!("{}{n}", scalar.name())),
        (ScalarType::Float, Dimension::Matrix(n)) => Ok(format!("float{n}x{n}")),
        (_, Dimension::Matrix(_)) => Err(GenerateError::unsupported("Metal", primitive.name())),
    }
}

/// Add the implicit `Global` parameter to a parameter list
fn with_global(params: String) -> String {
    if params.is_empty() {
        "Global global".to_string()
    } else {
        format!("Global global, {params}")
    }
}

/// Member of the `Global` struct and the wrapper attribute which provides it
struct GlobalField {
    ty: String,
    name: String,
    attribute: String,
}

/// Stage attribute of a system value
fn system_value_attribute(semantic: Semantic) -> Option<&'static str> {
    Some(match semantic {
        Semantic::Vertex => "vertex_id",
        Semantic::Instance => "instance_id",
        Semantic::Primitive => "primitive_id",
        Semantic::Sample => "sample_id",
        Semantic::FrontFacing => "front_facing",
        Semantic::DispatchThread => "thread_position_in_grid",
        Semantic::GroupThread => "thread_position_in_threadgroup",
        Semantic::Group => "threadgroup_position_in_grid",
        _ => return None,
    })
}

/// Collect the system values and textures used by the stage
fn global_fields(backend: &MslBackend, gen: &Generator) -> GenerateResult<Vec<GlobalField>> {
    let module = gen.module;
    let mut fields = Vec::new();

    for semantic in &gen.reachable.system_values {
        let unsupported = || GenerateError::unsupported(backend.name(), format!("system value {}", semantic.name()));
        let variable = module.find_system_value(*semantic).ok_or_else(unsupported)?;
        let name = semantic.system_value_name().ok_or_else(unsupported)?;
        let attribute = system_value_attribute(*semantic).ok_or_else(unsupported)?;
        fields.push(GlobalField {
            ty: gen.type_name(module.get_variable(variable).type_id)?,
            name: name.to_string(),
            attribute: attribute.to_string(),
        });
    }

    let textures = gen.reachable.textures(module);
    for texture in &textures {
        fields.push(GlobalField {
            ty: backend.texture_type_name(texture.kind)?,
            name: gen.identifier(&texture.name),
            attribute: format!("texture({})", texture.slot),
        });
    }
    if !textures.is_empty() {
        fields.push(GlobalField {
            ty: "sampler".to_string(),
            name: GLOBAL_SAMPLER.to_string(),
            attribute: "sampler(0)".to_string(),
        });
    }

    Ok(fields)
}
