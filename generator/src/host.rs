use crate::*;
use gfxsl_ast::*;

/// Attribute of a vertex or instance format
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct InputAttribute {
    /// Member name in the source struct
    pub name: String,

    pub semantic: Semantic,

    /// Running index of the semantic within the struct
    pub semantic_index: u32,

    pub format: InputFormat,

    /// Element type the shader reads
    pub scalar: ScalarType,

    pub component_count: u32,

    /// Byte offset of the attribute inside one vertex
    pub offset: u32,

    /// Size of the attribute in vertex memory
    pub size: u32,
}

/// Memory layout of a vertex or instance format
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct InputLayout {
    pub name: String,
    pub kind: StructKind,
    pub attributes: Vec<InputAttribute>,

    /// Distance between consecutive vertices
    pub stride: u32,
}

/// Running index of each member's semantic, `TEXCOORD0`, `TEXCOORD1`
pub fn semantic_indices(members: &[Variable]) -> Vec<u32> {
    let mut counts = std::collections::HashMap::new();
    members
        .iter()
        .map(|member| {
            let count = counts.entry(member.semantic).or_insert(0);
            let index = *count;
            *count += 1;
            index
        })
        .collect()
}

/// Build the tightly packed memory layout of a vertex or instance input struct
pub fn input_layout(module: &Module, type_id: TypeId, backend: &'static str) -> GenerateResult<InputLayout> {
    let ty = module.get_type(type_id);
    let kind = ty.as_struct().unwrap_or(StructKind::VertexInput);
    let members = module.members(type_id);

    let mut attributes = Vec::with_capacity(members.len());
    let mut offset = 0;
    for (member, semantic_index) in members.iter().zip(semantic_indices(members)) {
        let primitive = module.get_type(member.type_id).as_primitive();
        let (scalar, component_count) = match primitive.map(|p| (p.scalar, p.dimension)) {
            Some((scalar, Dimension::Scalar)) => (scalar, 1),
            Some((scalar, Dimension::Vector(n))) => (scalar, n),
            _ => {
                return Err(GenerateError::unsupported(
                    backend,
                    format!("{} `{}.{}`", module.type_name(member.type_id), ty.name, member.name),
                ))
            }
        };
        let (semantic, format) = match (member.semantic, member.format) {
            (Some(semantic), Some(format)) => (semantic, format),
            _ => {
                return Err(GenerateError::unsupported(
                    backend,
                    format!("input member `{}.{}` without a format", ty.name, member.name),
                ))
            }
        };
        let size = attribute_size(format, component_count);
        attributes.push(InputAttribute {
            name: member.name.clone(),
            semantic,
            semantic_index,
            format,
            scalar,
            component_count,
            offset,
            size,
        });
        offset += size;
    }

    Ok(InputLayout {
        name: ty.name.clone(),
        kind,
        attributes,
        stride: offset,
    })
}

/// Convert a name into a valid C++ identifier
pub fn host_identifier(name: &str) -> String {
    let mut identifier = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    if identifier.starts_with(|c: char| c.is_ascii_digit()) || identifier.is_empty() {
        identifier.insert(0, '_');
    }
    identifier
}

/// Build the host fragments for a struct which has a host mirror
///
/// Fragments do not depend on the registry id so entries can move between sessions.
pub fn generate_struct_fragments(module: &Module, type_id: TypeId, backend: &dyn Backend) -> GenerateResult<Fragments> {
    let name = module.type_name(type_id);
    let rules = backend.layout_rules();
    let mut fragments = Fragments::default();
    match module.get_type(type_id).as_struct() {
        Some(StructKind::SharedStruct) => {
            fragments.header.push_str(&tight_mirror(module, type_id));
            fragments.header.push_str(&aligned_mirror(module, type_id, rules));
            fragments.header.push_str(&format!(
                "void upload(const {name} &data, {name}_aligned &gpu);\n\n"
            ));
            fragments.source.push_str(&upload_function(module, type_id));
        }
        Some(StructKind::UniformBuffer) => {
            fragments.header.push_str(&tight_mirror(module, type_id));
            fragments.header.push_str(&aligned_mirror(module, type_id, rules));
            fragments.header.push_str(&format!(
                "void upload(const {name} &data, {name}_aligned &gpu);\n\
                 void zero({name}_aligned &gpu);\n\n"
            ));
            fragments.source.push_str(&upload_function(module, type_id));
            fragments.source.push_str(&format!(
                "void zero({name}_aligned &gpu)\n{{\n    memset(&gpu, 0, sizeof(gpu));\n}}\n\n"
            ));
        }
        Some(StructKind::VertexInput | StructKind::InstanceInput) => {
            let layout = input_layout(module, type_id, backend.name())?;
            fragments.header.push_str(&format!("struct {name}\n{{\n"));
            for attribute in &layout.attributes {
                fragments.header.push_str(&format!(
                    "    {} {};\n",
                    attribute_host_name(attribute.format, attribute.component_count),
                    attribute.name
                ));
            }
            fragments.header.push_str("};\n");
            fragments.header.push_str(&size_assert(name, layout.stride));
            fragments.header.push('\n');

            let glue = backend.generate_input_glue(&layout)?;
            fragments.api_header = glue.api_header;
            fragments.api_source = glue.api_source;
        }
        _ => {}
    }
    Ok(fragments)
}

fn size_assert(name: &str, size: u32) -> String {
    format!("static_assert(sizeof({name}) == {size}, \"{name} size mismatch\");\n")
}

/// Mirror without any padding, matching the packed size of the struct
fn tight_mirror(module: &Module, type_id: TypeId) -> String {
    let name = module.type_name(type_id);
    let mut output = format!("struct {name}\n{{\n");
    let mut size = 0;
    for member in module.members(type_id) {
        let element = match module.get_type(member.type_id).kind {
            TypeKind::Primitive(primitive) => {
                let layout = PrimitiveLayout::get(primitive, LayoutRules::Std140);
                size += layout.host_size * member.array.element_count();
                layout.host_name
            }
            _ => {
                size += module.get_type(member.type_id).size_packed * member.array.element_count();
                module.type_name(member.type_id).to_string()
            }
        };
        output.push_str(&format!("    {element} {}{};\n", member.name, member.array.suffix()));
    }
    output.push_str("};\n");
    output.push_str(&size_assert(name, size));
    output.push('\n');
    output
}

/// Mirror with explicit padding matching the GPU layout
fn aligned_mirror(module: &Module, type_id: TypeId, rules: LayoutRules) -> String {
    let name = module.type_name(type_id);
    let layout = compute_struct_layout(module, type_id, rules);

    let mut output = format!("struct {name}_aligned\n{{\n");
    let mut offset = 0;
    let mut pad_count = 0;
    let mut pad = |output: &mut String, from: u32, to: u32| {
        if to > from {
            output.push_str(&format!("    u8 _pad{pad_count}[{}];\n", to - from));
            pad_count += 1;
        }
    };

    for (member, placement) in module.members(type_id).iter().zip(&layout.members) {
        pad(&mut output, offset, placement.offset);
        let element = match module.get_type(member.type_id).kind {
            TypeKind::Primitive(primitive) => PrimitiveLayout::get(primitive, rules).aligned_name,
            _ => format!("{}_aligned", module.type_name(member.type_id)),
        };
        let ty = host_array_name(rules, &element, member.array, placement.alignment);
        output.push_str(&format!("    {ty} {};\n", member.name));
        offset = placement.offset + placement.aligned_size;
    }
    pad(&mut output, offset, layout.size_padded);

    output.push_str("};\n");
    output.push_str(&size_assert(&format!("{name}_aligned"), layout.size_padded));
    output.push('\n');
    output
}

/// Function copying a tight mirror into an aligned mirror
fn upload_function(module: &Module, type_id: TypeId) -> String {
    let name = module.type_name(type_id);
    let mut output = format!("void upload(const {name} &data, {name}_aligned &gpu)\n{{\n");
    for member in module.members(type_id) {
        let is_struct = module.get_type(member.type_id).as_struct().is_some();
        let copy = |index: &str| {
            let field = &member.name;
            if is_struct {
                format!("upload(data.{field}{index}, gpu.{field}{index});")
            } else {
                format!("gpu.{field}{index} = data.{field}{index};")
            }
        };
        match member.array {
            ArrayDims::None => output.push_str(&format!("    {}\n", copy(""))),
            ArrayDims::One(n) => {
                output.push_str(&format!("    for (u32 i = 0; i < {n}; i++)\n    {{\n"));
                output.push_str(&format!("        {}\n    }}\n", copy("[i]")));
            }
            ArrayDims::Two(n, m) => {
                output.push_str(&format!("    for (u32 i = 0; i < {n}; i++)\n    {{\n"));
                output.push_str(&format!("        for (u32 j = 0; j < {m}; j++)\n        {{\n"));
                output.push_str(&format!("            {}\n        }}\n    }}\n", copy("[i][j]")));
            }
        }
    }
    output.push_str("}\n\n");
    output
}

/// Generate the host header shared by every shader of a build
pub fn generate_host_header(registries: &Registries) -> String {
    let mut output = String::new();
    output.push_str("#pragma once\n\n#include <gfx/gfx.types.hpp>\n\n");
    output.push_str("template <typename T> struct VertexFormatId;\n");
    output.push_str("template <typename T> struct InstanceFormatId;\n");
    output.push_str("template <typename T> struct UniformBufferId;\n\n");
    output.push_str("constexpr u32 NO_FORMAT = 0xFFFFFFFF;\n\n");

    for (registry, template) in [
        (&registries.shared_structs, None),
        (&registries.uniform_buffers, Some("UniformBufferId")),
        (&registries.vertex_formats, Some("VertexFormatId")),
        (&registries.instance_formats, Some("InstanceFormatId")),
    ] {
        output.push_str(&format!("// {} ({})\n\n", registry.kind(), registry.len()));
        for (id, entry) in registry.entries().iter().enumerate() {
            output.push_str(&entry.fragments.header);
            if let Some(template) = template {
                output.push_str(&format!(
                    "template <> struct {template}<{}> {{ static constexpr u32 value = {id}; }};\n\n",
                    entry.name
                ));
            }
        }
    }

    output.push_str("enum class Shader : u32\n{\n");
    for (i, shader) in registries.shaders.iter().enumerate() {
        output.push_str(&format!("    {} = {i},\n", host_identifier(&shader.name)));
    }
    output.push_str("};\n");
    output.push_str(&format!(
        "constexpr u32 SHADER_COUNT = {};\n\n",
        registries.shaders.len()
    ));

    output.push_str("struct ShaderStageEntry\n{\n    u32 offset;\n    u32 size;\n};\n\n");
    output.push_str("struct UniformBufferBinding\n{\n    u32 buffer;\n    u32 slot;\n};\n\n");
    output.push_str(
        "struct ShaderEntry\n{\n    u32 stage_mask;\n    u32 vertex_format;\n    u32 instance_format;\n    \
         ShaderStageEntry stages[3];\n    const UniformBufferBinding *uniform_buffers[3];\n    \
         u32 uniform_buffer_count[3];\n};\n",
    );
    if !registries.shaders.is_empty() {
        output.push_str("\nextern const ShaderEntry SHADER_ENTRIES[SHADER_COUNT];\n");
    }
    output
}

/// Generate the host source shared by every shader of a build
pub fn generate_host_source(registries: &Registries) -> String {
    let mut output = String::new();
    output.push_str("#include \"gfx.generated.hpp\"\n\n#include <string.h>\n\n");

    for registry in [&registries.shared_structs, &registries.uniform_buffers] {
        for entry in registry.entries() {
            output.push_str(&entry.fragments.source);
        }
    }

    if registries.shaders.is_empty() {
        return output;
    }

    // Binding tables referenced by the entry table
    for shader in &registries.shaders {
        for stage in &shader.stages {
            if stage.uniform_buffers.is_empty() {
                continue;
            }
            let bindings = stage
                .uniform_buffers
                .iter()
                .map(|(buffer, slot)| format!("{{ {buffer}, {slot} }}"))
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "static const UniformBufferBinding {}[] = {{ {bindings} }};\n",
                binding_table_name(shader, stage.stage)
            ));
        }
    }
    output.push('\n');

    output.push_str("const ShaderEntry SHADER_ENTRIES[SHADER_COUNT] =\n{\n");
    for shader in &registries.shaders {
        let format = |id: Option<usize>| match id {
            Some(id) => id.to_string(),
            None => "NO_FORMAT".to_string(),
        };
        let mut stages = Vec::new();
        let mut tables = Vec::new();
        let mut counts = Vec::new();
        for stage in ShaderStage::ALL {
            match shader.stage(stage) {
                Some(entry) => {
                    stages.push(format!("{{ {}, {} }}", entry.offset, entry.size));
                    if entry.uniform_buffers.is_empty() {
                        tables.push("nullptr".to_string());
                    } else {
                        tables.push(binding_table_name(shader, stage));
                    }
                    counts.push(entry.uniform_buffers.len().to_string());
                }
                None => {
                    stages.push("{ 0, 0 }".to_string());
                    tables.push("nullptr".to_string());
                    counts.push("0".to_string());
                }
            }
        }
        output.push_str(&format!("    // {}\n    {{\n", shader.name));
        output.push_str(&format!(
            "        0x{:X}, {}, {},\n",
            shader.stage_mask(),
            format(shader.vertex_format),
            format(shader.instance_format)
        ));
        output.push_str(&format!("        {{ {} }},\n", stages.join(", ")));
        output.push_str(&format!("        {{ {} }},\n", tables.join(", ")));
        output.push_str(&format!("        {{ {} }},\n    }},\n", counts.join(", ")));
    }
    output.push_str("};\n");
    output
}

fn binding_table_name(shader: &ShaderEntry, stage: ShaderStage) -> String {
    format!(
        "{}_{}_uniform_buffers",
        host_identifier(&shader.name),
        stage.name()
    )
}

/// Generate the graphics API header for vertex and instance formats
pub fn generate_api_header(registries: &Registries) -> String {
    let mut output = String::from("#pragma once\n\n#include \"gfx.generated.hpp\"\n\n");
    for registry in [&registries.vertex_formats, &registries.instance_formats] {
        for entry in registry.entries() {
            output.push_str(&entry.fragments.api_header);
        }
    }
    output
}

/// Generate the graphics API source for vertex and instance formats
pub fn generate_api_source(registries: &Registries) -> String {
    let mut output = String::from("#include \"gfx.api.generated.hpp\"\n\n");
    for registry in [&registries.vertex_formats, &registries.instance_formats] {
        for entry in registry.entries() {
            output.push_str(&entry.fragments.api_source);
        }
    }
    output
}
