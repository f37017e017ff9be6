use gfxsl_ast::*;
use gfxsl_generator::*;

/// Buffer index vertex data is bound to
pub const VERTEX_BUFFER_INDEX: u32 = 30;

/// Buffer index instance data is bound to
pub const INSTANCE_BUFFER_INDEX: u32 = 29;

/// `MTLVertexFormat` name of an attribute
fn vertex_format(layout: &InputLayout, attribute: &InputAttribute) -> GenerateResult<String> {
    let unsupported = || {
        GenerateError::unsupported(
            "Metal",
            format!(
                "{} attribute `{}.{}` read as {}",
                attribute.format.name(),
                layout.name,
                attribute.name,
                attribute.scalar.name()
            ),
        )
    };

    let valid = match attribute.scalar {
        ScalarType::Float => !attribute.format.is_integer() && !attribute.format.is_double(),
        ScalarType::Int | ScalarType::UInt => attribute.format.is_integer(),
        ScalarType::Bool | ScalarType::Double => false,
    };
    if !valid {
        return Err(unsupported());
    }

    let (base, suffix) = match attribute.format {
        InputFormat::Unorm8 => ("UChar", "Normalized"),
        InputFormat::Snorm8 => ("Char", "Normalized"),
        InputFormat::UInt8 => ("UChar", ""),
        InputFormat::SInt8 => ("Char", ""),
        InputFormat::Unorm16 => ("UShort", "Normalized"),
        InputFormat::Snorm16 => ("Short", "Normalized"),
        InputFormat::UInt16 => ("UShort", ""),
        InputFormat::SInt16 => ("Short", ""),
        InputFormat::UInt32 => ("UInt", ""),
        InputFormat::SInt32 => ("Int", ""),
        InputFormat::Float16 => ("Half", ""),
        InputFormat::Float32 => ("Float", ""),
        InputFormat::Float64 => return Err(unsupported()),
    };
    let count = match attribute.component_count {
        1 => String::new(),
        n => n.to_string(),
    };
    Ok(format!("MTLVertexFormat{base}{count}{suffix}"))
}

/// Build the functions which fill a `MTLVertexDescriptor` for a vertex or instance format
pub(crate) fn generate_metal_glue(layout: &InputLayout) -> GenerateResult<Fragments> {
    let name = &layout.name;
    let instanced = layout.kind == StructKind::InstanceInput;
    let (signature, buffer, step) = if instanced {
        (
            format!("void metal_instance_format_{name}(MTLVertexDescriptor *descriptor, u32 base_attribute)"),
            INSTANCE_BUFFER_INDEX,
            "MTLVertexStepFunctionPerInstance",
        )
    } else {
        (
            format!("void metal_vertex_format_{name}(MTLVertexDescriptor *descriptor)"),
            VERTEX_BUFFER_INDEX,
            "MTLVertexStepFunctionPerVertex",
        )
    };

    let mut source = format!("{signature}\n{{\n");
    for (i, attribute) in layout.attributes.iter().enumerate() {
        let index = if instanced {
            format!("base_attribute + {i}")
        } else {
            i.to_string()
        };
        let format = vertex_format(layout, attribute)?;
        source.push_str(&format!("    descriptor.attributes[{index}].format = {format};\n"));
        source.push_str(&format!(
            "    descriptor.attributes[{index}].offset = {};\n",
            attribute.offset
        ));
        source.push_str(&format!("    descriptor.attributes[{index}].bufferIndex = {buffer};\n"));
    }
    source.push_str(&format!("    descriptor.layouts[{buffer}].stride = {};\n", layout.stride));
    source.push_str(&format!("    descriptor.layouts[{buffer}].stepFunction = {step};\n"));
    if instanced {
        source.push_str(&format!("    descriptor.layouts[{buffer}].stepRate = 1;\n"));
    }
    source.push_str("}\n\n");

    log::trace!("generated Metal vertex descriptor glue for `{name}`");
    Ok(Fragments {
        api_header: format!("{signature};\n\n"),
        api_source: source,
        ..Default::default()
    })
}
