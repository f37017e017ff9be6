use gfxsl_ast::*;
use gfxsl_generator::*;

/// Input assembler slot vertex data is bound to
pub const VERTEX_INPUT_SLOT: u32 = 0;

/// Input assembler slot instance data is bound to
pub const INSTANCE_INPUT_SLOT: u32 = 1;

/// `DXGI_FORMAT` name of an attribute
fn dxgi_format(layout: &InputLayout, attribute: &InputAttribute) -> GenerateResult<String> {
    let unsupported = |reason: String| {
        GenerateError::unsupported(
            "HLSL",
            format!(
                "{} attribute `{}.{}` {reason}",
                attribute.format.name(),
                layout.name,
                attribute.name
            ),
        )
    };

    let valid = match attribute.scalar {
        ScalarType::Float => !attribute.format.is_integer() && !attribute.format.is_double(),
        ScalarType::Int | ScalarType::UInt => attribute.format.is_integer(),
        ScalarType::Bool | ScalarType::Double => false,
    };
    if !valid {
        return Err(unsupported(format!("read as {}", attribute.scalar.name())));
    }

    let suffix = match attribute.format {
        InputFormat::Unorm8 | InputFormat::Unorm16 => "UNORM",
        InputFormat::Snorm8 | InputFormat::Snorm16 => "SNORM",
        InputFormat::UInt8 | InputFormat::UInt16 | InputFormat::UInt32 => "UINT",
        InputFormat::SInt8 | InputFormat::SInt16 | InputFormat::SInt32 => "SINT",
        InputFormat::Float16 | InputFormat::Float32 => "FLOAT",
        InputFormat::Float64 => return Err(unsupported("has no DXGI format".to_string())),
    };
    let bits = attribute.format.component_size() * 8;

    // DXGI only has three component formats with 32 bit channels
    if attribute.component_count == 3 && bits < 32 {
        return Err(unsupported("has no three component DXGI format".to_string()));
    }

    let channels = ["R", "G", "B", "A"]
        .iter()
        .take(attribute.component_count as usize)
        .map(|channel| format!("{channel}{bits}"))
        .collect::<String>();
    Ok(format!("DXGI_FORMAT_{channels}_{suffix}"))
}

/// Build the `D3D11_INPUT_ELEMENT_DESC` table for a vertex or instance format
pub(crate) fn generate_d3d11_glue(layout: &InputLayout) -> GenerateResult<Fragments> {
    let instanced = layout.kind == StructKind::InstanceInput;
    let (table, slot, classification, step_rate, prefix) = if instanced {
        (
            format!("d3d11_instance_format_{}", layout.name),
            INSTANCE_INPUT_SLOT,
            "D3D11_INPUT_PER_INSTANCE_DATA",
            1,
            "INSTANCE_",
        )
    } else {
        (
            format!("d3d11_vertex_format_{}", layout.name),
            VERTEX_INPUT_SLOT,
            "D3D11_INPUT_PER_VERTEX_DATA",
            0,
            "",
        )
    };
    let declaration = format!(
        "const D3D11_INPUT_ELEMENT_DESC {table}[{}]",
        layout.attributes.len()
    );

    let mut source = format!("{declaration} =\n{{\n");
    for attribute in &layout.attributes {
        let format = dxgi_format(layout, attribute)?;
        source.push_str(&format!(
            "    {{ \"{prefix}{}\", {}, {format}, {slot}, {}, {classification}, {step_rate} }},\n",
            attribute.semantic.name(),
            attribute.semantic_index,
            attribute.offset
        ));
    }
    source.push_str("};\n\n");

    log::trace!("generated D3D11 input layout `{table}`");
    Ok(Fragments {
        api_header: format!("extern {declaration};\n\n"),
        api_source: source,
        ..Default::default()
    })
}
