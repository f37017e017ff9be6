use gfxsl_ast::*;
use gfxsl_generator::*;

/// OpenGL component type enum of an input format
fn gl_type(format: InputFormat) -> &'static str {
    match format {
        InputFormat::Unorm8 | InputFormat::UInt8 => "GL_UNSIGNED_BYTE",
        InputFormat::Snorm8 | InputFormat::SInt8 => "GL_BYTE",
        InputFormat::Unorm16 | InputFormat::UInt16 => "GL_UNSIGNED_SHORT",
        InputFormat::Snorm16 | InputFormat::SInt16 => "GL_SHORT",
        InputFormat::UInt32 => "GL_UNSIGNED_INT",
        InputFormat::SInt32 => "GL_INT",
        InputFormat::Float16 => "GL_HALF_FLOAT",
        InputFormat::Float32 => "GL_FLOAT",
        InputFormat::Float64 => "GL_DOUBLE",
    }
}

/// Build the attribute pointer call for one attribute
fn attribute_pointer(layout: &InputLayout, attribute: &InputAttribute, location: &str) -> GenerateResult<String> {
    let unsupported = || {
        GenerateError::unsupported(
            "GLSL",
            format!(
                "{} attribute `{}.{}` read as {}",
                attribute.format.name(),
                layout.name,
                attribute.name,
                attribute.scalar.name()
            ),
        )
    };

    let count = attribute.component_count;
    let ty = gl_type(attribute.format);
    let stride = layout.stride;
    let offset = format!("reinterpret_cast<const void *>({})", attribute.offset);
    match attribute.scalar {
        ScalarType::Float if !attribute.format.is_double() => {
            let normalized = if attribute.format.is_normalized() {
                "GL_TRUE"
            } else {
                "GL_FALSE"
            };
            Ok(format!(
                "glVertexAttribPointer({location}, {count}, {ty}, {normalized}, {stride}, {offset});"
            ))
        }
        ScalarType::Int | ScalarType::UInt if attribute.format.is_integer() => Ok(format!(
            "glVertexAttribIPointer({location}, {count}, {ty}, {stride}, {offset});"
        )),
        ScalarType::Double if attribute.format.is_double() => Ok(format!(
            "glVertexAttribLPointer({location}, {count}, {ty}, {stride}, {offset});"
        )),
        _ => Err(unsupported()),
    }
}

/// Build the OpenGL functions which bind attribute locations and describe a vertex or instance format
pub(crate) fn generate_opengl_glue(layout: &InputLayout) -> GenerateResult<Fragments> {
    let name = &layout.name;
    let instanced = layout.kind == StructKind::InstanceInput;
    let location = |i: usize| {
        if instanced {
            format!("base_location + {i}")
        } else {
            i.to_string()
        }
    };

    let (bind_signature, format_signature) = if instanced {
        (
            format!("void opengl_bind_attributes_{name}(GLuint program, GLuint base_location)"),
            format!("void opengl_instance_format_{name}(GLuint base_location)"),
        )
    } else {
        (
            format!("void opengl_bind_attributes_{name}(GLuint program)"),
            format!("void opengl_vertex_format_{name}()"),
        )
    };

    let mut fragments = Fragments {
        api_header: format!("{bind_signature};\n{format_signature};\n\n"),
        ..Default::default()
    };

    let source = &mut fragments.api_source;
    source.push_str(&format!("{bind_signature}\n{{\n"));
    for (i, attribute) in layout.attributes.iter().enumerate() {
        source.push_str(&format!(
            "    glBindAttribLocation(program, {}, \"{name}_{}\");\n",
            location(i),
            attribute.name
        ));
    }
    source.push_str("}\n\n");

    source.push_str(&format!("{format_signature}\n{{\n"));
    for (i, attribute) in layout.attributes.iter().enumerate() {
        let location = location(i);
        source.push_str(&format!("    glEnableVertexAttribArray({location});\n"));
        source.push_str(&format!("    {}\n", attribute_pointer(layout, attribute, &location)?));
        if instanced {
            source.push_str(&format!("    glVertexAttribDivisor({location}, 1);\n"));
        }
    }
    source.push_str("}\n\n");

    log::trace!("generated OpenGL glue for `{name}`");
    Ok(fragments)
}
