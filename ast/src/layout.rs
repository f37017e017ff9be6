use crate::*;

/// Memory layout convention for buffer contents
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum LayoutRules {
    /// Constant buffer packing used by GLSL uniform blocks and HLSL cbuffers
    Std140,

    /// Natural alignment with Metal vector sizes
    Metal,
}

/// Size and naming information for a primitive
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PrimitiveLayout {
    /// Host type in tight mirrors
    pub host_name: String,

    /// Size of the host type in tight mirrors
    pub host_size: u32,

    /// Host type in aligned mirrors
    pub aligned_name: String,

    /// Size of the host type in aligned mirrors
    pub aligned_size: u32,

    /// Size on the GPU
    pub size: u32,

    /// Alignment on the GPU
    pub alignment: u32,
}

/// Placement of a single struct member
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct MemberLayout {
    /// Byte offset from the start of the struct on the GPU
    pub offset: u32,

    /// Size on the GPU including array padding
    pub size: u32,

    pub alignment: u32,

    /// Distance between array elements, zero when the member is not an array
    pub array_stride: u32,

    /// Size of the member in the tight host mirror
    pub host_size: u32,

    /// Size of the member in the aligned host mirror
    pub aligned_size: u32,
}

/// Placement of every member of a struct
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct StructLayout {
    pub members: Vec<MemberLayout>,

    /// Size without any padding
    pub size_packed: u32,

    /// Size with member padding and trailing padding
    pub size_padded: u32,

    pub alignment: u32,
}

/// Size of a single element of a member type before array rules are applied
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
struct ElementLayout {
    size: u32,
    alignment: u32,
    host_size: u32,
    aligned_size: u32,
}

/// Round a value up to a multiple of the alignment
pub const fn round_up(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

/// Calculate the padding needed before a member at the current offset
///
/// The member is moved to its alignment boundary. With std140 rules a member must also not
/// straddle a 16 byte block: small members that would cross a block start at the next block, and
/// members larger than a block always start on a block boundary.
pub fn append_structure_padding(offset: u32, size: u32, alignment: u32, rules: LayoutRules) -> u32 {
    let mut padding = round_up(offset, alignment) - offset;
    if rules == LayoutRules::Std140 {
        let start = offset + padding;
        if size <= 16 {
            if size > 0 && start / 16 != (start + size - 1) / 16 {
                padding += 16 - start % 16;
            }
        } else if start % 16 != 0 {
            padding += 16 - start % 16;
        }
    }
    padding
}

impl PrimitiveLayout {
    /// Get the layout of a primitive under a set of rules
    pub fn get(primitive: PrimitiveType, rules: LayoutRules) -> PrimitiveLayout {
        let scalar_size = primitive.scalar.size();
        let base = host_scalar_prefix(primitive.scalar);
        match primitive.dimension {
            Dimension::Scalar => {
                let name = host_scalar_name(primitive.scalar).to_string();
                PrimitiveLayout {
                    host_name: name.clone(),
                    host_size: scalar_size,
                    aligned_name: name,
                    aligned_size: scalar_size,
                    size: scalar_size,
                    alignment: scalar_size,
                }
            }
            Dimension::Vector(n) => {
                let name = format!("{base}_v{n}");
                let host_size = scalar_size * n;
                let (size, alignment) = match (rules, n) {
                    (_, 2) => (host_size, scalar_size * 2),
                    (LayoutRules::Std140, 3) => (host_size, scalar_size * 4),
                    (_, _) => (scalar_size * 4, scalar_size * 4),
                };
                PrimitiveLayout {
                    host_name: name.clone(),
                    host_size,
                    aligned_name: name,
                    aligned_size: host_size,
                    size,
                    alignment,
                }
            }
            Dimension::Matrix(n) => {
                let name = format!("{base}_m{n}{n}");
                let host_size = scalar_size * n * n;
                let column = PrimitiveLayout::get(PrimitiveType::vector(primitive.scalar, n), rules);
                let (column_stride, alignment) = match rules {
                    LayoutRules::Std140 => (round_up(column.size, 16), 16),
                    LayoutRules::Metal => (column.size, column.alignment),
                };
                let size = column_stride * n;
                let aligned_name = if size == host_size {
                    name.clone()
                } else {
                    match rules {
                        LayoutRules::Std140 => format!("std140_{name}"),
                        LayoutRules::Metal => format!("metal_{name}"),
                    }
                };
                PrimitiveLayout {
                    host_name: name,
                    host_size,
                    aligned_name,
                    aligned_size: size,
                    size,
                    alignment,
                }
            }
        }
    }
}

/// Host type name of a scalar
pub const fn host_scalar_name(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "bool32",
        ScalarType::Int => "i32",
        ScalarType::UInt => "u32",
        ScalarType::Float => "float",
        ScalarType::Double => "double",
    }
}

/// Prefix used for host vector and matrix type names
const fn host_scalar_prefix(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "bool",
        ScalarType::Int => "int",
        ScalarType::UInt => "uint",
        ScalarType::Float => "float",
        ScalarType::Double => "double",
    }
}

/// Host type of a vertex attribute stored with a format
pub fn attribute_host_name(format: InputFormat, component_count: u32) -> String {
    let scalar = match format {
        InputFormat::Unorm8 | InputFormat::UInt8 => "u8",
        InputFormat::Snorm8 | InputFormat::SInt8 => "i8",
        InputFormat::Unorm16 | InputFormat::UInt16 => "u16",
        InputFormat::Snorm16 | InputFormat::SInt16 => "i16",
        InputFormat::UInt32 => "u32",
        InputFormat::SInt32 => "i32",
        InputFormat::Float16 => "half",
        InputFormat::Float32 => "float",
        InputFormat::Float64 => "double",
    };
    if component_count == 1 {
        scalar.to_string()
    } else {
        format!("{scalar}_v{component_count}")
    }
}

/// Size in bytes of a vertex attribute stored with a format
pub const fn attribute_size(format: InputFormat, component_count: u32) -> u32 {
    format.component_size() * component_count
}

/// Host type for an array member
///
/// Tight mirrors use plain arrays so this is only used for aligned mirrors.
pub fn host_array_name(rules: LayoutRules, element: &str, array: ArrayDims, alignment: u32) -> String {
    match (rules, array) {
        (_, ArrayDims::None) => element.to_string(),
        (LayoutRules::Std140, ArrayDims::One(n)) => format!("std140_array_1d<{element}, {n}>"),
        (LayoutRules::Std140, ArrayDims::Two(n, m)) => {
            format!("std140_array_2d<{element}, {n}, {m}>")
        }
        (LayoutRules::Metal, ArrayDims::One(n)) => {
            format!("metal_array_1d<{element}, {n}, {alignment}>")
        }
        (LayoutRules::Metal, ArrayDims::Two(n, m)) => {
            format!("metal_array_2d<{element}, {n}, {m}, {alignment}>")
        }
    }
}

fn element_layout(module: &Module, type_id: TypeId, rules: LayoutRules) -> ElementLayout {
    let ty = module.get_type(type_id);
    match ty.kind {
        TypeKind::Primitive(primitive) => {
            let layout = PrimitiveLayout::get(primitive, rules);
            ElementLayout {
                size: layout.size,
                alignment: layout.alignment,
                host_size: layout.host_size,
                aligned_size: layout.aligned_size,
            }
        }
        TypeKind::Struct(_) => {
            let layout = compute_struct_layout(module, type_id, rules);
            let (size, alignment) = match rules {
                LayoutRules::Std140 => (round_up(layout.size_padded, 16), 16),
                LayoutRules::Metal => (layout.size_padded, layout.alignment),
            };
            ElementLayout {
                size,
                alignment,
                host_size: layout.size_packed,
                aligned_size: size,
            }
        }
        TypeKind::Void | TypeKind::Texture(_) => ElementLayout {
            size: 0,
            alignment: 1,
            host_size: 0,
            aligned_size: 0,
        },
    }
}

/// Calculate the size, alignment and array stride of a member
pub fn member_layout(module: &Module, member: &Variable, rules: LayoutRules) -> MemberLayout {
    let element = element_layout(module, member.type_id, rules);
    if !member.array.is_array() {
        return MemberLayout {
            offset: 0,
            size: element.size,
            alignment: element.alignment,
            array_stride: 0,
            host_size: element.host_size,
            aligned_size: element.aligned_size,
        };
    }

    let count = member.array.element_count();
    let (stride, alignment) = match rules {
        LayoutRules::Std140 => (round_up(element.size, 16), element.alignment.max(16)),
        LayoutRules::Metal => (round_up(element.size, element.alignment), element.alignment),
    };
    MemberLayout {
        offset: 0,
        size: stride * count,
        alignment,
        array_stride: stride,
        host_size: element.host_size * count,
        aligned_size: stride * count,
    }
}

/// Calculate the placement of every member of a struct type
pub fn compute_struct_layout(module: &Module, type_id: TypeId, rules: LayoutRules) -> StructLayout {
    let mut members = Vec::new();
    let mut offset = 0;
    let mut size_packed = 0;
    let mut alignment = match rules {
        LayoutRules::Std140 => 16,
        LayoutRules::Metal => 1,
    };

    for member in module.members(type_id) {
        let mut layout = member_layout(module, member, rules);
        offset += append_structure_padding(offset, layout.size, layout.alignment, rules);
        layout.offset = offset;
        offset += layout.size;
        size_packed += layout.host_size;
        alignment = alignment.max(layout.alignment);
        members.push(layout);
    }

    if let Some(explicit) = module.struct_for_type(type_id).and_then(|sd| sd.alignment) {
        alignment = alignment.max(explicit);
    }

    StructLayout {
        members,
        size_packed,
        size_padded: round_up(offset, alignment),
        alignment,
    }
}

#[cfg(test)]
fn make_struct(module: &mut Module, name: &str, members: &[(&str, ArrayDims)]) -> TypeId {
    let type_id = module.add_type(Type {
        id: TypeId(0),
        name: name.to_string(),
        kind: TypeKind::Struct(StructKind::SharedStruct),
        member_first: module.variables.len() as u32,
        member_count: members.len() as u32,
        size_packed: 0,
        size_padded: 0,
        alignment: 0,
        global_namespace: false,
        pipeline_intermediate: false,
    });
    for (member_type, array) in members {
        let member_type_id = module.find_type(member_type).unwrap();
        module.add_variable(Variable {
            id: VariableId(0),
            name: format!("m{}", module.variables.len()),
            type_id: member_type_id,
            kind: VariableKind::Member(type_id),
            qualifiers: Qualifiers::default(),
            array: *array,
            semantic: None,
            format: None,
            slot: None,
            texture_kind: None,
            location: gfxsl_text::SourceLocation::UNKNOWN,
        });
    }
    type_id
}

#[test]
fn test_structure_padding() {
    let std140 = LayoutRules::Std140;

    // Alignment only
    assert_eq!(append_structure_padding(4, 4, 4, std140), 0);
    assert_eq!(append_structure_padding(4, 8, 8, std140), 4);

    // A float2 at 12 is aligned to 8 first, landing at 16
    assert_eq!(append_structure_padding(12, 8, 8, std140), 4);

    // A float3 after a float starts on the next block
    assert_eq!(append_structure_padding(4, 12, 16, std140), 12);

    // A float after a float3 fits in the same block
    assert_eq!(append_structure_padding(12, 4, 4, std140), 0);

    // Large members start on a block boundary
    assert_eq!(append_structure_padding(4, 64, 4, std140), 12);

    // Metal only cares about alignment
    assert_eq!(append_structure_padding(4, 64, 4, LayoutRules::Metal), 0);
    assert_eq!(append_structure_padding(4, 16, 16, LayoutRules::Metal), 12);
}

#[test]
fn test_struct_layout_std140() {
    let mut module = Module::new("test");
    let ty = make_struct(
        &mut module,
        "Test",
        &[
            ("float3", ArrayDims::None),
            ("float", ArrayDims::None),
            ("float4", ArrayDims::None),
        ],
    );
    let layout = compute_struct_layout(&module, ty, LayoutRules::Std140);
    let offsets = layout.members.iter().map(|m| m.offset).collect::<Vec<_>>();
    assert_eq!(offsets, [0, 12, 16]);
    assert_eq!(layout.size_padded, 32);
    assert_eq!(layout.size_padded % 16, 0);
    assert_eq!(layout.size_packed, 32);
}

#[test]
fn test_struct_layout_trailing_padding() {
    let mut module = Module::new("test");
    let ty = make_struct(
        &mut module,
        "Test",
        &[("float", ArrayDims::None), ("float3", ArrayDims::None), ("float", ArrayDims::None)],
    );
    let layout = compute_struct_layout(&module, ty, LayoutRules::Std140);
    let offsets = layout.members.iter().map(|m| m.offset).collect::<Vec<_>>();
    assert_eq!(offsets, [0, 16, 28]);
    assert_eq!(layout.size_packed, 20);
    assert_eq!(layout.size_padded, 32);
}

#[test]
fn test_array_stride() {
    let mut module = Module::new("test");
    let ty = make_struct(&mut module, "Test", &[("float3", ArrayDims::One(4))]);
    let layout = compute_struct_layout(&module, ty, LayoutRules::Std140);
    assert_eq!(layout.members[0].array_stride, 16);
    assert_eq!(layout.members[0].size, 64);
    assert_eq!(layout.members[0].host_size, 48);
    assert_eq!(layout.size_padded, 64);

    let ty = make_struct(&mut module, "Test2", &[("float", ArrayDims::Two(2, 3))]);
    let layout = compute_struct_layout(&module, ty, LayoutRules::Std140);
    assert_eq!(layout.members[0].array_stride, 16);
    assert_eq!(layout.members[0].size, 96);

    let layout = compute_struct_layout(&module, ty, LayoutRules::Metal);
    assert_eq!(layout.members[0].array_stride, 4);
    assert_eq!(layout.members[0].size, 24);
}

#[test]
fn test_struct_layout_metal() {
    let mut module = Module::new("test");
    let ty = make_struct(
        &mut module,
        "Test",
        &[
            ("float3", ArrayDims::None),
            ("float", ArrayDims::None),
            ("float2", ArrayDims::None),
        ],
    );
    let layout = compute_struct_layout(&module, ty, LayoutRules::Metal);
    let offsets = layout.members.iter().map(|m| m.offset).collect::<Vec<_>>();
    assert_eq!(offsets, [0, 16, 24]);
    assert_eq!(layout.alignment, 16);
    assert_eq!(layout.size_padded, 32);
}

#[test]
fn test_nested_struct_layout() {
    let mut module = Module::new("test");
    let inner = make_struct(&mut module, "Inner", &[("float", ArrayDims::None)]);
    let ty = make_struct(
        &mut module,
        "Outer",
        &[("float", ArrayDims::None), ("Inner", ArrayDims::None)],
    );
    assert_eq!(compute_struct_layout(&module, inner, LayoutRules::Std140).size_padded, 16);
    let layout = compute_struct_layout(&module, ty, LayoutRules::Std140);
    assert_eq!(layout.members[1].offset, 16);
    assert_eq!(layout.members[1].size, 16);
    assert_eq!(layout.size_padded, 32);
    assert_eq!(layout.size_packed, 8);
}

#[test]
fn test_primitive_layouts() {
    let float3 = PrimitiveType::vector(ScalarType::Float, 3);
    let layout = PrimitiveLayout::get(float3, LayoutRules::Std140);
    assert_eq!(layout.host_name, "float_v3");
    assert_eq!((layout.size, layout.alignment), (12, 16));

    let layout = PrimitiveLayout::get(float3, LayoutRules::Metal);
    assert_eq!((layout.size, layout.alignment, layout.host_size), (16, 16, 12));

    let float3x3 = PrimitiveType::matrix(ScalarType::Float, 3);
    let layout = PrimitiveLayout::get(float3x3, LayoutRules::Std140);
    assert_eq!(layout.host_name, "float_m33");
    assert_eq!(layout.aligned_name, "std140_float_m33");
    assert_eq!((layout.size, layout.host_size), (48, 36));

    let float4x4 = PrimitiveType::matrix(ScalarType::Float, 4);
    let layout = PrimitiveLayout::get(float4x4, LayoutRules::Metal);
    assert_eq!(layout.aligned_name, "float_m44");
    assert_eq!(layout.size, 64);

    let uint = PrimitiveType::scalar(ScalarType::UInt);
    assert_eq!(PrimitiveLayout::get(uint, LayoutRules::Std140).host_name, "u32");
}
