use crate::StructKind;

/// Id to a type in the [crate::Module] type table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct TypeId(pub u32);

/// The element type of a primitive
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ScalarType {
    Bool,
    Int,
    UInt,
    Float,
    Double,
}

/// The shape of a primitive
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum Dimension {
    Scalar,
    Vector(u32),
    Matrix(u32),
}

/// A built in numeric type
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct PrimitiveType {
    pub scalar: ScalarType,
    pub dimension: Dimension,
}

/// Kinds of texture resource
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
}

/// What a type table entry describes
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum TypeKind {
    Void,
    Primitive(PrimitiveType),
    Struct(StructKind),
    Texture(TextureKind),
}

/// A type table entry
#[derive(PartialEq, Debug, Clone)]
pub struct Type {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,

    /// First member in the variable table
    pub member_first: u32,

    /// Number of members
    pub member_count: u32,

    /// Size of the type without any padding between members
    pub size_packed: u32,

    /// Size of the type with std140 member padding
    pub size_padded: u32,

    pub alignment: u32,

    /// Members are referenced in the global namespace of the target language
    pub global_namespace: bool,

    /// Type carries a pipeline managed member (POSITION or DEPTH)
    pub pipeline_intermediate: bool,
}

impl ScalarType {
    /// All scalar types in type table order
    pub const ALL: [ScalarType; 5] = [
        ScalarType::Bool,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Double,
    ];

    /// Source language name of the scalar
    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Size of a single element in bytes on the GPU
    pub const fn size(self) -> u32 {
        match self {
            ScalarType::Double => 8,
            _ => 4,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::UInt)
    }

    pub const fn is_floating_point(self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }

    /// Numeric rank used for implicit promotion
    pub const fn rank(self) -> u32 {
        match self {
            ScalarType::Bool => 0,
            ScalarType::Int => 1,
            ScalarType::UInt => 2,
            ScalarType::Float => 3,
            ScalarType::Double => 4,
        }
    }
}

impl Dimension {
    /// Number of scalar components
    pub const fn component_count(self) -> u32 {
        match self {
            Dimension::Scalar => 1,
            Dimension::Vector(n) => n,
            Dimension::Matrix(n) => n * n,
        }
    }
}

impl PrimitiveType {
    pub const fn new(scalar: ScalarType, dimension: Dimension) -> Self {
        PrimitiveType { scalar, dimension }
    }

    pub const fn scalar(scalar: ScalarType) -> Self {
        PrimitiveType::new(scalar, Dimension::Scalar)
    }

    pub const fn vector(scalar: ScalarType, n: u32) -> Self {
        PrimitiveType::new(scalar, Dimension::Vector(n))
    }

    pub const fn matrix(scalar: ScalarType, n: u32) -> Self {
        PrimitiveType::new(scalar, Dimension::Matrix(n))
    }

    /// Every primitive the language can name, in type table order
    pub fn all() -> Vec<PrimitiveType> {
        let mut primitives = Vec::new();
        for scalar in ScalarType::ALL {
            primitives.push(PrimitiveType::scalar(scalar));
            for n in 2..=4 {
                primitives.push(PrimitiveType::vector(scalar, n));
            }
            if scalar != ScalarType::Double {
                for n in 2..=4 {
                    primitives.push(PrimitiveType::matrix(scalar, n));
                }
            }
        }
        primitives
    }

    /// Source language name of the primitive, `float3` or `float4x4`
    pub fn name(&self) -> String {
        let scalar = self.scalar.name();
        match self.dimension {
            Dimension::Scalar => scalar.to_string(),
            Dimension::Vector(n) => format!("{scalar}{n}"),
            Dimension::Matrix(n) => format!("{scalar}{n}x{n}"),
        }
    }

    /// Parse a source language primitive name
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        let scalar = ScalarType::ALL
            .into_iter()
            .find(|s| name.starts_with(s.name()))?;
        let rest = &name[scalar.name().len()..];
        let dimension = match rest.as_bytes() {
            [] => Dimension::Scalar,
            [n @ b'2'..=b'4'] => Dimension::Vector((n - b'0') as u32),
            [n @ b'2'..=b'4', b'x', m] if n == m && scalar != ScalarType::Double => {
                Dimension::Matrix((n - b'0') as u32)
            }
            _ => return None,
        };
        Some(PrimitiveType::new(scalar, dimension))
    }

    /// The type of a single row (matrix) or component (vector) when subscripted
    pub fn element(&self) -> Option<PrimitiveType> {
        match self.dimension {
            Dimension::Scalar => None,
            Dimension::Vector(_) => Some(PrimitiveType::scalar(self.scalar)),
            Dimension::Matrix(n) => Some(PrimitiveType::vector(self.scalar, n)),
        }
    }

    /// The same shape with a different element type
    pub fn with_scalar(&self, scalar: ScalarType) -> PrimitiveType {
        PrimitiveType::new(scalar, self.dimension)
    }
}

impl TextureKind {
    /// Source language keyword for the texture kind
    pub const fn name(self) -> &'static str {
        match self {
            TextureKind::Texture1D => "texture1D",
            TextureKind::Texture2D => "texture2D",
            TextureKind::Texture2DArray => "texture2DArray",
            TextureKind::Texture3D => "texture3D",
            TextureKind::TextureCube => "textureCube",
            TextureKind::TextureCubeArray => "textureCubeArray",
        }
    }

    pub fn from_name(name: &str) -> Option<TextureKind> {
        [
            TextureKind::Texture1D,
            TextureKind::Texture2D,
            TextureKind::Texture2DArray,
            TextureKind::Texture3D,
            TextureKind::TextureCube,
            TextureKind::TextureCubeArray,
        ]
        .into_iter()
        .find(|kind| kind.name() == name)
    }

    /// Number of components in a coordinate used to sample the texture
    pub const fn coordinate_count(self) -> u32 {
        match self {
            TextureKind::Texture1D => 1,
            TextureKind::Texture2D => 2,
            TextureKind::Texture2DArray => 3,
            TextureKind::Texture3D => 3,
            TextureKind::TextureCube => 3,
            TextureKind::TextureCubeArray => 4,
        }
    }

    /// If the texture is an array texture
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            TextureKind::Texture2DArray | TextureKind::TextureCubeArray
        )
    }

    /// If texture coordinates address a V axis that follows the image origin convention
    pub const fn has_flippable_v(self) -> bool {
        matches!(
            self,
            TextureKind::Texture2D | TextureKind::Texture2DArray | TextureKind::Texture3D
        )
    }
}

impl Type {
    /// Get the primitive if the type is a primitive
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Get the struct kind if the type is a struct
    pub fn as_struct(&self) -> Option<StructKind> {
        match self.kind {
            TypeKind::Struct(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }
}

#[test]
fn test_primitive_names() {
    for primitive in PrimitiveType::all() {
        assert_eq!(PrimitiveType::from_name(&primitive.name()), Some(primitive));
    }
    assert_eq!(PrimitiveType::from_name("double4x4"), None);
    assert_eq!(PrimitiveType::from_name("float3x4"), None);
    assert_eq!(PrimitiveType::from_name("float5"), None);
    assert_eq!(PrimitiveType::from_name("floaty"), None);
}
