use crate::{NodeId, TextureKind, TypeId};
use gfxsl_text::SourceLocation;

/// Id to a variable in the [crate::Module] variable table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct VariableId(pub u32);

/// Id to a function in the [crate::Module] function table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct FunctionId(pub u32);

/// Id to a struct in the [crate::Module] struct table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct StructId(pub u32);

/// Id to a texture in the [crate::Module] texture table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct TextureId(pub u32);

/// The declaration keyword of a struct
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum StructKind {
    Struct,
    SharedStruct,
    UniformBuffer,
    ConstantBuffer,
    MutableBuffer,
    InstanceInput,
    VertexInput,
    VertexOutput,
    FragmentInput,
    FragmentOutput,
}

/// Member and system value semantics
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    Color,
    TexCoord,
    Depth,
    Vertex,
    Instance,
    Primitive,
    Sample,
    FrontFacing,
    DispatchThread,
    GroupThread,
    Group,
}

/// Memory format of a vertex or instance attribute
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum InputFormat {
    Unorm8,
    Unorm16,
    Snorm8,
    Snorm16,
    UInt8,
    UInt16,
    UInt32,
    SInt8,
    SInt16,
    SInt32,
    Float16,
    Float32,
    Float64,
}

/// Shader stage
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// Array dimensions of a variable
#[derive(PartialEq, Eq, Hash, Debug, Default, Clone, Copy)]
pub enum ArrayDims {
    #[default]
    None,
    One(u32),
    Two(u32, u32),
}

/// Parameter and variable qualifiers
#[derive(PartialEq, Eq, Hash, Debug, Default, Clone, Copy)]
pub struct Qualifiers {
    pub is_in: bool,
    pub is_out: bool,
    pub is_const: bool,
}

/// Where a variable was declared
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum VariableKind {
    /// Member of a struct type
    Member(TypeId),

    /// Parameter of a function
    Parameter(FunctionId),

    /// Local variable inside a function body
    Local,

    /// Constant declared at file scope
    Global,

    /// Value supplied by the pipeline
    SystemValue,
}

/// A variable table entry
#[derive(PartialEq, Debug, Clone)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub type_id: TypeId,
    pub kind: VariableKind,
    pub qualifiers: Qualifiers,
    pub array: ArrayDims,
    pub semantic: Option<Semantic>,
    pub format: Option<InputFormat>,
    pub slot: Option<u32>,
    pub texture_kind: Option<TextureKind>,
    pub location: SourceLocation,
}

/// Entry point role of a function
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum FunctionKind {
    Ordinary,
    MainVertex,
    MainFragment,
    MainCompute,
}

/// A function table entry
#[derive(PartialEq, Debug, Clone)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub return_type: TypeId,

    /// First parameter in the variable table
    pub param_first: u32,

    /// Number of parameters
    pub param_count: u32,

    pub kind: FunctionKind,

    /// Root block of the function
    pub body: Option<NodeId>,

    /// Compute thread group size
    pub threads: [u32; 3],

    pub location: SourceLocation,
}

/// A struct table entry
#[derive(PartialEq, Debug, Clone)]
pub struct Struct {
    pub id: StructId,
    pub type_id: TypeId,
    pub kind: StructKind,

    /// Binding slot for buffers
    pub slot: Option<u32>,

    /// Explicit alignment override
    pub alignment: Option<u32>,

    pub location: SourceLocation,
}

/// A texture table entry
#[derive(PartialEq, Debug, Clone)]
pub struct Texture {
    pub id: TextureId,
    pub name: String,
    pub kind: TextureKind,
    pub slot: u32,
    pub location: SourceLocation,
}

impl StructKind {
    pub const ALL: [StructKind; 10] = [
        StructKind::Struct,
        StructKind::SharedStruct,
        StructKind::UniformBuffer,
        StructKind::ConstantBuffer,
        StructKind::MutableBuffer,
        StructKind::InstanceInput,
        StructKind::VertexInput,
        StructKind::VertexOutput,
        StructKind::FragmentInput,
        StructKind::FragmentOutput,
    ];

    /// Source language keyword
    pub const fn keyword(self) -> &'static str {
        match self {
            StructKind::Struct => "struct",
            StructKind::SharedStruct => "shared_struct",
            StructKind::UniformBuffer => "uniform_buffer",
            StructKind::ConstantBuffer => "constant_buffer",
            StructKind::MutableBuffer => "mutable_buffer",
            StructKind::InstanceInput => "instance_input",
            StructKind::VertexInput => "vertex_input",
            StructKind::VertexOutput => "vertex_output",
            StructKind::FragmentInput => "fragment_input",
            StructKind::FragmentOutput => "fragment_output",
        }
    }

    /// If the struct is bound to the pipeline as a buffer
    pub const fn is_buffer(self) -> bool {
        matches!(
            self,
            StructKind::UniformBuffer | StructKind::ConstantBuffer | StructKind::MutableBuffer
        )
    }

    /// If the struct describes stage inputs or outputs
    pub const fn is_stage_io(self) -> bool {
        matches!(
            self,
            StructKind::InstanceInput
                | StructKind::VertexInput
                | StructKind::VertexOutput
                | StructKind::FragmentInput
                | StructKind::FragmentOutput
        )
    }

    /// If the struct is fed from vertex buffer memory
    pub const fn is_vertex_stream(self) -> bool {
        matches!(self, StructKind::VertexInput | StructKind::InstanceInput)
    }

    /// If the struct has a binding slot
    pub const fn has_slot(self) -> bool {
        self.is_buffer()
    }

    /// If every member must carry a semantic
    pub const fn requires_semantic(self) -> bool {
        self.is_stage_io()
    }

    /// If every member must carry an input format
    pub const fn requires_format(self) -> bool {
        self.is_vertex_stream()
    }

    /// If members live in the global namespace of the target language
    pub const fn members_are_global(self) -> bool {
        self.is_buffer()
    }

    /// If the struct has a host side mirror
    pub const fn has_host_mirror(self) -> bool {
        matches!(
            self,
            StructKind::SharedStruct
                | StructKind::UniformBuffer
                | StructKind::VertexInput
                | StructKind::InstanceInput
        )
    }
}

impl Semantic {
    pub const ALL: [Semantic; 14] = [
        Semantic::Position,
        Semantic::Normal,
        Semantic::Tangent,
        Semantic::Color,
        Semantic::TexCoord,
        Semantic::Depth,
        Semantic::Vertex,
        Semantic::Instance,
        Semantic::Primitive,
        Semantic::Sample,
        Semantic::FrontFacing,
        Semantic::DispatchThread,
        Semantic::GroupThread,
        Semantic::Group,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::Tangent => "TANGENT",
            Semantic::Color => "COLOR",
            Semantic::TexCoord => "TEXCOORD",
            Semantic::Depth => "DEPTH",
            Semantic::Vertex => "VERTEX",
            Semantic::Instance => "INSTANCE",
            Semantic::Primitive => "PRIMITIVE",
            Semantic::Sample => "SAMPLE",
            Semantic::FrontFacing => "FRONT_FACING",
            Semantic::DispatchThread => "DISPATCH_THREAD",
            Semantic::GroupThread => "GROUP_THREAD",
            Semantic::Group => "GROUP",
        }
    }

    pub fn from_name(name: &str) -> Option<Semantic> {
        Semantic::ALL.into_iter().find(|s| s.name() == name)
    }

    /// If the semantic is supplied by the pipeline instead of a struct member
    pub const fn is_system_value(self) -> bool {
        matches!(
            self,
            Semantic::Vertex
                | Semantic::Instance
                | Semantic::Primitive
                | Semantic::Sample
                | Semantic::FrontFacing
                | Semantic::DispatchThread
                | Semantic::GroupThread
                | Semantic::Group
        )
    }

    /// If the value is consumed by fixed function hardware
    pub const fn is_pipeline_intermediate(self) -> bool {
        matches!(self, Semantic::Position | Semantic::Depth)
    }

    /// Source language identifier of a system value
    pub const fn system_value_name(self) -> Option<&'static str> {
        Some(match self {
            Semantic::Vertex => "vertex_id",
            Semantic::Instance => "instance_id",
            Semantic::Primitive => "primitive_id",
            Semantic::Sample => "sample_id",
            Semantic::FrontFacing => "front_facing",
            Semantic::DispatchThread => "dispatch_thread_id",
            Semantic::GroupThread => "group_thread_id",
            Semantic::Group => "group_id",
            _ => return None,
        })
    }

    /// Find the system value with the given source language identifier
    pub fn from_system_value_name(name: &str) -> Option<Semantic> {
        Semantic::ALL
            .into_iter()
            .find(|s| s.system_value_name() == Some(name))
    }

    /// The stage a system value is available in
    pub const fn system_value_stage(self) -> Option<ShaderStage> {
        match self {
            Semantic::Vertex | Semantic::Instance => Some(ShaderStage::Vertex),
            Semantic::Primitive | Semantic::Sample | Semantic::FrontFacing => {
                Some(ShaderStage::Fragment)
            }
            Semantic::DispatchThread | Semantic::GroupThread | Semantic::Group => {
                Some(ShaderStage::Compute)
            }
            _ => None,
        }
    }
}

impl InputFormat {
    pub const ALL: [InputFormat; 13] = [
        InputFormat::Unorm8,
        InputFormat::Unorm16,
        InputFormat::Snorm8,
        InputFormat::Snorm16,
        InputFormat::UInt8,
        InputFormat::UInt16,
        InputFormat::UInt32,
        InputFormat::SInt8,
        InputFormat::SInt16,
        InputFormat::SInt32,
        InputFormat::Float16,
        InputFormat::Float32,
        InputFormat::Float64,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            InputFormat::Unorm8 => "UNORM8",
            InputFormat::Unorm16 => "UNORM16",
            InputFormat::Snorm8 => "SNORM8",
            InputFormat::Snorm16 => "SNORM16",
            InputFormat::UInt8 => "UINT8",
            InputFormat::UInt16 => "UINT16",
            InputFormat::UInt32 => "UINT32",
            InputFormat::SInt8 => "SINT8",
            InputFormat::SInt16 => "SINT16",
            InputFormat::SInt32 => "SINT32",
            InputFormat::Float16 => "FLOAT16",
            InputFormat::Float32 => "FLOAT32",
            InputFormat::Float64 => "FLOAT64",
        }
    }

    pub fn from_name(name: &str) -> Option<InputFormat> {
        InputFormat::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Size of a single component in bytes
    pub const fn component_size(self) -> u32 {
        match self {
            InputFormat::Unorm8 | InputFormat::Snorm8 | InputFormat::UInt8 | InputFormat::SInt8 => 1,
            InputFormat::Unorm16
            | InputFormat::Snorm16
            | InputFormat::UInt16
            | InputFormat::SInt16
            | InputFormat::Float16 => 2,
            InputFormat::UInt32 | InputFormat::SInt32 | InputFormat::Float32 => 4,
            InputFormat::Float64 => 8,
        }
    }

    /// If integer data is normalized into the 0..1 or -1..1 range
    pub const fn is_normalized(self) -> bool {
        matches!(
            self,
            InputFormat::Unorm8 | InputFormat::Unorm16 | InputFormat::Snorm8 | InputFormat::Snorm16
        )
    }

    /// If the data reaches the shader as integers
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            InputFormat::UInt8
                | InputFormat::UInt16
                | InputFormat::UInt32
                | InputFormat::SInt8
                | InputFormat::SInt16
                | InputFormat::SInt32
        )
    }

    pub const fn is_double(self) -> bool {
        matches!(self, InputFormat::Float64)
    }
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }

    /// Bit in the enabled stage mask
    pub const fn bit(self) -> u32 {
        match self {
            ShaderStage::Vertex => 1,
            ShaderStage::Fragment => 2,
            ShaderStage::Compute => 4,
        }
    }
}

impl ArrayDims {
    /// Total element count
    pub const fn element_count(self) -> u32 {
        match self {
            ArrayDims::None => 1,
            ArrayDims::One(n) => n,
            ArrayDims::Two(n, m) => n * m,
        }
    }

    pub const fn is_array(self) -> bool {
        !matches!(self, ArrayDims::None)
    }

    /// Dimensions after one subscript
    pub const fn subscripted(self) -> Option<ArrayDims> {
        match self {
            ArrayDims::None => None,
            ArrayDims::One(_) => Some(ArrayDims::None),
            ArrayDims::Two(_, m) => Some(ArrayDims::One(m)),
        }
    }

    /// Source style array suffix, `[4]` or `[2][3]`
    pub fn suffix(self) -> String {
        match self {
            ArrayDims::None => String::new(),
            ArrayDims::One(n) => format!("[{n}]"),
            ArrayDims::Two(n, m) => format!("[{n}][{m}]"),
        }
    }
}

impl FunctionKind {
    /// Entry point kind for a function name
    pub fn from_name(name: &str) -> FunctionKind {
        match name {
            "main_vertex" => FunctionKind::MainVertex,
            "main_fragment" => FunctionKind::MainFragment,
            "main_compute" => FunctionKind::MainCompute,
            _ => FunctionKind::Ordinary,
        }
    }

    pub const fn stage(self) -> Option<ShaderStage> {
        match self {
            FunctionKind::Ordinary => None,
            FunctionKind::MainVertex => Some(ShaderStage::Vertex),
            FunctionKind::MainFragment => Some(ShaderStage::Fragment),
            FunctionKind::MainCompute => Some(ShaderStage::Compute),
        }
    }
}

impl Variable {
    /// If the variable is a parameter or member written by its owner
    pub fn is_output(&self) -> bool {
        self.qualifiers.is_out
    }
}
