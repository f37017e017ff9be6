use crate::{PrimitiveType, ScalarType};

/// Built in functions
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Intrinsic {
    Abs,
    Sign,
    Min,
    Max,
    Clamp,
    Saturate,
    Lerp,
    Step,
    SmoothStep,
    Floor,
    Ceil,
    Round,
    Frac,
    Trunc,
    FMod,
    Sqrt,
    RSqrt,
    Pow,
    Exp,
    Exp2,
    Log,
    Log2,
    Sin,
    Cos,
    Tan,
    ASin,
    ACos,
    ATan,
    ATan2,
    Sinh,
    Cosh,
    Tanh,
    Dot,
    Cross,
    Length,
    Distance,
    Normalize,
    Reflect,
    Refract,
    Mul,
    Transpose,
    Determinant,
    Ddx,
    Ddy,
    DdxCoarse,
    DdyCoarse,
    DdxFine,
    DdyFine,
    FWidth,
    CountBits,
    FirstBitHigh,
    FirstBitLow,
    ReverseBits,
    AsFloat,
    AsInt,
    AsUInt,
    Any,
    All,
    IsNan,
    IsInf,
    TextureSample,
    TextureSampleLevel,
    TextureSampleArray,
    TextureSampleArrayLevel,
    TextureSampleBias,
    TextureLoad,
    TextureSize,
}

/// How the result type of an intrinsic is derived from its arguments
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IntrinsicReturn {
    /// Same type as the first argument
    SameAsFirst,

    /// Widest numeric type of all arguments
    Promoted,

    /// Element type of the first argument
    ScalarOfFirst,

    /// Shape of the first argument with a different element type
    ShapeOfFirst(ScalarType),

    /// Single bool
    Bool,

    /// Result of a matrix or vector product
    Multiply,

    /// A fixed type
    Fixed(PrimitiveType),

    /// Dimensions of the texture argument
    TextureSize,
}

const INTRINSIC_NAMES: &[(Intrinsic, &str)] = &[
    (Intrinsic::Abs, "abs"),
    (Intrinsic::Sign, "sign"),
    (Intrinsic::Min, "min"),
    (Intrinsic::Max, "max"),
    (Intrinsic::Clamp, "clamp"),
    (Intrinsic::Saturate, "saturate"),
    (Intrinsic::Lerp, "lerp"),
    (Intrinsic::Step, "step"),
    (Intrinsic::SmoothStep, "smoothstep"),
    (Intrinsic::Floor, "floor"),
    (Intrinsic::Ceil, "ceil"),
    (Intrinsic::Round, "round"),
    (Intrinsic::Frac, "frac"),
    (Intrinsic::Trunc, "trunc"),
    (Intrinsic::FMod, "fmod"),
    (Intrinsic::Sqrt, "sqrt"),
    (Intrinsic::RSqrt, "rsqrt"),
    (Intrinsic::Pow, "pow"),
    (Intrinsic::Exp, "exp"),
    (Intrinsic::Exp2, "exp2"),
    (Intrinsic::Log, "log"),
    (Intrinsic::Log2, "log2"),
    (Intrinsic::Sin, "sin"),
    (Intrinsic::Cos, "cos"),
    (Intrinsic::Tan, "tan"),
    (Intrinsic::ASin, "asin"),
    (Intrinsic::ACos, "acos"),
    (Intrinsic::ATan, "atan"),
    (Intrinsic::ATan2, "atan2"),
    (Intrinsic::Sinh, "sinh"),
    (Intrinsic::Cosh, "cosh"),
    (Intrinsic::Tanh, "tanh"),
    (Intrinsic::Dot, "dot"),
    (Intrinsic::Cross, "cross"),
    (Intrinsic::Length, "length"),
    (Intrinsic::Distance, "distance"),
    (Intrinsic::Normalize, "normalize"),
    (Intrinsic::Reflect, "reflect"),
    (Intrinsic::Refract, "refract"),
    (Intrinsic::Mul, "mul"),
    (Intrinsic::Transpose, "transpose"),
    (Intrinsic::Determinant, "determinant"),
    (Intrinsic::Ddx, "ddx"),
    (Intrinsic::Ddy, "ddy"),
    (Intrinsic::DdxCoarse, "ddx_coarse"),
    (Intrinsic::DdyCoarse, "ddy_coarse"),
    (Intrinsic::DdxFine, "ddx_fine"),
    (Intrinsic::DdyFine, "ddy_fine"),
    (Intrinsic::FWidth, "fwidth"),
    (Intrinsic::CountBits, "countbits"),
    (Intrinsic::FirstBitHigh, "firstbithigh"),
    (Intrinsic::FirstBitLow, "firstbitlow"),
    (Intrinsic::ReverseBits, "reversebits"),
    (Intrinsic::AsFloat, "asfloat"),
    (Intrinsic::AsInt, "asint"),
    (Intrinsic::AsUInt, "asuint"),
    (Intrinsic::Any, "any"),
    (Intrinsic::All, "all"),
    (Intrinsic::IsNan, "isnan"),
    (Intrinsic::IsInf, "isinf"),
    (Intrinsic::TextureSample, "texture_sample"),
    (Intrinsic::TextureSampleLevel, "texture_sample_level"),
    (Intrinsic::TextureSampleArray, "texture_sample_array"),
    (Intrinsic::TextureSampleArrayLevel, "texture_sample_array_level"),
    (Intrinsic::TextureSampleBias, "texture_sample_bias"),
    (Intrinsic::TextureLoad, "texture_load"),
    (Intrinsic::TextureSize, "texture_size"),
];

impl Intrinsic {
    /// Source language name of the intrinsic
    pub fn name(self) -> &'static str {
        INTRINSIC_NAMES
            .iter()
            .find(|(i, _)| *i == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }

    /// Find an intrinsic by its source language name
    pub fn from_name(name: &str) -> Option<Intrinsic> {
        INTRINSIC_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(i, _)| *i)
    }

    /// Minimum and maximum argument count
    pub const fn arity(self) -> (usize, usize) {
        use Intrinsic::*;
        match self {
            Min | Max | Step | FMod | Pow | ATan2 | Dot | Cross | Distance | Reflect | Mul => {
                (2, 2)
            }
            Clamp | Lerp | SmoothStep | Refract => (3, 3),
            TextureSample => (2, 2),
            TextureSampleLevel | TextureSampleArray | TextureSampleBias | TextureLoad => (3, 3),
            TextureSampleArrayLevel => (4, 4),
            TextureSize => (1, 2),
            _ => (1, 1),
        }
    }

    /// Result type rule
    pub const fn return_rule(self) -> IntrinsicReturn {
        use Intrinsic::*;
        match self {
            Min | Max | Clamp | Lerp | Step | SmoothStep | FMod | Pow | ATan2 => {
                IntrinsicReturn::Promoted
            }
            Dot | Length | Distance | Determinant => IntrinsicReturn::ScalarOfFirst,
            CountBits | FirstBitHigh | FirstBitLow | ReverseBits | AsUInt => {
                IntrinsicReturn::ShapeOfFirst(ScalarType::UInt)
            }
            AsInt => IntrinsicReturn::ShapeOfFirst(ScalarType::Int),
            AsFloat => IntrinsicReturn::ShapeOfFirst(ScalarType::Float),
            IsNan | IsInf => IntrinsicReturn::ShapeOfFirst(ScalarType::Bool),
            Any | All => IntrinsicReturn::Bool,
            Mul => IntrinsicReturn::Multiply,
            TextureSample | TextureSampleLevel | TextureSampleArray | TextureSampleArrayLevel
            | TextureSampleBias | TextureLoad => {
                IntrinsicReturn::Fixed(PrimitiveType::vector(ScalarType::Float, 4))
            }
            TextureSize => IntrinsicReturn::TextureSize,
            _ => IntrinsicReturn::SameAsFirst,
        }
    }

    /// If the first argument is a texture
    pub const fn is_texture_operation(self) -> bool {
        use Intrinsic::*;
        matches!(
            self,
            TextureSample
                | TextureSampleLevel
                | TextureSampleArray
                | TextureSampleArrayLevel
                | TextureSampleBias
                | TextureLoad
                | TextureSize
        )
    }

    /// If the intrinsic filters a texture with normalized coordinates
    pub const fn is_texture_sample(self) -> bool {
        use Intrinsic::*;
        matches!(
            self,
            TextureSample
                | TextureSampleLevel
                | TextureSampleArray
                | TextureSampleArrayLevel
                | TextureSampleBias
        )
    }

    /// If the intrinsic is only valid in the fragment stage
    pub const fn requires_derivatives(self) -> bool {
        use Intrinsic::*;
        matches!(
            self,
            Ddx | Ddy
                | DdxCoarse
                | DdyCoarse
                | DdxFine
                | DdyFine
                | FWidth
                | TextureSample
                | TextureSampleArray
                | TextureSampleBias
        )
    }
}

#[test]
fn test_intrinsic_names() {
    for (intrinsic, name) in INTRINSIC_NAMES {
        assert_eq!(Intrinsic::from_name(name), Some(*intrinsic));
        assert_eq!(intrinsic.name(), *name);
    }
    assert_eq!(Intrinsic::from_name("main_vertex"), None);
}
