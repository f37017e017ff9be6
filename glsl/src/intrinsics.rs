use crate::backend::{flipped_coordinate_size, primitive_name};
use gfxsl_ast::*;
use gfxsl_generator::*;

/// Emit a built in function call in GLSL
pub(crate) fn generate_glsl_intrinsic(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    use Intrinsic::*;
    match intrinsic {
        Saturate => generate_saturate(gen, args),
        Mul => generate_mul_operator(gen, args),
        FMod => generate_truncated_mod(gen, args),
        Lerp => gen.generate_call("mix", args),
        Frac => gen.generate_call("fract", args),
        RSqrt => gen.generate_call("inversesqrt", args),
        ATan2 => gen.generate_call("atan", args),

        // Coarse and fine variants need GLSL 4.50
        Ddx | DdxCoarse | DdxFine => gen.generate_call("dFdx", args),
        Ddy | DdyCoarse | DdyFine => gen.generate_call("dFdy", args),

        CountBits => generate_unsigned_call(gen, "bitCount", args),
        FirstBitHigh => generate_unsigned_call(gen, "findMSB", args),
        FirstBitLow => generate_unsigned_call(gen, "findLSB", args),
        ReverseBits => generate_unsigned_call(gen, "bitfieldReverse", args),
        AsFloat => generate_bit_cast(gen, ScalarType::Float, args),
        AsInt => generate_bit_cast(gen, ScalarType::Int, args),
        AsUInt => generate_bit_cast(gen, ScalarType::UInt, args),
        Any => generate_vector_test(gen, "any", args),
        All => generate_vector_test(gen, "all", args),

        TextureSample
        | TextureSampleLevel
        | TextureSampleBias
        | TextureSampleArray
        | TextureSampleArrayLevel
        | TextureLoad
        | TextureSize => generate_texture_operation(gen, intrinsic, args),

        _ => generate_default_intrinsic(gen, intrinsic, args),
    }
}

fn unsupported(construct: String) -> GenerateError {
    GenerateError::unsupported("GLSL", construct)
}

/// Primitive type of an intrinsic argument
fn argument_primitive(gen: &Generator, name: &str, arg: NodeId) -> GenerateResult<PrimitiveType> {
    gen.primitive_of(arg)
        .ok_or_else(|| unsupported(format!("`{name}` on a non primitive value")))
}

/// Bit counting functions return signed values in GLSL
fn generate_unsigned_call(gen: &mut Generator, name: &str, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, name, args[0])?;
    let conversion = primitive_name(argument.with_scalar(ScalarType::UInt))?;
    generate_converted_call(gen, &conversion, name, args)
}

/// Reinterpret the bits of a value as another scalar type
fn generate_bit_cast(gen: &mut Generator, target: ScalarType, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, "bit cast", args[0])?;
    let function = match (argument.scalar, target) {
        (ScalarType::Int, ScalarType::Float) => "intBitsToFloat".to_string(),
        (ScalarType::UInt, ScalarType::Float) => "uintBitsToFloat".to_string(),
        (ScalarType::Float, ScalarType::Int) => "floatBitsToInt".to_string(),
        (ScalarType::Float, ScalarType::UInt) => "floatBitsToUint".to_string(),

        // Conversions between same sized types keep the bits
        (ScalarType::Int | ScalarType::UInt | ScalarType::Float, _) => {
            primitive_name(argument.with_scalar(target))?
        }
        (scalar, _) => {
            return Err(unsupported(format!(
                "bit cast from {} to {}",
                scalar.name(),
                target.name()
            )))
        }
    };
    gen.generate_call(&function, args)
}

/// `any` and `all` only accept boolean vectors
fn generate_vector_test(gen: &mut Generator, name: &str, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, name, args[0])?;
    match argument.dimension {
        Dimension::Scalar => gen.generate_call("bool", args),
        Dimension::Vector(n) => {
            gen.write(&format!("{name}(bvec{n}("));
            gen.generate_expression(args[0])?;
            gen.write("))");
            Ok(())
        }
        Dimension::Matrix(_) => Err(unsupported(format!("`{name}` on {}", argument.name()))),
    }
}

/// Emit a sampling coordinate, flipping V where the texture origin differs
fn generate_sample_coordinate(gen: &mut Generator, kind: TextureKind, coordinate: NodeId) -> GenerateResult<()> {
    if flipped_coordinate_size(kind).is_some() {
        gen.write("flip_v(");
        gen.generate_expression(coordinate)?;
        gen.write(")");
        Ok(())
    } else {
        gen.generate_expression(coordinate)
    }
}

/// Emit a coordinate with the array layer appended
fn generate_array_coordinate(
    gen: &mut Generator,
    kind: TextureKind,
    coordinate: NodeId,
    layer: NodeId,
) -> GenerateResult<()> {
    gen.write(&format!("vec{}(", kind.coordinate_count()));
    generate_sample_coordinate(gen, kind, coordinate)?;
    gen.write(", ");
    gen.generate_expression(layer)?;
    gen.write(")");
    Ok(())
}

/// Texel addressing functions take signed integers
fn generate_signed(gen: &mut Generator, arg: NodeId) -> GenerateResult<()> {
    let primitive = argument_primitive(gen, "texel address", arg)?;
    if primitive.scalar == ScalarType::Int {
        return gen.generate_expression(arg);
    }
    let conversion = primitive_name(primitive.with_scalar(ScalarType::Int))?;
    gen.write(&format!("{conversion}("));
    gen.generate_expression(arg)?;
    gen.write(")");
    Ok(())
}

fn generate_texture_operation(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    let kind = gen
        .texture_kind(args[0])
        .ok_or_else(|| unsupported(format!("`{}` without a texture", intrinsic.name())))?;

    match intrinsic {
        Intrinsic::TextureSample | Intrinsic::TextureSampleBias | Intrinsic::TextureSampleLevel => {
            let function = match intrinsic {
                Intrinsic::TextureSampleLevel => "textureLod",
                _ => "texture",
            };
            gen.write(function);
            gen.write("(");
            gen.generate_expression(args[0])?;
            gen.write(", ");
            generate_sample_coordinate(gen, kind, args[1])?;
            if let Some(extra) = args.get(2) {
                gen.write(", ");
                gen.generate_expression(*extra)?;
            }
            gen.write(")");
        }
        Intrinsic::TextureSampleArray | Intrinsic::TextureSampleArrayLevel => {
            let function = match intrinsic {
                Intrinsic::TextureSampleArrayLevel => "textureLod",
                _ => "texture",
            };
            gen.write(function);
            gen.write("(");
            gen.generate_expression(args[0])?;
            gen.write(", ");
            generate_array_coordinate(gen, kind, args[1], args[2])?;
            if let Some(lod) = args.get(3) {
                gen.write(", ");
                gen.generate_expression(*lod)?;
            }
            gen.write(")");
        }
        Intrinsic::TextureLoad => {
            gen.write("texelFetch(");
            gen.generate_expression(args[0])?;
            gen.write(", ");
            generate_signed(gen, args[1])?;
            gen.write(", ");
            generate_signed(gen, args[2])?;
            gen.write(")");
        }
        Intrinsic::TextureSize => {
            let size_type = match kind {
                TextureKind::Texture1D => "uint",
                TextureKind::Texture2D | TextureKind::TextureCube => "uvec2",
                _ => "uvec3",
            };
            gen.write(&format!("{size_type}(textureSize("));
            gen.generate_expression(args[0])?;
            match args.get(1) {
                Some(lod) => {
                    gen.write(", ");
                    generate_signed(gen, *lod)?;
                }
                None => gen.write(", 0"),
            }
            gen.write("))");
        }
        _ => return generate_default_intrinsic(gen, intrinsic, args),
    }
    Ok(())
}
