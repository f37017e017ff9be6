use crate::backend::{primitive_name, GLOBAL_SAMPLER};
use gfxsl_ast::*;
use gfxsl_generator::*;

/// Emit a built in function call in Metal
pub(crate) fn generate_metal_intrinsic(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    use Intrinsic::*;
    match intrinsic {
        Mul => generate_mul_operator(gen, args),
        Lerp => gen.generate_call("mix", args),
        Frac => gen.generate_call("fract", args),
        Ddx | DdxCoarse | DdxFine => gen.generate_call("dfdx", args),
        Ddy | DdyCoarse | DdyFine => gen.generate_call("dfdy", args),
        CountBits => generate_unsigned_call(gen, "popcount", args),
        FirstBitLow => generate_unsigned_call(gen, "ctz", args),
        ReverseBits => generate_unsigned_call(gen, "reverse_bits", args),
        FirstBitHigh => generate_first_bit_high(gen, args),
        AsFloat => generate_bit_cast(gen, ScalarType::Float, args),
        AsInt => generate_bit_cast(gen, ScalarType::Int, args),
        AsUInt => generate_bit_cast(gen, ScalarType::UInt, args),
        Any => generate_vector_test(gen, "any", args),
        All => generate_vector_test(gen, "all", args),
        _ if intrinsic.is_texture_operation() => generate_texture_operation(gen, intrinsic, args),
        _ => generate_default_intrinsic(gen, intrinsic, args),
    }
}

fn unsupported(construct: String) -> GenerateError {
    GenerateError::unsupported("Metal", construct)
}

fn argument_primitive(gen: &Generator, name: &str, arg: NodeId) -> GenerateResult<PrimitiveType> {
    gen.primitive_of(arg)
        .ok_or_else(|| unsupported(format!("`{name}` on a non primitive value")))
}

/// Bit functions return the argument type, the source returns unsigned
fn generate_unsigned_call(gen: &mut Generator, name: &str, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, name, args[0])?;
    let conversion = primitive_name(argument.with_scalar(ScalarType::UInt))?;
    generate_converted_call(gen, &conversion, name, args)
}

/// Index of the highest set bit from the leading zero count
fn generate_first_bit_high(gen: &mut Generator, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, "firstbithigh", args[0])?;
    let conversion = primitive_name(argument.with_scalar(ScalarType::UInt))?;
    gen.write(&format!("{conversion}(31 - clz("));
    gen.generate_expression(args[0])?;
    gen.write("))");
    Ok(())
}

fn generate_bit_cast(gen: &mut Generator, target: ScalarType, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, "bit cast", args[0])?;
    if !matches!(argument.scalar, ScalarType::Int | ScalarType::UInt | ScalarType::Float) {
        return Err(unsupported(format!(
            "bit cast from {} to {}",
            argument.scalar.name(),
            target.name()
        )));
    }
    let ty = primitive_name(argument.with_scalar(target))?;
    gen.write(&format!("as_type<{ty}>("));
    gen.generate_expression(args[0])?;
    gen.write(")");
    Ok(())
}

fn generate_vector_test(gen: &mut Generator, name: &str, args: &[NodeId]) -> GenerateResult<()> {
    let argument = argument_primitive(gen, name, args[0])?;
    match argument.dimension {
        Dimension::Scalar => gen.generate_call("bool", args),
        Dimension::Vector(n) => {
            gen.write(&format!("{name}(bool{n}("));
            gen.generate_expression(args[0])?;
            gen.write("))");
            Ok(())
        }
        Dimension::Matrix(_) => Err(unsupported(format!("`{name}` on {}", argument.name()))),
    }
}

/// Emit an expression converted to unsigned integers
fn generate_unsigned(gen: &mut Generator, arg: NodeId) -> GenerateResult<()> {
    let primitive = argument_primitive(gen, "texel address", arg)?;
    if primitive.scalar == ScalarType::UInt {
        return gen.generate_expression(arg);
    }
    let conversion = primitive_name(primitive.with_scalar(ScalarType::UInt))?;
    gen.write(&format!("{conversion}("));
    gen.generate_expression(arg)?;
    gen.write(")");
    Ok(())
}

/// Emit `texture.get_<dimension>(lod)`
fn generate_dimension_query(gen: &mut Generator, texture: NodeId, query: &str, lod: Option<NodeId>) -> GenerateResult<()> {
    gen.generate_expression(texture)?;
    gen.write(&format!(".{query}("));
    if let Some(lod) = lod {
        generate_unsigned(gen, lod)?;
    }
    gen.write(")");
    Ok(())
}

fn generate_texture_operation(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    let kind = gen
        .texture_kind(args[0])
        .ok_or_else(|| unsupported(format!("`{}` without a texture", intrinsic.name())))?;

    match intrinsic {
        Intrinsic::TextureSample
        | Intrinsic::TextureSampleLevel
        | Intrinsic::TextureSampleBias
        | Intrinsic::TextureSampleArray
        | Intrinsic::TextureSampleArrayLevel => {
            gen.generate_expression(args[0])?;
            gen.write(&format!(".sample(global.{GLOBAL_SAMPLER}, "));
            gen.generate_expression(args[1])?;
            match intrinsic {
                Intrinsic::TextureSampleLevel => {
                    gen.write(", level(");
                    gen.generate_expression(args[2])?;
                    gen.write(")");
                }
                Intrinsic::TextureSampleBias => {
                    gen.write(", bias(");
                    gen.generate_expression(args[2])?;
                    gen.write(")");
                }
                Intrinsic::TextureSampleArray | Intrinsic::TextureSampleArrayLevel => {
                    gen.write(", uint(");
                    gen.generate_expression(args[2])?;
                    gen.write(")");
                    if let Some(lod) = args.get(3) {
                        gen.write(", level(");
                        gen.generate_expression(*lod)?;
                        gen.write(")");
                    }
                }
                _ => {}
            }
            gen.write(")");
        }
        Intrinsic::TextureLoad => {
            gen.generate_expression(args[0])?;
            gen.write(".read(");
            if kind == TextureKind::Texture2DArray {
                // The last coordinate component selects the layer
                gen.write("uint2((");
                gen.generate_expression(args[1])?;
                gen.write(").xy), uint((");
                gen.generate_expression(args[1])?;
                gen.write(").z)");
            } else {
                generate_unsigned(gen, args[1])?;
            }
            gen.write(", ");
            generate_unsigned(gen, args[2])?;
            gen.write(")");
        }
        Intrinsic::TextureSize => {
            let lod = args.get(1).copied();
            if kind == TextureKind::Texture1D {
                return generate_dimension_query(gen, args[0], "get_width", lod);
            }
            let third = match kind {
                TextureKind::Texture3D => Some(("get_depth", lod)),
                TextureKind::Texture2DArray | TextureKind::TextureCubeArray => Some(("get_array_size", None)),
                _ => None,
            };
            gen.write(if third.is_some() { "uint3(" } else { "uint2(" });
            generate_dimension_query(gen, args[0], "get_width", lod)?;
            gen.write(", ");
            generate_dimension_query(gen, args[0], "get_height", lod)?;
            if let Some((query, lod)) = third {
                gen.write(", ");
                generate_dimension_query(gen, args[0], query, lod)?;
            }
            gen.write(")");
        }
        _ => return generate_default_intrinsic(gen, intrinsic, args),
    }
    Ok(())
}
