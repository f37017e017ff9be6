use crate::backend::GLOBAL_SAMPLER;
use gfxsl_ast::*;
use gfxsl_generator::*;

/// `GetDimensions` outputs returned by the `texture_size` overload of each texture kind
pub(crate) const TEXTURE_SIZE_HELPER: [(TextureKind, &[&str]); 6] = [
    (TextureKind::Texture1D, &["width"]),
    (TextureKind::Texture2D, &["width", "height"]),
    (TextureKind::Texture2DArray, &["width", "height", "elements"]),
    (TextureKind::Texture3D, &["width", "height", "depth"]),
    (TextureKind::TextureCube, &["width", "height"]),
    (TextureKind::TextureCubeArray, &["width", "height", "elements"]),
];

/// Emit a built in function call in HLSL
///
/// Every non texture intrinsic shares its name and semantics with HLSL.
pub(crate) fn generate_hlsl_intrinsic(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    if !intrinsic.is_texture_operation() {
        return generate_default_intrinsic(gen, intrinsic, args);
    }

    let kind = gen.texture_kind(args[0]).ok_or_else(|| {
        GenerateError::unsupported("HLSL", format!("`{}` without a texture", intrinsic.name()))
    })?;

    match intrinsic {
        Intrinsic::TextureSample => generate_sample(gen, "Sample", args[0], &[args[1]]),
        Intrinsic::TextureSampleLevel => generate_sample(gen, "SampleLevel", args[0], &[args[1], args[2]]),
        Intrinsic::TextureSampleBias => generate_sample(gen, "SampleBias", args[0], &[args[1], args[2]]),
        Intrinsic::TextureSampleArray | Intrinsic::TextureSampleArrayLevel => {
            // The layer is the last coordinate component
            gen.generate_expression(args[0])?;
            let method = match args.get(3) {
                Some(_) => "SampleLevel",
                None => "Sample",
            };
            gen.write(&format!(".{method}({GLOBAL_SAMPLER}, float{}(", kind.coordinate_count()));
            gen.generate_expression(args[1])?;
            gen.write(", ");
            gen.generate_expression(args[2])?;
            gen.write(")");
            if let Some(lod) = args.get(3) {
                gen.write(", ");
                gen.generate_expression(*lod)?;
            }
            gen.write(")");
            Ok(())
        }
        Intrinsic::TextureLoad => {
            // The mip level is the last component of the load address
            gen.generate_expression(args[0])?;
            gen.write(&format!(".Load(int{}(", kind.coordinate_count() + 1));
            gen.generate_expression(args[1])?;
            gen.write(", ");
            gen.generate_expression(args[2])?;
            gen.write("))");
            Ok(())
        }
        Intrinsic::TextureSize => {
            gen.write("texture_size(");
            gen.generate_expression(args[0])?;
            gen.write(", ");
            match args.get(1) {
                Some(lod) => gen.generate_expression(*lod)?,
                None => gen.write("0u"),
            }
            gen.write(")");
            Ok(())
        }
        _ => generate_default_intrinsic(gen, intrinsic, args),
    }
}

/// Emit `texture.Method(global_sampler, args)`
fn generate_sample(gen: &mut Generator, method: &str, texture: NodeId, args: &[NodeId]) -> GenerateResult<()> {
    gen.generate_expression(texture)?;
    gen.write(&format!(".{method}({GLOBAL_SAMPLER}, "));
    gen.generate_args(args)?;
    gen.write(")");
    Ok(())
}
