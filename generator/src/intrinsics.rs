use crate::*;
use gfxsl_ast::*;

/// Emit an intrinsic which shares its name with the source language
///
/// Texture operations have no common spelling so every backend implements them itself.
pub fn generate_default_intrinsic(gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
    if intrinsic.is_texture_operation() {
        return Err(GenerateError::unsupported(
            gen.backend.name(),
            format!("intrinsic `{}`", intrinsic.name()),
        ));
    }
    gen.generate_call(intrinsic.name(), args)
}

/// Emit `saturate(x)` as a clamp to the unit range
pub fn generate_saturate(gen: &mut Generator, args: &[NodeId]) -> GenerateResult<()> {
    gen.write("clamp(");
    gen.generate_args(args)?;
    gen.write(", 0.0, 1.0)");
    Ok(())
}

/// Emit `mul(a, b)` as a product operator
pub fn generate_mul_operator(gen: &mut Generator, args: &[NodeId]) -> GenerateResult<()> {
    gen.write("(");
    gen.generate_expression(args[0])?;
    gen.write(" * ");
    gen.generate_expression(args[1])?;
    gen.write(")");
    Ok(())
}

/// Emit `fmod(a, b)` with truncation semantics for targets where `mod` floors
pub fn generate_truncated_mod(gen: &mut Generator, args: &[NodeId]) -> GenerateResult<()> {
    gen.write("(");
    gen.generate_expression(args[0])?;
    gen.write(" - ");
    gen.generate_expression(args[1])?;
    gen.write(" * trunc(");
    gen.generate_expression(args[0])?;
    gen.write(" / ");
    gen.generate_expression(args[1])?;
    gen.write("))");
    Ok(())
}

/// Emit a call wrapped in a conversion to the type of the intrinsic node
///
/// Used where the target function returns a signed type and the source returns unsigned.
pub fn generate_converted_call(
    gen: &mut Generator,
    conversion: &str,
    name: &str,
    args: &[NodeId],
) -> GenerateResult<()> {
    gen.write(conversion);
    gen.write("(");
    gen.generate_call(name, args)?;
    gen.write(")");
    Ok(())
}
