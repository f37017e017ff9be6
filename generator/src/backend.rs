use crate::*;
use gfxsl_ast::*;

/// Target language strategy used by the shared tree walker
///
/// Methods with a default body implement the behavior shared by C-like targets. A backend
/// overrides the constructs which are spelled differently in its target language.
pub trait Backend {
    /// Name of the backend used in error messages
    fn name(&self) -> &'static str;

    /// Fail before anything is generated or registered if the backend can not be used
    fn check_supported(&self) -> GenerateResult<()> {
        Ok(())
    }

    /// Buffer layout convention of the target
    fn layout_rules(&self) -> LayoutRules;

    /// Identifiers which must be renamed when used by a shader
    fn reserved_words(&self) -> &'static [&'static str] {
        &[]
    }

    /// Target name of a primitive type
    fn primitive_name(&self, primitive: PrimitiveType) -> GenerateResult<String>;

    /// Target name of a texture type
    fn texture_type_name(&self, kind: TextureKind) -> GenerateResult<String>;

    /// Emit everything which comes before the structs of a stage
    fn generate_header(&self, gen: &mut Generator) -> GenerateResult<()>;

    /// Emit a reachable struct declaration of any kind
    fn generate_structure(&self, gen: &mut Generator, sd: &Struct) -> GenerateResult<()>;

    /// Emit a reachable texture declaration
    fn generate_texture(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()>;

    /// Emit the entry point of the stage
    fn generate_entry_point(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()>;

    /// Keyword placed before file scope constants
    fn global_constant_prefix(&self) -> &'static str {
        "const "
    }

    fn discard_statement(&self) -> &'static str {
        "discard;"
    }

    /// If a parameter is removed from function signatures and calls
    fn is_param_elided(&self, gen: &Generator, param: &Variable) -> bool {
        gen.is_buffer_type(param.type_id)
    }

    /// Build the declaration of a parameter, or [None] when the parameter is elided
    fn generate_param(&self, gen: &Generator, param: &Variable) -> GenerateResult<Option<String>> {
        if self.is_param_elided(gen, param) {
            return Ok(None);
        }
        let qualifier = match (param.qualifiers.is_in, param.qualifiers.is_out) {
            (true, true) => "inout ",
            (false, true) => "out ",
            _ if param.qualifiers.is_const => "const ",
            _ => "",
        };
        Ok(Some(format!(
            "{qualifier}{} {}{}",
            gen.type_name(param.type_id)?,
            gen.identifier(&param.name),
            param.array.suffix()
        )))
    }

    /// Emit the signature of an ordinary function
    fn generate_function_signature(&self, gen: &mut Generator, function: &Function) -> GenerateResult<()> {
        let params = gen.param_list(function)?;
        let return_type = gen.type_name(function.return_type)?;
        let name = gen.identifier(&function.name);
        gen.write(&format!("{return_type} {name}({params})"));
        Ok(())
    }

    /// Emit a call to a user function
    fn generate_function_call(&self, gen: &mut Generator, function: &Function, args: &[NodeId]) -> GenerateResult<()> {
        let args = gen.visible_args(function, args);
        let name = gen.identifier(&function.name);
        gen.generate_call(&name, &args)
    }

    /// Emit a reference to a variable
    fn generate_variable(&self, gen: &mut Generator, variable: &Variable) -> GenerateResult<()> {
        gen.write_variable_name(variable)
    }

    /// Emit a struct member access
    fn generate_member(&self, gen: &mut Generator, object: NodeId, member: &Variable) -> GenerateResult<()> {
        gen.generate_member_default(object, member)
    }

    /// Emit a constructor
    fn generate_cast(&self, gen: &mut Generator, type_id: TypeId, args: &[NodeId]) -> GenerateResult<()> {
        let name = gen.type_name(type_id)?;
        gen.generate_call(&name, args)
    }

    /// Emit a call to a built in function
    fn generate_intrinsic(&self, gen: &mut Generator, intrinsic: Intrinsic, args: &[NodeId]) -> GenerateResult<()> {
        generate_default_intrinsic(gen, intrinsic, args)
    }

    /// Emit a reference to a texture
    fn generate_texture_reference(&self, gen: &mut Generator, texture: &Texture) -> GenerateResult<()> {
        let name = gen.identifier(&texture.name);
        gen.write(&name);
        Ok(())
    }

    /// Build the graphics API glue for a vertex or instance format
    fn generate_input_glue(&self, _layout: &InputLayout) -> GenerateResult<Fragments> {
        Ok(Fragments::default())
    }
}
