use crate::*;
use gfxsl_ast::*;

/// State for generating the source of a single shader stage
///
/// The generator walks the reachable part of a module and writes target source into `output`.
/// Everything which is spelled differently per target is delegated to the [Backend].
pub struct Generator<'m> {
    pub module: &'m Module,
    pub backend: &'m dyn Backend,
    pub stage: ShaderStage,

    /// Entry point of the stage
    pub entry: &'m Function,

    /// Declarations used by the entry point
    pub reachable: Reachability,

    pub output: String,

    /// Current indentation level
    indent: u32,

    /// Identifier replacements applied once the stage is complete
    substitutions: Vec<(String, String)>,
}

/// Generate the source of one stage of a module
pub fn generate_stage(module: &Module, backend: &dyn Backend, stage: ShaderStage) -> GenerateResult<String> {
    let entry = module
        .entry_point(stage)
        .ok_or(GenerateError::MissingEntryPoint(stage.name()))?;
    let reachable = Reachability::compute(module, entry.id);

    let mut gen = Generator {
        module,
        backend,
        stage,
        entry,
        reachable,
        output: String::new(),
        indent: 0,
        substitutions: Vec::new(),
    };
    gen.validate_stage()?;

    backend.generate_header(&mut gen)?;

    for sd in gen.reachable.structs(module) {
        backend.generate_structure(&mut gen, sd)?;
    }

    for texture in gen.reachable.textures(module) {
        backend.generate_texture(&mut gen, texture)?;
    }

    for root in &module.roots {
        if let Node::GlobalDeclaration(id, init) = module.nodes.get(*root) {
            if gen.reachable.globals.contains(id) {
                gen.generate_global(module.get_variable(*id), *init)?;
            }
        }
    }

    for function in gen.reachable.functions(module) {
        if function.kind == FunctionKind::Ordinary {
            gen.separate();
            backend.generate_function_signature(&mut gen, function)?;
            gen.new_line();
            gen.generate_function_body(function)?;
        }
    }

    backend.generate_entry_point(&mut gen, entry)?;
    gen.new_line();

    log::debug!(
        "generated {} {} stage of `{}` ({} bytes)",
        backend.name(),
        stage.name(),
        module.name,
        gen.output.len()
    );
    Ok(gen.finish())
}

impl<'m> Generator<'m> {
    /// Fail if the stage uses a value the stage can not provide
    fn validate_stage(&self) -> GenerateResult<()> {
        for semantic in &self.reachable.system_values {
            if semantic.system_value_stage() != Some(self.stage) {
                let name = semantic.system_value_name().unwrap_or(semantic.name());
                return Err(GenerateError::SystemValueOutsideStage(
                    name.to_string(),
                    self.stage.name(),
                ));
            }
        }

        if self.stage != ShaderStage::Fragment {
            for id in &self.reachable.nodes {
                if let Node::IntrinsicCall(intrinsic, _) = self.module.nodes.get(*id) {
                    if intrinsic.requires_derivatives() {
                        return Err(GenerateError::DerivativesOutsideFragment(
                            intrinsic.name().to_string(),
                            self.stage.name(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply deferred substitutions and return the stage source
    fn finish(self) -> String {
        if self.substitutions.is_empty() {
            self.output
        } else {
            replace_identifiers(&self.output, &self.substitutions)
        }
    }

    /// Register a whole word replacement which is applied after the stage is generated
    pub fn add_substitution(&mut self, from: String, to: String) {
        self.substitutions.push((from, to));
    }

    /// Append text to the output
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Increase indentation
    pub fn push_indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease indentation
    pub fn pop_indent(&mut self) {
        self.indent -= 1;
    }

    /// Begin a new line and indent up to the current level of indentation
    pub fn new_line(&mut self) {
        // Skip new lines when we are starting the file as there is nothing before us to separate from
        if self.output.is_empty() {
            return;
        }

        // Remove previous indentation on empty lines - or trailing whitespace
        let trimmed = self.output.trim_end_matches(' ').len();
        self.output.truncate(trimmed);

        self.output.push('\n');
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    /// Start a top level declaration with an empty line before it
    pub fn separate(&mut self) {
        self.new_line();
        self.new_line();
    }

    /// Write a line at the current indentation
    pub fn line(&mut self, text: &str) {
        self.new_line();
        self.write(text);
    }

    /// Target identifier for a source identifier
    pub fn identifier(&self, name: &str) -> String {
        if self.backend.reserved_words().contains(&name) {
            format!("{name}_")
        } else {
            name.to_string()
        }
    }

    /// Target name of a type
    pub fn type_name(&self, id: TypeId) -> GenerateResult<String> {
        let ty = self.module.get_type(id);
        match ty.kind {
            TypeKind::Void => Ok("void".to_string()),
            TypeKind::Primitive(primitive) => self.backend.primitive_name(primitive),
            TypeKind::Struct(_) => Ok(self.identifier(&ty.name)),
            TypeKind::Texture(kind) => self.backend.texture_type_name(kind),
        }
    }

    /// Target declaration of a variable, `type name[n]`
    pub fn declaration(&self, variable: &Variable) -> GenerateResult<String> {
        Ok(format!(
            "{} {}{}",
            self.type_name(variable.type_id)?,
            self.identifier(&variable.name),
            variable.array.suffix()
        ))
    }

    /// Struct kind of a type if it is a struct
    pub fn struct_kind(&self, id: TypeId) -> Option<StructKind> {
        self.module.get_type(id).as_struct()
    }

    pub fn is_buffer_type(&self, id: TypeId) -> bool {
        self.struct_kind(id).map(StructKind::is_buffer).unwrap_or(false)
    }

    /// Name of a buffer or stage member in the flat target namespace, `Transform_mvp`
    pub fn prefixed_member_name(&self, owner: TypeId, member: &Variable) -> String {
        format!("{}_{}", self.module.type_name(owner), member.name)
    }

    /// Build the comma separated parameter declarations of a function
    pub fn param_list(&self, function: &Function) -> GenerateResult<String> {
        let mut params = Vec::new();
        for param in self.module.params(function.id) {
            if let Some(param) = self.backend.generate_param(self, param)? {
                params.push(param);
            }
        }
        Ok(params.join(", "))
    }

    /// Filter call arguments down to those which are passed in the target
    pub fn visible_args(&self, function: &Function, args: &[NodeId]) -> Vec<NodeId> {
        self.module
            .params(function.id)
            .iter()
            .zip(args)
            .filter(|(param, _)| !self.backend.is_param_elided(self, param))
            .map(|(_, arg)| *arg)
            .collect()
    }

    /// If any reachable node calls an intrinsic matching a predicate
    pub fn uses_intrinsic(&self, predicate: impl Fn(Intrinsic, &[NodeId]) -> bool) -> bool {
        self.reachable.nodes.iter().any(|id| match self.module.nodes.get(*id) {
            Node::IntrinsicCall(intrinsic, args) => predicate(*intrinsic, args),
            _ => false,
        })
    }

    /// Texture kind of a texture argument
    pub fn texture_kind(&self, node: NodeId) -> Option<TextureKind> {
        match self.module.nodes.get(node) {
            Node::Texture(id) => Some(self.module.get_texture(*id).kind),
            _ => None,
        }
    }

    /// Primitive type of an expression
    pub fn primitive_of(&self, node: NodeId) -> Option<PrimitiveType> {
        let ty = self.module.nodes.value_type(node);
        match ty.array {
            ArrayDims::None => self.module.get_type(ty.type_id).as_primitive(),
            _ => None,
        }
    }

    /// Emit a file scope constant
    fn generate_global(&mut self, variable: &Variable, init: NodeId) -> GenerateResult<()> {
        let declaration = self.declaration(variable)?;
        self.separate();
        self.write(self.backend.global_constant_prefix());
        self.write(&declaration);
        self.write(" = ");
        self.generate_expression(init)?;
        self.write(";");
        Ok(())
    }

    /// Emit the body block of a function
    pub fn generate_function_body(&mut self, function: &Function) -> GenerateResult<()> {
        match function.body {
            Some(body) => self.generate_statement(body),
            None => {
                self.write("{");
                self.new_line();
                self.write("}");
                Ok(())
            }
        }
    }

    /// Emit the statements of a block node on their own lines
    pub fn generate_block_contents(&mut self, id: NodeId) -> GenerateResult<()> {
        match self.module.nodes.get(id) {
            Node::Block(statements) => {
                for statement in statements {
                    self.new_line();
                    self.generate_statement(*statement)?;
                }
                Ok(())
            }
            _ => {
                self.new_line();
                self.generate_statement(id)
            }
        }
    }

    /// Emit the body of a control flow statement as a braced block
    fn generate_sub_statement(&mut self, id: NodeId) -> GenerateResult<()> {
        self.write("{");
        self.push_indent();
        self.generate_block_contents(id)?;
        self.pop_indent();
        self.new_line();
        self.write("}");
        Ok(())
    }

    /// Emit a statement node
    pub fn generate_statement(&mut self, id: NodeId) -> GenerateResult<()> {
        let module = self.module;
        match module.nodes.get(id) {
            Node::Block(_) => self.generate_sub_statement(id)?,
            Node::Expression(expr) => {
                self.generate_expression(*expr)?;
                self.write(";");
            }
            Node::VariableDeclaration(variable, init) => {
                self.generate_local_declaration(module.get_variable(*variable), *init)?;
                self.write(";");
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.write("if (");
                self.generate_expression(*condition)?;
                self.write(") ");
                self.generate_sub_statement(*then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.new_line();
                    self.write("else ");
                    match module.nodes.get(*else_branch) {
                        Node::If { .. } => self.generate_statement(*else_branch)?,
                        _ => self.generate_sub_statement(*else_branch)?,
                    }
                }
            }
            Node::While { condition, body } => {
                self.write("while (");
                self.generate_expression(*condition)?;
                self.write(") ");
                self.generate_sub_statement(*body)?;
            }
            Node::DoWhile { body, condition } => {
                self.write("do ");
                self.generate_sub_statement(*body)?;
                self.write(" while (");
                self.generate_expression(*condition)?;
                self.write(");");
            }
            Node::For {
                init,
                condition,
                increment,
                body,
            } => {
                self.write("for (");
                if let Some(init) = init {
                    match module.nodes.get(*init) {
                        Node::VariableDeclaration(variable, value) => {
                            self.generate_local_declaration(module.get_variable(*variable), *value)?
                        }
                        Node::Expression(expr) => self.generate_expression(*expr)?,
                        _ => self.generate_expression(*init)?,
                    }
                }
                self.write(";");
                if let Some(condition) = condition {
                    self.write(" ");
                    self.generate_expression(*condition)?;
                }
                self.write(";");
                if let Some(increment) = increment {
                    self.write(" ");
                    self.generate_expression(*increment)?;
                }
                self.write(") ");
                self.generate_sub_statement(*body)?;
            }
            Node::Switch { value, body } => {
                self.write("switch (");
                self.generate_expression(*value)?;
                self.write(") {");
                self.push_indent();
                let mut in_case = false;
                for statement in body {
                    match module.nodes.get(*statement) {
                        Node::Case(label) => {
                            if in_case {
                                self.pop_indent();
                            }
                            self.new_line();
                            self.write("case ");
                            self.generate_expression(*label)?;
                            self.write(":");
                            self.push_indent();
                            in_case = true;
                        }
                        Node::Default => {
                            if in_case {
                                self.pop_indent();
                            }
                            self.new_line();
                            self.write("default:");
                            self.push_indent();
                            in_case = true;
                        }
                        _ => {
                            self.new_line();
                            self.generate_statement(*statement)?;
                        }
                    }
                }
                if in_case {
                    self.pop_indent();
                }
                self.pop_indent();
                self.new_line();
                self.write("}");
            }
            Node::Return(value) => match value {
                Some(value) => {
                    self.write("return ");
                    self.generate_expression(*value)?;
                    self.write(";");
                }
                None => self.write("return;"),
            },
            Node::Break => self.write("break;"),
            Node::Continue => self.write("continue;"),
            Node::Discard => self.write(self.backend.discard_statement()),
            _ => {
                self.generate_expression(id)?;
                self.write(";");
            }
        }
        Ok(())
    }

    /// Emit a local declaration without the trailing semicolon
    fn generate_local_declaration(&mut self, variable: &Variable, init: Option<NodeId>) -> GenerateResult<()> {
        if variable.qualifiers.is_const {
            self.write("const ");
        }
        let declaration = self.declaration(variable)?;
        self.write(&declaration);
        if let Some(init) = init {
            self.write(" = ");
            self.generate_expression(init)?;
        }
        Ok(())
    }

    /// Emit an expression node
    pub fn generate_expression(&mut self, id: NodeId) -> GenerateResult<()> {
        let module = self.module;
        let backend = self.backend;
        match module.nodes.get(id) {
            Node::Literal(literal) => self.write(&literal_text(*literal)),
            Node::Variable(variable) => backend.generate_variable(self, module.get_variable(*variable))?,
            Node::Texture(texture) => {
                backend.generate_texture_reference(self, module.get_texture(*texture))?
            }
            Node::Unary(op, operand) => {
                if op.is_postfix() {
                    self.generate_expression(*operand)?;
                    self.write(unary_operator_text(*op));
                } else {
                    self.write(unary_operator_text(*op));
                    // Keep `- -x` from becoming a decrement
                    let nested = matches!(module.nodes.get(*operand), Node::Unary(inner, _) if !inner.is_postfix());
                    if nested {
                        self.write("(");
                    }
                    self.generate_expression(*operand)?;
                    if nested {
                        self.write(")");
                    }
                }
            }
            Node::Binary(op, left, right) => {
                self.generate_expression(*left)?;
                self.write(binary_operator_text(*op));
                self.generate_expression(*right)?;
            }
            Node::Ternary(condition, left, right) => {
                self.generate_expression(*condition)?;
                self.write(" ? ");
                self.generate_expression(*left)?;
                self.write(" : ");
                self.generate_expression(*right)?;
            }
            Node::FunctionCall(function, args) => {
                backend.generate_function_call(self, module.get_function(*function), args)?
            }
            Node::IntrinsicCall(intrinsic, args) => backend.generate_intrinsic(self, *intrinsic, args)?,
            Node::Cast(type_id, args) => backend.generate_cast(self, *type_id, args)?,
            Node::Member(object, member) => {
                backend.generate_member(self, *object, module.get_variable(*member))?
            }
            Node::Swizzle(object, swizzle) => {
                self.generate_expression(*object)?;
                self.write(&format!(".{swizzle}"));
            }
            Node::Group(expr) => {
                self.write("(");
                self.generate_expression(*expr)?;
                self.write(")");
            }
            Node::Subscript(object, index) => {
                self.generate_expression(*object)?;
                self.write("[");
                self.generate_expression(*index)?;
                self.write("]");
            }
            node => {
                return Err(GenerateError::unsupported(
                    backend.name(),
                    format!("{node:?} in an expression"),
                ))
            }
        }
        Ok(())
    }

    /// Emit `name(arg, arg)`
    pub fn generate_call(&mut self, name: &str, args: &[NodeId]) -> GenerateResult<()> {
        self.write(name);
        self.write("(");
        self.generate_args(args)?;
        self.write(")");
        Ok(())
    }

    /// Emit comma separated expressions
    pub fn generate_args(&mut self, args: &[NodeId]) -> GenerateResult<()> {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.generate_expression(*arg)?;
        }
        Ok(())
    }

    /// Emit a variable by its identifier
    pub fn write_variable_name(&mut self, variable: &Variable) -> GenerateResult<()> {
        let name = self.identifier(&variable.name);
        self.write(&name);
        Ok(())
    }

    /// Member access shared by most targets
    ///
    /// Buffer members live in the flat global namespace so they are referenced by prefixed name.
    pub fn generate_member_default(&mut self, object: NodeId, member: &Variable) -> GenerateResult<()> {
        let owner = self.module.nodes.value_type(object).type_id;
        if self.is_buffer_type(owner) {
            let name = self.identifier(&self.prefixed_member_name(owner, member));
            self.write(&name);
        } else {
            self.generate_expression(object)?;
            let name = self.identifier(&member.name);
            self.write(&format!(".{name}"));
        }
        Ok(())
    }
}

/// Target text for a literal
pub fn literal_text(literal: Literal) -> String {
    match literal {
        Literal::Bool(value) => value.to_string(),
        Literal::Int(value) => value.to_string(),
        Literal::UInt(value) => format!("{value}u"),
        Literal::Float(value) => {
            // Values which came from a single precision literal print without the widening noise
            let single = value as f32;
            if single as f64 == value {
                format!("{single:?}")
            } else {
                format!("{value:?}")
            }
        }
    }
}

/// Replace whole identifiers in generated text
pub fn replace_identifiers(text: &str, substitutions: &[(String, String)]) -> String {
    let is_identifier = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(|c: char| c.is_ascii_alphabetic() || c == '_') {
        // Digits directly before the match belong to a number or a longer identifier
        let prefix = &rest[..start];
        let end = rest[start..]
            .find(|c: char| !is_identifier(c))
            .map(|len| start + len)
            .unwrap_or(rest.len());
        let word = &rest[start..end];
        output.push_str(prefix);

        let joined = prefix.ends_with(|c: char| c.is_ascii_digit());
        match substitutions.iter().find(|(from, _)| from == word) {
            Some((_, to)) if !joined => output.push_str(to),
            _ => output.push_str(word),
        }
        rest = &rest[end..];
    }
    output.push_str(rest);
    output
}

#[test]
fn test_literal_text() {
    assert_eq!(literal_text(Literal::Bool(true)), "true");
    assert_eq!(literal_text(Literal::Int(7)), "7");
    assert_eq!(literal_text(Literal::UInt(7)), "7u");
    assert_eq!(literal_text(Literal::Float(1.0)), "1.0");
    assert_eq!(literal_text(Literal::Float(0.1f32 as f64)), "0.1");
    assert_eq!(literal_text(Literal::Float(0.1)), "0.1");
}

#[test]
fn test_replace_identifiers() {
    let substitutions = [
        ("Out_position".to_string(), "gl_Position".to_string()),
        ("Out_depth".to_string(), "gl_FragDepth".to_string()),
    ];
    assert_eq!(
        replace_identifiers("Out_position = vec4(Out_position_x, 1.0);", &substitutions),
        "gl_Position = vec4(Out_position_x, 1.0);"
    );
    assert_eq!(
        replace_identifiers("Out_depth+Out_depth;", &substitutions),
        "gl_FragDepth+gl_FragDepth;"
    );
    assert_eq!(replace_identifiers("", &substitutions), "");
}
