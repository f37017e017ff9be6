use crate::*;

/// Root AST node for a single shader file
#[derive(PartialEq, Debug, Clone)]
pub struct Module {
    /// Name of the shader the module was parsed from
    pub name: String,

    pub types: Vec<Type>,
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    pub structs: Vec<Struct>,
    pub textures: Vec<Texture>,

    pub nodes: NodeBuffer,

    /// Top level declaration nodes in declaration order
    pub roots: Vec<NodeId>,
}

impl Module {
    /// Create a module with the built in types registered
    pub fn new(name: &str) -> Self {
        let mut module = Module {
            name: name.to_string(),
            types: Vec::new(),
            variables: Vec::new(),
            functions: Vec::new(),
            structs: Vec::new(),
            textures: Vec::new(),
            nodes: NodeBuffer::default(),
            roots: Vec::new(),
        };

        module.add_builtin_type("void".to_string(), TypeKind::Void, 0, 0);
        for primitive in PrimitiveType::all() {
            let layout = PrimitiveLayout::get(primitive, LayoutRules::Std140);
            module.add_builtin_type(
                primitive.name(),
                TypeKind::Primitive(primitive),
                layout.size,
                layout.alignment,
            );
        }
        for kind in [
            TextureKind::Texture1D,
            TextureKind::Texture2D,
            TextureKind::Texture2DArray,
            TextureKind::Texture3D,
            TextureKind::TextureCube,
            TextureKind::TextureCubeArray,
        ] {
            module.add_builtin_type(kind.name().to_string(), TypeKind::Texture(kind), 0, 0);
        }

        module
    }

    fn add_builtin_type(&mut self, name: String, kind: TypeKind, size: u32, alignment: u32) {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type {
            id,
            name,
            kind,
            member_first: 0,
            member_count: 0,
            size_packed: size,
            size_padded: size,
            alignment,
            global_namespace: false,
            pipeline_intermediate: false,
        });
    }

    /// The void type
    pub const fn void_type(&self) -> TypeId {
        TypeId(0)
    }

    /// Get the type id of a primitive
    pub fn primitive_type(&self, primitive: PrimitiveType) -> TypeId {
        self.types
            .iter()
            .find(|ty| ty.kind == TypeKind::Primitive(primitive))
            .map(|ty| ty.id)
            .unwrap_or(TypeId(0))
    }

    /// Get the type id of a texture kind
    pub fn texture_type(&self, kind: TextureKind) -> TypeId {
        self.types
            .iter()
            .find(|ty| ty.kind == TypeKind::Texture(kind))
            .map(|ty| ty.id)
            .unwrap_or(TypeId(0))
    }

    pub fn get_type(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn get_type_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn get_variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn get_function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn get_function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    pub fn get_struct(&self, id: StructId) -> &Struct {
        &self.structs[id.0 as usize]
    }

    pub fn get_texture(&self, id: TextureId) -> &Texture {
        &self.textures[id.0 as usize]
    }

    /// Add a type to the type table
    pub fn add_type(&mut self, mut ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        ty.id = id;
        self.types.push(ty);
        id
    }

    /// Add a variable to the variable table
    pub fn add_variable(&mut self, mut variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        variable.id = id;
        self.variables.push(variable);
        id
    }

    /// Add a function to the function table
    pub fn add_function(&mut self, mut function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        function.id = id;
        self.functions.push(function);
        id
    }

    /// Add a struct to the struct table
    pub fn add_struct(&mut self, mut sd: Struct) -> StructId {
        let id = StructId(self.structs.len() as u32);
        sd.id = id;
        self.structs.push(sd);
        id
    }

    /// Add a texture to the texture table
    pub fn add_texture(&mut self, mut texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        texture.id = id;
        self.textures.push(texture);
        id
    }

    /// Get the members of a struct type
    pub fn members(&self, id: TypeId) -> &[Variable] {
        let ty = self.get_type(id);
        let first = ty.member_first as usize;
        &self.variables[first..first + ty.member_count as usize]
    }

    /// Get the parameters of a function
    pub fn params(&self, id: FunctionId) -> &[Variable] {
        let function = self.get_function(id);
        let first = function.param_first as usize;
        &self.variables[first..first + function.param_count as usize]
    }

    /// Get the name of a type
    pub fn type_name(&self, id: TypeId) -> &str {
        &self.get_type(id).name
    }

    /// Find a type by name
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types.iter().find(|ty| ty.name == name).map(|ty| ty.id)
    }

    /// Find a function by name
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.functions.iter().find(|f| f.name == name).map(|f| f.id)
    }

    /// Find a texture by name
    pub fn find_texture(&self, name: &str) -> Option<TextureId> {
        self.textures.iter().find(|t| t.name == name).map(|t| t.id)
    }

    /// Find the struct declaration which declared a type
    pub fn struct_for_type(&self, id: TypeId) -> Option<&Struct> {
        self.structs.iter().find(|sd| sd.type_id == id)
    }

    /// Find the system value variable for a semantic
    pub fn find_system_value(&self, semantic: Semantic) -> Option<VariableId> {
        self.variables
            .iter()
            .find(|v| v.kind == VariableKind::SystemValue && v.semantic == Some(semantic))
            .map(|v| v.id)
    }

    /// Find the entry point for a stage
    pub fn entry_point(&self, stage: ShaderStage) -> Option<&Function> {
        self.functions.iter().find(|f| f.kind.stage() == Some(stage))
    }

    /// Get the stages which have an entry point
    pub fn stages(&self) -> Vec<ShaderStage> {
        ShaderStage::ALL
            .into_iter()
            .filter(|stage| self.entry_point(*stage).is_some())
            .collect()
    }

    /// Find the parameter of a function with a struct of the given kind
    pub fn find_param_of_kind(&self, function: FunctionId, kind: StructKind) -> Option<&Variable> {
        self.params(function)
            .iter()
            .find(|p| self.get_type(p.type_id).as_struct() == Some(kind))
    }

    /// Source language name of a value type
    pub fn value_type_name(&self, ty: ValueType) -> String {
        format!("{}{}", self.type_name(ty.type_id), ty.array.suffix())
    }
}

#[test]
fn test_builtin_types() {
    let module = Module::new("test");
    assert!(module.get_type(module.void_type()).is_void());

    let float3 = module.primitive_type(PrimitiveType::vector(ScalarType::Float, 3));
    assert_eq!(module.type_name(float3), "float3");
    assert_eq!(module.get_type(float3).size_padded, 12);
    assert_eq!(module.get_type(float3).alignment, 16);
    assert_eq!(module.find_type("float4x4").map(|id| module.get_type(id).size_padded), Some(64));

    let tex = module.texture_type(TextureKind::Texture2D);
    assert_eq!(module.type_name(tex), "texture2D");
}
