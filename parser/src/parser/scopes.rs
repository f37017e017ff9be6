use gfxsl_ast::*;
use std::collections::HashMap;

/// Name lookup tables for the module under construction
#[derive(Debug, Default, Clone)]
pub struct Scopes {
    functions: HashMap<String, FunctionId>,
    textures: HashMap<String, TextureId>,
    globals: HashMap<String, VariableId>,

    /// Local scopes of the function being parsed, innermost last
    locals: Vec<HashMap<String, VariableId>>,

    /// The function being parsed
    pub current_function: Option<FunctionId>,

    /// Number of loops around the current statement
    pub loop_depth: u32,

    /// Number of switch statements around the current statement
    pub switch_depth: u32,
}

/// Result of looking up a name used in an expression
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Symbol {
    Variable(VariableId),
    Function(FunctionId),
    Texture(TextureId),
}

impl Scopes {
    pub fn is_root_name_used(&self, name: &str) -> bool {
        self.functions.contains_key(name)
            || self.textures.contains_key(name)
            || self.globals.contains_key(name)
    }

    pub fn add_function(&mut self, name: &str, id: FunctionId) {
        self.functions.insert(name.to_string(), id);
    }

    pub fn add_texture(&mut self, name: &str, id: TextureId) {
        self.textures.insert(name.to_string(), id);
    }

    pub fn add_global(&mut self, name: &str, id: VariableId) {
        self.globals.insert(name.to_string(), id);
    }

    /// Enter a new local scope
    pub fn push(&mut self) {
        self.locals.push(HashMap::new());
    }

    /// Leave the innermost local scope
    pub fn pop(&mut self) {
        self.locals.pop();
    }

    /// Check if a name is declared in the innermost local scope
    pub fn is_local_defined(&self, name: &str) -> bool {
        self.locals
            .last()
            .map(|scope| scope.contains_key(name))
            .unwrap_or(false)
    }

    /// Add a local variable to the innermost scope
    pub fn add_local(&mut self, name: &str, id: VariableId) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    /// Find a symbol by name, searching local scopes from the innermost outwards
    pub fn find(&self, name: &str) -> Option<Symbol> {
        for scope in self.locals.iter().rev() {
            if let Some(id) = scope.get(name) {
                return Some(Symbol::Variable(*id));
            }
        }
        if let Some(id) = self.globals.get(name) {
            return Some(Symbol::Variable(*id));
        }
        if let Some(id) = self.functions.get(name) {
            return Some(Symbol::Function(*id));
        }
        self.textures.get(name).map(|id| Symbol::Texture(*id))
    }
}

#[test]
fn test_scope_shadowing() {
    let mut scopes = Scopes::default();
    scopes.add_global("a", VariableId(0));
    scopes.push();
    scopes.add_local("a", VariableId(1));
    scopes.push();
    assert_eq!(scopes.find("a"), Some(Symbol::Variable(VariableId(1))));
    assert!(!scopes.is_local_defined("a"));
    scopes.pop();
    assert!(scopes.is_local_defined("a"));
    scopes.pop();
    assert_eq!(scopes.find("a"), Some(Symbol::Variable(VariableId(0))));
    assert_eq!(scopes.find("b"), None);
}
