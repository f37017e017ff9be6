use crate::*;
use std::collections::BTreeSet;

/// Set of declarations used by an entry point
///
/// Computed as a separate pass so the module is not mutated after parsing.
#[derive(PartialEq, Eq, Debug, Default, Clone)]
pub struct Reachability {
    pub functions: BTreeSet<FunctionId>,
    pub types: BTreeSet<TypeId>,
    pub textures: BTreeSet<TextureId>,
    pub globals: BTreeSet<VariableId>,
    pub system_values: BTreeSet<Semantic>,
    pub nodes: BTreeSet<NodeId>,
}

impl Reachability {
    /// Find everything reachable from an entry function
    pub fn compute(module: &Module, entry: FunctionId) -> Reachability {
        let mut reachability = Reachability::default();
        let mut pending = vec![entry];

        while let Some(id) = pending.pop() {
            if !reachability.functions.insert(id) {
                continue;
            }

            let function = module.get_function(id);
            reachability.types.insert(function.return_type);
            for param in module.params(id) {
                reachability.add_variable(module, param);
            }

            if let Some(body) = function.body {
                reachability.visit(module, body, &mut pending);
            }
        }

        reachability.close_types(module);
        reachability
    }

    fn add_variable(&mut self, module: &Module, variable: &Variable) {
        self.types.insert(variable.type_id);
        match variable.kind {
            VariableKind::SystemValue => {
                if let Some(semantic) = variable.semantic {
                    self.system_values.insert(semantic);
                }
            }
            VariableKind::Global => {
                if self.globals.insert(variable.id) {
                    if let Some(init) = global_initializer(module, variable.id) {
                        self.visit(module, init, &mut Vec::new());
                    }
                }
            }
            _ => {}
        }
    }

    fn visit(&mut self, module: &Module, id: NodeId, pending: &mut Vec<FunctionId>) {
        if !self.nodes.insert(id) {
            return;
        }
        self.types.insert(module.nodes.value_type(id).type_id);

        match module.nodes.get(id) {
            Node::FunctionCall(function, _) => pending.push(*function),
            Node::Variable(variable) | Node::VariableDeclaration(variable, _) => {
                self.add_variable(module, module.get_variable(*variable))
            }
            Node::Texture(texture) => {
                self.textures.insert(*texture);
            }
            Node::Cast(ty, _) => {
                self.types.insert(*ty);
            }
            _ => {}
        }

        for child in module.nodes.children(id) {
            self.visit(module, child, pending);
        }
    }

    /// Add the member types of every reachable struct
    fn close_types(&mut self, module: &Module) {
        let mut pending = self.types.iter().copied().collect::<Vec<_>>();
        while let Some(id) = pending.pop() {
            for member in module.members(id) {
                if self.types.insert(member.type_id) {
                    pending.push(member.type_id);
                }
            }
        }
    }

    /// Reachable struct declarations in declaration order
    pub fn structs<'m>(&self, module: &'m Module) -> Vec<&'m Struct> {
        module
            .structs
            .iter()
            .filter(|sd| self.types.contains(&sd.type_id))
            .collect()
    }

    /// Reachable functions in declaration order
    pub fn functions<'m>(&self, module: &'m Module) -> Vec<&'m Function> {
        self.functions.iter().map(|id| module.get_function(*id)).collect()
    }

    /// Reachable textures in declaration order
    pub fn textures<'m>(&self, module: &'m Module) -> Vec<&'m Texture> {
        self.textures.iter().map(|id| module.get_texture(*id)).collect()
    }
}

/// Find the initializer of a file scope constant
pub fn global_initializer(module: &Module, variable: VariableId) -> Option<NodeId> {
    module.roots.iter().find_map(|root| match module.nodes.get(*root) {
        Node::GlobalDeclaration(id, init) if *id == variable => Some(*init),
        _ => None,
    })
}
