use crate::*;
use gfxsl_text::{Located, SourceLocation};

/// Id to a node in a [NodeBuffer]
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct NodeId(pub u32);

/// A constant value written in source
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Literal {
    Bool(bool),
    Int(u64),
    UInt(u64),
    Float(f64),
}

/// Swizzle component selection
///
/// Components are stored as indices where `x` is 0 and `w` is 3.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct Swizzle(pub Vec<u8>);

/// A syntax tree node
#[derive(PartialEq, Debug, Clone)]
pub enum Node {
    Block(Vec<NodeId>),
    Expression(NodeId),
    VariableDeclaration(VariableId, Option<NodeId>),
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
    },
    Switch {
        value: NodeId,
        body: Vec<NodeId>,
    },
    Case(NodeId),
    Default,
    Return(Option<NodeId>),
    Break,
    Continue,
    Discard,
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    Ternary(NodeId, NodeId, NodeId),
    FunctionCall(FunctionId, Vec<NodeId>),
    IntrinsicCall(Intrinsic, Vec<NodeId>),
    Cast(TypeId, Vec<NodeId>),
    Variable(VariableId),
    Member(NodeId, VariableId),
    Swizzle(NodeId, Swizzle),
    Group(NodeId),
    Literal(Literal),
    Subscript(NodeId, NodeId),
    Texture(TextureId),
    FunctionDeclaration(FunctionId),
    StructDeclaration(StructId),
    TextureDeclaration(TextureId),
    GlobalDeclaration(VariableId, NodeId),
}

/// Type of an expression node
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct ValueType {
    pub type_id: TypeId,
    pub array: ArrayDims,
}

/// Arena of nodes for a single module
///
/// Each node stores the type it evaluates to. Statement nodes are typed as void.
#[derive(PartialEq, Debug, Default, Clone)]
pub struct NodeBuffer {
    nodes: Vec<Located<Node>>,
    types: Vec<ValueType>,
}

impl Swizzle {
    /// Component letters
    pub const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

    /// Parse a swizzle string using either `xyzw` or `rgba` letters
    pub fn parse(text: &str, component_count: u32) -> Option<Swizzle> {
        if text.is_empty() || text.len() > 4 {
            return None;
        }
        let xyzw = text.chars().all(|c| "xyzw".contains(c));
        let rgba = text.chars().all(|c| "rgba".contains(c));
        if !xyzw && !rgba {
            return None;
        }
        let mut components = Vec::with_capacity(text.len());
        for c in text.chars() {
            let index = match c {
                'x' | 'r' => 0,
                'y' | 'g' => 1,
                'z' | 'b' => 2,
                'w' | 'a' => 3,
                _ => return None,
            };
            if index >= component_count {
                return None;
            }
            components.push(index as u8);
        }
        Some(Swizzle(components))
    }

    /// If no component is selected twice
    pub fn is_writable(&self) -> bool {
        let mut seen = [false; 4];
        for c in &self.0 {
            if std::mem::replace(&mut seen[*c as usize], true) {
                return false;
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Swizzle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in &self.0 {
            write!(f, "{}", Swizzle::COMPONENTS[*c as usize])?;
        }
        Ok(())
    }
}

impl ValueType {
    pub const fn new(type_id: TypeId) -> Self {
        ValueType {
            type_id,
            array: ArrayDims::None,
        }
    }

    pub const fn with_array(type_id: TypeId, array: ArrayDims) -> Self {
        ValueType { type_id, array }
    }
}

impl NodeBuffer {
    /// Append a node to the arena
    pub fn add(&mut self, node: Node, location: SourceLocation, ty: ValueType) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Located::new(node, location));
        self.types.push(ty);
        id
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize].node
    }

    /// Get the source location of a node
    pub fn location(&self, id: NodeId) -> SourceLocation {
        self.nodes[id.0 as usize].location
    }

    /// Get the type an expression node evaluates to
    pub fn value_type(&self, id: NodeId) -> ValueType {
        self.types[id.0 as usize]
    }

    /// Replace a node in place
    ///
    /// Used when the body of a declaration is parsed after the declaration node was created.
    pub fn replace(&mut self, id: NodeId, node: Node) {
        self.nodes[id.0 as usize].node = node;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.types.clear();
    }

    /// Get the direct children of a node in evaluation order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id) {
            Node::Block(nodes) => nodes.clone(),
            Node::Expression(expr) => vec![*expr],
            Node::VariableDeclaration(_, init) => init.iter().copied().collect(),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![*condition, *then_branch];
                children.extend(else_branch);
                children
            }
            Node::While { condition, body } => vec![*condition, *body],
            Node::DoWhile { body, condition } => vec![*body, *condition],
            Node::For {
                init,
                condition,
                increment,
                body,
            } => init
                .iter()
                .chain(condition)
                .chain(increment)
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            Node::Switch { value, body } => std::iter::once(*value)
                .chain(body.iter().copied())
                .collect(),
            Node::Case(value) => vec![*value],
            Node::Return(value) => value.iter().copied().collect(),
            Node::Unary(_, expr) => vec![*expr],
            Node::Binary(_, left, right) => vec![*left, *right],
            Node::Ternary(cond, left, right) => vec![*cond, *left, *right],
            Node::FunctionCall(_, args) | Node::IntrinsicCall(_, args) | Node::Cast(_, args) => {
                args.clone()
            }
            Node::Member(object, _) | Node::Swizzle(object, _) => vec![*object],
            Node::Group(expr) => vec![*expr],
            Node::Subscript(object, index) => vec![*object, *index],
            Node::GlobalDeclaration(_, init) => vec![*init],
            Node::Default
            | Node::Break
            | Node::Continue
            | Node::Discard
            | Node::Variable(_)
            | Node::Literal(_)
            | Node::Texture(_)
            | Node::FunctionDeclaration(_)
            | Node::StructDeclaration(_)
            | Node::TextureDeclaration(_) => Vec::new(),
        }
    }
}

#[test]
fn test_swizzle_parse() {
    assert_eq!(Swizzle::parse("xy", 2), Some(Swizzle(vec![0, 1])));
    assert_eq!(Swizzle::parse("bgra", 4), Some(Swizzle(vec![2, 1, 0, 3])));
    assert_eq!(Swizzle::parse("xz", 2), None);
    assert_eq!(Swizzle::parse("xg", 4), None);
    assert_eq!(Swizzle::parse("xyzwx", 4), None);
    assert!(Swizzle::parse("xy", 4).unwrap().is_writable());
    assert!(!Swizzle::parse("xx", 4).unwrap().is_writable());
    assert_eq!(Swizzle::parse("abgr", 4).unwrap().to_string(), "wzyx");
}
