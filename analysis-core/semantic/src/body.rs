use la_arena::{Arena, Idx};
use smol_str::SmolStr;
use syntax::SyntaxNodePtr;

use crate::{Diagnostic, SymbolId, TypeRef};

pub type BodyNodeId = Idx<BodyNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Multiply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyNodeKind {
    Literal,
    NameRef { name: SmolStr, resolved: Option<SymbolId> },
    Call { callee: BodyNodeId, arguments: Vec<BodyNodeId> },
    Binary { op: BinaryOp, lhs: BodyNodeId, rhs: BodyNodeId },
    Paren { inner: BodyNodeId },
    Return { value: Option<BodyNodeId> },
    Block { statements: Vec<BodyNodeId> },
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyNode {
    pub kind: BodyNodeKind,
    pub ptr: SyntaxNodePtr,
    pub ty: TypeRef,
}

/// A resolved expression body. The mapping associates every syntax node the
/// body was built from with its semantic node, which is what syntax-based
/// lookups walk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BodyTree {
    nodes: Arena<BodyNode>,
    root: Option<BodyNodeId>,
    mapping: Vec<(SyntaxNodePtr, BodyNodeId)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BodyTree {
    pub fn alloc(&mut self, node: BodyNode) -> BodyNodeId {
        let ptr = node.ptr;
        let id = self.nodes.alloc(node);
        self.mapping.push((ptr, id));
        id
    }

    pub fn set_root(&mut self, root: BodyNodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<BodyNodeId> {
        self.root
    }

    pub fn node(&self, id: BodyNodeId) -> &BodyNode {
        &self.nodes[id]
    }

    pub fn node_for_ptr(&self, ptr: SyntaxNodePtr) -> Option<BodyNodeId> {
        self.mapping
            .iter()
            .find_map(|&(mapped, id)| if mapped == ptr { Some(id) } else { None })
    }

    pub fn mapping(&self) -> impl Iterator<Item = (SyntaxNodePtr, BodyNodeId)> + '_ {
        self.mapping.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
