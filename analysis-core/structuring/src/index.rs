//! Per-element index from syntax nodes to the semantic objects they belong
//! to. Entries are keyed by kind and container-relative range, so an index
//! built at one revision still answers for later revisions as long as the
//! container's own text is unchanged.

use std::sync::Arc;

use rowan::TextRange;
use rustc_hash::FxHashMap;
use semantic::{AccessorKind, BodyNodeId, BodyTree, SemanticDecl, SemanticUnit};
use syntax::{DeclPath, SyntaxKind, SyntaxNode};

/// What a syntax node maps to in the semantic model.
#[derive(Debug, Clone)]
pub enum SemanticRef {
    Unit(Arc<SemanticUnit>),
    Declaration(Arc<SemanticDecl>),
    Annotation { owner: Arc<SemanticDecl>, index: usize },
    Parameter { owner: Arc<SemanticDecl>, index: usize },
    Accessor { owner: Arc<SemanticDecl>, kind: AccessorKind },
    BodyNode { owner: Arc<SemanticDecl>, node: BodyNodeId },
}

#[derive(Debug)]
pub struct StructureIndex {
    key: DeclPath,
    anchor_kind: SyntaxKind,
    entries: FxHashMap<(SyntaxKind, TextRange), SemanticRef>,
}

impl StructureIndex {
    pub(crate) fn new(key: DeclPath, anchor: &SyntaxNode) -> StructureIndex {
        StructureIndex { key, anchor_kind: anchor.kind(), entries: FxHashMap::default() }
    }

    pub(crate) fn record(&mut self, anchor: &SyntaxNode, node: &SyntaxNode, semantic: SemanticRef) {
        let relative = relative_range(anchor, node);
        self.entries.insert((node.kind(), relative), semantic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The anchor ancestor of `node` in the caller's tree: the node this
    /// index's container key denotes there.
    fn anchor_of(&self, node: &SyntaxNode) -> Option<SyntaxNode> {
        node.ancestors()
            .find(|ancestor| ancestor.kind() == self.anchor_kind && DeclPath::of(ancestor) == self.key)
    }

    /// The semantic object recorded for exactly this node, if any. `node`
    /// may come from any revision whose container text matches the one the
    /// index was built from.
    pub fn semantic_node_for(&self, node: &SyntaxNode) -> Option<SemanticRef> {
        let anchor = self.anchor_of(node)?;
        let relative = relative_range(&anchor, node);
        self.entries.get(&(node.kind(), relative)).cloned()
    }

    /// Walks up from `node` to the nearest ancestor with a recorded semantic
    /// object, stopping at the container boundary.
    pub fn nearest_mapped_ancestor(&self, node: &SyntaxNode) -> Option<(SyntaxNode, SemanticRef)> {
        let anchor = self.anchor_of(node)?;
        for ancestor in node.ancestors() {
            let relative = relative_range(&anchor, &ancestor);
            if let Some(semantic) = self.entries.get(&(ancestor.kind(), relative)) {
                return Some((ancestor.clone(), semantic.clone()));
            }
            if ancestor == anchor {
                break;
            }
        }
        None
    }
}

fn relative_range(anchor: &SyntaxNode, node: &SyntaxNode) -> TextRange {
    let range = node.text_range();
    let base = anchor.text_range().start();
    debug_assert!(range.start() >= base, "node precedes its anchor");
    range - base
}
