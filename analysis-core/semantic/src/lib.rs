//! The semantic data model: lazily resolved declarations, expression bodies,
//! and the [`Resolver`] collaborator that drives resolution.

use std::sync::Arc;

use files::UnitId;
use rowan::GreenNode;
use syntax::SyntaxNode;

mod body;
mod decl;
mod diagnostic;
mod phase;
mod resolver;
mod types;

pub mod designation;
pub mod raw;

pub use body::*;
pub use decl::*;
pub use diagnostic::*;
pub use phase::*;
pub use resolver::*;
pub use types::*;

/// A parsed compilation unit pinned at a revision. The green node is shared
/// across threads; syntax nodes are re-rooted per consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub id: UnitId,
    pub path: Arc<str>,
    green: GreenNode,
}

impl SourceUnit {
    pub fn new(id: UnitId, path: Arc<str>, green: GreenNode) -> SourceUnit {
        SourceUnit { id, path, green }
    }

    pub fn green(&self) -> GreenNode {
        self.green.clone()
    }

    pub fn syntax_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }
}
