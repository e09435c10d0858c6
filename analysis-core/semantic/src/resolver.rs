use std::fmt;
use std::sync::Arc;

use files::UnitId;
use syntax::{SyntaxNode, SyntaxNodePtr};

use crate::{
    BodyTree, ResolvePhase, SemanticDecl, SemanticUnit, SourceUnit, designation::DesignationPath,
};

/// Errors from the resolution collaborator. Cloneable so one failed
/// computation can be reported to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Cancelled,
    MissingSemantic { ptr: SyntaxNodePtr },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Cancelled => write!(f, "resolution was cancelled"),
            ResolveError::MissingSemantic { ptr } => {
                write!(f, "no semantic declaration at {:?}", ptr.text_range())
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// The resolution collaborator of the structure cache. Implementations own
/// semantic units and drive declarations through their phases; the cache
/// only observes the results.
pub trait Resolver: Send + Sync {
    /// The parsed source of `unit` at the revision its semantic view was
    /// built from.
    fn source_unit(&self, unit: UnitId) -> Result<SourceUnit, ResolveError>;

    /// The semantic view of `unit` at its current revision.
    fn semantic_unit(&self, unit: UnitId) -> Result<Arc<SemanticUnit>, ResolveError>;

    /// The semantic declaration built from the syntax node behind `ptr`,
    /// if the unit has one there.
    fn semantic_for(
        &self,
        unit: UnitId,
        ptr: SyntaxNodePtr,
    ) -> Result<Option<Arc<SemanticDecl>>, ResolveError>;

    /// Advances `decl` to at least `phase`, filling signature slots and the
    /// body slot as the phases require.
    fn resolve_to(
        &self,
        unit: UnitId,
        decl: &Arc<SemanticDecl>,
        phase: ResolvePhase,
    ) -> Result<(), ResolveError>;

    /// Resolves the body of a patched declaration against `syntax`, a node
    /// from a newer revision than the one the unit was built from. The
    /// designation supplies the scope chain; nothing outside `decl` is
    /// touched.
    fn resolve_body_on_air(
        &self,
        unit: UnitId,
        decl: &Arc<SemanticDecl>,
        designation: &DesignationPath,
        syntax: &SyntaxNode,
    ) -> Result<Arc<BodyTree>, ResolveError>;
}
