use std::fmt;
use std::sync::Arc;

use semantic::ResolveError;
use syntax::SyntaxNodePtr;

/// Errors from structure cache operations. Cloneable so a failed build can
/// be reported to every thread waiting on the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// The cache and the unit disagree, e.g. a key that no longer resolves
    /// to a container in the current revision.
    Consistency { message: Arc<str>, node: Option<SyntaxNodePtr> },
    Resolve(ResolveError),
}

impl StructureError {
    pub(crate) fn consistency(message: impl Into<Arc<str>>) -> StructureError {
        StructureError::Consistency { message: message.into(), node: None }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::Consistency { message, .. } => write!(f, "{message}"),
            StructureError::Resolve(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for StructureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StructureError::Consistency { .. } => None,
            StructureError::Resolve(error) => Some(error),
        }
    }
}

impl From<ResolveError> for StructureError {
    fn from(error: ResolveError) -> StructureError {
        StructureError::Resolve(error)
    }
}
