//! Designations locate a declaration inside its unit as the chain of
//! enclosing classes leading to it. Resolution of a single declaration walks
//! this chain instead of the whole unit.

use std::sync::Arc;

use crate::{DeclKind, SemanticDecl, SemanticUnit};

#[derive(Debug, Clone)]
pub struct DesignationPath {
    /// Enclosing class declarations, outermost first.
    pub path: Vec<Arc<SemanticDecl>>,
    pub target: Arc<SemanticDecl>,
}

impl DesignationPath {
    /// Locates `target` in `unit` by declaration identity.
    pub fn for_decl(unit: &SemanticUnit, target: &Arc<SemanticDecl>) -> Option<DesignationPath> {
        let mut path = vec![];
        for declaration in &unit.declarations {
            if let Some(designation) = locate(declaration, target, &mut path) {
                return Some(designation);
            }
        }
        None
    }
}

fn locate(
    current: &Arc<SemanticDecl>,
    target: &Arc<SemanticDecl>,
    path: &mut Vec<Arc<SemanticDecl>>,
) -> Option<DesignationPath> {
    if Arc::ptr_eq(current, target) {
        return Some(DesignationPath { path: path.clone(), target: Arc::clone(target) });
    }
    if !matches!(current.kind, DeclKind::Class(_)) {
        return None;
    }
    path.push(Arc::clone(current));
    for member in &current.members {
        if let Some(designation) = locate(member, target, path) {
            path.pop();
            return Some(designation);
        }
    }
    path.pop();
    None
}
