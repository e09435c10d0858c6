use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use semantic::{
    DeclKind, SemanticDecl, SemanticUnit, SymbolId, TypeRef, designation::DesignationPath,
};

pub(crate) const BUILTIN_TYPES: &[&str] = &["Int", "String", "Boolean", "Unit"];

#[derive(Debug, Clone)]
pub(crate) struct ScopeEntry {
    pub(crate) symbol: Option<SymbolId>,
    pub(crate) ty: TypeRef,
}

/// The names visible to a declaration body: unit top-levels, members of the
/// enclosing classes, and the declaration's own parameters. Later insertions
/// shadow earlier ones, so inner scopes win.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    values: FxHashMap<SmolStr, ScopeEntry>,
}

impl Scope {
    pub(crate) fn lookup(&self, name: &str) -> Option<&ScopeEntry> {
        self.values.get(name)
    }

    fn add_decl(&mut self, decl: &SemanticDecl) {
        let Some(name) = decl.name.clone() else { return };
        let entry = match decl.kind {
            DeclKind::Function | DeclKind::Property | DeclKind::TypeAlias => {
                ScopeEntry { symbol: Some(decl.symbol), ty: decl.declared_type.get() }
            }
            DeclKind::Class(_) => {
                ScopeEntry { symbol: Some(decl.symbol), ty: TypeRef::Named(name.clone()) }
            }
            DeclKind::PrimaryConstructor | DeclKind::Initializer | DeclKind::DanglingModifiers => {
                return;
            }
        };
        self.values.insert(name, entry);
    }
}

pub(crate) fn body_scope(
    semantic: &SemanticUnit,
    designation: &DesignationPath,
    decl: &SemanticDecl,
) -> Scope {
    let mut scope = Scope::default();
    for declaration in &semantic.declarations {
        scope.add_decl(declaration);
    }
    for class in &designation.path {
        for member in &class.members {
            scope.add_decl(member);
        }
    }
    for parameter in &decl.parameters {
        if let Some(name) = parameter.name.clone() {
            scope.values.insert(name, ScopeEntry { symbol: None, ty: parameter.ty.get() });
        }
    }
    if let Some(setter) = &decl.setter {
        for parameter in &setter.parameters {
            if let Some(name) = parameter.name.clone() {
                let ty = match parameter.ty.get() {
                    TypeRef::Unknown => decl.declared_type.get(),
                    ty => ty,
                };
                scope.values.insert(name, ScopeEntry { symbol: None, ty });
            }
        }
    }
    scope
}

/// The type names a signature may refer to.
pub(crate) fn type_scope(semantic: &SemanticUnit, decl: &SemanticDecl) -> FxHashSet<SmolStr> {
    let mut types: FxHashSet<SmolStr> =
        BUILTIN_TYPES.iter().map(|name| SmolStr::new(name)).collect();
    for declaration in &semantic.declarations {
        if matches!(declaration.kind, DeclKind::Class(_) | DeclKind::TypeAlias) {
            if let Some(name) = declaration.name.clone() {
                types.insert(name);
            }
        }
    }
    for parameter in &decl.type_parameters {
        types.insert(parameter.clone());
    }
    types
}
