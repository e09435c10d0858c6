//! The reference [`Resolver`] implementation: owns source units, builds
//! semantic units from syntax, and drives declarations through their
//! resolution phases.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use files::{UnitId, Units};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use semantic::{
    BodyTree, DeclKind, Diagnostic, ResolveError, ResolvePhase, Resolver, SemanticDecl,
    SemanticUnit, SourceUnit, TypeRef, WrittenType, designation::DesignationPath, raw,
};
use smol_str::SmolStr;
use syntax::SyntaxNode;

mod lower;
mod scope;

#[derive(Clone)]
struct Memo {
    source: SourceUnit,
    semantic: Arc<SemanticUnit>,
}

#[derive(Default)]
pub struct LumenResolver {
    units: RwLock<Units>,
    memo: Mutex<FxHashMap<UnitId, Memo>>,
    unit_builds: AtomicUsize,
    body_resolutions: AtomicUsize,
}

impl LumenResolver {
    pub fn new() -> LumenResolver {
        LumenResolver::default()
    }

    /// Inserts or replaces the content of a unit. Replacing drops the memoized
    /// semantic view, so the next access rebuilds against the new revision.
    pub fn set_source(&self, path: impl AsRef<str>, content: impl Into<Arc<str>>) -> UnitId {
        let id = self.units.write().insert(path, content);
        self.memo.lock().remove(&id);
        id
    }

    /// How many times a semantic unit was built from scratch.
    pub fn unit_build_count(&self) -> usize {
        self.unit_builds.load(Ordering::Relaxed)
    }

    /// How many declaration bodies were resolved, on-air resolutions included.
    pub fn body_resolution_count(&self) -> usize {
        self.body_resolutions.load(Ordering::Relaxed)
    }

    fn ensure_unit(&self, unit: UnitId) -> Result<Memo, ResolveError> {
        let mut memo = self.memo.lock();
        if let Some(entry) = memo.get(&unit) {
            return Ok(entry.clone());
        }

        let (path, content) = {
            let units = self.units.read();
            (units.path(unit), units.content(unit))
        };
        let (parsed, errors) = parsing::parse_source(&content);
        let diagnostics = errors
            .iter()
            .map(|error| Diagnostic::at_offset(error.offset, Arc::clone(&error.message)))
            .collect();
        let semantic = Arc::new(raw::build_unit(unit, &parsed.cst(), diagnostics));
        let source = SourceUnit::new(unit, path, parsed.green());

        let entry = Memo { source, semantic };
        memo.insert(unit, entry.clone());
        self.unit_builds.fetch_add(1, Ordering::Relaxed);
        Ok(entry)
    }

    fn resolve_written(
        &self,
        types: &FxHashSet<SmolStr>,
        written: &WrittenType,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypeRef {
        match &written.name {
            Some(name) if types.contains(name) => TypeRef::Named(name.clone()),
            Some(name) => {
                diagnostics.push(Diagnostic::error(
                    written.ptr.text_range(),
                    format!("unresolved type '{name}'"),
                ));
                TypeRef::Error
            }
            None => {
                diagnostics
                    .push(Diagnostic::error(written.ptr.text_range(), "expected a type name"));
                TypeRef::Error
            }
        }
    }

    fn resolve_signature(&self, memo: &Memo, decl: &Arc<SemanticDecl>) {
        let types = scope::type_scope(&memo.semantic, decl);
        let mut diagnostics = vec![];

        let declared = match &decl.written_type {
            Some(written) => self.resolve_written(&types, written, &mut diagnostics),
            None => match decl.kind {
                DeclKind::Function | DeclKind::Initializer => TypeRef::Unit,
                _ => TypeRef::Unknown,
            },
        };
        decl.declared_type.set(declared);

        for parameter in &decl.parameters {
            if let Some(written) = &parameter.written_type {
                parameter.ty.set(self.resolve_written(&types, written, &mut diagnostics));
            }
        }
        for supertype in &decl.supertypes {
            supertype.ty.set(self.resolve_written(&types, &supertype.written, &mut diagnostics));
        }

        *decl.diagnostics.write() = diagnostics;
        decl.phase.advance(ResolvePhase::SignatureResolved);
    }

    /// Parameter types of the primary constructor resolve with the class
    /// signature; a val/var parameter hands its type to the property it
    /// declares, so the property needs no second resolution pass.
    fn resolve_constructor(&self, memo: &Memo, class: &Arc<SemanticDecl>) {
        let Some(constructor) = class.primary_constructor() else { return };
        if !constructor.phase.is_at_least(ResolvePhase::SignatureResolved) {
            self.resolve_signature(memo, constructor);
        }
        for parameter in &constructor.parameters {
            if !parameter.is_property {
                continue;
            }
            let Some(property) = class.member_by_ptr(parameter.ptr) else { continue };
            if property.phase.is_at_least(ResolvePhase::SignatureResolved) {
                continue;
            }
            property.declared_type.set(parameter.ty.get());
            property.phase.advance(ResolvePhase::SignatureResolved);
        }
    }

    /// Scopes read the resolved type slots of the declarations they expose;
    /// those signatures resolve first so a body never sees a raw sibling.
    /// Properties without a written type still read as Unknown until their
    /// own body resolves.
    fn ensure_scope_signatures(&self, memo: &Memo, designation: &DesignationPath) {
        let contributors = memo
            .semantic
            .declarations
            .iter()
            .chain(designation.path.iter().flat_map(|class| class.members.iter()));
        for declaration in contributors {
            let reads_slot = matches!(
                declaration.kind,
                DeclKind::Function | DeclKind::Property | DeclKind::TypeAlias
            );
            if reads_slot && !declaration.phase.is_at_least(ResolvePhase::SignatureResolved) {
                self.resolve_signature(memo, declaration);
            }
        }
    }

    fn lower_and_store(
        &self,
        memo: &Memo,
        decl: &Arc<SemanticDecl>,
        designation: &DesignationPath,
        syntax: &SyntaxNode,
    ) -> Arc<BodyTree> {
        self.ensure_scope_signatures(memo, designation);
        let scope = scope::body_scope(&memo.semantic, designation, decl);
        let tree = Arc::new(lower::lower_decl_body(&scope, syntax));

        // Properties without a written type take the type of their body.
        if decl.declared_type.get() == TypeRef::Unknown {
            if let Some(root) = tree.root() {
                decl.declared_type.set(tree.node(root).ty.clone());
            }
        }

        *decl.body.write() = Some(Arc::clone(&tree));
        decl.phase.advance(ResolvePhase::BodyResolved);
        self.body_resolutions.fetch_add(1, Ordering::Relaxed);
        tree
    }
}

impl Resolver for LumenResolver {
    fn source_unit(&self, unit: UnitId) -> Result<SourceUnit, ResolveError> {
        Ok(self.ensure_unit(unit)?.source)
    }

    fn semantic_unit(&self, unit: UnitId) -> Result<Arc<SemanticUnit>, ResolveError> {
        Ok(self.ensure_unit(unit)?.semantic)
    }

    fn semantic_for(
        &self,
        unit: UnitId,
        ptr: syntax::SyntaxNodePtr,
    ) -> Result<Option<Arc<SemanticDecl>>, ResolveError> {
        Ok(self.ensure_unit(unit)?.semantic.decl_by_ptr(ptr).cloned())
    }

    fn resolve_to(
        &self,
        unit: UnitId,
        decl: &Arc<SemanticDecl>,
        phase: ResolvePhase,
    ) -> Result<(), ResolveError> {
        if decl.phase.is_at_least(phase) {
            return Ok(());
        }
        let memo = self.ensure_unit(unit)?;

        if phase >= ResolvePhase::SignatureResolved
            && !decl.phase.is_at_least(ResolvePhase::SignatureResolved)
        {
            self.resolve_signature(&memo, decl);
            if matches!(decl.kind, DeclKind::Class(_)) {
                self.resolve_constructor(&memo, decl);
            }
        }

        if phase >= ResolvePhase::BodyResolved
            && !decl.phase.is_at_least(ResolvePhase::BodyResolved)
        {
            let root = memo.source.syntax_node();
            let syntax = decl
                .ptr
                .try_to_node(&root)
                .ok_or(ResolveError::MissingSemantic { ptr: decl.ptr })?;
            let designation = DesignationPath::for_decl(&memo.semantic, decl)
                .ok_or(ResolveError::MissingSemantic { ptr: decl.ptr })?;
            self.lower_and_store(&memo, decl, &designation, &syntax);
        }

        Ok(())
    }

    fn resolve_body_on_air(
        &self,
        unit: UnitId,
        decl: &Arc<SemanticDecl>,
        designation: &DesignationPath,
        syntax: &SyntaxNode,
    ) -> Result<Arc<BodyTree>, ResolveError> {
        let memo = self.ensure_unit(unit)?;
        if !decl.phase.is_at_least(ResolvePhase::SignatureResolved) {
            self.resolve_signature(&memo, decl);
        }
        Ok(self.lower_and_store(&memo, decl, designation, syntax))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use semantic::{
        BodyNodeKind, DeclKind, ResolvePhase, Resolver, TypeRef, designation::DesignationPath,
    };

    use crate::LumenResolver;

    #[test]
    fn test_semantic_unit_is_memoized() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source("./src/Main.lm", "fun f(): Int = 1");
        let first = resolver.semantic_unit(unit).unwrap();
        let second = resolver.semantic_unit(unit).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.unit_build_count(), 1);

        resolver.set_source("./src/Main.lm", "fun f(): Int = 2");
        let third = resolver.semantic_unit(unit).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(resolver.unit_build_count(), 2);
    }

    #[test]
    fn test_signature_resolution() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source(
            "./src/Main.lm",
            "fun f(x: Int): Int = x\nfun g(): Missing {}\nval v = 1",
        );
        let semantic = resolver.semantic_unit(unit).unwrap();

        let f = &semantic.declarations[0];
        resolver.resolve_to(unit, f, ResolvePhase::SignatureResolved).unwrap();
        assert_eq!(f.declared_type.get(), TypeRef::Named("Int".into()));
        assert_eq!(f.parameters[0].ty.get(), TypeRef::Named("Int".into()));
        assert!(f.signature_diagnostics().is_empty());

        let g = &semantic.declarations[1];
        resolver.resolve_to(unit, g, ResolvePhase::SignatureResolved).unwrap();
        assert_eq!(g.declared_type.get(), TypeRef::Error);
        assert_eq!(g.signature_diagnostics().len(), 1);

        // A property without a written type takes the type of its body.
        let v = &semantic.declarations[2];
        assert_eq!(v.kind, DeclKind::Property);
        resolver.resolve_to(unit, v, ResolvePhase::BodyResolved).unwrap();
        assert_eq!(v.declared_type.get(), TypeRef::Named("Int".into()));
    }

    #[test]
    fn test_body_resolution() {
        let resolver = LumenResolver::new();
        let unit = resolver
            .set_source("./src/Main.lm", "fun helper(): Int = 1\nfun f(x: Int): Int = helper() + unknown");
        let semantic = resolver.semantic_unit(unit).unwrap();

        let helper = &semantic.declarations[0];
        resolver.resolve_to(unit, helper, ResolvePhase::SignatureResolved).unwrap();

        let f = &semantic.declarations[1];
        resolver.resolve_to(unit, f, ResolvePhase::BodyResolved).unwrap();
        assert_eq!(f.phase.load(), ResolvePhase::BodyResolved);

        let body = f.body.read().clone().unwrap();
        assert_eq!(body.diagnostics.len(), 1);
        assert!(body.diagnostics[0].message.contains("unknown"));

        let root = body.root().unwrap();
        let BodyNodeKind::Binary { lhs, .. } = &body.node(root).kind else {
            panic!("expected a binary body");
        };
        let BodyNodeKind::Call { callee, .. } = &body.node(*lhs).kind else {
            panic!("expected a call");
        };
        let BodyNodeKind::NameRef { resolved, .. } = &body.node(*callee).kind else {
            panic!("expected a name reference");
        };
        assert_eq!(*resolved, Some(helper.symbol));
        assert_eq!(body.node(*lhs).ty, TypeRef::Named("Int".into()));
    }

    #[test]
    fn test_body_resolves_sibling_signatures_on_demand() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source("./src/Main.lm", "val a: Int = 1\nfun f(): Int = a");
        let semantic = resolver.semantic_unit(unit).unwrap();

        // `a` is still raw when `f`'s body resolves; its signature must be
        // pulled in rather than read as Unknown.
        let f = &semantic.declarations[1];
        resolver.resolve_to(unit, f, ResolvePhase::BodyResolved).unwrap();

        let body = f.body.read().clone().unwrap();
        assert!(body.diagnostics.is_empty());
        let root = body.root().unwrap();
        assert_eq!(body.node(root).ty, TypeRef::Named("Int".into()));
    }

    #[test]
    fn test_constructor_resolves_supercall_arguments() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source(
            "./src/Main.lm",
            "class Base\nclass C(val n: Int): Base(n + missing)",
        );
        let semantic = resolver.semantic_unit(unit).unwrap();
        let c = &semantic.declarations[1];
        resolver.resolve_to(unit, c, ResolvePhase::SignatureResolved).unwrap();

        let constructor = c.primary_constructor().unwrap();
        assert_eq!(constructor.parameters[0].ty.get(), TypeRef::Named("Int".into()));

        // The synthesized property takes the parameter's resolved type.
        let n = c.members.iter().find(|member| member.kind == DeclKind::Property).unwrap();
        assert_eq!(n.declared_type.get(), TypeRef::Named("Int".into()));
        assert_eq!(n.phase.load(), ResolvePhase::SignatureResolved);

        // Supercall arguments resolve as the constructor's body, against the
        // constructor's parameter scope.
        resolver.resolve_to(unit, constructor, ResolvePhase::BodyResolved).unwrap();
        let body = constructor.body.read().clone().unwrap();
        assert_eq!(body.diagnostics.len(), 1);
        assert!(body.diagnostics[0].message.contains("missing"));
    }

    #[test]
    fn test_member_body_sees_class_scope() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source(
            "./src/Main.lm",
            "class C(val n: Int) {\n    fun double(): Int = n + n\n}",
        );
        let semantic = resolver.semantic_unit(unit).unwrap();
        let c = &semantic.declarations[0];
        let double = c
            .members
            .iter()
            .find(|member| member.name.as_deref() == Some("double"))
            .unwrap();
        resolver.resolve_to(unit, double, ResolvePhase::BodyResolved).unwrap();
        let body = double.body.read().clone().unwrap();
        assert!(body.diagnostics.is_empty());
    }

    #[test]
    fn test_on_air_resolution_uses_new_syntax() {
        let resolver = LumenResolver::new();
        let unit = resolver.set_source("./src/Main.lm", "fun f(): Int = 1");
        let semantic = resolver.semantic_unit(unit).unwrap();
        let f = Arc::clone(&semantic.declarations[0]);
        resolver.resolve_to(unit, &f, ResolvePhase::BodyResolved).unwrap();

        // A newer revision of the same declaration, resolved on air against
        // the base unit's scope.
        let (parsed, _) = parsing::parse_source("fun f(): Int = 1 + 2");
        let node = parsed.syntax_node().first_child().unwrap();
        let patched = semantic::raw::rebuild_for_reanalysis(&f, &node).unwrap();
        let designation = DesignationPath { path: vec![], target: Arc::clone(&patched) };
        let body = resolver.resolve_body_on_air(unit, &patched, &designation, &node).unwrap();

        let root = body.root().unwrap();
        assert!(matches!(body.node(root).kind, BodyNodeKind::Binary { .. }));
        assert_eq!(patched.phase.load(), ResolvePhase::BodyResolved);
        assert_eq!(resolver.body_resolution_count(), 2);
    }
}
