use std::hash::{Hash, Hasher};
use std::sync::Arc;

use files::UnitId;
use semantic::{
    BodyTree, Diagnostic, ResolvePhase, Resolver, SemanticDecl, SemanticUnit,
    designation::DesignationPath, raw,
};
use syntax::{DeclPath, EditStamp, SyntaxNode, SyntaxNodePtr};

use crate::classify::{Container, ContainerKind, ReanalyzableKind};
use crate::diagnostics::DiagnosticsHolder;
use crate::error::StructureError;
use crate::index::{SemanticRef, StructureIndex};

/// Fields every element variant shares: its stable key, the container node
/// and content stamp of the revision it was built from, the syntax to
/// semantic index, and lazily computed diagnostics.
#[derive(Debug)]
pub struct ElementCore {
    pub key: DeclPath,
    pub container: SyntaxNodePtr,
    pub stamp: EditStamp,
    pub index: StructureIndex,
    pub diagnostics: DiagnosticsHolder,
}

#[derive(Debug)]
pub struct RootElement {
    pub core: ElementCore,
    pub semantic: Arc<SemanticUnit>,
}

#[derive(Debug)]
pub struct ClassElement {
    pub core: ElementCore,
    pub semantic: Arc<SemanticDecl>,
}

#[derive(Debug)]
pub struct PlainElement {
    pub core: ElementCore,
    pub semantic: Arc<SemanticDecl>,
}

#[derive(Debug)]
pub struct DanglingElement {
    pub core: ElementCore,
    pub semantic: Arc<SemanticDecl>,
}

#[derive(Debug)]
pub struct ReanalyzableElement {
    pub core: ElementCore,
    pub semantic: Arc<SemanticDecl>,
    pub kind: ReanalyzableKind,
    pub body: Arc<BodyTree>,
    pub(crate) designation: DesignationPath,
}

/// A cached structure element. Identity is the container key: two elements
/// for the same container compare equal even across revisions.
#[derive(Debug)]
pub enum StructureElement {
    Root(RootElement),
    Class(ClassElement),
    Plain(PlainElement),
    Dangling(DanglingElement),
    Reanalyzable(ReanalyzableElement),
}

impl StructureElement {
    pub fn core(&self) -> &ElementCore {
        match self {
            StructureElement::Root(element) => &element.core,
            StructureElement::Class(element) => &element.core,
            StructureElement::Plain(element) => &element.core,
            StructureElement::Dangling(element) => &element.core,
            StructureElement::Reanalyzable(element) => &element.core,
        }
    }

    pub fn key(&self) -> &DeclPath {
        &self.core().key
    }

    pub fn stamp(&self) -> EditStamp {
        self.core().stamp
    }

    pub fn container_ptr(&self) -> SyntaxNodePtr {
        self.core().container
    }

    pub fn index(&self) -> &StructureIndex {
        &self.core().index
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.core().diagnostics.get()
    }

    pub fn semantic_decl(&self) -> Option<&Arc<SemanticDecl>> {
        match self {
            StructureElement::Root(_) => None,
            StructureElement::Class(element) => Some(&element.semantic),
            StructureElement::Plain(element) => Some(&element.semantic),
            StructureElement::Dangling(element) => Some(&element.semantic),
            StructureElement::Reanalyzable(element) => Some(&element.semantic),
        }
    }

    pub fn is_reanalyzable(&self) -> bool {
        matches!(self, StructureElement::Reanalyzable(_))
    }
}

impl PartialEq for StructureElement {
    fn eq(&self, other: &StructureElement) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StructureElement {}

impl Hash for StructureElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

pub(crate) struct BuildContext<'a> {
    pub(crate) resolver: &'a Arc<dyn Resolver>,
    pub(crate) unit: UnitId,
    pub(crate) semantic: &'a Arc<SemanticUnit>,
    /// Root of the revision the build reads syntax from.
    pub(crate) root: &'a SyntaxNode,
}

impl BuildContext<'_> {
    fn decl_for(&self, node: &SyntaxNode) -> Result<Arc<SemanticDecl>, StructureError> {
        let ptr = SyntaxNodePtr::new(node);
        self.semantic
            .decl_by_ptr(ptr)
            .cloned()
            .ok_or(StructureError::Consistency {
                message: Arc::from("container has no semantic declaration"),
                node: Some(ptr),
            })
    }
}

pub(crate) fn build_element(
    ctx: &BuildContext<'_>,
    container: &Container,
    key: DeclPath,
) -> Result<StructureElement, StructureError> {
    match container.kind {
        ContainerKind::Root => build_root(ctx, key),
        ContainerKind::Class => build_class(ctx, &container.node, key),
        ContainerKind::Plain => build_plain(ctx, &container.node, key),
        ContainerKind::Dangling => build_dangling(ctx, &container.node, key),
        ContainerKind::Reanalyzable(kind) => build_reanalyzable(ctx, &container.node, key, kind),
    }
}

fn core_for(
    key: DeclPath,
    anchor: &SyntaxNode,
    index: StructureIndex,
    diagnostics: DiagnosticsHolder,
) -> ElementCore {
    ElementCore {
        key,
        container: SyntaxNodePtr::new(anchor),
        stamp: EditStamp::of(anchor),
        index,
        diagnostics,
    }
}

fn build_root(ctx: &BuildContext<'_>, key: DeclPath) -> Result<StructureElement, StructureError> {
    let semantic = Arc::clone(ctx.semantic);
    let anchor = ctx.root;

    // Declarations are not recorded here: each owns its own element, and the
    // indexes of distinct elements never overlap.
    let mut index = StructureIndex::new(key.clone(), anchor);
    index.record(anchor, anchor, SemanticRef::Unit(Arc::clone(&semantic)));

    let diagnostics = DiagnosticsHolder::eager(semantic.diagnostics.clone());
    let core = core_for(key, anchor, index, diagnostics);
    Ok(StructureElement::Root(RootElement { core, semantic }))
}

fn record_signature(
    index: &mut StructureIndex,
    anchor: &SyntaxNode,
    root: &SyntaxNode,
    decl: &Arc<SemanticDecl>,
) {
    index.record(anchor, anchor, SemanticRef::Declaration(Arc::clone(decl)));
    for (position, annotation) in decl.annotations.iter().enumerate() {
        if let Some(node) = annotation.ptr.try_to_node(root) {
            index.record(
                anchor,
                &node,
                SemanticRef::Annotation { owner: Arc::clone(decl), index: position },
            );
        }
    }
    for (position, parameter) in decl.parameters.iter().enumerate() {
        if let Some(node) = parameter.ptr.try_to_node(root) {
            index.record(
                anchor,
                &node,
                SemanticRef::Parameter { owner: Arc::clone(decl), index: position },
            );
        }
    }
    for accessor in decl.getter.iter().chain(decl.setter.iter()) {
        if let Some(node) = accessor.ptr.try_to_node(root) {
            index.record(
                anchor,
                &node,
                SemanticRef::Accessor { owner: Arc::clone(decl), kind: accessor.kind },
            );
        }
    }
}

fn record_body(
    index: &mut StructureIndex,
    anchor: &SyntaxNode,
    root: &SyntaxNode,
    owner: &Arc<SemanticDecl>,
    body: &BodyTree,
) {
    for (ptr, node_id) in body.mapping() {
        if let Some(node) = ptr.try_to_node(root) {
            index.record(
                anchor,
                &node,
                SemanticRef::BodyNode { owner: Arc::clone(owner), node: node_id },
            );
        }
    }
}

fn build_class(
    ctx: &BuildContext<'_>,
    anchor: &SyntaxNode,
    key: DeclPath,
) -> Result<StructureElement, StructureError> {
    let semantic = ctx.decl_for(anchor)?;
    ctx.resolver.resolve_to(ctx.unit, &semantic, ResolvePhase::SignatureResolved)?;

    // Supertype constructor-call arguments are expressions; they resolve as
    // the body of the primary constructor, or of the class itself when no
    // constructor syntax exists.
    let constructor = semantic.primary_constructor().cloned();
    let supercall_owner = constructor.clone().unwrap_or_else(|| Arc::clone(&semantic));
    let has_supercall_arguments =
        semantic.supertypes.iter().any(|supertype| supertype.arguments.is_some());
    if has_supercall_arguments {
        ctx.resolver.resolve_to(ctx.unit, &supercall_owner, ResolvePhase::BodyResolved)?;
    }
    let supercall_body = supercall_owner.body.read().clone();

    let mut index = StructureIndex::new(key.clone(), anchor);
    record_signature(&mut index, anchor, ctx.root, &semantic);

    // The constructor and the properties its val/var parameters declare are
    // part of the class element, unlike ordinary members.
    if let Some(constructor) = &constructor {
        if let Some(node) = constructor.ptr.try_to_node(ctx.root) {
            index.record(anchor, &node, SemanticRef::Declaration(Arc::clone(constructor)));
        }
        for (position, parameter) in constructor.parameters.iter().enumerate() {
            let Some(node) = parameter.ptr.try_to_node(ctx.root) else { continue };
            let semantic_ref = match semantic.member_by_ptr(parameter.ptr) {
                Some(property) => SemanticRef::Declaration(Arc::clone(property)),
                None => {
                    SemanticRef::Parameter { owner: Arc::clone(constructor), index: position }
                }
            };
            index.record(anchor, &node, semantic_ref);
        }
    }

    for supertype in &semantic.supertypes {
        if let Some(arguments) = supertype.arguments {
            if let Some(node) = arguments.try_to_node(ctx.root) {
                index.record(
                    anchor,
                    &node,
                    SemanticRef::Declaration(Arc::clone(&supercall_owner)),
                );
            }
        }
    }
    if let Some(body) = &supercall_body {
        record_body(&mut index, anchor, ctx.root, &supercall_owner, body);
    }

    let diagnostics = {
        let semantic = Arc::clone(&semantic);
        let constructor = constructor.clone();
        let supercall_body = supercall_body.clone();
        DiagnosticsHolder::new(move || {
            let mut diagnostics = semantic.signature_diagnostics();
            if let Some(constructor) = &constructor {
                diagnostics.extend(constructor.signature_diagnostics());
            }
            if let Some(body) = &supercall_body {
                diagnostics.extend(body.diagnostics.iter().cloned());
            }
            diagnostics
        })
    };
    let core = core_for(key, anchor, index, diagnostics);
    Ok(StructureElement::Class(ClassElement { core, semantic }))
}

fn resolved_body(decl: &Arc<SemanticDecl>) -> Result<Arc<BodyTree>, StructureError> {
    decl.body.read().clone().ok_or_else(|| {
        StructureError::consistency("declaration reached BodyResolved without a body")
    })
}

fn decl_diagnostics(decl: &Arc<SemanticDecl>, body: Option<&Arc<BodyTree>>) -> DiagnosticsHolder {
    let decl = Arc::clone(decl);
    let body = body.map(Arc::clone);
    DiagnosticsHolder::new(move || {
        let mut diagnostics = decl.signature_diagnostics();
        if let Some(body) = &body {
            diagnostics.extend(body.diagnostics.iter().cloned());
        }
        diagnostics
    })
}

fn build_plain(
    ctx: &BuildContext<'_>,
    anchor: &SyntaxNode,
    key: DeclPath,
) -> Result<StructureElement, StructureError> {
    let semantic = ctx.decl_for(anchor)?;
    ctx.resolver.resolve_to(ctx.unit, &semantic, ResolvePhase::BodyResolved)?;
    let body = resolved_body(&semantic)?;

    let mut index = StructureIndex::new(key.clone(), anchor);
    record_signature(&mut index, anchor, ctx.root, &semantic);
    record_body(&mut index, anchor, ctx.root, &semantic, &body);

    let diagnostics = decl_diagnostics(&semantic, Some(&body));
    let core = core_for(key, anchor, index, diagnostics);
    Ok(StructureElement::Plain(PlainElement { core, semantic }))
}

fn build_dangling(
    ctx: &BuildContext<'_>,
    anchor: &SyntaxNode,
    key: DeclPath,
) -> Result<StructureElement, StructureError> {
    let semantic = ctx.decl_for(anchor)?;

    let mut index = StructureIndex::new(key.clone(), anchor);
    record_signature(&mut index, anchor, ctx.root, &semantic);

    let diagnostics = decl_diagnostics(&semantic, None);
    let core = core_for(key, anchor, index, diagnostics);
    Ok(StructureElement::Dangling(DanglingElement { core, semantic }))
}

fn build_reanalyzable(
    ctx: &BuildContext<'_>,
    anchor: &SyntaxNode,
    key: DeclPath,
    kind: ReanalyzableKind,
) -> Result<StructureElement, StructureError> {
    let semantic = ctx.decl_for(anchor)?;
    ctx.resolver.resolve_to(ctx.unit, &semantic, ResolvePhase::BodyResolved)?;
    let body = resolved_body(&semantic)?;

    let designation =
        DesignationPath::for_decl(ctx.semantic, &semantic).ok_or_else(|| {
            StructureError::consistency("declaration is not reachable in its unit")
        })?;

    let mut index = StructureIndex::new(key.clone(), anchor);
    record_signature(&mut index, anchor, ctx.root, &semantic);
    record_body(&mut index, anchor, ctx.root, &semantic, &body);

    let diagnostics = decl_diagnostics(&semantic, Some(&body));
    let core = core_for(key, anchor, index, diagnostics);
    Ok(StructureElement::Reanalyzable(ReanalyzableElement {
        core,
        semantic,
        kind,
        body,
        designation,
    }))
}

/// Copy-and-patch reanalysis of a body-only edit: rebuild the declaration
/// from the current syntax, carry the resolved signature over from the old
/// element, and resolve just the body on air. The enclosing scope chain is
/// reused from the old element's designation.
pub(crate) fn reanalyze_element(
    ctx: &BuildContext<'_>,
    old: &ReanalyzableElement,
    current: &SyntaxNode,
) -> Result<StructureElement, StructureError> {
    let patched = raw::rebuild_for_reanalysis(&old.semantic, current).ok_or_else(|| {
        StructureError::consistency("container no longer matches its cached declaration")
    })?;
    let designation =
        DesignationPath { path: old.designation.path.clone(), target: Arc::clone(&patched) };
    let body = ctx.resolver.resolve_body_on_air(ctx.unit, &patched, &designation, current)?;

    let current_root = current.ancestors().last().unwrap_or_else(|| current.clone());
    let key = old.core.key.clone();
    let mut index = StructureIndex::new(key.clone(), current);
    record_signature(&mut index, current, &current_root, &patched);
    record_body(&mut index, current, &current_root, &patched, &body);

    let diagnostics = decl_diagnostics(&patched, Some(&body));
    let core = core_for(key, current, index, diagnostics);
    Ok(StructureElement::Reanalyzable(ReanalyzableElement {
        core,
        semantic: patched,
        kind: old.kind,
        body,
        designation,
    }))
}
