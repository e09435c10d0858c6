//! Raw construction of the semantic model from syntax. Everything here is
//! phase [`ResolvePhase::Raw`]: names and shapes are recorded, type slots
//! stay unknown until the resolver fills them.

use std::sync::Arc;

use files::UnitId;
use parking_lot::RwLock;
use rowan::ast::AstNode;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use syntax::{SyntaxNode, SyntaxNodePtr, cst};

use crate::{
    Accessor, AccessorKind, BackingField, ClassKind, DeclKind, Diagnostic, Modality, Parameter,
    PhaseCell, ResolvePhase, SemanticAnnotation, SemanticDecl, SemanticUnit, SuperTypeRef,
    SymbolId, TypeSlot, Visibility, WrittenType,
};

pub fn build_unit(
    id: UnitId,
    file: &cst::SourceFile,
    diagnostics: Vec<Diagnostic>,
) -> SemanticUnit {
    let mut declarations = vec![];
    for child in file.syntax().children() {
        if let Some(declaration) = cst::Declaration::cast(child.clone()) {
            declarations.push(build_declaration(&declaration));
        } else if let Some(list) = cst::ModifierList::cast(child) {
            declarations.push(build_dangling(&list));
        }
    }

    let mut by_ptr = FxHashMap::default();
    for declaration in &declarations {
        collect_by_ptr(declaration, &mut by_ptr);
    }

    SemanticUnit { id, declarations, by_ptr, diagnostics }
}

fn collect_by_ptr(
    decl: &Arc<SemanticDecl>,
    by_ptr: &mut FxHashMap<SyntaxNodePtr, Arc<SemanticDecl>>,
) {
    by_ptr.insert(decl.ptr, Arc::clone(decl));
    for member in &decl.members {
        collect_by_ptr(member, by_ptr);
    }
}

pub fn build_declaration(decl: &cst::Declaration) -> Arc<SemanticDecl> {
    Arc::new(build_declaration_value(decl))
}

/// A stand-alone modifier list still gets a declaration, so the rest of the
/// pipeline can attach an element and a diagnostic to it.
pub fn build_dangling(list: &cst::ModifierList) -> Arc<SemanticDecl> {
    let mut decl = empty_decl(DeclKind::DanglingModifiers, list.syntax());
    decl.annotations = annotations_of(Some(list.clone()));
    let range = list.syntax().text_range();
    decl.diagnostics =
        RwLock::new(vec![Diagnostic::error(range, "expected a declaration after modifiers")]);
    decl.phase = PhaseCell::new(ResolvePhase::SignatureResolved);
    Arc::new(decl)
}

fn empty_decl(kind: DeclKind, node: &SyntaxNode) -> SemanticDecl {
    SemanticDecl {
        symbol: SymbolId::fresh(),
        kind,
        name: None,
        ptr: SyntaxNodePtr::new(node),
        visibility: Visibility::default(),
        modality: Modality::default(),
        annotations: vec![],
        type_parameters: vec![],
        receiver: None,
        parameters: vec![],
        written_type: None,
        declared_type: TypeSlot::unknown(),
        supertypes: vec![],
        getter: None,
        setter: None,
        backing_field: None,
        members: vec![],
        phase: PhaseCell::new(ResolvePhase::Raw),
        body: RwLock::new(None),
        diagnostics: RwLock::new(vec![]),
    }
}

fn build_declaration_value(decl: &cst::Declaration) -> SemanticDecl {
    match decl {
        cst::Declaration::FunctionDeclaration(cst) => build_function(cst),
        cst::Declaration::PropertyDeclaration(cst) => build_property(cst),
        cst::Declaration::ClassDeclaration(cst) => build_class(cst),
        cst::Declaration::TypeAliasDeclaration(cst) => build_type_alias(cst),
        cst::Declaration::InitializerBlock(cst) => build_initializer(cst),
    }
}

fn annotations_of(list: Option<cst::ModifierList>) -> Vec<SemanticAnnotation> {
    list.into_iter()
        .flat_map(|list| list.annotations().collect::<Vec<_>>())
        .map(|annotation| SemanticAnnotation {
            name: annotation.name(),
            ptr: SyntaxNodePtr::new(annotation.syntax()),
        })
        .collect()
}

fn apply_modifiers(decl: &mut SemanticDecl, list: Option<cst::ModifierList>) {
    decl.annotations = annotations_of(list.clone());
    let Some(list) = list else { return };
    for token in list.modifier_tokens() {
        match token.kind() {
            syntax::SyntaxKind::PUBLIC => decl.visibility = Visibility::Public,
            syntax::SyntaxKind::INTERNAL => decl.visibility = Visibility::Internal,
            syntax::SyntaxKind::PRIVATE => decl.visibility = Visibility::Private,
            syntax::SyntaxKind::OPEN => decl.modality = Modality::Open,
            syntax::SyntaxKind::FINAL => decl.modality = Modality::Final,
            syntax::SyntaxKind::ABSTRACT => decl.modality = Modality::Abstract,
            _ => {}
        }
    }
}

fn written_type(cst: Option<cst::TypeReference>) -> Option<WrittenType> {
    let cst = cst?;
    Some(WrittenType { name: cst.name(), ptr: SyntaxNodePtr::new(cst.syntax()) })
}

fn build_parameter(cst: &cst::ValueParameter) -> Parameter {
    Parameter {
        name: cst.name(),
        ptr: SyntaxNodePtr::new(cst.syntax()),
        written_type: written_type(cst.type_reference()),
        ty: TypeSlot::unknown(),
        is_property: cst.is_property_parameter(),
        has_default: cst.default_value().is_some(),
        annotations: annotations_of(cst.modifier_list()),
    }
}

fn build_parameters(list: Option<cst::ValueParameterList>) -> Vec<Parameter> {
    list.into_iter()
        .flat_map(|list| list.parameters().collect::<Vec<_>>())
        .map(|parameter| build_parameter(&parameter))
        .collect()
}

fn type_parameters_of(list: Option<cst::TypeParameterList>) -> Vec<SmolStr> {
    list.into_iter()
        .flat_map(|list| list.parameters().collect::<Vec<_>>())
        .filter_map(|parameter| parameter.name())
        .collect()
}

fn build_function(cst: &cst::FunctionDeclaration) -> SemanticDecl {
    let mut decl = empty_decl(DeclKind::Function, cst.syntax());
    apply_modifiers(&mut decl, cst.modifier_list());
    decl.name = cst.name();
    decl.type_parameters = type_parameters_of(cst.type_parameter_list());
    decl.receiver = written_type(cst.receiver_type());
    decl.parameters = build_parameters(cst.value_parameter_list());
    decl.written_type = written_type(cst.return_type());
    decl
}

fn build_accessor(kind: AccessorKind, node: &SyntaxNode, list: Option<cst::ValueParameterList>) -> Accessor {
    Accessor { kind, ptr: SyntaxNodePtr::new(node), parameters: build_parameters(list) }
}

fn build_property(cst: &cst::PropertyDeclaration) -> SemanticDecl {
    let mut decl = empty_decl(DeclKind::Property, cst.syntax());
    apply_modifiers(&mut decl, cst.modifier_list());
    decl.name = cst.name();
    decl.receiver = written_type(cst.receiver_type());
    decl.written_type = written_type(cst.type_reference());
    if let Some(initializer) = cst.initializer() {
        decl.backing_field =
            Some(BackingField { initializer: SyntaxNodePtr::new(initializer.syntax()) });
    }
    decl.getter = cst
        .getter()
        .map(|getter| build_accessor(AccessorKind::Getter, getter.syntax(), None));
    decl.setter = cst.setter().map(|setter| {
        build_accessor(AccessorKind::Setter, setter.syntax(), setter.value_parameter_list())
    });
    decl
}

fn build_class(cst: &cst::ClassDeclaration) -> SemanticDecl {
    let class_kind = match cst.keyword() {
        Some(cst::ClassKeyword::Object) => ClassKind::Object,
        Some(cst::ClassKeyword::Interface) => ClassKind::Interface,
        _ => ClassKind::Class,
    };
    let mut decl = empty_decl(DeclKind::Class(class_kind), cst.syntax());
    apply_modifiers(&mut decl, cst.modifier_list());
    decl.name = cst.name();
    decl.type_parameters = type_parameters_of(cst.type_parameter_list());

    let entries =
        cst.super_type_list().into_iter().flat_map(|list| list.entries().collect::<Vec<_>>());
    for entry in entries {
        let supertype = match entry {
            cst::SuperTypeEntry::Call(call) => SuperTypeRef {
                written: written_type(call.type_reference()).unwrap_or(WrittenType {
                    name: None,
                    ptr: SyntaxNodePtr::new(call.syntax()),
                }),
                arguments: call.argument_list().map(|list| SyntaxNodePtr::new(list.syntax())),
                ty: TypeSlot::unknown(),
            },
            cst::SuperTypeEntry::Reference(reference) => SuperTypeRef {
                written: WrittenType {
                    name: reference.name(),
                    ptr: SyntaxNodePtr::new(reference.syntax()),
                },
                arguments: None,
                ty: TypeSlot::unknown(),
            },
        };
        decl.supertypes.push(supertype);
    }

    if let Some(constructor) = cst.primary_constructor() {
        let mut member = empty_decl(DeclKind::PrimaryConstructor, constructor.syntax());
        member.name = decl.name.clone();
        member.parameters = build_parameters(constructor.value_parameter_list());
        decl.members.push(Arc::new(member));

        // val/var constructor parameters declare properties on the class.
        for parameter in constructor
            .value_parameter_list()
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
        {
            if !parameter.is_property_parameter() {
                continue;
            }
            let mut property = empty_decl(DeclKind::Property, parameter.syntax());
            property.name = parameter.name();
            property.written_type = written_type(parameter.type_reference());
            property.annotations = annotations_of(parameter.modifier_list());
            decl.members.push(Arc::new(property));
        }
    }

    for child in cst.class_body().into_iter().flat_map(|body| body.syntax().children()) {
        if let Some(declaration) = cst::Declaration::cast(child.clone()) {
            decl.members.push(build_declaration(&declaration));
        } else if let Some(list) = cst::ModifierList::cast(child) {
            decl.members.push(build_dangling(&list));
        }
    }

    decl
}

fn build_type_alias(cst: &cst::TypeAliasDeclaration) -> SemanticDecl {
    let mut decl = empty_decl(DeclKind::TypeAlias, cst.syntax());
    apply_modifiers(&mut decl, cst.modifier_list());
    decl.name = cst.name();
    decl.written_type = written_type(cst.aliased_type());
    decl
}

fn build_initializer(cst: &cst::InitializerBlock) -> SemanticDecl {
    let mut decl = empty_decl(DeclKind::Initializer, cst.syntax());
    apply_modifiers(&mut decl, cst.modifier_list());
    decl
}

/// Rebuilds a declaration from a newer revision of its syntax, patching in
/// everything the original already resolved. The signature is unchanged
/// between the two revisions, so resolved types, signature diagnostics, and
/// the symbol identity all carry over; only the body is left for on-air
/// resolution.
pub fn rebuild_for_reanalysis(
    original: &Arc<SemanticDecl>,
    current: &SyntaxNode,
) -> Option<Arc<SemanticDecl>> {
    let declaration = cst::Declaration::cast(current.clone())?;
    let mut patched = build_declaration_value(&declaration);
    if patched.kind != original.kind || !same_signature_shape(&patched, original) {
        return None;
    }

    patched.symbol = original.symbol;
    patched.declared_type.set(original.declared_type.get());
    for (fresh, resolved) in patched.parameters.iter().zip(&original.parameters) {
        fresh.ty.set(resolved.ty.get());
    }
    for (fresh, resolved) in patched.supertypes.iter().zip(&original.supertypes) {
        fresh.ty.set(resolved.ty.get());
    }
    *patched.diagnostics.write() = original.signature_diagnostics();

    let phase = original.phase.load().min(ResolvePhase::SignatureResolved);
    patched.phase = PhaseCell::new(phase);

    Some(Arc::new(patched))
}

/// Whether a rebuilt declaration still has the signature the original was
/// resolved with. When this fails the edit was not body-only and the
/// resolved slots must not be carried over.
fn same_signature_shape(patched: &SemanticDecl, original: &SemanticDecl) -> bool {
    fn written_name(written: &Option<WrittenType>) -> Option<&SmolStr> {
        written.as_ref().and_then(|written| written.name.as_ref())
    }

    patched.name == original.name
        && written_name(&patched.written_type) == written_name(&original.written_type)
        && patched.parameters.len() == original.parameters.len()
        && patched.parameters.iter().zip(&original.parameters).all(|(fresh, resolved)| {
            fresh.name == resolved.name
                && written_name(&fresh.written_type) == written_name(&resolved.written_type)
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use la_arena::Arena;
    use rowan::ast::AstNode;
    use syntax::cst;

    use crate::{ClassKind, DeclKind, ResolvePhase, TypeRef, Visibility};

    fn parse(source: &str) -> cst::SourceFile {
        let (parsed, _) = parsing::parse_source(source);
        parsed.cst()
    }

    fn unit_id() -> files::UnitId {
        let mut arena = Arena::new();
        arena.alloc(files::UnitSource { path: Arc::from("./src/Test.lm"), content: Arc::from("") })
    }

    #[test]
    fn test_build_unit_shapes() {
        let file = parse("fun f(x: Int): Int = x\nclass C(val n: Int): Base(n) {\n    fun member() {}\n}\n@Dangling");
        let unit = super::build_unit(unit_id(), &file, vec![]);
        assert_eq!(unit.declarations.len(), 3);

        let f = &unit.declarations[0];
        assert_eq!(f.kind, DeclKind::Function);
        assert_eq!(f.name.as_deref(), Some("f"));
        assert_eq!(f.parameters.len(), 1);
        assert_eq!(f.written_type.as_ref().and_then(|ty| ty.name.clone()).as_deref(), Some("Int"));
        assert_eq!(f.declared_type.get(), TypeRef::Unknown);
        assert_eq!(f.phase.load(), ResolvePhase::Raw);

        let c = &unit.declarations[1];
        assert_eq!(c.kind, DeclKind::Class(ClassKind::Class));
        assert_eq!(c.supertypes.len(), 1);
        // Primary constructor, synthesized property for `val n`, member.
        assert_eq!(c.members.len(), 3);
        assert!(c.primary_constructor().is_some());

        let dangling = &unit.declarations[2];
        assert_eq!(dangling.kind, DeclKind::DanglingModifiers);
        assert_eq!(dangling.annotations.len(), 1);
        assert!(!dangling.signature_diagnostics().is_empty());
    }

    #[test]
    fn test_by_ptr_covers_members() {
        let file = parse("class C {\n    val member: Int = 1\n}");
        let unit = super::build_unit(unit_id(), &file, vec![]);
        let c = &unit.declarations[0];
        let member = &c.members[0];
        assert!(unit.decl_by_ptr(c.ptr).is_some());
        assert!(unit.decl_by_ptr(member.ptr).is_some());
    }

    #[test]
    fn test_parameter_and_initializer_modifiers() {
        let file = parse("class C(@Inject val n: Int) {\n    private init { }\n}");
        let unit = super::build_unit(unit_id(), &file, vec![]);
        let c = &unit.declarations[0];

        let constructor = c.primary_constructor().unwrap();
        assert_eq!(constructor.parameters[0].annotations.len(), 1);
        assert_eq!(constructor.parameters[0].annotations[0].name.as_deref(), Some("Inject"));

        let initializer =
            c.members.iter().find(|member| member.kind == DeclKind::Initializer).unwrap();
        assert_eq!(initializer.visibility, Visibility::Private);
    }

    #[test]
    fn test_modifiers() {
        let file = parse("@Ann\nprivate open fun f() {}");
        let unit = super::build_unit(unit_id(), &file, vec![]);
        let f = &unit.declarations[0];
        assert_eq!(f.visibility, Visibility::Private);
        assert_eq!(f.modality, crate::Modality::Open);
        assert_eq!(f.annotations[0].name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_rebuild_keeps_symbol_and_types() {
        let before = parse("fun f(x: Int): Int { return x }");
        let unit = super::build_unit(unit_id(), &before, vec![]);
        let original = &unit.declarations[0];
        original.declared_type.set(TypeRef::Named("Int".into()));
        original.parameters[0].ty.set(TypeRef::Named("Int".into()));
        original.phase.advance(ResolvePhase::BodyResolved);

        let after = parse("fun f(x: Int): Int { return x + 1 }");
        let node = after.declarations().next().map(|decl| decl.syntax().clone()).unwrap();
        let patched = super::rebuild_for_reanalysis(original, &node).unwrap();

        assert_eq!(patched.symbol, original.symbol);
        assert_eq!(patched.declared_type.get(), TypeRef::Named("Int".into()));
        assert_eq!(patched.parameters[0].ty.get(), TypeRef::Named("Int".into()));
        // The body is not carried over, only the signature is.
        assert_eq!(patched.phase.load(), ResolvePhase::SignatureResolved);
        assert!(patched.body.read().is_none());
    }
}
