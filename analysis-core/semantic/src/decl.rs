use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use syntax::SyntaxNodePtr;

use crate::{BodyTree, Diagnostic, PhaseCell, TypeSlot, WrittenType};

/// A session-unique identity for a declaration. Survives reanalysis: the
/// patched copy of a declaration keeps the symbol of the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u64);

impl SymbolId {
    pub fn fresh() -> SymbolId {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        SymbolId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Object,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Property,
    Class(ClassKind),
    TypeAlias,
    PrimaryConstructor,
    Initializer,
    /// Modifiers and annotations with no declaration to attach to.
    DanglingModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modality {
    #[default]
    Final,
    Open,
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticAnnotation {
    pub name: Option<SmolStr>,
    pub ptr: SyntaxNodePtr,
}

#[derive(Debug)]
pub struct Parameter {
    pub name: Option<SmolStr>,
    pub ptr: SyntaxNodePtr,
    pub written_type: Option<WrittenType>,
    pub ty: TypeSlot,
    pub is_property: bool,
    pub has_default: bool,
    pub annotations: Vec<SemanticAnnotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

#[derive(Debug)]
pub struct Accessor {
    pub kind: AccessorKind,
    pub ptr: SyntaxNodePtr,
    pub parameters: Vec<Parameter>,
}

/// The implicit storage behind a property with an initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingField {
    pub initializer: SyntaxNodePtr,
}

/// A supertype entry of a class, optionally with constructor arguments.
#[derive(Debug)]
pub struct SuperTypeRef {
    pub written: WrittenType,
    pub arguments: Option<SyntaxNodePtr>,
    pub ty: TypeSlot,
}

pub type BodySlot = RwLock<Option<Arc<BodyTree>>>;

/// A declaration in the semantic model. Signature fields are filled by the
/// resolver when the declaration reaches [`ResolvePhase::SignatureResolved`],
/// the body slot at [`ResolvePhase::BodyResolved`].
///
/// [`ResolvePhase::SignatureResolved`]: crate::ResolvePhase::SignatureResolved
/// [`ResolvePhase::BodyResolved`]: crate::ResolvePhase::BodyResolved
#[derive(Debug)]
pub struct SemanticDecl {
    pub symbol: SymbolId,
    pub kind: DeclKind,
    pub name: Option<SmolStr>,
    pub ptr: SyntaxNodePtr,
    pub visibility: Visibility,
    pub modality: Modality,
    pub annotations: Vec<SemanticAnnotation>,
    pub type_parameters: Vec<SmolStr>,
    pub receiver: Option<WrittenType>,
    pub parameters: Vec<Parameter>,
    pub written_type: Option<WrittenType>,
    pub declared_type: TypeSlot,
    pub supertypes: Vec<SuperTypeRef>,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub backing_field: Option<BackingField>,
    pub members: Vec<Arc<SemanticDecl>>,
    pub phase: PhaseCell,
    pub body: BodySlot,
    pub diagnostics: RwLock<Vec<Diagnostic>>,
}

impl SemanticDecl {
    pub fn member_by_ptr(&self, ptr: SyntaxNodePtr) -> Option<&Arc<SemanticDecl>> {
        self.members.iter().find(|member| member.ptr == ptr)
    }

    pub fn primary_constructor(&self) -> Option<&Arc<SemanticDecl>> {
        self.members.iter().find(|member| member.kind == DeclKind::PrimaryConstructor)
    }

    pub fn signature_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.read().clone()
    }
}

/// The semantic view of a whole unit: its top-level declarations plus a
/// pointer-keyed lookup covering nested declarations as well.
#[derive(Debug)]
pub struct SemanticUnit {
    pub id: files::UnitId,
    pub declarations: Vec<Arc<SemanticDecl>>,
    pub by_ptr: FxHashMap<SyntaxNodePtr, Arc<SemanticDecl>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SemanticUnit {
    pub fn decl_by_ptr(&self, ptr: SyntaxNodePtr) -> Option<&Arc<SemanticDecl>> {
        self.by_ptr.get(&ptr)
    }
}
