use parking_lot::RwLock;
use smol_str::SmolStr;
use syntax::SyntaxNodePtr;

/// A resolved type. `Unknown` before signature resolution, `Error` when the
/// written type did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Unknown,
    Named(SmolStr),
    Unit,
    Error,
}

/// A type as written in source, kept alongside the slot its resolution
/// lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenType {
    pub name: Option<SmolStr>,
    pub ptr: SyntaxNodePtr,
}

/// A lazily filled type slot. Written once by the resolver holding the
/// declaration's write side, read concurrently afterwards.
#[derive(Debug)]
pub struct TypeSlot(RwLock<TypeRef>);

impl TypeSlot {
    pub fn unknown() -> TypeSlot {
        TypeSlot(RwLock::new(TypeRef::Unknown))
    }

    pub fn get(&self) -> TypeRef {
        self.0.read().clone()
    }

    pub fn set(&self, ty: TypeRef) {
        *self.0.write() = ty;
    }
}

impl Default for TypeSlot {
    fn default() -> TypeSlot {
        TypeSlot::unknown()
    }
}
