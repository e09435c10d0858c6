//! The incremental structure cache: classifies syntax nodes into containers,
//! attaches cached semantic views to them, and refreshes stale entries by
//! reanalyzing declaration bodies in isolation where the grammar allows it.

mod cache;
mod classify;
mod diagnostics;
mod element;
mod error;
mod index;
mod registry;

pub use cache::StructureCache;
pub use classify::{Container, ContainerKind, ReanalyzableKind, classify};
pub use diagnostics::DiagnosticsHolder;
pub use element::{
    ClassElement, DanglingElement, ElementCore, PlainElement, ReanalyzableElement, RootElement,
    StructureElement,
};
pub use error::StructureError;
pub use index::{SemanticRef, StructureIndex};
pub use registry::StructureRegistry;
