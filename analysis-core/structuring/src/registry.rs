use std::sync::Arc;

use dashmap::DashMap;
use files::UnitId;
use semantic::Resolver;
use syntax::SyntaxNode;

use crate::cache::StructureCache;
use crate::element::StructureElement;
use crate::error::StructureError;

/// Session-wide registry of per-unit structure caches. Caches are created
/// on first use and share the session's resolver.
pub struct StructureRegistry {
    resolver: Arc<dyn Resolver>,
    caches: DashMap<UnitId, Arc<StructureCache>>,
}

impl StructureRegistry {
    pub fn new(resolver: Arc<dyn Resolver>) -> StructureRegistry {
        StructureRegistry { resolver, caches: DashMap::new() }
    }

    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    pub fn cache_for(&self, unit: UnitId) -> Arc<StructureCache> {
        let entry = self.caches.entry(unit).or_insert_with(|| {
            Arc::new(StructureCache::new(unit, Arc::clone(&self.resolver)))
        });
        Arc::clone(&entry)
    }

    pub fn element_for(
        &self,
        unit: UnitId,
        node: &SyntaxNode,
    ) -> Result<Arc<StructureElement>, StructureError> {
        self.cache_for(unit).element_for(node)
    }

    /// Drops the cache of a unit, e.g. when the unit is closed. Callers
    /// still holding the cache keep using it; new lookups start fresh.
    pub fn dispose(&self, unit: UnitId) {
        self.caches.remove(&unit);
    }
}
