use std::mem;
use std::sync::Arc;

use files::UnitId;
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use semantic::{Diagnostic, Resolver};
use syntax::{DeclPath, EditStamp, SyntaxNode};

use crate::classify::{Container, ContainerKind, classify, is_container_anchor};
use crate::element::{BuildContext, StructureElement, build_element, reanalyze_element};
use crate::error::StructureError;
use crate::index::SemanticRef;

type BuildResult = Result<Arc<StructureElement>, StructureError>;

/// Broadcast cell for one in-flight build. Every concurrent caller for the
/// key blocks on it and receives a clone of the builder's result.
#[derive(Debug, Default)]
struct BuildWaiter {
    outcome: Mutex<BuildOutcome>,
    ready: Condvar,
}

#[derive(Debug, Default)]
enum BuildOutcome {
    #[default]
    Pending,
    Done(BuildResult),
    Abandoned,
}

impl BuildWaiter {
    /// Blocks until the build settles. `None` means the builder unwound
    /// without a result; the caller should take the build over.
    fn wait(&self) -> Option<BuildResult> {
        let mut outcome = self.outcome.lock();
        while matches!(*outcome, BuildOutcome::Pending) {
            self.ready.wait(&mut outcome);
        }
        match &*outcome {
            BuildOutcome::Done(result) => Some(result.clone()),
            BuildOutcome::Abandoned => None,
            BuildOutcome::Pending => {
                unreachable!("invariant violated: woken up on a pending build")
            }
        }
    }

    fn publish(&self, result: BuildResult) {
        self.settle(BuildOutcome::Done(result));
    }

    fn abandon(&self) {
        self.settle(BuildOutcome::Abandoned);
    }

    fn settle(&self, outcome: BuildOutcome) {
        *self.outcome.lock() = outcome;
        self.ready.notify_all();
    }
}

enum Slot {
    /// One thread is building; everyone else blocks on the waiter.
    InProgress(Arc<BuildWaiter>),
    Ready(Arc<StructureElement>),
}

enum Action {
    Build,
    Refresh(Arc<StructureElement>),
    Wait(Arc<BuildWaiter>),
}

/// Unwinding out of a build would leave waiters parked forever; the guard
/// clears the slot and wakes them so one of them takes the build over.
struct AbandonGuard<'a> {
    cache: &'a StructureCache,
    key: &'a DeclPath,
}

impl AbandonGuard<'_> {
    fn disarm(self) {
        mem::forget(self);
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if let Some(Slot::InProgress(waiter)) = self.cache.slots.lock().remove(self.key) {
            waiter.abandon();
        }
    }
}

/// The per-unit element cache. At most one thread computes the element for
/// a given container key at a time; concurrent callers for the same key
/// wait for that thread's result instead of duplicating the work.
pub struct StructureCache {
    unit: UnitId,
    resolver: Arc<dyn Resolver>,
    slots: Mutex<FxHashMap<DeclPath, Slot>>,
}

impl StructureCache {
    pub(crate) fn new(unit: UnitId, resolver: Arc<dyn Resolver>) -> StructureCache {
        StructureCache { unit, resolver, slots: Mutex::new(FxHashMap::default()) }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// The structure element owning `node`. Builds, reuses, or refreshes the
    /// cached element as the container's content stamp dictates.
    pub fn element_for(&self, node: &SyntaxNode) -> BuildResult {
        let container = classify(node);
        let key = match container.kind {
            ContainerKind::Root => DeclPath::root(),
            _ => DeclPath::of(&container.node),
        };
        let stamp = EditStamp::of(&container.node);

        loop {
            let action = {
                let mut slots = self.slots.lock();
                match slots.get(&key) {
                    None => {
                        slots.insert(key.clone(), Slot::InProgress(Arc::default()));
                        Action::Build
                    }
                    Some(Slot::Ready(element)) => {
                        if element.stamp() == stamp {
                            return Ok(Arc::clone(element));
                        }
                        let stale = Arc::clone(element);
                        slots.insert(key.clone(), Slot::InProgress(Arc::default()));
                        Action::Refresh(stale)
                    }
                    Some(Slot::InProgress(waiter)) => Action::Wait(Arc::clone(waiter)),
                }
            };

            match action {
                Action::Build => {
                    let guard = AbandonGuard { cache: self, key: &key };
                    let result = self.build(&key);
                    guard.disarm();
                    return self.install(&key, result);
                }
                Action::Refresh(stale) => {
                    let guard = AbandonGuard { cache: self, key: &key };
                    let result = self.refresh(&key, &stale, &container);
                    guard.disarm();
                    return self.install(&key, result);
                }
                Action::Wait(waiter) => match waiter.wait() {
                    Some(result) => return result,
                    // The builder unwound without settling; take over.
                    None => continue,
                },
            }
        }
    }

    /// Structure elements for every container in the unit's current
    /// revision, the root element included.
    pub fn all_elements(&self) -> Result<FxHashSet<Arc<StructureElement>>, StructureError> {
        let source = self.resolver.source_unit(self.unit)?;
        let root = source.syntax_node();

        let mut elements = FxHashSet::default();
        elements.insert(self.element_for(&root)?);
        for node in root.descendants() {
            if is_container_anchor(&node) {
                elements.insert(self.element_for(&node)?);
            }
        }
        Ok(elements)
    }

    /// Diagnostics of every element in the unit, each element's kept or
    /// dropped per `filter`. Order across elements is unspecified; within an
    /// element it is the element's own order.
    pub fn all_diagnostics(
        &self,
        filter: impl Fn(&Diagnostic) -> bool,
    ) -> Result<Vec<Diagnostic>, StructureError> {
        let mut diagnostics = vec![];
        for element in self.all_elements()? {
            let kept = element.diagnostics().iter().filter(|diagnostic| filter(diagnostic));
            diagnostics.extend(kept.cloned());
        }
        Ok(diagnostics)
    }

    /// The semantic object for `node`, walking up to the nearest mapped
    /// ancestor within its owning element.
    pub fn semantic_for_node(
        &self,
        node: &SyntaxNode,
    ) -> Result<Option<(SyntaxNode, SemanticRef)>, StructureError> {
        let element = self.element_for(node)?;
        Ok(element.index().nearest_mapped_ancestor(node))
    }

    /// Drops the cached element owning `node`, if any. An in-progress build
    /// is left alone; its result installs and is judged stale on next use.
    pub fn invalidate(&self, node: &SyntaxNode) {
        let container = classify(node);
        let key = match container.kind {
            ContainerKind::Root => DeclPath::root(),
            _ => DeclPath::of(&container.node),
        };
        let mut slots = self.slots.lock();
        if matches!(slots.get(&key), Some(Slot::Ready(_))) {
            slots.remove(&key);
        }
    }

    fn install(&self, key: &DeclPath, result: BuildResult) -> BuildResult {
        let waiter = {
            let mut slots = self.slots.lock();
            let waiter = match slots.remove(key) {
                Some(Slot::InProgress(waiter)) => waiter,
                _ => unreachable!("invariant violated: builder lost its slot"),
            };
            if let Ok(element) = &result {
                slots.insert(key.clone(), Slot::Ready(Arc::clone(element)));
            }
            waiter
        };
        waiter.publish(result.clone());
        result
    }

    fn build(&self, key: &DeclPath) -> BuildResult {
        let source = self.resolver.source_unit(self.unit)?;
        let semantic = self.resolver.semantic_unit(self.unit)?;
        let root = source.syntax_node();

        let anchor = if key.is_root() {
            root.clone()
        } else {
            key.resolve_in(&root).ok_or_else(|| {
                StructureError::consistency("container no longer exists in its unit")
            })?
        };
        let container = classify(&anchor);

        let ctx =
            BuildContext { resolver: &self.resolver, unit: self.unit, semantic: &semantic, root: &root };
        build_element(&ctx, &container, key.clone()).map(Arc::new)
    }

    /// A stale element is reanalyzed in place when it supports it and the
    /// edit kept its signature; anything else is rebuilt from the current
    /// revision.
    fn refresh(
        &self,
        key: &DeclPath,
        stale: &Arc<StructureElement>,
        container: &Container,
    ) -> BuildResult {
        if let StructureElement::Reanalyzable(old) = &**stale {
            let semantic = self.resolver.semantic_unit(self.unit)?;
            let source = self.resolver.source_unit(self.unit)?;
            let root = source.syntax_node();
            let ctx = BuildContext {
                resolver: &self.resolver,
                unit: self.unit,
                semantic: &semantic,
                root: &root,
            };
            match reanalyze_element(&ctx, old, &container.node) {
                Ok(element) => return Ok(Arc::new(element)),
                // Not a body-only edit after all; fall through to a rebuild.
                Err(StructureError::Consistency { .. }) => {}
                Err(error) => return Err(error),
            }
        }
        self.build(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::BuildWaiter;
    use crate::error::StructureError;

    #[test]
    fn test_waiter_receives_the_settled_result() {
        let waiter = Arc::new(BuildWaiter::default());
        let builder = Arc::clone(&waiter);
        std::thread::spawn(move || builder.publish(Err(StructureError::consistency("gone"))));
        assert!(matches!(waiter.wait(), Some(Err(StructureError::Consistency { .. }))));
    }

    #[test]
    fn test_abandoned_waiter_signals_takeover() {
        let waiter = Arc::new(BuildWaiter::default());
        let builder = Arc::clone(&waiter);
        std::thread::spawn(move || builder.abandon());
        assert_eq!(waiter.wait(), None);
    }
}
