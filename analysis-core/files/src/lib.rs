//! Source unit bookkeeping for the analysis session.
//!
//! A [`UnitId`] identifies a compilation unit for the lifetime of a session.
//! Re-inserting an existing path reuses its id and replaces the content,
//! which is how edits to an open unit are modelled.

use std::sync::Arc;

use indexmap::IndexMap;
use la_arena::{Arena, Idx};
use rustc_hash::FxBuildHasher;

pub type UnitId = Idx<UnitSource>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSource {
    pub path: Arc<str>,
    pub content: Arc<str>,
}

#[derive(Debug, Default)]
pub struct Units {
    arena: Arena<UnitSource>,
    paths: IndexMap<Arc<str>, UnitId, FxBuildHasher>,
}

impl Units {
    pub fn insert(&mut self, path: impl AsRef<str>, content: impl Into<Arc<str>>) -> UnitId {
        let path: Arc<str> = Arc::from(path.as_ref());
        let content = content.into();
        if let Some(&id) = self.paths.get(&path) {
            self.arena[id].content = content;
            return id;
        }
        let id = self.arena.alloc(UnitSource { path: Arc::clone(&path), content });
        self.paths.insert(path, id);
        id
    }

    pub fn lookup(&self, path: &str) -> Option<UnitId> {
        self.paths.get(path).copied()
    }

    pub fn content(&self, id: UnitId) -> Arc<str> {
        Arc::clone(&self.arena[id].content)
    }

    pub fn path(&self, id: UnitId) -> Arc<str> {
        Arc::clone(&self.arena[id].path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &UnitSource)> {
        self.arena.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Units;

    #[test]
    fn test_insert_reuses_id() {
        let mut units = Units::default();
        let a = units.insert("./src/Main.lm", "fun main() {}");
        let b = units.insert("./src/Main.lm", "fun main() { run() }");
        assert_eq!(a, b);
        assert_eq!(units.content(b).as_ref(), "fun main() { run() }");
    }

    #[test]
    fn test_lookup() {
        let mut units = Units::default();
        let a = units.insert("./src/A.lm", "");
        let b = units.insert("./src/B.lm", "");
        assert_ne!(a, b);
        assert_eq!(units.lookup("./src/A.lm"), Some(a));
        assert_eq!(units.lookup("./src/C.lm"), None);
    }
}
