use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;
use smol_str::SmolStr;

use crate::{SyntaxKind, SyntaxNode};

/// The name a declaration introduces, if any. Taken from the first identifier
/// token that is a direct child of the declaration node, which skips names
/// nested inside parameter lists and bodies.
pub fn declaration_name(node: &SyntaxNode) -> Option<SmolStr> {
    node.children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == SyntaxKind::IDENT)
        .map(|token| SmolStr::new(token.text()))
}

/// A declaration is non-local when every node above it is purely structural,
/// i.e. it is not nested inside another declaration's body. Non-local
/// declarations are the anchors the structure cache keys elements by.
pub fn is_non_local(node: &SyntaxNode) -> bool {
    node.ancestors().skip(1).all(|ancestor| {
        matches!(
            ancestor.kind(),
            SyntaxKind::SourceFile | SyntaxKind::ClassBody | SyntaxKind::ClassDeclaration
        )
    })
}

fn is_anchor(node: &SyntaxNode) -> bool {
    if node.kind().is_declaration() {
        return true;
    }
    // A modifier list with no declaration to attach to is an anchor of its
    // own, so malformed input still gets an element.
    node.kind() == SyntaxKind::ModifierList
        && node.parent().is_some_and(|parent| {
            matches!(parent.kind(), SyntaxKind::SourceFile | SyntaxKind::ClassBody)
        })
}

/// Child anchors of a container node. Class members live under the class
/// body, everything else keeps its anchors as direct children.
fn child_anchors(container: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> + use<> {
    let parent = if container.kind() == SyntaxKind::ClassDeclaration {
        container.children().find(|child| child.kind() == SyntaxKind::ClassBody)
    } else {
        Some(container.clone())
    };
    parent.into_iter().flat_map(|parent| parent.children()).filter(|child| is_anchor(child))
}

/// One step of a [`DeclPath`]: the anchor's kind and name, plus how many
/// earlier siblings share both, so duplicate declarations stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub kind: SyntaxKind,
    pub name: Option<SmolStr>,
    pub occurrence: u32,
}

/// A structural key for a declaration, stable across edits to its body and
/// to sibling bodies. The empty path denotes the source file itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclPath {
    segments: Arc<[PathSegment]>,
}

impl DeclPath {
    pub fn root() -> DeclPath {
        DeclPath { segments: Arc::from([]) }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The key of the nearest anchor at or above `node`, or the root key if
    /// there is none.
    pub fn of(node: &SyntaxNode) -> DeclPath {
        let mut segments = vec![];
        for ancestor in node.ancestors() {
            if !is_anchor(&ancestor) {
                continue;
            }
            let kind = ancestor.kind();
            let name = declaration_name(&ancestor);
            let occurrence = ancestor
                .parent()
                .into_iter()
                .flat_map(|parent| parent.children())
                .take_while(|sibling| sibling != &ancestor)
                .filter(|sibling| {
                    sibling.kind() == kind && declaration_name(sibling) == name
                })
                .count() as u32;
            segments.push(PathSegment { kind, name, occurrence });
        }
        segments.reverse();
        DeclPath { segments: Arc::from(segments) }
    }

    /// Walks the path down from `root`, returning the anchor node it denotes
    /// in that tree. Fails when the tree no longer contains a matching chain.
    pub fn resolve_in(&self, root: &SyntaxNode) -> Option<SyntaxNode> {
        let mut current = root.clone();
        for segment in self.segments.iter() {
            current = child_anchors(&current)
                .filter(|child| {
                    child.kind() == segment.kind && declaration_name(child) == segment.name
                })
                .nth(segment.occurrence as usize)?;
        }
        Some(current)
    }
}

/// A content hash of a declaration's subtree text. Two stamps compare equal
/// exactly when the declaration's text is unchanged, which is what decides
/// whether a cached element is still fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditStamp(u64);

impl EditStamp {
    pub fn of(node: &SyntaxNode) -> EditStamp {
        let mut hasher = FxHasher::default();
        node.text().for_each_chunk(|chunk| chunk.hash(&mut hasher));
        EditStamp(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use rowan::{GreenNodeBuilder, Language};

    use crate::{DeclPath, EditStamp, Lumen, SyntaxKind, SyntaxNode, declaration_name, is_non_local};

    struct TreeBuilder {
        inner: GreenNodeBuilder<'static>,
    }

    impl TreeBuilder {
        fn new() -> TreeBuilder {
            TreeBuilder { inner: GreenNodeBuilder::new() }
        }

        fn start(&mut self, kind: SyntaxKind) -> &mut Self {
            self.inner.start_node(Lumen::kind_to_raw(kind));
            self
        }

        fn finish(&mut self) -> &mut Self {
            self.inner.finish_node();
            self
        }

        fn token(&mut self, kind: SyntaxKind, text: &str) -> &mut Self {
            self.inner.token(Lumen::kind_to_raw(kind), text);
            self
        }

        fn build(self) -> SyntaxNode {
            SyntaxNode::new_root(self.inner.finish())
        }
    }

    fn function(builder: &mut TreeBuilder, name: &str, body: &str) {
        builder.start(SyntaxKind::FunctionDeclaration);
        builder.token(SyntaxKind::FUN, "fun");
        builder.token(SyntaxKind::WHITESPACE, " ");
        builder.token(SyntaxKind::IDENT, name);
        builder.start(SyntaxKind::ExpressionBody);
        builder.token(SyntaxKind::EQUALS, "=");
        builder.start(SyntaxKind::LiteralExpression);
        builder.token(SyntaxKind::INTEGER, body);
        builder.finish();
        builder.finish();
        builder.finish();
        builder.token(SyntaxKind::WHITESPACE, "\n");
    }

    fn file_with_functions(bodies: &[(&str, &str)]) -> SyntaxNode {
        let mut builder = TreeBuilder::new();
        builder.start(SyntaxKind::SourceFile);
        for (name, body) in bodies {
            function(&mut builder, name, body);
        }
        builder.finish();
        builder.build()
    }

    #[test]
    fn test_declaration_name() {
        let root = file_with_functions(&[("f", "1")]);
        let function = root.first_child().unwrap();
        assert_eq!(declaration_name(&function).as_deref(), Some("f"));
        assert_eq!(declaration_name(&root), None);
    }

    #[test]
    fn test_decl_path_stable_across_body_edits() {
        let before = file_with_functions(&[("f", "1"), ("g", "2")]);
        let after = file_with_functions(&[("f", "42"), ("g", "2")]);

        let f_before = before.first_child().unwrap();
        let path = DeclPath::of(&f_before);
        let f_after = path.resolve_in(&after).unwrap();
        assert_eq!(declaration_name(&f_after).as_deref(), Some("f"));
        assert_eq!(path, DeclPath::of(&f_after));
    }

    #[test]
    fn test_decl_path_disambiguates_duplicates() {
        let root = file_with_functions(&[("f", "1"), ("f", "2")]);
        let mut functions = root.children();
        let first = functions.next().unwrap();
        let second = functions.next().unwrap();

        let first_path = DeclPath::of(&first);
        let second_path = DeclPath::of(&second);
        assert_ne!(first_path, second_path);
        assert_eq!(first_path.resolve_in(&root), Some(first));
        assert_eq!(second_path.resolve_in(&root), Some(second));
    }

    #[test]
    fn test_decl_path_of_inner_node_is_nearest_anchor() {
        let root = file_with_functions(&[("f", "1")]);
        let function = root.first_child().unwrap();
        let literal = function
            .descendants()
            .find(|node| node.kind() == SyntaxKind::LiteralExpression)
            .unwrap();
        assert_eq!(DeclPath::of(&literal), DeclPath::of(&function));
        assert!(DeclPath::of(&root).is_root());
    }

    #[test]
    fn test_decl_path_resolve_missing() {
        let before = file_with_functions(&[("f", "1")]);
        let after = file_with_functions(&[("g", "1")]);
        let path = DeclPath::of(&before.first_child().unwrap());
        assert_eq!(path.resolve_in(&after), None);
    }

    #[test]
    fn test_edit_stamp_tracks_text() {
        let before = file_with_functions(&[("f", "1"), ("g", "2")]);
        let after = file_with_functions(&[("f", "42"), ("g", "2")]);

        let f_path = DeclPath::of(&before.first_child().unwrap());
        let g_path = DeclPath::of(&before.last_child().unwrap());

        let f_before = f_path.resolve_in(&before).unwrap();
        let f_after = f_path.resolve_in(&after).unwrap();
        assert_ne!(EditStamp::of(&f_before), EditStamp::of(&f_after));

        let g_before = g_path.resolve_in(&before).unwrap();
        let g_after = g_path.resolve_in(&after).unwrap();
        assert_eq!(EditStamp::of(&g_before), EditStamp::of(&g_after));
    }

    #[test]
    fn test_is_non_local() {
        let mut builder = TreeBuilder::new();
        builder.start(SyntaxKind::SourceFile);
        builder.start(SyntaxKind::ClassDeclaration);
        builder.token(SyntaxKind::CLASS, "class");
        builder.token(SyntaxKind::WHITESPACE, " ");
        builder.token(SyntaxKind::IDENT, "C");
        builder.start(SyntaxKind::ClassBody);
        builder.token(SyntaxKind::LEFT_BRACE, "{");
        function(&mut builder, "member", "1");
        builder.token(SyntaxKind::RIGHT_BRACE, "}");
        builder.finish();
        builder.finish();
        builder.finish();
        let root = builder.build();

        let class = root.first_child().unwrap();
        let member = class
            .descendants()
            .find(|node| node.kind() == SyntaxKind::FunctionDeclaration)
            .unwrap();
        assert!(is_non_local(&class));
        assert!(is_non_local(&member));

        let literal = member
            .descendants()
            .find(|node| node.kind() == SyntaxKind::LiteralExpression)
            .unwrap();
        assert!(!is_non_local(&literal));
    }
}
