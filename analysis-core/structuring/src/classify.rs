//! Maps an arbitrary syntax node to the container that owns its structure
//! element. Containers are the source file itself plus every non-local
//! declaration and dangling modifier list.

use rowan::ast::AstNode;
use syntax::{SyntaxKind, SyntaxNode, cst, is_non_local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReanalyzableKind {
    Function,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// The source file itself; owns everything outside declarations.
    Root,
    /// A class-like declaration; owns its header and supertype entries.
    Class,
    /// A declaration whose body edits can change its signature.
    Plain,
    /// A modifier list with no declaration attached.
    Dangling,
    /// A declaration whose body can be re-resolved in isolation.
    Reanalyzable(ReanalyzableKind),
}

#[derive(Debug, Clone)]
pub struct Container {
    pub kind: ContainerKind,
    pub node: SyntaxNode,
}

fn is_anchor(node: &SyntaxNode) -> bool {
    node.kind().is_declaration()
        || (node.kind() == SyntaxKind::ModifierList
            && node.parent().is_some_and(|parent| {
                matches!(parent.kind(), SyntaxKind::SourceFile | SyntaxKind::ClassBody)
            }))
}

/// A body edit may not change the declaration's externally visible
/// signature, otherwise the declaration has to be rebuilt rather than
/// reanalyzed. A function is safe when its return type does not depend on
/// the body; a property when its type is written out.
fn reanalyzable_kind(node: &SyntaxNode) -> Option<ReanalyzableKind> {
    if let Some(function) = cst::FunctionDeclaration::cast(node.clone()) {
        let has_body = function.expression_body().is_some() || function.has_block_body();
        if has_body && (function.has_block_body() || function.return_type().is_some()) {
            return Some(ReanalyzableKind::Function);
        }
    } else if let Some(property) = cst::PropertyDeclaration::cast(node.clone()) {
        let has_body = property.initializer().is_some()
            || property.getter().is_some()
            || property.setter().is_some();
        if has_body && property.type_reference().is_some() {
            return Some(ReanalyzableKind::Property);
        }
    }
    None
}

/// Whether `node` is itself a container anchor and therefore owns an
/// element of its own.
pub(crate) fn is_container_anchor(node: &SyntaxNode) -> bool {
    is_anchor(node) && is_non_local(node)
}

/// The container owning `node`: the innermost non-local anchor at or above
/// it, or the root when there is none. Nodes inside the bodies of local
/// declarations belong to the enclosing non-local container.
pub fn classify(node: &SyntaxNode) -> Container {
    for ancestor in node.ancestors() {
        if !is_anchor(&ancestor) || !is_non_local(&ancestor) {
            continue;
        }
        let kind = match ancestor.kind() {
            SyntaxKind::ModifierList => ContainerKind::Dangling,
            SyntaxKind::ClassDeclaration => ContainerKind::Class,
            _ => match reanalyzable_kind(&ancestor) {
                Some(kind) => ContainerKind::Reanalyzable(kind),
                None => ContainerKind::Plain,
            },
        };
        return Container { kind, node: ancestor };
    }
    let root = node.ancestors().last().unwrap_or_else(|| node.clone());
    Container { kind: ContainerKind::Root, node: root }
}

#[cfg(test)]
mod tests {
    use rowan::ast::AstNode;
    use syntax::{SyntaxKind, SyntaxNode};

    use super::{ContainerKind, ReanalyzableKind, classify};

    fn parse(source: &str) -> SyntaxNode {
        let (parsed, _) = parsing::parse_source(source);
        parsed.syntax_node()
    }

    fn find(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
        root.descendants().find(|node| node.kind() == kind).unwrap()
    }

    #[test]
    fn test_root_owns_top_level_nodes() {
        let root = parse("fun f() {}\n");
        assert_eq!(classify(&root).kind, ContainerKind::Root);
    }

    #[test]
    fn test_function_classification() {
        // Block body, no written return type: returns Unit regardless.
        let root = parse("fun f() { g() }");
        let body_node = find(&root, SyntaxKind::CallExpression);
        let container = classify(&body_node);
        assert_eq!(container.kind, ContainerKind::Reanalyzable(ReanalyzableKind::Function));
        assert_eq!(container.node.kind(), SyntaxKind::FunctionDeclaration);

        // Expression body with a written return type.
        let root = parse("fun f(): Int = 1");
        let literal = find(&root, SyntaxKind::LiteralExpression);
        assert_eq!(
            classify(&literal).kind,
            ContainerKind::Reanalyzable(ReanalyzableKind::Function)
        );

        // Expression body without a written type: the signature is inferred
        // from the body, so edits cannot be reanalyzed in isolation.
        let root = parse("fun f() = 1");
        let literal = find(&root, SyntaxKind::LiteralExpression);
        assert_eq!(classify(&literal).kind, ContainerKind::Plain);
    }

    #[test]
    fn test_property_classification() {
        let root = parse("val x: Int = 1");
        let literal = find(&root, SyntaxKind::LiteralExpression);
        assert_eq!(
            classify(&literal).kind,
            ContainerKind::Reanalyzable(ReanalyzableKind::Property)
        );

        let root = parse("val x = 1");
        let literal = find(&root, SyntaxKind::LiteralExpression);
        assert_eq!(classify(&literal).kind, ContainerKind::Plain);
    }

    #[test]
    fn test_class_header_vs_members() {
        let root = parse("class C(val n: Int): Base(n) {\n    fun member(): Int = n\n}");
        let supertype_argument = find(&root, SyntaxKind::ValueArgumentList);
        let container = classify(&supertype_argument);
        assert_eq!(container.kind, ContainerKind::Class);

        let member_literal = root
            .descendants()
            .find(|node| node.kind() == SyntaxKind::NameReference
                && node.ancestors().any(|a| a.kind() == SyntaxKind::ExpressionBody))
            .unwrap();
        let container = classify(&member_literal);
        assert_eq!(container.kind, ContainerKind::Reanalyzable(ReanalyzableKind::Function));
    }

    #[test]
    fn test_dangling_modifier_list() {
        let root = parse("@Ann");
        let annotation = find(&root, SyntaxKind::Annotation);
        let container = classify(&annotation);
        assert_eq!(container.kind, ContainerKind::Dangling);
        assert_eq!(container.node.kind(), SyntaxKind::ModifierList);
    }

    #[test]
    fn test_local_declaration_belongs_to_enclosing_container() {
        let root = parse("fun outer() {\n    fun local() { }\n}");
        let declarations: Vec<_> = root
            .descendants()
            .filter(|node| node.kind() == SyntaxKind::FunctionDeclaration)
            .collect();
        let local = &declarations[1];
        let container = classify(local);
        assert_eq!(container.kind, ContainerKind::Reanalyzable(ReanalyzableKind::Function));
        assert_eq!(container.node, declarations[0]);
    }
}
