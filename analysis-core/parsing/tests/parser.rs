use rowan::ast::AstNode;
use syntax::{SyntaxKind, cst};
use test_each_file::test_each_file;

test_each_file! { in "./analysis-core/parsing/tests/parser" as lossless => |content: &str| {
    let lexed = lexing::lex(content);
    let (parsed, _) = parsing::parse(&lexed);
    let node = parsed.syntax_node();
    assert_eq!(node.to_string(), content);
}}

test_each_file! { in "./analysis-core/parsing/tests/parser" as stability => |content: &str| {
    for (index, _) in content.char_indices() {
        let partial = &content[..index];
        let lexed = lexing::lex(partial);
        let (parsed, _) = parsing::parse(&lexed);
        let node = parsed.syntax_node();
        assert_eq!(node.to_string(), partial);
    }
}}

fn parse(source: &str) -> cst::SourceFile {
    let (parsed, errors) = parsing::parse_source(source);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    parsed.cst()
}

#[test]
fn test_function_shapes() {
    let file = parse("fun f(): Int = 1\nfun g(x: Int) { return x }\nfun Int.h() {}");
    let functions: Vec<_> = file
        .declarations()
        .filter_map(|declaration| match declaration {
            cst::Declaration::FunctionDeclaration(cst) => Some(cst),
            _ => None,
        })
        .collect();
    assert_eq!(functions.len(), 3);

    let f = &functions[0];
    assert_eq!(f.name().as_deref(), Some("f"));
    assert_eq!(f.return_type().and_then(|cst| cst.name()).as_deref(), Some("Int"));
    assert!(f.expression_body().is_some());
    assert!(!f.has_block_body());

    let g = &functions[1];
    assert!(g.has_block_body());
    let parameters: Vec<_> =
        g.value_parameter_list().map(|cst| cst.parameters().collect()).unwrap_or_default();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0].name().as_deref(), Some("x"));

    let h = &functions[2];
    assert_eq!(h.name().as_deref(), Some("h"));
    assert_eq!(h.receiver_type().and_then(|cst| cst.name()).as_deref(), Some("Int"));
    assert_eq!(h.return_type(), None);
}

#[test]
fn test_property_accessors() {
    let file = parse("val x: Int = 1\n    get() = 2\nvar y: Int = 3\n    set(value) {}");
    let properties: Vec<_> = file
        .declarations()
        .filter_map(|declaration| match declaration {
            cst::Declaration::PropertyDeclaration(cst) => Some(cst),
            _ => None,
        })
        .collect();
    assert_eq!(properties.len(), 2);

    let x = &properties[0];
    assert!(!x.is_mutable());
    assert!(x.getter().is_some());
    assert!(x.setter().is_none());

    let y = &properties[1];
    assert!(y.is_mutable());
    assert!(y.setter().is_some());
}

#[test]
fn test_class_with_constructor_and_supertypes() {
    let file = parse("open class Base(val n: Int)\nclass C(val x: Int): Base(x), Marker {\n    fun member() {}\n}");
    let classes: Vec<_> = file
        .declarations()
        .filter_map(|declaration| match declaration {
            cst::Declaration::ClassDeclaration(cst) => Some(cst),
            _ => None,
        })
        .collect();
    assert_eq!(classes.len(), 2);

    let base = &classes[0];
    assert!(base.modifier_list().is_some_and(|cst| cst.has_modifier(SyntaxKind::OPEN)));
    let parameters: Vec<_> = base
        .primary_constructor()
        .and_then(|cst| cst.value_parameter_list())
        .map(|cst| cst.parameters().collect())
        .unwrap_or_default();
    assert!(parameters[0].is_property_parameter());

    let c = &classes[1];
    let entries: Vec<_> =
        c.super_type_list().map(|cst| cst.entries().collect()).unwrap_or_default();
    assert_eq!(entries.len(), 2);
    assert!(matches!(entries[0], cst::SuperTypeEntry::Call(_)));
    assert!(matches!(entries[1], cst::SuperTypeEntry::Reference(_)));
    assert_eq!(c.class_body().map(|cst| cst.declarations().count()), Some(1));
}

#[test]
fn test_annotations_and_typealias() {
    let file = parse("@Ann\nprivate fun f() {}\ntypealias Name = String");
    let mut declarations = file.declarations();

    let Some(cst::Declaration::FunctionDeclaration(f)) = declarations.next() else {
        panic!("expected a function");
    };
    let modifiers = f.modifier_list().unwrap();
    assert_eq!(
        modifiers.annotations().next().and_then(|cst| cst.name()).as_deref(),
        Some("Ann")
    );
    assert!(modifiers.has_modifier(SyntaxKind::PRIVATE));

    let Some(cst::Declaration::TypeAliasDeclaration(alias)) = declarations.next() else {
        panic!("expected a type alias");
    };
    assert_eq!(alias.name().as_deref(), Some("Name"));
    assert_eq!(alias.aliased_type().and_then(|cst| cst.name()).as_deref(), Some("String"));
}

#[test]
fn test_dangling_modifiers_form_their_own_list() {
    let (parsed, errors) = parsing::parse_source("@Ann\nfun f() {}");
    assert!(errors.is_empty());
    let file = parsed.cst();
    assert_eq!(file.dangling_modifier_lists().count(), 0);

    let (parsed, errors) = parsing::parse_source("@Ann");
    assert!(!errors.is_empty());
    let file = parsed.cst();
    assert_eq!(file.dangling_modifier_lists().count(), 1);
    assert_eq!(file.declarations().count(), 0);

    // Dangling annotation inside a class body.
    let (parsed, errors) = parsing::parse_source("class C {\n    @Ann\n}");
    assert!(!errors.is_empty());
    let file = parsed.cst();
    let Some(cst::Declaration::ClassDeclaration(c)) = file.declarations().next() else {
        panic!("expected a class");
    };
    let body = c.class_body().unwrap();
    let dangling = body
        .syntax()
        .children()
        .filter(|node| node.kind() == SyntaxKind::ModifierList)
        .count();
    assert_eq!(dangling, 1);
}

#[test]
fn test_recovery_keeps_following_declarations() {
    let (parsed, errors) = parsing::parse_source("???\nfun f() {}");
    assert!(!errors.is_empty());
    let file = parsed.cst();
    assert_eq!(file.declarations().count(), 1);
    assert_eq!(file.syntax().to_string(), "???\nfun f() {}");
}

#[test]
fn test_binary_expressions() {
    let file = parse("fun f(): Int = 1 + f(2) * (3 + 4)");
    let Some(cst::Declaration::FunctionDeclaration(f)) = file.declarations().next() else {
        panic!("expected a function");
    };
    let body = f.expression_body().unwrap();
    let Some(cst::Expression::BinaryExpression(outer)) = body.expression() else {
        panic!("expected a binary expression");
    };
    assert_eq!(outer.operator_token().map(|token| token.kind()), Some(SyntaxKind::PLUS));
    assert!(matches!(outer.lhs(), Some(cst::Expression::LiteralExpression(_))));
    let Some(cst::Expression::BinaryExpression(inner)) = outer.rhs() else {
        panic!("expected a nested binary expression");
    };
    assert!(matches!(inner.lhs(), Some(cst::Expression::CallExpression(_))));
    assert!(matches!(inner.rhs(), Some(cst::Expression::ParenExpression(_))));
}
