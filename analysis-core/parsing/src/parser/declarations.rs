use syntax::{MODIFIER_KEYWORDS, SyntaxKind, TokenSet};

use super::{Parser, expressions};

const MODIFIER_START: TokenSet = MODIFIER_KEYWORDS.union(TokenSet::new(&[SyntaxKind::AT]));

const RECOVERY: TokenSet = syntax::DECLARATION_KEYWORDS
    .union(MODIFIER_START)
    .union(TokenSet::new(&[SyntaxKind::RIGHT_BRACE]));

pub(crate) fn source_file(p: &mut Parser) {
    let mut m = p.start_here();
    while !p.at_eof() {
        declaration(p);
    }
    p.eat_trivia();
    m.end(p, SyntaxKind::SourceFile);
}

/// The declaration keyword that follows the modifier list at the cursor, if
/// any. Decides whether modifiers belong to a declaration or are dangling.
fn declaration_keyword_after_modifiers(p: &Parser) -> Option<SyntaxKind> {
    let mut n = 0;
    loop {
        let kind = p.nth(n);
        if MODIFIER_KEYWORDS.contains(kind) {
            n += 1;
        } else if kind == SyntaxKind::AT {
            n += 1;
            if p.nth(n) == SyntaxKind::IDENT {
                n += 1;
            }
        } else if kind.is_declaration_keyword() {
            return Some(kind);
        } else {
            return None;
        }
    }
}

pub(super) fn declaration(p: &mut Parser) {
    match declaration_keyword_after_modifiers(p) {
        Some(SyntaxKind::FUN) => function_declaration(p),
        Some(SyntaxKind::VAL | SyntaxKind::VAR) => property_declaration(p),
        Some(SyntaxKind::CLASS | SyntaxKind::OBJECT | SyntaxKind::INTERFACE) => {
            class_declaration(p);
        }
        Some(SyntaxKind::TYPEALIAS) => type_alias_declaration(p),
        Some(SyntaxKind::INIT) => initializer_block(p),
        Some(kind) => unreachable!("invariant violated: unexpected declaration keyword {kind:?}"),
        None => dangling_or_recover(p),
    }
}

/// Modifiers with no declaration to attach to stay in the tree as a
/// stand-alone modifier list; anything else is consumed into an error node
/// until the next safe point.
fn dangling_or_recover(p: &mut Parser) {
    if p.at_in(MODIFIER_START) {
        modifier_list(p);
        p.error("expected a declaration after modifiers");
        return;
    }
    let mut e = p.start();
    p.error("expected a declaration");
    // A stray closing brace is in the recovery set; consume it here so the
    // enclosing loop always makes progress.
    if p.at(SyntaxKind::RIGHT_BRACE) {
        p.consume();
    }
    while !p.at_in(RECOVERY) && !p.at_eof() {
        p.consume();
    }
    e.end(p, SyntaxKind::Error);
}

fn modifier_list(p: &mut Parser) {
    if !p.at_in(MODIFIER_START) {
        return;
    }
    let mut m = p.start();
    loop {
        if p.at_in(MODIFIER_KEYWORDS) {
            p.consume();
        } else if p.at(SyntaxKind::AT) {
            annotation(p);
        } else {
            break;
        }
    }
    m.end(p, SyntaxKind::ModifierList);
}

fn annotation(p: &mut Parser) {
    let mut m = p.start();
    p.consume();
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected an annotation name");
    }
    m.end(p, SyntaxKind::Annotation);
}

/// `Receiver.name` in a function or property signature.
fn receiver_and_name(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) && p.nth(1) == SyntaxKind::DOT {
        type_reference(p);
        p.expect(SyntaxKind::DOT);
    }
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected a name");
    }
}

fn function_declaration(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    p.expect(SyntaxKind::FUN);
    if p.at(SyntaxKind::LESS_THAN) {
        type_parameter_list(p);
    }
    receiver_and_name(p);
    if p.at(SyntaxKind::LEFT_PAREN) {
        value_parameter_list(p);
    } else {
        p.error("expected a parameter list");
    }
    if p.eat(SyntaxKind::COLON) {
        type_reference(p);
    }
    if p.at(SyntaxKind::EQUALS) {
        expression_body(p);
    } else if p.at(SyntaxKind::LEFT_BRACE) {
        block_body(p);
    }
    m.end(p, SyntaxKind::FunctionDeclaration);
}

fn property_declaration(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    p.consume();
    receiver_and_name(p);
    if p.eat(SyntaxKind::COLON) {
        type_reference(p);
    }
    if p.at(SyntaxKind::EQUALS) {
        expression_body(p);
    }
    while matches!(p.current(), SyntaxKind::GET | SyntaxKind::SET) {
        accessor(p);
    }
    m.end(p, SyntaxKind::PropertyDeclaration);
}

fn accessor(p: &mut Parser) {
    let mut m = p.start();
    let kind =
        if p.current() == SyntaxKind::GET { SyntaxKind::Getter } else { SyntaxKind::Setter };
    p.consume();
    if p.at(SyntaxKind::LEFT_PAREN) {
        value_parameter_list(p);
    }
    if p.at(SyntaxKind::EQUALS) {
        expression_body(p);
    } else if p.at(SyntaxKind::LEFT_BRACE) {
        block_body(p);
    }
    m.end(p, kind);
}

fn class_declaration(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    p.consume();
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected a class name");
    }
    if p.at(SyntaxKind::LESS_THAN) {
        type_parameter_list(p);
    }
    if p.at(SyntaxKind::LEFT_PAREN) {
        primary_constructor(p);
    }
    if p.at(SyntaxKind::COLON) {
        super_type_list(p);
    }
    if p.at(SyntaxKind::LEFT_BRACE) {
        class_body(p);
    }
    m.end(p, SyntaxKind::ClassDeclaration);
}

fn primary_constructor(p: &mut Parser) {
    let mut m = p.start();
    value_parameter_list(p);
    m.end(p, SyntaxKind::PrimaryConstructor);
}

fn super_type_list(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::COLON);
    loop {
        super_type_entry(p);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    m.end(p, SyntaxKind::SuperTypeList);
}

fn super_type_entry(p: &mut Parser) {
    if !p.at(SyntaxKind::IDENT) {
        return p.error("expected a supertype");
    }
    if p.nth(1) == SyntaxKind::LEFT_PAREN {
        let mut m = p.start();
        type_reference(p);
        expressions::value_argument_list(p);
        m.end(p, SyntaxKind::SuperTypeCall);
    } else {
        type_reference(p);
    }
}

fn class_body(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::LEFT_BRACE);
    while !p.at(SyntaxKind::RIGHT_BRACE) && !p.at_eof() {
        declaration(p);
    }
    p.expect(SyntaxKind::RIGHT_BRACE);
    m.end(p, SyntaxKind::ClassBody);
}

fn type_alias_declaration(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    p.expect(SyntaxKind::TYPEALIAS);
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected a type alias name");
    }
    p.expect(SyntaxKind::EQUALS);
    type_reference(p);
    m.end(p, SyntaxKind::TypeAliasDeclaration);
}

fn initializer_block(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    p.expect(SyntaxKind::INIT);
    if p.at(SyntaxKind::LEFT_BRACE) {
        block_body(p);
    } else {
        p.error("expected an initializer body");
    }
    m.end(p, SyntaxKind::InitializerBlock);
}

fn type_parameter_list(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::LESS_THAN);
    loop {
        if p.at(SyntaxKind::IDENT) {
            let mut t = p.start();
            p.consume();
            t.end(p, SyntaxKind::TypeParameter);
        } else {
            p.error("expected a type parameter");
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::GREATER_THAN);
    m.end(p, SyntaxKind::TypeParameterList);
}

const PARAMETER_START: TokenSet = MODIFIER_START
    .union(TokenSet::new(&[SyntaxKind::VAL, SyntaxKind::VAR, SyntaxKind::IDENT]));

pub(super) fn value_parameter_list(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::LEFT_PAREN);
    while !p.at(SyntaxKind::RIGHT_PAREN) && !p.at_eof() {
        if p.at_in(PARAMETER_START) {
            value_parameter(p);
        } else {
            let mut e = p.start();
            p.error("expected a parameter");
            p.consume();
            e.end(p, SyntaxKind::Error);
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::RIGHT_PAREN);
    m.end(p, SyntaxKind::ValueParameterList);
}

fn value_parameter(p: &mut Parser) {
    let mut m = p.start();
    modifier_list(p);
    if matches!(p.current(), SyntaxKind::VAL | SyntaxKind::VAR) {
        p.consume();
    }
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected a parameter name");
    }
    if p.eat(SyntaxKind::COLON) {
        type_reference(p);
    }
    if p.at(SyntaxKind::EQUALS) {
        expression_body(p);
    }
    m.end(p, SyntaxKind::ValueParameter);
}

pub(super) fn type_reference(p: &mut Parser) {
    let mut m = p.start();
    if !p.eat(SyntaxKind::IDENT) {
        p.error("expected a type name");
    }
    m.end(p, SyntaxKind::TypeReference);
}

pub(super) fn expression_body(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::EQUALS);
    expressions::expression(p);
    m.end(p, SyntaxKind::ExpressionBody);
}

pub(super) fn block_body(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::LEFT_BRACE);
    while !p.at(SyntaxKind::RIGHT_BRACE) && !p.at_eof() {
        statement(p);
    }
    p.expect(SyntaxKind::RIGHT_BRACE);
    m.end(p, SyntaxKind::BlockBody);
}

fn statement(p: &mut Parser) {
    if p.at(SyntaxKind::RETURN) {
        return return_statement(p);
    }
    if declaration_keyword_after_modifiers(p).is_some() {
        return declaration(p);
    }
    if p.at_in(expressions::EXPRESSION_START) {
        return expressions::expression(p);
    }
    let mut e = p.start();
    p.error("expected a statement");
    p.consume();
    e.end(p, SyntaxKind::Error);
}

fn return_statement(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::RETURN);
    if p.at_in(expressions::EXPRESSION_START) {
        expressions::expression(p);
    }
    m.end(p, SyntaxKind::ReturnStatement);
}
