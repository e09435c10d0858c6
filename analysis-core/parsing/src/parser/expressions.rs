use syntax::{SyntaxKind, TokenSet};

use super::Parser;

pub(super) const EXPRESSION_START: TokenSet = TokenSet::new(&[
    SyntaxKind::INTEGER,
    SyntaxKind::STRING,
    SyntaxKind::TRUE,
    SyntaxKind::FALSE,
    SyntaxKind::IDENT,
    SyntaxKind::LEFT_PAREN,
]);

pub(super) fn expression(p: &mut Parser) {
    if !p.at_in(EXPRESSION_START) {
        return p.error("expected an expression");
    }
    binary_expression(p);
}

/// Binary operators are parsed right-associative at a single precedence
/// level. The operand shapes are simple enough to scan ahead for the
/// operator before committing to a node.
fn binary_expression(p: &mut Parser) {
    if operator_follows_operand(p) {
        let mut m = p.start();
        primary_expression(p);
        p.consume();
        if p.at_in(EXPRESSION_START) {
            binary_expression(p);
        } else {
            p.error("expected an expression");
        }
        m.end(p, SyntaxKind::BinaryExpression);
    } else {
        primary_expression(p);
    }
}

fn operator_follows_operand(p: &Parser) -> bool {
    let n = match p.nth(0) {
        SyntaxKind::INTEGER | SyntaxKind::STRING | SyntaxKind::TRUE | SyntaxKind::FALSE => 1,
        SyntaxKind::IDENT => {
            if p.nth(1) == SyntaxKind::LEFT_PAREN {
                skip_balanced_parens(p, 1)
            } else {
                1
            }
        }
        SyntaxKind::LEFT_PAREN => skip_balanced_parens(p, 0),
        _ => return false,
    };
    matches!(p.nth(n), SyntaxKind::PLUS | SyntaxKind::STAR)
}

/// The lookahead index just past the parenthesis group starting at `n`.
fn skip_balanced_parens(p: &Parser, mut n: usize) -> usize {
    let mut depth = 0usize;
    loop {
        match p.nth(n) {
            SyntaxKind::LEFT_PAREN => depth += 1,
            SyntaxKind::RIGHT_PAREN => {
                if depth <= 1 {
                    return n + 1;
                }
                depth -= 1;
            }
            SyntaxKind::END_OF_FILE => return n,
            _ => {}
        }
        n += 1;
    }
}

fn primary_expression(p: &mut Parser) {
    match p.current() {
        SyntaxKind::INTEGER | SyntaxKind::STRING | SyntaxKind::TRUE | SyntaxKind::FALSE => {
            let mut m = p.start();
            p.consume();
            m.end(p, SyntaxKind::LiteralExpression);
        }
        SyntaxKind::IDENT => {
            if p.nth(1) == SyntaxKind::LEFT_PAREN {
                call_expression(p);
            } else {
                name_reference(p);
            }
        }
        SyntaxKind::LEFT_PAREN => {
            let mut m = p.start();
            p.consume();
            expression(p);
            p.expect(SyntaxKind::RIGHT_PAREN);
            m.end(p, SyntaxKind::ParenExpression);
        }
        kind => unreachable!("invariant violated: unexpected expression start {kind:?}"),
    }
}

fn name_reference(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::IDENT);
    m.end(p, SyntaxKind::NameReference);
}

fn call_expression(p: &mut Parser) {
    let mut m = p.start();
    name_reference(p);
    value_argument_list(p);
    m.end(p, SyntaxKind::CallExpression);
}

pub(super) fn value_argument_list(p: &mut Parser) {
    let mut m = p.start();
    p.expect(SyntaxKind::LEFT_PAREN);
    while !p.at(SyntaxKind::RIGHT_PAREN) && !p.at_eof() {
        if p.at_in(EXPRESSION_START) {
            expression(p);
        } else {
            let mut e = p.start();
            p.error("expected an argument");
            p.consume();
            e.end(p, SyntaxKind::Error);
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::RIGHT_PAREN);
    m.end(p, SyntaxKind::ValueArgumentList);
}
