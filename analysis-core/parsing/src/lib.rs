use std::sync::Arc;

use lexing::Lexed;
use rowan::{GreenNode, ast::AstNode};
use syntax::{SyntaxNode, cst};

mod builder;
mod parser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub offset: u32,
    pub message: Arc<str>,
}

/// A parsed compilation unit. Holds the green tree, which is cheap to clone
/// and safe to share across threads; syntax nodes are re-rooted on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    node: GreenNode,
}

impl ParsedUnit {
    pub(crate) fn new(node: GreenNode) -> ParsedUnit {
        ParsedUnit { node }
    }

    pub fn green(&self) -> GreenNode {
        self.node.clone()
    }

    pub fn syntax_node(&self) -> SyntaxNode {
        let node = self.node.clone();
        SyntaxNode::new_root(node)
    }

    pub fn cst(&self) -> cst::SourceFile {
        let node = self.syntax_node();
        cst::SourceFile::cast(node).expect("invariant violated: expected cst::SourceFile")
    }
}

pub type FullParsedUnit = (ParsedUnit, Arc<[ParseError]>);

pub fn parse(lexed: &Lexed<'_>) -> FullParsedUnit {
    let mut parser = parser::Parser::new(lexed);
    parser::source_file(&mut parser);

    let output = parser.finish();
    let (parsed, errors) = builder::build(lexed, output);

    (parsed, Arc::from(errors))
}

/// Lexes and parses a source string in one step.
pub fn parse_source(source: &str) -> FullParsedUnit {
    parse(&lexing::lex(source))
}
