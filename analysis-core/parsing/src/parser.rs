use std::sync::Arc;

use drop_bomb::DropBomb;
use lexing::Lexed;
use syntax::{SyntaxKind, TokenSet};

use crate::builder::Output;

mod declarations;
mod expressions;

pub(crate) use declarations::source_file;

pub(crate) struct Parser<'l, 's> {
    lexed: &'l Lexed<'s>,
    index: usize,
    output: Vec<Output>,
}

impl<'l, 's> Parser<'l, 's> {
    pub(crate) fn new(lexed: &'l Lexed<'s>) -> Parser<'l, 's> {
        Parser { lexed, index: 0, output: vec![] }
    }

    pub(crate) fn finish(self) -> Vec<Output> {
        self.output
    }

    fn raw_kind(&self, index: usize) -> SyntaxKind {
        if index < self.lexed.len() {
            self.lexed.kind(index)
        } else {
            SyntaxKind::END_OF_FILE
        }
    }

    /// The kind of the `n`-th non-trivia token ahead of the cursor.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        let mut index = self.index;
        let mut remaining = n;
        loop {
            let kind = self.raw_kind(index);
            if kind == SyntaxKind::END_OF_FILE {
                return kind;
            }
            if !kind.is_trivia() {
                if remaining == 0 {
                    return kind;
                }
                remaining -= 1;
            }
            index += 1;
        }
    }

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_in(&self, set: TokenSet) -> bool {
        set.contains(self.current())
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(SyntaxKind::END_OF_FILE)
    }

    /// Emits pending trivia into the innermost open node.
    pub(crate) fn eat_trivia(&mut self) {
        while self.raw_kind(self.index).is_trivia() {
            let kind = self.raw_kind(self.index);
            self.output.push(Output::Token { kind });
            self.index += 1;
        }
    }

    /// Consumes the current non-trivia token, emitting pending trivia first.
    pub(crate) fn consume(&mut self) {
        self.eat_trivia();
        let kind = self.raw_kind(self.index);
        if kind == SyntaxKind::END_OF_FILE {
            return;
        }
        self.output.push(Output::Token { kind });
        self.index += 1;
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {kind:?}"));
            false
        }
    }

    pub(crate) fn error(&mut self, message: impl Into<Arc<str>>) {
        let message = message.into();
        self.output.push(Output::Error { message });
    }

    pub(crate) fn start(&mut self) -> NodeMarker {
        self.eat_trivia();
        self.start_here()
    }

    /// Starts a node without flushing pending trivia into the parent. The
    /// root node has no parent, so its leading trivia must stay inside.
    pub(crate) fn start_here(&mut self) -> NodeMarker {
        let index = self.output.len();
        self.output.push(Output::Start { kind: SyntaxKind::Node });
        NodeMarker::new(index)
    }
}

pub(crate) struct NodeMarker {
    index: usize,
    bomb: DropBomb,
}

impl NodeMarker {
    fn new(index: usize) -> NodeMarker {
        NodeMarker { index, bomb: DropBomb::new("NodeMarker must be ended") }
    }

    pub(crate) fn end(&mut self, p: &mut Parser, kind: SyntaxKind) {
        self.bomb.defuse();
        match &mut p.output[self.index] {
            Output::Start { kind: slot } => *slot = kind,
            _ => unreachable!("invariant violated: NodeMarker must point to Output::Start"),
        }
        p.output.push(Output::Finish);
    }
}
