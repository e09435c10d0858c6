use std::sync::Arc;

use lexing::Lexed;
use rowan::GreenNodeBuilder;
use syntax::SyntaxKind;

use crate::{ParseError, ParsedUnit};

#[derive(Debug)]
pub(crate) enum Output {
    Start { kind: SyntaxKind },
    Token { kind: SyntaxKind },
    Error { message: Arc<str> },
    Finish,
}

struct Builder<'l, 's> {
    lexed: &'l Lexed<'s>,
    index: usize,
    builder: GreenNodeBuilder<'static>,
    skipped: Vec<bool>,
    errors: Vec<ParseError>,
}

impl<'l, 's> Builder<'l, 's> {
    fn new(lexed: &'l Lexed<'s>) -> Builder<'l, 's> {
        let index = 0;
        let builder = GreenNodeBuilder::new();
        let skipped = vec![];
        let errors = vec![];
        Builder { lexed, index, builder, skipped, errors }
    }

    fn build(self) -> (ParsedUnit, Vec<ParseError>) {
        let node = self.builder.finish();
        (ParsedUnit::new(node), self.errors)
    }

    fn start(&mut self, kind: SyntaxKind) {
        if kind == SyntaxKind::Node {
            self.skipped.push(true);
        } else {
            self.skipped.push(false);
            self.builder.start_node(kind.into());
        }
    }

    fn token(&mut self, kind: SyntaxKind) {
        if let Some(message) = self.lexed.error(self.index) {
            let offset = self.lexed.offset(self.index);
            self.errors.push(ParseError { offset, message: Arc::from(message) });
        }

        let text = self.lexed.text(self.index);
        self.builder.token(kind.into(), text);

        self.index += 1;
    }

    fn error(&mut self, message: Arc<str>) {
        let offset = self.lexed.offset(self.index);
        self.errors.push(ParseError { offset, message });
    }

    fn finish(&mut self) {
        if self.skipped.pop() == Some(false) {
            self.builder.finish_node();
        }
    }
}

pub(crate) fn build(lexed: &Lexed<'_>, output: Vec<Output>) -> (ParsedUnit, Vec<ParseError>) {
    let mut builder = Builder::new(lexed);

    for event in output {
        match event {
            Output::Start { kind } => builder.start(kind),
            Output::Token { kind } => builder.token(kind),
            Output::Error { message } => builder.error(message),
            Output::Finish => builder.finish(),
        }
    }

    builder.build()
}
