use syntax::SyntaxKind;

use crate::lexed::{LexError, Lexed};

pub(crate) struct Lexer<'s> {
    source: &'s str,
    position: usize,
    kinds: Vec<SyntaxKind>,
    offsets: Vec<u32>,
    errors: Vec<LexError>,
}

fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "fun" => SyntaxKind::FUN,
        "val" => SyntaxKind::VAL,
        "var" => SyntaxKind::VAR,
        "class" => SyntaxKind::CLASS,
        "object" => SyntaxKind::OBJECT,
        "interface" => SyntaxKind::INTERFACE,
        "typealias" => SyntaxKind::TYPEALIAS,
        "init" => SyntaxKind::INIT,
        "get" => SyntaxKind::GET,
        "set" => SyntaxKind::SET,
        "return" => SyntaxKind::RETURN,
        "true" => SyntaxKind::TRUE,
        "false" => SyntaxKind::FALSE,
        "public" => SyntaxKind::PUBLIC,
        "internal" => SyntaxKind::INTERNAL,
        "private" => SyntaxKind::PRIVATE,
        "open" => SyntaxKind::OPEN,
        "final" => SyntaxKind::FINAL,
        "abstract" => SyntaxKind::ABSTRACT,
        "override" => SyntaxKind::OVERRIDE,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(source: &'s str) -> Lexer<'s> {
        Lexer { source, position: 0, kinds: vec![], offsets: vec![], errors: vec![] }
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    pub(crate) fn finish(mut self) -> Lexed<'s> {
        self.offsets.push(self.position as u32);
        self.kinds.push(SyntaxKind::END_OF_FILE);
        self.offsets.push(self.position as u32);
        Lexed::new(self.source, self.kinds, self.offsets, self.errors)
    }

    fn rest(&self) -> &'s str {
        &self.source[self.position..]
    }

    fn first(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
        let taken: usize =
            self.rest().chars().take_while(|&c| predicate(c)).map(char::len_utf8).sum();
        self.position += taken;
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        self.kinds.push(kind);
        self.offsets.push(start as u32);
    }

    fn push_error(&mut self, start: usize, message: impl Into<String>) {
        self.push(SyntaxKind::ERROR, start);
        let index = (self.kinds.len() - 1) as u32;
        self.errors.push(LexError { index, message: message.into() });
    }

    pub(crate) fn take_token(&mut self) {
        let start = self.position;
        let Some(c) = self.first() else { return };

        if c.is_whitespace() {
            self.take_while(char::is_whitespace);
            return self.push(SyntaxKind::WHITESPACE, start);
        }

        if self.rest().starts_with("//") {
            self.take_while(|c| c != '\n');
            return self.push(SyntaxKind::COMMENT, start);
        }

        if self.rest().starts_with("/*") {
            return self.take_block_comment(start);
        }

        if is_ident_start(c) {
            self.take_while(is_ident_continue);
            let text = &self.source[start..self.position];
            let kind = keyword_kind(text).unwrap_or(SyntaxKind::IDENT);
            return self.push(kind, start);
        }

        if c.is_ascii_digit() {
            self.take_while(|c| c.is_ascii_digit() || c == '_');
            return self.push(SyntaxKind::INTEGER, start);
        }

        if c == '"' {
            return self.take_string(start);
        }

        let kind = match c {
            '@' => SyntaxKind::AT,
            '.' => SyntaxKind::DOT,
            ':' => SyntaxKind::COLON,
            ',' => SyntaxKind::COMMA,
            '=' => SyntaxKind::EQUALS,
            '+' => SyntaxKind::PLUS,
            '*' => SyntaxKind::STAR,
            '<' => SyntaxKind::LESS_THAN,
            '>' => SyntaxKind::GREATER_THAN,
            '(' => SyntaxKind::LEFT_PAREN,
            ')' => SyntaxKind::RIGHT_PAREN,
            '{' => SyntaxKind::LEFT_BRACE,
            '}' => SyntaxKind::RIGHT_BRACE,
            _ => {
                self.position += c.len_utf8();
                return self.push_error(start, format!("unexpected character '{c}'"));
            }
        };
        self.position += c.len_utf8();
        self.push(kind, start);
    }

    fn take_block_comment(&mut self, start: usize) {
        self.position += 2;
        let mut depth = 1usize;
        while depth > 0 {
            if self.rest().starts_with("/*") {
                depth += 1;
                self.position += 2;
            } else if self.rest().starts_with("*/") {
                depth -= 1;
                self.position += 2;
            } else if let Some(c) = self.first() {
                self.position += c.len_utf8();
            } else {
                return self.push_error(start, "unterminated block comment");
            }
        }
        self.push(SyntaxKind::COMMENT, start);
    }

    fn take_string(&mut self, start: usize) {
        self.position += 1;
        loop {
            match self.first() {
                None | Some('\n') => {
                    return self.push_error(start, "unterminated string literal");
                }
                Some('"') => {
                    self.position += 1;
                    return self.push(SyntaxKind::STRING, start);
                }
                Some('\\') => {
                    self.position += 1;
                    if let Some(escaped) = self.first() {
                        self.position += escaped.len_utf8();
                    }
                }
                Some(c) => {
                    self.position += c.len_utf8();
                }
            }
        }
    }
}
