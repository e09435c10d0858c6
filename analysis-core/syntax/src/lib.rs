//! Syntax kinds, the [`rowan::Language`] implementation, and typed CST
//! wrappers for Lumen, plus the declaration utilities used by the structure
//! cache: structural container keys ([`DeclPath`]) and content-hash edit
//! stamps ([`EditStamp`]).

pub mod cst;

mod decl;
mod token_set;

pub use decl::*;
pub use token_set::TokenSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Tokens
    END_OF_FILE,
    WHITESPACE,
    COMMENT,
    ERROR,

    IDENT,
    INTEGER,
    STRING,
    TRUE,
    FALSE,

    FUN,
    VAL,
    VAR,
    CLASS,
    OBJECT,
    INTERFACE,
    TYPEALIAS,
    INIT,
    GET,
    SET,
    RETURN,

    PUBLIC,
    INTERNAL,
    PRIVATE,
    OPEN,
    FINAL,
    ABSTRACT,
    OVERRIDE,

    AT,
    DOT,
    COLON,
    COMMA,
    EQUALS,
    PLUS,
    STAR,
    LESS_THAN,
    GREATER_THAN,
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,

    // Nodes
    /// Transparent marker kind; never appears in a finished tree.
    Node,
    SourceFile,
    ModifierList,
    Annotation,
    FunctionDeclaration,
    PropertyDeclaration,
    ClassDeclaration,
    TypeAliasDeclaration,
    PrimaryConstructor,
    ClassBody,
    InitializerBlock,
    Getter,
    Setter,
    SuperTypeList,
    SuperTypeCall,
    TypeParameterList,
    TypeParameter,
    ValueParameterList,
    ValueParameter,
    ValueArgumentList,
    TypeReference,
    ExpressionBody,
    BlockBody,
    LiteralExpression,
    NameReference,
    CallExpression,
    BinaryExpression,
    ParenExpression,
    ReturnStatement,
    Error,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE | SyntaxKind::COMMENT)
    }

    pub fn is_literal_token(self) -> bool {
        matches!(
            self,
            SyntaxKind::INTEGER | SyntaxKind::STRING | SyntaxKind::TRUE | SyntaxKind::FALSE
        )
    }

    pub fn is_modifier_keyword(self) -> bool {
        MODIFIER_KEYWORDS.contains(self)
    }

    pub fn is_declaration_keyword(self) -> bool {
        DECLARATION_KEYWORDS.contains(self)
    }

    /// Node kinds that root a declaration and can therefore own a structure
    /// element of their own.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::FunctionDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::ClassDeclaration
                | SyntaxKind::TypeAliasDeclaration
                | SyntaxKind::InitializerBlock
        )
    }
}

pub const MODIFIER_KEYWORDS: TokenSet = TokenSet::new(&[
    SyntaxKind::PUBLIC,
    SyntaxKind::INTERNAL,
    SyntaxKind::PRIVATE,
    SyntaxKind::OPEN,
    SyntaxKind::FINAL,
    SyntaxKind::ABSTRACT,
    SyntaxKind::OVERRIDE,
]);

pub const DECLARATION_KEYWORDS: TokenSet = TokenSet::new(&[
    SyntaxKind::FUN,
    SyntaxKind::VAL,
    SyntaxKind::VAR,
    SyntaxKind::CLASS,
    SyntaxKind::OBJECT,
    SyntaxKind::INTERFACE,
    SyntaxKind::TYPEALIAS,
    SyntaxKind::INIT,
]);

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lumen {}

impl rowan::Language for Lumen {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        assert!(raw.0 <= SyntaxKind::Error as u16);
        // SAFETY: SyntaxKind is repr(u16) and raw.0 is bounds-checked above.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<Lumen>;
pub type SyntaxToken = rowan::SyntaxToken<Lumen>;
pub type SyntaxElement = rowan::SyntaxElement<Lumen>;
pub type SyntaxNodePtr = rowan::ast::SyntaxNodePtr<Lumen>;
