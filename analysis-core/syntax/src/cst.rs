//! Typed wrappers over the untyped [`SyntaxNode`] tree.

use rowan::ast::{AstNode, support};
use smol_str::SmolStr;

use crate::{MODIFIER_KEYWORDS, SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! create_cst_struct {
    ($($kind:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct $kind {
                node: crate::SyntaxNode,
            }

            impl rowan::ast::AstNode for $kind {
                type Language = crate::Lumen;

                fn can_cast(kind: crate::SyntaxKind) -> bool
                where
                    Self: Sized,
                {
                    matches!(kind, crate::SyntaxKind::$kind)
                }

                fn cast(node: crate::SyntaxNode) -> Option<Self>
                where
                    Self: Sized,
                {
                    if Self::can_cast(node.kind()) {
                        Some(Self { node })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &crate::SyntaxNode {
                    &self.node
                }
            }
        )+
    };
}

macro_rules! create_cst_enum {
    ($kind:ident | $key_0:ident$(|$key:ident)*) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $kind {
            $key_0($key_0),
            $(
                $key($key),
            )*
        }

        create_cst_struct!($key_0);
        $(
            create_cst_struct!($key);
        )*

        impl rowan::ast::AstNode for $kind {
            type Language = crate::Lumen;

            fn can_cast(kind: crate::SyntaxKind) -> bool
            where
                Self: Sized,
            {
                $key_0::can_cast(kind) $(|| $key::can_cast(kind))*
            }

            fn cast(node: crate::SyntaxNode) -> Option<Self>
            where
                Self: Sized,
            {
                if $key_0::can_cast(node.kind()) {
                    Some($kind::$key_0($key_0::cast(node)?))
                } $(else if $key::can_cast(node.kind()) {
                    Some($kind::$key($key::cast(node)?))
                })* else {
                    None
                }
            }

            fn syntax(&self) -> &crate::SyntaxNode {
                match self {
                    $kind::$key_0(t) => t.syntax(),
                    $(
                        $kind::$key(t) => t.syntax(),
                    )*
                }
            }
        }
    };
}

create_cst_struct!(
    SourceFile,
    ModifierList,
    Annotation,
    PrimaryConstructor,
    ClassBody,
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
    ReturnStatement,
    Error,
);

create_cst_enum!(
    Declaration
        | FunctionDeclaration
        | PropertyDeclaration
        | ClassDeclaration
        | TypeAliasDeclaration
        | InitializerBlock
);

create_cst_enum!(
    Expression
        | LiteralExpression
        | NameReference
        | CallExpression
        | BinaryExpression
        | ParenExpression
);

fn name_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    support::token(node, SyntaxKind::IDENT)
}

fn token_text(token: Option<SyntaxToken>) -> Option<SmolStr> {
    token.map(|token| SmolStr::new(token.text()))
}

/// The type reference written after a `:` in a signature position, as
/// opposed to a receiver type, which precedes the declaration name.
fn type_after_colon(node: &SyntaxNode) -> Option<TypeReference> {
    let mut seen_colon = false;
    node.children_with_tokens().find_map(|element| match element {
        rowan::NodeOrToken::Token(token) if token.kind() == SyntaxKind::COLON => {
            seen_colon = true;
            None
        }
        rowan::NodeOrToken::Node(node) if seen_colon => TypeReference::cast(node),
        _ => None,
    })
}

fn receiver_type(node: &SyntaxNode) -> Option<TypeReference> {
    node.children_with_tokens()
        .take_while(|element| match element {
            rowan::NodeOrToken::Token(token) => {
                !matches!(token.kind(), SyntaxKind::IDENT | SyntaxKind::COLON)
            }
            rowan::NodeOrToken::Node(_) => true,
        })
        .find_map(|element| TypeReference::cast(element.into_node()?))
}

impl SourceFile {
    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.syntax().children().filter_map(Declaration::cast)
    }

    /// Modifier lists that are direct children of the file rather than part
    /// of a declaration, i.e. the dangling-modifier shape.
    pub fn dangling_modifier_lists(&self) -> impl Iterator<Item = ModifierList> + '_ {
        self.syntax().children().filter_map(ModifierList::cast)
    }
}

impl ModifierList {
    pub fn annotations(&self) -> impl Iterator<Item = Annotation> + '_ {
        self.syntax().children().filter_map(Annotation::cast)
    }

    pub fn modifier_tokens(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| MODIFIER_KEYWORDS.contains(token.kind()))
    }

    pub fn has_modifier(&self, kind: SyntaxKind) -> bool {
        self.modifier_tokens().any(|token| token.kind() == kind)
    }
}

impl Annotation {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }
}

impl FunctionDeclaration {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(self.syntax())
    }

    pub fn receiver_type(&self) -> Option<TypeReference> {
        receiver_type(self.syntax())
    }

    pub fn value_parameter_list(&self) -> Option<ValueParameterList> {
        support::child(self.syntax())
    }

    pub fn return_type(&self) -> Option<TypeReference> {
        type_after_colon(self.syntax())
    }

    pub fn expression_body(&self) -> Option<ExpressionBody> {
        support::child(self.syntax())
    }

    pub fn block_body(&self) -> Option<BlockBody> {
        support::child(self.syntax())
    }

    pub fn has_block_body(&self) -> bool {
        self.block_body().is_some()
    }
}

impl PropertyDeclaration {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn val_or_var_token(&self) -> Option<SyntaxToken> {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| matches!(token.kind(), SyntaxKind::VAL | SyntaxKind::VAR))
    }

    pub fn is_mutable(&self) -> bool {
        self.val_or_var_token().is_some_and(|token| token.kind() == SyntaxKind::VAR)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }

    pub fn receiver_type(&self) -> Option<TypeReference> {
        receiver_type(self.syntax())
    }

    pub fn type_reference(&self) -> Option<TypeReference> {
        type_after_colon(self.syntax())
    }

    pub fn initializer(&self) -> Option<ExpressionBody> {
        support::child(self.syntax())
    }

    pub fn getter(&self) -> Option<Getter> {
        support::child(self.syntax())
    }

    pub fn setter(&self) -> Option<Setter> {
        support::child(self.syntax())
    }
}

impl Getter {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn expression_body(&self) -> Option<ExpressionBody> {
        support::child(self.syntax())
    }

    pub fn block_body(&self) -> Option<BlockBody> {
        support::child(self.syntax())
    }
}

impl Setter {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn value_parameter_list(&self) -> Option<ValueParameterList> {
        support::child(self.syntax())
    }

    pub fn expression_body(&self) -> Option<ExpressionBody> {
        support::child(self.syntax())
    }

    pub fn block_body(&self) -> Option<BlockBody> {
        support::child(self.syntax())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKeyword {
    Class,
    Object,
    Interface,
}

impl ClassDeclaration {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn keyword(&self) -> Option<ClassKeyword> {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find_map(|token| match token.kind() {
                SyntaxKind::CLASS => Some(ClassKeyword::Class),
                SyntaxKind::OBJECT => Some(ClassKeyword::Object),
                SyntaxKind::INTERFACE => Some(ClassKeyword::Interface),
                _ => None,
            })
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(self.syntax())
    }

    pub fn primary_constructor(&self) -> Option<PrimaryConstructor> {
        support::child(self.syntax())
    }

    pub fn super_type_list(&self) -> Option<SuperTypeList> {
        support::child(self.syntax())
    }

    pub fn class_body(&self) -> Option<ClassBody> {
        support::child(self.syntax())
    }
}

impl ClassBody {
    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.syntax().children().filter_map(Declaration::cast)
    }
}

impl PrimaryConstructor {
    pub fn value_parameter_list(&self) -> Option<ValueParameterList> {
        support::child(self.syntax())
    }

    pub fn containing_class(&self) -> Option<ClassDeclaration> {
        self.syntax().parent().and_then(ClassDeclaration::cast)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SuperTypeEntry {
    Call(SuperTypeCall),
    Reference(TypeReference),
}

impl SuperTypeList {
    pub fn entries(&self) -> impl Iterator<Item = SuperTypeEntry> + '_ {
        self.syntax().children().filter_map(|node| {
            if let Some(call) = SuperTypeCall::cast(node.clone()) {
                Some(SuperTypeEntry::Call(call))
            } else {
                TypeReference::cast(node).map(SuperTypeEntry::Reference)
            }
        })
    }
}

impl SuperTypeCall {
    pub fn type_reference(&self) -> Option<TypeReference> {
        support::child(self.syntax())
    }

    pub fn argument_list(&self) -> Option<ValueArgumentList> {
        support::child(self.syntax())
    }
}

impl TypeAliasDeclaration {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }

    pub fn aliased_type(&self) -> Option<TypeReference> {
        support::child(self.syntax())
    }
}

impl InitializerBlock {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn block_body(&self) -> Option<BlockBody> {
        support::child(self.syntax())
    }
}

impl TypeParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = TypeParameter> + '_ {
        self.syntax().children().filter_map(TypeParameter::cast)
    }
}

impl TypeParameter {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }
}

impl ValueParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = ValueParameter> + '_ {
        self.syntax().children().filter_map(ValueParameter::cast)
    }
}

impl ValueParameter {
    pub fn modifier_list(&self) -> Option<ModifierList> {
        support::child(self.syntax())
    }

    pub fn val_or_var_token(&self) -> Option<SyntaxToken> {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| matches!(token.kind(), SyntaxKind::VAL | SyntaxKind::VAR))
    }

    /// `val`/`var` constructor parameters declare a property on the class.
    pub fn is_property_parameter(&self) -> bool {
        self.val_or_var_token().is_some()
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }

    pub fn type_reference(&self) -> Option<TypeReference> {
        type_after_colon(self.syntax())
    }

    pub fn default_value(&self) -> Option<ExpressionBody> {
        support::child(self.syntax())
    }
}

impl ValueArgumentList {
    pub fn arguments(&self) -> impl Iterator<Item = Expression> + '_ {
        self.syntax().children().filter_map(Expression::cast)
    }
}

impl TypeReference {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }
}

impl ExpressionBody {
    pub fn expression(&self) -> Option<Expression> {
        support::child(self.syntax())
    }
}

impl BlockBody {
    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.syntax().children().filter_map(Declaration::cast)
    }

    pub fn expressions(&self) -> impl Iterator<Item = Expression> + '_ {
        self.syntax().children().filter_map(Expression::cast)
    }

    pub fn return_statements(&self) -> impl Iterator<Item = ReturnStatement> + '_ {
        self.syntax().children().filter_map(ReturnStatement::cast)
    }
}

impl LiteralExpression {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind().is_literal_token())
    }
}

impl NameReference {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        name_token(self.syntax())
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(self.name_token())
    }
}

impl CallExpression {
    pub fn callee(&self) -> Option<NameReference> {
        support::child(self.syntax())
    }

    pub fn argument_list(&self) -> Option<ValueArgumentList> {
        support::child(self.syntax())
    }
}

impl BinaryExpression {
    pub fn operator_token(&self) -> Option<SyntaxToken> {
        self.syntax()
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| matches!(token.kind(), SyntaxKind::PLUS | SyntaxKind::STAR))
    }

    pub fn lhs(&self) -> Option<Expression> {
        support::child(self.syntax())
    }

    pub fn rhs(&self) -> Option<Expression> {
        self.syntax().children().filter_map(Expression::cast).nth(1)
    }
}

impl ParenExpression {
    pub fn expression(&self) -> Option<Expression> {
        support::child(self.syntax())
    }
}

impl ReturnStatement {
    pub fn value(&self) -> Option<Expression> {
        support::child(self.syntax())
    }
}

impl Declaration {
    pub fn name(&self) -> Option<SmolStr> {
        match self {
            Declaration::FunctionDeclaration(cst) => cst.name(),
            Declaration::PropertyDeclaration(cst) => cst.name(),
            Declaration::ClassDeclaration(cst) => cst.name(),
            Declaration::TypeAliasDeclaration(cst) => cst.name(),
            Declaration::InitializerBlock(_) => None,
        }
    }
}
