use rowan::ast::AstNode;
use semantic::{BinaryOp, BodyNode, BodyNodeId, BodyNodeKind, BodyTree, Diagnostic, TypeRef};
use syntax::{SyntaxKind, SyntaxNode, SyntaxNodePtr, cst};

use crate::scope::Scope;

struct BodyLowerer<'a> {
    scope: &'a Scope,
    tree: BodyTree,
}

impl BodyLowerer<'_> {
    fn alloc(&mut self, kind: BodyNodeKind, node: &SyntaxNode, ty: TypeRef) -> BodyNodeId {
        self.tree.alloc(BodyNode { kind, ptr: SyntaxNodePtr::new(node), ty })
    }

    fn missing(&mut self, node: &SyntaxNode) -> BodyNodeId {
        self.alloc(BodyNodeKind::Missing, node, TypeRef::Error)
    }

    fn ty_of(&self, id: BodyNodeId) -> TypeRef {
        self.tree.node(id).ty.clone()
    }

    fn lower_expression(&mut self, expression: &cst::Expression) -> BodyNodeId {
        match expression {
            cst::Expression::LiteralExpression(cst) => self.lower_literal(cst),
            cst::Expression::NameReference(cst) => self.lower_name_reference(cst),
            cst::Expression::CallExpression(cst) => self.lower_call(cst),
            cst::Expression::BinaryExpression(cst) => self.lower_binary(cst),
            cst::Expression::ParenExpression(cst) => self.lower_paren(cst),
        }
    }

    fn lower_literal(&mut self, cst: &cst::LiteralExpression) -> BodyNodeId {
        let ty = match cst.token().map(|token| token.kind()) {
            Some(SyntaxKind::INTEGER) => TypeRef::Named("Int".into()),
            Some(SyntaxKind::STRING) => TypeRef::Named("String".into()),
            Some(SyntaxKind::TRUE | SyntaxKind::FALSE) => TypeRef::Named("Boolean".into()),
            _ => TypeRef::Error,
        };
        self.alloc(BodyNodeKind::Literal, cst.syntax(), ty)
    }

    fn lower_name_reference(&mut self, cst: &cst::NameReference) -> BodyNodeId {
        let Some(name) = cst.name() else {
            return self.missing(cst.syntax());
        };
        match self.scope.lookup(&name) {
            Some(entry) => {
                let kind = BodyNodeKind::NameRef { name, resolved: entry.symbol };
                let ty = entry.ty.clone();
                self.alloc(kind, cst.syntax(), ty)
            }
            None => {
                let range = cst.syntax().text_range();
                self.tree
                    .diagnostics
                    .push(Diagnostic::error(range, format!("unresolved reference '{name}'")));
                let kind = BodyNodeKind::NameRef { name, resolved: None };
                self.alloc(kind, cst.syntax(), TypeRef::Error)
            }
        }
    }

    fn lower_call(&mut self, cst: &cst::CallExpression) -> BodyNodeId {
        let callee = match cst.callee() {
            Some(callee) => self.lower_name_reference(&callee),
            None => self.missing(cst.syntax()),
        };
        let arguments = cst
            .argument_list()
            .into_iter()
            .flat_map(|list| list.arguments().collect::<Vec<_>>())
            .map(|argument| self.lower_expression(&argument))
            .collect();
        let ty = self.ty_of(callee);
        self.alloc(BodyNodeKind::Call { callee, arguments }, cst.syntax(), ty)
    }

    fn lower_binary(&mut self, cst: &cst::BinaryExpression) -> BodyNodeId {
        let lhs = match cst.lhs() {
            Some(lhs) => self.lower_expression(&lhs),
            None => self.missing(cst.syntax()),
        };
        let rhs = match cst.rhs() {
            Some(rhs) => self.lower_expression(&rhs),
            None => self.missing(cst.syntax()),
        };
        let op = match cst.operator_token().map(|token| token.kind()) {
            Some(SyntaxKind::STAR) => BinaryOp::Multiply,
            _ => BinaryOp::Add,
        };
        let ty = self.ty_of(lhs);
        self.alloc(BodyNodeKind::Binary { op, lhs, rhs }, cst.syntax(), ty)
    }

    fn lower_paren(&mut self, cst: &cst::ParenExpression) -> BodyNodeId {
        let inner = match cst.expression() {
            Some(inner) => self.lower_expression(&inner),
            None => self.missing(cst.syntax()),
        };
        let ty = self.ty_of(inner);
        self.alloc(BodyNodeKind::Paren { inner }, cst.syntax(), ty)
    }

    fn lower_expression_body(&mut self, cst: &cst::ExpressionBody) -> BodyNodeId {
        match cst.expression() {
            Some(expression) => self.lower_expression(&expression),
            None => self.missing(cst.syntax()),
        }
    }

    fn lower_block(&mut self, cst: &cst::BlockBody) -> BodyNodeId {
        let mut statements = vec![];
        for child in cst.syntax().children() {
            if let Some(expression) = cst::Expression::cast(child.clone()) {
                statements.push(self.lower_expression(&expression));
            } else if let Some(statement) = cst::ReturnStatement::cast(child) {
                let value = statement.value().map(|value| self.lower_expression(&value));
                statements.push(self.alloc(
                    BodyNodeKind::Return { value },
                    statement.syntax(),
                    TypeRef::Unit,
                ));
            }
        }
        self.alloc(BodyNodeKind::Block { statements }, cst.syntax(), TypeRef::Unit)
    }
}

/// Lowers the body of a declaration to a [`BodyTree`]. `node` is the
/// declaration's syntax, which may come from a newer revision than the
/// declaration itself when resolving on air.
pub(crate) fn lower_decl_body(scope: &Scope, node: &SyntaxNode) -> BodyTree {
    let mut lowerer = BodyLowerer { scope, tree: BodyTree::default() };
    let mut root = None;

    if let Some(function) = cst::FunctionDeclaration::cast(node.clone()) {
        if let Some(body) = function.expression_body() {
            root = Some(lowerer.lower_expression_body(&body));
        } else if let Some(body) = function.block_body() {
            root = Some(lowerer.lower_block(&body));
        }
    } else if let Some(property) = cst::PropertyDeclaration::cast(node.clone()) {
        if let Some(initializer) = property.initializer() {
            root = Some(lowerer.lower_expression_body(&initializer));
        }
        for accessor in property.getter().map(|cst| cst.syntax().clone()).into_iter().chain(
            property.setter().map(|cst| cst.syntax().clone()),
        ) {
            lower_accessor_body(&mut lowerer, &accessor);
        }
    } else if let Some(initializer) = cst::InitializerBlock::cast(node.clone()) {
        if let Some(body) = initializer.block_body() {
            root = Some(lowerer.lower_block(&body));
        }
    } else if let Some(constructor) = cst::PrimaryConstructor::cast(node.clone()) {
        if let Some(class) = constructor.containing_class() {
            lower_supercall_arguments(&mut lowerer, &class);
        }
    } else if let Some(class) = cst::ClassDeclaration::cast(node.clone()) {
        lower_supercall_arguments(&mut lowerer, &class);
    }

    if let Some(root) = root {
        lowerer.tree.set_root(root);
    }
    lowerer.tree
}

/// Supertype constructor-call arguments are the only expressions in a class
/// header; they resolve as the constructor's body.
fn lower_supercall_arguments(lowerer: &mut BodyLowerer, class: &cst::ClassDeclaration) {
    let entries = class
        .super_type_list()
        .into_iter()
        .flat_map(|list| list.entries().collect::<Vec<_>>());
    for entry in entries {
        let cst::SuperTypeEntry::Call(call) = entry else { continue };
        let arguments = call
            .argument_list()
            .into_iter()
            .flat_map(|list| list.arguments().collect::<Vec<_>>());
        for argument in arguments {
            lowerer.lower_expression(&argument);
        }
    }
}

fn lower_accessor_body(lowerer: &mut BodyLowerer, accessor: &SyntaxNode) {
    if let Some(getter) = cst::Getter::cast(accessor.clone()) {
        if let Some(body) = getter.expression_body() {
            lowerer.lower_expression_body(&body);
        } else if let Some(body) = getter.block_body() {
            lowerer.lower_block(&body);
        }
    } else if let Some(setter) = cst::Setter::cast(accessor.clone()) {
        if let Some(body) = setter.expression_body() {
            lowerer.lower_expression_body(&body);
        } else if let Some(body) = setter.block_body() {
            lowerer.lower_block(&body);
        }
    }
}
