use std::fmt::{self, Write};

use super::*;

/// A borrowed node that can be printed.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Function(&'a FunctionDefinition),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

pub fn print(node: Node<'_>) -> String {
    let mut printer = AstPrinter::default();
    match node {
        Node::Function(f) => printer.function(f),
        Node::Statement(s) => printer.statement(s),
        Node::Expression(e) => printer.expression(e),
    }
    printer.out
}

#[derive(Default)]
struct AstPrinter {
    out: String,
    depth: usize,
}

impl AstPrinter {
    fn line(&mut self, text: impl fmt::Display) {
        let _ = writeln!(self.out, "{:width$}{}", "", text, width = self.depth * 2);
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn function(&mut self, function: &FunctionDefinition) {
        self.line(format_args!("FunctionDefinition \"{}\"", function.name));
        if let Some(body) = &function.body {
            self.nested(|p| p.block("Block", body));
        }
    }

    fn block(&mut self, label: &str, block: &Block) {
        self.line(label);
        self.nested(|p| {
            for stmt in &block.statements {
                p.statement(stmt);
            }
        });
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Block(b) => self.block("Block", b),
            Statement::UncheckedBlock(b) => self.block("UncheckedBlock", b),
            Statement::VariableDeclarationStatement(s) => {
                self.line("VariableDeclarationStatement");
                self.nested(|p| {
                    for decl in s.declarations.iter().flatten() {
                        p.line(format_args!(
                            "VariableDeclaration \"{}\" ({})",
                            decl.name,
                            decl.type_descriptions.type_string()
                        ));
                    }
                    if let Some(init) = &s.initial_value {
                        p.expression(init);
                    }
                });
            }
            Statement::ExpressionStatement(s) => {
                self.line("ExpressionStatement");
                self.nested(|p| p.expression(&s.expression));
            }
            Statement::Unsupported => self.line("<unsupported statement>"),
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(l) => self.line(format_args!(
                "Literal {} ({})",
                l.text(),
                l.type_descriptions.type_string()
            )),
            Expression::Identifier(i) => self.line(format_args!(
                "Identifier {} ({})",
                i.name,
                i.type_descriptions.type_string()
            )),
            Expression::MemberAccess(m) => {
                self.line(format_args!(
                    "MemberAccess .{} ({})",
                    m.member_name,
                    m.type_descriptions.type_string()
                ));
                self.nested(|p| p.expression(&m.expression));
            }
            Expression::BinaryOperation(b) => {
                self.line(format_args!(
                    "BinaryOperation {} ({})",
                    b.operator,
                    b.type_descriptions.type_string()
                ));
                self.nested(|p| {
                    p.expression(&b.left_expression);
                    p.expression(&b.right_expression);
                });
            }
            Expression::UnaryOperation(u) => {
                let fixity = if u.prefix { "prefix" } else { "postfix" };
                self.line(format_args!("UnaryOperation {} {}", fixity, u.operator));
                self.nested(|p| p.expression(&u.sub_expression));
            }
            Expression::Assignment(a) => {
                self.line(format_args!("Assignment {}", a.operator));
                self.nested(|p| {
                    p.expression(&a.left_hand_side);
                    p.expression(&a.right_hand_side);
                });
            }
            Expression::TupleExpression(t) => {
                self.line("TupleExpression");
                self.nested(|p| {
                    for component in t.components.iter().flatten() {
                        p.expression(component);
                    }
                });
            }
            Expression::FunctionCall(c) => {
                self.line(format_args!("FunctionCall ({} arguments)", c.arguments.len()));
                self.nested(|p| {
                    p.expression(&c.expression);
                    for arg in &c.arguments {
                        p.expression(arg);
                    }
                });
            }
            Expression::NewExpression(n) => self.line(format_args!(
                "NewExpression ({})",
                n.type_descriptions.type_string()
            )),
            Expression::IndexAccess(i) => {
                self.line("IndexAccess");
                self.nested(|p| {
                    p.expression(&i.base_expression);
                    if let Some(index) = &i.index_expression {
                        p.expression(index);
                    }
                });
            }
            Expression::Unsupported => self.line("<unsupported expression>"),
        }
    }
}
