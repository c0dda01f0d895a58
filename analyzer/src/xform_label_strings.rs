//! Transform that assigns a data label to every string literal.
//!
//! Labels are `.str0`, `.str1`, ... in the order a depth-first walk
//! reaches the literals: declarations in source order and, within a
//! declaration, each node before its children and children left to right.
//! The program's `string_literals` lists the labeled constants in the same
//! order.
//!
//! Applying the transform again starts the numbering over and replaces the
//! list.
use cminus_dsl::{ast::*, diagnostic::Diagnostic};
use log::debug;

pub fn apply(mut program: Program) -> Result<Program, Diagnostic> {
    let mut labeler = StringLabeler { constants: vec![] };

    for declaration in program.declarations.iter_mut() {
        if let Declaration::Function(function) = declaration {
            labeler.compound(&mut function.body);
        }
    }

    debug!("Labeled {} string literals", labeler.constants.len());
    program.string_literals = labeler.constants;
    Ok(program)
}

struct StringLabeler {
    constants: Vec<StringConstant>,
}

impl StringLabeler {
    fn compound(&mut self, node: &mut CompoundStmt) {
        for stmt in node.stmts.iter_mut() {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, node: &mut Stmt) {
        match node {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Expression(ExpressionStmt { exp, .. }) | Stmt::Return(ReturnStmt { value: exp, .. }) => {
                if let Some(exp) = exp {
                    self.exp(exp);
                }
            }
            Stmt::If(node) => {
                self.exp(&mut node.cond);
                self.stmt(&mut node.then_branch);
                if let Some(else_branch) = &mut node.else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While(node) => {
                self.exp(&mut node.cond);
                self.stmt(&mut node.body);
            }
            Stmt::Write(node) => self.exp(&mut node.value),
            Stmt::Writeln(_) => {}
        }
    }

    fn var(&mut self, node: &mut VarExp) {
        if let VarShape::Array(index) | VarShape::AddrOfArray(index) = &mut node.shape {
            self.exp(index);
        }
    }

    fn exp(&mut self, node: &mut Exp) {
        match node {
            Exp::Var(var) => self.var(var),
            Exp::Assign(node) => {
                self.var(&mut node.target);
                self.exp(&mut node.value);
            }
            Exp::Add(AddExp { lhs, rhs, .. })
            | Exp::Mul(MulExp { lhs, rhs, .. })
            | Exp::Rel(RelExp { lhs, rhs, .. }) => {
                self.exp(lhs);
                self.exp(rhs);
            }
            Exp::Neg(node) => self.exp(&mut node.operand),
            Exp::Call(call) => {
                for arg in call.args.iter_mut() {
                    self.exp(arg);
                }
            }
            Exp::NumLit(_) => {}
            Exp::StrLit(literal) => {
                let label = format!(".str{}", self.constants.len());
                self.constants.push(StringConstant {
                    label: label.clone(),
                    value: literal.value.clone(),
                });
                literal.label = Some(label);
            }
        }
    }
}
