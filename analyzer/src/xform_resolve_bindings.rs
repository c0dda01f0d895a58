//! Transform that binds every variable reference and every call to the
//! declaration it names.
//!
//! The global scope holds the top-level declarations, registered in source
//! order as the walk reaches them, so a function may refer to itself and
//! to anything declared before it. A function body opens one scope holding
//! the parameters and the body's locals. Every nested block opens a child
//! scope holding its locals. Inner scopes may shadow outer names but a
//! name cannot be declared twice in one scope.
//!
//! The scopes are discarded when the walk completes. The bindings left in
//! `VarExp::declaration` and `CallExp::declaration` are the only result.
use cminus_dsl::{
    ast::*,
    core::Id,
    diagnostic::{Diagnostic, Label},
};
use cminus_problems::Problem;
use log::debug;

use crate::symbol_table::SymbolTable;

pub fn apply(mut program: Program) -> Result<Program, Diagnostic> {
    let mut resolver = BindingResolver {
        decls: &program.decls,
        scopes: SymbolTable::new(),
    };

    for declaration in program.declarations.iter_mut() {
        match declaration {
            Declaration::Var(id) => resolver.declare(*id)?,
            Declaration::Function(function) => {
                resolver.declare(function.decl)?;
                resolver.function(function)?;
            }
        }
    }

    debug!("Resolved bindings");
    Ok(program)
}

struct BindingResolver<'a> {
    decls: &'a Declarations,
    scopes: SymbolTable<Id, DeclId>,
}

impl BindingResolver<'_> {
    fn declare(&mut self, id: DeclId) -> Result<(), Diagnostic> {
        let decls = self.decls;
        let decl = &decls[id];
        match self.scopes.try_add(&decl.id, id) {
            None => Ok(()),
            Some((existing, _)) => Err(Diagnostic::problem(
                Problem::VariableRedeclared,
                Label::located(&decl.id, format!("`{}` is already declared in this scope", decl.id)),
            )
            .with_context_id("name", &decl.id)
            .with_secondary(Label::located(existing, "first declaration"))),
        }
    }

    fn lookup(&self, id: &Id, what: &str) -> Result<DeclId, Diagnostic> {
        self.scopes.find(id).copied().ok_or_else(|| {
            Diagnostic::problem(
                Problem::VariableUndeclared,
                Label::located(id, format!("undeclared {} `{}`", what, id)),
            )
            .with_context_id(what, id)
        })
    }

    fn function(&mut self, function: &mut FunctionDeclaration) -> Result<(), Diagnostic> {
        self.scopes.enter();

        let decls = self.decls;
        if let Some(signature) = decls[function.decl].signature() {
            for param in &signature.params {
                self.declare(*param)?;
            }
        }
        let body = &mut function.body;
        for local in &body.locals {
            self.declare(*local)?;
        }
        for stmt in body.stmts.iter_mut() {
            self.stmt(stmt)?;
        }

        self.scopes.exit();
        Ok(())
    }

    fn compound(&mut self, node: &mut CompoundStmt) -> Result<(), Diagnostic> {
        self.scopes.enter();
        for local in &node.locals {
            self.declare(*local)?;
        }
        for stmt in node.stmts.iter_mut() {
            self.stmt(stmt)?;
        }
        self.scopes.exit();
        Ok(())
    }

    fn stmt(&mut self, node: &mut Stmt) -> Result<(), Diagnostic> {
        match node {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Expression(ExpressionStmt { exp, .. }) | Stmt::Return(ReturnStmt { value: exp, .. }) => {
                match exp {
                    Some(exp) => self.exp(exp),
                    None => Ok(()),
                }
            }
            Stmt::If(node) => {
                self.exp(&mut node.cond)?;
                self.stmt(&mut node.then_branch)?;
                match &mut node.else_branch {
                    Some(else_branch) => self.stmt(else_branch),
                    None => Ok(()),
                }
            }
            Stmt::While(node) => {
                self.exp(&mut node.cond)?;
                self.stmt(&mut node.body)
            }
            Stmt::Write(node) => self.exp(&mut node.value),
            Stmt::Writeln(_) => Ok(()),
        }
    }

    fn var(&mut self, node: &mut VarExp) -> Result<(), Diagnostic> {
        node.declaration = Some(self.lookup(&node.id, "variable")?);
        match &mut node.shape {
            VarShape::Array(index) | VarShape::AddrOfArray(index) => self.exp(index),
            VarShape::Simple | VarShape::Pointer | VarShape::AddrOf => Ok(()),
        }
    }

    fn exp(&mut self, node: &mut Exp) -> Result<(), Diagnostic> {
        match node {
            Exp::Var(var) => self.var(var),
            Exp::Assign(node) => {
                self.var(&mut node.target)?;
                self.exp(&mut node.value)
            }
            Exp::Add(AddExp { lhs, rhs, .. })
            | Exp::Mul(MulExp { lhs, rhs, .. })
            | Exp::Rel(RelExp { lhs, rhs, .. }) => {
                self.exp(lhs)?;
                self.exp(rhs)
            }
            Exp::Neg(node) => self.exp(&mut node.operand),
            Exp::Call(call) => {
                call.declaration = Some(self.lookup(&call.id, "function")?);
                for arg in call.args.iter_mut() {
                    self.exp(arg)?;
                }
                Ok(())
            }
            Exp::NumLit(_) | Exp::StrLit(_) => Ok(()),
        }
    }
}
