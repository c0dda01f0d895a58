//! Transform that derives the type of every expression and rejects
//! expressions whose operands have illegal types.
//!
//! The type of a variable reference depends on how the variable was
//! declared and on the surface form of the reference:
//!
//! | declared as \ used as | `x`         | `*x`              | `x[i]`            | `&x`              | `&x[i]`           |
//! |-----------------------|-------------|-------------------|-------------------|-------------------|-------------------|
//! | `T x`                 | `T`         | error             | error             | `pointer_T`       | error             |
//! | `T *x`                | `pointer_T` | `T`               | error             | error             | error             |
//! | `T x[n]`              | `array_T`   | error             | `T`               | error             | `pointer_T`       |
//!
//! Every other expression combines the types of its operands. The
//! transform requires the bindings from resolution.
use cminus_dsl::{
    ast::*,
    core::{Id, Located, SourceSpan},
    diagnostic::{Diagnostic, Label},
    types::Type,
};
use cminus_problems::Problem;
use log::debug;

pub fn apply(mut program: Program) -> Result<Program, Diagnostic> {
    for declaration in program.declarations.iter_mut() {
        if let Declaration::Function(function) = declaration {
            let mut checker = TypeChecker {
                decls: &program.decls,
                function: &program.decls[function.decl],
            };
            debug!("Checking types in {}", checker.function.id);
            checker.compound(&mut function.body)?;
        }
    }
    Ok(program)
}

struct TypeChecker<'a> {
    decls: &'a Declarations,
    /// The function that contains the statements being checked.
    function: &'a Decl,
}

fn mismatch(span: SourceSpan, message: String) -> Diagnostic {
    Diagnostic::problem(Problem::OperandTypeMismatch, Label::span(span, message))
}

/// Returns true if a value of the actual type can be passed where the
/// expected type is required. An array is accepted as a pointer to its
/// elements.
fn accepts(expected: &Type, actual: &Type) -> bool {
    if expected == actual {
        return true;
    }
    matches!((expected.pointee(), actual.element()), (Some(pointee), Some(element)) if pointee == element)
}

impl<'a> TypeChecker<'a> {
    fn declaration(&self, id: Option<DeclId>, name: &Id) -> Result<&'a Decl, Diagnostic> {
        let decls: &'a Declarations = self.decls;
        id.and_then(|id| decls.get(id)).ok_or_else(|| {
            Diagnostic::problem(
                Problem::VariableUndeclared,
                Label::located(name, format!("unresolved reference `{}`", name)),
            )
        })
    }

    fn compound(&mut self, node: &mut CompoundStmt) -> Result<(), Diagnostic> {
        for stmt in node.stmts.iter_mut() {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, node: &mut Stmt) -> Result<(), Diagnostic> {
        match node {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Expression(ExpressionStmt { exp, .. }) => {
                if let Some(exp) = exp {
                    self.exp(exp)?;
                }
                Ok(())
            }
            Stmt::If(node) => {
                self.condition(&mut node.cond)?;
                self.stmt(&mut node.then_branch)?;
                match &mut node.else_branch {
                    Some(else_branch) => self.stmt(else_branch),
                    None => Ok(()),
                }
            }
            Stmt::While(node) => {
                self.condition(&mut node.cond)?;
                self.stmt(&mut node.body)
            }
            Stmt::Return(node) => self.return_stmt(node),
            Stmt::Write(node) => {
                let value = self.exp(&mut node.value)?;
                if value.is_int() || value.is_string() {
                    return Ok(());
                }
                Err(mismatch(
                    node.value.span(),
                    format!("invalid operand: cannot write {}", value),
                ))
            }
            Stmt::Writeln(_) => Ok(()),
        }
    }

    fn condition(&mut self, node: &mut Exp) -> Result<(), Diagnostic> {
        let cond = self.exp(node)?;
        if cond.is_int() || cond.is_pointer() {
            return Ok(());
        }
        Err(mismatch(
            node.span(),
            format!("invalid condition: expected int or pointer, got {}", cond),
        ))
    }

    fn return_stmt(&mut self, node: &mut ReturnStmt) -> Result<(), Diagnostic> {
        let function = self.function;
        let expected = function.value_type();

        let problem = match &mut node.value {
            None if expected.is_void() => return Ok(()),
            None => format!("function `{}` must return {}", function.id, expected),
            Some(value) => {
                let actual = self.exp(value)?;
                if expected.is_void() {
                    format!("void function `{}` cannot return a value", function.id)
                } else if accepts(&expected, &actual) {
                    return Ok(());
                } else {
                    format!(
                        "cannot return {} from function `{}` returning {}",
                        actual, function.id, expected
                    )
                }
            }
        };

        Err(Diagnostic::problem(
            Problem::ReturnTypeMismatch,
            Label::span(node.span.clone(), problem),
        )
        .with_secondary(Label::located(function, "function declared here")))
    }

    fn exp(&mut self, node: &mut Exp) -> Result<Type, Diagnostic> {
        match node {
            Exp::Var(var) => self.var(var),
            Exp::Assign(node) => {
                let assigned = self.assign(node)?;
                Ok(node.resolved_type.insert(assigned).clone())
            }
            Exp::Add(node) => {
                let lhs = self.exp(&mut node.lhs)?;
                let rhs = self.exp(&mut node.rhs)?;
                let combined = arithmetic(node.op.verb(), &node.lhs, &lhs, &node.rhs, &rhs)?;
                Ok(node.resolved_type.insert(combined).clone())
            }
            Exp::Mul(node) => {
                let lhs = self.exp(&mut node.lhs)?;
                let rhs = self.exp(&mut node.rhs)?;
                let combined = arithmetic(node.op.verb(), &node.lhs, &lhs, &node.rhs, &rhs)?;
                Ok(node.resolved_type.insert(combined).clone())
            }
            Exp::Neg(node) => {
                let operand = self.exp(&mut node.operand)?;
                if !operand.is_int() {
                    return Err(mismatch(
                        node.operand.span(),
                        format!("invalid operand: cannot negate {}", operand),
                    ));
                }
                Ok(node.resolved_type.insert(operand).clone())
            }
            Exp::Rel(node) => {
                let lhs = self.exp(&mut node.lhs)?;
                let rhs = self.exp(&mut node.rhs)?;
                if lhs.is_void() {
                    return Err(mismatch(
                        node.lhs.span(),
                        format!("invalid lhs: cannot compare {}", lhs),
                    ));
                }
                if lhs != rhs {
                    return Err(mismatch(
                        node.rhs.span(),
                        format!("invalid rhs: cannot compare {} with {}", lhs, rhs),
                    ));
                }
                Ok(node.resolved_type.insert(Type::int()).clone())
            }
            Exp::Call(node) => {
                let returned = self.call(node)?;
                Ok(node.resolved_type.insert(returned).clone())
            }
            Exp::NumLit(node) => Ok(node.resolved_type.insert(Type::int()).clone()),
            Exp::StrLit(node) => Ok(node.resolved_type.insert(Type::string()).clone()),
        }
    }

    /// Derives the type of a variable reference from the declaration
    /// kind and the reference shape.
    fn var(&mut self, node: &mut VarExp) -> Result<Type, Diagnostic> {
        let decl = self.declaration(node.declaration, &node.id)?;
        if decl.signature().is_some() {
            return Err(Diagnostic::problem(
                Problem::NotAVariable,
                Label::span(
                    node.span.clone(),
                    format!("`{}` is a function, not a variable", node.id),
                ),
            )
            .with_secondary(Label::located(decl, "function declared here")));
        }

        if let VarShape::Array(index) | VarShape::AddrOfArray(index) = &mut node.shape {
            let index_type = self.exp(index)?;
            if !index_type.is_int() {
                return Err(mismatch(
                    index.span(),
                    format!("invalid index: expected int, got {}", index_type),
                ));
            }
        }

        let declared = decl.value_type();
        let derived = match &node.shape {
            VarShape::Simple => Some(declared.clone()),
            VarShape::Pointer => declared.pointee(),
            VarShape::Array(_) => declared.element(),
            VarShape::AddrOf if declared.is_pointer() || declared.is_array() => None,
            VarShape::AddrOf => Some(declared.pointer_to()),
            VarShape::AddrOfArray(_) => declared.element().map(|element| element.pointer_to()),
        };

        let derived = derived.ok_or_else(|| {
            let (problem, verb) = match node.shape {
                VarShape::Pointer => (Problem::CannotDereference, "dereference"),
                VarShape::AddrOf => (Problem::CannotReference, "reference"),
                _ => (Problem::CannotIndex, "index"),
            };
            Diagnostic::problem(
                problem,
                Label::span(node.span.clone(), format!("cannot {} {}", verb, declared)),
            )
            .with_context_id("variable", &node.id)
        })?;

        Ok(node.resolved_type.insert(derived).clone())
    }

    fn assign(&mut self, node: &mut AssignExp) -> Result<Type, Diagnostic> {
        let target = self.var(&mut node.target)?;

        let refusal = match node.target.shape {
            VarShape::AddrOf | VarShape::AddrOfArray(_) => {
                Some(format!("cannot assign to the address of `{}`", node.target.id))
            }
            _ if target.is_array() => Some(format!("cannot assign to {}", target)),
            _ => None,
        };
        if let Some(message) = refusal {
            return Err(Diagnostic::problem(
                Problem::NotAssignable,
                Label::span(node.target.span.clone(), message),
            ));
        }

        let value = self.exp(&mut node.value)?;
        if value != target {
            return Err(mismatch(
                node.value.span(),
                format!("invalid rhs: cannot assign {} to {}", value, target),
            ));
        }
        Ok(target)
    }

    fn call(&mut self, node: &mut CallExp) -> Result<Type, Diagnostic> {
        let decl = self.declaration(node.declaration, &node.id)?;
        let signature = decl.signature().ok_or_else(|| {
            Diagnostic::problem(
                Problem::NotAFunction,
                Label::span(node.span.clone(), format!("`{}` is not a function", node.id)),
            )
            .with_secondary(Label::located(decl, "declared here"))
        })?;

        if signature.params.len() != node.args.len() {
            return Err(Diagnostic::problem(
                Problem::ArgumentCountMismatch,
                Label::span(
                    node.span.clone(),
                    format!(
                        "`{}` expects {} argument(s), got {}",
                        node.id,
                        signature.params.len(),
                        node.args.len()
                    ),
                ),
            )
            .with_secondary(Label::located(decl, "function declared here")));
        }

        for (position, (arg, param)) in node.args.iter_mut().zip(&signature.params).enumerate() {
            let expected = self.decls[*param].value_type();
            let actual = self.exp(arg)?;
            if !accepts(&expected, &actual) {
                return Err(mismatch(
                    arg.span(),
                    format!(
                        "invalid argument {}: cannot pass {} as {}",
                        position + 1,
                        actual,
                        expected
                    ),
                ));
            }
        }

        Ok(decl.value_type())
    }
}

/// Checks the operands of `+ - * / %`, which must both be `int`.
fn arithmetic(verb: &str, lhs: &Exp, lhs_type: &Type, rhs: &Exp, rhs_type: &Type) -> Result<Type, Diagnostic> {
    if !lhs_type.is_int() {
        return Err(mismatch(
            lhs.span(),
            format!("invalid lhs: cannot {} {}", verb, lhs_type),
        ));
    }
    if !rhs_type.is_int() {
        return Err(mismatch(
            rhs.span(),
            format!("invalid rhs: cannot {} {}", verb, rhs_type),
        ));
    }
    Ok(Type::int())
}
