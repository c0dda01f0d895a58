//! Tests of the parser producing the syntax tree.
use cminus_dsl::{
    ast::*,
    core::{FileId, Id},
    diagnostic::Diagnostic,
    types::BaseType,
};
use cminus_problems::Problem;
use cminus_test::read_shared_resource;
use proptest::prelude::*;
use rstest::rstest;

use crate::parse_program;

fn parse(source: &str) -> Program {
    parse_program(source, &FileId::default()).unwrap()
}

fn parse_err(source: &str) -> Diagnostic {
    parse_program(source, &FileId::default()).unwrap_err()
}

/// Returns the statements of the first function in the program.
fn body(program: &Program) -> &Vec<Stmt> {
    &program.functions().next().unwrap().body.stmts
}

/// Returns the expression of the first statement of the first function.
fn first_exp(program: &Program) -> &Exp {
    match &body(program)[0] {
        Stmt::Expression(ExpressionStmt { exp: Some(exp), .. }) => exp,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

fn num(value: i32) -> Exp {
    Exp::NumLit(NumLit {
        value,
        span: Default::default(),
        resolved_type: None,
    })
}

fn var(name: &str, shape: VarShape) -> VarExp {
    VarExp::new(Id::from(name), shape, Default::default())
}

/// Counts the nesting of same-precedence binary nodes along the left side.
fn left_depth(exp: &Exp) -> usize {
    match exp {
        Exp::Add(node) => 1 + left_depth(&node.lhs),
        Exp::Mul(node) => 1 + left_depth(&node.lhs),
        _ => 0,
    }
}

#[test]
fn parse_program_when_empty_then_no_declarations() {
    let program = parse("  /* nothing */ ");
    assert!(program.declarations.is_empty());
}

#[test]
fn parse_program_when_global_variables_then_kinds_types_and_names() {
    let program = parse("int x; void *y; string z[2];");

    let triples: Vec<_> = program
        .top_level()
        .map(|id| {
            let decl = &program.decls[id];
            (decl.kind.clone(), decl.base, decl.id.name.clone())
        })
        .collect();

    assert_eq!(
        triples,
        vec![
            (DeclKind::Simple, BaseType::Int, String::from("x")),
            (DeclKind::Pointer, BaseType::Void, String::from("y")),
            (DeclKind::Array(2), BaseType::String, String::from("z")),
        ]
    );
}

#[test]
fn parse_program_when_function_with_params_then_params_in_arena() {
    let program = parse("int f(int a, string *b) { return a; }");
    let function = program.functions().next().unwrap();
    let decl = &program.decls[function.decl];

    let signature = decl.signature().unwrap();
    assert!(!signature.returns_pointer);
    assert_eq!(signature.params.len(), 2);
    assert_eq!(program.decls[signature.params[0]], Decl::simple(BaseType::Int, Id::from("a")));
    assert_eq!(
        program.decls[signature.params[1]],
        Decl::pointer(BaseType::String, Id::from("b"))
    );
}

#[test]
fn parse_program_when_void_params_then_no_params() {
    let program = parse("void main(void) { }");
    let function = program.functions().next().unwrap();
    assert!(program.decls[function.decl].signature().unwrap().params.is_empty());
}

#[test]
fn parse_program_when_void_pointer_param_then_param() {
    let program = parse("void f(void *p) { }");
    let function = program.functions().next().unwrap();
    let params = &program.decls[function.decl].signature().unwrap().params;
    assert_eq!(program.decls[params[0]], Decl::pointer(BaseType::Void, Id::from("p")));
}

#[test]
fn parse_program_when_pointer_function_then_returns_pointer() {
    let program = parse("int *f(void) { }");
    let function = program.functions().next().unwrap();
    assert!(program.decls[function.decl].signature().unwrap().returns_pointer);
}

#[test]
fn parse_program_when_locals_then_locals_before_statements() {
    let program = parse("void f(void) { int a; int b[3]; a = 1; { int c; c = a; } }");
    let function = program.functions().next().unwrap();

    assert_eq!(function.body.locals.len(), 2);
    assert_eq!(function.body.stmts.len(), 2);
    match &function.body.stmts[1] {
        Stmt::Compound(inner) => assert_eq!(inner.locals.len(), 1),
        other => panic!("expected a compound statement, got {:?}", other),
    }
}

#[test]
fn parse_program_when_subtraction_chain_then_left_associative() {
    let program = parse("int f(void) { 1 - 2 - 3; }");

    let expected = Exp::Add(AddExp {
        lhs: Box::new(Exp::Add(AddExp {
            lhs: Box::new(num(1)),
            rhs: Box::new(num(2)),
            op: AddOp::Minus,
            resolved_type: None,
        })),
        rhs: Box::new(num(3)),
        op: AddOp::Minus,
        resolved_type: None,
    });
    assert_eq!(first_exp(&program), &expected);
}

#[test]
fn parse_program_when_mixed_precedence_then_multiplication_binds_tighter() {
    let program = parse("int f(void) { 2 + 3 * 4; }");

    let expected = Exp::Add(AddExp {
        lhs: Box::new(num(2)),
        rhs: Box::new(Exp::Mul(MulExp {
            lhs: Box::new(num(3)),
            rhs: Box::new(num(4)),
            op: MulOp::Times,
            resolved_type: None,
        })),
        op: AddOp::Plus,
        resolved_type: None,
    });
    assert_eq!(first_exp(&program), &expected);
}

#[test]
fn parse_program_when_parenthesized_then_grouping_kept() {
    let program = parse("int f(void) { (2 + 3) * 4; }");
    match first_exp(&program) {
        Exp::Mul(node) => assert!(matches!(*node.lhs, Exp::Add(_))),
        other => panic!("expected multiplication, got {:?}", other),
    }
}

#[test]
fn parse_program_when_chained_assignment_then_right_associative() {
    let program = parse("int f(void) { a = b = 1; }");

    let expected = Exp::Assign(AssignExp {
        target: var("a", VarShape::Simple),
        value: Box::new(Exp::Assign(AssignExp {
            target: var("b", VarShape::Simple),
            value: Box::new(num(1)),
            resolved_type: None,
        })),
        resolved_type: None,
    });
    assert_eq!(first_exp(&program), &expected);
}

#[rstest]
#[case("x;", VarShape::Simple)]
#[case("*x;", VarShape::Pointer)]
#[case("x[1];", VarShape::Array(Box::new(num(1))))]
#[case("&x;", VarShape::AddrOf)]
#[case("&x[1];", VarShape::AddrOfArray(Box::new(num(1))))]
fn parse_program_when_variable_reference_then_shape(#[case] stmt: &str, #[case] shape: VarShape) {
    let program = parse(&format!("void f(void) {{ {} }}", stmt));
    assert_eq!(first_exp(&program), &Exp::Var(var("x", shape)));
}

#[test]
fn parse_program_when_negation_then_neg_node() {
    let program = parse("int f(void) { - - 1; }");
    match first_exp(&program) {
        Exp::Neg(outer) => assert!(matches!(*outer.operand, Exp::Neg(_))),
        other => panic!("expected negation, got {:?}", other),
    }
}

#[test]
fn parse_program_when_relational_then_rel_node() {
    let program = parse("int f(void) { 1 + 2 <= 3; }");
    match first_exp(&program) {
        Exp::Rel(node) => {
            assert_eq!(node.op, RelOp::Le);
            assert!(matches!(*node.lhs, Exp::Add(_)));
        }
        other => panic!("expected relational, got {:?}", other),
    }
}

#[test]
fn parse_program_when_call_then_call_with_args() {
    let program = parse("int f(void) { g(1, \"s\", h()); }");
    match first_exp(&program) {
        Exp::Call(call) => {
            assert_eq!(call.id, Id::from("g"));
            assert_eq!(call.args.len(), 3);
            assert!(matches!(call.args[2], Exp::Call(_)));
            assert!(call.declaration.is_none());
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn parse_program_when_statements_then_each_statement_kind() {
    let program = parse(
        "void f(void) {
            if (1) write(1); else writeln();
            while (0) ;
            return;
            write(\"s\");
        }",
    );
    let stmts = body(&program);

    match &stmts[0] {
        Stmt::If(node) => {
            assert!(matches!(*node.then_branch, Stmt::Write(_)));
            assert!(matches!(node.else_branch.as_deref(), Some(Stmt::Writeln(_))));
        }
        other => panic!("expected if, got {:?}", other),
    }
    match &stmts[1] {
        Stmt::While(node) => assert!(matches!(
            *node.body,
            Stmt::Expression(ExpressionStmt { exp: None, .. })
        )),
        other => panic!("expected while, got {:?}", other),
    }
    assert!(matches!(&stmts[2], Stmt::Return(ReturnStmt { value: None, .. })));
    assert!(matches!(&stmts[3], Stmt::Write(_)));
}

#[test]
fn parse_program_when_dangling_else_then_binds_to_nearest_if() {
    let program = parse("void f(void) { if (1) if (2) writeln(); else write(3); }");
    match &body(&program)[0] {
        Stmt::If(outer) => {
            assert!(outer.else_branch.is_none());
            assert!(matches!(*outer.then_branch, Stmt::If(IfStmt { else_branch: Some(_), .. })));
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn parse_program_when_missing_semicolon_then_error() {
    let err = parse_err("int x");
    assert_eq!(err.problem, Problem::UnexpectedToken);
    assert_eq!(err.message(), "expected `;`, got `end of file`");
}

#[test]
fn parse_program_when_pointer_array_then_error() {
    let err = parse_err("int *z[2];");
    assert_eq!(err.message(), "expected `;`, got `[`");
}

#[test]
fn parse_program_when_declaration_after_statement_then_error() {
    let err = parse_err("void f(void) { x; int y; }");
    assert_eq!(err.message(), "expected `statement`, got `int`");
}

#[test]
fn parse_program_when_array_param_then_error() {
    let err = parse_err("void f(int a[]) { }");
    assert_eq!(err.message(), "expected `)`, got `[`");
}

#[test]
fn parse_program_when_empty_params_then_error() {
    let err = parse_err("void f() { }");
    assert_eq!(err.message(), "expected `type specifier`, got `)`");
}

#[test]
fn parse_program_when_local_function_then_error() {
    let err = parse_err("void f(void) { int g(void) { } }");
    assert_eq!(err.message(), "expected `;`, got `(`");
}

#[test]
fn parse_program_when_dereference_not_identifier_then_error() {
    let err = parse_err("void f(void) { *(x); }");
    assert_eq!(err.message(), "expected `identifier`, got `(`");
}

#[test]
fn parse_program_when_assign_to_parenthesized_var_then_error() {
    let err = parse_err("void f(void) { (x) = 1; }");
    assert_eq!(err.message(), "expected `;`, got `=`");
}

#[test]
fn parse_program_when_assign_inside_parens_then_assignment() {
    let program = parse("void f(void) { (x = 1); }");
    assert!(matches!(first_exp(&program), Exp::Assign(_)));
}

#[test]
fn parse_program_when_assign_to_expression_then_error() {
    let err = parse_err("void f(void) { 1 = 2; }");
    assert_eq!(err.message(), "expected `;`, got `=`");
}

#[test]
fn parse_program_when_read_keyword_then_error() {
    let err = parse_err("void f(void) { read(x); }");
    assert_eq!(err.message(), "expected `statement`, got `read`");
}

#[test]
fn parse_program_when_error_on_later_line_then_line_reported() {
    let err = parse_err("int x;\n\nint y\nint z;");
    assert_eq!(err.line(), 4);
}

#[test]
fn parse_program_when_zero_array_size_then_error() {
    let err = parse_err("int a[0];");
    assert_eq!(err.problem, Problem::ArraySizeInvalid);
}

#[test]
fn parse_program_when_array_larger_than_limit_then_error() {
    let err = parse_err("int a[134217729];");

    assert_eq!(err.problem, Problem::ArraySizeInvalid);
    assert_eq!(
        err.message(),
        "array size `134217729` must be a positive integer no larger than 134217728"
    );
}

#[test]
fn parse_program_when_array_size_at_limit_then_ok() {
    let program = parse("int a[134217728];");
    assert_eq!(program.decls[program.globals().next().unwrap()].kind, DeclKind::Array(134217728));
}

#[test]
fn parse_program_when_array_size_above_int_range_then_out_of_range() {
    let err = parse_err("int a[4611686018427387904];");
    assert_eq!(err.problem, Problem::IntegerLiteralOutOfRange);
}

#[test]
fn parse_program_when_number_too_large_then_error() {
    let err = parse_err("int f(void) { 99999999999999999999; }");
    assert_eq!(err.problem, Problem::IntegerLiteralOutOfRange);
}

#[test]
fn parse_program_when_lexical_error_then_lexical_problem() {
    let err = parse_err("int f(void) { \"abc\n\"; }");
    assert_eq!(err.problem, Problem::UnterminatedString);
}

#[test]
fn parse_program_when_shared_resources_then_ok() {
    for name in ["arithmetic.cm", "scopes.cm", "pointers.cm"] {
        let source = read_shared_resource(name);
        assert!(parse_program(&source, &FileId::default()).is_ok(), "{}", name);
    }
}

proptest! {
    #[test]
    fn parse_program_when_operator_chain_then_depth_is_operator_count(
        ops in prop::collection::vec(prop::sample::select(vec!["+", "-", "*", "/", "%"]), 1..16),
        additive in any::<bool>(),
    ) {
        // Keep every operator at one precedence level.
        let ops: Vec<&str> = ops
            .into_iter()
            .map(|op| match (additive, op) {
                (true, "*") => "+",
                (true, "/" | "%") => "-",
                (false, "+") => "*",
                (false, "-") => "/",
                (_, op) => op,
            })
            .collect();

        let mut exp = String::from("1");
        for (i, op) in ops.iter().enumerate() {
            exp.push_str(&format!(" {} {}", op, i + 2));
        }
        let program = parse(&format!("int f(void) {{ {}; }}", exp));
        let root = first_exp(&program);

        prop_assert_eq!(left_depth(root), ops.len());

        let last = *ops.last().unwrap();
        let outermost = match root {
            Exp::Add(node) => match node.op {
                AddOp::Plus => "+",
                AddOp::Minus => "-",
            },
            Exp::Mul(node) => match node.op {
                MulOp::Times => "*",
                MulOp::Div => "/",
                MulOp::Mod => "%",
            },
            _ => "",
        };
        prop_assert_eq!(outermost, last);
    }
}
