//! Primary parser for C-minus. The parser transforms tokens into the
//! syntax tree.
//!
//! The parser is recursive descent with a single token of lookahead and
//! no backtracking. The first token that does not fit the grammar ends
//! parsing with a diagnostic of the form ``expected `<kind>`, got `<kind>` ``.
//!
//! ```text
//! Program          := Declaration*
//! Declaration      := TypeSpecifier '*'? Id (';' | '[' Num ']' ';' | '(' Params ')' CompoundStmt)
//! Params           := 'void' | Param (',' Param)*
//! Param            := TypeSpecifier '*'? Id
//! CompoundStmt     := '{' LocalDeclaration* Stmt* '}'
//! Stmt             := ExpressionStmt | CompoundStmt | If | While | Return | Write | Writeln
//! Expression       := Var '=' Expression | SimpleExpression
//! SimpleExpression := E (RelOp E)?
//! E                := T (AddOp T)*
//! T                := F (MulOp F)*
//! F                := '-' F | '*' Id | '&' Id ('[' Expression ']')? | Factor
//! Factor           := '(' Expression ')' | Id ('[' Expression ']')? | Id '(' Args ')' | Num | Str
//! ```
use cminus_dsl::{
    ast::*,
    core::{Id, Located, SourceSpan},
    diagnostic::{Diagnostic, Label},
    types::BaseType,
};
use cminus_problems::Problem;
use log::debug;

use crate::{
    lexer::{integer_value, Lexer},
    token::{Token, TokenKind},
};

/// The largest number of elements in an array. Elements are 8 bytes, so
/// an array is at most 1 GiB.
const MAX_ARRAY_SIZE: u64 = 1 << 27;

pub struct Parser<'source> {
    lexer: Lexer<'source>,
    lookahead: Token,
    decls: Declarations,
}

impl<'source> Parser<'source> {
    /// Creates a parser that reads tokens from the lexer. Reads the first
    /// token immediately.
    pub fn new(mut lexer: Lexer<'source>) -> Result<Self, Diagnostic> {
        let lookahead = lexer.next()?;
        Ok(Self {
            lexer,
            lookahead,
            decls: Declarations::new(),
        })
    }

    /// Parses declarations until the end of the source.
    pub fn parse(mut self) -> Result<Program, Diagnostic> {
        let mut declarations = vec![];
        while self.peek() != TokenKind::Eof {
            declarations.push(self.declaration()?);
        }

        debug!(
            "Parsed {} top-level declarations, {} declarations in total",
            declarations.len(),
            self.decls.len()
        );

        Ok(Program {
            declarations,
            decls: self.decls,
            string_literals: vec![],
        })
    }

    fn peek(&self) -> TokenKind {
        self.lookahead.kind
    }

    /// Consumes the lookahead token and returns it.
    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let next = self.lexer.next()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.peek() == kind {
            self.advance()
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    /// Consumes the lookahead token if it is of the kind.
    fn eat(&mut self, kind: TokenKind) -> Result<Option<Token>, Diagnostic> {
        if self.peek() == kind {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::problem(
            Problem::UnexpectedToken,
            Label::span(
                self.lookahead.span.clone(),
                format!("expected `{}`, got `{}`", expected, self.lookahead.kind),
            ),
        )
        .with_context("text", &self.lookahead.text)
    }

    fn identifier(&mut self) -> Result<Id, Diagnostic> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(Id::from(&token.text).with_position(token.span))
    }

    fn type_specifier(&mut self) -> Result<BaseType, Diagnostic> {
        let base = match self.peek() {
            TokenKind::Int => BaseType::Int,
            TokenKind::Void => BaseType::Void,
            TokenKind::String => BaseType::String,
            _ => return Err(self.unexpected("type specifier")),
        };
        self.advance()?;
        Ok(base)
    }

    /// Parses a top-level declaration: a variable or a function.
    fn declaration(&mut self) -> Result<Declaration, Diagnostic> {
        let base = self.type_specifier()?;
        let pointer = self.eat(TokenKind::Star)?.is_some();
        let id = self.identifier()?;

        if self.eat(TokenKind::LeftParen)?.is_none() {
            return self.var_tail(base, pointer, id).map(Declaration::Var);
        }

        let params = self.params()?;
        self.expect(TokenKind::RightParen)?;
        let decl = self.decls.push(Decl::function(
            base,
            id,
            FunctionSignature {
                returns_pointer: pointer,
                params,
            },
        ));
        let body = self.compound()?;
        Ok(Declaration::Function(FunctionDeclaration { decl, body }))
    }

    /// Parses a declaration inside a compound statement. Only variables
    /// may be declared here.
    fn local_declaration(&mut self) -> Result<DeclId, Diagnostic> {
        let base = self.type_specifier()?;
        let pointer = self.eat(TokenKind::Star)?.is_some();
        let id = self.identifier()?;
        self.var_tail(base, pointer, id)
    }

    /// Parses what follows the name of a variable declaration.
    fn var_tail(&mut self, base: BaseType, pointer: bool, id: Id) -> Result<DeclId, Diagnostic> {
        let decl = match self.peek() {
            TokenKind::Semicolon if pointer => Decl::pointer(base, id),
            TokenKind::Semicolon => Decl::simple(base, id),
            TokenKind::LeftBracket if !pointer => {
                self.advance()?;
                let size = self.array_size()?;
                self.expect(TokenKind::RightBracket)?;
                Decl::array(base, id, size)
            }
            _ => return Err(self.unexpected(TokenKind::Semicolon.describe())),
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.decls.push(decl))
    }

    fn array_size(&mut self) -> Result<u64, Diagnostic> {
        let token = self.expect(TokenKind::Number)?;
        match token.text.parse::<u64>() {
            Ok(size) if size > 0 && size <= MAX_ARRAY_SIZE => Ok(size),
            _ => Err(Diagnostic::problem(
                Problem::ArraySizeInvalid,
                Label::span(
                    token.span,
                    format!(
                        "array size `{}` must be a positive integer no larger than {}",
                        token.text, MAX_ARRAY_SIZE
                    ),
                ),
            )),
        }
    }

    fn params(&mut self) -> Result<Vec<DeclId>, Diagnostic> {
        let mut params = vec![];

        // `void` alone means no parameters, but `void *p` is a parameter
        // so the decision waits for the token after `void`.
        let base = self.type_specifier()?;
        if base == BaseType::Void && self.peek() == TokenKind::RightParen {
            return Ok(params);
        }
        params.push(self.param(base)?);

        while self.eat(TokenKind::Comma)?.is_some() {
            let base = self.type_specifier()?;
            params.push(self.param(base)?);
        }
        Ok(params)
    }

    fn param(&mut self, base: BaseType) -> Result<DeclId, Diagnostic> {
        let pointer = self.eat(TokenKind::Star)?.is_some();
        let id = self.identifier()?;
        let decl = if pointer {
            Decl::pointer(base, id)
        } else {
            Decl::simple(base, id)
        };
        Ok(self.decls.push(decl))
    }

    fn compound(&mut self) -> Result<CompoundStmt, Diagnostic> {
        let open = self.expect(TokenKind::LeftBrace)?;

        let mut locals = vec![];
        while self.peek().is_type_specifier() {
            locals.push(self.local_declaration()?);
        }

        let mut stmts = vec![];
        while self.peek() != TokenKind::RightBrace {
            stmts.push(self.statement()?);
        }

        let close = self.expect(TokenKind::RightBrace)?;
        Ok(CompoundStmt {
            locals,
            stmts,
            span: SourceSpan::join(&open.span, &close.span),
        })
    }

    fn statement(&mut self) -> Result<Stmt, Diagnostic> {
        match self.peek() {
            TokenKind::LeftBrace => Ok(Stmt::Compound(self.compound()?)),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Write => self.write_statement(),
            TokenKind::Writeln => self.writeln_statement(),
            TokenKind::Semicolon => {
                let semicolon = self.advance()?;
                Ok(Stmt::Expression(ExpressionStmt {
                    exp: None,
                    span: semicolon.span,
                }))
            }
            kind if kind.starts_expression() => {
                let exp = self.expression()?;
                let semicolon = self.expect(TokenKind::Semicolon)?;
                let span = SourceSpan::join(&exp.span(), &semicolon.span);
                Ok(Stmt::Expression(ExpressionStmt {
                    exp: Some(exp),
                    span,
                }))
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = match self.eat(TokenKind::Else)? {
            Some(_) => Some(Box::new(self.statement()?)),
            None => None,
        };
        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileStmt { cond, body }))
    }

    fn return_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(TokenKind::Return)?;
        let value = if self.peek() == TokenKind::Semicolon {
            None
        } else {
            Some(self.expression()?)
        };
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: SourceSpan::join(&keyword.span, &semicolon.span),
        }))
    }

    fn write_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(TokenKind::Write)?;
        self.expect(TokenKind::LeftParen)?;
        let value = self.expression()?;
        self.expect(TokenKind::RightParen)?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Write(WriteStmt {
            value,
            span: SourceSpan::join(&keyword.span, &semicolon.span),
        }))
    }

    fn writeln_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(TokenKind::Writeln)?;
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::RightParen)?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Writeln(SourceSpan::join(&keyword.span, &semicolon.span)))
    }

    /// Parses `Var '=' Expression | SimpleExpression`.
    ///
    /// Both alternatives can start with a variable, so the simple
    /// expression is parsed first and becomes the assignment target when
    /// it is a variable followed by `=`.
    fn expression(&mut self) -> Result<Exp, Diagnostic> {
        // A variable that comes back from a parenthesized factor is not an
        // assignment target.
        let parenthesized = self.peek() == TokenKind::LeftParen;
        let exp = self.simple_expression()?;
        match exp {
            Exp::Var(target) if !parenthesized && self.peek() == TokenKind::Gets => {
                self.advance()?;
                let value = self.expression()?;
                Ok(Exp::Assign(AssignExp {
                    target,
                    value: Box::new(value),
                    resolved_type: None,
                }))
            }
            exp => Ok(exp),
        }
    }

    fn simple_expression(&mut self) -> Result<Exp, Diagnostic> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            TokenKind::Less => RelOp::Lt,
            TokenKind::LessEqual => RelOp::Le,
            TokenKind::Equal => RelOp::Eq,
            TokenKind::NotEqual => RelOp::Ne,
            TokenKind::GreaterEqual => RelOp::Ge,
            TokenKind::Greater => RelOp::Gt,
            _ => return Ok(lhs),
        };
        self.advance()?;
        let rhs = self.additive()?;
        Ok(Exp::Rel(RelExp {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            op,
            resolved_type: None,
        }))
    }

    /// Parses `T (AddOp T)*`. Each operator wraps everything before it, so
    /// the last operator is the outermost node.
    fn additive(&mut self) -> Result<Exp, Diagnostic> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => AddOp::Plus,
                TokenKind::Minus => AddOp::Minus,
                _ => return Ok(node),
            };
            self.advance()?;
            let rhs = self.term()?;
            node = Exp::Add(AddExp {
                lhs: Box::new(node),
                rhs: Box::new(rhs),
                op,
                resolved_type: None,
            });
        }
    }

    fn term(&mut self) -> Result<Exp, Diagnostic> {
        let mut node = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => MulOp::Times,
                TokenKind::Slash => MulOp::Div,
                TokenKind::Percent => MulOp::Mod,
                _ => return Ok(node),
            };
            self.advance()?;
            let rhs = self.unary()?;
            node = Exp::Mul(MulExp {
                lhs: Box::new(node),
                rhs: Box::new(rhs),
                op,
                resolved_type: None,
            });
        }
    }

    fn unary(&mut self) -> Result<Exp, Diagnostic> {
        match self.peek() {
            TokenKind::Minus => {
                let minus = self.advance()?;
                let operand = self.unary()?;
                let span = SourceSpan::join(&minus.span, &operand.span());
                Ok(Exp::Neg(NegExp {
                    operand: Box::new(operand),
                    span,
                    resolved_type: None,
                }))
            }
            TokenKind::Star => {
                let star = self.advance()?;
                let id = self.identifier()?;
                let span = SourceSpan::join(&star.span, &id.span);
                Ok(Exp::Var(VarExp::new(id, VarShape::Pointer, span)))
            }
            TokenKind::Ampersand => {
                let ampersand = self.advance()?;
                let id = self.identifier()?;
                if self.eat(TokenKind::LeftBracket)?.is_some() {
                    let index = self.expression()?;
                    let close = self.expect(TokenKind::RightBracket)?;
                    let span = SourceSpan::join(&ampersand.span, &close.span);
                    return Ok(Exp::Var(VarExp::new(
                        id,
                        VarShape::AddrOfArray(Box::new(index)),
                        span,
                    )));
                }
                let span = SourceSpan::join(&ampersand.span, &id.span);
                Ok(Exp::Var(VarExp::new(id, VarShape::AddrOf, span)))
            }
            _ => self.factor(),
        }
    }

    fn factor(&mut self) -> Result<Exp, Diagnostic> {
        match self.peek() {
            TokenKind::LeftParen => {
                self.advance()?;
                let exp = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(exp)
            }
            TokenKind::Identifier => {
                let id = self.identifier()?;
                match self.peek() {
                    TokenKind::LeftBracket => {
                        self.advance()?;
                        let index = self.expression()?;
                        let close = self.expect(TokenKind::RightBracket)?;
                        let span = SourceSpan::join(&id.span, &close.span);
                        Ok(Exp::Var(VarExp::new(
                            id,
                            VarShape::Array(Box::new(index)),
                            span,
                        )))
                    }
                    TokenKind::LeftParen => {
                        self.advance()?;
                        let args = self.args()?;
                        let close = self.expect(TokenKind::RightParen)?;
                        let span = SourceSpan::join(&id.span, &close.span);
                        Ok(Exp::Call(CallExp {
                            id,
                            args,
                            span,
                            declaration: None,
                            resolved_type: None,
                        }))
                    }
                    _ => {
                        let span = id.span.clone();
                        Ok(Exp::Var(VarExp::new(id, VarShape::Simple, span)))
                    }
                }
            }
            TokenKind::Number => {
                let token = self.advance()?;
                let value = integer_value(&token)?;
                Ok(Exp::NumLit(NumLit {
                    value,
                    span: token.span,
                    resolved_type: None,
                }))
            }
            TokenKind::StringLiteral => {
                let token = self.advance()?;
                Ok(Exp::StrLit(StrLit {
                    value: token.text,
                    span: token.span,
                    label: None,
                    resolved_type: None,
                }))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn args(&mut self) -> Result<Vec<Exp>, Diagnostic> {
        let mut args = vec![];
        if self.peek() == TokenKind::RightParen {
            return Ok(args);
        }
        args.push(self.expression()?);
        while self.eat(TokenKind::Comma)?.is_some() {
            args.push(self.expression()?);
        }
        Ok(args)
    }
}
