//! Primary lexer for C-minus. The lexer transforms text into tokens
//! (tokens are the input to the parser).
//!
//! The lexer produces one token at a time. Whitespace and comments are
//! dropped and the end of the source is reported as an `Eof` token that
//! repeats on every further request.
use cminus_dsl::{
    core::{FileId, SourceSpan},
    diagnostic::{Diagnostic, Label},
};
use cminus_problems::Problem;
use log::trace;
use logos::Logos;

use crate::token::{LexicalError, Token, TokenKind};

pub struct Lexer<'source> {
    source: &'source str,
    inner: logos::Lexer<'source, TokenKind>,
    file_id: FileId,
    current: Option<Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, file_id: &FileId) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            file_id: file_id.clone(),
            current: None,
        }
    }

    /// Returns the last token produced by `next`, or `None` before the
    /// first call.
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Produces the next token.
    ///
    /// Returns a diagnostic for text that is not a valid token or for an
    /// integer literal out of range. Once the end of the source is reached,
    /// every call returns an `Eof` token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Token, Diagnostic> {
        let token = loop {
            match self.inner.next() {
                Some(Ok(TokenKind::Comment)) => continue,
                Some(Ok(TokenKind::Number)) => {
                    let token = self.token(TokenKind::Number);
                    integer_value(&token)?;
                    break token;
                }
                Some(Ok(kind)) => break self.token(kind),
                Some(Err(err)) => return Err(self.error(err)),
                None => {
                    let end = self.source.len();
                    break Token {
                        kind: TokenKind::Eof,
                        text: String::new(),
                        line: self.inner.extras.line,
                        span: SourceSpan::new(end, end, self.inner.extras.line)
                            .with_file_id(&self.file_id),
                    };
                }
            }
        };

        trace!("{}", token);
        self.current = Some(token.clone());
        Ok(token)
    }

    fn span(&self) -> SourceSpan {
        let range = self.inner.span();
        SourceSpan::new(range.start, range.end, self.inner.extras.line).with_file_id(&self.file_id)
    }

    fn token(&self, kind: TokenKind) -> Token {
        let slice = self.inner.slice();
        let text = match kind {
            TokenKind::StringLiteral => &slice[1..slice.len() - 1],
            _ => slice,
        };
        Token {
            kind,
            text: text.to_string(),
            line: self.inner.extras.line,
            span: self.span(),
        }
    }

    fn error(&self, err: LexicalError) -> Diagnostic {
        let span = self.span();
        match err {
            LexicalError::UnterminatedString => Diagnostic::problem(
                Problem::UnterminatedString,
                Label::span(span, "unterminated string"),
            ),
            LexicalError::UnterminatedComment => Diagnostic::problem(
                Problem::UnterminatedComment,
                Label::span(span, "unterminated comment"),
            ),
            LexicalError::InvalidSymbol => {
                let symbol = self.source[span.start..].chars().next().unwrap_or('\0');
                let message = if symbol == '!' {
                    String::from("invalid symbol `!`, expected `!=`")
                } else {
                    format!("invalid symbol `{}`", symbol)
                };
                Diagnostic::problem(Problem::InvalidSymbol, Label::span(span, message))
                    .with_context("symbol", &symbol.to_string())
            }
        }
    }
}

/// Returns the value of an integer literal token.
///
/// Integers are 32-bit, so a literal above `i32::MAX` is out of range.
pub(crate) fn integer_value(token: &Token) -> Result<i32, Diagnostic> {
    token.text.parse::<i32>().map_err(|_| {
        Diagnostic::problem(
            Problem::IntegerLiteralOutOfRange,
            Label::span(
                token.span.clone(),
                format!("integer literal `{}` is out of range", token.text),
            ),
        )
        .with_context("max", &i32::MAX.to_string())
    })
}

/// Tokenize a C-minus program.
///
/// Returns every token through the `Eof` token, or the first lexical error.
pub fn tokenize(source: &str, file_id: &FileId) -> Result<Vec<Token>, Diagnostic> {
    let mut lexer = Lexer::new(source, file_id);
    let mut tokens = vec![];
    loop {
        let token = lexer.next()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
