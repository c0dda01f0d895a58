//! Provides definitions of tokens from C-minus.
use std::fmt;

use cminus_dsl::core::SourceSpan;
use logos::{Lexer, Logos, Skip};

/// Tracks the line of the lexer position. Lines are 1-indexed.
#[derive(Debug)]
pub struct LineTracker {
    pub line: usize,
}

impl Default for LineTracker {
    fn default() -> Self {
        Self { line: 1 }
    }
}

/// Errors that the token automaton raises.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LexicalError {
    #[default]
    InvalidSymbol,
    UnterminatedString,
    UnterminatedComment,
}

/// Update the line count.
fn newline_callback(lex: &mut Lexer<TokenKind>) -> Skip {
    lex.extras.line += 1;
    Skip
}

/// Consumes the body of a comment through the closing `*/`. Comments do
/// not nest.
fn comment_callback(lex: &mut Lexer<TokenKind>) -> Result<(), LexicalError> {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => {
            lex.extras.line += remainder[..end].matches('\n').count();
            lex.bump(end + 2);
            Ok(())
        }
        // The line is left at the start of the comment so that the
        // error points there.
        None => Err(LexicalError::UnterminatedComment),
    }
}

/// Consumes the body of a string through the closing quote. Strings
/// cannot span lines.
fn string_callback(lex: &mut Lexer<TokenKind>) -> Result<(), LexicalError> {
    let remainder = lex.remainder();
    match remainder.find(['"', '\n']) {
        Some(end) if remainder.as_bytes()[end] == b'"' => {
            lex.bump(end + 1);
            Ok(())
        }
        _ => Err(LexicalError::UnterminatedString),
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(extras = LineTracker)]
#[logos(error = LexicalError)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    #[token("\n", newline_callback)]
    Newline,

    #[token("/*", comment_callback)]
    Comment,

    // Keywords
    #[token("int")]
    Int,
    #[token("void")]
    Void,
    #[token("string")]
    String,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("write")]
    Write,
    #[token("writeln")]
    Writeln,
    #[token("read")]
    Read,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+")]
    Number,

    #[token("\"", string_callback)]
    StringLiteral,

    // Grouping and other markers
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Ampersand,
    #[token("=")]
    Gets,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token(">=")]
    GreaterEqual,
    #[token(">")]
    Greater,

    /// Marks the end of the source. Never matched by the automaton.
    Eof,
}

impl TokenKind {
    /// Returns true if the kind starts a type specifier.
    pub fn is_type_specifier(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Void | TokenKind::String)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Void
                | TokenKind::String
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Write
                | TokenKind::Writeln
                | TokenKind::Read
        )
    }

    /// Returns true if the kind can start an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Ampersand
                | TokenKind::LeftParen
                | TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::StringLiteral
        )
    }

    /// The name of the kind as it appears in messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Newline => "newline",
            TokenKind::Comment => "comment",
            TokenKind::Int => "int",
            TokenKind::Void => "void",
            TokenKind::String => "string",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Write => "write",
            TokenKind::Writeln => "writeln",
            TokenKind::Read => "read",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Gets => "=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Greater => ">",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A classified piece of source text.
///
/// Tokens compare by kind, text and line. The span is kept for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The matched text. For string literals, the text between the quotes.
    pub text: String,
    /// The line of the first character (1-indexed).
    pub line: usize,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            span: SourceSpan::default(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {:?}", self.line, self.kind, self.text)
    }
}
