//! Result and errors.
use crate::tokens::{Keyword, Span, Symbol, Token};
use smol_str::SmolStr;
use std::fmt;

pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Error encountered while scanning characters into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("{span}: invalid character '{}'", .character.escape_default())]
    InvalidCharacter { character: char, span: Span },
    #[error("{span}: unterminated string constant")]
    UnterminatedString { span: Span },
    #[error("{span}: unterminated comment")]
    UnterminatedComment { span: Span },
    #[error("{span}: integer literal exceeds maximum of {max}", max = crate::lex::MAX_INTEGER)]
    IntegerOverflow { span: Span },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The current token does not fit the grammar production.
    #[error("{}: expected {expected}, found {found}", .found.span)]
    Syntax { expected: Expected, found: Token },
    #[error("unexpected end of input, expected {expected}")]
    EndOfInput { expected: Expected },
    /// Identifier used as a variable that has no binding in any open scope.
    #[error("{span}: unresolved identifier '{name}'")]
    UnresolvedIdentifier { name: SmolStr, span: Span },
    /// Every slot of the declaration's category is already taken.
    #[error("too many variables, no slot left for '{name}'")]
    SlotOverflow { name: SmolStr },
    #[error("{span}: string constant is longer than {max} characters", max = u16::MAX)]
    StringTooLong { span: Span },
    /// Declaration made while the scope it belongs to is not open.
    #[error("no open scope for declaration of '{name}'")]
    NoScope { name: SmolStr },
}

/// What the compilation engine was looking for when it
/// encountered an unexpected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// One of a set of keywords.
    Keyword(Vec<Keyword>),
    Symbol(Symbol),
    Identifier,
    /// Primitive type keyword or class name.
    Type,
    Term,
    /// Any token at all.
    Token,
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Keyword(keywords) => match keywords.as_slice() {
                [keyword] => write!(f, "keyword '{keyword}'"),
                keywords => {
                    let names = keywords
                        .iter()
                        .map(|keyword| format!("'{keyword}'"))
                        .collect::<Vec<_>>();
                    write!(f, "one of {}", names.join(", "))
                }
            },
            Expected::Symbol(symbol) => write!(f, "symbol '{symbol}'"),
            Expected::Identifier => write!(f, "identifier"),
            Expected::Type => write!(f, "type"),
            Expected::Term => write!(f, "term"),
            Expected::Token => write!(f, "token"),
            Expected::EndOfInput => write!(f, "end of input"),
        }
    }
}
