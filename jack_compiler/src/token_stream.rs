//! Token stream with one token of look ahead.
use crate::{
    error::{CompileError, CompileResult, Expected, LexError},
    lex::Lexer,
    tokens::Token,
};

/// Lazily scanned stream of tokens.
///
/// The next token is always buffered: it is lexed when the
/// scanner is constructed, and again after every advance.
/// Consequently a lexical error in the token *after* the one
/// being consumed surfaces on [`Scanner::advance`].
pub struct Scanner<'a> {
    lexer: Lexer<'a>,
    next: Option<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(source_code: &'a str) -> Result<Self, LexError> {
        let mut lexer = Lexer::new(source_code);
        let next = lexer.next_token()?;
        Ok(Self { lexer, next })
    }

    /// Indicates whether there is another token to consume.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Return the next token without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.next.as_ref()
    }

    /// Consume the buffered token and scan the one after it.
    ///
    /// # Errors
    ///
    /// Fails when the stream is exhausted, or when scanning the
    /// following token fails.
    pub fn advance(&mut self) -> CompileResult<Token> {
        let token = self.next.take().ok_or(CompileError::EndOfInput {
            expected: Expected::Token,
        })?;
        self.next = self.lexer.next_token()?;
        Ok(token)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.advance())
        } else {
            None
        }
    }
}
