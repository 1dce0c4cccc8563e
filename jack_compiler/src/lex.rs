//! Lexical analysis (tokenizer)
use crate::{
    error::LexError,
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};

use itertools::{multipeek, MultiPeek};
use smol_str::SmolStr;
use std::{iter::Iterator, str::CharIndices};

/// Largest value an integer literal may have.
pub const MAX_INTEGER: u16 = 32767;

/// Lexical analyzer.
///
/// Produces tokens on demand. Whitespace and comments are
/// discarded and never reach the caller.
pub struct Lexer<'a> {
    source: SourceText<'a>,
    token_start: SourcePos,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            source: SourceText::new(source_code),
            token_start: SourcePos::default(),
        }
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Returns `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            self.consume_whitespace();
            self.start_token();

            let c = match self.source.peek_char() {
                Some(c) => c,
                None => return Ok(None),
            };

            match c {
                '"' => return self.consume_string().map(Some),
                '/' => match self.source.peek_char2() {
                    (_, Some('/')) => self.consume_line_comment(),
                    (_, Some('*')) => self.consume_block_comment()?,
                    _ => {
                        self.source.next_char();
                        return Ok(Some(self.make_token(TokenKind::Symbol(Symbol::Slash))));
                    }
                },
                '0'..='9' => return self.consume_number().map(Some),
                '_' | 'a'..='z' | 'A'..='Z' => return Ok(Some(self.consume_ident())),
                c => match Symbol::from_char(c) {
                    Some(symbol) => {
                        self.source.next_char();
                        return Ok(Some(self.make_token(TokenKind::Symbol(symbol))));
                    }
                    None => {
                        self.source.next_char();
                        return Err(LexError::InvalidCharacter {
                            character: c,
                            span: self.make_span(),
                        });
                    }
                },
            }
        }
    }

    /// Prime the lexer state for recording a new token.
    fn start_token(&mut self) {
        self.token_start = self.source.position();
    }

    /// Span from the start of the current token up to the cursor.
    fn make_span(&self) -> Span {
        let end = self.source.offset;
        debug_assert!(end >= self.token_start.offset);

        Span {
            index: self.token_start.offset as u32,
            size: (end - self.token_start.offset) as u32,
            line: self.token_start.line,
            column: self.token_start.column,
        }
    }

    fn fragment(&self) -> &'a str {
        self.make_span().fragment(self.source.original)
    }

    fn make_token(&mut self, kind: TokenKind) -> Token {
        Token {
            kind,
            lexeme: SmolStr::from(self.fragment()),
            span: self.make_span(),
        }
    }

    /// Consume space, tab, carriage return and line feed characters
    /// until something else is encountered.
    fn consume_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.source.peek_char() {
            self.source.next_char();
        }
    }

    /// Discard a `//` comment up to, but not including, the line terminator.
    fn consume_line_comment(&mut self) {
        while let Some(c) = self.source.peek_char() {
            if matches!(c, '\n' | '\r') {
                break;
            }
            self.source.next_char();
        }
    }

    /// Discard a `/* ... */` comment, including the closing marker.
    fn consume_block_comment(&mut self) -> Result<(), LexError> {
        // Opening `/*`
        self.source.next_char();
        self.source.next_char();

        loop {
            match self.source.next_char() {
                Some('*') if self.source.peek_char() == Some('/') => {
                    self.source.next_char();
                    return Ok(());
                }
                Some(_) => continue,
                None => {
                    return Err(LexError::UnterminatedComment {
                        span: self.make_span(),
                    })
                }
            }
        }
    }

    fn consume_string(&mut self) -> Result<Token, LexError> {
        // Opening quote
        self.source.next_char();

        let mut value = String::new();
        loop {
            match self.source.peek_char() {
                Some('"') => {
                    self.source.next_char();
                    break;
                }
                Some('\n' | '\r') | None => {
                    return Err(LexError::UnterminatedString {
                        span: self.make_span(),
                    })
                }
                Some(c) => {
                    value.push(c);
                    self.source.next_char();
                }
            }
        }

        Ok(Token {
            kind: TokenKind::Str,
            lexeme: SmolStr::from(value),
            span: self.make_span(),
        })
    }

    fn consume_number(&mut self) -> Result<Token, LexError> {
        let mut value: u32 = 0;
        while let Some(c @ '0'..='9') = self.source.peek_char() {
            let digit = c as u32 - '0' as u32;
            value = value.saturating_mul(10).saturating_add(digit);
            self.source.next_char();
        }

        if value > MAX_INTEGER as u32 {
            return Err(LexError::IntegerOverflow {
                span: self.make_span(),
            });
        }

        Ok(self.make_token(TokenKind::Int(value as u16)))
    }

    fn consume_ident(&mut self) -> Token {
        while let Some('_' | 'a'..='z' | 'A'..='Z' | '0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }

        // If a valid keyword can be parsed from the source fragment, then
        // the token is a reserved keyword instead of a user defined identifier.
        let token_kind = Keyword::parse(self.fragment())
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Ident);
        self.make_token(token_kind)
    }
}

/// Wrapper for source code that keeps a cursor position.
///
/// Allows forward lookup via peeking.
struct SourceText<'a> {
    original: &'a str,

    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` advances its peek cursor on every `peek()` call,
    /// and resets it on `next()` or `reset_peek()`. The helpers below
    /// reset before peeking so a single peek is idempotent.
    source: MultiPeek<CharIndices<'a>>,

    /// Byte position of the next character to be consumed.
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            original: source,
            source: multipeek(source.char_indices()),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advance the cursor and return the consumed character.
    fn next_char(&mut self) -> Option<char> {
        let (index, c) = self.source.next()?;
        self.offset = index + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Character at the cursor, without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.source.reset_peek();
        let c = self.source.peek().map(|(_, c)| *c);
        self.source.reset_peek();
        c
    }

    /// Two character lookahead.
    fn peek_char2(&mut self) -> (Option<char>, Option<char>) {
        self.source.reset_peek();
        let first = self.source.peek().map(|(_, c)| *c);
        let second = self.source.peek().map(|(_, c)| *c);
        self.source.reset_peek();
        (first, second)
    }

    fn position(&self) -> SourcePos {
        SourcePos {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SourcePos {
    offset: usize,
    line: u32,
    column: u32,
}
