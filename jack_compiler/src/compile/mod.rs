//! Single pass compilation engine.
//!
//! Parsing and code generation are fused: each grammar production
//! consumes its tokens, updates the symbol tables and emits stack
//! machine instructions as it goes. No syntax tree is built.
mod class;
mod context;
mod expr;
mod ir;
mod stmts;
mod symbol;

pub use context::{CompileConf, CompileContext};
pub use ir::{render, ArithOp, Segment, VmCommand};
pub use symbol::{Binding, Category, Scopes, SubroutineKind, SymbolTable};

use crate::{
    error::{CompileError, CompileResult, Expected},
    token_stream::Scanner,
    tokens::{Keyword, Symbol, Token, TokenKind},
    trace::Trace,
};
use log::trace;
use smol_str::SmolStr;

/// Output of compiling one class.
#[derive(Debug)]
pub struct CompiledClass {
    pub name: SmolStr,
    pub code: Vec<VmCommand>,
    /// Parse tree trace, when enabled in [`CompileConf`].
    pub trace: Option<String>,
}

impl CompiledClass {
    /// Emitted code in its textual form.
    pub fn render(&self) -> String {
        render(&self.code)
    }
}

/// Recursive descent parser that emits code.
///
/// Compiles exactly one class. State that outlives the class
/// lives in the borrowed [`CompileContext`].
pub struct Engine<'a, 'c> {
    scanner: Scanner<'a>,
    ctx: &'c mut CompileContext,
    scopes: Scopes,
    trace: Trace,
    code: Vec<VmCommand>,
    class_name: SmolStr,
    subroutine_name: SmolStr,
}

impl<'a, 'c> Engine<'a, 'c> {
    pub fn new(source_code: &'a str, ctx: &'c mut CompileContext) -> CompileResult<Self> {
        let trace = Trace::new(ctx.config().trace);
        Ok(Self {
            scanner: Scanner::new(source_code)?,
            ctx,
            scopes: Scopes::default(),
            trace,
            code: vec![],
            class_name: SmolStr::default(),
            subroutine_name: SmolStr::default(),
        })
    }

    /// Compile the class making up the whole source.
    pub fn compile(mut self) -> CompileResult<CompiledClass> {
        self.compile_class()?;

        if let Some(token) = self.scanner.peek() {
            return Err(CompileError::Syntax {
                expected: Expected::EndOfInput,
                found: token.clone(),
            });
        }

        Ok(CompiledClass {
            name: self.class_name,
            code: self.code,
            trace: self.trace.finish(),
        })
    }
}

/// Token helpers.
impl<'a, 'c> Engine<'a, 'c> {
    #[inline]
    fn peek_kind(&self) -> Option<TokenKind> {
        self.scanner.peek().map(|token| token.kind)
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(keyword)) => Some(keyword),
            _ => None,
        }
    }

    fn peek_symbol(&self) -> Option<Symbol> {
        match self.peek_kind() {
            Some(TokenKind::Symbol(symbol)) => Some(symbol),
            _ => None,
        }
    }

    #[inline]
    fn is_keyword(&self, keywords: &[Keyword]) -> bool {
        self.peek_keyword()
            .map(|keyword| keywords.contains(&keyword))
            .unwrap_or(false)
    }

    #[inline]
    fn is_symbol(&self, symbol: Symbol) -> bool {
        self.peek_symbol() == Some(symbol)
    }

    /// Consume the next token if it satisfies the predicate,
    /// otherwise fail with what was expected.
    ///
    /// The cursor is not advanced when the token doesn't match.
    fn consume_if(
        &mut self,
        expected: impl FnOnce() -> Expected,
        predicate: impl FnOnce(&TokenKind) -> bool,
    ) -> CompileResult<Token> {
        match self.scanner.peek() {
            None => {
                return Err(CompileError::EndOfInput {
                    expected: expected(),
                })
            }
            Some(token) if !predicate(&token.kind) => {
                return Err(CompileError::Syntax {
                    expected: expected(),
                    found: token.clone(),
                })
            }
            Some(_) => {}
        }

        let token = self.scanner.advance()?;
        self.trace.token(&token);
        Ok(token)
    }

    fn consume_keyword(&mut self, keywords: &[Keyword]) -> CompileResult<Keyword> {
        let token = self.consume_if(
            || Expected::Keyword(keywords.to_vec()),
            |kind| matches!(kind, TokenKind::Keyword(k) if keywords.contains(k)),
        )?;

        match token.kind {
            TokenKind::Keyword(keyword) => Ok(keyword),
            _ => Err(CompileError::Syntax {
                expected: Expected::Keyword(keywords.to_vec()),
                found: token,
            }),
        }
    }

    fn consume_symbol(&mut self, symbol: Symbol) -> CompileResult<Token> {
        self.consume_if(
            || Expected::Symbol(symbol),
            |kind| *kind == TokenKind::Symbol(symbol),
        )
    }

    fn consume_identifier(&mut self) -> CompileResult<Token> {
        self.consume_if(|| Expected::Identifier, |kind| *kind == TokenKind::Ident)
    }

    /// Primitive type keyword or class name.
    fn consume_type(&mut self) -> CompileResult<SmolStr> {
        self.consume_if(
            || Expected::Type,
            |kind| {
                matches!(
                    kind,
                    TokenKind::Ident
                        | TokenKind::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean)
                )
            },
        )
        .map(|token| token.lexeme)
    }

    fn emit(&mut self, command: VmCommand) {
        trace!("{}", command);
        self.code.push(command);
    }

    #[inline]
    fn emit_push(&mut self, segment: Segment, index: u16) {
        self.emit(VmCommand::Push(segment, index));
    }

    #[inline]
    fn emit_pop(&mut self, segment: Segment, index: u16) {
        self.emit(VmCommand::Pop(segment, index));
    }

    /// Storage location of an identifier used as a variable.
    fn resolve_variable(&self, name: &Token) -> CompileResult<(Segment, u16)> {
        self.scopes
            .lookup(&name.lexeme)
            .and_then(Binding::location)
            .ok_or_else(|| CompileError::UnresolvedIdentifier {
                name: name.lexeme.clone(),
                span: name.span,
            })
    }
}
