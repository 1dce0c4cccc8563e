use super::{ArithOp, Engine, Segment, VmCommand};
use crate::{
    error::{CompileError, CompileResult, Expected},
    tokens::{Keyword, Symbol, Token, TokenKind},
    trace::Node,
};
use smol_str::SmolStr;

/// Instruction a binary operator compiles to.
///
/// Multiplication and division are delegated to the runtime library.
#[rustfmt::skip]
fn binary_op(symbol: Symbol) -> Option<VmCommand> {
    match symbol {
        Symbol::Plus    => Some(VmCommand::Arith(ArithOp::Add)),
        Symbol::Minus   => Some(VmCommand::Arith(ArithOp::Sub)),
        Symbol::Star    => Some(VmCommand::call("Math.multiply", 2)),
        Symbol::Slash   => Some(VmCommand::call("Math.divide", 2)),
        Symbol::Amp     => Some(VmCommand::Arith(ArithOp::And)),
        Symbol::Pipe    => Some(VmCommand::Arith(ArithOp::Or)),
        Symbol::Less    => Some(VmCommand::Arith(ArithOp::Lt)),
        Symbol::Greater => Some(VmCommand::Arith(ArithOp::Gt)),
        Symbol::Eq      => Some(VmCommand::Arith(ArithOp::Eq)),
        _ => None,
    }
}

impl<'a, 'c> Engine<'a, 'c> {
    /// `term (op term)*`
    ///
    /// There is no precedence; operators apply left to right.
    pub(super) fn expression(&mut self) -> CompileResult<()> {
        self.trace.open(Node::Expression);
        self.term()?;

        while let Some(symbol) = self.peek_symbol() {
            let Some(op) = binary_op(symbol) else {
                break;
            };
            self.consume_symbol(symbol)?;
            self.term()?;
            self.emit(op);
        }

        self.trace.close(Node::Expression);
        Ok(())
    }

    fn term(&mut self) -> CompileResult<()> {
        self.trace.open(Node::Term);

        let token = match self.scanner.peek() {
            Some(token) => token.clone(),
            None => {
                return Err(CompileError::EndOfInput {
                    expected: Expected::Term,
                })
            }
        };

        match token.kind {
            TokenKind::Int(value) => {
                self.consume_if(|| Expected::Term, |_| true)?;
                self.emit_push(Segment::Constant, value);
            }
            TokenKind::Str => {
                self.consume_if(|| Expected::Term, |_| true)?;
                self.string_constant(&token)?;
            }
            TokenKind::Keyword(Keyword::True) => {
                self.consume_keyword(&[Keyword::True])?;
                self.emit_push(Segment::Constant, 0);
                self.emit(VmCommand::Arith(ArithOp::Not));
            }
            TokenKind::Keyword(keyword @ (Keyword::False | Keyword::Null)) => {
                self.consume_keyword(&[keyword])?;
                self.emit_push(Segment::Constant, 0);
            }
            TokenKind::Keyword(Keyword::This) => {
                self.consume_keyword(&[Keyword::This])?;
                self.emit_push(Segment::Pointer, 0);
            }
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.consume_symbol(Symbol::LeftParen)?;
                self.expression()?;
                self.consume_symbol(Symbol::RightParen)?;
            }
            TokenKind::Symbol(symbol @ (Symbol::Minus | Symbol::Tilde)) => {
                self.consume_symbol(symbol)?;
                self.term()?;
                let op = match symbol {
                    Symbol::Minus => ArithOp::Neg,
                    _ => ArithOp::Not,
                };
                self.emit(VmCommand::Arith(op));
            }
            TokenKind::Ident => {
                let name = self.consume_identifier()?;
                self.identifier_term(name)?;
            }
            _ => {
                return Err(CompileError::Syntax {
                    expected: Expected::Term,
                    found: token,
                })
            }
        }

        self.trace.close(Node::Term);
        Ok(())
    }

    /// Variable reference, array read or subroutine call.
    fn identifier_term(&mut self, name: Token) -> CompileResult<()> {
        match self.peek_symbol() {
            Some(Symbol::LeftParen | Symbol::Dot) => self.subroutine_call(name),
            Some(Symbol::LeftBracket) => {
                let (segment, index) = self.resolve_variable(&name)?;
                self.emit_push(segment, index);

                self.consume_symbol(Symbol::LeftBracket)?;
                self.expression()?;
                self.consume_symbol(Symbol::RightBracket)?;

                self.emit(VmCommand::Arith(ArithOp::Add));
                self.emit_pop(Segment::Pointer, 1);
                self.emit_push(Segment::That, 0);
                Ok(())
            }
            _ => {
                let (segment, index) = self.resolve_variable(&name)?;
                self.emit_push(segment, index);
                Ok(())
            }
        }
    }

    /// Build a string object one character at a time.
    fn string_constant(&mut self, token: &Token) -> CompileResult<()> {
        let units: Vec<u16> = token.lexeme.encode_utf16().collect();
        let length = u16::try_from(units.len())
            .map_err(|_| CompileError::StringTooLong { span: token.span })?;

        self.emit_push(Segment::Constant, length);
        self.emit(VmCommand::call("String.new", 1));

        for unit in units {
            self.emit_push(Segment::Constant, unit);
            self.emit(VmCommand::call("String.appendChar", 2));
        }

        Ok(())
    }

    /// `name ( expressionList )` or `qualifier . name ( expressionList )`
    ///
    /// The name token has already been consumed.
    ///
    /// A qualifier bound to a variable makes this a method call on
    /// that object, with the object passed as the first argument.
    /// Any other qualifier is taken as a class name. An unqualified
    /// name calls a method on the current object.
    pub(super) fn subroutine_call(&mut self, name: Token) -> CompileResult<()> {
        let (target, receivers) = if self.is_symbol(Symbol::Dot) {
            self.consume_symbol(Symbol::Dot)?;
            let method = self.consume_identifier()?.lexeme;

            let receiver = self
                .scopes
                .lookup(&name.lexeme)
                .and_then(|binding| Some((binding.location()?, binding.ty.clone())));

            match receiver {
                Some(((segment, index), ty)) => {
                    self.emit_push(segment, index);
                    (qualified(&ty, &method), 1)
                }
                None => (qualified(&name.lexeme, &method), 0),
            }
        } else {
            self.emit_push(Segment::Pointer, 0);
            (qualified(&self.class_name, &name.lexeme), 1)
        };

        self.consume_symbol(Symbol::LeftParen)?;
        let arg_count = self.expression_list()?;
        self.consume_symbol(Symbol::RightParen)?;

        self.emit(VmCommand::call(target, arg_count.saturating_add(receivers)));
        Ok(())
    }

    /// `(expression (, expression)*)?`
    fn expression_list(&mut self) -> CompileResult<u16> {
        self.trace.open(Node::ExpressionList);

        let mut count: u16 = 0;
        if !self.is_symbol(Symbol::RightParen) {
            loop {
                self.expression()?;
                count = count.saturating_add(1);

                if !self.is_symbol(Symbol::Comma) {
                    break;
                }
                self.consume_symbol(Symbol::Comma)?;
            }
        }

        self.trace.close(Node::ExpressionList);
        Ok(count)
    }
}

fn qualified(prefix: &str, name: &str) -> SmolStr {
    SmolStr::from(format!("{}.{}", prefix, name))
}
