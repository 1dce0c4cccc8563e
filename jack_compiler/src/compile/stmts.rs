use super::{ArithOp, Engine, Segment, VmCommand};
use crate::{
    error::{CompileError, CompileResult, Expected},
    tokens::{Keyword, Symbol},
    trace::Node,
};

impl<'a, 'c> Engine<'a, 'c> {
    /// Zero or more statements, until a token that can't start one.
    pub(super) fn statements(&mut self) -> CompileResult<()> {
        self.trace.open(Node::Statements);

        loop {
            match self.peek_keyword() {
                Some(Keyword::Let) => self.let_statement()?,
                Some(Keyword::If) => self.if_statement()?,
                Some(Keyword::While) => self.while_statement()?,
                Some(Keyword::Do) => self.do_statement()?,
                Some(Keyword::Return) => self.return_statement()?,
                _ => break,
            }
        }

        self.trace.close(Node::Statements);
        Ok(())
    }

    /// `let name ([ expression ])? = expression ;`
    fn let_statement(&mut self) -> CompileResult<()> {
        self.trace.open(Node::LetStatement);
        self.consume_keyword(&[Keyword::Let])?;

        let name = self.consume_identifier()?;
        let (segment, index) = self.resolve_variable(&name)?;

        let is_array = self.is_symbol(Symbol::LeftBracket);
        if is_array {
            self.consume_symbol(Symbol::LeftBracket)?;
            self.expression()?;
            self.consume_symbol(Symbol::RightBracket)?;

            // Element address = base + index.
            self.emit_push(segment, index);
            self.emit(VmCommand::Arith(ArithOp::Add));
        }

        self.consume_symbol(Symbol::Eq)?;
        self.expression()?;
        self.consume_symbol(Symbol::Semicolon)?;

        if is_array {
            self.emit_pop(Segment::Temp, 0);
            self.emit_pop(Segment::Pointer, 1);
            self.emit_push(Segment::Temp, 0);
            self.emit_pop(Segment::That, 0);
        } else {
            self.emit_pop(segment, index);
        }

        self.trace.close(Node::LetStatement);
        Ok(())
    }

    /// `if ( expression ) { statements } (else { statements })?`
    fn if_statement(&mut self) -> CompileResult<()> {
        self.trace.open(Node::IfStatement);

        let on_true = self.ctx.next_label();
        let on_false = self.ctx.next_label();
        let end = self.ctx.next_label();

        self.consume_keyword(&[Keyword::If])?;
        self.condition()?;

        self.emit(VmCommand::IfGoto(on_true.clone()));
        self.emit(VmCommand::Goto(on_false.clone()));
        self.emit(VmCommand::Label(on_true));

        self.block()?;

        self.emit(VmCommand::Goto(end.clone()));
        self.emit(VmCommand::Label(on_false));

        if self.is_keyword(&[Keyword::Else]) {
            self.consume_keyword(&[Keyword::Else])?;
            self.block()?;
        }

        self.emit(VmCommand::Label(end));

        self.trace.close(Node::IfStatement);
        Ok(())
    }

    /// `while ( expression ) { statements }`
    fn while_statement(&mut self) -> CompileResult<()> {
        self.trace.open(Node::WhileStatement);

        let top = self.ctx.next_label();
        let end = self.ctx.next_label();

        self.consume_keyword(&[Keyword::While])?;
        self.emit(VmCommand::Label(top.clone()));
        self.condition()?;

        self.emit(VmCommand::Arith(ArithOp::Not));
        self.emit(VmCommand::IfGoto(end.clone()));

        self.block()?;

        self.emit(VmCommand::Goto(top));
        self.emit(VmCommand::Label(end));

        self.trace.close(Node::WhileStatement);
        Ok(())
    }

    /// `do subroutineCall ;`
    ///
    /// The return value is always discarded.
    fn do_statement(&mut self) -> CompileResult<()> {
        self.trace.open(Node::DoStatement);
        self.consume_keyword(&[Keyword::Do])?;

        let name = self.consume_identifier()?;
        if !self.is_symbol(Symbol::Dot) && !self.is_symbol(Symbol::LeftParen) {
            return Err(match self.scanner.peek() {
                Some(token) => CompileError::Syntax {
                    expected: Expected::Symbol(Symbol::LeftParen),
                    found: token.clone(),
                },
                None => CompileError::EndOfInput {
                    expected: Expected::Symbol(Symbol::LeftParen),
                },
            });
        }
        self.subroutine_call(name)?;
        self.consume_symbol(Symbol::Semicolon)?;

        self.emit_pop(Segment::Temp, 0);

        self.trace.close(Node::DoStatement);
        Ok(())
    }

    /// `return expression? ;`
    fn return_statement(&mut self) -> CompileResult<()> {
        self.trace.open(Node::ReturnStatement);
        self.consume_keyword(&[Keyword::Return])?;

        if self.is_symbol(Symbol::Semicolon) {
            // Every function leaves a value, even void ones.
            self.emit_push(Segment::Constant, 0);
        } else {
            self.expression()?;
        }
        self.consume_symbol(Symbol::Semicolon)?;

        self.emit(VmCommand::Return);

        self.trace.close(Node::ReturnStatement);
        Ok(())
    }

    /// `( expression )`
    fn condition(&mut self) -> CompileResult<()> {
        self.consume_symbol(Symbol::LeftParen)?;
        self.expression()?;
        self.consume_symbol(Symbol::RightParen)?;
        Ok(())
    }

    /// `{ statements }`
    fn block(&mut self) -> CompileResult<()> {
        self.consume_symbol(Symbol::LeftBrace)?;
        self.statements()?;
        self.consume_symbol(Symbol::RightBrace)?;
        Ok(())
    }
}
