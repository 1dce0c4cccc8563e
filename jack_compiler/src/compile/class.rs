//! Class and subroutine declarations.
use super::{Binding, Category, Engine, Segment, SubroutineKind, VmCommand};
use crate::{
    error::CompileResult,
    tokens::{Keyword, Symbol},
    trace::Node,
};
use log::debug;
use smol_str::SmolStr;

const SUBROUTINE_KEYWORDS: &[Keyword] = &[Keyword::Constructor, Keyword::Function, Keyword::Method];

impl<'a, 'c> Engine<'a, 'c> {
    /// `class Name { classVarDec* subroutineDec* }`
    pub(super) fn compile_class(&mut self) -> CompileResult<()> {
        self.trace.open(Node::Class);
        self.class_header()?;

        while self.is_keyword(SUBROUTINE_KEYWORDS) {
            self.subroutine_dec()?;
        }

        self.consume_symbol(Symbol::RightBrace)?;
        self.scopes.close_class();
        self.trace.close(Node::Class);

        Ok(())
    }

    /// `class Name { classVarDec*`
    ///
    /// Opens the class scope and records the object size of the
    /// class before any subroutine is compiled.
    fn class_header(&mut self) -> CompileResult<()> {
        self.consume_keyword(&[Keyword::Class])?;
        let name = self.consume_identifier()?.lexeme;

        self.scopes.open_class();
        self.scopes
            .declare(Binding::new(name.clone(), Category::Class, name.clone()))?;
        self.class_name = name.clone();

        self.consume_symbol(Symbol::LeftBrace)?;

        let mut cells: u16 = 0;
        while self.is_keyword(&[Keyword::Static, Keyword::Field]) {
            cells = cells.saturating_add(self.class_var_dec()?);
        }

        debug!("class {} occupies {} cells", name, cells);
        self.ctx.set_class_size(name, cells);

        Ok(())
    }

    /// `(static | field) type name (, name)* ;`
    ///
    /// Returns the number of cells the declaration adds to the class size.
    /// Statics are counted along with fields.
    fn class_var_dec(&mut self) -> CompileResult<u16> {
        self.trace.open(Node::ClassVarDec);

        let category = match self.consume_keyword(&[Keyword::Static, Keyword::Field])? {
            Keyword::Field => Category::Field,
            _ => Category::Static,
        };
        let ty = self.consume_type()?;
        let count = self.declare_names(category, &ty)?;
        self.consume_symbol(Symbol::Semicolon)?;

        self.trace.close(Node::ClassVarDec);

        Ok(self.ctx.cell_size(&ty).saturating_mul(count))
    }

    /// `name (, name)*`, each bound with the same category and type.
    fn declare_names(&mut self, category: Category, ty: &SmolStr) -> CompileResult<u16> {
        let mut count: u16 = 0;
        loop {
            let name = self.consume_identifier()?.lexeme;
            self.scopes
                .declare(Binding::new(name, category, ty.clone()))?;
            count = count.saturating_add(1);

            if !self.is_symbol(Symbol::Comma) {
                return Ok(count);
            }
            self.consume_symbol(Symbol::Comma)?;
        }
    }

    /// `(constructor | function | method) (void | type) name ( parameterList ) subroutineBody`
    fn subroutine_dec(&mut self) -> CompileResult<()> {
        self.trace.open(Node::SubroutineDec);

        let kind = match self.consume_keyword(SUBROUTINE_KEYWORDS)? {
            Keyword::Constructor => SubroutineKind::Constructor,
            Keyword::Method => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };

        self.scopes.open_subroutine();

        if self.is_keyword(&[Keyword::Void]) {
            self.consume_keyword(&[Keyword::Void])?;
        } else {
            self.consume_type()?;
        }

        let name = self.consume_identifier()?.lexeme;
        self.scopes
            .declare(Binding::new(name.clone(), Category::Subroutine, kind.as_str()))?;
        self.subroutine_name = name;

        // The receiver is passed as the first argument.
        if kind == SubroutineKind::Method {
            self.scopes.reserve(Category::Parameter);
        }

        self.consume_symbol(Symbol::LeftParen)?;
        self.parameter_list()?;
        self.consume_symbol(Symbol::RightParen)?;

        self.subroutine_body()?;

        self.scopes.close_subroutine();
        self.trace.close(Node::SubroutineDec);

        Ok(())
    }

    /// `((type name) (, type name)*)?`
    fn parameter_list(&mut self) -> CompileResult<u16> {
        self.trace.open(Node::ParameterList);

        let mut count: u16 = 0;
        if !self.is_symbol(Symbol::RightParen) {
            loop {
                let ty = self.consume_type()?;
                let name = self.consume_identifier()?.lexeme;
                self.scopes
                    .declare(Binding::new(name, Category::Parameter, ty))?;
                count = count.saturating_add(1);

                if !self.is_symbol(Symbol::Comma) {
                    break;
                }
                self.consume_symbol(Symbol::Comma)?;
            }
        }

        self.trace.close(Node::ParameterList);
        Ok(count)
    }

    /// `{ varDec* statements }`
    fn subroutine_body(&mut self) -> CompileResult<()> {
        self.trace.open(Node::SubroutineBody);
        self.consume_symbol(Symbol::LeftBrace)?;

        let mut local_count: u16 = 0;
        while self.is_keyword(&[Keyword::Var]) {
            local_count = local_count.saturating_add(self.var_dec()?);
        }

        let function_name = SmolStr::from(format!("{}.{}", self.class_name, self.subroutine_name));
        debug!("compiling {} with {} locals", function_name, local_count);
        self.emit(VmCommand::Function(function_name, local_count));

        let kind = self
            .scopes
            .lookup_class(&self.subroutine_name)
            .and_then(Binding::subroutine_kind);

        match kind {
            Some(SubroutineKind::Constructor) => {
                let size = self.ctx.type_size(&self.class_name).unwrap_or(0);
                self.emit_push(Segment::Constant, size);
                self.emit(VmCommand::call("Memory.alloc", 1));
                self.emit_pop(Segment::Pointer, 0);
            }
            Some(SubroutineKind::Method) => {
                self.emit_push(Segment::Argument, 0);
                self.emit_pop(Segment::Pointer, 0);
            }
            Some(SubroutineKind::Function) | None => {}
        }

        self.statements()?;
        self.consume_symbol(Symbol::RightBrace)?;
        self.trace.close(Node::SubroutineBody);

        Ok(())
    }

    /// `var type name (, name)* ;`
    fn var_dec(&mut self) -> CompileResult<u16> {
        self.trace.open(Node::VarDec);

        self.consume_keyword(&[Keyword::Var])?;
        let ty = self.consume_type()?;
        let count = self.declare_names(Category::Local, &ty)?;
        self.consume_symbol(Symbol::Semicolon)?;

        self.trace.close(Node::VarDec);
        Ok(count)
    }
}
