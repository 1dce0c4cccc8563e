//! Parse tree trace.
//!
//! Nested-tag rendering of every production the compilation engine
//! enters and every token it consumes. Purely informational; nothing
//! here influences the emitted code.
use crate::{error::CompileResult, token_stream::Scanner, tokens::Token};
use std::borrow::Cow;

/// Grammar productions that show up as elements in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Class,
    ClassVarDec,
    SubroutineDec,
    ParameterList,
    SubroutineBody,
    VarDec,
    Statements,
    LetStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ReturnStatement,
    Expression,
    Term,
    ExpressionList,
}

impl Node {
    #[rustfmt::skip]
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Class           => "class",
            Node::ClassVarDec     => "classVarDec",
            Node::SubroutineDec   => "subroutineDec",
            Node::ParameterList   => "parameterList",
            Node::SubroutineBody  => "subroutineBody",
            Node::VarDec          => "varDec",
            Node::Statements      => "statements",
            Node::LetStatement    => "letStatement",
            Node::IfStatement     => "ifStatement",
            Node::WhileStatement  => "whileStatement",
            Node::DoStatement     => "doStatement",
            Node::ReturnStatement => "returnStatement",
            Node::Expression      => "expression",
            Node::Term            => "term",
            Node::ExpressionList  => "expressionList",
        }
    }
}

/// Indented trace writer.
///
/// A disabled trace accepts every call and records nothing.
#[derive(Debug, Default)]
pub struct Trace {
    out: Option<String>,
    depth: usize,
}

impl Trace {
    pub fn new(enabled: bool) -> Self {
        Self {
            out: enabled.then(String::new),
            depth: 0,
        }
    }

    pub fn open(&mut self, node: Node) {
        if self.out.is_some() {
            self.line(&format!("<{}>", node.tag()));
        }
        self.depth += 1;
    }

    pub fn close(&mut self, node: Node) {
        self.depth = self.depth.saturating_sub(1);
        if self.out.is_some() {
            self.line(&format!("</{}>", node.tag()));
        }
    }

    pub fn token(&mut self, token: &Token) {
        if self.out.is_some() {
            self.line(&token_element(token));
        }
    }

    /// Recorded text, or `None` when tracing is disabled.
    pub fn finish(self) -> Option<String> {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Some(out) = self.out.as_mut() {
            for _ in 0..self.depth {
                out.push_str("  ");
            }
            out.push_str(text);
            out.push('\n');
        }
    }
}

fn token_element(token: &Token) -> String {
    let tag = token.kind.tag();
    format!("<{tag}> {} </{tag}>", escape(&token.lexeme))
}

/// Replace characters that are unsafe in markup.
pub fn escape(text: &str) -> Cow<'_, str> {
    if text.contains(&['&', '<', '>'][..]) {
        Cow::Owned(
            text.replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;"),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// Flat listing of every token in the source.
pub fn token_listing(source_code: &str) -> CompileResult<String> {
    let mut out = String::from("<tokens>\n");
    for token in Scanner::new(source_code)? {
        out.push_str(&token_element(&token?));
        out.push('\n');
    }
    out.push_str("</tokens>\n");
    Ok(out)
}
