//! Tokens
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw text of the token.
    ///
    /// String constants store their value without the
    /// delimiting quotes.
    pub lexeme: SmolStr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// One-character punctuation or operator
    Symbol(Symbol),
    Ident,
    /// Integer literal, already validated to fit in 15 bits.
    Int(u16),
    /// String literal
    Str,
}

impl TokenKind {
    /// Tag name used when rendering the token in a trace.
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Symbol(_) => "symbol",
            TokenKind::Ident => "identifier",
            TokenKind::Int(_) => "integerConstant",
            TokenKind::Str => "stringConstant",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            TokenKind::Symbol(symbol) => write!(f, "symbol '{symbol}'"),
            TokenKind::Ident => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Int(value) => write!(f, "integer constant {value}"),
            TokenKind::Str => write!(f, "string constant \"{}\"", self.lexeme),
        }
    }
}

/// Chunk of source code, encoded as starting position and size.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    /// Start byte position in source.
    pub index: u32,
    /// Size in bytes.
    pub size: u32,
    /// One-based line of the first character.
    pub line: u32,
    /// One-based column of the first character.
    pub column: u32,
}

impl Span {
    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,

    // ------------------------------------------------------------------------
    // Types
    Int,
    Char,
    Boolean,
    Void,

    // ------------------------------------------------------------------------
    // Constants
    True,
    False,
    Null,
    This,

    // ------------------------------------------------------------------------
    // Statements
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-character symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Symbol {
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~
}

impl Symbol {
    #[rustfmt::skip]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::LeftBrace),
            '}' => Some(Self::RightBrace),
            '(' => Some(Self::LeftParen),
            ')' => Some(Self::RightParen),
            '[' => Some(Self::LeftBracket),
            ']' => Some(Self::RightBracket),
            '.' => Some(Self::Dot),
            ',' => Some(Self::Comma),
            ';' => Some(Self::Semicolon),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Star),
            '/' => Some(Self::Slash),
            '&' => Some(Self::Amp),
            '|' => Some(Self::Pipe),
            '<' => Some(Self::Less),
            '>' => Some(Self::Greater),
            '=' => Some(Self::Eq),
            '~' => Some(Self::Tilde),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_char(&self) -> char {
        match self {
            Self::LeftBrace    => '{',
            Self::RightBrace   => '}',
            Self::LeftParen    => '(',
            Self::RightParen   => ')',
            Self::LeftBracket  => '[',
            Self::RightBracket => ']',
            Self::Dot          => '.',
            Self::Comma        => ',',
            Self::Semicolon    => ';',
            Self::Plus         => '+',
            Self::Minus        => '-',
            Self::Star         => '*',
            Self::Slash        => '/',
            Self::Amp          => '&',
            Self::Pipe         => '|',
            Self::Less         => '<',
            Self::Greater      => '>',
            Self::Eq           => '=',
            Self::Tilde        => '~',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
