//! Stack machine instructions emitted by the compiler.
use smol_str::SmolStr;
use std::fmt;

/// Storage region addressed by `push` and `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Constant => write!(f, "constant"),
            Segment::Local    => write!(f, "local"),
            Segment::Argument => write!(f, "argument"),
            Segment::This     => write!(f, "this"),
            Segment::That     => write!(f, "that"),
            Segment::Pointer  => write!(f, "pointer"),
            Segment::Temp     => write!(f, "temp"),
            Segment::Static   => write!(f, "static"),
        }
    }
}

/// Arithmetic and logical commands operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for ArithOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "add"),
            ArithOp::Sub => write!(f, "sub"),
            ArithOp::Neg => write!(f, "neg"),
            ArithOp::Eq  => write!(f, "eq"),
            ArithOp::Gt  => write!(f, "gt"),
            ArithOp::Lt  => write!(f, "lt"),
            ArithOp::And => write!(f, "and"),
            ArithOp::Or  => write!(f, "or"),
            ArithOp::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    /// `push segment index`
    Push(Segment, u16),
    /// `pop segment index`
    Pop(Segment, u16),
    Arith(ArithOp),
    /// `label L`
    Label(SmolStr),
    /// `goto L`
    ///
    /// Unconditional jump.
    Goto(SmolStr),
    /// `if-goto L`
    ///
    /// Pop the top of the stack and jump if it is not zero.
    IfGoto(SmolStr),
    /// `call Class.name nArgs`
    Call(SmolStr, u16),
    /// `function Class.name nLocals`
    Function(SmolStr, u16),
    Return,
}

impl VmCommand {
    #[inline]
    pub fn call(name: impl Into<SmolStr>, arg_count: u16) -> Self {
        VmCommand::Call(name.into(), arg_count)
    }
}

/// Outputs the instruction in its textual form.
impl fmt::Display for VmCommand {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmCommand::Push(segment, index) => write!(f, "push {} {}", segment, index),
            VmCommand::Pop(segment, index)  => write!(f, "pop {} {}", segment, index),
            VmCommand::Arith(op)            => write!(f, "{}", op),
            VmCommand::Label(label)         => write!(f, "label {}", label),
            VmCommand::Goto(label)          => write!(f, "goto {}", label),
            VmCommand::IfGoto(label)        => write!(f, "if-goto {}", label),
            VmCommand::Call(name, n)        => write!(f, "call {} {}", name, n),
            VmCommand::Function(name, n)    => write!(f, "function {} {}", name, n),
            VmCommand::Return               => write!(f, "return"),
        }
    }
}

/// Render a sequence of instructions, one per line.
pub fn render(code: &[VmCommand]) -> String {
    let mut out = String::new();
    for command in code {
        out.push_str(&command.to_string());
        out.push('\n');
    }
    out
}
