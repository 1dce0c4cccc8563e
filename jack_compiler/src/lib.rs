pub mod compile;
pub mod error;
pub mod lex;
pub mod token_stream;
pub mod tokens;
pub mod trace;

pub use compile::{CompileConf, CompileContext, CompiledClass, VmCommand};
pub use error::{CompileError, CompileResult, LexError};

use compile::Engine;

/// Compile a single class with a fresh context.
pub fn compile_str(source: &str) -> CompileResult<Vec<VmCommand>> {
    let mut ctx = CompileContext::default();
    compile_class(source, &mut ctx).map(|class| class.code)
}

/// Compile one class, sharing sizes and labels with earlier
/// classes compiled in the same context.
pub fn compile_class(source: &str, ctx: &mut CompileContext) -> CompileResult<CompiledClass> {
    Engine::new(source, ctx)?.compile()
}
