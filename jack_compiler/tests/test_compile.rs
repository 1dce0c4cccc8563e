use jack_compiler::{
    compile::{render, ArithOp, Segment, VmCommand},
    compile_class, compile_str,
    token_stream::Scanner,
    tokens::{Keyword, TokenKind},
    CompileConf, CompileContext, CompileError, LexError,
};

const ROBOT: &str = include_str!("programs/Robot.jack");
const MAIN: &str = include_str!("programs/Main.jack");

fn compile_lines(source: &str) -> Vec<String> {
    compile_str(source)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn assert_code(source: &str, expected: &[&str]) {
    assert_eq!(compile_lines(source), expected);
}

/// True when `window` appears as a contiguous run in `lines`.
fn contains_run(lines: &[String], window: &[&str]) -> bool {
    lines
        .windows(window.len())
        .any(|run| run.iter().map(String::as_str).eq(window.iter().copied()))
}

#[test]
fn test_constructor_allocates_object() {
    assert_code(
        "class Foo { field int x; constructor Foo new() { return this; } }",
        &[
            "function Foo.new 0",
            "push constant 1",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push pointer 0",
            "return",
        ],
    );
}

#[test]
fn test_class_size_includes_statics() {
    let mut ctx = CompileContext::default();
    let class = compile_class(
        "class Foo {
            static int s;
            field int x;
            static Foo first, last;
            constructor Foo new() { return this; }
        }",
        &mut ctx,
    )
    .unwrap();

    assert_eq!(ctx.type_size("Foo"), Some(4));
    assert_eq!(
        class.code[..3],
        [
            VmCommand::Function("Foo.new".into(), 0),
            VmCommand::Push(Segment::Constant, 4),
            VmCommand::call("Memory.alloc", 1),
        ]
    );
}

#[test]
fn test_if_else() {
    assert_code(
        "class Main {
            function void f() {
                var int x, y;
                if (x) { let y = 1; } else { let y = 2; }
                return;
            }
        }",
        &[
            "function Main.f 2",
            "push local 0",
            "if-goto L0",
            "goto L1",
            "label L0",
            "push constant 1",
            "pop local 1",
            "goto L2",
            "label L1",
            "push constant 2",
            "pop local 1",
            "label L2",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_if_without_else() {
    assert_code(
        "class Main { function void f() { var boolean b; if (b) { return; } return; } }",
        &[
            "function Main.f 1",
            "push local 0",
            "if-goto L0",
            "goto L1",
            "label L0",
            "push constant 0",
            "return",
            "goto L2",
            "label L1",
            "label L2",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_method_call_on_local() {
    assert_code(
        "class Main {
            function void f() {
                var int a, b;
                var Robot obj;
                do obj.run();
                return;
            }
        }",
        &[
            "function Main.f 3",
            "push local 2",
            "call Robot.run 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_integer_limit() {
    assert_code(
        "class Main { function int f() { return 32767; } }",
        &["function Main.f 0", "push constant 32767", "return"],
    );

    assert!(matches!(
        compile_str("class Main { function int f() { return 32768; } }"),
        Err(CompileError::Lex(LexError::IntegerOverflow { .. }))
    ));
}

#[test]
fn test_while() {
    assert_code(
        "class Main {
            function void f() {
                var int i;
                while (i < 3) { let i = i + 1; }
                return;
            }
        }",
        &[
            "function Main.f 1",
            "label L0",
            "push local 0",
            "push constant 3",
            "lt",
            "not",
            "if-goto L1",
            "push local 0",
            "push constant 1",
            "add",
            "pop local 0",
            "goto L0",
            "label L1",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_array_store_and_load() {
    assert_code(
        "class Main {
            function void f() {
                var Array a;
                var int i;
                let a[i] = 5;
                let i = a[1];
                return;
            }
        }",
        &[
            "function Main.f 2",
            // let a[i] = 5
            "push local 1",
            "push local 0",
            "add",
            "push constant 5",
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
            // let i = a[1]
            "push local 0",
            "push constant 1",
            "add",
            "pop pointer 1",
            "push that 0",
            "pop local 1",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_string_constant() {
    assert_code(
        "class Main { function void f() { do Output.printString(\"Hi\"); return; } }",
        &[
            "function Main.f 0",
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_method_receiver_and_fields() {
    assert_code(
        "class Point {
            field int x, y;
            method int getX() { return x; }
            method void shift(int dx) { let y = y + dx; return; }
        }",
        &[
            "function Point.getX 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "return",
            "function Point.shift 0",
            "push argument 0",
            "pop pointer 0",
            "push this 1",
            "push argument 1",
            "add",
            "pop this 1",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_unqualified_calls_target_current_object() {
    assert_code(
        "class Game {
            method void run() {
                var int n;
                do draw();
                let n = score();
                return;
            }
        }",
        &[
            "function Game.run 1",
            "push argument 0",
            "pop pointer 0",
            "push pointer 0",
            "call Game.draw 1",
            "pop temp 0",
            "push pointer 0",
            "call Game.score 1",
            "pop local 0",
            "push constant 0",
            "return",
        ],
    );
}

#[test]
fn test_static_call_has_no_receiver() {
    assert_code(
        "class Main {
            static int total;
            function int f() { return Math.max(total, Main.g()); }
            function int g() { return 1; }
        }",
        &[
            "function Main.f 0",
            "push static 0",
            "call Main.g 0",
            "call Math.max 2",
            "return",
            "function Main.g 0",
            "push constant 1",
            "return",
        ],
    );
}

#[test]
fn test_operators_apply_left_to_right() {
    assert_code(
        "class Main { function int f() { return 1 + 2 * 3 - 4 / 5; } }",
        &[
            "function Main.f 0",
            "push constant 1",
            "push constant 2",
            "add",
            "push constant 3",
            "call Math.multiply 2",
            "push constant 4",
            "sub",
            "push constant 5",
            "call Math.divide 2",
            "return",
        ],
    );
}

#[test]
fn test_unary_and_keyword_constants() {
    assert_code(
        "class Main {
            function boolean f() {
                var int x;
                let x = -x;
                return ~(true | false) = null;
            }
        }",
        &[
            "function Main.f 1",
            "push local 0",
            "neg",
            "pop local 0",
            "push constant 0",
            "not",
            "push constant 0",
            "or",
            "not",
            "push constant 0",
            "eq",
            "return",
        ],
    );
}

#[test]
fn test_robot_layout() {
    let lines = compile_lines(ROBOT);

    // One static and four fields.
    assert!(contains_run(
        &lines,
        &[
            "function Robot.new 0",
            "push constant 5",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
        ]
    ));

    // Field receiver.
    assert!(contains_run(
        &lines,
        &["push this 2", "call Array.dispose 1", "pop temp 0"]
    ));

    // Static access.
    assert!(contains_run(
        &lines,
        &["push static 0", "push constant 1", "sub", "pop static 0"]
    ));
}

#[test]
fn test_program_shares_context() {
    let mut ctx = CompileContext::default();

    let robot = compile_class(ROBOT, &mut ctx).unwrap();
    assert_eq!(robot.name, "Robot");
    assert_eq!(ctx.type_size("Robot"), Some(5));
    assert_eq!(ctx.label_count(), 5);

    let main = compile_class(MAIN, &mut ctx).unwrap();
    assert_eq!(main.name, "Main");
    assert_eq!(ctx.label_count(), 10);

    // Labels keep counting across classes.
    let lines: Vec<String> = main.code.iter().map(ToString::to_string).collect();
    assert!(lines.contains(&"label L5".to_string()));
    assert!(!lines.contains(&"label L0".to_string()));

    // Markup characters are not escaped in code.
    assert!(contains_run(
        &lines,
        &["push constant 14", "call String.new 1", "push constant 87"]
    ));
    assert!(lines.contains(&"push constant 60".to_string()));

    assert!(contains_run(
        &lines,
        &["push constant 3", "push constant 4", "neg", "call Robot.new 2", "pop local 0"]
    ));
    assert!(contains_run(
        &lines,
        &["push local 0", "call Robot.isHome 1", "not"]
    ));
}

/// Simulate the operand stack of each function, failing when it underflows.
fn check_stack_balance(code: &[VmCommand]) {
    let mut depth: i32 = 0;
    let mut function = "";

    for command in code {
        match command {
            VmCommand::Function(name, _) => {
                function = name.as_str();
                depth = 0;
            }
            VmCommand::Push(_, _) => depth += 1,
            VmCommand::Pop(_, _) | VmCommand::IfGoto(_) => depth -= 1,
            VmCommand::Arith(ArithOp::Neg | ArithOp::Not) => {}
            VmCommand::Arith(_) => depth -= 1,
            VmCommand::Call(_, arg_count) => depth -= *arg_count as i32 - 1,
            VmCommand::Return => {
                assert!(depth >= 1, "{function} returns without a value");
            }
            VmCommand::Label(_) | VmCommand::Goto(_) => {}
        }

        assert!(depth >= 0, "stack underflow in {function} at '{command}'");
    }
}

#[test]
fn test_stack_balance() {
    let mut ctx = CompileContext::default();

    for source in [ROBOT, MAIN] {
        let class = compile_class(source, &mut ctx).unwrap();
        check_stack_balance(&class.code);
    }
}

#[test]
fn test_label_count_matches_control_flow() {
    for source in [ROBOT, MAIN] {
        let keywords: Vec<Keyword> = Scanner::new(source)
            .unwrap()
            .filter_map(|token| match token.unwrap().kind {
                TokenKind::Keyword(keyword) => Some(keyword),
                _ => None,
            })
            .collect();
        let whiles = keywords.iter().filter(|k| **k == Keyword::While).count();
        let ifs = keywords.iter().filter(|k| **k == Keyword::If).count();

        let code = compile_str(source).unwrap();
        let mut labels: Vec<&str> = code
            .iter()
            .filter_map(|command| match command {
                VmCommand::Label(label) => Some(label.as_str()),
                _ => None,
            })
            .collect();

        let total = labels.len();
        labels.sort_unstable();
        labels.dedup();

        assert_eq!(labels.len(), total, "labels must be unique");
        assert_eq!(total, 2 * whiles + 3 * ifs);
    }
}

#[test]
fn test_label_prefix() {
    let mut ctx = CompileContext::new(CompileConf {
        label_prefix: "WHILE_".into(),
        ..Default::default()
    });

    let class = compile_class(
        "class Main { function void f() { while (true) { } return; } }",
        &mut ctx,
    )
    .unwrap();

    assert!(class.code.contains(&VmCommand::Label("WHILE_0".into())));
    assert!(class.code.contains(&VmCommand::Goto("WHILE_0".into())));
    assert!(class.code.contains(&VmCommand::IfGoto("WHILE_1".into())));
}

#[test]
fn test_lexemes_round_trip() {
    for source in [ROBOT, MAIN] {
        let tokens = Scanner::new(source)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for token in &tokens {
            let fragment = token.span.fragment(source);
            match token.kind {
                TokenKind::Str => assert_eq!(fragment, format!("\"{}\"", token.lexeme)),
                _ => assert_eq!(fragment, token.lexeme.as_str()),
            }
        }

        // Rejoining the lexemes yields the same token sequence.
        let rejoined = tokens
            .iter()
            .map(|token| match token.kind {
                TokenKind::Str => format!("\"{}\"", token.lexeme),
                _ => token.lexeme.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let rescanned = Scanner::new(&rejoined)
            .unwrap()
            .map(|token| token.map(|t| (t.kind, t.lexeme)))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let original: Vec<_> = tokens.into_iter().map(|t| (t.kind, t.lexeme)).collect();

        assert_eq!(rescanned, original);
    }
}

#[test]
fn test_locals_do_not_leak_between_subroutines() {
    let result = compile_str(
        "class Main {
            function void f() { var int secret; let secret = 1; return; }
            function int g() { return secret; }
        }",
    );

    match result {
        Err(CompileError::UnresolvedIdentifier { name, span }) => {
            assert_eq!(name, "secret");
            assert_eq!(span.line, 3);
        }
        other => panic!("expected unresolved identifier, got {other:?}"),
    }
}

#[test]
fn test_parameters_do_not_leak_between_subroutines() {
    let result = compile_str(
        "class Main {
            function void f(int step) { return; }
            function int g() { return step; }
        }",
    );

    assert!(matches!(
        result,
        Err(CompileError::UnresolvedIdentifier { ref name, .. }) if name == "step"
    ));
}

#[test]
fn test_method_call_on_parameter_in_expression() {
    assert_code(
        "class Main {
            function int f(Point p, int k) {
                return p.getX() + k;
            }
        }",
        &[
            "function Main.f 0",
            "push argument 0",
            "call Point.getX 1",
            "push argument 1",
            "add",
            "return",
        ],
    );
}

#[test]
fn test_string_constant_too_long() {
    let text = "a".repeat(u16::MAX as usize + 1);
    let source = format!(
        "class Main {{ function void f() {{ do Output.printString(\"{text}\"); return; }} }}"
    );

    assert!(matches!(
        compile_str(&source),
        Err(CompileError::StringTooLong { .. })
    ));
}

#[test]
fn test_unresolved_let_target() {
    assert!(matches!(
        compile_str("class Main { function void f() { let nope = 1; return; } }"),
        Err(CompileError::UnresolvedIdentifier { ref name, .. }) if name == "nope"
    ));
}

#[test]
fn test_syntax_error_reports_token() {
    match compile_str("class Foo { field int; }") {
        Err(err @ CompileError::Syntax { .. }) => {
            assert_eq!(
                err.to_string(),
                "1:22: expected identifier, found symbol ';'"
            );
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_unexpected_end_of_input() {
    assert!(matches!(
        compile_str("class Foo { field int x;"),
        Err(CompileError::EndOfInput { .. })
    ));
}

#[test]
fn test_trailing_tokens_rejected() {
    assert!(matches!(
        compile_str("class A { } class B { }"),
        Err(CompileError::Syntax { .. })
    ));
}

#[test]
fn test_trace_output() {
    let mut ctx = CompileContext::new(CompileConf {
        trace: true,
        ..Default::default()
    });

    let class = compile_class(
        "class Main { function boolean f() { return 1 < 2; } }",
        &mut ctx,
    )
    .unwrap();
    let trace = class.trace.unwrap();

    assert!(trace.starts_with("<class>\n  <keyword> class </keyword>\n  <identifier> Main </identifier>\n"));
    assert!(trace.contains("<symbol> &lt; </symbol>"));
    assert!(trace.contains("<returnStatement>"));
    assert!(trace.ends_with("</class>\n"));

    // Tracing doesn't change the code.
    assert_eq!(
        render(&class.code),
        render(&compile_str("class Main { function boolean f() { return 1 < 2; } }").unwrap())
    );
}

#[test]
fn test_trace_disabled_by_default() {
    let class = compile_class("class Main { }", &mut CompileContext::default()).unwrap();

    assert!(class.trace.is_none());
    assert!(class.code.is_empty());
}
