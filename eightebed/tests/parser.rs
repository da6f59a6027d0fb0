use eightebed::ast::{BinOp, Expr, Ref, Stmt};
use eightebed::lexer::{self, Tok};
use eightebed::parser;

const SCENARIO_A: &str = r#"
type node struct { int value; ptr to node next; };
var ptr to node jim;
{ jim = malloc node;
  if valid jim { [@jim].value = (1 + 4); print [@jim].value; }
  free jim; }
"#;

#[test]
fn keywords_win_over_identifiers() {
    let toks = lexer::lex("ptr ptrdiff to together").expect("lexes");
    let kinds: Vec<&Tok> = toks.iter().map(|(tok, _)| tok).collect();
    assert!(matches!(kinds[0], Tok::Ptr));
    assert!(matches!(kinds[1], Tok::Ident(name) if name == "ptrdiff"));
    assert!(matches!(kinds[2], Tok::To));
    assert!(matches!(kinds[3], Tok::Ident(name) if name == "together"));
}

#[test]
fn lexer_tracks_positions() {
    let toks = lexer::lex("var int\n  jim;").expect("lexes");
    let (_, pos) = &toks[2];
    assert_eq!((pos.line, pos.col), (2, 3));
}

#[test]
fn unknown_character_is_a_lex_error() {
    let err = lexer::lex("var $ jim;").expect_err("should fail");
    assert_eq!(err.kind(), "lex");
    let pos = err.position().expect("lex errors carry positions");
    assert_eq!((pos.line, pos.col), (1, 5));
}

#[test]
fn parses_allocate_guard_print_free() {
    let program = parser::parse(SCENARIO_A).expect("parses");
    assert_eq!(program.types.len(), 1);
    assert!(program.types.contains_key("node"));
    assert_eq!(program.vars.len(), 1);
    match program.body.stmts.as_slice() {
        [Stmt::Assign { value: Expr::Malloc { type_name, .. }, .. }, Stmt::If { cond: Expr::Valid { .. }, then_blk, else_blk: None, .. }, Stmt::Free { .. }] =>
        {
            assert_eq!(type_name, "node");
            assert_eq!(then_blk.stmts.len(), 2);
        }
        other => panic!("unexpected program shape: {other:?}"),
    }
}

#[test]
fn field_access_through_deref() {
    let program = parser::parse("var int x; { x = [@jim].value; }").expect("parses");
    match program.body.stmts.as_slice() {
        [Stmt::Assign { value: Expr::Ref(Ref::Field { base, field, .. }), .. }] => {
            assert_eq!(field, "value");
            assert!(matches!(
                base.as_ref(),
                Ref::Deref { inner, .. } if matches!(inner.as_ref(), Ref::Name { name, .. } if name == "jim")
            ));
        }
        other => panic!("unexpected program shape: {other:?}"),
    }
}

#[test]
fn equality_in_expressions_assignment_in_statements() {
    let program = parser::parse("var int a; var int b; { a = (a = b); }").expect("parses");
    match program.body.stmts.as_slice() {
        [Stmt::Assign { value: Expr::BinOp { op: BinOp::Eq, .. }, .. }] => {}
        other => panic!("unexpected program shape: {other:?}"),
    }
}

#[test]
fn operators_require_parentheses() {
    let err = parser::parse("var int a; { a = 1 + 2; }").expect_err("should fail");
    assert_eq!(err.kind(), "parse");
}

#[test]
fn first_unexpected_token_aborts_with_expected_and_found() {
    let err = parser::parse("var int x { }").expect_err("should fail");
    let message = err.to_string();
    assert!(message.contains("expected `;`"), "got: {message}");
    assert!(message.contains("got `{`"), "got: {message}");
    assert_eq!(err.position().map(|p| (p.line, p.col)), Some((1, 11)));
}

#[test]
fn duplicate_variable_is_a_name_error() {
    let err = parser::parse("var int jim; var int jim; { }").expect_err("should fail");
    assert_eq!(err.kind(), "name");
    assert!(err.to_string().contains("already declared"));
}

fn roundtrip(source: &str) {
    let first = parser::parse(source).expect("source should parse");
    let printed = first.to_string();
    let second = parser::parse(&printed)
        .unwrap_or_else(|err| panic!("pretty-printed program failed to reparse: {err}\n{printed}"));
    assert_eq!(printed, second.to_string(), "printing is not a fixpoint");
}

#[test]
fn pretty_printed_programs_reparse_identically() {
    roundtrip(SCENARIO_A);
    roundtrip("{ }");
    roundtrip("var struct { int x; ptr to node p; } s; { [s].x = 1; }");
    for case in eightebed::suite::CASES {
        if parser::parse(case.source).is_ok() {
            roundtrip(case.source);
        }
    }
}
