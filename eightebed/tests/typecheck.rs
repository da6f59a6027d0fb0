use eightebed::{parser, typecheck};

fn check(source: &str) -> Result<(), eightebed::CompileError> {
    let program = parser::parse(source).expect("source should parse");
    typecheck::check(&program)
}

fn rejects(source: &str, kind: &str, fragment: &str) {
    let err = check(source).expect_err("should be rejected");
    assert_eq!(err.kind(), kind, "wrong kind: {err}");
    assert!(
        err.to_string().contains(fragment),
        "expected `{fragment}` in: {err}"
    );
}

#[test]
fn accepts_allocate_guard_print_free() {
    check(
        r#"
type node struct { int value; ptr to node next; };
var ptr to node jim;
{ jim = malloc node;
  if valid jim { [@jim].value = (1 + 4); print [@jim].value; }
  free jim; }
"#,
    )
    .expect("should typecheck");
}

#[test]
fn self_referential_struct_is_fine() {
    check("type node struct { ptr to node next; }; { }").expect("should typecheck");
}

#[test]
fn pointer_must_target_a_named_type() {
    rejects(
        "var ptr to int kelly; { }",
        "type",
        "pointer type must point to a named type",
    );
    rejects(
        "type node struct { int v; ptr to ptr to node next; }; { }",
        "type",
        "pointer type must point to a named type",
    );
}

#[test]
fn only_structs_may_be_named() {
    rejects("type kooba int; { }", "type", "only structs may be named");
}

#[test]
fn structs_may_not_contain_structs() {
    rejects(
        "type kooba struct { int value; struct { int whirlygig; } barnard; }; { }",
        "type",
        "structs may not contain other structs",
    );
    // A named field always resolves to a struct, so it is just as illegal.
    rejects(
        "type a struct { int x; }; type b struct { a inner; }; { }",
        "type",
        "structs may not contain other structs",
    );
}

#[test]
fn forward_references_between_types_are_rejected() {
    rejects(
        "type a struct { ptr to b next; }; type b struct { int x; }; { }",
        "name",
        "not declared before use",
    );
}

#[test]
fn unknown_names_are_name_errors() {
    rejects("{ jim = 4; }", "name", "variable `jim` is not declared");
    rejects("var ptr to node jim; { }", "name", "type `node` is not declared");
    rejects(
        "var int x; { x = malloc node; }",
        "name",
        "type `node` is not declared",
    );
}

#[test]
fn field_access_requires_a_struct_and_the_field() {
    rejects(
        "var int x; { [x].value = 1; }",
        "type",
        "field access on non-struct",
    );
    rejects(
        "type node struct { int value; }; var node jim; { [jim].nope = 1; }",
        "type",
        "no field `nope`",
    );
}

#[test]
fn assignment_requires_equivalent_types() {
    rejects(
        "type node struct { int v; }; var int x; { x = malloc node; }",
        "type",
        "cannot assign",
    );
    // Struct types are never equivalent, not even to themselves.
    rejects(
        "type node struct { int v; }; var node a; var node b; { a = b; }",
        "type",
        "cannot assign",
    );
}

#[test]
fn pointer_assignment_between_same_named_targets_is_fine() {
    check(
        "type node struct { int v; }; var ptr to node a; var ptr to node b; { a = b; }",
    )
    .expect("should typecheck");
}

#[test]
fn conditions_operands_and_print_require_ints() {
    rejects(
        "type node struct { int v; }; var ptr to node p; { if p { } }",
        "type",
        "expected an int",
    );
    rejects(
        "type node struct { int v; }; var ptr to node p; var int x; { x = (p + 1); }",
        "type",
        "expected an int",
    );
    rejects(
        "type node struct { int v; }; var ptr to node p; { print p; }",
        "type",
        "expected an int",
    );
}

#[test]
fn valid_and_free_require_pointers() {
    rejects("var int x; { x = valid x; }", "type", "`valid` needs a pointer");
    rejects("var int x; { free x; }", "type", "cannot free non-pointer");
}

#[test]
fn dereference_requires_a_pointer() {
    rejects(
        "var int x; var int y; { y = @x; }",
        "type",
        "cannot dereference non-pointer",
    );
}

#[test]
fn anonymous_struct_variables_check_like_named_bodies() {
    check(
        "type node struct { int v; }; var struct { int x; ptr to node p; } s; { [s].x = 1; }",
    )
    .expect("should typecheck");
    rejects(
        "type node struct { int v; }; var struct { node inner; } s; { }",
        "type",
        "structs may not contain other structs",
    );
}
