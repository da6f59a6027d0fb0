use eightebed::driver;

fn compile(source: &str) -> String {
    driver::compile_to_c(source).expect("source should compile")
}

const SCENARIO_A: &str = r#"
type node struct { int value; ptr to node next; };
var ptr to node jim;
{ jim = malloc node;
  if valid jim { [@jim].value = (1 + 4); print [@jim].value; }
  free jim; }
"#;

const SCENARIO_C: &str = r#"
type node struct { int v; ptr to node next; };
var ptr to node a; var ptr to node b;
{ a = malloc node;
  if valid a { b = a; }
  free a;
  if valid b { print [@b].v; } else { print 0; } }
"#;

#[test]
fn emission_is_deterministic() {
    assert_eq!(compile(SCENARIO_A), compile(SCENARIO_A));
    assert_eq!(compile(SCENARIO_C), compile(SCENARIO_C));
}

#[test]
fn unit_includes_only_stdio_and_stdlib() {
    let c = compile(SCENARIO_A);
    assert!(c.contains("#include <stdio.h>"));
    assert!(c.contains("#include <stdlib.h>"));
    assert_eq!(c.matches("#include").count(), 2);
}

#[test]
fn structs_and_tagged_pointers_are_generated_per_named_type() {
    let c = compile(SCENARIO_A);
    assert!(c.contains("struct node;"));
    assert!(c.contains("typedef struct { struct node *raw; int valid; } _eb_ptr_node;"));
    assert!(c.contains("struct node {\n    int value;\n    _eb_ptr_node next;\n};"));
    assert!(c.contains("_eb_ptr_node jim;"));
}

#[test]
fn statements_lower_to_the_runtime_protocol() {
    let c = compile(SCENARIO_A);
    assert!(c.contains("jim = _eb_make_node();"));
    assert!(c.contains("if ((jim).valid) {"));
    assert!(c.contains("(*jim.raw).value = (1 + 4);"));
    assert!(c.contains("printf(\"%d \", (*jim.raw).value);"));
    assert!(c.contains("_eb_free_node(&jim);"));
    assert!(c.contains("int main(void) {"));
    assert!(c.contains("return 0;"));
}

#[test]
fn allocation_wrapper_zeroes_and_tags() {
    let c = compile(SCENARIO_A);
    assert!(c.contains("p.raw = (struct node *)calloc(1, sizeof(struct node));"));
    assert!(c.contains("p.valid = (p.raw != NULL);"));
}

#[test]
fn free_invalidates_aliases_before_releasing() {
    let c = compile(SCENARIO_A);
    let invalidate = c
        .find("_eb_invalidate_aliases_of(raw);")
        .expect("free calls the invalidator");
    let release = c.find("free(raw);").expect("free releases the block");
    assert!(invalidate < release, "aliases must be cleared before free()");
    assert!(c.contains("if (!p->valid) {\n        return;\n    }"));
}

#[test]
fn marking_follows_pointer_fields_with_a_visited_set() {
    let c = compile(SCENARIO_A);
    assert!(c.contains("static void _eb_mark_node(void *target, _eb_ptr_node *slot)"));
    assert!(c.contains("if (_eb_seen_has((void *)slot)) {"));
    assert!(c.contains("_eb_seen_push((void *)slot);"));
    assert!(c.contains("_eb_mark_node(target, &slot->raw->next);"));
}

#[test]
fn every_global_pointer_is_a_root() {
    let c = compile(SCENARIO_C);
    assert!(c.contains("{ (void *)&a, 0 },"));
    assert!(c.contains("{ (void *)&b, 0 },"));
    assert!(c.contains("{ NULL, -1 }"));
}

#[test]
fn pointer_fields_of_struct_globals_are_roots_too() {
    let c = compile(
        "type node struct { int v; ptr to node next; };\nvar node jim;\n{ [jim].v = 1; }",
    );
    assert!(c.contains("struct node jim;"));
    assert!(c.contains("{ (void *)&jim.next, 0 },"));
}

#[test]
fn equality_and_connectives_lower_to_c_forms() {
    let c = compile("var int x; { if ((x = 1) & (1 | 0)) { x = (x - 1); } }");
    assert!(c.contains("if (((x == 1) && (1 || 0))) {"));
    assert!(c.contains("x = (x - 1);"));
}

#[test]
fn while_loops_and_else_branches_emit() {
    let c = compile("var int i; { i = 5; while i { print i; i = (i - 1); } if i { print 1; } else { print 0; } }");
    assert!(c.contains("while (i) {"));
    assert!(c.contains("} else {"));
}

#[test]
fn programs_without_pointers_still_get_a_terminated_root_table() {
    let c = compile("var int x; { x = 4; }");
    assert!(c.contains("static _eb_root _eb_roots[] = {\n    { NULL, -1 }\n};"));
    assert!(c.contains("default:"));
}
