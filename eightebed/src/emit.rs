//! C code generation.
//!
//! Emits a single freestanding translation unit: the fixed runtime
//! preamble, one `struct` and one tagged-pointer typedef per named type,
//! allocation/free/marking helpers, the global variables, the root-set
//! table the invalidation traversal starts from, and `main` holding the
//! translated top-level block.
//!
//! Emission is deterministic: the same AST always yields byte-identical
//! output. The unit includes only `<stdio.h>` and `<stdlib.h>`; fresh
//! blocks are zeroed with `calloc`.
//!
//! Every generated helper name starts with `_eb_`, which no Eightebed
//! identifier can (identifiers start with a letter), so generated names
//! never collide with user names.

use crate::ast::{Block, Expr, Field, Program, Ref, Stmt, Type};
use crate::error::{CompileError, CompileResult, Pos};
use crate::typecheck::Checker;

/// Render `program` to C. The program must already have passed type
/// checking and safety analysis.
pub fn emit(program: &Program) -> CompileResult<String> {
    Emitter::new(program).emit()
}

const PREAMBLE: &str = r#"/* Generated by ebedc -- do not edit. */
#include <stdio.h>
#include <stdlib.h>

/* Invalidation traversal bookkeeping: addresses of tagged-pointer slots
   already visited, so cyclic heaps terminate. */
static void **_eb_seen = NULL;
static size_t _eb_seen_len = 0;
static size_t _eb_seen_cap = 0;

static int _eb_seen_has(void *slot) {
    size_t i;
    for (i = 0; i < _eb_seen_len; i++) {
        if (_eb_seen[i] == slot) {
            return 1;
        }
    }
    return 0;
}

static void _eb_seen_push(void *slot) {
    if (_eb_seen_len == _eb_seen_cap) {
        size_t cap = _eb_seen_cap ? _eb_seen_cap * 2 : 16;
        void **grown = (void **)realloc(_eb_seen, cap * sizeof(void *));
        if (grown == NULL) {
            fprintf(stderr, "eightebed runtime: out of memory\n");
            abort();
        }
        _eb_seen = grown;
        _eb_seen_cap = cap;
    }
    _eb_seen[_eb_seen_len] = slot;
    _eb_seen_len++;
}

static void _eb_invalidate_aliases_of(void *target);
"#;

struct Emitter<'a> {
    program: &'a Program,
    checker: Checker<'a>,
    out: String,
}

/// The struct name behind `ptr to <name>`, when the type has that shape.
fn ptr_referent(ty: &Type) -> Option<&str> {
    match ty {
        Type::Ptr(target) => match target.as_ref() {
            Type::Named(n) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

impl<'a> Emitter<'a> {
    fn new(program: &'a Program) -> Self {
        Emitter {
            program,
            checker: Checker::new(program),
            out: String::new(),
        }
    }

    fn emit(mut self) -> CompileResult<String> {
        self.out.push_str(PREAMBLE);
        self.struct_types()?;
        self.helpers();
        self.globals()?;
        self.root_table()?;
        self.main_fn()?;
        Ok(self.out)
    }

    /// Forward declarations and tagged-pointer typedefs first, then every
    /// struct body. With all typedefs up front, bodies may point at any
    /// named type, including themselves.
    fn struct_types(&mut self) -> CompileResult<()> {
        let program = self.program;
        for name in program.types.keys() {
            self.out.push_str(&format!(
                "\nstruct {name};\ntypedef struct {{ struct {name} *raw; int valid; }} _eb_ptr_{name};\n"
            ));
        }
        for (name, def) in &program.types {
            let Type::Struct(fields) = &def.ty else {
                continue;
            };
            self.out.push_str(&format!("\nstruct {name} {{\n"));
            for field in fields {
                let line = field_decl(&field.ty, &field.name, field.pos)?;
                self.out.push_str(&format!("    {line}\n"));
            }
            self.out.push_str("};\n");
        }
        Ok(())
    }

    /// Per named type: the allocation wrapper, the free protocol, and the
    /// marking step of the alias-invalidation traversal. Marking is
    /// mutually recursive across types, hence the prototype pass.
    fn helpers(&mut self) {
        let program = self.program;
        for name in program.types.keys() {
            self.out.push_str(&format!(
                "\nstatic void _eb_mark_{name}(void *target, _eb_ptr_{name} *slot);\n"
            ));
        }
        for (name, def) in &program.types {
            self.out.push_str(&format!(
                r#"
static _eb_ptr_{name} _eb_make_{name}(void) {{
    _eb_ptr_{name} p;
    p.raw = (struct {name} *)calloc(1, sizeof(struct {name}));
    p.valid = (p.raw != NULL);
    return p;
}}

static void _eb_free_{name}(_eb_ptr_{name} *p) {{
    void *raw;
    if (!p->valid) {{
        return;
    }}
    raw = (void *)p->raw;
    _eb_invalidate_aliases_of(raw);
    free(raw);
    p->valid = 0;
}}

static void _eb_mark_{name}(void *target, _eb_ptr_{name} *slot) {{
    if (_eb_seen_has((void *)slot)) {{
        return;
    }}
    _eb_seen_push((void *)slot);
    if ((void *)slot->raw == target) {{
        slot->valid = 0;
        return;
    }}
    if (!slot->valid) {{
        return;
    }}
"#
            ));
            if let Type::Struct(fields) = &def.ty {
                for field in fields {
                    if let Some(m) = ptr_referent(&field.ty) {
                        self.out.push_str(&format!(
                            "    _eb_mark_{m}(target, &slot->raw->{});\n",
                            field.name
                        ));
                    }
                }
            }
            self.out.push_str("}\n");
        }
    }

    fn globals(&mut self) -> CompileResult<()> {
        let program = self.program;
        if !program.vars.is_empty() {
            self.out.push('\n');
        }
        for (name, def) in &program.vars {
            match &def.ty {
                Type::Int => self.out.push_str(&format!("int {name};\n")),
                Type::Named(n) => self.out.push_str(&format!("struct {n} {name};\n")),
                Type::Struct(fields) => {
                    self.out.push_str("struct {\n");
                    for field in fields {
                        let line = field_decl(&field.ty, &field.name, field.pos)?;
                        self.out.push_str(&format!("    {line}\n"));
                    }
                    self.out.push_str(&format!("}} {name};\n"));
                }
                other => match ptr_referent(other) {
                    Some(n) => self.out.push_str(&format!("_eb_ptr_{n} {name};\n")),
                    None => {
                        return Err(CompileError::ty(
                            def.pos,
                            format!("cannot lower variable type `{other}`"),
                        ))
                    }
                },
            }
        }
        Ok(())
    }

    /// Every global tagged-pointer slot, including pointer fields of
    /// struct-typed globals, tagged with its referent's type index. The
    /// `{NULL, -1}` sentinel terminates the table even when it is empty.
    fn root_table(&mut self) -> CompileResult<()> {
        let program = self.program;
        let roots = self.root_entries()?;
        self.out
            .push_str("\ntypedef struct { void *slot; int type; } _eb_root;\n");
        self.out.push_str("\nstatic _eb_root _eb_roots[] = {\n");
        for (lvalue, type_index) in &roots {
            self.out
                .push_str(&format!("    {{ (void *)&{lvalue}, {type_index} }},\n"));
        }
        self.out.push_str("    { NULL, -1 }\n};\n");

        self.out.push_str(
            "\nstatic void _eb_invalidate_aliases_of(void *target) {\n    size_t i;\n    _eb_seen_len = 0;\n    for (i = 0; _eb_roots[i].slot != NULL; i++) {\n        switch (_eb_roots[i].type) {\n",
        );
        for (index, name) in program.types.keys().enumerate() {
            self.out.push_str(&format!(
                "        case {index}:\n            _eb_mark_{name}(target, (_eb_ptr_{name} *)_eb_roots[i].slot);\n            break;\n"
            ));
        }
        self.out
            .push_str("        default:\n            break;\n        }\n    }\n}\n");
        Ok(())
    }

    fn root_entries(&self) -> CompileResult<Vec<(String, usize)>> {
        let mut roots = Vec::new();
        for (name, def) in &self.program.vars {
            match &def.ty {
                Type::Ptr(_) => {
                    if let Some(n) = ptr_referent(&def.ty) {
                        roots.push((name.clone(), self.type_index(n, def.pos)?));
                    }
                }
                Type::Named(n) => {
                    if let Some(type_def) = self.program.types.get(n) {
                        if let Type::Struct(fields) = &type_def.ty {
                            self.push_field_roots(name, fields, &mut roots)?;
                        }
                    }
                }
                Type::Struct(fields) => {
                    self.push_field_roots(name, fields, &mut roots)?;
                }
                Type::Int => {}
            }
        }
        Ok(roots)
    }

    fn push_field_roots(
        &self,
        var: &str,
        fields: &[Field],
        roots: &mut Vec<(String, usize)>,
    ) -> CompileResult<()> {
        for field in fields {
            if let Some(m) = ptr_referent(&field.ty) {
                roots.push((
                    format!("{var}.{}", field.name),
                    self.type_index(m, field.pos)?,
                ));
            }
        }
        Ok(())
    }

    fn type_index(&self, name: &str, pos: Pos) -> CompileResult<usize> {
        self.program
            .types
            .get_index_of(name)
            .ok_or_else(|| CompileError::name(pos, format!("type `{name}` is not declared")))
    }

    fn main_fn(&mut self) -> CompileResult<()> {
        let program = self.program;
        self.out.push_str("\nint main(void) {\n");
        self.block(&program.body, 1)?;
        self.out.push_str("    return 0;\n}\n");
        Ok(())
    }

    fn block(&mut self, block: &Block, depth: usize) -> CompileResult<()> {
        for stmt in &block.stmts {
            self.stmt(stmt, depth)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) -> CompileResult<()> {
        let pad = "    ".repeat(depth);
        match stmt {
            Stmt::Assign { target, value, .. } => {
                self.out
                    .push_str(&format!("{pad}{} = {};\n", ref_c(target), expr_c(value)));
            }
            Stmt::Print { value, .. } => {
                self.out
                    .push_str(&format!("{pad}printf(\"%d \", {});\n", expr_c(value)));
            }
            Stmt::Free { target, pos } => {
                let ty = self.checker.ref_type(target)?;
                let referent = match ptr_referent(&ty) {
                    Some(n) => n.to_owned(),
                    None => {
                        return Err(CompileError::ty(
                            *pos,
                            format!("cannot free non-pointer type `{ty}`"),
                        ))
                    }
                };
                self.out
                    .push_str(&format!("{pad}_eb_free_{referent}(&{});\n", ref_c(target)));
            }
            Stmt::If {
                cond,
                then_blk,
                else_blk,
                ..
            } => {
                self.out.push_str(&format!("{pad}if ({}) {{\n", expr_c(cond)));
                self.block(then_blk, depth + 1)?;
                if let Some(else_blk) = else_blk {
                    self.out.push_str(&format!("{pad}}} else {{\n"));
                    self.block(else_blk, depth + 1)?;
                }
                self.out.push_str(&format!("{pad}}}\n"));
            }
            Stmt::While { cond, body, .. } => {
                self.out
                    .push_str(&format!("{pad}while ({}) {{\n", expr_c(cond)));
                self.block(body, depth + 1)?;
                self.out.push_str(&format!("{pad}}}\n"));
            }
        }
        Ok(())
    }
}

fn field_decl(ty: &Type, name: &str, pos: Pos) -> CompileResult<String> {
    match ty {
        Type::Int => Ok(format!("int {name};")),
        _ => match ptr_referent(ty) {
            Some(n) => Ok(format!("_eb_ptr_{n} {name};")),
            None => Err(CompileError::ty(
                pos,
                format!("cannot lower field type `{ty}`"),
            )),
        },
    }
}

fn expr_c(e: &Expr) -> String {
    match e {
        Expr::IntLit { value, .. } => value.to_string(),
        Expr::Malloc { type_name, .. } => format!("_eb_make_{type_name}()"),
        Expr::Valid { arg, .. } => format!("({}).valid", expr_c(arg)),
        Expr::BinOp { op, lhs, rhs, .. } => {
            format!("({} {} {})", expr_c(lhs), op.c_symbol(), expr_c(rhs))
        }
        Expr::Ref(r) => ref_c(r),
    }
}

fn ref_c(r: &Ref) -> String {
    match r {
        Ref::Name { name, .. } => name.clone(),
        Ref::Deref { inner, .. } => format!("(*{}.raw)", ref_c(inner)),
        Ref::Field { base, field, .. } => format!("{}.{field}", ref_c(base)),
    }
}
