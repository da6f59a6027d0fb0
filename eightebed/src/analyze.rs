//! The pointer-safety analyzer.
//!
//! A dereference `@v` is permitted only inside the *safe start* of a
//! *guarded region* for `v`: the then-branch of an `if valid v` whose test
//! is exactly `valid` applied to the bare variable name, up to (not
//! including) the first assignment or `free` in that branch. The walk
//! carries the set of currently guarded names and enforces the rule at
//! every dereference.

use std::collections::HashSet;

use crate::ast::{Block, Expr, Program, Ref, Stmt};
use crate::error::{CompileError, CompileResult};

pub fn analyze(program: &Program) -> CompileResult<()> {
    let mut guarded = HashSet::new();
    walk_block(&program.body, &mut guarded)
}

fn walk_block(block: &Block, guarded: &mut HashSet<String>) -> CompileResult<()> {
    for stmt in &block.stmts {
        match stmt {
            // Assignment and free both end the safe start: whatever was
            // known valid at block entry may no longer be. The statement's
            // own sub-expressions are still inside the safe area.
            Stmt::Assign { target, value, .. } => {
                walk_ref(target, guarded)?;
                walk_expr(value, guarded)?;
                guarded.clear();
            }
            Stmt::Free { target, .. } => {
                walk_ref(target, guarded)?;
                guarded.clear();
            }
            Stmt::Print { value, .. } => walk_expr(value, guarded)?,
            // Loop back-edges discard every guarantee: the condition and
            // body re-run after arbitrary mutation, so both are walked
            // with no guards at all. A `valid` test in a while condition
            // establishes nothing. The body may also assign or free on
            // any iteration, so the loop ends the enclosing safe start
            // just like a bare assignment or free would.
            Stmt::While { cond, body, .. } => {
                let mut inside = HashSet::new();
                walk_expr(cond, &inside)?;
                walk_block(body, &mut inside)?;
                guarded.clear();
            }
            // The branches see their own copies of the guard set; the
            // statement itself is transparent to the enclosing safe start.
            Stmt::If {
                cond,
                then_blk,
                else_blk,
                ..
            } => {
                walk_expr(cond, guarded)?;
                let mut then_guarded = guarded.clone();
                if let Some(v) = guard_subject(cond) {
                    then_guarded.insert(v.to_owned());
                }
                walk_block(then_blk, &mut then_guarded)?;
                if let Some(else_blk) = else_blk {
                    let mut else_guarded = guarded.clone();
                    walk_block(else_blk, &mut else_guarded)?;
                }
            }
        }
    }
    Ok(())
}

/// `if valid v { ... }` guards `v` — only when the test is `valid` applied
/// to a bare variable name, not a compound reference.
fn guard_subject(cond: &Expr) -> Option<&str> {
    match cond {
        Expr::Valid { arg, .. } => match arg.as_ref() {
            Expr::Ref(Ref::Name { name, .. }) => Some(name),
            _ => None,
        },
        _ => None,
    }
}

fn walk_expr(expr: &Expr, guarded: &HashSet<String>) -> CompileResult<()> {
    match expr {
        Expr::BinOp { lhs, rhs, .. } => {
            walk_expr(lhs, guarded)?;
            walk_expr(rhs, guarded)
        }
        Expr::Valid { arg, .. } => walk_expr(arg, guarded),
        Expr::Malloc { .. } | Expr::IntLit { .. } => Ok(()),
        Expr::Ref(r) => walk_ref(r, guarded),
    }
}

fn walk_ref(r: &Ref, guarded: &HashSet<String>) -> CompileResult<()> {
    match r {
        Ref::Name { .. } => Ok(()),
        Ref::Field { base, .. } => walk_ref(base, guarded),
        Ref::Deref { inner, pos } => match inner.as_ref() {
            Ref::Name { name, .. } if guarded.contains(name) => Ok(()),
            Ref::Name { name, .. } => Err(CompileError::safety(
                *pos,
                format!("dereference of possibly-invalid pointer `{name}`"),
            )),
            _ => Err(CompileError::safety(
                *pos,
                "complex pointer dereference not supported",
            )),
        },
    }
}
