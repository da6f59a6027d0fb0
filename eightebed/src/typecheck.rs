//! Type resolution and checking.
//!
//! Runs after parsing, before the safety analyzer. Declaration checks come
//! first: only structs may be named, struct fields are `int` or `ptr to` a
//! previously declared (or the same) name, pointers point only at named
//! types. Statement and expression checks then walk the top-level block
//! bottom-up.

use std::collections::HashSet;

use crate::ast::{Block, Expr, Field, Program, Ref, Stmt, Type, TypeEnv, VarEnv};
use crate::error::{CompileError, CompileResult, Pos};

pub fn check(program: &Program) -> CompileResult<()> {
    check_type_decls(&program.types)?;
    check_var_decls(&program.types, &program.vars)?;
    Checker::new(program).check_block(&program.body)
}

fn check_type_decls(types: &TypeEnv) -> CompileResult<()> {
    for (index, (name, def)) in types.iter().enumerate() {
        let Type::Struct(fields) = &def.ty else {
            return Err(CompileError::ty(def.pos, "only structs may be named"));
        };
        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CompileError::name(
                    field.pos,
                    format!("field `{}` already declared in `{name}`", field.name),
                ));
            }
            check_field(types, index, field)?;
        }
    }
    Ok(())
}

/// A field may be `int` or a pointer to a named struct declared at or
/// before `index` (self-reference included). Anything struct-shaped is
/// rejected: named types always resolve to structs, and a struct may not
/// transitively contain another.
fn check_field(types: &TypeEnv, index: usize, field: &Field) -> CompileResult<()> {
    match &field.ty {
        Type::Int => Ok(()),
        Type::Ptr(target) => match target.as_ref() {
            Type::Named(n) => match types.get_index_of(n) {
                Some(i) if i <= index => Ok(()),
                Some(_) => Err(CompileError::name(
                    field.pos,
                    format!("type `{n}` is not declared before use"),
                )),
                None => Err(CompileError::name(
                    field.pos,
                    format!("type `{n}` is not declared"),
                )),
            },
            _ => Err(CompileError::ty(
                field.pos,
                "pointer type must point to a named type",
            )),
        },
        Type::Named(n) => {
            if !types.contains_key(n) {
                return Err(CompileError::name(
                    field.pos,
                    format!("type `{n}` is not declared"),
                ));
            }
            Err(CompileError::ty(
                field.pos,
                "structs may not contain other structs",
            ))
        }
        Type::Struct(_) => Err(CompileError::ty(
            field.pos,
            "structs may not contain other structs",
        )),
    }
}

fn check_var_decls(types: &TypeEnv, vars: &VarEnv) -> CompileResult<()> {
    for def in vars.values() {
        check_var_type(types, &def.ty, def.pos)?;
    }
    Ok(())
}

fn check_var_type(types: &TypeEnv, ty: &Type, pos: Pos) -> CompileResult<()> {
    match ty {
        Type::Int => Ok(()),
        Type::Named(n) => {
            if types.contains_key(n) {
                Ok(())
            } else {
                Err(CompileError::name(
                    pos,
                    format!("type `{n}` is not declared"),
                ))
            }
        }
        Type::Ptr(target) => match target.as_ref() {
            Type::Named(n) if types.contains_key(n) => Ok(()),
            Type::Named(n) => Err(CompileError::name(
                pos,
                format!("type `{n}` is not declared"),
            )),
            _ => Err(CompileError::ty(
                pos,
                "pointer type must point to a named type",
            )),
        },
        Type::Struct(fields) => {
            // Anonymous struct variable: same field rules as a named body.
            // All type names are declared by now, so ordering is moot.
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(CompileError::name(
                        field.pos,
                        format!("field `{}` already declared", field.name),
                    ));
                }
                check_field(types, types.len(), field)?;
            }
            Ok(())
        }
    }
}

/// Nominal equality on named types, structural on `int` and pointers.
/// Struct types are never equivalent, not even to themselves, so whole
/// structs cannot be assigned.
pub fn equiv(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Int, Type::Int) => true,
        (Type::Named(x), Type::Named(y)) => x == y,
        (Type::Ptr(x), Type::Ptr(y)) => equiv(x, y),
        _ => false,
    }
}

/// Read-only view over the environments, answering type queries for the
/// checker itself and for the emitter (which needs referent types to pick
/// runtime helpers).
pub struct Checker<'a> {
    types: &'a TypeEnv,
    vars: &'a VarEnv,
}

impl<'a> Checker<'a> {
    pub fn new(program: &'a Program) -> Self {
        Checker {
            types: &program.types,
            vars: &program.vars,
        }
    }

    fn resolve<'t>(&'t self, ty: &'t Type, pos: Pos) -> CompileResult<&'t Type> {
        match ty {
            Type::Named(n) => match self.types.get(n) {
                Some(def) => Ok(&def.ty),
                None => Err(CompileError::name(
                    pos,
                    format!("type `{n}` is not declared"),
                )),
            },
            other => Ok(other),
        }
    }

    pub fn ref_type(&self, r: &Ref) -> CompileResult<Type> {
        match r {
            Ref::Name { name, pos } => match self.vars.get(name) {
                Some(def) => Ok(def.ty.clone()),
                None => Err(CompileError::name(
                    *pos,
                    format!("variable `{name}` is not declared"),
                )),
            },
            Ref::Deref { inner, pos } => {
                let inner_ty = self.ref_type(inner)?;
                match inner_ty {
                    Type::Ptr(target) => Ok(self.resolve(&target, *pos)?.clone()),
                    other => Err(CompileError::ty(
                        *pos,
                        format!("cannot dereference non-pointer type `{other}`"),
                    )),
                }
            }
            Ref::Field { base, field, pos } => {
                let base_ty = self.ref_type(base)?;
                match self.resolve(&base_ty, *pos)? {
                    Type::Struct(fields) => fields
                        .iter()
                        .find(|f| f.name == *field)
                        .map(|f| f.ty.clone())
                        .ok_or_else(|| {
                            CompileError::ty(*pos, format!("no field `{field}` in `{base_ty}`"))
                        }),
                    _ => Err(CompileError::ty(
                        *pos,
                        format!("field access on non-struct type `{base_ty}`"),
                    )),
                }
            }
        }
    }

    pub fn expr_type(&self, e: &Expr) -> CompileResult<Type> {
        match e {
            Expr::IntLit { .. } => Ok(Type::Int),
            Expr::Malloc { type_name, pos } => match self.types.get(type_name) {
                Some(def) if matches!(def.ty, Type::Struct(_)) => {
                    Ok(Type::Ptr(Box::new(Type::Named(type_name.clone()))))
                }
                Some(_) => Err(CompileError::ty(
                    *pos,
                    format!("`{type_name}` does not name a struct"),
                )),
                None => Err(CompileError::name(
                    *pos,
                    format!("type `{type_name}` is not declared"),
                )),
            },
            Expr::Valid { arg, pos } => match self.expr_type(arg)? {
                Type::Ptr(_) => Ok(Type::Int),
                other => Err(CompileError::ty(
                    *pos,
                    format!("`valid` needs a pointer, got `{other}`"),
                )),
            },
            Expr::BinOp { lhs, rhs, .. } => {
                self.expect_int(lhs)?;
                self.expect_int(rhs)?;
                Ok(Type::Int)
            }
            Expr::Ref(r) => self.ref_type(r),
        }
    }

    fn expect_int(&self, e: &Expr) -> CompileResult<()> {
        let ty = self.expr_type(e)?;
        if equiv(&ty, &Type::Int) {
            Ok(())
        } else {
            Err(CompileError::ty(
                e.pos(),
                format!("expected an int, got `{ty}`"),
            ))
        }
    }

    pub fn check_block(&self, block: &Block) -> CompileResult<()> {
        for stmt in &block.stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::While { cond, body, .. } => {
                self.expect_int(cond)?;
                self.check_block(body)
            }
            Stmt::If {
                cond,
                then_blk,
                else_blk,
                ..
            } => {
                self.expect_int(cond)?;
                self.check_block(then_blk)?;
                if let Some(else_blk) = else_blk {
                    self.check_block(else_blk)?;
                }
                Ok(())
            }
            Stmt::Free { target, pos } => match self.ref_type(target)? {
                Type::Ptr(_) => Ok(()),
                other => Err(CompileError::ty(
                    *pos,
                    format!("cannot free non-pointer type `{other}`"),
                )),
            },
            Stmt::Print { value, .. } => self.expect_int(value),
            Stmt::Assign { target, value, pos } => {
                let lhs = self.ref_type(target)?;
                let rhs = self.expr_type(value)?;
                if equiv(&lhs, &rhs) {
                    Ok(())
                } else {
                    Err(CompileError::ty(
                        *pos,
                        format!("cannot assign `{rhs}` to `{lhs}`"),
                    ))
                }
            }
        }
    }
}
