//! Abstract syntax for Eightebed programs.
//!
//! All nodes are built by the parser and immutable afterwards; later phases
//! only read them. `Display` renders a node back to surface syntax, and a
//! rendered program parses to the same tree (modulo positions).

use std::fmt;

use indexmap::IndexMap;

use crate::error::Pos;

/// Named type declarations, in declaration order. Names are unique and a
/// declaration may reference only earlier names (or itself, through `ptr`).
pub type TypeEnv = IndexMap<String, TypeDef>;

/// Global variable declarations, in declaration order. Names are unique
/// program-wide; Eightebed has no block scoping.
pub type VarEnv = IndexMap<String, VarDef>;

/// Body of a `type <name> <type>;` declaration.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub ty: Type,
    pub pos: Pos,
}

/// Body of a `var <type> <name>;` declaration.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub ty: Type,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Struct(Vec<Field>),
    /// By language rule the referent is always a `Named` resolving to a
    /// struct; the parser stays general and the checker enforces it.
    Ptr(Box<Type>),
    Named(String),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub types: TypeEnv,
    pub vars: VarEnv,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    While {
        cond: Expr,
        body: Block,
        pos: Pos,
    },
    If {
        cond: Expr,
        then_blk: Block,
        else_blk: Option<Block>,
        pos: Pos,
    },
    Free {
        target: Ref,
        pos: Pos,
    },
    Print {
        value: Expr,
        pos: Pos,
    },
    Assign {
        target: Ref,
        value: Expr,
        pos: Pos,
    },
}

/// A place: a variable, a dereference (`@ref`), or a field access
/// (`[ref].name`).
#[derive(Debug, Clone)]
pub enum Ref {
    Name { name: String, pos: Pos },
    Deref { inner: Box<Ref>, pos: Pos },
    Field { base: Box<Ref>, field: String, pos: Pos },
}

impl Ref {
    pub fn pos(&self) -> Pos {
        match self {
            Ref::Name { pos, .. } | Ref::Deref { pos, .. } | Ref::Field { pos, .. } => *pos,
        }
    }
}

/// The eight fully-parenthesized binary operators. `=` compares in
/// expression position; assignment is a statement form, not an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Gt,
    And,
    Or,
}

impl BinOp {
    /// Surface spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Gt => ">",
            BinOp::And => "&",
            BinOp::Or => "|",
        }
    }

    /// C spelling. `=` becomes `==`, and the connectives are logical on
    /// zero/nonzero, so they lower to `&&` and `||`.
    pub fn c_symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::And => "&&",
            BinOp::Or => "||",
            other => other.symbol(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        pos: Pos,
    },
    Malloc {
        type_name: String,
        pos: Pos,
    },
    Valid {
        arg: Box<Expr>,
        pos: Pos,
    },
    IntLit {
        value: i64,
        pos: Pos,
    },
    Ref(Ref),
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::BinOp { pos, .. }
            | Expr::Malloc { pos, .. }
            | Expr::Valid { pos, .. }
            | Expr::IntLit { pos, .. } => *pos,
            Expr::Ref(r) => r.pos(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Named(name) => f.write_str(name),
            Type::Ptr(target) => write!(f, "ptr to {target}"),
            Type::Struct(fields) => {
                f.write_str("struct {")?;
                for field in fields {
                    write!(f, " {} {};", field.ty, field.name)?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Name { name, .. } => f.write_str(name),
            Ref::Deref { inner, .. } => write!(f, "@{inner}"),
            Ref::Field { base, field, .. } => write!(f, "[{base}].{field}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::BinOp { op, lhs, rhs, .. } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Malloc { type_name, .. } => write!(f, "malloc {type_name}"),
            Expr::Valid { arg, .. } => write!(f, "valid {arg}"),
            Expr::IntLit { value, .. } => write!(f, "{value}"),
            Expr::Ref(r) => write!(f, "{r}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, def) in &self.types {
            writeln!(f, "type {name} {};", def.ty)?;
        }
        for (name, def) in &self.vars {
            writeln!(f, "var {} {name};", def.ty)?;
        }
        writeln!(f, "{{")?;
        for stmt in &self.body.stmts {
            write_stmt(f, stmt, 1)?;
        }
        writeln!(f, "}}")
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    let pad = "    ".repeat(depth);
    match stmt {
        Stmt::While { cond, body, .. } => {
            writeln!(f, "{pad}while {cond} {{")?;
            for inner in &body.stmts {
                write_stmt(f, inner, depth + 1)?;
            }
            writeln!(f, "{pad}}}")
        }
        Stmt::If {
            cond,
            then_blk,
            else_blk,
            ..
        } => {
            writeln!(f, "{pad}if {cond} {{")?;
            for inner in &then_blk.stmts {
                write_stmt(f, inner, depth + 1)?;
            }
            if let Some(else_blk) = else_blk {
                writeln!(f, "{pad}}} else {{")?;
                for inner in &else_blk.stmts {
                    write_stmt(f, inner, depth + 1)?;
                }
            }
            writeln!(f, "{pad}}}")
        }
        Stmt::Free { target, .. } => writeln!(f, "{pad}free {target};"),
        Stmt::Print { value, .. } => writeln!(f, "{pad}print {value};"),
        Stmt::Assign { target, value, .. } => writeln!(f, "{pad}{target} = {value};"),
    }
}
