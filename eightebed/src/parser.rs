//! LL(1) recursive-descent parser.
//!
//! The surface syntax is deliberately bracket-heavy — field access is
//! `[ref].name`, dereference is `@ref`, and every binary application is
//! fully parenthesized — so a single token of lookahead decides every
//! production. There is no error recovery: the first unexpected token
//! aborts the parse.

use crate::ast::{BinOp, Block, Expr, Field, Program, Ref, Stmt, Type, TypeDef, TypeEnv, VarDef, VarEnv};
use crate::error::{CompileError, CompileResult, Pos};
use crate::lexer::{Tok, TokenStream};

pub fn parse(source: &str) -> CompileResult<Program> {
    Parser::new(source)?.parse_program()
}

struct Parser<'src> {
    toks: TokenStream<'src>,
    current: Option<(Tok, Pos)>,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> CompileResult<Self> {
        let mut toks = TokenStream::new(source);
        let current = toks.next_token()?;
        Ok(Parser { toks, current })
    }

    fn peek(&self) -> Option<&Tok> {
        self.current.as_ref().map(|(tok, _)| tok)
    }

    fn here(&self) -> Pos {
        match &self.current {
            Some((_, pos)) => *pos,
            None => self.toks.eof_pos(),
        }
    }

    fn bump(&mut self) -> CompileResult<Option<(Tok, Pos)>> {
        let prev = self.current.take();
        self.current = self.toks.next_token()?;
        Ok(prev)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match &self.current {
            Some((tok, _)) => tok.describe(),
            None => "end of input".to_string(),
        };
        CompileError::Parse {
            pos: self.here(),
            expected: expected.to_string(),
            found,
        }
    }

    fn expect(&mut self, tok: Tok, expected: &str) -> CompileResult<Pos> {
        match &self.current {
            Some((current, pos)) if *current == tok => {
                let pos = *pos;
                self.bump()?;
                Ok(pos)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn ident(&mut self, expected: &str) -> CompileResult<(String, Pos)> {
        if let Some((Tok::Ident(_), _)) = &self.current {
            if let Some((Tok::Ident(name), pos)) = self.bump()? {
                return Ok((name, pos));
            }
        }
        Err(self.unexpected(expected))
    }

    fn parse_program(&mut self) -> CompileResult<Program> {
        let mut types = TypeEnv::new();
        let mut vars = VarEnv::new();
        while matches!(self.peek(), Some(Tok::Type)) {
            self.parse_type_decl(&mut types)?;
        }
        while matches!(self.peek(), Some(Tok::Var)) {
            self.parse_var_decl(&mut vars)?;
        }
        let body = self.parse_block()?;
        if self.current.is_some() {
            return Err(self.unexpected("end of input"));
        }
        Ok(Program { types, vars, body })
    }

    fn parse_type_decl(&mut self, types: &mut TypeEnv) -> CompileResult<()> {
        self.expect(Tok::Type, "`type`")?;
        let (name, pos) = self.ident("type name")?;
        let ty = self.parse_type()?;
        self.expect(Tok::Semi, "`;`")?;
        if types.insert(name.clone(), TypeDef { ty, pos }).is_some() {
            return Err(CompileError::name(
                pos,
                format!("type `{name}` already declared"),
            ));
        }
        Ok(())
    }

    fn parse_var_decl(&mut self, vars: &mut VarEnv) -> CompileResult<()> {
        self.expect(Tok::Var, "`var`")?;
        let ty = self.parse_type()?;
        let (name, pos) = self.ident("variable name")?;
        self.expect(Tok::Semi, "`;`")?;
        if vars.insert(name.clone(), VarDef { ty, pos }).is_some() {
            return Err(CompileError::name(
                pos,
                format!("variable `{name}` already declared"),
            ));
        }
        Ok(())
    }

    fn parse_type(&mut self) -> CompileResult<Type> {
        match self.peek() {
            Some(Tok::Int) => {
                self.bump()?;
                Ok(Type::Int)
            }
            Some(Tok::Struct) => {
                self.bump()?;
                self.expect(Tok::LBrace, "`{`")?;
                let mut fields = Vec::new();
                while !matches!(self.peek(), Some(Tok::RBrace)) {
                    let ty = self.parse_type()?;
                    let (name, pos) = self.ident("field name")?;
                    self.expect(Tok::Semi, "`;`")?;
                    fields.push(Field { name, ty, pos });
                }
                self.expect(Tok::RBrace, "`}`")?;
                Ok(Type::Struct(fields))
            }
            Some(Tok::Ptr) => {
                self.bump()?;
                self.expect(Tok::To, "`to`")?;
                let target = self.parse_type()?;
                Ok(Type::Ptr(Box::new(target)))
            }
            Some(Tok::Ident(_)) => {
                let (name, _) = self.ident("type name")?;
                Ok(Type::Named(name))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        self.expect(Tok::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !matches!(self.peek(), Some(Tok::RBrace) | None) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(Tok::RBrace, "`}`")?;
        Ok(Block { stmts })
    }

    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        match self.peek() {
            Some(Tok::While) => {
                let pos = self.expect(Tok::While, "`while`")?;
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body, pos })
            }
            Some(Tok::If) => {
                let pos = self.expect(Tok::If, "`if`")?;
                let cond = self.parse_expr()?;
                let then_blk = self.parse_block()?;
                let else_blk = if matches!(self.peek(), Some(Tok::Else)) {
                    self.bump()?;
                    Some(self.parse_block()?)
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_blk,
                    else_blk,
                    pos,
                })
            }
            Some(Tok::Free) => {
                let pos = self.expect(Tok::Free, "`free`")?;
                let target = self.parse_ref()?;
                self.expect(Tok::Semi, "`;`")?;
                Ok(Stmt::Free { target, pos })
            }
            Some(Tok::Print) => {
                let pos = self.expect(Tok::Print, "`print`")?;
                let value = self.parse_expr()?;
                self.expect(Tok::Semi, "`;`")?;
                Ok(Stmt::Print { value, pos })
            }
            Some(Tok::LBracket | Tok::At | Tok::Ident(_)) => {
                let target = self.parse_ref()?;
                let pos = target.pos();
                self.expect(Tok::Eq, "`=`")?;
                let value = self.parse_expr()?;
                self.expect(Tok::Semi, "`;`")?;
                Ok(Stmt::Assign { target, value, pos })
            }
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_ref(&mut self) -> CompileResult<Ref> {
        match self.peek() {
            Some(Tok::LBracket) => {
                let pos = self.expect(Tok::LBracket, "`[`")?;
                let base = self.parse_ref()?;
                self.expect(Tok::RBracket, "`]`")?;
                self.expect(Tok::Dot, "`.`")?;
                let (field, _) = self.ident("field name")?;
                Ok(Ref::Field {
                    base: Box::new(base),
                    field,
                    pos,
                })
            }
            Some(Tok::At) => {
                let pos = self.expect(Tok::At, "`@`")?;
                let inner = self.parse_ref()?;
                Ok(Ref::Deref {
                    inner: Box::new(inner),
                    pos,
                })
            }
            Some(Tok::Ident(_)) => {
                let (name, pos) = self.ident("variable name")?;
                Ok(Ref::Name { name, pos })
            }
            _ => Err(self.unexpected("a reference")),
        }
    }

    fn parse_expr(&mut self) -> CompileResult<Expr> {
        match self.peek() {
            Some(Tok::LParen) => {
                let pos = self.expect(Tok::LParen, "`(`")?;
                let lhs = self.parse_expr()?;
                let op = self.parse_binop()?;
                let rhs = self.parse_expr()?;
                self.expect(Tok::RParen, "`)`")?;
                Ok(Expr::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    pos,
                })
            }
            Some(Tok::Malloc) => {
                let pos = self.expect(Tok::Malloc, "`malloc`")?;
                let (type_name, _) = self.ident("type name")?;
                Ok(Expr::Malloc { type_name, pos })
            }
            Some(Tok::Valid) => {
                let pos = self.expect(Tok::Valid, "`valid`")?;
                let arg = self.parse_expr()?;
                Ok(Expr::Valid {
                    arg: Box::new(arg),
                    pos,
                })
            }
            Some(Tok::IntLit(_)) => {
                if let Some((Tok::IntLit(value), pos)) = self.bump()? {
                    Ok(Expr::IntLit { value, pos })
                } else {
                    Err(self.unexpected("an integer literal"))
                }
            }
            Some(Tok::LBracket | Tok::At | Tok::Ident(_)) => Ok(Expr::Ref(self.parse_ref()?)),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_binop(&mut self) -> CompileResult<BinOp> {
        let op = match self.peek() {
            Some(Tok::Plus) => BinOp::Add,
            Some(Tok::Minus) => BinOp::Sub,
            Some(Tok::Star) => BinOp::Mul,
            Some(Tok::Slash) => BinOp::Div,
            Some(Tok::Eq) => BinOp::Eq,
            Some(Tok::Gt) => BinOp::Gt,
            Some(Tok::Amp) => BinOp::And,
            Some(Tok::Pipe) => BinOp::Or,
            _ => return Err(self.unexpected("a binary operator")),
        };
        self.bump()?;
        Ok(op)
    }
}
