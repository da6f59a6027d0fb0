//! Token definitions for the Eightebed surface syntax.
//!
//! Whitespace separates tokens and is otherwise discarded; there is no
//! comment syntax. Keywords win over identifiers, integer literals are bare
//! decimal digit sequences (the language has no negation), and every
//! punctuation mark is a single character.

use logos::Logos;

use crate::error::{CompileError, CompileResult, Pos};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Tok {
    #[token("type")]
    Type,
    #[token("var")]
    Var,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("free")]
    Free,
    #[token("print")]
    Print,
    #[token("int")]
    Int,
    #[token("struct")]
    Struct,
    #[token("ptr")]
    Ptr,
    #[token("to")]
    To,
    #[token("malloc")]
    Malloc,
    #[token("valid")]
    Valid,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLit(i64),

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

impl Tok {
    /// How this token reads in a diagnostic.
    pub fn describe(&self) -> String {
        let fixed = match self {
            Tok::Type => "type",
            Tok::Var => "var",
            Tok::While => "while",
            Tok::If => "if",
            Tok::Else => "else",
            Tok::Free => "free",
            Tok::Print => "print",
            Tok::Int => "int",
            Tok::Struct => "struct",
            Tok::Ptr => "ptr",
            Tok::To => "to",
            Tok::Malloc => "malloc",
            Tok::Valid => "valid",
            Tok::LBrace => "{",
            Tok::RBrace => "}",
            Tok::LBracket => "[",
            Tok::RBracket => "]",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::Semi => ";",
            Tok::Dot => ".",
            Tok::At => "@",
            Tok::Eq => "=",
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::Slash => "/",
            Tok::Gt => ">",
            Tok::Amp => "&",
            Tok::Pipe => "|",
            Tok::IntLit(value) => return format!("integer `{value}`"),
            Tok::Ident(name) => return format!("identifier `{name}`"),
        };
        format!("`{fixed}`")
    }
}

/// Byte offset → line/column translation for diagnostics.
pub struct LineMap {
    starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        LineMap { starts }
    }

    pub fn pos(&self, offset: usize) -> Pos {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        Pos {
            line: line as u32,
            col: (offset - start + 1) as u32,
        }
    }
}

/// One-token-at-a-time stream over a source string. The parser pulls from
/// this lazily; an unknown character surfaces as a fatal lex error when the
/// stream reaches it.
pub struct TokenStream<'src> {
    inner: logos::SpannedIter<'src, Tok>,
    source: &'src str,
    map: LineMap,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        TokenStream {
            inner: Tok::lexer(source).spanned(),
            source,
            map: LineMap::new(source),
        }
    }

    pub fn next_token(&mut self) -> CompileResult<Option<(Tok, Pos)>> {
        match self.inner.next() {
            None => Ok(None),
            Some((Ok(tok), span)) => Ok(Some((tok, self.map.pos(span.start)))),
            Some((Err(()), span)) => {
                let ch = self.source[span.start..].chars().next().unwrap_or('\0');
                Err(CompileError::Lex {
                    pos: self.map.pos(span.start),
                    ch,
                })
            }
        }
    }

    pub fn eof_pos(&self) -> Pos {
        self.map.pos(self.source.len())
    }
}

/// Lex a whole source text eagerly. Convenience for tests and tooling.
pub fn lex(source: &str) -> CompileResult<Vec<(Tok, Pos)>> {
    let mut stream = TokenStream::new(source);
    let mut toks = Vec::new();
    while let Some(tok) = stream.next_token()? {
        toks.push(tok);
    }
    Ok(toks)
}
