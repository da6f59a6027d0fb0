use std::fmt;

use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// A 1-based line/column pair attached to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Everything that can stop a compilation. The first error in any phase
/// aborts; no later phase runs.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{pos}: lex error: unrecognized character {ch:?}")]
    Lex { pos: Pos, ch: char },

    #[error("{pos}: parse error: expected {expected}, got {found}")]
    Parse {
        pos: Pos,
        expected: String,
        found: String,
    },

    #[error("{pos}: name error: {msg}")]
    Name { pos: Pos, msg: String },

    #[error("{pos}: type error: {msg}")]
    Type { pos: Pos, msg: String },

    #[error("{pos}: safety error: {msg}")]
    Safety { pos: Pos, msg: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("C compiler `{0}` not found on PATH")]
    ToolchainNotFound(String),

    #[error("C compiler failed ({status}):\n{stderr}")]
    Cc {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl CompileError {
    pub fn name(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Name {
            pos,
            msg: msg.into(),
        }
    }

    pub fn ty(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Type {
            pos,
            msg: msg.into(),
        }
    }

    pub fn safety(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Safety {
            pos,
            msg: msg.into(),
        }
    }

    /// Short tag identifying the error class, used by the built-in suite to
    /// match expected rejections.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Lex { .. } => "lex",
            CompileError::Parse { .. } => "parse",
            CompileError::Name { .. } => "name",
            CompileError::Type { .. } => "type",
            CompileError::Safety { .. } => "safety",
            CompileError::Io(_) => "io",
            CompileError::ToolchainNotFound(_) => "toolchain",
            CompileError::Cc { .. } => "cc",
        }
    }

    /// Source position, where applicable.
    pub fn position(&self) -> Option<Pos> {
        match self {
            CompileError::Lex { pos, .. }
            | CompileError::Parse { pos, .. }
            | CompileError::Name { pos, .. }
            | CompileError::Type { pos, .. }
            | CompileError::Safety { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    /// Process exit code the CLI maps this error to: 1 for source-level
    /// errors, 2 for i/o and toolchain failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Io(_)
            | CompileError::ToolchainNotFound(_)
            | CompileError::Cc { .. } => 2,
            _ => 1,
        }
    }
}
