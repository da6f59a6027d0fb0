//! Compilation drivers: wire the phases together and talk to the host C
//! toolchain.
//!
//! The compiler itself is a pure function from source bytes to target
//! bytes; everything process-shaped (PATH lookup, the `cc` subprocess,
//! running the produced executable) lives here so the phases stay clean.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::ast::Program;
use crate::error::{CompileError, CompileResult};
use crate::{analyze, emit, parser, typecheck};

/// Run the front end: parse, type check, safety analysis. The first error
/// in any phase aborts.
pub fn parse_and_check(source: &str) -> CompileResult<Program> {
    info!("parsing");
    let program = parser::parse(source)?;
    info!("type checking");
    typecheck::check(&program)?;
    info!("analyzing pointer safety");
    analyze::analyze(&program)?;
    Ok(program)
}

/// Full pipeline: source text in, C text out.
pub fn compile_to_c(source: &str) -> CompileResult<String> {
    let program = parse_and_check(source)?;
    info!("generating C");
    emit::emit(&program)
}

/// Resolve the host C compiler command on PATH.
pub fn find_cc(cc: &str) -> CompileResult<PathBuf> {
    which::which(cc).map_err(|_| CompileError::ToolchainNotFound(cc.to_string()))
}

/// Compile `c_path` to `exe_path` with the host C compiler, capturing its
/// stderr for the error report.
pub fn compile_c(cc: &Path, c_path: &Path, exe_path: &Path) -> CompileResult<()> {
    info!("compiling {} with {}", c_path.display(), cc.display());
    let output = Command::new(cc)
        .arg(c_path)
        .arg("-o")
        .arg(exe_path)
        .output()?;
    if !output.status.success() {
        return Err(CompileError::Cc {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Run the produced executable with inherited stdio; returns its exit code.
pub fn run_exe(exe: &Path) -> CompileResult<i32> {
    info!("running {}", exe.display());
    let status = Command::new(exe).status()?;
    Ok(status.code().unwrap_or(1))
}
