use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use eightebed::{driver, suite, CompileError};

#[derive(Parser)]
#[command(name = "ebedc", version, about = "Eightebed-to-C compiler")]
struct Cli {
    /// Eightebed source file (stdin when omitted or `-`)
    source: Option<PathBuf>,

    /// Compile the generated C and run the resulting binary
    #[arg(long)]
    run: bool,

    /// Emit target C and stop (the default action)
    #[arg(long, conflicts_with = "run")]
    compile_only: bool,

    /// Write the generated C to this path instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Host C compiler command
    #[arg(long, default_value = "cc")]
    cc: String,

    /// Run the built-in test suite and exit
    #[arg(long)]
    test: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    std::process::exit(run_cli(&cli));
}

fn run_cli(cli: &Cli) -> i32 {
    if cli.test {
        return run_suite();
    }

    let (display_name, source) = match read_source(cli.source.as_deref()) {
        Ok(read) => read,
        Err(err) => {
            eprintln!("ebedc: {err}");
            return 2;
        }
    };

    let c_source = match driver::compile_to_c(&source) {
        Ok(c_source) => c_source,
        Err(err) => {
            report(&display_name, &err);
            return err.exit_code();
        }
    };

    // `--compile-only` and the flagless default both stop after emission;
    // the flags conflict, so `run` is false whenever `compile_only` is set.
    if cli.compile_only || !cli.run {
        return match &cli.output {
            Some(path) => match fs::write(path, c_source) {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("ebedc: {err}");
                    2
                }
            },
            None => {
                print!("{c_source}");
                0
            }
        };
    }

    match compile_and_run(cli, &c_source) {
        Ok(code) => code,
        Err(err) => {
            report(&display_name, &err);
            err.exit_code()
        }
    }
}

/// Errors with a source position are prefixed with the input name, giving
/// the conventional `file:line:col: kind: message` shape; process-level
/// failures carry the program name instead.
fn report(display_name: &str, err: &CompileError) {
    if err.position().is_some() {
        eprintln!("{display_name}:{err}");
    } else {
        eprintln!("ebedc: {err}");
    }
}

fn read_source(path: Option<&Path>) -> std::io::Result<(String, String)> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            Ok((path.display().to_string(), fs::read_to_string(path)?))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(("<stdin>".to_string(), buf))
        }
    }
}

fn compile_and_run(cli: &Cli, c_source: &str) -> Result<i32, CompileError> {
    let cc = driver::find_cc(&cli.cc)?;
    let (c_path, c_is_temp) = match &cli.output {
        Some(path) => (path.clone(), false),
        None => (
            std::env::temp_dir().join(format!("ebedc-{}.c", std::process::id())),
            true,
        ),
    };
    fs::write(&c_path, c_source)?;
    let exe_path = c_path.with_extension("bin");

    let code = driver::compile_c(&cc, &c_path, &exe_path)
        .and_then(|()| driver::run_exe(&exe_path));

    if c_is_temp {
        let _ = fs::remove_file(&c_path);
    }
    let _ = fs::remove_file(&exe_path);
    code
}

fn run_suite() -> i32 {
    let outcomes = suite::run();
    let mut passed = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.passed {
            passed += 1;
            println!("ok   {}", outcome.name);
        } else {
            failed += 1;
            println!("FAIL {}: {}", outcome.name, outcome.detail);
        }
    }
    println!("{passed} passed, {failed} failed");
    if failed == 0 {
        0
    } else {
        1
    }
}
