//! samvm: a minimal 16-bit stack machine with a line-oriented assembler.
//!
//! Source programs are plain text, one instruction per line (`INT 3`,
//! `CALL 6`, `ADD`); the assembler encodes each line into one or two
//! cells of a fixed-width code image, and the virtual machine executes
//! the image against an operand stack with frame-pointer-relative
//! locals. Jump targets and offsets are raw numbers in the source text;
//! there are no labels.
//!
//! ```
//! let outputs = samvm::run("INT 3\nINT 4\nADD\nDOT\nHALT").unwrap();
//! assert_eq!(outputs, vec![7]);
//! ```

pub mod bytecode;
pub mod error;

use std::fs;
use std::path::Path;

use bytecode::vm::{Console, Recorder, Vm};
use bytecode::Assembler;
pub use error::SamError;

/// Assemble and execute a source program, returning the values emitted
/// by its DOT instructions. Stops at the first line that fails to
/// encode.
pub fn run(source: &str) -> Result<Vec<i16>, SamError> {
    run_with_options(source, false)
}

/// As [`run`], optionally printing an execution trace to stdout.
pub fn run_with_options(source: &str, trace: bool) -> Result<Vec<i16>, SamError> {
    let mut assembler = Assembler::new();
    for line in source.lines() {
        assembler.assemble_line(line)?;
    }

    let mut vm = Vm::new(assembler.finish());
    let mut recorder = Recorder {
        trace,
        ..Recorder::default()
    };
    vm.run(&mut recorder)?;
    Ok(recorder.outputs)
}

/// Run a program from a file the way the command-line front end does:
/// lines that fail to encode are reported to stderr and skipped, DOT
/// output goes to stdout, and execution runs whatever did assemble.
pub fn run_file(path: &Path, trace: bool) -> Result<(), SamError> {
    let source = fs::read_to_string(path)?;

    let (image, errors) = bytecode::assemble(&source);
    for error in &errors {
        eprintln!("{}", error);
    }

    let mut vm = Vm::new(image);
    vm.run(&mut Console { trace })?;
    Ok(())
}
