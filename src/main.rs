//! Sam CLI: assemble and run stack-machine programs.

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use colored::Colorize;

use samvm::bytecode::{assemble, disassembler};
use samvm::SamError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI options parsed from arguments.
struct Options {
    file: String,
    trace: bool,
    disasm: bool,
}

fn print_usage() {
    eprintln!("Sam {} - stack machine assembler and interpreter", VERSION);
    eprintln!();
    eprintln!("Usage: sam [options] <program.sam>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --trace         Print each executed instruction and the stack");
    eprintln!("  --disasm        Print the assembled image and exit");
    eprintln!("  --help, -h      Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  sam program.sam           Assemble and run a program");
    eprintln!("  sam --trace program.sam   Run with an execution trace");
}

fn parse_args() -> Option<Options> {
    let mut file = None;
    let mut trace = false;
    let mut disasm = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => trace = true,
            "--disasm" => disasm = true,
            "--help" | "-h" => return None,
            _ if arg.starts_with('-') => {
                eprintln!("{} unknown option '{}'", "error:".red().bold(), arg);
                return None;
            }
            _ => {
                if file.is_some() {
                    eprintln!("{} more than one input file", "error:".red().bold());
                    return None;
                }
                file = Some(arg);
            }
        }
    }

    Some(Options {
        file: file?,
        trace,
        disasm,
    })
}

fn main() {
    let Some(options) = parse_args() else {
        print_usage();
        process::exit(64);
    };

    if options.disasm {
        disassemble_file(&options.file);
        return;
    }

    if let Err(e) = samvm::run_file(Path::new(&options.file), options.trace) {
        let code = match &e {
            SamError::Io(_) => 66,
            _ => 70,
        };
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(code);
    }
}

/// Assemble a file and print the listing instead of running it.
fn disassemble_file(file: &str) {
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} cannot read {}: {}", "error:".red().bold(), file, e);
            process::exit(66);
        }
    };

    let (image, errors) = assemble(&source);
    for error in &errors {
        eprintln!("{} {}", "error:".red().bold(), error);
    }
    print!("{}", disassembler::disassemble(&image));
}
