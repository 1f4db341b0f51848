//! Error types for the assembler and the execution engine.

use thiserror::Error;

/// Assembly-time errors.
///
/// Line numbers are 1-based and refer to the order in which lines were fed
/// to the assembler.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Unrecognized instruction at line {line}: {text}")]
    UnrecognizedInstruction { line: usize, text: String },

    #[error("Invalid operand at line {line}: {text}")]
    InvalidOperand { line: usize, text: String },

    #[error("Code image full: capacity of {capacity} cells exceeded")]
    ImageOverflow { capacity: usize },
}

impl AssembleError {
    pub fn unrecognized(line: usize, text: impl Into<String>) -> Self {
        Self::UnrecognizedInstruction {
            line,
            text: text.into(),
        }
    }

    pub fn invalid_operand(line: usize, text: impl Into<String>) -> Self {
        Self::InvalidOperand {
            line,
            text: text.into(),
        }
    }
}

/// Execution-time errors. All variants are terminal: the engine stops at
/// the faulting instruction and performs no further fetches.
///
/// `addr` is the code-image index of the faulting instruction's opcode
/// cell, except for [`ExecError::FetchPastEnd`] where it is the index the
/// fetch attempted.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Unrecognized opcode {opcode} at address {addr}")]
    UnrecognizedOpcode { opcode: i16, addr: usize },

    #[error("Stack overflow at address {addr}")]
    StackOverflow { addr: usize },

    #[error("Stack underflow at address {addr}")]
    StackUnderflow { addr: usize },

    #[error("Stack slot {slot} out of bounds at address {addr}")]
    SlotOutOfBounds { slot: isize, addr: usize },

    #[error("Jump target {target} out of bounds at address {addr}")]
    BadJumpTarget { target: isize, addr: usize },

    #[error("Instruction fetch past end of code image at address {addr}")]
    FetchPastEnd { addr: usize },
}

impl ExecError {
    /// The code-image address the error was raised at.
    pub fn addr(&self) -> usize {
        match self {
            Self::UnrecognizedOpcode { addr, .. }
            | Self::StackOverflow { addr }
            | Self::StackUnderflow { addr }
            | Self::SlotOutOfBounds { addr, .. }
            | Self::BadJumpTarget { addr, .. }
            | Self::FetchPastEnd { addr } => *addr,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum SamError {
    #[error("Assemble error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
