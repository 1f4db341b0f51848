//! The execution engine: a fetch-decode-execute loop over a code image.
//!
//! One `Vm` instance owns one run: the image, a fixed operand-stack arena
//! and the three registers are instance state, never globals. Arithmetic
//! is 16-bit signed and wraps on overflow, which is observable through
//! DOT. Call frames are implicit in the stack arena: LINK pushes the
//! caller's fp and reserves locals above it, LOAD/STORE address slots
//! relative to fp, UNLK restores the caller's frame, and CALL/EXIT move
//! the return address through the same stack.

use crate::bytecode::disassembler;
use crate::bytecode::image::CodeImage;
use crate::bytecode::instruction::OpCode;
use crate::error::ExecError;

/// Number of cells in the operand-stack arena.
pub const STACK_MAX: usize = 1024;

/// Result type for engine operations.
pub type VmResult<T> = Result<T, ExecError>;

/// Receives the machine's observable events during a run.
pub trait Observer {
    /// One value emitted by DOT, in execution order.
    fn output(&mut self, value: i16);

    /// Trace hook, called after each executed instruction with its
    /// address and decoded form plus the live stack contents. Halting and
    /// faulting instructions do not reach it.
    fn step(&mut self, _addr: usize, _op: OpCode, _operand: Option<i16>, _stack: &[i16]) {}
}

/// Prints DOT output to stdout, and each step in the machine's trace
/// format when tracing is on.
pub struct Console {
    pub trace: bool,
}

impl Observer for Console {
    fn output(&mut self, value: i16) {
        println!("{}", value);
    }

    fn step(&mut self, addr: usize, op: OpCode, operand: Option<i16>, stack: &[i16]) {
        if self.trace {
            println!("{}", disassembler::trace_line(addr, op, operand, stack));
        }
    }
}

/// Collects emitted values instead of printing them; optionally echoes
/// the trace to stdout.
#[derive(Debug, Default)]
pub struct Recorder {
    pub outputs: Vec<i16>,
    pub trace: bool,
}

impl Observer for Recorder {
    fn output(&mut self, value: i16) {
        self.outputs.push(value);
    }

    fn step(&mut self, addr: usize, op: OpCode, operand: Option<i16>, stack: &[i16]) {
        if self.trace {
            println!("{}", disassembler::trace_line(addr, op, operand, stack));
        }
    }
}

/// The virtual machine.
///
/// Construction leaves `ip = sp = fp = 0`; `run` then executes the image
/// to a halt or a terminal fault. Stack slots reserved but never written
/// read as 0.
#[derive(Debug)]
pub struct Vm {
    image: CodeImage,
    stack: Vec<i16>,
    ip: usize,
    sp: usize,
    fp: usize,
    /// Address of the opcode cell being executed; faults report it.
    op_addr: usize,
}

impl Vm {
    pub fn new(image: CodeImage) -> Self {
        Self {
            image,
            stack: vec![0; STACK_MAX],
            ip: 0,
            sp: 0,
            fp: 0,
            op_addr: 0,
        }
    }

    /// Run to completion. `Ok(())` means a halt opcode was fetched; an
    /// error is a terminal fault and the machine performs no further
    /// fetches.
    pub fn run(&mut self, observer: &mut dyn Observer) -> VmResult<()> {
        loop {
            self.op_addr = self.ip;
            let cell = self.fetch()?;
            let Some(op) = OpCode::from_cell(cell) else {
                return Err(ExecError::UnrecognizedOpcode {
                    opcode: cell,
                    addr: self.op_addr,
                });
            };
            if op == OpCode::Halt {
                return Ok(());
            }

            let operand = if op.has_operand() {
                Some(self.fetch()?)
            } else {
                None
            };
            let emitted = self.step(op, operand.unwrap_or(0))?;

            observer.step(self.op_addr, op, operand, &self.stack[..self.sp]);
            if let Some(value) = emitted {
                observer.output(value);
            }
        }
    }

    /// Execute one decoded instruction. `k` is the operand cell value, 0
    /// for nullary opcodes. Returns the value emitted by DOT, if any.
    ///
    /// With the operand cell already consumed, `ip` points at the next
    /// instruction here, so relative jumps are plain `ip + offset` and
    /// CALL's return address is the current `ip`.
    fn step(&mut self, op: OpCode, k: i16) -> VmResult<Option<i16>> {
        match op {
            // Handled in `run` before dispatch.
            OpCode::Halt => {}

            OpCode::Add => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a.wrapping_add(b))?;
            }

            OpCode::Sub => {
                // b is the top of the stack: [a, b] -> [a - b]
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a.wrapping_sub(b))?;
            }

            OpCode::Mpy => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(a.wrapping_mul(b))?;
            }

            OpCode::Dot => {
                let x = self.pop()?;
                return Ok(Some(x));
            }

            OpCode::Int => self.push(k)?,

            OpCode::Load => {
                let slot = self.slot(k)?;
                let value = self.stack[slot];
                self.push(value)?;
            }

            OpCode::Store => {
                let x = self.pop()?;
                let slot = self.slot(k)?;
                self.stack[slot] = x;
            }

            OpCode::Link => {
                // [..] -> [.., caller fp, k uninitialized locals]
                self.push(self.fp as i16)?;
                self.fp = self.sp - 1;
                self.adjust_sp(isize::from(k))?;
            }

            OpCode::Unlk => {
                self.sp = self.fp + 1;
                let saved = self.pop()?;
                self.fp = self.frame_index(saved)?;
            }

            OpCode::Call => {
                self.push(self.ip as i16)?;
                self.ip = self.code_index(isize::from(k))?;
            }

            OpCode::Exit => {
                // Drop the k cells the callee left above the return
                // address, then resume there.
                self.adjust_sp(-isize::from(k))?;
                let ret = self.pop()?;
                self.ip = self.code_index(isize::from(ret))?;
            }

            OpCode::Jmp => {
                self.ip = self.code_index(self.ip as isize + isize::from(k))?;
            }

            OpCode::Jzr => {
                if self.pop()? == 0 {
                    self.ip = self.code_index(self.ip as isize + isize::from(k))?;
                }
            }
        }
        Ok(None)
    }

    fn fetch(&mut self) -> VmResult<i16> {
        if self.ip >= CodeImage::CAPACITY {
            return Err(ExecError::FetchPastEnd { addr: self.ip });
        }
        let cell = self.image.cell(self.ip);
        self.ip += 1;
        Ok(cell)
    }

    fn push(&mut self, value: i16) -> VmResult<()> {
        if self.sp == STACK_MAX {
            return Err(ExecError::StackOverflow { addr: self.op_addr });
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> VmResult<i16> {
        if self.sp == 0 {
            return Err(ExecError::StackUnderflow { addr: self.op_addr });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// Resolve a frame-relative slot index. The slot may lie above `sp`;
    /// it only has to be inside the arena.
    fn slot(&self, k: i16) -> VmResult<usize> {
        let slot = self.fp as isize + isize::from(k);
        if (0..STACK_MAX as isize).contains(&slot) {
            Ok(slot as usize)
        } else {
            Err(ExecError::SlotOutOfBounds {
                slot,
                addr: self.op_addr,
            })
        }
    }

    /// Validate a frame pointer restored from the stack.
    fn frame_index(&self, value: i16) -> VmResult<usize> {
        let index = isize::from(value);
        if (0..STACK_MAX as isize).contains(&index) {
            Ok(index as usize)
        } else {
            Err(ExecError::SlotOutOfBounds {
                slot: index,
                addr: self.op_addr,
            })
        }
    }

    /// Validate a control-transfer target.
    fn code_index(&self, target: isize) -> VmResult<usize> {
        if (0..CodeImage::CAPACITY as isize).contains(&target) {
            Ok(target as usize)
        } else {
            Err(ExecError::BadJumpTarget {
                target,
                addr: self.op_addr,
            })
        }
    }

    fn adjust_sp(&mut self, delta: isize) -> VmResult<()> {
        let sp = self.sp as isize + delta;
        if sp < 0 {
            return Err(ExecError::StackUnderflow { addr: self.op_addr });
        }
        if sp > STACK_MAX as isize {
            return Err(ExecError::StackOverflow { addr: self.op_addr });
        }
        self.sp = sp as usize;
        Ok(())
    }

    /// Next cell to fetch.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// One past the top of the operand stack.
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Index of the current frame's saved-fp slot.
    pub fn fp(&self) -> usize {
        self.fp
    }

    /// The live operand stack, bottom first.
    pub fn stack(&self) -> &[i16] {
        &self.stack[..self.sp]
    }

    pub fn image(&self) -> &CodeImage {
        &self.image
    }
}
