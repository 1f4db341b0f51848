//! Instruction set definitions for the stack machine.

use std::fmt;

/// Mnemonic table, in encoding order: the cell value of an instruction is
/// its index here. Slot 6 is the boundary between nullary and unary
/// entries; its mnemonic is empty and it is never a valid instruction at
/// runtime.
pub const MNEMONICS: [&str; 15] = [
    "HALT", "ADD", "DOT", "MPY", "SUB", "UNLK", "", "CALL", "EXIT", "INT", "JMP", "JZR", "LINK",
    "LOAD", "STORE",
];

/// Reserved table slot separating nullary from unary entries. An opcode
/// takes an operand cell iff its value is greater than this.
pub const OPERAND_BOUNDARY: i16 = 6;

/// Opcodes of the stack machine.
///
/// Discriminants are the encoded cell values; the gap at 6 is the reserved
/// table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum OpCode {
    // ============ Nullary ============
    /// Stop execution.
    Halt = 0,
    /// Pop b, pop a, push a + b.
    Add = 1,
    /// Pop a value and emit it as an output event.
    Dot = 2,
    /// Pop b, pop a, push a * b.
    Mpy = 3,
    /// Pop b, pop a, push a - b.
    Sub = 4,
    /// Close the current frame: discard its locals, restore the caller's fp.
    Unlk = 5,

    // ============ Unary ============
    /// Push the return address and jump to an absolute target: CALL <target>
    Call = 7,
    /// Discard k cells above the return address, then pop it into ip: EXIT <k>
    Exit = 8,
    /// Push a literal constant: INT <k>
    Int = 9,
    /// Relative jump: JMP <offset>
    Jmp = 10,
    /// Pop a value; jump relative if it is zero: JZR <offset>
    Jzr = 11,
    /// Open a frame and reserve k local slots: LINK <k>
    Link = 12,
    /// Push the value at stack slot fp + k: LOAD <k>
    Load = 13,
    /// Pop a value into stack slot fp + k: STORE <k>
    Store = 14,
}

impl OpCode {
    /// Decode a cell value. Returns `None` for anything outside the
    /// instruction set, including the reserved slot 6.
    pub fn from_cell(cell: i16) -> Option<OpCode> {
        Some(match cell {
            0 => OpCode::Halt,
            1 => OpCode::Add,
            2 => OpCode::Dot,
            3 => OpCode::Mpy,
            4 => OpCode::Sub,
            5 => OpCode::Unlk,
            7 => OpCode::Call,
            8 => OpCode::Exit,
            9 => OpCode::Int,
            10 => OpCode::Jmp,
            11 => OpCode::Jzr,
            12 => OpCode::Link,
            13 => OpCode::Load,
            14 => OpCode::Store,
            _ => return None,
        })
    }

    /// Whether this opcode is followed by an operand cell.
    pub fn has_operand(self) -> bool {
        self as i16 > OPERAND_BOUNDARY
    }

    /// The mnemonic this opcode assembles from.
    pub fn mnemonic(self) -> &'static str {
        MNEMONICS[self as usize]
    }
}

impl From<OpCode> for i16 {
    fn from(op: OpCode) -> i16 {
        op as i16
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip() {
        for cell in 0..MNEMONICS.len() as i16 {
            match OpCode::from_cell(cell) {
                Some(op) => assert_eq!(cell, op as i16),
                None => assert_eq!(cell, OPERAND_BOUNDARY),
            }
        }
    }

    #[test]
    fn test_invalid_cells() {
        assert!(OpCode::from_cell(OPERAND_BOUNDARY).is_none());
        assert!(OpCode::from_cell(15).is_none());
        assert!(OpCode::from_cell(-1).is_none());
        assert!(OpCode::from_cell(i16::MAX).is_none());
    }

    #[test]
    fn test_operand_boundary() {
        assert!(!OpCode::Halt.has_operand());
        assert!(!OpCode::Unlk.has_operand());
        assert!(OpCode::Call.has_operand());
        assert!(OpCode::Store.has_operand());
    }

    #[test]
    fn test_mnemonics_match_table() {
        assert_eq!(OpCode::Halt.mnemonic(), "HALT");
        assert_eq!(OpCode::Mpy.mnemonic(), "MPY");
        assert_eq!(OpCode::Store.mnemonic(), "STORE");
        assert_eq!(MNEMONICS[OPERAND_BOUNDARY as usize], "");
    }
}
