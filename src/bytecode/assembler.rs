//! The assembler: one mnemonic line to one or two image cells.
//!
//! Recognition is a fixed-width prefix match against the mnemonic table,
//! in table order; jump targets and offsets are raw numbers already baked
//! into the source text. There are no labels, no symbols and no second
//! pass.

use crate::bytecode::image::CodeImage;
use crate::bytecode::instruction::{MNEMONICS, OPERAND_BOUNDARY};
use crate::error::AssembleError;

/// Number of leading bytes a line is matched on.
const MATCH_LEN: usize = 3;

/// Line-at-a-time encoder, accumulating cells into a [`CodeImage`].
pub struct Assembler {
    image: CodeImage,
    line: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            image: CodeImage::new(),
            line: 0,
        }
    }

    /// Encode one source line, appending one or two cells to the image.
    ///
    /// Appending is atomic: a line that fails to encode leaves the image
    /// untouched.
    pub fn assemble_line(&mut self, text: &str) -> Result<(), AssembleError> {
        self.line += 1;

        let Some(opcode) = match_mnemonic(text) else {
            return Err(AssembleError::unrecognized(self.line, text));
        };

        if opcode as i16 > OPERAND_BOUNDARY {
            // The line is the mnemonic, one separator character, then the
            // operand text.
            let rest = text.get(MNEMONICS[opcode].len() + 1..).unwrap_or("");
            let value = parse_operand(rest)
                .ok_or_else(|| AssembleError::invalid_operand(self.line, text))?;
            if self.image.len() + 2 > CodeImage::CAPACITY {
                return Err(AssembleError::ImageOverflow {
                    capacity: CodeImage::CAPACITY,
                });
            }
            self.image.push(opcode as i16)?;
            self.image.push(value)?;
        } else {
            self.image.push(opcode as i16)?;
        }
        Ok(())
    }

    /// Number of cells written so far.
    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn finish(self) -> CodeImage {
        self.image
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a whole source, skipping lines that do not encode.
///
/// Every line is attempted; a bad line is reported and leaves the image
/// unchanged, and assembly continues with the next line.
pub fn assemble(source: &str) -> (CodeImage, Vec<AssembleError>) {
    let mut assembler = Assembler::new();
    let mut errors = Vec::new();
    for line in source.lines() {
        if let Err(e) = assembler.assemble_line(line) {
            errors.push(e);
        }
    }
    (assembler.finish(), errors)
}

/// First match wins: the leading [`MATCH_LEN`] bytes of the line against
/// the leading [`MATCH_LEN`] bytes of each table entry, length- and
/// case-sensitive. An empty line therefore matches the reserved empty
/// slot of the table.
fn match_mnemonic(text: &str) -> Option<usize> {
    MNEMONICS.iter().position(|m| head(text) == head(m))
}

fn head(s: &str) -> &[u8] {
    &s.as_bytes()[..s.len().min(MATCH_LEN)]
}

/// Parse operand text: an optional opening parenthesis, optional leading
/// whitespace, an optional sign, then base-10 digits. Trailing text is
/// ignored. The value must be representable in a 16-bit cell.
fn parse_operand(text: &str) -> Option<i16> {
    let rest = text.strip_prefix('(').unwrap_or(text).trim_start();
    let (negative, digits) = match rest.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, rest.strip_prefix('+').unwrap_or(rest)),
    };

    let mut value: i32 = 0;
    let mut seen = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        value = value * 10 + i32::from(b - b'0');
        if value > i32::from(i16::MAX) + 1 {
            return None;
        }
    }
    if !seen {
        return None;
    }

    let value = if negative { -value } else { value };
    i16::try_from(value).ok()
}
