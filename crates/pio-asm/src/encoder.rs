//! PIO instruction encoder.
//!
//! Every PIO instruction is one 16-bit word:
//!
//! ```text
//! [15:13] opcode tag
//! [12:8]  delay / side-set (shared by every instruction)
//! [7:0]   instruction-specific fields
//!
//! jmp:   000 | delay | cond(3)  | addr(5)
//! wait:  001 | delay | pol(1)   | src(2) | index(5)
//! in:    010 | delay | src(3)   | count(5)
//! out:   011 | delay | dst(3)   | count(5)
//! push:  100 | delay | 0 | iff(1) | blk(1) | 00000
//! pull:  100 | delay | 1 | ife(1) | blk(1) | 00000
//! mov:   101 | delay | dst(3)   | op(2)  | src(3)
//! irq:   110 | delay | 0 | clr(1) | wait(1) | idxmode(2) | index(3)
//! set:   111 | delay | dst(3)   | value(5)
//! ```
//!
//! The version-1 `mov rxfifo[]` forms borrow the push/pull opcode space,
//! with `0001`/`1001` in bits 7:4 and the 4-bit RX selector in bits 3:0.
//!
//! The parser validates every field before it reaches this module, so
//! encoding is a pure bit-packing step.  A `jmp` to a label encodes a zero
//! target; the assembler patches the low five bits once the label table is
//! complete.

use crate::ir::{Instruction, JmpTarget, WaitSource};

// ── Opcode tags (bits 15:13) ────────────────────────────────────────────

const OP_JMP: u16 = 0b000;
const OP_WAIT: u16 = 0b001;
const OP_IN: u16 = 0b010;
const OP_OUT: u16 = 0b011;
const OP_PUSH_PULL: u16 = 0b100;
const OP_MOV: u16 = 0b101;
const OP_IRQ: u16 = 0b110;
const OP_SET: u16 = 0b111;

/// The fixed encoding of `nop`: `mov y, y`.
pub const NOP: u16 = 0b101_00000_010_00_010;

/// Pack an opcode tag with its operand byte.
#[inline]
fn word(tag: u16, operands: u16) -> u16 {
    (tag << 13) | operands
}

#[inline]
fn flag(b: bool) -> u16 {
    u16::from(b)
}

/// Encode a parsed instruction into its 16-bit word, without the shared
/// delay/side-set field (see [`apply_delay_side`]).
#[must_use]
pub fn encode(instr: &Instruction) -> u16 {
    match instr {
        Instruction::Nop => NOP,

        Instruction::Jmp { condition, target } => {
            let address = match target {
                JmpTarget::Address(a) => u16::from(*a),
                // Patched by the fixup pass once labels are resolved.
                JmpTarget::Label { .. } => 0,
            };
            word(OP_JMP, (condition.code() << 5) | address)
        }

        Instruction::Wait {
            polarity,
            source,
            index,
            mode,
        } => {
            let index_field = match source {
                WaitSource::Irq => (mode.code() << 3) | u16::from(*index),
                _ => u16::from(*index),
            };
            word(
                OP_WAIT,
                (u16::from(*polarity) << 7) | (source.code() << 5) | index_field,
            )
        }

        Instruction::In { source, bit_count } => {
            // 32 encodes as 0.
            word(OP_IN, (source.code() << 5) | u16::from(bit_count & 0x1F))
        }

        Instruction::Out {
            destination,
            bit_count,
        } => word(
            OP_OUT,
            (destination.code() << 5) | u16::from(bit_count & 0x1F),
        ),

        Instruction::Push { if_full, block } => {
            word(OP_PUSH_PULL, (flag(*if_full) << 6) | (flag(*block) << 5))
        }

        Instruction::Pull { if_empty, block } => word(
            OP_PUSH_PULL,
            0x80 | (flag(*if_empty) << 6) | (flag(*block) << 5),
        ),

        Instruction::Mov {
            destination,
            op,
            source,
        } => word(
            OP_MOV,
            (destination.code() << 5) | (op.code() << 3) | source.code(),
        ),

        Instruction::MovToRxFifo { index } => word(OP_PUSH_PULL, 0b0001_0000 | index.field()),

        Instruction::MovFromRxFifo { index } => word(OP_PUSH_PULL, 0b1001_0000 | index.field()),

        Instruction::Irq {
            wait,
            clear,
            index,
            mode,
        } => word(
            OP_IRQ,
            (flag(*clear) << 6) | (flag(*wait) << 5) | (mode.code() << 3) | u16::from(*index),
        ),

        Instruction::Set { destination, value } => {
            word(OP_SET, (destination.code() << 5) | u16::from(*value))
        }
    }
}

/// Merge a combined delay/side-set value into bits 8–12 of an encoded word.
#[must_use]
pub fn apply_delay_side(word: u16, delay_side: u8) -> u16 {
    word | ((u16::from(delay_side) & 0x1F) << 8)
}

/// Patch the low five target bits of an already-emitted `jmp` word.
#[must_use]
pub fn patch_jmp_target(word: u16, address: u8) -> u16 {
    word | u16::from(address & 0x1F)
}
