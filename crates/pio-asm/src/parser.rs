//! Instruction-line parser.
//!
//! Converts the field list of one instruction line into an [`Instruction`]
//! plus the combined delay/side-set value for bits 8–12.  All operand,
//! range, and version validation happens here; the encoder only packs
//! already-validated fields.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{PioError, Span};
use crate::ir::{
    FifoType, IndexMode, Instruction, InSource, JmpCondition, JmpTarget, MovDestination, MovOp,
    MovSource, OutDestination, PioVersion, RxIndex, SetDestination, WaitSource,
};
use crate::lexer::{parse_int, Token};

/// Side-set geometry configured by `.side_set`.
///
/// The side-set value and the delay share the 5-bit field at bits 8–12;
/// the `opt` flag additionally reserves bit 12 as the "side-set present"
/// marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideSet {
    /// Number of side-set bits (0 disables `side` suffixes).
    pub count: u8,
    /// Whether `side` is optional per instruction (`opt`).
    pub optional: bool,
    /// Whether side-set drives pin directions instead of levels.
    pub pindirs: bool,
}

impl SideSet {
    /// Bits left over for the delay value.
    #[must_use]
    pub fn delay_bits(self) -> u8 {
        5u8.saturating_sub(self.count + u8::from(self.optional))
    }

    /// Largest representable delay.
    #[must_use]
    pub fn max_delay(self) -> u8 {
        (1u8 << self.delay_bits()) - 1
    }
}

/// Directive-derived global state the instruction parser depends on.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    /// Selected instruction-set revision.
    pub version: PioVersion,
    /// Side-set geometry.
    pub side_set: SideSet,
    /// Effective FIFO mode (gates the `rxfifo[]` mov forms).
    pub fifo: FifoType,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            version: PioVersion::V0,
            side_set: SideSet::default(),
            fifo: FifoType::Auto,
        }
    }
}

/// Parse one instruction line into an [`Instruction`] and the combined
/// delay/side-set field value.
///
/// # Errors
///
/// Returns the appropriate [`PioError`] variant for unknown mnemonics,
/// illegal operand names, out-of-range values, and version-gated
/// constructs used under an older revision.
pub fn parse_instruction(
    fields: &[Token<'_>],
    ctx: &ParseContext,
) -> Result<(Instruction, u8), PioError> {
    let mut fields: Vec<Token<'_>> = fields.to_vec();
    let delay_side = parse_delay_side(&mut fields, ctx)?;

    let mnemonic = fields[0];
    let instr = match mnemonic.text {
        "nop" => {
            expect_operands(&fields, 0, "nop takes no operands")?;
            Instruction::Nop
        }
        "jmp" => parse_jmp(&fields)?,
        "wait" => parse_wait(&fields, ctx)?,
        "in" => parse_in(&fields)?,
        "out" => parse_out(&fields)?,
        "push" | "pull" => parse_push_pull(&fields)?,
        "mov" => parse_mov(&fields, ctx)?,
        "irq" => parse_irq(&fields, ctx)?,
        "set" => parse_set(&fields)?,
        other => {
            return Err(PioError::UnknownInstruction {
                mnemonic: other.to_string(),
                span: mnemonic.span,
            });
        }
    };

    Ok((instr, delay_side))
}

/// Strip the trailing `[delay]` and `side N` suffixes and fold them into
/// the 5-bit delay/side-set value.
///
/// Suffix order matches the source language: `instr … side N [delay]`.
/// A lone `side` or `[N]` token is left in place so mnemonic dispatch can
/// report it as an unknown instruction.
fn parse_delay_side(fields: &mut Vec<Token<'_>>, ctx: &ParseContext) -> Result<u8, PioError> {
    let side_set = ctx.side_set;
    let mut combined: u8 = 0;

    if fields.len() > 1 && fields[fields.len() - 1].text.ends_with(']') {
        let tok = fields.pop().expect("len checked above");
        let inner = tok
            .text
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| PioError::Syntax {
                msg: format!("invalid delay '{}'", tok.text),
                span: tok.span,
            })?;
        let value = parse_int(inner).ok_or_else(|| PioError::Syntax {
            msg: format!("invalid delay '{}'", tok.text),
            span: tok.span,
        })?;
        let max = i64::from(side_set.max_delay());
        if !(0..=max).contains(&value) {
            return Err(PioError::OutOfRange {
                field: "delay",
                value,
                min: 0,
                max,
                span: tok.span,
            });
        }
        combined = value as u8;
    }

    if fields.len() > 2 && fields[fields.len() - 2].text == "side" {
        let value_tok = fields.pop().expect("len checked above");
        let side_tok = fields.pop().expect("len checked above");
        if side_set.count == 0 {
            return Err(PioError::Syntax {
                msg: String::from("no side_set count set"),
                span: side_tok.span,
            });
        }
        let value = parse_int(value_tok.text).ok_or_else(|| PioError::Syntax {
            msg: format!("invalid side-set value '{}'", value_tok.text),
            span: value_tok.span,
        })?;
        let max = (1i64 << side_set.count) - 1;
        if !(0..=max).contains(&value) {
            return Err(PioError::OutOfRange {
                field: "side-set value",
                value,
                min: 0,
                max,
                span: value_tok.span,
            });
        }
        combined |= (value as u8) << side_set.delay_bits();
        if side_set.optional {
            combined |= 0x10;
        }
    }

    Ok(combined)
}

fn parse_jmp(fields: &[Token<'_>]) -> Result<Instruction, PioError> {
    let (condition, target_tok) = match fields {
        [_, target] => (JmpCondition::Always, target),
        [_, cond, target] => {
            let condition =
                JmpCondition::parse(cond.text).ok_or_else(|| PioError::InvalidOperand {
                    field: "jmp condition",
                    value: cond.text.to_string(),
                    span: cond.span,
                })?;
            (condition, target)
        }
        _ => {
            return Err(PioError::Syntax {
                msg: String::from("jmp takes an optional condition and a target"),
                span: fields[0].span,
            });
        }
    };

    let target = if target_tok.text.starts_with(|c: char| c.is_ascii_digit()) {
        let addr = int_in_range(target_tok, "jmp target", 0, 31)?;
        JmpTarget::Address(addr as u8)
    } else {
        JmpTarget::Label {
            name: target_tok.text.to_string(),
            span: target_tok.span,
        }
    };

    Ok(Instruction::Jmp { condition, target })
}

fn parse_wait(fields: &[Token<'_>], ctx: &ParseContext) -> Result<Instruction, PioError> {
    if fields.len() < 3 {
        return Err(PioError::Syntax {
            msg: String::from("wait takes a polarity, a source, and an index"),
            span: fields[0].span,
        });
    }

    let polarity = int_in_range(&fields[1], "wait polarity", 0, 1)? as u8;
    let source_tok = &fields[2];
    let source = WaitSource::parse(source_tok.text).ok_or_else(|| PioError::InvalidOperand {
        field: "wait source",
        value: source_tok.text.to_string(),
        span: source_tok.span,
    })?;
    if source == WaitSource::JmpPin {
        require_version(ctx.version, PioVersion::V1, "wait jmppin", source_tok.span)?;
    }

    let (index, mode) = match source {
        WaitSource::Gpio | WaitSource::Pin => {
            if fields.len() != 4 {
                return Err(PioError::Syntax {
                    msg: format!("wait {} takes a single index", source_tok.text),
                    span: fields[0].span,
                });
            }
            let index = int_in_range(&fields[3], "wait index", 0, 31)? as u8;
            (index, IndexMode::Direct)
        }
        WaitSource::Irq => {
            if !(4..=5).contains(&fields.len()) {
                return Err(PioError::Syntax {
                    msg: String::from("wait irq takes an index and an optional modifier"),
                    span: fields[0].span,
                });
            }
            let index = int_in_range(&fields[3], "wait irq index", 0, 7)? as u8;
            let mode = match fields.get(4) {
                None => IndexMode::Direct,
                Some(tok) if tok.text == "rel" => IndexMode::Rel,
                Some(tok) if tok.text == "next" => {
                    require_version(ctx.version, PioVersion::V1, "wait irq next", tok.span)?;
                    IndexMode::Next
                }
                Some(tok) if tok.text == "prev" => {
                    require_version(ctx.version, PioVersion::V1, "wait irq prev", tok.span)?;
                    IndexMode::Prev
                }
                Some(tok) => {
                    return Err(PioError::InvalidOperand {
                        field: "wait irq modifier",
                        value: tok.text.to_string(),
                        span: tok.span,
                    });
                }
            };
            (index, mode)
        }
        WaitSource::JmpPin => {
            let offset = match fields.len() {
                3 => 0,
                5 if fields[3].text == "+" => int_in_range(&fields[4], "wait jmppin offset", 0, 3)?,
                _ => {
                    return Err(PioError::Syntax {
                        msg: String::from("wait jmppin takes an optional '+ offset'"),
                        span: fields[0].span,
                    });
                }
            };
            (offset as u8, IndexMode::Direct)
        }
    };

    Ok(Instruction::Wait {
        polarity,
        source,
        index,
        mode,
    })
}

fn parse_in(fields: &[Token<'_>]) -> Result<Instruction, PioError> {
    let [_, source_tok, count_tok] = fields else {
        return Err(PioError::Syntax {
            msg: String::from("in takes a source and a bit count"),
            span: fields[0].span,
        });
    };
    let source = InSource::parse(source_tok.text).ok_or_else(|| PioError::InvalidOperand {
        field: "in source",
        value: source_tok.text.to_string(),
        span: source_tok.span,
    })?;
    let bit_count = int_in_range(count_tok, "in count", 1, 32)? as u8;
    Ok(Instruction::In { source, bit_count })
}

fn parse_out(fields: &[Token<'_>]) -> Result<Instruction, PioError> {
    let [_, dest_tok, count_tok] = fields else {
        return Err(PioError::Syntax {
            msg: String::from("out takes a destination and a bit count"),
            span: fields[0].span,
        });
    };
    let destination =
        OutDestination::parse(dest_tok.text).ok_or_else(|| PioError::InvalidOperand {
            field: "out destination",
            value: dest_tok.text.to_string(),
            span: dest_tok.span,
        })?;
    let bit_count = int_in_range(count_tok, "out count", 1, 32)? as u8;
    Ok(Instruction::Out {
        destination,
        bit_count,
    })
}

fn parse_push_pull(fields: &[Token<'_>]) -> Result<Instruction, PioError> {
    let is_pull = fields[0].text == "pull";
    let mut i = 1;
    let mut conditional = false;
    let mut block = true;

    if i < fields.len() && matches!(fields[i].text, "iffull" | "ifempty") {
        conditional = true;
        i += 1;
    }
    if i < fields.len() && matches!(fields[i].text, "block" | "noblock") {
        block = fields[i].text == "block";
        i += 1;
    }
    if i != fields.len() {
        return Err(PioError::InvalidOperand {
            field: if is_pull { "pull operand" } else { "push operand" },
            value: fields[i].text.to_string(),
            span: fields[i].span,
        });
    }

    Ok(if is_pull {
        Instruction::Pull {
            if_empty: conditional,
            block,
        }
    } else {
        Instruction::Push {
            if_full: conditional,
            block,
        }
    })
}

fn parse_mov(fields: &[Token<'_>], ctx: &ParseContext) -> Result<Instruction, PioError> {
    if !(3..=4).contains(&fields.len()) {
        return Err(PioError::Syntax {
            msg: String::from("mov takes a destination and a source"),
            span: fields[0].span,
        });
    }

    let dest_tok = &fields[1];
    let src_tok = &fields[fields.len() - 1];

    // Version 1 special forms live in the push/pull opcode space and take
    // no operator, so they divert before the regular table lookups.
    if dest_tok.text.starts_with("rxfifo[") {
        require_version(ctx.version, PioVersion::V1, "mov rxfifo[]", dest_tok.span)?;
        require_fifo(
            ctx.fifo,
            FifoType::TxPut,
            "mov rxfifo[] destination",
            dest_tok.span,
        )?;
        if fields.len() != 3 || src_tok.text != "isr" {
            return Err(PioError::Syntax {
                msg: String::from("mov rxfifo[] source must be isr"),
                span: src_tok.span,
            });
        }
        let index = parse_rxfifo_index(dest_tok)?;
        return Ok(Instruction::MovToRxFifo { index });
    }
    if src_tok.text.starts_with("rxfifo[") {
        require_version(ctx.version, PioVersion::V1, "mov rxfifo[]", src_tok.span)?;
        require_fifo(
            ctx.fifo,
            FifoType::TxGet,
            "mov rxfifo[] source",
            src_tok.span,
        )?;
        if fields.len() != 3 || dest_tok.text != "osr" {
            return Err(PioError::Syntax {
                msg: String::from("mov rxfifo[] destination must be osr"),
                span: dest_tok.span,
            });
        }
        let index = parse_rxfifo_index(src_tok)?;
        return Ok(Instruction::MovFromRxFifo { index });
    }

    let destination =
        MovDestination::parse(dest_tok.text, ctx.version).ok_or_else(|| PioError::InvalidOperand {
            field: "mov destination",
            value: dest_tok.text.to_string(),
            span: dest_tok.span,
        })?;

    let (op, source_text) = if fields.len() == 4 {
        let op_tok = &fields[2];
        let op = match op_tok.text {
            "!" | "~" => MovOp::Invert,
            "::" => MovOp::Reverse,
            _ => {
                return Err(PioError::InvalidOperand {
                    field: "mov operator",
                    value: op_tok.text.to_string(),
                    span: op_tok.span,
                });
            }
        };
        (op, src_tok.text)
    } else if let Some(rest) = src_tok.text.strip_prefix("::") {
        (MovOp::Reverse, rest)
    } else if let Some(rest) = src_tok.text.strip_prefix(['!', '~']) {
        (MovOp::Invert, rest)
    } else {
        (MovOp::None, src_tok.text)
    };

    let source = MovSource::parse(source_text).ok_or_else(|| PioError::InvalidOperand {
        field: "mov source",
        value: source_text.to_string(),
        span: src_tok.span,
    })?;

    Ok(Instruction::Mov {
        destination,
        op,
        source,
    })
}

fn parse_rxfifo_index(tok: &Token<'_>) -> Result<RxIndex, PioError> {
    let inner = tok
        .text
        .strip_prefix("rxfifo[")
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| PioError::Syntax {
            msg: format!("malformed rxfifo selector '{}'", tok.text),
            span: tok.span,
        })?;
    if inner == "y" {
        return Ok(RxIndex::Y);
    }
    let value = parse_int(inner).ok_or_else(|| PioError::Syntax {
        msg: format!("malformed rxfifo selector '{}'", tok.text),
        span: tok.span,
    })?;
    if !(0..=7).contains(&value) {
        return Err(PioError::OutOfRange {
            field: "rxfifo index",
            value,
            min: 0,
            max: 7,
            span: tok.span,
        });
    }
    Ok(RxIndex::Immediate(value as u8))
}

fn parse_irq(fields: &[Token<'_>], ctx: &ParseContext) -> Result<Instruction, PioError> {
    let mut i = 1;
    let mut wait = false;
    let mut clear = false;
    if let Some(tok) = fields.get(i) {
        match tok.text {
            "set" => i += 1,
            "wait" => {
                wait = true;
                i += 1;
            }
            "clear" => {
                clear = true;
                i += 1;
            }
            _ => {}
        }
    }

    let mut mode = IndexMode::Direct;
    if let Some(tok) = fields.get(i) {
        match tok.text {
            "next" => {
                require_version(ctx.version, PioVersion::V1, "irq next", tok.span)?;
                mode = IndexMode::Next;
                i += 1;
            }
            "prev" => {
                require_version(ctx.version, PioVersion::V1, "irq prev", tok.span)?;
                mode = IndexMode::Prev;
                i += 1;
            }
            _ => {}
        }
    }

    let Some(index_tok) = fields.get(i) else {
        return Err(PioError::Syntax {
            msg: String::from("irq requires an index"),
            span: fields[0].span,
        });
    };
    let index = int_in_range(index_tok, "irq index", 0, 7)? as u8;
    i += 1;

    if let Some(tok) = fields.get(i) {
        if tok.text == "rel" {
            if mode != IndexMode::Direct {
                return Err(PioError::Syntax {
                    msg: String::from("rel cannot be combined with next/prev"),
                    span: tok.span,
                });
            }
            mode = IndexMode::Rel;
            i += 1;
        }
    }
    if i != fields.len() {
        return Err(PioError::InvalidOperand {
            field: "irq operand",
            value: fields[i].text.to_string(),
            span: fields[i].span,
        });
    }

    Ok(Instruction::Irq {
        wait,
        clear,
        index,
        mode,
    })
}

fn parse_set(fields: &[Token<'_>]) -> Result<Instruction, PioError> {
    let [_, dest_tok, value_tok] = fields else {
        return Err(PioError::Syntax {
            msg: String::from("set takes a destination and a value"),
            span: fields[0].span,
        });
    };
    let destination =
        SetDestination::parse(dest_tok.text).ok_or_else(|| PioError::InvalidOperand {
            field: "set destination",
            value: dest_tok.text.to_string(),
            span: dest_tok.span,
        })?;
    let value = int_in_range(value_tok, "set value", 0, 31)? as u8;
    Ok(Instruction::Set { destination, value })
}

// ─── Shared helpers ─────────────────────────────────────────────────────

fn expect_operands(fields: &[Token<'_>], count: usize, msg: &str) -> Result<(), PioError> {
    if fields.len() != count + 1 {
        return Err(PioError::Syntax {
            msg: msg.into(),
            span: fields[0].span,
        });
    }
    Ok(())
}

/// Parse a numeric token and bounds-check it inclusively.
pub(crate) fn int_in_range(
    tok: &Token<'_>,
    field: &'static str,
    min: i64,
    max: i64,
) -> Result<i64, PioError> {
    let value = parse_int(tok.text).ok_or_else(|| PioError::Syntax {
        msg: format!("expected a number for {}, got '{}'", field, tok.text),
        span: tok.span,
    })?;
    if !(min..=max).contains(&value) {
        return Err(PioError::OutOfRange {
            field,
            value,
            min,
            max,
            span: tok.span,
        });
    }
    Ok(value)
}

pub(crate) fn require_version(
    selected: PioVersion,
    required: PioVersion,
    construct: &str,
    span: Span,
) -> Result<(), PioError> {
    if selected < required {
        return Err(PioError::VersionRequired {
            construct: construct.into(),
            required,
            span,
        });
    }
    Ok(())
}

/// The `rxfifo[]` mov forms require the FIFO to be in `putget` or in the
/// direction-specific put/get mode.
fn require_fifo(
    fifo: FifoType,
    directional: FifoType,
    construct: &str,
    span: Span,
) -> Result<(), PioError> {
    if fifo != FifoType::PutGet && fifo != directional {
        return Err(PioError::Syntax {
            msg: format!(
                "{} requires .fifo {} or .fifo putget",
                construct,
                directional.as_str()
            ),
            span,
        });
    }
    Ok(())
}
