//! Property-based tests using proptest.
//!
//! These verify assembler invariants across generated input spaces:
//! determinism, no-panic on arbitrary text, and the field round-trip —
//! decoding an emitted word against the documented bit layout must
//! reproduce the operand values that were encoded.

use pio_asm::{assemble, Program};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

/// Arbitrary ASCII input — the assembler must reject or accept it without
/// panicking.
fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::char::range('\0', '\x7f'), 0..256)
        .prop_map(|v| v.into_iter().collect())
}

/// Valid instruction lines drawn from a curated pool.
fn valid_instruction() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "nop",
        "nop [7]",
        "jmp 0",
        "jmp 31",
        "wait 0 gpio 5",
        "wait 1 pin 30",
        "wait 0 irq 7 rel",
        "in pins, 1",
        "in isr, 32",
        "in null, 9",
        "out pins, 1",
        "out exec, 32",
        "out pc, 17",
        "push",
        "push iffull noblock",
        "pull block",
        "pull ifempty",
        "mov x, y",
        "mov x, !x",
        "mov osr, ::pins",
        "mov pc, status",
        "irq 0",
        "irq wait 3",
        "irq clear 7 rel",
        "set pins, 0",
        "set pindirs, 31",
        "set y, 5",
    ])
}

fn field(word: u16, shift: u16, bits: u16) -> u16 {
    (word >> shift) & ((1 << bits) - 1)
}

// ── Robustness ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn arbitrary_input_never_panics(source in arb_source()) {
        let _ = assemble(&source);
        let _ = Program::assemble_with_debug_info(&source);
    }

    #[test]
    fn valid_programs_assemble_deterministically(
        lines in prop::collection::vec(valid_instruction(), 1..32)
    ) {
        let source = lines.join("\n");
        let first = assemble(&source).expect("pool contains only valid instructions");
        let second = assemble(&source).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), lines.len());
    }
}

// ── Field round-trips ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn jmp_round_trip(cond_idx in 0usize..8, target in 0u16..32) {
        let conditions = ["", "!x,", "x--,", "!y,", "y--,", "x!=y,", "pin,", "!osre,"];
        let source = format!("jmp {} {}", conditions[cond_idx], target);
        let word = assemble(&source).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b000);
        prop_assert_eq!(field(word, 5, 3), cond_idx as u16);
        prop_assert_eq!(field(word, 0, 5), target);
    }

    #[test]
    fn wait_round_trip(polarity in 0u16..2, source_idx in 0usize..3, index in 0u16..8) {
        let sources = ["gpio", "pin", "irq"];
        let text = format!("wait {} {} {}", polarity, sources[source_idx], index);
        let word = assemble(&text).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b001);
        prop_assert_eq!(field(word, 7, 1), polarity);
        prop_assert_eq!(field(word, 5, 2), source_idx as u16);
        prop_assert_eq!(field(word, 0, 5), index);
    }

    #[test]
    fn in_round_trip(src_idx in 0usize..6, count in 1u16..=32) {
        let sources = [("pins", 0u16), ("x", 1), ("y", 2), ("null", 3), ("isr", 6), ("osr", 7)];
        let (name, code) = sources[src_idx];
        let word = assemble(&format!("in {}, {}", name, count)).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b010);
        prop_assert_eq!(field(word, 5, 3), code);
        prop_assert_eq!(field(word, 0, 5), count & 0x1F);
    }

    #[test]
    fn out_round_trip(dst_idx in 0usize..8, count in 1u16..=32) {
        let dests = ["pins", "x", "y", "null", "pindirs", "pc", "isr", "exec"];
        let word = assemble(&format!("out {}, {}", dests[dst_idx], count)).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b011);
        prop_assert_eq!(field(word, 5, 3), dst_idx as u16);
        prop_assert_eq!(field(word, 0, 5), count & 0x1F);
    }

    #[test]
    fn push_pull_round_trip(pull in proptest::bool::ANY, conditional in proptest::bool::ANY, block in proptest::bool::ANY) {
        let mut text = String::from(if pull { "pull" } else { "push" });
        if conditional {
            text.push_str(if pull { " ifempty" } else { " iffull" });
        }
        text.push_str(if block { " block" } else { " noblock" });
        let word = assemble(&text).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b100);
        prop_assert_eq!(field(word, 7, 1), u16::from(pull));
        prop_assert_eq!(field(word, 6, 1), u16::from(conditional));
        prop_assert_eq!(field(word, 5, 1), u16::from(block));
        prop_assert_eq!(field(word, 0, 5), 0);
    }

    #[test]
    fn mov_round_trip(dst_idx in 0usize..7, op_idx in 0usize..3, src_idx in 0usize..7) {
        let dests = [("pins", 0u16), ("x", 1), ("y", 2), ("exec", 4), ("pc", 5), ("isr", 6), ("osr", 7)];
        let srcs = [("pins", 0u16), ("x", 1), ("y", 2), ("null", 3), ("status", 5), ("isr", 6), ("osr", 7)];
        let ops = [("", 0u16), ("!", 1), ("::", 2)];
        let (dst, dst_code) = dests[dst_idx];
        let (src, src_code) = srcs[src_idx];
        let (op, op_code) = ops[op_idx];
        let word = assemble(&format!("mov {}, {}{}", dst, op, src)).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b101);
        prop_assert_eq!(field(word, 5, 3), dst_code);
        prop_assert_eq!(field(word, 3, 2), op_code);
        prop_assert_eq!(field(word, 0, 3), src_code);
    }

    #[test]
    fn irq_round_trip(mode_idx in 0usize..3, index in 0u16..8, rel in proptest::bool::ANY) {
        let modes = ["set", "wait", "clear"];
        let text = format!(
            "irq {} {}{}",
            modes[mode_idx],
            index,
            if rel { " rel" } else { "" }
        );
        let word = assemble(&text).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b110);
        prop_assert_eq!(field(word, 6, 1), u16::from(mode_idx == 2)); // clear
        prop_assert_eq!(field(word, 5, 1), u16::from(mode_idx == 1)); // wait
        prop_assert_eq!(field(word, 3, 2), if rel { 0b10 } else { 0b00 });
        prop_assert_eq!(field(word, 0, 3), index);
    }

    #[test]
    fn set_round_trip(dst_idx in 0usize..4, value in 0u16..32) {
        let dests = [("pins", 0u16), ("x", 1), ("y", 2), ("pindirs", 4)];
        let (dst, code) = dests[dst_idx];
        let word = assemble(&format!("set {}, {}", dst, value)).unwrap()[0];
        prop_assert_eq!(field(word, 13, 3), 0b111);
        prop_assert_eq!(field(word, 5, 3), code);
        prop_assert_eq!(field(word, 0, 5), value);
    }

    #[test]
    fn delay_round_trip(delay in 0u16..32) {
        let word = assemble(&format!("nop [{}]", delay)).unwrap()[0];
        prop_assert_eq!(field(word, 8, 5), delay);
        prop_assert_eq!(word & !0x1F00, 0b101_00000_010_00_010);
    }

    #[test]
    fn side_set_round_trip(count in 1u16..=5, value in 0u16..32, optional in proptest::bool::ANY) {
        prop_assume!(value < (1 << count));
        let directive = if optional { format!(".side_set {count} opt") } else { format!(".side_set {count}") };
        let source = format!("{directive}\nnop side {value}");
        let word = assemble(&source).unwrap()[0];
        let delay_bits = 5u16.saturating_sub(count + u16::from(optional));
        let mut expected = value << delay_bits;
        if optional {
            expected |= 0x10;
        }
        prop_assert_eq!(field(word, 8, 5), expected);
    }

    #[test]
    fn boundary_rejections(excess in 1u16..100) {
        prop_assert!(assemble(&format!("nop [{}]", 31 + excess)).is_err(), "delay out of range should be rejected");
        prop_assert!(assemble(&format!("set x, {}", 31 + excess)).is_err(), "set value out of range should be rejected");
        prop_assert!(assemble(&format!("irq {}", 7 + excess)).is_err(), "irq index out of range should be rejected");
        prop_assert!(assemble(&format!("in pins, {}", 32 + excess)).is_err(), "in count out of range should be rejected");
        prop_assert!(assemble(&format!("out pins, {}", 32 + excess)).is_err(), "out count out of range should be rejected");
        prop_assert!(assemble(&format!("jmp {}", 31 + excess)).is_err(), "jmp target out of range should be rejected");
    }
}
