//! NeoPixel background driver — a realistic side-set-heavy program,
//! rendered as an embeddable C snippet with source annotations.
//!
//! NeoPixels are 800 kHz bit streams; zeros are encoded as a short high
//! pulse, ones as a long one, with side-set driving the data pin while
//! the shift logic runs.
//!
//! Run with: `cargo run --example neopixel`

use pio_asm::Program;

const SOURCE: &str = "
.side_set 1 opt
.wrap_target
    pull block          side 0
    out y, 16           side 0      ; get count of NeoPixel bits

bitloop:
    pull ifempty        side 0      ; drive low
    out x 1             side 0 [5]
    jmp !x do_zero      side 1 [3]  ; drive high and branch depending on bit val
    jmp y--, bitloop    side 1 [4]  ; drive high for a one (long pulse)
    jmp end_sequence    side 0      ; sequence is over

do_zero:
    jmp y--, bitloop    side 0 [4]  ; drive low for a zero (short pulse)

end_sequence:
    pull block          side 0      ; get fresh 16 bit delay value
    out y, 16           side 0      ; get delay count
wait_reset:
    jmp y--, wait_reset side 0      ; wait until delay elapses
.wrap
";

fn main() {
    let program = Program::assemble_with_debug_info(SOURCE).unwrap();

    println!("{} words, wrap {:?} -> {:?}", program.len(), program.config().wrap_target, program.config().wrap);
    println!();
    print!("{}", program.c_program("neopixel"));
}
