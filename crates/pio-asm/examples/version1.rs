//! RP2350 (version 1) instruction-set extensions: put/get FIFO access,
//! next/prev IRQ indexing, and the relaxed shift-count bounds.
//!
//! Run with: `cargo run --example version1`

use pio_asm::Program;

fn main() {
    let program = Program::assemble(
        "
.program scatter_gather
.pio_version 1
.fifo putget
.in 8 right auto 8

.wrap_target
    mov rxfifo[y], isr      ; scatter into a FIFO slot picked by Y
    mov osr, rxfifo[0]      ; gather slot 0 back
    irq next 3              ; poke the next state machine
    wait 0 irq 2 prev
.wrap
",
    )
    .unwrap();

    for (i, word) in program.words().iter().enumerate() {
        println!("{:02}: 0x{:04x} = {:#018b}", i, word, word);
    }
    println!();
    println!(
        "pio_version={:?} fifo={:?} push_threshold={:?}",
        program.config().pio_version,
        program.config().fifo_type,
        program.config().push_threshold,
    );
}
