//! Hello PIO — the canonical "drive one output pin from the FIFO" program.
//!
//! Run with: `cargo run --example hello`

use pio_asm::Program;

fn main() {
    let program = Program::assemble(
        "
.program hello
loop:
    pull
    out pins, 1
    jmp loop
",
    )
    .unwrap();

    println!("program: {}", program.name().unwrap());
    print!("words:  ");
    for word in program.words() {
        print!(" 0x{:04x}", word);
    }
    println!();

    // The driver consumes the directive-derived configuration alongside
    // the words; unset options fall back to the hardware defaults.
    println!("config:  {:?}", program.config());
}
