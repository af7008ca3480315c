//! Compile-time PIO assembly with the `pio_words!` and `pio_array!` macros.
//!
//! The programs below are assembled while this file compiles; a syntax
//! error in the PIO source is a Rust compile error pointing at the string
//! literal.
//!
//! Run with: `cargo run --example compile_time_pio -p pio-asm-macros`

use pio_asm_macros::{pio_array, pio_words};

/// A squarewave on one side-set pin.
const SQUAREWAVE: &[u16] = pio_words!(
    "
    .side_set 1
    top:
        nop side 1 [15]
        jmp top side 0 [15]
    "
);

/// Classic WS2812 bit-banging loop.
const WS2812: &[u16] = pio_words!(
    "
    .side_set 1
    .wrap_target
    bitloop:
        out x, 1       side 0 [2]
        jmp !x do_zero side 1 [1]
        jmp bitloop    side 1 [4]
    do_zero:
        nop            side 0 [4]
    .wrap
    "
);

/// One-word init sequence as a sized array.
const INIT: [u16; 1] = pio_array!("set pindirs, 1");

fn main() {
    println!("squarewave: {:04x?}", SQUAREWAVE);
    println!("ws2812:     {:04x?}", WS2812);
    println!("init:       {:04x?}", INIT);
}
