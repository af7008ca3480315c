#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz the one-shot assembler — must never panic, only return Ok/Err.
    let _ = pio_asm::assemble(data);

    // The debug-info path keeps a line map and the source text; it must
    // agree with the plain path on whether the input is valid.
    let plain = pio_asm::Program::assemble(data);
    let debug = pio_asm::Program::assemble_with_debug_info(data);
    assert_eq!(plain.is_ok(), debug.is_ok());
    if let (Ok(plain), Ok(debug)) = (plain, debug) {
        assert_eq!(plain.words(), debug.words());
        // Every error-free program renders.
        let _ = debug.c_program("fuzz");
    }
});
