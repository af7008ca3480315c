//! Performance benchmarks for `pio_asm`.
//!
//! Measures:
//! - Single instruction latency
//! - Full-program assembly (a realistic driver program)
//! - Label-heavy workloads (every instruction jump-targeted)
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use pio_asm::{assemble, Program};

// A realistic program: the NeoPixel background driver from the examples.
const NEOPIXEL: &str = "
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

fn bench_single_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_instruction");

    group.bench_function("nop", |b| b.iter(|| assemble(black_box("nop")).unwrap()));

    group.bench_function("jmp_label", |b| {
        b.iter(|| assemble(black_box("loop:\njmp loop")).unwrap())
    });

    group.bench_function("mov_invert", |b| {
        b.iter(|| assemble(black_box("mov x, !x")).unwrap())
    });

    group.bench_function("sideset_delay", |b| {
        b.iter(|| assemble(black_box(".side_set 2\nout pins 17 side 2 [5]")).unwrap())
    });

    group.finish();
}

fn bench_full_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_program");
    group.throughput(Throughput::Bytes(NEOPIXEL.len() as u64));

    group.bench_function("neopixel", |b| {
        b.iter(|| assemble(black_box(NEOPIXEL)).unwrap())
    });

    group.bench_function("neopixel_with_debug_info", |b| {
        b.iter(|| Program::assemble_with_debug_info(black_box(NEOPIXEL)).unwrap())
    });

    group.finish();
}

/// Generate a 32-word program where every instruction is a jump target.
fn gen_label_heavy() -> String {
    let mut s = String::with_capacity(32 * 24);
    for i in 0..32 {
        s.push_str(&format!("l{}:\n    jmp l{}\n", i, (i + 7) % 32));
    }
    s
}

fn bench_label_heavy(c: &mut Criterion) {
    let source = gen_label_heavy();
    let mut group = c.benchmark_group("label_heavy");
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("32_labels_32_jumps", |b| {
        b.iter(|| assemble(black_box(&source)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_instruction,
    bench_full_program,
    bench_label_heavy
);
criterion_main!(benches);
