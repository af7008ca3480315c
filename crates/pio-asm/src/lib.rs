//! # pio-asm — Pure Rust PIO Assembler
//!
//! `pio-asm` is a pure Rust, zero-dependency runtime assembler that turns
//! PIO (programmable I/O) assembly text into the 16-bit machine words the
//! RP2040/RP2350 state machines execute, plus the directive-derived
//! configuration a driver needs before loading the program.
//!
//! ## Quick Start
//!
//! ```rust
//! let words = pio_asm::assemble("nop").unwrap();
//! assert_eq!(words, vec![0b101_00000_010_00_010]);
//! ```
//!
//! Programs that use directives return their configuration through
//! [`Program`]:
//!
//! ```rust
//! use pio_asm::Program;
//!
//! let program = Program::assemble(
//!     "
//!     .program square
//!     .side_set 1
//!     .wrap_target
//!         nop side 0 [1]
//!         nop side 1 [1]
//!     .wrap
//!     ",
//! )
//! .unwrap();
//!
//! assert_eq!(program.len(), 2);
//! assert_eq!(program.config().wrap, Some(1));
//! assert_eq!(program.config().sideset_pin_count, Some(1));
//! ```
//!
//! ## Features
//!
//! - **Pure Rust** — no C toolchain, no code generation step at build time.
//! - **Both PIO revisions** — version 0 (RP2040) and version 1 (RP2350)
//!   encodings, selected with `.pio_version`.
//! - **Two-pass label resolution** — forward and backward `jmp` targets,
//!   `public` label export.
//! - **`no_std` + `alloc`** — usable from firmware; the `std` feature only
//!   adds `std::error::Error` on [`PioError`].
//! - **Span diagnostics** — every error points at the offending line and
//!   column of the source text.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Lint policy ──────────────────────────────────────────────────────────
// An assembler is dense with narrowing casts between small integer widths
// and with bit patterns written as unseparated binary literals; these lints
// are expected and acceptable in this context.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

extern crate alloc;

/// Two-pass resolver, fixups, and the assembled `Program`.
pub mod assembler;
/// Per-instruction bit packing and the shared delay/side-set field.
pub mod encoder;
/// Error types and source-span diagnostics.
pub mod error;
/// Operand tables, instruction IR, and the revision type.
pub mod ir;
/// Line scanner and integer-literal parsing.
pub mod lexer;
/// Instruction-line parsing and validation.
pub mod parser;

// Re-exports
pub use assembler::{Program, SmConfig};
pub use error::{PioError, Span};
pub use ir::{
    FifoType, IndexMode, InSource, Instruction, JmpCondition, JmpTarget, MovDestination, MovOp,
    MovSource, MovStatusType, OutDestination, PioVersion, RxIndex, SetDestination, WaitSource,
};
pub use parser::SideSet;

use alloc::vec::Vec;

/// Assemble PIO source text into machine words.
///
/// Newlines separate instructions; labels are defined with a trailing
/// colon (`loop:`); comments run from `;` to end of line.  Prefer
/// [`Program::assemble`] when the caller also needs the directive-derived
/// configuration (side-set geometry, wrap points, shift setup, …).
///
/// # Errors
///
/// Returns [`PioError`] if the input contains syntax errors, unknown
/// instructions or operand names, out-of-range field values, misordered
/// directives, or undefined jump targets.
///
/// # Examples
///
/// ```rust
/// let words = pio_asm::assemble("set pindirs, 1").unwrap();
/// assert_eq!(words, vec![0b111_00000_100_00001]);
/// ```
pub fn assemble(source: &str) -> Result<Vec<u16>, PioError> {
    Ok(Program::assemble(source)?.into_words())
}
