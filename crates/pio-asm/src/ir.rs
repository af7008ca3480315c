//! Intermediate representation for the PIO assembly pipeline.
//!
//! Operand classes are enumerated tagged variants with an explicit mapping
//! to their instruction field codes — every name the assembler accepts is a
//! variant here, and every gap in the hardware's code space is simply a name
//! that fails to parse.  The [`Instruction`] enum is the structured output
//! of the parser and the input to the encoder.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::error::Span;

/// PIO instruction-set revision.
///
/// Version 0 is the RP2040 PIO; version 1 (RP2350) adds `jmppin` waits,
/// `irq next`/`irq prev`, `mov pindirs`, the `rxfifo[]` mov forms, and
/// relaxed `.in`/`.out`/`.set` count bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PioVersion {
    /// RP2040 PIO.
    #[default]
    V0,
    /// RP2350 PIO.
    V1,
}

impl PioVersion {
    /// Parse a `.pio_version` argument.
    #[must_use]
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            0 => Some(PioVersion::V0),
            1 => Some(PioVersion::V1),
            _ => None,
        }
    }

    /// The numeric revision.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            PioVersion::V0 => 0,
            PioVersion::V1 => 1,
        }
    }
}

impl fmt::Display for PioVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// `jmp` condition — 3-bit field at bits 7:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JmpCondition {
    /// Unconditional (no condition written).
    #[default]
    Always,
    /// `!x` — scratch X is zero.
    XZero,
    /// `x--` — X non-zero before post-decrement.
    XDecNonZero,
    /// `!y` — scratch Y is zero.
    YZero,
    /// `y--` — Y non-zero before post-decrement.
    YDecNonZero,
    /// `x!=y` — scratch registers differ.
    XNotEqualY,
    /// `pin` — the EXECCTRL-selected jump pin is high.
    Pin,
    /// `!osre` — output shift register not empty.
    OsrNotEmpty,
}

impl JmpCondition {
    /// Parse a condition name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "!x" => Some(JmpCondition::XZero),
            "x--" => Some(JmpCondition::XDecNonZero),
            "!y" => Some(JmpCondition::YZero),
            "y--" => Some(JmpCondition::YDecNonZero),
            "x!=y" => Some(JmpCondition::XNotEqualY),
            "pin" => Some(JmpCondition::Pin),
            "!osre" => Some(JmpCondition::OsrNotEmpty),
            _ => None,
        }
    }

    /// The 3-bit condition code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            JmpCondition::Always => 0,
            JmpCondition::XZero => 1,
            JmpCondition::XDecNonZero => 2,
            JmpCondition::YZero => 3,
            JmpCondition::YDecNonZero => 4,
            JmpCondition::XNotEqualY => 5,
            JmpCondition::Pin => 6,
            JmpCondition::OsrNotEmpty => 7,
        }
    }
}

/// `wait` source — 2-bit field at bits 6:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitSource {
    /// An absolute GPIO index.
    Gpio,
    /// A pin relative to the state machine's IN pin mapping.
    Pin,
    /// A PIO IRQ flag.
    Irq,
    /// The EXECCTRL-selected jump pin, plus a 0–3 offset (version ≥ 1).
    JmpPin,
}

impl WaitSource {
    /// Parse a wait source name.  `jmppin` parses at any version; the
    /// caller applies the version gate so the error can say why.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gpio" => Some(WaitSource::Gpio),
            "pin" => Some(WaitSource::Pin),
            "irq" => Some(WaitSource::Irq),
            "jmppin" => Some(WaitSource::JmpPin),
            _ => None,
        }
    }

    /// The 2-bit source code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            WaitSource::Gpio => 0,
            WaitSource::Pin => 1,
            WaitSource::Irq => 2,
            WaitSource::JmpPin => 3,
        }
    }
}

/// `in` source — 3-bit field at bits 7:5.  Codes 4 and 5 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InSource {
    /// The mapped IN pins.
    Pins,
    /// Scratch register X.
    X,
    /// Scratch register Y.
    Y,
    /// All-zeroes.
    Null,
    /// The input shift register itself.
    Isr,
    /// The output shift register.
    Osr,
}

impl InSource {
    /// Parse an `in` source name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pins" => Some(InSource::Pins),
            "x" => Some(InSource::X),
            "y" => Some(InSource::Y),
            "null" => Some(InSource::Null),
            "isr" => Some(InSource::Isr),
            "osr" => Some(InSource::Osr),
            _ => None,
        }
    }

    /// The 3-bit source code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            InSource::Pins => 0,
            InSource::X => 1,
            InSource::Y => 2,
            InSource::Null => 3,
            InSource::Isr => 6,
            InSource::Osr => 7,
        }
    }
}

/// `out` destination — 3-bit field at bits 7:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutDestination {
    /// The mapped OUT pins.
    Pins,
    /// Scratch register X.
    X,
    /// Scratch register Y.
    Y,
    /// Discard the shifted bits.
    Null,
    /// The mapped OUT pin directions.
    Pindirs,
    /// The program counter (computed jump).
    Pc,
    /// The input shift register.
    Isr,
    /// Execute the shifted bits as an instruction.
    Exec,
}

impl OutDestination {
    /// Parse an `out` destination name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pins" => Some(OutDestination::Pins),
            "x" => Some(OutDestination::X),
            "y" => Some(OutDestination::Y),
            "null" => Some(OutDestination::Null),
            "pindirs" => Some(OutDestination::Pindirs),
            "pc" => Some(OutDestination::Pc),
            "isr" => Some(OutDestination::Isr),
            "exec" => Some(OutDestination::Exec),
            _ => None,
        }
    }

    /// The 3-bit destination code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            OutDestination::Pins => 0,
            OutDestination::X => 1,
            OutDestination::Y => 2,
            OutDestination::Null => 3,
            OutDestination::Pindirs => 4,
            OutDestination::Pc => 5,
            OutDestination::Isr => 6,
            OutDestination::Exec => 7,
        }
    }
}

/// `mov` destination — 3-bit field at bits 7:5.
///
/// Code 3 is reserved at version 0 and becomes `pindirs` at version 1,
/// which is why [`MovDestination::parse`] takes the selected revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovDestination {
    /// The mapped OUT pins.
    Pins,
    /// Scratch register X.
    X,
    /// Scratch register Y.
    Y,
    /// The mapped OUT pin directions (version ≥ 1).
    Pindirs,
    /// Execute the moved value as an instruction.
    Exec,
    /// The program counter (computed jump).
    Pc,
    /// The input shift register.
    Isr,
    /// The output shift register.
    Osr,
}

impl MovDestination {
    /// Parse a `mov` destination name under the given revision.
    #[must_use]
    pub fn parse(s: &str, version: PioVersion) -> Option<Self> {
        match s {
            "pins" => Some(MovDestination::Pins),
            "x" => Some(MovDestination::X),
            "y" => Some(MovDestination::Y),
            "pindirs" if version >= PioVersion::V1 => Some(MovDestination::Pindirs),
            "exec" => Some(MovDestination::Exec),
            "pc" => Some(MovDestination::Pc),
            "isr" => Some(MovDestination::Isr),
            "osr" => Some(MovDestination::Osr),
            _ => None,
        }
    }

    /// The 3-bit destination code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            MovDestination::Pins => 0,
            MovDestination::X => 1,
            MovDestination::Y => 2,
            MovDestination::Pindirs => 3,
            MovDestination::Exec => 4,
            MovDestination::Pc => 5,
            MovDestination::Isr => 6,
            MovDestination::Osr => 7,
        }
    }
}

/// `mov` source — 3-bit field at bits 2:0.  Code 4 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovSource {
    /// The mapped IN pins.
    Pins,
    /// Scratch register X.
    X,
    /// Scratch register Y.
    Y,
    /// All-zeroes.
    Null,
    /// The EXECCTRL/`.mov_status`-selected status value.
    Status,
    /// The input shift register.
    Isr,
    /// The output shift register.
    Osr,
}

impl MovSource {
    /// Parse a `mov` source name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pins" => Some(MovSource::Pins),
            "x" => Some(MovSource::X),
            "y" => Some(MovSource::Y),
            "null" => Some(MovSource::Null),
            "status" => Some(MovSource::Status),
            "isr" => Some(MovSource::Isr),
            "osr" => Some(MovSource::Osr),
            _ => None,
        }
    }

    /// The 3-bit source code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            MovSource::Pins => 0,
            MovSource::X => 1,
            MovSource::Y => 2,
            MovSource::Null => 3,
            MovSource::Status => 5,
            MovSource::Isr => 6,
            MovSource::Osr => 7,
        }
    }
}

/// `mov` operator — 2-bit field at bits 4:3, written as a prefix on the
/// source operand (`!`/`~` invert, `::` bit-reverse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovOp {
    /// Copy unchanged.
    #[default]
    None,
    /// Bitwise invert.
    Invert,
    /// Bit-reverse.
    Reverse,
}

impl MovOp {
    /// The 2-bit operator code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            MovOp::None => 0,
            MovOp::Invert => 1,
            MovOp::Reverse => 2,
        }
    }
}

/// `set` destination — 3-bit field at bits 7:5.  Only four names exist;
/// the remaining codes are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetDestination {
    /// The mapped SET pins.
    Pins,
    /// Scratch register X.
    X,
    /// Scratch register Y.
    Y,
    /// The mapped SET pin directions.
    Pindirs,
}

impl SetDestination {
    /// Parse a `set` destination name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pins" => Some(SetDestination::Pins),
            "x" => Some(SetDestination::X),
            "y" => Some(SetDestination::Y),
            "pindirs" => Some(SetDestination::Pindirs),
            _ => None,
        }
    }

    /// The 3-bit destination code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            SetDestination::Pins => 0,
            SetDestination::X => 1,
            SetDestination::Y => 2,
            SetDestination::Pindirs => 4,
        }
    }
}

/// IRQ index mode — 2-bit field at bits 4:3 of the 5-bit index field,
/// shared by `irq`, `wait irq`, and the `.mov_status irq` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexMode {
    /// The index is used as written.
    #[default]
    Direct,
    /// Index the previous state machine's IRQ (version ≥ 1).
    Prev,
    /// Add the state machine number to the low index bits.
    Rel,
    /// Index the next state machine's IRQ (version ≥ 1).
    Next,
}

impl IndexMode {
    /// The 2-bit mode code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            IndexMode::Direct => 0,
            IndexMode::Prev => 1,
            IndexMode::Rel => 2,
            IndexMode::Next => 3,
        }
    }
}

/// FIFO joining mode set by the `.fifo` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FifoType {
    /// Join according to the program's FIFO usage (the default).
    Auto,
    /// Keep TX and RX separate.
    TxRx,
    /// Join both queues into a deeper TX FIFO.
    Tx,
    /// Join both queues into a deeper RX FIFO.
    Rx,
    /// TX plus randomly writable RX entries (version ≥ 1).
    TxPut,
    /// TX plus randomly readable RX entries (version ≥ 1).
    TxGet,
    /// RX entries both written and read by the program (version ≥ 1).
    PutGet,
}

impl FifoType {
    /// Parse a `.fifo` mode name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FifoType::Auto),
            "txrx" => Some(FifoType::TxRx),
            "tx" => Some(FifoType::Tx),
            "rx" => Some(FifoType::Rx),
            "txput" => Some(FifoType::TxPut),
            "txget" => Some(FifoType::TxGet),
            "putget" => Some(FifoType::PutGet),
            _ => None,
        }
    }

    /// The minimum instruction-set revision that supports this mode.
    #[must_use]
    pub fn required_version(self) -> PioVersion {
        match self {
            FifoType::Auto | FifoType::TxRx | FifoType::Tx | FifoType::Rx => PioVersion::V0,
            FifoType::TxPut | FifoType::TxGet | FifoType::PutGet => PioVersion::V1,
        }
    }

    /// The directive spelling of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FifoType::Auto => "auto",
            FifoType::TxRx => "txrx",
            FifoType::Tx => "tx",
            FifoType::Rx => "rx",
            FifoType::TxPut => "txput",
            FifoType::TxGet => "txget",
            FifoType::PutGet => "putget",
        }
    }
}

impl fmt::Display for FifoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status source selected by `.mov_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovStatusType {
    /// All-ones while the TX FIFO level is below N.
    TxFifo,
    /// All-ones while the RX FIFO level is below N.
    RxFifo,
    /// All-ones while the selected IRQ flag is raised (version ≥ 1).
    Irq,
}

impl MovStatusType {
    /// The directive spelling of this source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MovStatusType::TxFifo => "txfifo",
            MovStatusType::RxFifo => "rxfifo",
            MovStatusType::Irq => "irq",
        }
    }
}

impl fmt::Display for MovStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bracket argument of a `mov rxfifo[…]` form: a 0–7 immediate or the
/// Y register — a 4-bit field where bit 3 selects Y-indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RxIndex {
    /// `rxfifo[0]` … `rxfifo[7]`.
    Immediate(u8),
    /// `rxfifo[y]`.
    Y,
}

impl RxIndex {
    /// The 4-bit index field.
    #[must_use]
    pub fn field(self) -> u16 {
        match self {
            RxIndex::Immediate(i) => u16::from(i),
            RxIndex::Y => 0b1000,
        }
    }
}

/// A `jmp` target: a resolved absolute address or a label reference the
/// fixup pass patches once every label's position is known.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JmpTarget {
    /// A numeric instruction-memory address (0–31).
    Address(u8),
    /// A label reference, carrying the reference site for diagnostics.
    Label {
        /// The label name.
        name: String,
        /// Where the reference appeared.
        span: Span,
    },
}

/// A parsed PIO instruction, before the shared delay/side-set field is
/// merged in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// `nop` — assembles as `mov y, y`.
    Nop,
    /// `jmp [cond,] target`.
    Jmp {
        /// Branch condition (always-taken when omitted).
        condition: JmpCondition,
        /// Branch target.
        target: JmpTarget,
    },
    /// `wait polarity source index`.
    Wait {
        /// The polarity to wait for (0 or 1).
        polarity: u8,
        /// What to watch.
        source: WaitSource,
        /// Pin/GPIO/IRQ index, or the jmppin offset.
        index: u8,
        /// IRQ index mode (`rel`/`next`/`prev`); `Direct` otherwise.
        mode: IndexMode,
    },
    /// `in source, count`.
    In {
        /// Shift source.
        source: InSource,
        /// Bit count, 1–32.
        bit_count: u8,
    },
    /// `out destination, count`.
    Out {
        /// Shift destination.
        destination: OutDestination,
        /// Bit count, 1–32.
        bit_count: u8,
    },
    /// `push [iffull] [block|noblock]`.
    Push {
        /// Only push when the ISR threshold was reached.
        if_full: bool,
        /// Stall while the RX FIFO is full.
        block: bool,
    },
    /// `pull [ifempty] [block|noblock]`.
    Pull {
        /// Only pull when the OSR threshold was reached.
        if_empty: bool,
        /// Stall while the TX FIFO is empty.
        block: bool,
    },
    /// `mov destination, [op]source`.
    Mov {
        /// Move destination.
        destination: MovDestination,
        /// Operator applied in transit.
        op: MovOp,
        /// Move source.
        source: MovSource,
    },
    /// `mov rxfifo[index], isr` (version ≥ 1).
    MovToRxFifo {
        /// RX FIFO entry selector.
        index: RxIndex,
    },
    /// `mov osr, rxfifo[index]` (version ≥ 1).
    MovFromRxFifo {
        /// RX FIFO entry selector.
        index: RxIndex,
    },
    /// `irq [set|wait|clear] [next|prev] index [rel]`.
    Irq {
        /// Stall until the raised flag is cleared again.
        wait: bool,
        /// Clear the flag instead of raising it.
        clear: bool,
        /// IRQ index, 0–7.
        index: u8,
        /// Index mode from `rel`/`next`/`prev`.
        mode: IndexMode,
    },
    /// `set destination, value`.
    Set {
        /// Set destination.
        destination: SetDestination,
        /// Immediate value, 0–31.
        value: u8,
    },
}
