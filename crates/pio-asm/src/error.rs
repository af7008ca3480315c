//! Error types and source-span tracking for diagnostics.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::ir::PioVersion;

/// Source location for diagnostics.
///
/// Tracks the line, column, byte offset, and length of a token or construct
/// in the original PIO source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (byte offset within line).
    pub col: u32,
    /// 0-based byte offset from start of source.
    pub offset: usize,
    /// Byte length of the spanned region.
    pub len: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub fn new(line: u32, col: u32, offset: usize, len: usize) -> Self {
        Self {
            line,
            col,
            offset,
            len,
        }
    }

    /// A dummy span for generated/internal constructs.
    #[must_use]
    pub fn dummy() -> Self {
        Self {
            line: 0,
            col: 0,
            offset: 0,
            len: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Assembly error with source location and descriptive message.
///
/// Each variant corresponds to one failure class: malformed syntax,
/// an operand name that is not legal in its context, a numeric field
/// outside its bit width, a construct gated on a newer instruction-set
/// revision, a misordered global directive, or a jump to a label that
/// was never defined.  Assembly is all-or-nothing: the first error
/// aborts the compilation with no partial output.
///
/// Serializable (not deserializable) under the `serde` feature: the
/// field names carried by value/range errors are static strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PioError {
    /// Malformed line structure or an otherwise unclassifiable construct.
    Syntax {
        /// The syntax error message.
        msg: String,
        /// Source location of the syntax error.
        span: Span,
    },

    /// Unknown instruction mnemonic.
    UnknownInstruction {
        /// The mnemonic that was not recognized.
        mnemonic: String,
        /// Source location of the unknown mnemonic.
        span: Span,
    },

    /// A recognized field holds a name that is not legal in its context.
    InvalidOperand {
        /// The field being parsed (e.g. "mov source", "jmp condition").
        field: &'static str,
        /// The operand text that did not match any legal token.
        value: String,
        /// Source location of the operand.
        span: Span,
    },

    /// A numeric field is outside the range its bit width allows.
    OutOfRange {
        /// The field being encoded (e.g. "delay", "side-set value").
        field: &'static str,
        /// The out-of-range value.
        value: i64,
        /// Minimum allowed value (inclusive).
        min: i64,
        /// Maximum allowed value (inclusive).
        max: i64,
        /// Source location of the value.
        span: Span,
    },

    /// A construct requires a newer instruction-set revision than selected.
    VersionRequired {
        /// The construct that is version-gated (e.g. "irq next").
        construct: String,
        /// The minimum revision that supports it.
        required: PioVersion,
        /// Source location of the construct.
        span: Span,
    },

    /// A global-configuration directive appeared after the first instruction.
    DirectiveOrder {
        /// The misordered directive (e.g. ".side_set").
        directive: String,
        /// Source location of the directive.
        span: Span,
    },

    /// Label was defined more than once, in either namespace.
    DuplicateLabel {
        /// The duplicated label name.
        label: String,
        /// Source location of the duplicate definition.
        span: Span,
        /// Source location of the first definition.
        first_span: Span,
    },

    /// A jump referenced a label that was never defined.
    UndefinedLabel {
        /// The undefined label name.
        label: String,
        /// Source location of the reference.
        span: Span,
    },
}

impl fmt::Display for PioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PioError::Syntax { msg, span } => {
                write!(f, "{}: {}", span, msg)
            }
            PioError::UnknownInstruction { mnemonic, span } => {
                write!(f, "{}: unknown instruction '{}'", span, mnemonic)
            }
            PioError::InvalidOperand { field, value, span } => {
                write!(f, "{}: invalid {} '{}'", span, field, value)
            }
            PioError::OutOfRange {
                field,
                value,
                min,
                max,
                span,
            } => {
                write!(
                    f,
                    "{}: {} value {} out of range [{}..{}]",
                    span, field, value, min, max
                )
            }
            PioError::VersionRequired {
                construct,
                required,
                span,
            } => {
                write!(
                    f,
                    "{}: {} requires .pio_version {}",
                    span, construct, required
                )
            }
            PioError::DirectiveOrder { directive, span } => {
                write!(
                    f,
                    "{}: {} must appear before the first instruction",
                    span, directive
                )
            }
            PioError::DuplicateLabel {
                label,
                span,
                first_span,
            } => {
                write!(
                    f,
                    "{}: duplicate label '{}' (first defined at {})",
                    span, label, first_span
                )
            }
            PioError::UndefinedLabel { label, span } => {
                write!(f, "{}: jump to undefined label '{}'", span, label)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PioError {}
