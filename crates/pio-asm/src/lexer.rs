//! Line scanner for PIO assembly source.
//!
//! PIO assembly is strictly line-oriented: every line is blank, a comment,
//! a directive (leading `.`), a label definition (trailing `:`), or an
//! instruction.  The scanner strips `;` comments, classifies each line, and
//! splits directive/instruction lines into fields on commas and whitespace.
//! Every field carries its [`Span`] so later passes can point error messages
//! back at the exact source location.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{PioError, Span};

/// A single field of a directive or instruction line.
///
/// Field text is borrowed from the source string — the scanner never
/// allocates per-token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// Source text of the field.
    pub text: &'src str,
    /// Source location.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Returns the token text as a `&str`.
    #[inline]
    pub fn text(&self) -> &str {
        self.text
    }
}

/// Classification of one significant source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'src> {
    /// A directive line: `.name arg arg …`.
    Directive {
        /// The directive name, including the leading `.`.
        name: Token<'src>,
        /// The directive arguments.
        args: Vec<Token<'src>>,
    },
    /// A label definition: `name:` or `public name:`.
    Label {
        /// The label name (without the trailing `:`).
        name: Token<'src>,
        /// Whether the definition carried the `public` prefix.
        public: bool,
    },
    /// An instruction line, split into fields.
    Instruction {
        /// The mnemonic followed by its operands and suffixes.
        fields: Vec<Token<'src>>,
    },
}

/// A classified source line with its 0-based line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'src> {
    /// 0-based index of the line in the original source.
    pub index: u32,
    /// The line's classification.
    pub kind: LineKind<'src>,
}

/// Scan PIO source text into classified lines.
///
/// Comment text (`;` to end of line) is discarded, surrounding whitespace is
/// trimmed, and blank lines are dropped.  The returned lines preserve source
/// order; label and directive lines consume no instruction word.
///
/// # Errors
///
/// Returns [`PioError::Syntax`] for a malformed label definition.
pub fn scan(source: &str) -> Result<Vec<SourceLine<'_>>, PioError> {
    let mut lines = Vec::new();
    let mut line_start = 0usize;

    for (index, raw) in source.split('\n').enumerate() {
        let line_no = index as u32 + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        // Comment runs from ';' to end of line.
        let code = match line.find(';') {
            Some(at) => &line[..at],
            None => line,
        };

        if !code.trim().is_empty() {
            let kind = classify(code, line_no, line_start)?;
            lines.push(SourceLine {
                index: index as u32,
                kind,
            });
        }

        line_start += raw.len() + 1;
    }

    Ok(lines)
}

/// Classify one non-blank line (comment already stripped).
fn classify<'src>(
    code: &'src str,
    line_no: u32,
    line_start: usize,
) -> Result<LineKind<'src>, PioError> {
    let fields = split_fields(code, line_no, line_start);
    if fields.is_empty() {
        // Non-blank but separator-only, e.g. a line of commas.
        return Err(PioError::Syntax {
            msg: format!("malformed line '{}'", code.trim()),
            span: Span::new(line_no, 1, line_start, code.trim_end().len()),
        });
    }

    if code.trim_end().ends_with(':') {
        return classify_label(&fields, line_no, line_start, code);
    }

    if fields[0].text.starts_with('.') {
        let name = fields[0];
        let args = fields[1..].to_vec();
        return Ok(LineKind::Directive { name, args });
    }

    Ok(LineKind::Instruction { fields })
}

fn classify_label<'src>(
    fields: &[Token<'src>],
    line_no: u32,
    line_start: usize,
    code: &str,
) -> Result<LineKind<'src>, PioError> {
    let (public, name_tok) = match fields {
        [name] => (false, *name),
        [prefix, name] if prefix.text == "public" => (true, *name),
        _ => {
            return Err(PioError::Syntax {
                msg: format!("malformed label definition '{}'", code.trim()),
                span: Span::new(line_no, 1, line_start, code.trim_end().len()),
            });
        }
    };

    let name = name_tok.text.strip_suffix(':').unwrap_or(name_tok.text);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(PioError::Syntax {
            msg: format!("invalid label name '{}'", name),
            span: name_tok.span,
        });
    }

    let mut span = name_tok.span;
    span.len = name.len();
    Ok(LineKind::Label {
        name: Token { text: name, span },
        public,
    })
}

/// Split a line into fields on runs of whitespace and/or commas.
///
/// This mirrors the source-language convention where `mov x, y`, `mov x,y`
/// and `mov x y` are all equivalent.  Prefix operators (`!`, `~`, `::`) stay
/// attached to their operand; the instruction parser peels them off.
fn split_fields<'src>(code: &'src str, line_no: u32, line_start: usize) -> Vec<Token<'src>> {
    let mut fields = Vec::new();
    let bytes = code.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if matches!(bytes[pos], b' ' | b'\t' | b',') {
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b' ' | b'\t' | b',') {
            pos += 1;
        }
        fields.push(Token {
            text: &code[start..pos],
            span: Span::new(
                line_no,
                start as u32 + 1,
                line_start + start,
                pos - start,
            ),
        });
    }

    fields
}

/// Parse an integer literal.
///
/// Accepts decimal, `0x`/`0X` hex, `0b`/`0B` binary, `0o`/`0O` octal, and
/// bare leading-zero octal (`010` is 8), with an optional leading minus.
/// Returns `None` for anything else.
#[must_use]
pub fn parse_int(text: &str) -> Option<i64> {
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() {
        return None;
    }

    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if neg { -value } else { value })
}

/// Format a parsed field list back into a canonical string, for error
/// messages that quote a whole construct (e.g. version gating on `.fifo`).
pub(crate) fn join_fields(fields: &[Token<'_>]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(field.text);
    }
    out
}
