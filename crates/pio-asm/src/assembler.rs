//! Two-pass assembler driver and the assembled [`Program`].
//!
//! Pass 1 walks every source line once, registering label positions (in
//! instruction-word-index space, not line numbers) and folding directive
//! state into the assembler.  Pass 2 re-walks the captured instruction
//! lines, encodes each into a 16-bit word, and appends it.  Jumps to labels
//! are emitted with a zero target and recorded as fixups; a final pass
//! patches the low five bits of each affected word once every label is
//! known.  The word sequence is immutable from then on.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write as _;

use crate::encoder;
use crate::error::{PioError, Span};
use crate::ir::{FifoType, Instruction, JmpTarget, MovStatusType, PioVersion};
use crate::lexer::{self, join_fields, LineKind, Token};
use crate::parser::{self, int_in_range, require_version, ParseContext, SideSet};

/// Configuration derived from directives, consumed by the state-machine
/// driver alongside the assembled words.
///
/// Every field except `sideset_enable` is optional: `None` means the
/// corresponding directive never appeared and the consumer should apply the
/// instruction set's own default.  `None` is therefore *not* the same as
/// `Some(false)` or `Some(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmConfig {
    /// Whether side-set is optional per instruction (`.side_set … opt`).
    /// Always present.
    pub sideset_enable: bool,
    /// Selected revision, when a nonzero `.pio_version` was given.
    pub pio_version: Option<PioVersion>,
    /// Number of side-set pins (`.side_set N`, when nonzero).
    pub sideset_pin_count: Option<u8>,
    /// Side-set drives pin directions (`.side_set … pindirs`).
    pub sideset_pindirs: Option<bool>,
    /// Wrap-loop end index (`.wrap`).
    pub wrap: Option<u8>,
    /// Wrap-loop start index (`.wrap_target`).
    pub wrap_target: Option<u8>,
    /// Fixed load offset (`.origin`).
    pub offset: Option<u8>,
    /// FIFO joining mode (`.fifo`).
    pub fifo_type: Option<FifoType>,
    /// Status source for `mov …, status` (`.mov_status`).
    pub mov_status_type: Option<MovStatusType>,
    /// Packed `.mov_status` parameter: a FIFO level, or the IRQ selector.
    pub mov_status_n: Option<u8>,
    /// IN pin count (`.in`).
    pub in_pin_count: Option<u8>,
    /// ISR shift direction (`.in … left|right`).
    pub in_shift_right: Option<bool>,
    /// Auto-push enable (`.in … auto`).
    pub auto_push: Option<bool>,
    /// Auto-push threshold (`.in … THRESHOLD`).
    pub push_threshold: Option<u8>,
    /// OUT pin count (`.out`).
    pub out_pin_count: Option<u8>,
    /// OSR shift direction (`.out … left|right`).
    pub out_shift_right: Option<bool>,
    /// Auto-pull enable (`.out … auto`).
    pub auto_pull: Option<bool>,
    /// Auto-pull threshold (`.out … THRESHOLD`).
    pub pull_threshold: Option<u8>,
    /// SET pin count (`.set`).
    pub set_pin_count: Option<u8>,
}

/// Per-word source mapping kept by [`Program::assemble_with_debug_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct DebugInfo {
    /// For each emitted word, the 0-based source line it came from.
    line_map: Vec<u32>,
    /// The original source text, for listings.
    source: String,
}

/// An assembled PIO program: the 16-bit words, the directive-derived
/// configuration, and the exported (public) labels.
///
/// # Examples
///
/// ```
/// use pio_asm::Program;
///
/// let program = Program::assemble(
///     "
///     .program blink
///     .side_set 1
///     loop:
///         nop side 1 [15]
///         jmp loop side 0 [15]
///     ",
/// )
/// .unwrap();
///
/// assert_eq!(program.name(), Some("blink"));
/// assert_eq!(program.len(), 2);
/// assert_eq!(program.config().sideset_pin_count, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Program {
    words: Vec<u16>,
    config: SmConfig,
    name: Option<String>,
    public_labels: Vec<(String, u8)>,
    debug: Option<DebugInfo>,
}

impl Program {
    /// Assemble PIO source text.
    ///
    /// # Errors
    ///
    /// Returns [`PioError`] for syntax errors, unknown instructions or
    /// operand names, out-of-range values, version-gated constructs,
    /// misordered directives, duplicate labels, and unresolved jump
    /// targets.  The first error aborts assembly with no partial output.
    ///
    /// # Examples
    ///
    /// ```
    /// use pio_asm::Program;
    ///
    /// let program = Program::assemble("jmp l\nl:").unwrap();
    /// assert_eq!(program.words(), &[0b000_00000_000_00001]);
    /// ```
    pub fn assemble(source: &str) -> Result<Self, PioError> {
        Assembler::default().run(source, false)
    }

    /// Assemble and keep a per-word source-line map for listings and
    /// diagnostics.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Program::assemble`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pio_asm::Program;
    ///
    /// let program = Program::assemble_with_debug_info("nop\n\nnop").unwrap();
    /// assert_eq!(program.line_map(), Some(&[0, 2][..]));
    /// ```
    pub fn assemble_with_debug_info(source: &str) -> Result<Self, PioError> {
        Assembler::default().run(source, true)
    }

    /// The assembled machine code, one word per instruction.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Consume and return the words.
    #[must_use]
    pub fn into_words(self) -> Vec<u16> {
        self.words
    }

    /// Number of assembled words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the program contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The `.program` name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The directive-derived configuration.
    #[must_use]
    pub fn config(&self) -> &SmConfig {
        &self.config
    }

    /// Labels exported with the `public` prefix, as (name, word index)
    /// pairs in name order.
    #[must_use]
    pub fn public_labels(&self) -> &[(String, u8)] {
        &self.public_labels
    }

    /// Look up a public label's word index by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pio_asm::Program;
    ///
    /// let program = Program::assemble("nop\npublic entry:\nnop").unwrap();
    /// assert_eq!(program.public_label("entry"), Some(1));
    /// assert_eq!(program.public_label("missing"), None);
    /// ```
    #[must_use]
    pub fn public_label(&self, name: &str) -> Option<u8> {
        self.public_labels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, i)| *i)
    }

    /// The per-word source-line map, when assembled with debug info.
    #[must_use]
    pub fn line_map(&self) -> Option<&[u32]> {
        self.debug.as_ref().map(|d| &*d.line_map)
    }

    /// Render the program as a C constant-array snippet.
    ///
    /// When the program was assembled with debug info, each word is
    /// annotated with its originating source line and the surrounding
    /// non-code lines are carried along as comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use pio_asm::Program;
    ///
    /// let program = Program::assemble(".side_set 1 opt").unwrap();
    /// let listing = program.c_program("mood");
    /// assert!(listing.contains("const bool mood_sideset_enable = 1;"));
    /// ```
    #[must_use]
    pub fn c_program(&self, name: &str) -> String {
        let mut out = String::new();
        let wrap = self
            .config
            .wrap
            .map_or(self.words.len().saturating_sub(1), usize::from);
        let wrap_target = self.config.wrap_target.map_or(0, usize::from);

        let _ = writeln!(out, "const int {}_wrap = {};", name, wrap);
        let _ = writeln!(out, "const int {}_wrap_target = {};", name, wrap_target);
        let _ = writeln!(
            out,
            "const int {}_sideset_pin_count = {};",
            name,
            self.config.sideset_pin_count.unwrap_or(0)
        );
        let _ = writeln!(
            out,
            "const bool {}_sideset_enable = {};",
            name,
            u8::from(self.config.sideset_enable)
        );
        let _ = writeln!(out, "const uint16_t {}[] = {{", name);

        if let Some(debug) = &self.debug {
            let source_lines: Vec<&str> = debug.source.split('\n').collect();
            let mut last_line = 0usize;
            for (word, &line_idx) in self.words.iter().zip(&debug.line_map) {
                while last_line < line_idx as usize {
                    let line = source_lines.get(last_line).copied().unwrap_or("");
                    if !line.trim().is_empty() {
                        let _ = writeln!(out, "            // {}", line.trim_end());
                    }
                    last_line += 1;
                }
                let line = source_lines.get(last_line).copied().unwrap_or("");
                let _ = writeln!(out, "    0x{:04x}, // {}", word, line.trim());
                last_line += 1;
            }
            for line in source_lines.iter().skip(last_line) {
                if !line.trim().is_empty() {
                    let _ = writeln!(out, "            // {}", line.trim_end());
                }
            }
        } else {
            for chunk in self.words.chunks(8) {
                let mut row = String::new();
                for (i, word) in chunk.iter().enumerate() {
                    if i > 0 {
                        row.push_str(", ");
                    }
                    let _ = write!(row, "0x{:04x}", word);
                }
                let _ = writeln!(out, "    {},", row);
            }
        }

        let _ = writeln!(out, "}};");
        out
    }
}

// ─── Assembler internals ────────────────────────────────────────────────

/// A label definition in instruction-word-index space.
#[derive(Debug, Clone)]
struct LabelDef {
    index: usize,
    span: Span,
    public: bool,
}

/// A pending jump-target patch, applied once the label table is complete.
#[derive(Debug, Clone)]
struct Fixup {
    word_index: usize,
    label: String,
    span: Span,
}

/// Directive and label state accumulated during pass 1.
#[derive(Debug, Default)]
struct Assembler {
    version: PioVersion,
    side_set: SideSet,
    side_set_seen: bool,
    fifo: Option<FifoType>,
    program_name: Option<String>,
    mov_status: Option<(MovStatusType, u8)>,
    wrap: Option<u8>,
    wrap_target: Option<u8>,
    offset: Option<u8>,
    in_pin_count: Option<u8>,
    in_shift_right: Option<bool>,
    auto_push: Option<bool>,
    push_threshold: Option<u8>,
    out_pin_count: Option<u8>,
    out_shift_right: Option<bool>,
    auto_pull: Option<bool>,
    pull_threshold: Option<u8>,
    set_pin_count: Option<u8>,
    labels: BTreeMap<String, LabelDef>,
}

impl Assembler {
    fn run(mut self, source: &str, debug: bool) -> Result<Program, PioError> {
        let lines = lexer::scan(source)?;

        // Pass 1: directives and labels; instruction lines are captured
        // for pass 2.  Label positions count captured instructions, so
        // resolution happens purely in word-index space.
        let mut pending: Vec<(u32, &[Token<'_>])> = Vec::new();
        for line in &lines {
            match &line.kind {
                LineKind::Directive { name, args } => {
                    self.apply_directive(name, args, pending.len())?;
                }
                LineKind::Label { name, public } => {
                    self.define_label(name, *public, pending.len())?;
                }
                LineKind::Instruction { fields } => {
                    pending.push((line.index, fields.as_slice()));
                }
            }
        }

        // Pass 2: encode each instruction and append its word.
        let ctx = ParseContext {
            version: self.version,
            side_set: self.side_set,
            fifo: self.fifo.unwrap_or(FifoType::Auto),
        };
        let mut words = Vec::with_capacity(pending.len());
        let mut line_map = Vec::with_capacity(pending.len());
        let mut fixups: Vec<Fixup> = Vec::new();
        for (line_index, fields) in pending {
            let (instr, delay_side) = parser::parse_instruction(fields, &ctx)?;
            if let Instruction::Jmp {
                target: JmpTarget::Label { name, span },
                ..
            } = &instr
            {
                fixups.push(Fixup {
                    word_index: words.len(),
                    label: name.clone(),
                    span: *span,
                });
            }
            words.push(encoder::apply_delay_side(encoder::encode(&instr), delay_side));
            line_map.push(line_index);
        }

        // Resolve deferred jump targets by rewriting the emitted words.
        for fixup in fixups {
            let Some(def) = self.labels.get(&fixup.label) else {
                return Err(PioError::UndefinedLabel {
                    label: fixup.label,
                    span: fixup.span,
                });
            };
            if def.index > 31 {
                return Err(PioError::OutOfRange {
                    field: "jmp target",
                    value: def.index as i64,
                    min: 0,
                    max: 31,
                    span: fixup.span,
                });
            }
            words[fixup.word_index] =
                encoder::patch_jmp_target(words[fixup.word_index], def.index as u8);
        }

        let mut public_labels = Vec::new();
        for (name, def) in &self.labels {
            if def.public {
                if def.index > 31 {
                    return Err(PioError::OutOfRange {
                        field: "public label index",
                        value: def.index as i64,
                        min: 0,
                        max: 31,
                        span: def.span,
                    });
                }
                public_labels.push((name.clone(), def.index as u8));
            }
        }

        let config = self.build_config();
        Ok(Program {
            words,
            config,
            name: self.program_name,
            public_labels,
            debug: debug.then(|| DebugInfo {
                line_map,
                source: source.to_string(),
            }),
        })
    }

    fn define_label(
        &mut self,
        name: &Token<'_>,
        public: bool,
        emitted: usize,
    ) -> Result<(), PioError> {
        if let Some(existing) = self.labels.get(name.text) {
            return Err(PioError::DuplicateLabel {
                label: name.text.to_string(),
                span: name.span,
                first_span: existing.span,
            });
        }
        self.labels.insert(
            name.text.to_string(),
            LabelDef {
                index: emitted,
                span: name.span,
                public,
            },
        );
        Ok(())
    }

    fn apply_directive(
        &mut self,
        name: &Token<'_>,
        args: &[Token<'_>],
        emitted: usize,
    ) -> Result<(), PioError> {
        match name.text {
            ".program" => {
                let arg = single_arg(name, args)?;
                if self.program_name.is_some() {
                    return Err(PioError::Syntax {
                        msg: String::from("multiple programs not supported"),
                        span: name.span,
                    });
                }
                self.program_name = Some(arg.text.to_string());
            }

            ".pio_version" => {
                self.require_before_instructions(name, emitted)?;
                let value = int_in_range(&single_arg(name, args)?, "pio_version", 0, 1)?;
                self.version = PioVersion::from_number(value).expect("range checked above");
            }

            ".origin" | ".offset" => {
                self.require_before_instructions(name, emitted)?;
                let value = int_in_range(&single_arg(name, args)?, "origin", 0, 31)?;
                self.offset = Some(value as u8);
            }

            ".wrap_target" => {
                no_args(name, args)?;
                self.wrap_target = Some(word_index(emitted, "wrap_target", name.span)?);
            }

            ".wrap" => {
                no_args(name, args)?;
                if emitted == 0 {
                    return Err(PioError::Syntax {
                        msg: String::from(".wrap requires a preceding instruction"),
                        span: name.span,
                    });
                }
                self.wrap = Some(word_index(emitted - 1, "wrap", name.span)?);
            }

            ".side_set" => {
                self.require_before_instructions(name, emitted)?;
                if self.side_set_seen {
                    return Err(PioError::Syntax {
                        msg: String::from("multiple .side_set directives"),
                        span: name.span,
                    });
                }
                if args.is_empty() {
                    return Err(PioError::Syntax {
                        msg: String::from(".side_set requires a pin count"),
                        span: name.span,
                    });
                }
                let mut optional = false;
                let mut pindirs = false;
                for flag in &args[1..] {
                    match flag.text {
                        "opt" => optional = true,
                        "pindirs" => pindirs = true,
                        _ => {
                            return Err(PioError::InvalidOperand {
                                field: "side_set option",
                                value: flag.text.to_string(),
                                span: flag.span,
                            });
                        }
                    }
                }
                // `opt` steals a bit of the delay/enable budget, which is
                // also what admits the sixth pin.
                let max = if optional { 6 } else { 5 };
                let count = int_in_range(&args[0], "side_set count", 0, max)?;
                self.side_set = SideSet {
                    count: count as u8,
                    optional,
                    pindirs,
                };
                self.side_set_seen = true;
            }

            ".fifo" => {
                self.require_before_instructions(name, emitted)?;
                let arg = single_arg(name, args)?;
                let fifo = FifoType::parse(arg.text).ok_or_else(|| PioError::InvalidOperand {
                    field: "fifo type",
                    value: arg.text.to_string(),
                    span: arg.span,
                })?;
                require_version(
                    self.version,
                    fifo.required_version(),
                    &format!(".fifo {}", fifo),
                    arg.span,
                )?;
                self.fifo = Some(fifo);
            }

            ".mov_status" => {
                self.require_before_instructions(name, emitted)?;
                self.mov_status = Some(parse_mov_status(self.version, name, args)?);
            }

            ".in" => {
                self.require_before_instructions(name, emitted)?;
                let shift = parse_shift_directive(self.version, name, args, "in")?;
                self.in_pin_count = Some(shift.count);
                self.in_shift_right = shift.shift_right;
                self.auto_push = shift.auto;
                self.push_threshold = shift.threshold;
            }

            ".out" => {
                self.require_before_instructions(name, emitted)?;
                let shift = parse_shift_directive(self.version, name, args, "out")?;
                self.out_pin_count = Some(shift.count);
                self.out_shift_right = shift.shift_right;
                self.auto_pull = shift.auto;
                self.pull_threshold = shift.threshold;
            }

            ".set" => {
                self.require_before_instructions(name, emitted)?;
                if args.is_empty() {
                    return Err(PioError::Syntax {
                        msg: String::from(".set requires a pin count"),
                        span: name.span,
                    });
                }
                let (min, max) = match self.version {
                    PioVersion::V0 => (5, 5),
                    PioVersion::V1 => (1, 5),
                };
                let count = int_in_range(&args[0], "set count", min, max)?;
                for flag in &args[1..] {
                    // Accepted for symmetry with `.in`/`.out`; `set` has no
                    // shift register, so the direction has no effect.
                    if !matches!(flag.text, "left" | "right") {
                        return Err(PioError::InvalidOperand {
                            field: "set option",
                            value: flag.text.to_string(),
                            span: flag.span,
                        });
                    }
                }
                self.set_pin_count = Some(count as u8);
            }

            _ => {
                return Err(PioError::Syntax {
                    msg: format!("unknown directive '{}'", name.text),
                    span: name.span,
                });
            }
        }
        Ok(())
    }

    fn require_before_instructions(
        &self,
        name: &Token<'_>,
        emitted: usize,
    ) -> Result<(), PioError> {
        if emitted != 0 {
            return Err(PioError::DirectiveOrder {
                directive: name.text.to_string(),
                span: name.span,
            });
        }
        Ok(())
    }

    fn build_config(&self) -> SmConfig {
        SmConfig {
            sideset_enable: self.side_set.optional,
            pio_version: (self.version != PioVersion::V0).then_some(self.version),
            sideset_pin_count: (self.side_set.count != 0).then_some(self.side_set.count),
            sideset_pindirs: self.side_set.pindirs.then_some(true),
            wrap: self.wrap,
            wrap_target: self.wrap_target,
            offset: self.offset,
            fifo_type: self.fifo,
            mov_status_type: self.mov_status.map(|(ty, _)| ty),
            mov_status_n: self.mov_status.map(|(_, n)| n),
            in_pin_count: self.in_pin_count,
            in_shift_right: self.in_shift_right,
            auto_push: self.auto_push,
            push_threshold: self.push_threshold,
            out_pin_count: self.out_pin_count,
            out_shift_right: self.out_shift_right,
            auto_pull: self.auto_pull,
            pull_threshold: self.pull_threshold,
            set_pin_count: self.set_pin_count,
        }
    }
}

// ─── Directive helpers ──────────────────────────────────────────────────

fn single_arg<'src>(name: &Token<'_>, args: &[Token<'src>]) -> Result<Token<'src>, PioError> {
    match args {
        [arg] => Ok(*arg),
        [] => Err(PioError::Syntax {
            msg: format!("{} requires an argument", name.text),
            span: name.span,
        }),
        [_, extra, ..] => Err(PioError::Syntax {
            msg: format!("unexpected '{}' after {}", extra.text, name.text),
            span: extra.span,
        }),
    }
}

fn no_args(name: &Token<'_>, args: &[Token<'_>]) -> Result<(), PioError> {
    if let Some(extra) = args.first() {
        return Err(PioError::Syntax {
            msg: format!("unexpected '{}' after {}", extra.text, name.text),
            span: extra.span,
        });
    }
    Ok(())
}

/// Wrap indices must land in the 5-bit program counter space.
fn word_index(index: usize, field: &'static str, span: Span) -> Result<u8, PioError> {
    if index > 31 {
        return Err(PioError::OutOfRange {
            field,
            value: index as i64,
            min: 0,
            max: 31,
            span,
        });
    }
    Ok(index as u8)
}

fn parse_mov_status(
    version: PioVersion,
    name: &Token<'_>,
    args: &[Token<'_>],
) -> Result<(MovStatusType, u8), PioError> {
    let Some(source) = args.first() else {
        return Err(PioError::Syntax {
            msg: String::from(".mov_status requires a status source"),
            span: name.span,
        });
    };

    match source.text {
        "txfifo" | "rxfifo" => {
            let ty = if source.text == "txfifo" {
                MovStatusType::TxFifo
            } else {
                MovStatusType::RxFifo
            };
            match args {
                [_, cmp, level] if cmp.text == "<" => {
                    let n = int_in_range(level, "mov_status level", 0, 31)?;
                    Ok((ty, n as u8))
                }
                _ => Err(PioError::Syntax {
                    msg: format!(".mov_status {} requires '< N'", source.text),
                    span: name.span,
                }),
            }
        }
        "irq" => {
            require_version(
                version,
                PioVersion::V1,
                &format!(".mov_status {}", join_fields(args)),
                source.span,
            )?;
            let mut i = 1;
            let mut packed: u8 = 0;
            match args.get(i).map(|t| t.text) {
                Some("next") => {
                    packed = 0x10;
                    i += 1;
                }
                Some("prev") => {
                    packed = 0x8;
                    i += 1;
                }
                _ => {}
            }
            match (args.get(i), args.get(i + 1), args.len() == i + 2) {
                (Some(set), Some(index), true) if set.text == "set" => {
                    let n = int_in_range(index, "mov_status irq index", 0, 7)?;
                    Ok((MovStatusType::Irq, packed + n as u8))
                }
                _ => Err(PioError::Syntax {
                    msg: String::from(".mov_status irq requires 'set N'"),
                    span: name.span,
                }),
            }
        }
        _ => Err(PioError::InvalidOperand {
            field: "mov_status source",
            value: source.text.to_string(),
            span: source.span,
        }),
    }
}

/// Parsed form of a `.in`/`.out` shift-register directive.
struct ShiftDirective {
    count: u8,
    shift_right: Option<bool>,
    auto: Option<bool>,
    threshold: Option<u8>,
}

fn parse_shift_directive(
    version: PioVersion,
    name: &Token<'_>,
    args: &[Token<'_>],
    which: &'static str,
) -> Result<ShiftDirective, PioError> {
    if args.is_empty() {
        return Err(PioError::Syntax {
            msg: format!("{} requires a count", name.text),
            span: name.span,
        });
    }
    // Version 0 hardware shifts all 32 bits; version 1 allows a narrower
    // window.
    let (min, max) = match version {
        PioVersion::V0 => (32, 32),
        PioVersion::V1 => (1, 32),
    };
    let count_field = if which == "in" { "in count" } else { "out count" };
    let count = int_in_range(&args[0], count_field, min, max)?;

    let mut shift = ShiftDirective {
        count: count as u8,
        shift_right: None,
        auto: None,
        threshold: None,
    };

    let mut i = 1;
    if let Some(tok) = args.get(i) {
        if matches!(tok.text, "left" | "right") {
            shift.shift_right = Some(tok.text == "right");
            i += 1;
        }
    }
    if let Some(tok) = args.get(i) {
        if tok.text == "auto" {
            shift.auto = Some(true);
            i += 1;
        }
    }
    if let Some(tok) = args.get(i) {
        let threshold_field = if which == "in" {
            "in threshold"
        } else {
            "out threshold"
        };
        shift.threshold = Some(int_in_range(tok, threshold_field, 1, 32)? as u8);
        i += 1;
    }
    if i != args.len() {
        return Err(PioError::Syntax {
            msg: format!("unexpected '{}' after {}", args[i].text, name.text),
            span: args[i].span,
        });
    }

    Ok(shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RxIndex;

    fn assemble(source: &str) -> Result<Program, PioError> {
        Program::assemble(source)
    }

    #[test]
    fn empty_program() {
        let program = assemble("").unwrap();
        assert!(program.is_empty());
        assert_eq!(program.config(), &SmConfig::default());
    }

    #[test]
    fn forward_jump_fixup() {
        let program = assemble("jmp l\nl:").unwrap();
        assert_eq!(program.words(), &[0b000_00000_000_00001]);
    }

    #[test]
    fn backward_jump_resolves_immediately_known_label() {
        let program = assemble("l:\njmp l").unwrap();
        assert_eq!(program.words(), &[0b000_00000_000_00000]);
    }

    #[test]
    fn undefined_label_reports_reference_site() {
        let err = assemble("nop\njmp missing").unwrap_err();
        let PioError::UndefinedLabel { label, span } = err else {
            panic!("expected undefined label, got {err:?}");
        };
        assert_eq!(label, "missing");
        assert_eq!(span.line, 2);
        assert_eq!(span.col, 5);
    }

    #[test]
    fn duplicate_labels_across_namespaces() {
        for source in [
            "l:\nnop\nl:\nnop",
            "l:\nnop\npublic l:\nnop",
            "public l:\nnop\nl:\nnop",
            "public l:\nnop\npublic l:\nnop",
        ] {
            let err = assemble(source).unwrap_err();
            assert!(
                matches!(err, PioError::DuplicateLabel { ref label, .. } if label == "l"),
                "{source}: {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_label_reports_first_definition() {
        let err = assemble("l:\nnop\nl:").unwrap_err();
        let PioError::DuplicateLabel { first_span, span, .. } = err else {
            panic!("expected duplicate label");
        };
        assert_eq!(first_span.line, 1);
        assert_eq!(span.line, 3);
    }

    #[test]
    fn labels_count_words_not_lines() {
        // Directives, labels, blanks, and comments consume no word.
        let program = assemble(
            "
            .program counting
            start:          ; label on its own line
                nop

            mid:
                jmp mid
                jmp start
            ",
        )
        .unwrap();
        assert_eq!(program.words()[1], 0b000_00000_000_00001); // jmp mid → 1
        assert_eq!(program.words()[2], 0b000_00000_000_00000); // jmp start → 0
    }

    #[test]
    fn public_labels_are_exported() {
        let program = assemble("jmp l1\nl1:\njmp l2\npublic l2:\nnop").unwrap();
        assert_eq!(program.public_labels(), &[("l2".to_string(), 2)]);
        assert_eq!(program.public_label("l1"), None);
    }

    #[test]
    fn program_name_recorded_once() {
        let program = assemble(".program squarewave\nnop").unwrap();
        assert_eq!(program.name(), Some("squarewave"));

        let err = assemble(".program a\n.program b").unwrap_err();
        assert!(matches!(err, PioError::Syntax { .. }));
    }

    #[test]
    fn wrap_positions() {
        let program = assemble("nop\n.wrap_target\nnop\nnop\n.wrap").unwrap();
        assert_eq!(program.config().wrap_target, Some(1));
        assert_eq!(program.config().wrap, Some(2));
    }

    #[test]
    fn wrap_before_any_instruction_fails() {
        let err = assemble(".wrap").unwrap_err();
        assert!(matches!(err, PioError::Syntax { .. }));
    }

    #[test]
    fn side_set_after_instruction_is_ordering_error() {
        let err = assemble("nop\n.side_set 1").unwrap_err();
        assert!(matches!(
            err,
            PioError::DirectiveOrder { ref directive, .. } if directive == ".side_set"
        ));
    }

    #[test]
    fn pio_version_after_instruction_is_ordering_error() {
        let err = assemble("nop\n.pio_version 1").unwrap_err();
        assert!(matches!(err, PioError::DirectiveOrder { .. }));
    }

    #[test]
    fn side_set_bounds() {
        assert!(assemble(".side_set 5").is_ok());
        assert!(matches!(
            assemble(".side_set 6").unwrap_err(),
            PioError::OutOfRange { field: "side_set count", .. }
        ));
        assert!(assemble(".side_set 6 opt").is_ok());
        assert!(assemble(".side_set 7 opt").is_err());
    }

    #[test]
    fn side_set_at_most_once() {
        let err = assemble(".side_set 1\n.side_set 2").unwrap_err();
        assert!(matches!(err, PioError::Syntax { .. }));
    }

    #[test]
    fn side_set_flags() {
        let program = assemble(".side_set 2 opt pindirs").unwrap();
        let config = program.config();
        assert!(config.sideset_enable);
        assert_eq!(config.sideset_pin_count, Some(2));
        assert_eq!(config.sideset_pindirs, Some(true));
    }

    #[test]
    fn sideset_enable_always_present_and_defaults_false() {
        let config = assemble(".side_set 1").unwrap().config().clone();
        assert!(!config.sideset_enable);
        assert_eq!(config.sideset_pindirs, None);
    }

    #[test]
    fn pio_version_kwarg_only_when_nonzero() {
        assert_eq!(assemble(".pio_version 0").unwrap().config().pio_version, None);
        assert_eq!(
            assemble(".pio_version 1").unwrap().config().pio_version,
            Some(PioVersion::V1)
        );
        assert!(matches!(
            assemble(".pio_version muffin").unwrap_err(),
            PioError::Syntax { .. }
        ));
        assert!(matches!(
            assemble(".pio_version 2").unwrap_err(),
            PioError::OutOfRange { .. }
        ));
    }

    #[test]
    fn origin_and_offset_spellings() {
        assert_eq!(assemble(".origin 4").unwrap().config().offset, Some(4));
        assert_eq!(assemble(".offset 7").unwrap().config().offset, Some(7));
    }

    #[test]
    fn fifo_version_gating() {
        assert_eq!(
            assemble(".fifo txrx").unwrap().config().fifo_type,
            Some(FifoType::TxRx)
        );
        let err = assemble(".fifo txput").unwrap_err();
        assert!(matches!(err, PioError::VersionRequired { .. }));
        assert_eq!(
            assemble(".pio_version 1\n.fifo txput").unwrap().config().fifo_type,
            Some(FifoType::TxPut)
        );
        let err = assemble(".fifo sideways").unwrap_err();
        assert!(matches!(
            err,
            PioError::InvalidOperand { field: "fifo type", .. }
        ));
    }

    #[test]
    fn mov_status_fifo_levels() {
        let config = assemble(".mov_status txfifo < 5").unwrap().config().clone();
        assert_eq!(config.mov_status_type, Some(MovStatusType::TxFifo));
        assert_eq!(config.mov_status_n, Some(5));

        let config = assemble(".mov_status rxfifo < 0").unwrap().config().clone();
        assert_eq!(config.mov_status_type, Some(MovStatusType::RxFifo));
        assert_eq!(config.mov_status_n, Some(0));

        assert!(assemble(".mov_status txfifo > 5").is_err());
        assert!(assemble(".mov_status txfifo < 32").is_err());
    }

    #[test]
    fn mov_status_irq_packing() {
        let err = assemble(".mov_status irq set 3").unwrap_err();
        assert!(matches!(err, PioError::VersionRequired { .. }));

        let n = |src: &str| {
            assemble(&format!(".pio_version 1\n{src}"))
                .unwrap()
                .config()
                .mov_status_n
        };
        assert_eq!(n(".mov_status irq set 3"), Some(3));
        assert_eq!(n(".mov_status irq prev set 3"), Some(0x8 + 3));
        assert_eq!(n(".mov_status irq next set 3"), Some(0x10 + 3));
    }

    #[test]
    fn in_directive_version_bounds() {
        assert!(assemble(".in 32").is_ok());
        assert!(matches!(
            assemble(".in 8").unwrap_err(),
            PioError::OutOfRange { field: "in count", .. }
        ));
        assert!(assemble(".pio_version 1\n.in 8").is_ok());
    }

    #[test]
    fn in_directive_options() {
        let config = assemble(".in 32 left auto 11").unwrap().config().clone();
        assert_eq!(config.in_pin_count, Some(32));
        assert_eq!(config.in_shift_right, Some(false));
        assert_eq!(config.auto_push, Some(true));
        assert_eq!(config.push_threshold, Some(11));

        let config = assemble(".in 32").unwrap().config().clone();
        assert_eq!(config.in_pin_count, Some(32));
        assert_eq!(config.in_shift_right, None);
        assert_eq!(config.auto_push, None);
        assert_eq!(config.push_threshold, None);
    }

    #[test]
    fn out_directive_options() {
        let config = assemble(".out 32 right auto").unwrap().config().clone();
        assert_eq!(config.out_pin_count, Some(32));
        assert_eq!(config.out_shift_right, Some(true));
        assert_eq!(config.auto_pull, Some(true));
        assert_eq!(config.pull_threshold, None);
    }

    #[test]
    fn set_directive_version_bounds() {
        assert_eq!(assemble(".set 5").unwrap().config().set_pin_count, Some(5));
        assert!(matches!(
            assemble(".set 3").unwrap_err(),
            PioError::OutOfRange { field: "set count", .. }
        ));
        assert_eq!(
            assemble(".pio_version 1\n.set 3").unwrap().config().set_pin_count,
            Some(3)
        );
    }

    #[test]
    fn unknown_directive() {
        let err = assemble(".bogus 1").unwrap_err();
        assert!(matches!(err, PioError::Syntax { .. }));
    }

    #[test]
    fn rxfifo_mov_assembles_under_fifo_mode() {
        let program = assemble(
            ".pio_version 1\n.fifo putget\nmov rxfifo[1], isr\nmov osr, rxfifo[y]",
        )
        .unwrap();
        assert_eq!(
            program.words(),
            &[0b100_00000_0001_0001, 0b100_00000_1001_1000]
        );
        // Sanity: the parser saw the same selector values.
        assert_eq!(RxIndex::Immediate(1).field(), 1);
    }

    #[test]
    fn determinism() {
        let source = "
            .program deterministic
            .side_set 1 opt
            .wrap_target
            loop:
                out x, 1       side 0 [1]
                jmp !x, loop   side 1
            .wrap
        ";
        let a = assemble(source).unwrap();
        let b = assemble(source).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn c_program_without_debug_info() {
        let program = assemble("nop\nnop").unwrap();
        let listing = program.c_program("pad");
        assert!(listing.contains("const int pad_wrap = 1;"));
        assert!(listing.contains("const int pad_wrap_target = 0;"));
        assert!(listing.contains("const uint16_t pad[] = {"));
        assert!(listing.contains("0xa042, 0xa042"));
    }

    #[test]
    fn c_program_with_debug_info() {
        let program =
            Program::assemble_with_debug_info("; blink\nnop [1]\nnop").unwrap();
        let listing = program.c_program("blink");
        assert!(listing.contains("// ; blink"));
        assert!(listing.contains("0xa142, // nop [1]"));
    }

    #[test]
    fn line_map_skips_non_instruction_lines() {
        let program =
            Program::assemble_with_debug_info(".program x\n\nnop\nl:\nnop").unwrap();
        assert_eq!(program.line_map(), Some(&[2, 4][..]));
    }
}
