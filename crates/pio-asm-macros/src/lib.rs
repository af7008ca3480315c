//! Compile-time PIO assembly proc-macros for [`pio-asm`](https://crates.io/crates/pio-asm).
//!
//! Provides the [`pio_words!`] macro that assembles PIO source text at
//! compile time, producing a `&'static [u16]` constant with zero runtime
//! overhead — the natural shape for firmware that loads a fixed program
//! into a state machine.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pio_asm_macros::{pio_array, pio_words};
//!
//! // A squarewave, assembled at compile time
//! const SQUAREWAVE: &[u16] = pio_words!(
//!     "
//!     .side_set 1
//!     loop:
//!         nop side 1 [1]
//!         jmp loop side 0 [1]
//!     "
//! );
//!
//! // Fixed-size form
//! const INIT: [u16; 1] = pio_array!("set pindirs, 1");
//! ```

use proc_macro::TokenStream;

/// Assemble PIO source text at compile time, producing a `&'static [u16]`
/// word slice.
///
/// # Syntax
///
/// ```rust,ignore
/// pio_words!("pio source")
/// ```
///
/// # Examples
///
/// ```rust,ignore
/// use pio_asm_macros::pio_words;
///
/// const NOP: &[u16] = pio_words!("nop");
/// assert_eq!(NOP, &[0xA042]);
///
/// // Multi-instruction with labels and directives
/// const BLINK: &[u16] = pio_words!(
///     "
///     .side_set 1
///     top:
///         nop side 1 [15]
///         jmp top side 0 [15]
///     "
/// );
/// ```
///
/// # Compile-time errors
///
/// If the source contains errors, the macro emits a compile-time error
/// carrying the full `PioError` diagnostic (with its line:column position
/// inside the literal).
#[proc_macro]
pub fn pio_words(input: TokenStream) -> TokenStream {
    match pio_words_impl(input) {
        Ok(ts) => ts,
        Err(err) => err.into_compile_error(),
    }
}

/// Assemble PIO source text at compile time, producing a fixed-size
/// `[u16; N]` array.
///
/// Unlike [`pio_words!`] which returns `&'static [u16]`, this macro
/// returns a value usable where a sized array is needed (e.g. embedding
/// into a larger table).
///
/// # Syntax
///
/// ```rust,ignore
/// pio_array!("pio source")
/// ```
///
/// # Examples
///
/// ```rust,ignore
/// use pio_asm_macros::pio_array;
///
/// const INIT: [u16; 1] = pio_array!("set pindirs, 1");
/// ```
#[proc_macro]
pub fn pio_array(input: TokenStream) -> TokenStream {
    match pio_array_impl(input) {
        Ok(ts) => ts,
        Err(err) => err.into_compile_error(),
    }
}

// ─── Implementation ─────────────────────────────────────────────────────────

struct MacroInput {
    source: String,
    /// Span of the source literal for error reporting.
    source_span: proc_macro::Span,
}

fn parse_input(input: TokenStream) -> Result<MacroInput, syn_free::Error> {
    let mut tokens = input.into_iter().peekable();

    let (source, source_span) = parse_string_literal(&mut tokens)?;

    // Tolerate one trailing comma, nothing else.
    if let Some(proc_macro::TokenTree::Punct(p)) = tokens.peek() {
        if p.as_char() == ',' {
            tokens.next();
        }
    }
    if tokens.next().is_some() {
        return Err(syn_free::Error::new(
            "unexpected extra tokens after source string",
        ));
    }

    Ok(MacroInput {
        source,
        source_span,
    })
}

fn pio_words_impl(input: TokenStream) -> Result<TokenStream, syn_free::Error> {
    let mi = parse_input(input)?;
    let words = do_assemble(&mi)?;
    Ok(words_to_slice_expr(&words))
}

fn pio_array_impl(input: TokenStream) -> Result<TokenStream, syn_free::Error> {
    let mi = parse_input(input)?;
    let words = do_assemble(&mi)?;
    Ok(words_to_array_expr(&words))
}

fn do_assemble(mi: &MacroInput) -> Result<Vec<u16>, syn_free::Error> {
    pio_asm::assemble(&mi.source)
        .map_err(|e| syn_free::Error::with_span(mi.source_span, &format!("PIO assembly error: {e}")))
}

fn parse_string_literal(
    tokens: &mut std::iter::Peekable<proc_macro::token_stream::IntoIter>,
) -> Result<(String, proc_macro::Span), syn_free::Error> {
    let tt = tokens
        .next()
        .ok_or_else(|| syn_free::Error::new("expected PIO source string"))?;
    let proc_macro::TokenTree::Literal(lit) = &tt else {
        return Err(syn_free::Error::with_span(
            tt.span(),
            "expected string literal",
        ));
    };
    let raw = lit.to_string();
    // Strip quotes — handle both `"..."` and `r"..."` / `r#"..."#`
    let content = if raw.starts_with("r#\"") {
        raw.strip_prefix("r#\"")
            .and_then(|s| s.strip_suffix("\"#"))
            .ok_or_else(|| syn_free::Error::with_span(tt.span(), "malformed raw string"))?
    } else if raw.starts_with("r\"") {
        raw.strip_prefix("r\"")
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| syn_free::Error::with_span(tt.span(), "malformed raw string"))?
    } else if raw.starts_with('"') {
        // Regular string — need to unescape
        let inner = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| syn_free::Error::with_span(tt.span(), "malformed string literal"))?;
        return Ok((unescape_string(inner), tt.span()));
    } else {
        return Err(syn_free::Error::with_span(
            tt.span(),
            "expected string literal",
        ));
    };
    Ok((content.to_string(), tt.span()))
}

fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('0') => out.push('\0'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn words_to_slice_expr(words: &[u16]) -> TokenStream {
    let word_strs: Vec<String> = words.iter().map(|w| format!("{w:#06X}u16")).collect();
    let inner = word_strs.join(", ");
    let code = format!("{{ const WORDS: &[u16] = &[{inner}]; WORDS }}");
    code.parse().expect("generated code should parse")
}

fn words_to_array_expr(words: &[u16]) -> TokenStream {
    let len = words.len();
    let word_strs: Vec<String> = words.iter().map(|w| format!("{w:#06X}u16")).collect();
    let inner = word_strs.join(", ");
    let code = format!("{{ const WORDS: [u16; {len}] = [{inner}]; WORDS }}");
    code.parse().expect("generated code should parse")
}

// ─── Minimal syn-free error type ─────────────────────────────────────────────
// We avoid the `syn` dependency entirely for fast compile times — the macro
// input is simple enough to parse manually from `proc_macro::TokenStream`.

mod syn_free {
    use proc_macro::{Span, TokenStream};

    pub struct Error {
        message: String,
        span: Option<Span>,
    }

    impl Error {
        pub fn new(msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: None,
            }
        }

        pub fn with_span(span: Span, msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: Some(span),
            }
        }

        pub fn into_compile_error(self) -> TokenStream {
            let msg = self.message.replace('"', "\\\"");
            let code = format!("compile_error!(\"{msg}\")");
            // Try to set the span for better diagnostics
            if let Some(span) = self.span {
                let ts: TokenStream = code.parse().unwrap();
                ts.into_iter()
                    .map(|mut tt| {
                        tt.set_span(span);
                        tt
                    })
                    .collect()
            } else {
                code.parse().unwrap()
            }
        }
    }
}
