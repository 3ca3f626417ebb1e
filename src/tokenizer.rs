//! Incremental SAX-style XML tokenizer.
//!
//! This module provides a low-level lexer for the constrained XML dialect
//! used by suite result reports. It consumes an append-only text buffer fed
//! in arbitrary chunks and emits [`XmlToken`]s; it knows nothing about
//! document semantics.
//!
//! The tokenizer is safe to drive across arbitrary chunk boundaries: if the
//! terminator of the construct at the top of the buffer has not arrived yet
//! (a tag missing its `>`, a CDATA block missing its `]]>`), lexing stalls
//! and the unconsumed input is retained verbatim for the next [`write`].
//! Feeding a document in one chunk or split at any byte offset produces the
//! same token sequence.
//!
//! # Example
//!
//! ```rust
//! use ctsreport::tokenizer::{XmlToken, XmlTokenizer};
//!
//! let mut tok = XmlTokenizer::new();
//! tok.write("<Test result=\"pa");
//! assert!(tok.next_token().is_none()); // tag still incomplete
//! tok.write("ss\" name=\"testFoo\"/>");
//! match tok.next_token() {
//!     Some(XmlToken::OpenTag { name, attributes, self_closing }) => {
//!         assert_eq!(name, "Test");
//!         assert_eq!(attributes.get("result"), Some("pass"));
//!         assert!(self_closing);
//!     }
//!     other => panic!("unexpected token: {:?}", other),
//! }
//! ```
//!
//! # Known limitations (intentional)
//!
//! - Double-quoted attribute values only; a raw `>` inside a value ends the
//!   tag early (report writers escape it as `&gt;`).
//! - No DOCTYPE handling; `<!…>` forms other than comments and CDATA fall
//!   through to the lenient open-tag rule and parse as oddly named tags.
//! - Malformed constructs never raise errors. A construct left unterminated
//!   at end of stream is dropped by [`end`], which reports the drop.
//!
//! [`write`]: XmlTokenizer::write
//! [`end`]: XmlTokenizer::end

use memchr::{memchr, memmem};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const PI_OPEN: &str = "<?";
const PI_CLOSE: &str = "?>";

/// An ordered collection of attribute name/value pairs.
///
/// Order matches the attribute order in the source tag. Lookups by name
/// return the first occurrence, so a duplicated attribute keeps its first
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Creates a new empty attribute collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the first attribute with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the attributes in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn push(&mut self, name: String, value: String) {
        self.pairs.push((name, value));
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// A lexical token emitted by [`XmlTokenizer`].
///
/// Tokens are transient: the tokenizer hands over ownership and retains
/// nothing once a token has been returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// An opening tag, e.g. `<Module name="CtsExampleTestCases" abi="arm64-v8a">`.
    ///
    /// A self-closing tag (`<Test … />`) is reported as an `OpenTag` with
    /// `self_closing` set, immediately followed by the matching [`CloseTag`].
    ///
    /// [`CloseTag`]: XmlToken::CloseTag
    OpenTag {
        /// Tag name as written in the source.
        name: String,
        /// Attributes in source order, values entity-decoded.
        attributes: Attributes,
        /// True for `<name … />` forms.
        self_closing: bool,
    },
    /// A closing tag, e.g. `</Module>`.
    CloseTag {
        /// Tag name, surrounding whitespace trimmed.
        name: String,
    },
    /// A text run between tags, entity-decoded. Whitespace-only runs are
    /// never emitted.
    Text(String),
    /// The interior of a `<![CDATA[…]]>` block, entity-decoded.
    CData(String),
}

/// Outcome of one dispatch attempt at the top of the buffer.
enum Scan {
    /// The construct's terminating delimiter has not arrived yet.
    Stall,
    /// Input was consumed without producing a token.
    Consumed,
    /// A token was produced.
    Token(XmlToken),
}

/// A streaming XML tokenizer over an append-only text buffer.
///
/// [`write`] appends a chunk; [`next_token`] lexes as much as the buffered
/// data allows, returning `None` once the buffer is exhausted or the current
/// construct is incomplete. The consumed prefix is compacted away on the next
/// `write`, so memory stays bounded by one stalled construct plus one chunk.
///
/// [`write`]: XmlTokenizer::write
/// [`next_token`]: XmlTokenizer::next_token
#[derive(Debug, Default)]
pub struct XmlTokenizer {
    buf: String,
    pos: usize,
    /// Close tag synthesized for a self-closing open tag, handed out by the
    /// next [`XmlTokenizer::next_token`] call.
    pending_close: Option<String>,
}

impl XmlTokenizer {
    /// Creates a new tokenizer with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of decoded text to the internal buffer.
    ///
    /// The chunk may split a tag, attribute, entity, or CDATA block at any
    /// character boundary; the stalled remainder from the previous call is
    /// retained and completed by later writes.
    pub fn write(&mut self, chunk: &str) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        self.buf.push_str(chunk);
    }

    /// Lexes and returns the next token, or `None` when the buffered data
    /// is exhausted or ends in an incomplete construct.
    pub fn next_token(&mut self) -> Option<XmlToken> {
        if let Some(name) = self.pending_close.take() {
            return Some(XmlToken::CloseTag { name });
        }
        loop {
            match self.scan() {
                Scan::Stall => return None,
                Scan::Consumed => continue,
                Scan::Token(token) => return Some(token),
            }
        }
    }

    /// Finishes the stream, discarding any stalled fragment.
    ///
    /// Returns `true` if a non-whitespace fragment was dropped, which means
    /// the source ended mid-construct (a truncated file). Trailing
    /// whitespace after the root element is normal and does not count.
    pub fn end(&mut self) -> bool {
        let truncated = !self.buf[self.pos..].trim().is_empty();
        self.buf.clear();
        self.pos = 0;
        truncated
    }

    /// Returns the number of buffered, not yet consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Dispatches on the construct at the top of the buffer, leading
    /// whitespace always skipped first.
    fn scan(&mut self) -> Scan {
        self.skip_whitespace();
        let rest = &self.buf[self.pos..];
        if rest.is_empty() {
            return Scan::Stall;
        }
        if rest.as_bytes()[0] == b'<' {
            self.scan_markup()
        } else {
            self.scan_text()
        }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.buf.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Handles everything starting with `<`.
    ///
    /// Short prefixes that cannot be discriminated yet (`<`, `<!`, `<![`,
    /// `<!-`, …) stall until more data arrives.
    fn scan_markup(&mut self) -> Scan {
        let rest = &self.buf[self.pos..];

        if let Some(tail) = rest.strip_prefix(CDATA_OPEN) {
            return match memmem::find(tail.as_bytes(), CDATA_CLOSE.as_bytes()) {
                Some(end) => {
                    let content = decode_entities(&tail[..end]);
                    self.pos += CDATA_OPEN.len() + end + CDATA_CLOSE.len();
                    Scan::Token(XmlToken::CData(content))
                }
                None => Scan::Stall,
            };
        }
        if CDATA_OPEN.starts_with(rest) {
            return Scan::Stall;
        }

        if let Some(tail) = rest.strip_prefix(PI_OPEN) {
            return match memmem::find(tail.as_bytes(), PI_CLOSE.as_bytes()) {
                Some(end) => {
                    self.pos += PI_OPEN.len() + end + PI_CLOSE.len();
                    Scan::Consumed
                }
                None => Scan::Stall,
            };
        }

        if let Some(tail) = rest.strip_prefix(COMMENT_OPEN) {
            return match memmem::find(tail.as_bytes(), COMMENT_CLOSE.as_bytes()) {
                Some(end) => {
                    self.pos += COMMENT_OPEN.len() + end + COMMENT_CLOSE.len();
                    Scan::Consumed
                }
                None => Scan::Stall,
            };
        }
        if COMMENT_OPEN.starts_with(rest) {
            return Scan::Stall;
        }

        if let Some(tail) = rest.strip_prefix("</") {
            return match memchr(b'>', tail.as_bytes()) {
                Some(end) => {
                    let name = tail[..end].trim().to_string();
                    self.pos += 2 + end + 1;
                    Scan::Token(XmlToken::CloseTag { name })
                }
                None => Scan::Stall,
            };
        }

        self.scan_open_tag()
    }

    fn scan_open_tag(&mut self) -> Scan {
        let rest = &self.buf[self.pos..];
        let Some(gt) = memchr(b'>', rest.as_bytes()) else {
            return Scan::Stall;
        };

        let interior = rest[1..gt].trim_end();
        let (interior, self_closing) = match interior.strip_suffix('/') {
            Some(stripped) => (stripped, true),
            None => (interior, false),
        };

        let name_end = interior
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(interior.len());
        let name = interior[..name_end].to_string();
        let attributes = parse_attributes(&interior[name_end..]);
        self.pos += gt + 1;

        if name.is_empty() {
            // "<>" or "< name" carries no usable tag name
            return Scan::Consumed;
        }
        if self_closing {
            self.pending_close = Some(name.clone());
        }
        Scan::Token(XmlToken::OpenTag {
            name,
            attributes,
            self_closing,
        })
    }

    fn scan_text(&mut self) -> Scan {
        let rest = &self.buf[self.pos..];
        let Some(lt) = memchr(b'<', rest.as_bytes()) else {
            return Scan::Stall;
        };
        let decoded = decode_entities(&rest[..lt]);
        self.pos += lt;
        if decoded.trim().is_empty() {
            Scan::Consumed
        } else {
            Scan::Token(XmlToken::Text(decoded))
        }
    }
}

/// Parses `name="value"` pairs from the run following a tag name.
///
/// Lenient by contract: bare words, unquoted values, and an unterminated
/// final quote are skipped rather than reported. Only double quotes delimit
/// values.
fn parse_attributes(input: &str) -> Attributes {
    let mut attrs = Attributes::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name = &input[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'"' {
            // unquoted value; resynchronize at the next whitespace
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            continue;
        }
        i += 1;
        let value_start = i;
        let Some(rel) = memchr(b'"', &bytes[i..]) else {
            break;
        };
        let value = decode_entities(&input[value_start..i + rel]);
        i += rel + 1;
        if !name.is_empty() {
            attrs.push(name.to_string(), value);
        }
    }

    attrs
}

/// Decodes the five predefined XML entities plus numeric character
/// references, in a single pass.
///
/// Contract:
/// - Named entities decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`.
/// - Numeric references decoded only when well-formed and
///   semicolon-terminated: `&#65;` (decimal) and `&#x41;` (hex).
/// - Only valid Unicode scalar values decode; surrogates and out-of-range
///   values pass through unchanged.
/// - Unknown names, missing semicolons, and malformed numerics pass through
///   unchanged.
///
/// Single-pass means already-decoded output is never decoded again:
/// `&amp;lt;` becomes `&lt;`, not `<`.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    const MAX_DEC_DIGITS: usize = 7; // 1114111
    const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF

    // Bounded scan so adversarial digit runs cannot go quadratic.
    fn scan_numeric(bytes: &[u8], start: usize, max_digits: usize, hex: bool) -> Option<usize> {
        let mut j = start;
        let mut digits = 0usize;
        while j < bytes.len() {
            let b = bytes[j];
            if b == b';' {
                return (digits > 0).then_some(j);
            }
            if digits == max_digits {
                return None;
            }
            let ok = if hex {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            };
            if !ok {
                return None;
            }
            digits += 1;
            j += 1;
        }
        None
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut copy_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        // Flush bytes up to '&' unchanged (preserves UTF-8).
        out.push_str(&s[copy_start..i]);

        let rest = &bytes[i..];
        let named = [
            (&b"&amp;"[..], '&'),
            (&b"&lt;"[..], '<'),
            (&b"&gt;"[..], '>'),
            (&b"&quot;"[..], '"'),
            (&b"&apos;"[..], '\''),
        ]
        .into_iter()
        .find(|(pat, _)| rest.starts_with(pat));

        if let Some((pat, ch)) = named {
            out.push(ch);
            i += pat.len();
            copy_start = i;
            continue;
        }

        let numeric = if rest.starts_with(b"&#x") || rest.starts_with(b"&#X") {
            scan_numeric(bytes, i + 3, MAX_HEX_DIGITS, true)
                .map(|end| (end, u32::from_str_radix(&s[i + 3..end], 16).ok()))
        } else if rest.starts_with(b"&#") {
            scan_numeric(bytes, i + 2, MAX_DEC_DIGITS, false)
                .map(|end| (end, s[i + 2..end].parse::<u32>().ok()))
        } else {
            None
        };

        if let Some((end, code)) = numeric {
            match code.and_then(char::from_u32) {
                Some(ch) => out.push(ch),
                // Invalid scalar; preserve the whole reference unchanged.
                None => out.push_str(&s[i..=end]),
            }
            i = end + 1;
            copy_start = i;
            continue;
        }

        // Not a recognized entity; keep the '&' as-is.
        out.push('&');
        i += 1;
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}
