//! Source analysis and dependency rewriting
//!
//! Scans module source for `require(...)` call sites, records each
//! specifier, and rewrites the call to the bundle runtime's loader symbol
//! with the resolved module id filled in later. The scanner understands
//! string literals, template literals, and comments, so call-site lookalikes
//! inside those are left alone. Regular expression literals are not
//! recognized, and interpolations inside template literals are skipped as
//! opaque text.
//!
//! Rewriting is two-phase: `analyze` splits the text around call sites and
//! collects specifiers; once the graph builder has resolved every specifier
//! to a module id, `Analysis::bind` produces the final source.

use std::path::Path;

use tracing::trace;

use crate::compiler::RUNTIME_REQUIRE;
use crate::error::{Error, Result};
use crate::utils::escape_js_string;

/// The call-site identifier the analyzer recognizes.
const DEPENDENCY_CALLEE: &str = "require";

/// Rewritten source skeleton plus the discovered specifiers.
///
/// `segments` holds the literal text between call sites; there is always
/// one more segment than there are specifiers.
#[derive(Debug)]
pub struct Analysis {
    segments: Vec<String>,
    specifiers: Vec<String>,
}

impl Analysis {
    /// Specifiers in call-site order. Duplicates are kept: each call site
    /// binds independently.
    pub fn specifiers(&self) -> &[String] {
        &self.specifiers
    }

    /// Fill in one resolved module id per call site, in order.
    pub fn bind(&self, ids: &[String]) -> String {
        debug_assert_eq!(ids.len(), self.specifiers.len());
        let mut out = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            out.push_str(segment);
            if let Some(id) = ids.get(index) {
                out.push_str(RUNTIME_REQUIRE);
                out.push_str("(\"");
                out.push_str(&escape_js_string(id));
                out.push_str("\")");
            }
        }
        out
    }
}

/// Scan `source` for dependency call sites.
pub fn analyze(source: &str, path: &Path) -> Result<Analysis> {
    Scanner::new(source, path).scan()
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    path: &'a Path,
    pos: usize,
    /// Last significant byte seen outside strings and comments.
    prev: Option<u8>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, path: &'a Path) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            path,
            pos: 0,
            prev: None,
        }
    }

    fn scan(mut self) -> Result<Analysis> {
        let mut segments = Vec::new();
        let mut specifiers = Vec::new();
        let mut segment_start = 0;

        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            if byte == b'/' && self.peek(1) == Some(b'/') {
                self.skip_line_comment();
            } else if byte == b'/' && self.peek(1) == Some(b'*') {
                self.skip_block_comment()?;
            } else if byte == b'\'' || byte == b'"' {
                self.skip_string(byte)?;
                self.prev = Some(byte);
            } else if byte == b'`' {
                self.skip_template()?;
                self.prev = Some(byte);
            } else if is_ident_start(byte) {
                let start = self.pos;
                let callee_position = self.is_callee_position();
                let ident = self.read_identifier();
                if ident == DEPENDENCY_CALLEE && callee_position {
                    if let Some(specifier) = self.try_call_site(start)? {
                        segments.push(self.source[segment_start..start].to_string());
                        specifiers.push(specifier);
                        segment_start = self.pos;
                        self.prev = Some(b')');
                        continue;
                    }
                }
                self.prev = Some(self.bytes[self.pos - 1]);
            } else {
                if !byte.is_ascii_whitespace() {
                    self.prev = Some(byte);
                }
                self.advance_char();
            }
        }

        segments.push(self.source[segment_start..].to_string());
        trace!(
            "found {} dependency call site(s) in '{}'",
            specifiers.len(),
            self.path.display()
        );
        Ok(Analysis {
            segments,
            specifiers,
        })
    }

    /// True unless the previous significant byte makes this identifier a
    /// member access or the tail of a longer name.
    fn is_callee_position(&self) -> bool {
        match self.prev {
            Some(b'.') => false,
            Some(byte) if is_ident_byte(byte) => false,
            _ => true,
        }
    }

    /// Try to parse a full dependency call just past the callee identifier.
    ///
    /// Returns the specifier, or None when no call follows (position is
    /// restored). Anything other than a single plain string-literal
    /// argument is a dynamic dependency and fails the compilation.
    fn try_call_site(&mut self, callee_start: usize) -> Result<Option<String>> {
        let checkpoint = self.pos;
        self.skip_trivia()?;
        if self.peek(0) != Some(b'(') {
            self.pos = checkpoint;
            return Ok(None);
        }
        self.pos += 1;
        self.skip_trivia()?;

        let quote = match self.peek(0) {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.dynamic_dependency(callee_start)),
        };
        let specifier = self.read_string_literal(quote)?;

        self.skip_trivia()?;
        if self.peek(0) != Some(b')') {
            return Err(self.dynamic_dependency(callee_start));
        }
        self.pos += 1;
        Ok(Some(specifier))
    }

    /// Consume a string literal and return its unescaped value.
    fn read_string_literal(&mut self, quote: u8) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            if byte == quote {
                self.pos += 1;
                return Ok(value);
            }
            if byte == b'\n' {
                break;
            }
            if byte == b'\\' {
                self.pos += 1;
                let Some(escaped) = self.source[self.pos..].chars().next() else {
                    break;
                };
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
                self.pos += escaped.len_utf8();
                continue;
            }
            let c = self.source[self.pos..].chars().next().unwrap_or('\0');
            value.push(c);
            self.pos += c.len_utf8().max(1);
        }

        Err(self.parse_error(start, "unterminated string literal"))
    }

    /// Skip over a string literal without collecting its value.
    fn skip_string(&mut self, quote: u8) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            if byte == quote {
                self.pos += 1;
                return Ok(());
            }
            if byte == b'\n' {
                break;
            }
            if byte == b'\\' {
                self.pos += 1;
            }
            self.advance_char();
        }
        Err(self.parse_error(start, "unterminated string literal"))
    }

    /// Skip a template literal, including `${ ... }` interpolations.
    fn skip_template(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'\\' => {
                    self.pos += 1;
                    self.advance_char();
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_template_expr()?;
                }
                _ => self.advance_char(),
            }
        }
        Err(self.parse_error(start, "unterminated template literal"))
    }

    /// Skip a `${ ... }` expression, tracking nested braces and strings.
    fn skip_template_expr(&mut self) -> Result<()> {
        let start = self.pos;
        let mut depth = 1usize;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                quote @ (b'\'' | b'"') => self.skip_string(quote)?,
                b'`' => self.skip_template()?,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                _ => self.advance_char(),
            }
        }
        Err(self.parse_error(start, "unterminated template expression"))
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            self.advance_char();
        }
        Err(self.parse_error(start, "unterminated block comment"))
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek(0) {
                Some(byte) if byte.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                Some(b'/') if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn read_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Advance past the char starting at the current position.
    fn advance_char(&mut self) {
        match self.source.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(c) => self.pos += c.len_utf8(),
            None => self.pos = self.bytes.len(),
        }
    }

    fn parse_error(&self, offset: usize, message: &str) -> Error {
        let (line, column) = self.position(offset);
        Error::Parse {
            path: self.path.to_path_buf(),
            line,
            column,
            message: message.to_string(),
        }
    }

    fn dynamic_dependency(&self, offset: usize) -> Error {
        let (line, column) = self.position(offset);
        Error::UnsupportedDynamicDependency {
            path: self.path.to_path_buf(),
            line,
            column,
        }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let mut line = 1;
        let mut column = 1;
        for byte in &self.bytes[..offset] {
            if *byte == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte == b'_' || byte == b'$' || byte.is_ascii_alphabetic()
}

fn is_ident_byte(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}
