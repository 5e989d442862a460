//! # Query Literal Parser
//!
//! Parses the structured-data literal found in a query file into a JSON
//! value. The accepted syntax is the union of JSON and the usual
//! Python-style literal notation operators already keep their EQL bodies in:
//!
//! ```text
//! {
//!     'query': """
//!         process where process.name == "cmd.exe"
//!     """,
//!     'size': 100,
//!     'filter': {'range': {'@timestamp': {'gte': 'now-1d'}}},
//!     'fields': ('host.name', 'user.name'),   # tuples become arrays
//!     'tiebreaker_field': None,
//! }
//! ```
//!
//! Supported: mappings, lists, tuples, single/double/triple-quoted strings
//! with `r`/`u` prefixes and escapes (`\N{...}` excepted), adjacent string concatenation,
//! integers (decimal, hex, octal, binary, `_` separators), floats,
//! `True/False/None`, `true/false/null` and `#` comments.

use serde_json::{Map, Number, Value};

use crate::error::QueryParseError;

/// Parse a complete literal. Trailing input other than whitespace and
/// comments is an error.
pub fn parse(input: &str) -> Result<Value, QueryParseError> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.skip_trivia();
    if parser.peek().is_some() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> QueryParseError {
        let consumed = &self.chars[..self.pos.min(self.chars.len())];
        let line = consumed.iter().filter(|&&c| c == '\n').count() + 1;
        let column = consumed.iter().rev().take_while(|&&c| c != '\n').count() + 1;
        QueryParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: char) -> Result<(), QueryParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", want, c))),
            None => Err(self.error(format!("expected '{}', found end of input", want))),
        }
    }

    /// Skip whitespace, `#` comments and backslash line continuations.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else if c == '\\' && self.peek_at(1) == Some('\n') {
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn value(&mut self) -> Result<Value, QueryParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.mapping(),
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.parenthesized(),
            Some('\'' | '"') => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(false),
            Some('-') => {
                self.pos += 1;
                self.skip_trivia();
                self.number(true)
            }
            Some('+') => {
                self.pos += 1;
                self.skip_trivia();
                self.number(false)
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                if self.string_prefix_len().is_some() {
                    self.strings()
                } else {
                    self.keyword()
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn mapping(&mut self) -> Result<Value, QueryParseError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = self.value()?;
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(self.error("mapping keys must be strings or numbers"))
                }
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            if !self.separator('}')? {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, QueryParseError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            if !self.separator(close)? {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
        }
    }

    /// `()` is an empty tuple, `(x)` is just `x`, `(x,)` and `(x, y)` are tuples.
    fn parenthesized(&mut self) -> Result<Value, QueryParseError> {
        self.expect('(')?;
        self.skip_trivia();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value()?;
        self.skip_trivia();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(first);
        }
        let mut items = vec![first];
        loop {
            if !self.separator(')')? {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            self.skip_trivia();
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
        }
    }

    /// After an element: consume a `,` and return `true`, or leave the
    /// closing delimiter in place and return `false`.
    fn separator(&mut self, close: char) -> Result<bool, QueryParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(',') => {
                self.pos += 1;
                Ok(true)
            }
            Some(c) if c == close => Ok(false),
            Some(c) => Err(self.error(format!("expected ',' or '{}', found '{}'", close, c))),
            None => Err(self.error(format!("expected ',' or '{}', found end of input", close))),
        }
    }

    fn keyword(&mut self) -> Result<Value, QueryParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error(format!("unsupported name '{}'", word)))
            }
        }
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    fn number(&mut self, negative: bool) -> Result<Value, QueryParseError> {
        let start = self.pos;
        let mut token = String::new();
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && matches!(token.chars().last(), Some('e' | 'E'))
                && !token.starts_with("0x")
                && !token.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                if c != '_' {
                    token.push(c);
                }
                self.pos += 1;
            } else {
                break;
            }
        }
        if token.is_empty() {
            return Err(self.error("expected a number"));
        }

        let radix = match token.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };

        let parsed = if let Some(radix) = radix {
            i64::from_str_radix(&token[2..], radix)
                .ok()
                .map(|n| Number::from(if negative { -n } else { n }))
        } else if token.contains(&['.', 'e', 'E'][..]) {
            token
                .parse::<f64>()
                .ok()
                .and_then(|f| Number::from_f64(if negative { -f } else { f }))
        } else if negative {
            format!("-{}", token).parse::<i64>().ok().map(Number::from)
        } else {
            token
                .parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| token.parse::<u64>().ok().map(Number::from))
        };

        parsed.map(Value::Number).ok_or_else(|| {
            self.pos = start;
            self.error(format!("invalid number '{}'", token))
        })
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Length of a string prefix (`r`, `u`, `R`, `U`) directly followed by a
    /// quote, if one starts at the cursor.
    fn string_prefix_len(&self) -> Option<usize> {
        match (self.peek(), self.peek_at(1)) {
            (Some('r' | 'R' | 'u' | 'U'), Some('\'' | '"')) => Some(1),
            _ => None,
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, QueryParseError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            let next_is_string =
                matches!(self.peek(), Some('\'' | '"')) || self.string_prefix_len().is_some();
            if !next_is_string {
                self.pos = save;
                return Ok(Value::String(out));
            }
            out.push_str(&self.string()?);
        }
    }

    fn string(&mut self) -> Result<String, QueryParseError> {
        let mut raw = false;
        if let Some(len) = self.string_prefix_len() {
            raw = matches!(self.peek(), Some('r' | 'R'));
            self.pos += len;
        }
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a string")),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("unterminated string")),
            };
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\n' && !triple {
                self.pos -= 1;
                return Err(self.error("unterminated string"));
            } else if c == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out)?;
                }
            } else {
                out.push(c);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), QueryParseError> {
        let c = match self.bump() {
            Some(c) => c,
            None => return Err(self.error("unterminated escape sequence")),
        };
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0'..='7' => out.push(self.octal_escape(c)?),
            'N' => return Err(self.error("named unicode escapes (\\N{...}) are not supported")),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// `\o`, `\oo` or `\ooo`; `first` is the digit already consumed.
    fn octal_escape(&mut self, first: char) -> Result<char, QueryParseError> {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek().and_then(|d| d.to_digit(8)) {
                Some(d) => {
                    code = code * 8 + d;
                    self.pos += 1;
                }
                None => break,
            }
        }
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid octal escape {:o}", code)))
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, QueryParseError> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(self.error("truncated hex escape"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| self.error(format!("invalid hex escape '{}'", hex)))?;
        let c = char::from_u32(code)
            .ok_or_else(|| self.error(format!("escape '{}' is not a valid character", hex)))?;
        self.pos = end;
        Ok(c)
    }
}
