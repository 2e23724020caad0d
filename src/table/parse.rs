//! Parser for `var searchData=[...];` table files.
//!
//! The grammar is the small subset of JavaScript the generator emits:
//!
//! ```text
//! file   := 'var' 'searchData' '=' '[' (entry (',' entry)* ','?)? ']' ';'
//! entry  := '[' string ',' '[' string (',' target)+ ']' ']'
//! target := '[' string ',' int ',' string ']'
//!         | '[' string ',' string ']'
//! ```
//!
//! Whitespace is allowed between any two tokens. Strings may use either quote
//! character.

use super::entry::{SearchEntry, SearchTable, Target};
use crate::error::ParseError;

/// Parses a whole table file.
pub fn parse_table(source: &str) -> Result<SearchTable, ParseError> {
    let mut parser = Parser::new(source);

    parser.skip_ws();
    parser.keyword("var")?;
    parser.skip_ws();
    parser.keyword("searchData")?;
    parser.skip_ws();
    parser.expect('=')?;
    parser.skip_ws();
    parser.expect('[')?;

    let mut entries = Vec::new();
    loop {
        parser.skip_ws();
        if parser.eat(']') {
            break;
        }
        entries.push(parser.entry()?);
        parser.skip_ws();
        if !parser.eat(',') {
            parser.expect(']')?;
            break;
        }
    }

    parser.skip_ws();
    parser.expect(';')?;

    let trailing = parser.rest();
    if let Some((offset, c)) = trailing
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
    {
        return Err(parser.error_at(parser.pos + offset, "end of input", describe(Some(c))));
    }

    tracing::trace!("Parsed search table with {} entries", entries.len());
    Ok(SearchTable::new(entries).with_trailing(trailing))
}

/// Parses a single `[token, [label, target...]]` record.
pub fn parse_entry(source: &str) -> Result<SearchEntry, ParseError> {
    let mut parser = Parser::new(source);
    parser.skip_ws();
    let entry = parser.entry()?;
    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(parser.error("end of input", describe(Some(c))));
    }
    Ok(entry)
}

/// Decodes the body of a JS string literal (without its quotes).
pub(crate) fn unescape_js(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'u' => {
                let code: String = chars.by_ref().take(4).collect();
                if code.len() != 4 {
                    return None;
                }
                let value = u32::from_str_radix(&code, 16).ok()?;
                out.push(char::from_u32(value)?);
            }
            other => out.push(other),
        }
    }
    Some(out)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("'{}'", expected), describe(self.peek())))
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.rest().starts_with(word) {
            self.pos += word.len();
            Ok(())
        } else {
            let found: String = self.rest().chars().take(word.len()).collect();
            let found = if found.is_empty() {
                describe(None)
            } else {
                format!("'{}'", found)
            };
            Err(self.error(format!("'{}'", word), found))
        }
    }

    fn entry(&mut self) -> Result<SearchEntry, ParseError> {
        self.expect('[')?;
        self.skip_ws();
        let token = self.string()?;
        self.comma()?;
        self.expect('[')?;
        self.skip_ws();
        let label = self.string()?;

        let mut targets = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') && !targets.is_empty() {
                self.pos += 1;
                break;
            }
            self.comma()?;
            targets.push(self.target()?);
        }

        self.skip_ws();
        self.expect(']')?;
        Ok(SearchEntry::new(token, label, targets))
    }

    fn target(&mut self) -> Result<Target, ParseError> {
        self.expect('[')?;
        self.skip_ws();
        let url = self.string()?;
        self.comma()?;

        let target = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let local = self.flag()?;
            self.comma()?;
            let scope = self.string()?;
            Target {
                url,
                local: Some(local),
                scope,
            }
        } else {
            let scope = self.string()?;
            Target {
                url,
                local: None,
                scope,
            }
        };

        self.skip_ws();
        self.expect(']')?;
        Ok(target)
    }

    /// `,` with surrounding whitespace.
    fn comma(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        self.expect(',')?;
        self.skip_ws();
        Ok(())
    }

    fn flag(&mut self) -> Result<bool, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        match &self.src[start..self.pos] {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(self.error_at(start, "link flag 0 or 1", format!("'{}'", other))),
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            other => return Err(self.error("string literal", describe(other))),
        };
        self.pos += 1;

        let body_start = self.pos;
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "closing quote", describe(None))),
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(self.error_at(start, "closing quote", describe(None)));
                    }
                }
                Some('\n') => {
                    return Err(self.error_at(self.pos - 1, "closing quote", describe(Some('\n'))));
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }

        let body = &self.src[body_start..self.pos - 1];
        unescape_js(body).ok_or_else(|| {
            self.error_at(start, "valid string escape", format!("'{}'", body))
        })
    }

    fn error(&self, expected: impl Into<String>, found: String) -> ParseError {
        self.error_at(self.pos, expected, found)
    }

    fn error_at(&self, offset: usize, expected: impl Into<String>, found: String) -> ParseError {
        let before = &self.src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        ParseError {
            offset,
            line,
            column,
            expected: expected.into(),
            found,
        }
    }
}

fn describe(c: Option<char>) -> String {
    match c {
        None => "end of input".to_string(),
        Some('\n') => "newline".to_string(),
        Some(c) => format!("'{}'", c),
    }
}
