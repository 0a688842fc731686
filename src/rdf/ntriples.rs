//! N-Triples and N-Quads
//!
//! The parser reads one statement per line and accepts an optional graph
//! label, so N-Quads documents load as their union graph.

use super::{Term, Triple};
use crate::error::{ProvError, ProvResult};
use std::fmt::Write;

pub fn write(triples: &[Triple]) -> String {
    let mut out = String::new();
    for t in triples {
        let _ = writeln!(out, "{} {} {} .", t.subject, t.predicate, t.object);
    }
    out
}

/// N-Quads with every triple in the graph `graph`
pub fn write_quads(triples: &[Triple], graph: &str) -> String {
    let mut out = String::new();
    for t in triples {
        let _ = writeln!(
            out,
            "{} {} {} <{}> .",
            t.subject, t.predicate, t.object, graph
        );
    }
    out
}

/// Parse an N-Triples (or N-Quads) document.
pub fn parse(input: &str) -> ProvResult<Vec<Triple>> {
    let mut triples = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let mut cursor = Cursor::new(line, line_no);
        cursor.skip_ws();
        if cursor.at_end() || cursor.peek() == Some('#') {
            continue;
        }

        let subject = cursor.term()?;
        if subject.is_literal() {
            return Err(cursor.error("literal in subject position"));
        }
        let predicate = cursor.term()?;
        if !matches!(predicate, Term::Iri(_)) {
            return Err(cursor.error("predicate must be an IRI"));
        }
        let object = cursor.term()?;

        cursor.skip_ws();
        if cursor.peek() != Some('.') {
            // graph label
            let graph = cursor.term()?;
            if graph.is_literal() {
                return Err(cursor.error("literal as graph label"));
            }
            cursor.skip_ws();
        }
        if cursor.bump() != Some('.') {
            return Err(cursor.error("expected '.'"));
        }
        cursor.skip_ws();
        if !(cursor.at_end() || cursor.peek() == Some('#')) {
            return Err(cursor.error("trailing content after '.'"));
        }

        triples.push(Triple::new(subject, predicate, object));
    }
    Ok(triples)
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self {
            chars: text.chars().peekable(),
            line,
        }
    }

    fn error(&self, message: &str) -> ProvError {
        ProvError::parse(self.line, message)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.chars.next();
        }
    }

    fn term(&mut self) -> ProvResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri()?)),
            Some('_') => self.blank(),
            Some('"') => self.literal(),
            Some(c) => Err(self.error(&format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of line")),
        }
    }

    fn iri(&mut self) -> ProvResult<String> {
        self.bump(); // <
        let mut iri = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(iri),
                Some('\\') => iri.push(self.unicode_escape()?),
                Some(c) if c == ' ' || c == '<' || c == '"' => {
                    return Err(self.error(&format!("invalid character '{}' in IRI", c)))
                }
                Some(c) => iri.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    fn blank(&mut self) -> ProvResult<Term> {
        self.bump();
        if self.bump() != Some(':') {
            return Err(self.error("expected '_:'"));
        }
        let mut label = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                label.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(Term::Blank(label))
    }

    fn literal(&mut self) -> ProvResult<Term> {
        self.bump(); // "
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some('\\') => value.push('\\'),
                    Some('u') => value.push(self.hex_char(4)?),
                    Some('U') => value.push(self.hex_char(8)?),
                    _ => return Err(self.error("invalid escape in literal")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }

        match self.peek() {
            Some('@') => {
                self.bump();
                let mut lang = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        lang.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(Term::Literal {
                    value,
                    datatype: None,
                    lang: Some(lang),
                })
            }
            Some('^') => {
                self.bump();
                if self.bump() != Some('^') || self.peek() != Some('<') {
                    return Err(self.error("expected '^^<datatype>'"));
                }
                let datatype = self.iri()?;
                Ok(Term::typed(value, datatype))
            }
            _ => Ok(Term::literal(value)),
        }
    }

    fn unicode_escape(&mut self) -> ProvResult<char> {
        match self.bump() {
            Some('u') => self.hex_char(4),
            Some('U') => self.hex_char(8),
            _ => Err(self.error("invalid escape in IRI")),
        }
    }

    fn hex_char(&mut self, digits: usize) -> ProvResult<char> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error("invalid unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid code point"))
    }
}
