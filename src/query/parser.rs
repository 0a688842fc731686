//! Query text → [`Query`]
//!
//! Supports `PREFIX`/`BASE`, `SELECT [DISTINCT] ?v… | *`, `CONSTRUCT { … }`,
//! a `WHERE` basic graph pattern with `;` and `,` abbreviations, and the
//! `ORDER BY`, `LIMIT` and `OFFSET` modifiers.

use crate::error::{ProvError, ProvResult};
use crate::rdf::{Term, RDF, STANDARD_PREFIXES, XSD};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum PatternTerm {
    Var(String),
    Term(Term),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryForm {
    /// `None` projects every variable of the pattern (`SELECT *`)
    Select {
        distinct: bool,
        variables: Option<Vec<String>>,
    },
    Construct {
        template: Vec<TriplePattern>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub variable: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub form: QueryForm,
    pub pattern: Vec<TriplePattern>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Prefixes declared by the query, in order
    pub prefixes: Vec<(String, String)>,
}

impl Query {
    /// Variables of the pattern in order of first appearance
    pub fn pattern_variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for tp in &self.pattern {
            for term in [&tp.subject, &tp.predicate, &tp.object] {
                if let PatternTerm::Var(v) = term {
                    if !vars.contains(v) {
                        vars.push(v.clone());
                    }
                }
            }
        }
        vars
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Iri(String),
    /// `prefix:local`; a bare `prefix:` has an empty local part
    PName(String, String),
    Var(String),
    Str(String),
    LangTag(String),
    Number(String),
    Word(String),
    DoubleCaret,
    Punct(char),
}

fn tokenize(text: &str) -> ProvResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<Chars> = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '<' => {
                chars.next();
                let mut iri = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some(c) if c.is_whitespace() => {
                            return Err(query_error("whitespace inside IRI"))
                        }
                        Some(c) => iri.push(c),
                        None => return Err(query_error("unterminated IRI")),
                    }
                }
                tokens.push(Token::Iri(iri));
            }
            '?' | '$' => {
                chars.next();
                let name = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_');
                if name.is_empty() {
                    return Err(query_error("empty variable name"));
                }
                tokens.push(Token::Var(name));
            }
            '"' | '\'' => {
                chars.next();
                tokens.push(Token::Str(string_body(&mut chars, ch)?));
            }
            '@' => {
                chars.next();
                let tag = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '-');
                tokens.push(Token::LangTag(tag));
            }
            '^' => {
                chars.next();
                if chars.next() != Some('^') {
                    return Err(query_error("expected '^^'"));
                }
                tokens.push(Token::DoubleCaret);
            }
            c if c.is_ascii_digit() || ((c == '-' || c == '+') && next_is_digit(&chars)) => {
                let mut number = String::new();
                number.push(c);
                chars.next();
                number.push_str(&take_while(&mut chars, |c| c.is_ascii_digit()));
                // a dot followed by digits is a decimal, otherwise a statement end
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('.') && lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                    chars.next();
                    number.push('.');
                    number.push_str(&take_while(&mut chars, |c| c.is_ascii_digit()));
                }
                tokens.push(Token::Number(number));
            }
            '{' | '}' | '.' | ';' | ',' | '*' | '(' | ')' => {
                chars.next();
                tokens.push(Token::Punct(ch));
            }
            c if c.is_alphabetic() || c == '_' || c == ':' => {
                let word = take_while(&mut chars, |c| {
                    c.is_alphanumeric() || c == '_' || c == '-' || c == ':' || c == '%'
                });
                match word.split_once(':') {
                    Some((prefix, local)) => {
                        tokens.push(Token::PName(prefix.to_string(), local.to_string()))
                    }
                    None => tokens.push(Token::Word(word)),
                }
            }
            other => return Err(query_error(&format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

fn next_is_digit(chars: &Peekable<Chars>) -> bool {
    let mut lookahead = chars.clone();
    lookahead.next();
    lookahead.peek().is_some_and(|c| c.is_ascii_digit())
}

fn take_while(chars: &mut Peekable<Chars>, pred: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !pred(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn string_body(chars: &mut Peekable<Chars>, quote: char) -> ProvResult<String> {
    let mut out = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(out),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(c @ ('"' | '\'' | '\\')) => out.push(c),
                _ => return Err(query_error("invalid escape in string")),
            },
            Some(c) => out.push(c),
            None => return Err(query_error("unterminated string")),
        }
    }
}

fn query_error(message: &str) -> ProvError {
    ProvError::Query(message.to_string())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
    declared: Vec<(String, String)>,
    base: Option<String>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ProvResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", keyword)))
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> ProvResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", c)))
        }
    }

    fn unexpected(&self, message: &str) -> ProvError {
        match self.peek() {
            Some(token) => query_error(&format!("{}, found {:?}", message, token)),
            None => query_error(&format!("{}, found end of query", message)),
        }
    }

    fn resolve_iri(&self, iri: String) -> String {
        match &self.base {
            Some(base) if !iri.contains(':') => format!("{}{}", base, iri),
            _ => iri,
        }
    }

    fn expand(&self, prefix: &str, local: &str) -> ProvResult<String> {
        self.prefixes
            .get(prefix)
            .map(|ns| format!("{}{}", ns, local))
            .ok_or_else(|| query_error(&format!("undeclared prefix '{}:'", prefix)))
    }

    fn prologue(&mut self) -> ProvResult<()> {
        loop {
            if self.eat_keyword("PREFIX") {
                let prefix = match self.advance() {
                    Some(Token::PName(prefix, local)) if local.is_empty() => prefix,
                    _ => return Err(query_error("expected prefix name after PREFIX")),
                };
                let ns = match self.advance() {
                    Some(Token::Iri(iri)) => self.resolve_iri(iri),
                    _ => return Err(query_error("expected IRI in PREFIX declaration")),
                };
                self.prefixes.insert(prefix.clone(), ns.clone());
                self.declared.push((prefix, ns));
            } else if self.eat_keyword("BASE") {
                match self.advance() {
                    Some(Token::Iri(iri)) => self.base = Some(iri),
                    _ => return Err(query_error("expected IRI after BASE")),
                }
            } else {
                return Ok(());
            }
        }
    }

    fn query(&mut self) -> ProvResult<Query> {
        self.prologue()?;

        let form = if self.eat_keyword("SELECT") {
            let distinct = self.eat_keyword("DISTINCT") || self.eat_keyword("REDUCED");
            let variables = if self.eat_punct('*') {
                None
            } else {
                let mut vars = Vec::new();
                while let Some(Token::Var(v)) = self.peek() {
                    vars.push(v.clone());
                    self.pos += 1;
                }
                if vars.is_empty() {
                    return Err(self.unexpected("expected variables or '*' after SELECT"));
                }
                Some(vars)
            };
            QueryForm::Select {
                distinct,
                variables,
            }
        } else if self.eat_keyword("CONSTRUCT") {
            self.expect_punct('{')?;
            let template = self.triples_block()?;
            self.expect_punct('}')?;
            QueryForm::Construct { template }
        } else {
            return Err(self.unexpected("expected SELECT or CONSTRUCT"));
        };

        self.eat_keyword("WHERE");
        self.expect_punct('{')?;
        let pattern = self.triples_block()?;
        self.expect_punct('}')?;

        let mut order_by = Vec::new();
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            order_by = self.order_keys()?;
        }

        let mut limit = None;
        let mut offset = None;
        loop {
            if self.eat_keyword("LIMIT") {
                limit = Some(self.integer()?);
            } else if self.eat_keyword("OFFSET") {
                offset = Some(self.integer()?);
            } else {
                break;
            }
        }

        if self.peek().is_some() {
            return Err(self.unexpected("unexpected trailing input"));
        }

        Ok(Query {
            form,
            pattern,
            order_by,
            limit,
            offset,
            prefixes: std::mem::take(&mut self.declared),
        })
    }

    fn order_keys(&mut self) -> ProvResult<Vec<OrderKey>> {
        let mut keys = Vec::new();
        loop {
            let descending = if self.eat_keyword("DESC") {
                true
            } else if self.eat_keyword("ASC") {
                false
            } else if let Some(Token::Var(v)) = self.peek() {
                keys.push(OrderKey {
                    variable: v.clone(),
                    descending: false,
                });
                self.pos += 1;
                continue;
            } else {
                break;
            };
            self.expect_punct('(')?;
            let variable = match self.advance() {
                Some(Token::Var(v)) => v,
                _ => return Err(query_error("expected variable in ORDER BY")),
            };
            self.expect_punct(')')?;
            keys.push(OrderKey {
                variable,
                descending,
            });
        }
        if keys.is_empty() {
            return Err(self.unexpected("expected ORDER BY condition"));
        }
        Ok(keys)
    }

    fn integer(&mut self) -> ProvResult<usize> {
        match self.advance() {
            Some(Token::Number(n)) => n
                .parse()
                .map_err(|_| query_error(&format!("invalid count '{}'", n))),
            _ => Err(query_error("expected integer")),
        }
    }

    /// Triples up to the closing `}`
    fn triples_block(&mut self) -> ProvResult<Vec<TriplePattern>> {
        let mut patterns = Vec::new();
        while !matches!(self.peek(), Some(Token::Punct('}')) | None) {
            let subject = self.term(false)?;
            self.property_list(&subject, &mut patterns)?;
            if !self.eat_punct('.') && !matches!(self.peek(), Some(Token::Punct('}'))) {
                return Err(self.unexpected("expected '.' or '}'"));
            }
        }
        Ok(patterns)
    }

    fn property_list(
        &mut self,
        subject: &PatternTerm,
        patterns: &mut Vec<TriplePattern>,
    ) -> ProvResult<()> {
        loop {
            let predicate = self.term(true)?;
            loop {
                let object = self.term(false)?;
                patterns.push(TriplePattern {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                if !self.eat_punct(',') {
                    break;
                }
            }
            if !self.eat_punct(';') {
                return Ok(());
            }
            // trailing ';' before '.' or '}'
            if matches!(self.peek(), Some(Token::Punct('.' | '}'))) {
                return Ok(());
            }
        }
    }

    fn term(&mut self, verb: bool) -> ProvResult<PatternTerm> {
        let token = self
            .advance()
            .ok_or_else(|| query_error("unexpected end of query"))?;
        let term = match token {
            Token::Var(v) => return Ok(PatternTerm::Var(v)),
            Token::Iri(iri) => Term::Iri(self.resolve_iri(iri)),
            Token::PName(prefix, local) => Term::Iri(self.expand(&prefix, &local)?),
            Token::Word(w) if verb && w == "a" => Term::Iri(format!("{}type", RDF)),
            Token::Word(w) if !verb && (w == "true" || w == "false") => {
                Term::typed(w, format!("{}boolean", XSD))
            }
            Token::Str(value) if !verb => match self.peek().cloned() {
                Some(Token::LangTag(lang)) => {
                    self.pos += 1;
                    Term::Literal {
                        value,
                        datatype: None,
                        lang: Some(lang),
                    }
                }
                Some(Token::DoubleCaret) => {
                    self.pos += 1;
                    let datatype = match self.advance() {
                        Some(Token::Iri(iri)) => self.resolve_iri(iri),
                        Some(Token::PName(prefix, local)) => self.expand(&prefix, &local)?,
                        _ => return Err(query_error("expected datatype IRI after '^^'")),
                    };
                    Term::typed(value, datatype)
                }
                _ => Term::literal(value),
            },
            Token::Number(n) if !verb => {
                let datatype = if n.contains('.') { "decimal" } else { "integer" };
                Term::typed(n, format!("{}{}", XSD, datatype))
            }
            other => {
                return Err(query_error(&format!(
                    "unexpected {:?} in triple pattern",
                    other
                )))
            }
        };
        Ok(PatternTerm::Term(term))
    }
}

/// Parse a query. The vocabulary prefixes are predeclared; `extra` adds more
/// (e.g. the document namespace).
pub fn parse_query(text: &str, extra: &[(String, String)]) -> ProvResult<Query> {
    let mut prefixes: HashMap<String, String> = STANDARD_PREFIXES
        .iter()
        .map(|(p, ns)| (p.to_string(), ns.to_string()))
        .collect();
    for (p, ns) in extra {
        prefixes.insert(p.clone(), ns.clone());
    }

    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
        prefixes,
        declared: Vec::new(),
        base: None,
    };
    parser.query()
}
