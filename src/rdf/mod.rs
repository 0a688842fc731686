//! Wire formats for provenance graphs
//!
//! [`serialize`] renders a [`RecordSet`] in any supported [`ContentType`].
//! Triple formats go through [`mapping::triples`] (the PROV-O view of the
//! records); PROV-N, PROV-JSON and DOT are written from the records directly.

pub mod dot;
pub mod format;
pub mod jsonld;
pub mod mapping;
pub mod ntriples;
pub mod provjson;
pub mod provn;
pub mod rdfxml;
pub mod turtle;

pub use format::ContentType;

use crate::error::{ProvError, ProvResult};
use crate::prov::RecordSet;
use std::collections::HashMap;
use std::fmt;

pub const PROV: &str = "http://www.w3.org/ns/prov#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";

/// Prefix bound to the document namespace
pub const DOC_PREFIX: &str = "gitprov";

/// Vocabulary prefixes known everywhere
pub const STANDARD_PREFIXES: [(&str, &str); 5] = [
    ("prov", PROV),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("xsd", XSD),
    ("foaf", FOAF),
];

/// An RDF term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    /// A `None` datatype means `xsd:string` (or `rdf:langString` with a language)
    Literal {
        value: String,
        datatype: Option<String>,
        lang: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Typed literal. `xsd:string` collapses to a plain literal.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Term::Literal {
            value: value.into(),
            datatype: (datatype != format!("{}string", XSD)).then_some(datatype),
            lang: None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Lexical value: the IRI, blank label or literal text
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(v) | Term::Blank(v) => v,
            Term::Literal { value, .. } => value,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }
}

/// N-Triples rendering
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal {
                value,
                datatype,
                lang,
            } => {
                write!(f, "\"{}\"", escape_literal(value))?;
                if let Some(lang) = lang {
                    write!(f, "@{}", lang)
                } else if let Some(datatype) = datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// Prefix table for a document: the vocabularies plus `gitprov` for `namespace`.
pub fn prefixes(namespace: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = vec![(DOC_PREFIX.to_string(), namespace.to_string())];
    out.extend(
        STANDARD_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string())),
    );
    out
}

/// Compact `iri` to `prefix:local` when a prefix matches and the local part
/// is a simple name.
pub fn compact(iri: &str, prefixes: &[(String, String)]) -> Option<String> {
    prefixes.iter().find_map(|(prefix, ns)| {
        let local = iri.strip_prefix(ns.as_str())?;
        is_simple_local(local).then(|| format!("{}:{}", prefix, local))
    })
}

fn is_simple_local(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Triples grouped by subject, subjects in first-seen order
pub fn group_by_subject(triples: &[Triple]) -> Vec<(&Term, Vec<&Triple>)> {
    let mut index: HashMap<&Term, usize> = HashMap::new();
    let mut groups: Vec<(&Term, Vec<&Triple>)> = Vec::new();
    for t in triples {
        let idx = *index.entry(&t.subject).or_insert_with(|| {
            groups.push((&t.subject, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(t);
    }
    groups
}

/// Escape a literal for N-Triples / Turtle double-quoted strings
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Render `records` as `content_type`.
pub fn serialize(records: &RecordSet, content_type: ContentType) -> ProvResult<Vec<u8>> {
    let prefixes = prefixes(&records.namespace);
    let graph = graph_name(records);
    let text = match content_type {
        ContentType::ProvN => provn::write(records),
        ContentType::ProvJson => provjson::write(records)?,
        ContentType::Dot => dot::write(records),
        ContentType::Turtle => turtle::write(&mapping::triples(records), &prefixes),
        ContentType::TriG => turtle::write_trig(&mapping::triples(records), &prefixes, &graph),
        ContentType::RdfXml => rdfxml::write(&mapping::triples(records), &prefixes)?,
        ContentType::JsonLd => jsonld::write(&mapping::triples(records), &prefixes)?,
        ContentType::NTriples => ntriples::write(&mapping::triples(records)),
        ContentType::NQuads => ntriples::write_quads(&mapping::triples(records), &graph),
        ContentType::Png | ContentType::Svg | ContentType::Jpeg | ContentType::Pdf => {
            return Err(ProvError::UnsupportedFormat(content_type.mime().to_string()))
        }
    };
    Ok(text.into_bytes())
}

/// Named graph holding a document in quad formats
fn graph_name(records: &RecordSet) -> String {
    records.namespace.trim_end_matches('#').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        let prefixes = prefixes("http://localhost:8080/owner/o/n#");
        assert_eq!(
            compact("http://www.w3.org/ns/prov#Activity", &prefixes).as_deref(),
            Some("prov:Activity")
        );
        assert_eq!(
            compact("http://localhost:8080/owner/o/n#commit-abc", &prefixes).as_deref(),
            Some("gitprov:commit-abc")
        );
        // percent-encoded locals stay full IRIs
        assert_eq!(
            compact("http://localhost:8080/owner/o/n#file-%C3%A9", &prefixes),
            None
        );
        assert_eq!(compact("http://example.org/x", &prefixes), None);
    }

    #[test]
    fn test_typed_string_is_plain() {
        assert_eq!(
            Term::typed("x", format!("{}string", XSD)),
            Term::literal("x")
        );
    }

    #[test]
    fn test_literal_display_escapes() {
        let term = Term::literal("say \"hi\"\nbye");
        assert_eq!(term.to_string(), r#""say \"hi\"\nbye""#);
    }

    #[test]
    fn test_binary_formats_unsupported() {
        let records = RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![],
            agents: vec![],
            entities: vec![],
            base_entities: vec![],
            relations: vec![],
        };
        let err = serialize(&records, ContentType::Png).unwrap_err();
        assert!(matches!(err, ProvError::UnsupportedFormat(_)));
    }
}
