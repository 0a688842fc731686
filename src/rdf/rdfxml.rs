//! RDF/XML writer
//!
//! One `rdf:Description` per subject. Predicates need an XML qualified name;
//! namespaces outside the prefix table are declared as `ns0`, `ns1`, ...

use super::{group_by_subject, Term, Triple, RDF};
use crate::error::{ProvError, ProvResult};
use std::collections::HashMap;
use std::fmt::Write;

/// Split an IRI into namespace and an XML-safe local name
fn split_qname(iri: &str) -> Option<(&str, &str)> {
    let cut = iri.rfind(&['#', '/'][..])? + 1;
    let (ns, local) = iri.split_at(cut);
    let mut chars = local.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        .then_some((ns, local))
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

pub fn write(triples: &[Triple], prefixes: &[(String, String)]) -> ProvResult<String> {
    let mut namespaces: Vec<(String, String)> = prefixes.to_vec();
    if !namespaces.iter().any(|(_, ns)| ns == RDF) {
        namespaces.push(("rdf".to_string(), RDF.to_string()));
    }

    // resolve every predicate up front so undeclared namespaces get a prefix
    let mut qnames: HashMap<&str, String> = HashMap::new();
    for t in triples {
        let iri = t.predicate.value();
        if qnames.contains_key(iri) {
            continue;
        }
        let (ns, local) = split_qname(iri).ok_or_else(|| {
            ProvError::UnsupportedFormat(format!(
                "application/rdf+xml cannot express predicate <{}>",
                iri
            ))
        })?;
        let prefix = match namespaces.iter().find(|(_, n)| n == ns) {
            Some((prefix, _)) => prefix.clone(),
            None => {
                let prefix = format!("ns{}", namespaces.len());
                namespaces.push((prefix.clone(), ns.to_string()));
                prefix
            }
        };
        qnames.insert(iri, format!("{}:{}", prefix, local));
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rdf:RDF");
    for (prefix, ns) in &namespaces {
        let _ = write!(out, "\n    xmlns:{}=\"{}\"", prefix, escape_xml(ns));
    }
    out.push_str(">\n");

    for (subject, statements) in group_by_subject(triples) {
        match subject {
            Term::Blank(label) => {
                let _ = writeln!(out, "  <rdf:Description rdf:nodeID=\"{}\">", escape_xml(label));
            }
            other => {
                let _ = writeln!(
                    out,
                    "  <rdf:Description rdf:about=\"{}\">",
                    escape_xml(other.value())
                );
            }
        }
        for t in statements {
            let qname = &qnames[t.predicate.value()];
            match &t.object {
                Term::Iri(iri) => {
                    let _ = writeln!(out, "    <{} rdf:resource=\"{}\"/>", qname, escape_xml(iri));
                }
                Term::Blank(label) => {
                    let _ = writeln!(out, "    <{} rdf:nodeID=\"{}\"/>", qname, escape_xml(label));
                }
                Term::Literal {
                    value,
                    datatype,
                    lang,
                } => {
                    let attr = match (lang, datatype) {
                        (Some(lang), _) => format!(" xml:lang=\"{}\"", escape_xml(lang)),
                        (None, Some(dt)) => format!(" rdf:datatype=\"{}\"", escape_xml(dt)),
                        (None, None) => String::new(),
                    };
                    let _ = writeln!(
                        out,
                        "    <{}{}>{}</{}>",
                        qname,
                        attr,
                        escape_xml(value),
                        qname
                    );
                }
            }
        }
        out.push_str("  </rdf:Description>\n");
    }

    out.push_str("</rdf:RDF>\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{prefixes, PROV, RDFS};

    #[test]
    fn test_description_per_subject() {
        let ns = "http://localhost:8080/owner/o/n#";
        let s = Term::iri(format!("{}commit-c1", ns));
        let triples = vec![
            Triple::new(
                s.clone(),
                Term::iri(format!("{}type", RDF)),
                Term::iri(format!("{}Activity", PROV)),
            ),
            Triple::new(
                s,
                Term::iri(format!("{}label", RDFS)),
                Term::literal("Fix <b> & co"),
            ),
        ];
        let xml = write(&triples, &prefixes(ns)).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert_eq!(xml.matches("<rdf:Description").count(), 1);
        assert!(xml.contains(&format!("rdf:about=\"{}commit-c1\"", ns)));
        assert!(xml.contains(&format!("<rdf:type rdf:resource=\"{}Activity\"/>", PROV)));
        assert!(xml.contains("<rdfs:label>Fix &lt;b&gt; &amp; co</rdfs:label>"));
    }

    #[test]
    fn test_unknown_namespace_declared() {
        let triples = vec![Triple::new(
            Term::iri("http://ex.org/a"),
            Term::iri("http://other.org/vocab/size"),
            Term::typed("3", "http://www.w3.org/2001/XMLSchema#int"),
        )];
        let xml = write(&triples, &prefixes("http://ex.org/#")).unwrap();
        assert!(xml.contains("xmlns:ns6=\"http://other.org/vocab/\""));
        assert!(xml.contains("<ns6:size rdf:datatype=\"http://www.w3.org/2001/XMLSchema#int\">3</ns6:size>"));
    }

    #[test]
    fn test_predicate_without_qname_rejected() {
        let triples = vec![Triple::new(
            Term::iri("http://ex.org/a"),
            Term::iri("http://ex.org/123"),
            Term::literal("x"),
        )];
        assert!(write(&triples, &[]).is_err());
    }
}
