//! Turtle and TriG writers

use super::{compact, escape_literal, group_by_subject, Term, Triple, RDF};
use std::fmt::Write;

/// Render a term with prefixed names where possible
pub fn term(term: &Term, prefixes: &[(String, String)]) -> String {
    match term {
        Term::Iri(iri) => compact(iri, prefixes).unwrap_or_else(|| format!("<{}>", iri)),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal {
            value,
            datatype,
            lang,
        } => {
            let mut out = format!("\"{}\"", escape_literal(value));
            if let Some(lang) = lang {
                let _ = write!(out, "@{}", lang);
            } else if let Some(datatype) = datatype {
                let _ = write!(out, "^^{}", term_iri(datatype, prefixes));
            }
            out
        }
    }
}

fn term_iri(iri: &str, prefixes: &[(String, String)]) -> String {
    compact(iri, prefixes).unwrap_or_else(|| format!("<{}>", iri))
}

fn predicate(p: &Term, prefixes: &[(String, String)]) -> String {
    if p.as_iri() == Some(format!("{}type", RDF).as_str()) {
        "a".to_string()
    } else {
        term(p, prefixes)
    }
}

pub fn write(triples: &[Triple], prefixes: &[(String, String)]) -> String {
    let mut out = String::new();
    write_prefixes(&mut out, prefixes);
    out.push('\n');
    write_statements(&mut out, triples, prefixes, "");
    out
}

/// TriG: the same statements inside one named graph
pub fn write_trig(triples: &[Triple], prefixes: &[(String, String)], graph: &str) -> String {
    let mut out = String::new();
    write_prefixes(&mut out, prefixes);
    out.push('\n');
    let _ = writeln!(out, "{} {{", term_iri(graph, prefixes));
    write_statements(&mut out, triples, prefixes, "    ");
    out.push_str("}\n");
    out
}

fn write_prefixes(out: &mut String, prefixes: &[(String, String)]) {
    for (prefix, ns) in prefixes {
        let _ = writeln!(out, "@prefix {}: <{}> .", prefix, ns);
    }
}

/// Predicates in first-seen order per subject
fn group(triples: &[Triple]) -> Vec<(&Term, Vec<(&Term, Vec<&Term>)>)> {
    group_by_subject(triples)
        .into_iter()
        .map(|(subject, statements)| {
            let mut predicates: Vec<(&Term, Vec<&Term>)> = Vec::new();
            for t in statements {
                match predicates.iter_mut().find(|(p, _)| *p == &t.predicate) {
                    Some((_, objects)) => objects.push(&t.object),
                    None => predicates.push((&t.predicate, vec![&t.object])),
                }
            }
            (subject, predicates)
        })
        .collect()
}

fn write_statements(out: &mut String, triples: &[Triple], prefixes: &[(String, String)], indent: &str) {
    for (subject, predicates) in group(triples) {
        let _ = write!(out, "{}{}", indent, term(subject, prefixes));
        let last = predicates.len().saturating_sub(1);
        for (i, (p, objects)) in predicates.iter().enumerate() {
            let objects: Vec<String> = objects.iter().map(|o| term(o, prefixes)).collect();
            let separator = if i == 0 {
                " ".to_string()
            } else {
                format!("{}    ", indent)
            };
            let end = if i == last { " ." } else { " ;" };
            let _ = writeln!(
                out,
                "{}{} {}{}",
                separator,
                predicate(p, prefixes),
                objects.join(", "),
                end
            );
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{prefixes, PROV, XSD};

    const NS: &str = "http://localhost:8080/owner/o/n#";

    fn sample() -> Vec<Triple> {
        vec![
            Triple::new(
                Term::iri(format!("{}commit-c1", NS)),
                Term::iri(format!("{}type", RDF)),
                Term::iri(format!("{}Activity", PROV)),
            ),
            Triple::new(
                Term::iri(format!("{}commit-c1", NS)),
                Term::iri(format!("{}startedAtTime", PROV)),
                Term::typed("2021-03-01T12:00:00Z", format!("{}dateTime", XSD)),
            ),
            Triple::new(
                Term::iri(format!("{}file-caf%C3%A9", NS)),
                Term::iri(format!("{}type", RDF)),
                Term::iri(format!("{}Entity", PROV)),
            ),
        ]
    }

    #[test]
    fn test_turtle_groups_by_subject() {
        let out = write(&sample(), &prefixes(NS));
        assert!(out.contains(&format!("@prefix gitprov: <{}> .", NS)));
        assert!(out.contains("gitprov:commit-c1 a prov:Activity ;\n"));
        assert!(out.contains(
            "    prov:startedAtTime \"2021-03-01T12:00:00Z\"^^xsd:dateTime .\n"
        ));
    }

    #[test]
    fn test_unsafe_local_names_stay_full_iris() {
        let out = write(&sample(), &prefixes(NS));
        assert!(out.contains(&format!("<{}file-caf%C3%A9> a prov:Entity .", NS)));
    }

    #[test]
    fn test_trig_wraps_graph() {
        let out = write_trig(&sample(), &prefixes(NS), "http://localhost:8080/owner/o/n");
        assert!(out.contains("<http://localhost:8080/owner/o/n> {\n"));
        assert!(out.trim_end().ends_with('}'));
        assert!(out.contains("    gitprov:commit-c1 a prov:Activity ;"));
    }
}
