//! JSON-LD writer (flattened, one node object per subject)

use super::{compact, group_by_subject, Term, Triple, RDF};
use crate::error::ProvResult;
use serde_json::{json, Map, Value};

fn id(iri: &str, prefixes: &[(String, String)]) -> String {
    compact(iri, prefixes).unwrap_or_else(|| iri.to_string())
}

fn node_ref(term: &Term, prefixes: &[(String, String)]) -> String {
    match term {
        Term::Blank(label) => format!("_:{}", label),
        other => id(other.value(), prefixes),
    }
}

fn object(term: &Term, prefixes: &[(String, String)]) -> Value {
    match term {
        Term::Iri(_) | Term::Blank(_) => json!({ "@id": node_ref(term, prefixes) }),
        Term::Literal {
            value,
            datatype,
            lang,
        } => {
            let mut obj = Map::new();
            obj.insert("@value".to_string(), Value::String(value.clone()));
            if let Some(lang) = lang {
                obj.insert("@language".to_string(), Value::String(lang.clone()));
            } else if let Some(datatype) = datatype {
                obj.insert("@type".to_string(), Value::String(id(datatype, prefixes)));
            }
            Value::Object(obj)
        }
    }
}

pub fn write(triples: &[Triple], prefixes: &[(String, String)]) -> ProvResult<String> {
    let context: Map<String, Value> = prefixes
        .iter()
        .map(|(prefix, ns)| (prefix.clone(), Value::String(ns.clone())))
        .collect();
    let rdf_type = format!("{}type", RDF);

    let mut graph = Vec::new();
    for (subject, statements) in group_by_subject(triples) {
        let mut node = Map::new();
        node.insert("@id".to_string(), Value::String(node_ref(subject, prefixes)));

        for t in statements {
            let predicate = t.predicate.value();
            if predicate == rdf_type && !t.object.is_literal() {
                let types = node
                    .entry("@type")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(types) = types {
                    types.push(Value::String(node_ref(&t.object, prefixes)));
                }
                continue;
            }
            let values = node
                .entry(id(predicate, prefixes))
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = values {
                values.push(object(&t.object, prefixes));
            }
        }
        graph.push(Value::Object(node));
    }

    let document = json!({
        "@context": Value::Object(context),
        "@graph": graph,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{prefixes, PROV, RDFS, XSD};

    #[test]
    fn test_node_objects() {
        let ns = "http://localhost:8080/owner/o/n#";
        let s = Term::iri(format!("{}commit-c1", ns));
        let triples = vec![
            Triple::new(
                s.clone(),
                Term::iri(format!("{}type", RDF)),
                Term::iri(format!("{}Activity", PROV)),
            ),
            Triple::new(s.clone(), Term::iri(format!("{}label", RDFS)), Term::literal("Init")),
            Triple::new(
                s,
                Term::iri(format!("{}startedAtTime", PROV)),
                Term::typed("2021-03-01T12:00:00Z", format!("{}dateTime", XSD)),
            ),
        ];
        let text = write(&triples, &prefixes(ns)).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(doc["@context"]["prov"], PROV);
        let node = &doc["@graph"][0];
        assert_eq!(node["@id"], "gitprov:commit-c1");
        assert_eq!(node["@type"][0], "prov:Activity");
        assert_eq!(node["rdfs:label"][0]["@value"], "Init");
        assert_eq!(node["prov:startedAtTime"][0]["@type"], "xsd:dateTime");
    }
}
