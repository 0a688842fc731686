//! Result encodings for query answers

use super::{QueryOutcome, SelectResult};
use crate::error::{ProvError, ProvResult};
use crate::rdf::format::mime_essence;
use crate::rdf::rdfxml::escape_xml;
use crate::rdf::{ntriples, rdfxml, turtle, Term};
use serde_json::{json, Map, Value};
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

/// Encoding of a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Text,
    Xml,
    Csv,
    Json,
    Tsv,
    Turtle,
    NTriples,
    RdfXml,
    N3,
}

impl ResultFormat {
    pub const ALL: [ResultFormat; 9] = [
        ResultFormat::Text,
        ResultFormat::Xml,
        ResultFormat::Csv,
        ResultFormat::Json,
        ResultFormat::Tsv,
        ResultFormat::Turtle,
        ResultFormat::NTriples,
        ResultFormat::RdfXml,
        ResultFormat::N3,
    ];

    pub fn from_mime(mime: &str) -> ProvResult<Self> {
        let format = match mime_essence(mime).as_str() {
            "text/plain" => ResultFormat::Text,
            "application/sparql-results+xml" | "application/xml" => ResultFormat::Xml,
            "text/csv" => ResultFormat::Csv,
            "application/sparql-results+json" | "application/json" => ResultFormat::Json,
            "text/tab-separated-values" => ResultFormat::Tsv,
            "text/turtle" => ResultFormat::Turtle,
            "application/n-triples" => ResultFormat::NTriples,
            "application/rdf+xml" => ResultFormat::RdfXml,
            "text/n3" => ResultFormat::N3,
            _ => return Err(ProvError::UnsupportedFormat(mime.trim().to_string())),
        };
        Ok(format)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ResultFormat::Text => "text/plain",
            ResultFormat::Xml => "application/sparql-results+xml",
            ResultFormat::Csv => "text/csv",
            ResultFormat::Json => "application/sparql-results+json",
            ResultFormat::Tsv => "text/tab-separated-values",
            ResultFormat::Turtle => "text/turtle",
            ResultFormat::NTriples => "application/n-triples",
            ResultFormat::RdfXml => "application/rdf+xml",
            ResultFormat::N3 => "text/n3",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            ResultFormat::Text => "text",
            ResultFormat::Xml => "xml",
            ResultFormat::Csv => "csv",
            ResultFormat::Json => "json",
            ResultFormat::Tsv => "tsv",
            ResultFormat::Turtle => "turtle",
            ResultFormat::NTriples => "ntriples",
            ResultFormat::RdfXml => "rdfxml",
            ResultFormat::N3 => "n3",
        }
    }

    /// Whether this encodes SELECT solutions (as opposed to a graph)
    pub fn is_tabular(&self) -> bool {
        matches!(
            self,
            ResultFormat::Text
                | ResultFormat::Xml
                | ResultFormat::Csv
                | ResultFormat::Json
                | ResultFormat::Tsv
        )
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ResultFormat {
    type Err = ProvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            return ResultFormat::from_mime(s);
        }
        let name = s.trim().to_ascii_lowercase();
        let name = match name.as_str() {
            "txt" | "table" => "text",
            "ttl" => "turtle",
            "nt" => "ntriples",
            other => other,
        };
        ResultFormat::ALL
            .into_iter()
            .find(|f| f.short_name() == name)
            .ok_or_else(|| ProvError::UnsupportedFormat(s.to_string()))
    }
}

/// Encode `outcome` as `format`. SELECT solutions only go to tabular
/// formats and CONSTRUCT graphs only to graph formats.
pub fn encode(
    outcome: &QueryOutcome,
    format: ResultFormat,
    prefixes: &[(String, String)],
) -> ProvResult<Vec<u8>> {
    let text = match (outcome, format) {
        (QueryOutcome::Solutions(result), ResultFormat::Text) => text_table(result),
        (QueryOutcome::Solutions(result), ResultFormat::Xml) => sparql_xml(result),
        (QueryOutcome::Solutions(result), ResultFormat::Csv) => csv(result),
        (QueryOutcome::Solutions(result), ResultFormat::Json) => sparql_json(result)?,
        (QueryOutcome::Solutions(result), ResultFormat::Tsv) => tsv(result),
        (QueryOutcome::Graph(triples), ResultFormat::Turtle | ResultFormat::N3) => {
            turtle::write(triples, prefixes)
        }
        (QueryOutcome::Graph(triples), ResultFormat::NTriples) => ntriples::write(triples),
        (QueryOutcome::Graph(triples), ResultFormat::RdfXml) => rdfxml::write(triples, prefixes)?,
        (QueryOutcome::Solutions(_), _) => {
            return Err(ProvError::UnsupportedFormat(format!(
                "{} for SELECT results",
                format.mime()
            )))
        }
        (QueryOutcome::Graph(_), _) => {
            return Err(ProvError::UnsupportedFormat(format!(
                "{} for CONSTRUCT results",
                format.mime()
            )))
        }
    };
    Ok(text.into_bytes())
}

fn plain(term: &Term) -> &str {
    term.value()
}

fn text_table(result: &SelectResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_ref().map(Term::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = result.vars.iter().map(|v| v.chars().count() + 1).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let line = |values: Vec<String>| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<width$} ", v, width = w))
            .collect();
        format!("|{}|\n", padded.join("|"))
    };

    let mut out = String::new();
    let _ = writeln!(out, "+{}+", rule);
    out.push_str(&line(result.vars.iter().map(|v| format!("?{}", v)).collect()));
    let _ = writeln!(out, "+{}+", rule);
    for row in cells {
        out.push_str(&line(row));
    }
    let _ = writeln!(out, "+{}+", rule);
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv(result: &SelectResult) -> String {
    let mut out = result.vars.join(",");
    out.push_str("\r\n");
    for row in &result.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| cell.as_ref().map(|t| csv_field(plain(t))).unwrap_or_default())
            .collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

fn tsv(result: &SelectResult) -> String {
    let header: Vec<String> = result.vars.iter().map(|v| format!("?{}", v)).collect();
    let mut out = header.join("\t");
    out.push('\n');
    for row in &result.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| cell.as_ref().map(Term::to_string).unwrap_or_default())
            .collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}

fn json_term(term: &Term) -> Value {
    match term {
        Term::Iri(iri) => json!({ "type": "uri", "value": iri }),
        Term::Blank(label) => json!({ "type": "bnode", "value": label }),
        Term::Literal {
            value,
            datatype,
            lang,
        } => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("literal"));
            obj.insert("value".to_string(), json!(value));
            if let Some(lang) = lang {
                obj.insert("xml:lang".to_string(), json!(lang));
            } else if let Some(datatype) = datatype {
                obj.insert("datatype".to_string(), json!(datatype));
            }
            Value::Object(obj)
        }
    }
}

fn sparql_json(result: &SelectResult) -> ProvResult<String> {
    let bindings: Vec<Value> = result
        .rows
        .iter()
        .map(|row| {
            let mut solution = Map::new();
            for (var, cell) in result.vars.iter().zip(row) {
                if let Some(term) = cell {
                    solution.insert(var.clone(), json_term(term));
                }
            }
            Value::Object(solution)
        })
        .collect();

    let doc = json!({
        "head": { "vars": result.vars },
        "results": { "bindings": bindings },
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn sparql_xml(result: &SelectResult) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n");
    out.push_str("<sparql xmlns=\"http://www.w3.org/2005/sparql-results#\">\n  <head>\n");
    for var in &result.vars {
        let _ = writeln!(out, "    <variable name=\"{}\"/>", escape_xml(var));
    }
    out.push_str("  </head>\n  <results>\n");
    for row in &result.rows {
        out.push_str("    <result>\n");
        for (var, cell) in result.vars.iter().zip(row) {
            let Some(term) = cell else { continue };
            let value = match term {
                Term::Iri(iri) => format!("<uri>{}</uri>", escape_xml(iri)),
                Term::Blank(label) => format!("<bnode>{}</bnode>", escape_xml(label)),
                Term::Literal {
                    value,
                    datatype,
                    lang,
                } => match (lang, datatype) {
                    (Some(lang), _) => format!(
                        "<literal xml:lang=\"{}\">{}</literal>",
                        escape_xml(lang),
                        escape_xml(value)
                    ),
                    (None, Some(dt)) => format!(
                        "<literal datatype=\"{}\">{}</literal>",
                        escape_xml(dt),
                        escape_xml(value)
                    ),
                    (None, None) => format!("<literal>{}</literal>", escape_xml(value)),
                },
            };
            let _ = writeln!(
                out,
                "      <binding name=\"{}\">{}</binding>",
                escape_xml(var),
                value
            );
        }
        out.push_str("    </result>\n");
    }
    out.push_str("  </results>\n</sparql>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Triple, XSD};

    fn result() -> SelectResult {
        SelectResult {
            vars: vec!["s".to_string(), "label".to_string()],
            rows: vec![
                vec![
                    Some(Term::iri("http://ex.org/a")),
                    Some(Term::literal("Hello, \"world\"")),
                ],
                vec![Some(Term::iri("http://ex.org/b")), None],
            ],
        }
    }

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_from_mime() {
        assert_eq!(
            ResultFormat::from_mime("application/xml").unwrap(),
            ResultFormat::Xml
        );
        assert_eq!(
            ResultFormat::from_mime("application/json; charset=utf-8").unwrap(),
            ResultFormat::Json
        );
        for format in ResultFormat::ALL {
            assert_eq!(ResultFormat::from_mime(format.mime()).unwrap(), format);
            assert_eq!(format.short_name().parse::<ResultFormat>().unwrap(), format);
        }
        assert!(ResultFormat::from_mime("text/html").is_err());
    }

    #[test]
    fn test_csv_quotes_and_crlf() {
        let outcome = QueryOutcome::Solutions(result());
        let out = as_text(encode(&outcome, ResultFormat::Csv, &[]).unwrap());
        assert_eq!(
            out,
            "s,label\r\nhttp://ex.org/a,\"Hello, \"\"world\"\"\"\r\nhttp://ex.org/b,\r\n"
        );
    }

    #[test]
    fn test_tsv_uses_term_syntax() {
        let outcome = QueryOutcome::Solutions(result());
        let out = as_text(encode(&outcome, ResultFormat::Tsv, &[]).unwrap());
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("?s\t?label"));
        assert_eq!(
            lines.next(),
            Some("<http://ex.org/a>\t\"Hello, \\\"world\\\"\"")
        );
        assert_eq!(lines.next(), Some("<http://ex.org/b>\t"));
    }

    #[test]
    fn test_sparql_json() {
        let outcome = QueryOutcome::Solutions(SelectResult {
            vars: vec!["n".to_string()],
            rows: vec![vec![Some(Term::typed("3", format!("{}integer", XSD)))]],
        });
        let out = as_text(encode(&outcome, ResultFormat::Json, &[]).unwrap());
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["head"]["vars"][0], "n");
        let binding = &doc["results"]["bindings"][0]["n"];
        assert_eq!(binding["type"], "literal");
        assert_eq!(binding["value"], "3");
        assert_eq!(binding["datatype"], format!("{}integer", XSD));
    }

    #[test]
    fn test_sparql_xml_omits_unbound() {
        let outcome = QueryOutcome::Solutions(result());
        let out = as_text(encode(&outcome, ResultFormat::Xml, &[]).unwrap());
        assert!(out.contains("<variable name=\"label\"/>"));
        assert!(out.contains("<binding name=\"s\"><uri>http://ex.org/a</uri></binding>"));
        assert!(out.contains("<literal>Hello, &quot;world&quot;</literal>"));
        assert_eq!(out.matches("<binding ").count(), 3);
    }

    #[test]
    fn test_text_table() {
        let outcome = QueryOutcome::Solutions(result());
        let out = as_text(encode(&outcome, ResultFormat::Text, &[]).unwrap());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("?label"));
        assert!(lines[3].contains("<http://ex.org/a>"));
        // every row has the same width
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_mismatched_pairings() {
        let select = QueryOutcome::Solutions(result());
        assert!(matches!(
            encode(&select, ResultFormat::Turtle, &[]),
            Err(ProvError::UnsupportedFormat(_))
        ));

        let graph = QueryOutcome::Graph(vec![Triple::new(
            Term::iri("http://ex.org/a"),
            Term::iri("http://ex.org/p"),
            Term::literal("x"),
        )]);
        assert!(matches!(
            encode(&graph, ResultFormat::Csv, &[]),
            Err(ProvError::UnsupportedFormat(_))
        ));
        let nt = as_text(encode(&graph, ResultFormat::NTriples, &[]).unwrap());
        assert_eq!(nt, "<http://ex.org/a> <http://ex.org/p> \"x\" .\n");
    }
}
