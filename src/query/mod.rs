//! Structured queries over provenance graphs
//!
//! A SPARQL subset: basic graph patterns under `SELECT` or `CONSTRUCT`, with
//! `ORDER BY`, `LIMIT` and `OFFSET`. Queries run against a [`Dataset`], the
//! triple view of a record set or of a parsed N-Triples document.

pub mod eval;
pub mod parser;
pub mod results;

pub use parser::{parse_query, Query, QueryForm};
pub use results::ResultFormat;

use crate::error::ProvResult;
use crate::prov::RecordSet;
use crate::rdf::{self, mapping, ntriples, Term, Triple};
use eval::TripleIndex;
use tracing::debug;

/// Variable names and one row per solution; `None` marks an unbound cell
#[derive(Debug, Clone, PartialEq)]
pub struct SelectResult {
    pub vars: Vec<String>,
    pub rows: Vec<Vec<Option<Term>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Solutions(SelectResult),
    Graph(Vec<Triple>),
}

/// Anything that can answer a parsed query
pub trait QueryEngine: Send + Sync {
    fn execute(&self, query: &Query) -> ProvResult<QueryOutcome>;

    /// Parse, execute and encode in one step
    fn run(&self, text: &str, format: ResultFormat) -> ProvResult<Vec<u8>>;
}

/// An immutable triple set plus the prefixes used to read and write it
pub struct Dataset {
    triples: Vec<Triple>,
    prefixes: Vec<(String, String)>,
}

impl Dataset {
    pub fn new(triples: Vec<Triple>, prefixes: Vec<(String, String)>) -> Self {
        Self { triples, prefixes }
    }

    /// The PROV-O triples of `records`; `gitprov:` is bound to its namespace
    pub fn from_records(records: &RecordSet) -> Self {
        Self::new(mapping::triples(records), rdf::prefixes(&records.namespace))
    }

    pub fn parse_ntriples(document: &str) -> ProvResult<Self> {
        let prefixes = rdf::STANDARD_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();
        Ok(Self::new(ntriples::parse(document)?, prefixes))
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn query(&self, text: &str, format: ResultFormat) -> ProvResult<Vec<u8>> {
        self.run(text, format)
    }
}

impl QueryEngine for Dataset {
    fn execute(&self, query: &Query) -> ProvResult<QueryOutcome> {
        let index = TripleIndex::new(&self.triples);
        let outcome = match &query.form {
            QueryForm::Select { .. } => {
                let (vars, rows) = eval::select(&index, query);
                debug!("SELECT matched {} rows", rows.len());
                QueryOutcome::Solutions(SelectResult { vars, rows })
            }
            QueryForm::Construct { template } => {
                let triples = eval::construct(&index, query, template);
                debug!("CONSTRUCT produced {} triples", triples.len());
                QueryOutcome::Graph(triples)
            }
        };
        Ok(outcome)
    }

    fn run(&self, text: &str, format: ResultFormat) -> ProvResult<Vec<u8>> {
        let query = parse_query(text, &self.prefixes)?;

        // declared prefixes also shorten CONSTRUCT output
        let mut prefixes = self.prefixes.clone();
        for (p, ns) in &query.prefixes {
            if !prefixes.iter().any(|(existing, _)| existing == p) {
                prefixes.push((p.clone(), ns.clone()));
            }
        }

        let outcome = self.execute(&query)?;
        results::encode(&outcome, format, &prefixes)
    }
}

/// Run `text` against `records` and encode the answer as `format`
pub fn query(records: &RecordSet, text: &str, format: ResultFormat) -> ProvResult<Vec<u8>> {
    Dataset::from_records(records).query(text, format)
}
