//! Query command

use super::build::write_output;
use crate::models::RepoRef;
use crate::query::{parse_query, Dataset, QueryForm, ResultFormat};
use crate::rdf;
use crate::store::GraphStore;
use anyhow::{Context, Result};

/// Query text from the argument, or from a file for `@path`
fn query_text(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {}", path)),
        None => Ok(arg.to_string()),
    }
}

pub(super) fn run(
    graphs: &GraphStore,
    repo: &RepoRef,
    arg: &str,
    format: Option<ResultFormat>,
) -> Result<()> {
    let text = query_text(arg)?;
    let records = graphs
        .load(&repo.key())
        .with_context(|| format!("No graph for {}", repo))?;

    // default encoding follows the query form
    let format = match format {
        Some(format) => format,
        None => {
            let prefixes = rdf::prefixes(&records.namespace);
            match parse_query(&text, &prefixes)?.form {
                QueryForm::Select { .. } => ResultFormat::Text,
                QueryForm::Construct { .. } => ResultFormat::Turtle,
            }
        }
    };

    let bytes = Dataset::from_records(&records).query(&text, format)?;
    write_output(&bytes, None)
}
