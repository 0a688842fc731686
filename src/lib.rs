//! gitprov - W3C PROV provenance graphs from git history
//!
//! Builds a provenance graph (activities for commits, agents for authors,
//! entities for file versions) from a commit history provider, serializes it
//! in the common PROV and RDF formats, keeps built graphs in a keyed store and
//! answers structured queries over them.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod prov;
pub mod query;
pub mod rdf;
pub mod store;
