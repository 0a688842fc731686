//! Content types and negotiation

use crate::error::{ProvError, ProvResult};
use std::fmt;
use std::str::FromStr;

/// A graph serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    ProvN,
    Turtle,
    RdfXml,
    ProvJson,
    JsonLd,
    NTriples,
    NQuads,
    TriG,
    Dot,
    // graphic renders: recognised, never produced
    Png,
    Svg,
    Jpeg,
    Pdf,
}

impl ContentType {
    pub const ALL: [ContentType; 13] = [
        ContentType::ProvN,
        ContentType::Turtle,
        ContentType::RdfXml,
        ContentType::ProvJson,
        ContentType::JsonLd,
        ContentType::NTriples,
        ContentType::NQuads,
        ContentType::TriG,
        ContentType::Dot,
        ContentType::Png,
        ContentType::Svg,
        ContentType::Jpeg,
        ContentType::Pdf,
    ];

    /// Parse a MIME type; parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> ProvResult<Self> {
        let essence = mime_essence(mime);
        let content_type = match essence.as_str() {
            "text/provenance-notation" => ContentType::ProvN,
            "text/turtle" | "application/x-turtle" => ContentType::Turtle,
            "application/rdf+xml" => ContentType::RdfXml,
            "application/json" => ContentType::ProvJson,
            "application/ld+json" => ContentType::JsonLd,
            "application/n-triples" => ContentType::NTriples,
            "application/n-quads" => ContentType::NQuads,
            "application/trig" => ContentType::TriG,
            "text/vnd.graphviz" => ContentType::Dot,
            "image/png" => ContentType::Png,
            "image/svg+xml" => ContentType::Svg,
            "image/jpeg" => ContentType::Jpeg,
            "application/pdf" => ContentType::Pdf,
            _ => return Err(ProvError::UnsupportedFormat(mime.trim().to_string())),
        };
        Ok(content_type)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::ProvN => "text/provenance-notation",
            ContentType::Turtle => "text/turtle",
            ContentType::RdfXml => "application/rdf+xml",
            ContentType::ProvJson => "application/json",
            ContentType::JsonLd => "application/ld+json",
            ContentType::NTriples => "application/n-triples",
            ContentType::NQuads => "application/n-quads",
            ContentType::TriG => "application/trig",
            ContentType::Dot => "text/vnd.graphviz",
            ContentType::Png => "image/png",
            ContentType::Svg => "image/svg+xml",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Pdf => "application/pdf",
        }
    }

    /// Short name accepted on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            ContentType::ProvN => "provn",
            ContentType::Turtle => "turtle",
            ContentType::RdfXml => "rdfxml",
            ContentType::ProvJson => "provjson",
            ContentType::JsonLd => "jsonld",
            ContentType::NTriples => "ntriples",
            ContentType::NQuads => "nquads",
            ContentType::TriG => "trig",
            ContentType::Dot => "dot",
            ContentType::Png => "png",
            ContentType::Svg => "svg",
            ContentType::Jpeg => "jpeg",
            ContentType::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::ProvN => "provn",
            ContentType::Turtle => "ttl",
            ContentType::RdfXml => "rdf",
            ContentType::ProvJson | ContentType::JsonLd => "json",
            ContentType::NTriples => "nt",
            ContentType::NQuads => "nq",
            ContentType::TriG => "trig",
            ContentType::Dot => "dot",
            ContentType::Png => "png",
            ContentType::Svg => "svg",
            ContentType::Jpeg => "jpg",
            ContentType::Pdf => "pdf",
        }
    }

    /// Whether [`crate::rdf::serialize`] can produce this type
    pub fn is_producible(&self) -> bool {
        !matches!(
            self,
            ContentType::Png | ContentType::Svg | ContentType::Jpeg | ContentType::Pdf
        )
    }

    /// Pick the best producible type from an `Accept`-style list.
    ///
    /// Entries are ranked by `q` (default 1), ties keep list order. `*/*`
    /// selects Turtle.
    pub fn negotiate(accept: &str) -> ProvResult<Self> {
        let mut ranked: Vec<(f32, &str)> = accept
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| (quality(entry), entry))
            .filter(|(q, _)| *q > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        ranked
            .iter()
            .find_map(|(_, entry)| {
                if mime_essence(entry) == "*/*" {
                    return Some(ContentType::Turtle);
                }
                ContentType::from_mime(entry)
                    .ok()
                    .filter(ContentType::is_producible)
            })
            .ok_or_else(|| ProvError::UnsupportedFormat(accept.to_string()))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Accepts a MIME type or a short name (`turtle`, `provn`, `nt`, ...)
impl FromStr for ContentType {
    type Err = ProvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            return ContentType::from_mime(s);
        }
        let name = s.trim().to_ascii_lowercase();
        let alias = match name.as_str() {
            "ttl" => Some(ContentType::Turtle),
            "nt" => Some(ContentType::NTriples),
            "nq" => Some(ContentType::NQuads),
            "json" => Some(ContentType::ProvJson),
            "xml" | "rdf" => Some(ContentType::RdfXml),
            "graphviz" => Some(ContentType::Dot),
            _ => None,
        };
        alias
            .or_else(|| {
                ContentType::ALL
                    .into_iter()
                    .find(|ct| ct.short_name() == name)
            })
            .ok_or_else(|| ProvError::UnsupportedFormat(s.to_string()))
    }
}

/// `type/subtype` without parameters, lowercased
pub(crate) fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn quality(entry: &str) -> f32 {
    entry
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("q="))
        .find_map(|q| q.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}
