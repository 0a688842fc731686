//! Node identifiers
//!
//! Every filename and login turned into a node id goes through [`normalize`],
//! so ids from separate builds of the same repository line up.

use std::fmt::Write;

const DELIMITER: char = '-';

/// Turn an arbitrary string into an id token.
///
/// Path separators, dots and spaces become `-`. ASCII alphanumerics, `-` and
/// `_` pass through. Anything else is percent-encoded byte by byte, which
/// keeps the token a valid IRI fragment.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '/' | '\\' | '.' | ' ' => out.push(DELIMITER),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => out.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "%{:02X}", byte);
                }
            }
        }
    }
    out
}

pub fn agent_id(login: &str) -> String {
    normalize(login)
}

pub fn activity_id(sha: &str) -> String {
    format!("commit-{}", sha)
}

/// `file-{normalized}`
pub fn base_entity_id(filename: &str) -> String {
    format!("file-{}", normalize(filename))
}

/// `file-{normalized}_commit-{sha}`
pub fn versioned_entity_id(filename: &str, sha: &str) -> String {
    format!("{}_commit-{}", base_entity_id(filename), sha)
}

pub fn association_id(sha: &str) -> String {
    format!("association-{}", sha)
}

pub fn generation_id(filename: &str, sha: &str) -> String {
    format!("generation-{}-{}", base_entity_id(filename), sha)
}

pub fn invalidation_id(filename: &str, sha: &str) -> String {
    format!("invalidation-{}-{}", base_entity_id(filename), sha)
}

pub fn usage_id(filename: &str, sha: &str, parent_sha: &str) -> String {
    format!("usage-{}-{}-{}", base_entity_id(filename), sha, parent_sha)
}

pub fn derivation_id(filename: &str, sha: &str, parent_sha: &str) -> String {
    format!(
        "derivation-{}-{}",
        versioned_entity_id(filename, sha),
        parent_sha
    )
}

pub fn communication_id(parent_sha: &str, sha: &str) -> String {
    format!("information-{}-{}", parent_sha, sha)
}
