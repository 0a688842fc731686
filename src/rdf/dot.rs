//! Graphviz rendering of a record set
//!
//! Presentation only, styled after the usual PROV diagrams: activities are
//! blue boxes, agents orange houses, entities yellow ellipses.

use crate::prov::records::{RecordSet, Relation};
use std::fmt::Write;

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn edge(out: &mut String, from: &str, to: &str, label: &str) {
    let _ = writeln!(out, "  {} -> {} [label={}];", quote(from), quote(to), quote(label));
}

pub fn write(records: &RecordSet) -> String {
    let mut out = String::from("digraph provenance {\n  rankdir=BT;\n");
    let _ = writeln!(out, "  label={};", quote(&records.repository));

    for a in &records.activities {
        let label = a.label.lines().next().unwrap_or("");
        let short: String = a.sha.chars().take(7).collect();
        let _ = writeln!(
            out,
            "  {} [shape=box, style=filled, fillcolor=\"#9fb1fc\", label={}];",
            quote(&a.id),
            quote(&format!("{} {}", short, label))
        );
    }
    for a in &records.agents {
        let _ = writeln!(
            out,
            "  {} [shape=house, style=filled, fillcolor=\"#fed37f\", label={}];",
            quote(&a.id),
            quote(&a.login)
        );
    }
    for e in records.entities.iter().chain(&records.base_entities) {
        let _ = writeln!(
            out,
            "  {} [shape=ellipse, style=filled, fillcolor=\"#fffc87\", label={}];",
            quote(&e.id),
            quote(&e.label)
        );
    }

    for r in &records.relations {
        match r {
            Relation::Association {
                activity, agent, ..
            } => edge(&mut out, activity, agent, "wasAssociatedWith"),
            Relation::Specialization { specific, general } => {
                edge(&mut out, specific, general, "specializationOf")
            }
            Relation::Generation {
                entity, activity, ..
            } => edge(&mut out, entity, activity, "wasGeneratedBy"),
            Relation::Invalidation {
                entity, activity, ..
            } => edge(&mut out, entity, activity, "wasInvalidatedBy"),
            Relation::Usage {
                activity, entity, ..
            } => edge(&mut out, activity, entity, "used"),
            Relation::Communication {
                informed,
                informant,
                ..
            } => edge(&mut out, informed, informant, "wasInformedBy"),
            Relation::Derivation {
                generated, used, ..
            } => edge(&mut out, generated, used, "wasDerivedFrom"),
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prov::records::Entity;

    #[test]
    fn test_digraph() {
        let records = RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![],
            agents: vec![],
            entities: vec![Entity {
                id: "file-a_commit-c1".to_string(),
                label: "a".to_string(),
            }],
            base_entities: vec![Entity {
                id: "file-a".to_string(),
                label: "a".to_string(),
            }],
            relations: vec![Relation::Specialization {
                specific: "file-a_commit-c1".to_string(),
                general: "file-a".to_string(),
            }],
        };
        let dot = write(&records);
        assert!(dot.starts_with("digraph provenance {"));
        assert!(dot.contains(
            "\"file-a_commit-c1\" -> \"file-a\" [label=\"specializationOf\"];"
        ));
        assert_eq!(dot.matches("shape=ellipse").count(), 2);
    }
}
