//! PROV-JSON writer
//!
//! Records are grouped into one object per PROV kind, keyed by qualified
//! name. Specializations carry no id and get document-local `_:` keys.

use super::mapping::{agent_class, timestamp};
use super::{DOC_PREFIX, FOAF, PROV, XSD};
use crate::error::ProvResult;
use crate::prov::records::{RecordSet, Relation};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn qn(id: &str) -> String {
    format!("{}:{}", DOC_PREFIX, id)
}

fn typed(value: impl Into<Value>, datatype: &str) -> Value {
    json!({ "$": value.into(), "type": datatype })
}

pub fn write(records: &RecordSet) -> ProvResult<String> {
    let mut prefix = Map::new();
    prefix.insert(DOC_PREFIX.to_string(), json!(records.namespace));
    for (name, ns) in [("foaf", FOAF), ("prov", PROV), ("xsd", XSD)] {
        prefix.insert(name.to_string(), json!(ns));
    }

    let mut sections: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();

    for a in &records.activities {
        sections.entry("activity").or_default().insert(
            qn(&a.id),
            json!({
                "prov:startTime": timestamp(&a.timestamp),
                "prov:label": a.label,
                "foaf:homepage": typed(a.homepage.as_str(), "xsd:anyURI"),
            }),
        );
    }

    for a in &records.agents {
        let mut attrs = Map::new();
        if let Some(agent_type) = a.agent_type.as_deref() {
            let mut types = vec![Value::String(agent_type.to_string())];
            if let Some(class) = agent_class(agent_type) {
                types.insert(0, typed(format!("prov:{}", class), "prov:QUALIFIED_NAME"));
            }
            attrs.insert("prov:type".to_string(), Value::Array(types));
        }
        attrs.insert("prov:label".to_string(), json!(a.login));
        attrs.insert(
            "foaf:homepage".to_string(),
            typed(a.homepage.as_str(), "xsd:anyURI"),
        );
        if let Some(name) = &a.display_name {
            attrs.insert("foaf:name".to_string(), json!(name));
        }
        if let Some(email) = &a.email {
            attrs.insert("foaf:mbox".to_string(), json!(email));
        }
        if let Some(avatar) = &a.avatar_url {
            attrs.insert("foaf:img".to_string(), typed(avatar.as_str(), "xsd:anyURI"));
        }
        if let Some(contributions) = a.contributions {
            attrs.insert(qn("contributions"), typed(contributions, "xsd:int"));
        }
        sections.entry("agent").or_default().insert(qn(&a.id), Value::Object(attrs));
    }

    for e in records.entities.iter().chain(&records.base_entities) {
        sections.entry("entity").or_default().insert(qn(&e.id), json!({ "prov:label": e.label }));
    }

    let mut specializations = 0usize;
    for r in &records.relations {
        let (kind, key, body) = match r {
            Relation::Association {
                id,
                activity,
                agent,
                role,
            } => (
                "wasAssociatedWith",
                qn(id),
                json!({ "prov:activity": qn(activity), "prov:agent": qn(agent), "prov:role": role }),
            ),
            Relation::Specialization { specific, general } => {
                specializations += 1;
                (
                    "specializationOf",
                    format!("_:s{}", specializations),
                    json!({ "prov:specificEntity": qn(specific), "prov:generalEntity": qn(general) }),
                )
            }
            Relation::Generation {
                id,
                entity,
                activity,
                time,
            } => (
                "wasGeneratedBy",
                qn(id),
                json!({ "prov:entity": qn(entity), "prov:activity": qn(activity), "prov:time": timestamp(time) }),
            ),
            Relation::Invalidation {
                id,
                entity,
                activity,
                time,
            } => (
                "wasInvalidatedBy",
                qn(id),
                json!({ "prov:entity": qn(entity), "prov:activity": qn(activity), "prov:time": timestamp(time) }),
            ),
            Relation::Usage {
                id,
                activity,
                entity,
                time,
            } => (
                "used",
                qn(id),
                json!({ "prov:activity": qn(activity), "prov:entity": qn(entity), "prov:time": timestamp(time) }),
            ),
            Relation::Communication {
                id,
                informed,
                informant,
            } => (
                "wasInformedBy",
                qn(id),
                json!({ "prov:informed": qn(informed), "prov:informant": qn(informant) }),
            ),
            Relation::Derivation {
                id,
                generated,
                used,
                activity,
                generation,
                usage,
                stats,
            } => {
                let mut body = json!({
                    "prov:generatedEntity": qn(generated),
                    "prov:usedEntity": qn(used),
                    "prov:activity": qn(activity),
                    "prov:generation": qn(generation),
                    "prov:usage": qn(usage),
                });
                if let Value::Object(map) = &mut body {
                    map.insert(qn("additions"), typed(stats.additions, "xsd:int"));
                    map.insert(qn("changes"), typed(stats.changes, "xsd:int"));
                    map.insert(qn("deletions"), typed(stats.deletions, "xsd:int"));
                }
                ("wasDerivedFrom", qn(id), body)
            }
        };
        sections.entry(kind).or_default().insert(key, body);
    }

    let mut doc = Map::new();
    doc.insert("prefix".to_string(), Value::Object(prefix));
    for (kind, entries) in sections {
        doc.insert(kind.to_string(), Value::Object(entries));
    }
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prov::records::{Agent, ChangeStats, Entity};

    fn records() -> RecordSet {
        RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![],
            agents: vec![Agent {
                id: "octocat".to_string(),
                login: "octocat".to_string(),
                display_name: Some("Mona".to_string()),
                email: None,
                homepage: "https://github.com/octocat".to_string(),
                avatar_url: None,
                agent_type: Some("User".to_string()),
                contributions: Some(4),
            }],
            entities: vec![Entity {
                id: "file-a_commit-c2".to_string(),
                label: "a".to_string(),
            }],
            base_entities: vec![Entity {
                id: "file-a".to_string(),
                label: "a".to_string(),
            }],
            relations: vec![
                Relation::Specialization {
                    specific: "file-a_commit-c2".to_string(),
                    general: "file-a".to_string(),
                },
                Relation::Derivation {
                    id: "derivation-file-a_commit-c2-c1".to_string(),
                    generated: "file-a_commit-c2".to_string(),
                    used: "file-a_commit-c1".to_string(),
                    activity: "commit-c2".to_string(),
                    generation: "generation-file-a-c2".to_string(),
                    usage: "usage-file-a-c2-c1".to_string(),
                    stats: ChangeStats {
                        additions: 2,
                        changes: 3,
                        deletions: 1,
                    },
                },
            ],
        }
    }

    #[test]
    fn test_sections() {
        let doc: Value = serde_json::from_str(&write(&records()).unwrap()).unwrap();

        assert_eq!(doc["prefix"]["gitprov"], "http://localhost:8080/owner/o/n#");
        let agent = &doc["agent"]["gitprov:octocat"];
        assert_eq!(agent["prov:label"], "octocat");
        assert_eq!(agent["gitprov:contributions"]["$"], 4);
        assert_eq!(agent["prov:type"][0]["$"], "prov:Person");

        assert_eq!(doc["entity"].as_object().unwrap().len(), 2);
        assert_eq!(
            doc["specializationOf"]["_:s1"]["prov:generalEntity"],
            "gitprov:file-a"
        );
        let derivation = &doc["wasDerivedFrom"]["gitprov:derivation-file-a_commit-c2-c1"];
        assert_eq!(derivation["prov:usage"], "gitprov:usage-file-a-c2-c1");
        assert_eq!(derivation["gitprov:changes"]["$"], 3);
    }
}
