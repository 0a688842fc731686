//! PROV-N writer

use super::mapping::{agent_class, timestamp};
use super::{escape_literal, DOC_PREFIX, FOAF};
use crate::prov::records::{Activity, Agent, Entity, RecordSet, Relation, Statement};
use std::fmt::Write;

fn qn(id: &str) -> String {
    format!("{}:{}", DOC_PREFIX, id)
}

fn string(value: &str) -> String {
    format!("\"{}\"", escape_literal(value))
}

fn attributes(attrs: &[(String, String)]) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let body: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!(", [{}]", body.join(", "))
}

fn activity(a: &Activity) -> String {
    let attrs = vec![
        ("prov:label".to_string(), string(&a.label)),
        (
            "foaf:homepage".to_string(),
            format!("{} %% xsd:anyURI", string(&a.homepage)),
        ),
    ];
    format!(
        "activity({}, {}, -{})",
        qn(&a.id),
        timestamp(&a.timestamp),
        attributes(&attrs)
    )
}

fn agent(a: &Agent) -> String {
    let mut attrs = Vec::new();
    if let Some(agent_type) = a.agent_type.as_deref() {
        if let Some(class) = agent_class(agent_type) {
            attrs.push(("prov:type".to_string(), format!("'prov:{}'", class)));
        }
        attrs.push(("prov:type".to_string(), string(agent_type)));
    }
    attrs.push(("prov:label".to_string(), string(&a.login)));
    attrs.push((
        "foaf:homepage".to_string(),
        format!("{} %% xsd:anyURI", string(&a.homepage)),
    ));
    if let Some(name) = &a.display_name {
        attrs.push(("foaf:name".to_string(), string(name)));
    }
    if let Some(email) = &a.email {
        attrs.push(("foaf:mbox".to_string(), string(email)));
    }
    if let Some(avatar) = &a.avatar_url {
        attrs.push(("foaf:img".to_string(), format!("{} %% xsd:anyURI", string(avatar))));
    }
    if let Some(contributions) = a.contributions {
        attrs.push((
            qn("contributions"),
            format!("\"{}\" %% xsd:int", contributions),
        ));
    }
    let body: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("agent({}, [{}])", qn(&a.id), body.join(", "))
}

fn entity(e: &Entity) -> String {
    format!("entity({}, [prov:label={}])", qn(&e.id), string(&e.label))
}

fn relation(r: &Relation) -> String {
    match r {
        Relation::Association {
            id,
            activity,
            agent,
            role,
        } => format!(
            "wasAssociatedWith({}; {}, {}, -, [prov:role={}])",
            qn(id),
            qn(activity),
            qn(agent),
            string(role)
        ),
        Relation::Specialization { specific, general } => {
            format!("specializationOf({}, {})", qn(specific), qn(general))
        }
        Relation::Generation {
            id,
            entity,
            activity,
            time,
        } => format!(
            "wasGeneratedBy({}; {}, {}, {})",
            qn(id),
            qn(entity),
            qn(activity),
            timestamp(time)
        ),
        Relation::Invalidation {
            id,
            entity,
            activity,
            time,
        } => format!(
            "wasInvalidatedBy({}; {}, {}, {})",
            qn(id),
            qn(entity),
            qn(activity),
            timestamp(time)
        ),
        Relation::Usage {
            id,
            activity,
            entity,
            time,
        } => format!(
            "used({}; {}, {}, {})",
            qn(id),
            qn(activity),
            qn(entity),
            timestamp(time)
        ),
        Relation::Communication {
            id,
            informed,
            informant,
        } => format!(
            "wasInformedBy({}; {}, {})",
            qn(id),
            qn(informed),
            qn(informant)
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
            let attrs = [
                (qn("additions"), format!("\"{}\" %% xsd:int", stats.additions)),
                (qn("changes"), format!("\"{}\" %% xsd:int", stats.changes)),
                (qn("deletions"), format!("\"{}\" %% xsd:int", stats.deletions)),
            ];
            format!(
                "wasDerivedFrom({}; {}, {}, {}, {}, {}{})",
                qn(id),
                qn(generated),
                qn(used),
                qn(activity),
                qn(generation),
                qn(usage),
                attributes(&attrs)
            )
        }
    }
}

pub fn write(records: &RecordSet) -> String {
    let mut out = String::from("document\n");
    let _ = writeln!(out, "  prefix {} <{}>", DOC_PREFIX, records.namespace);
    let _ = writeln!(out, "  prefix foaf <{}>", FOAF);
    out.push('\n');

    for statement in records.statements() {
        let line = match statement {
            Statement::Activity(a) => activity(a),
            Statement::Agent(a) => agent(a),
            Statement::Entity(e) => entity(e),
            Statement::Relation(r) => relation(r),
        };
        let _ = writeln!(out, "  {}", line);
    }

    out.push_str("endDocument\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_document_layout() {
        let time = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let records = RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![Activity {
                id: "commit-c1".to_string(),
                sha: "c1".to_string(),
                label: "Say \"hi\"".to_string(),
                timestamp: time,
                homepage: "https://github.com/o/n/commit/c1".to_string(),
            }],
            agents: vec![],
            entities: vec![Entity {
                id: "file-a-txt_commit-c1".to_string(),
                label: "a.txt".to_string(),
            }],
            base_entities: vec![],
            relations: vec![Relation::Generation {
                id: "generation-file-a-txt-c1".to_string(),
                entity: "file-a-txt_commit-c1".to_string(),
                activity: "commit-c1".to_string(),
                time,
            }],
        };

        let text = write(&records);
        assert!(text.starts_with("document\n"));
        assert!(text.trim_end().ends_with("endDocument"));
        assert!(text.contains("prefix gitprov <http://localhost:8080/owner/o/n#>"));
        assert!(text.contains(
            "activity(gitprov:commit-c1, 2021-03-01T12:00:00Z, -, [prov:label=\"Say \\\"hi\\\"\""
        ));
        assert!(text.contains(
            "wasGeneratedBy(gitprov:generation-file-a-txt-c1; gitprov:file-a-txt_commit-c1, gitprov:commit-c1, 2021-03-01T12:00:00Z)"
        ));
        let activity_at = text.find("activity(").unwrap();
        let entity_at = text.find("entity(").unwrap();
        assert!(activity_at < entity_at);
    }

    #[test]
    fn test_multiline_label_stays_on_one_line() {
        let time = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let records = RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![Activity {
                id: "commit-c1".to_string(),
                sha: "c1".to_string(),
                label: "Fix parser\n\nCloses #12\r\tdone".to_string(),
                timestamp: time,
                homepage: "https://github.com/o/n/commit/c1".to_string(),
            }],
            agents: vec![],
            entities: vec![],
            base_entities: vec![],
            relations: vec![],
        };

        let text = write(&records);
        let line = text
            .lines()
            .find(|l| l.contains("activity("))
            .expect("activity statement");
        assert!(line.trim_end().ends_with(')'));
        assert!(line.contains("prov:label=\"Fix parser\\n\\nCloses #12\\r\\tdone\""));
        assert!(!text.contains('\r'));
    }
}
