//! PROV-O view of a record set
//!
//! Every relation with an id yields the unqualified property plus a
//! qualified influence node named by that id. Specializations are
//! unqualified only. No blank nodes are produced.

use super::{Term, Triple, FOAF, PROV, RDF, RDFS, XSD};
use crate::prov::builder::AUTHORSHIP_ROLE;
use crate::prov::records::{Activity, Agent, Entity, RecordSet, Relation};
use chrono::{DateTime, SecondsFormat, Utc};

/// Map contributor types onto PROV agent subclasses
pub fn agent_class(agent_type: &str) -> Option<&'static str> {
    match agent_type.to_ascii_lowercase().as_str() {
        "user" => Some("Person"),
        "organization" => Some("Organization"),
        "bot" => Some("SoftwareAgent"),
        _ => None,
    }
}

pub fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

struct Emitter<'a> {
    records: &'a RecordSet,
    triples: Vec<Triple>,
}

impl<'a> Emitter<'a> {
    fn node(&self, id: &str) -> Term {
        Term::Iri(self.records.iri(id))
    }

    fn push(&mut self, subject: &Term, predicate: String, object: Term) {
        self.triples
            .push(Triple::new(subject.clone(), Term::Iri(predicate), object));
    }

    fn typed(&mut self, subject: &Term, class: String) {
        self.push(subject, format!("{}type", RDF), Term::Iri(class));
    }

    fn activity(&mut self, activity: &Activity) {
        let s = self.node(&activity.id);
        self.typed(&s, format!("{}Activity", PROV));
        self.push(&s, format!("{}label", RDFS), Term::literal(&activity.label));
        self.push(&s, format!("{}startedAtTime", PROV), date_time(&activity.timestamp));
        self.push(&s, format!("{}homepage", FOAF), any_uri(&activity.homepage));
    }

    fn agent(&mut self, agent: &Agent) {
        let s = self.node(&agent.id);
        self.typed(&s, format!("{}Agent", PROV));
        if let Some(agent_type) = agent.agent_type.as_deref() {
            if let Some(class) = agent_class(agent_type) {
                self.typed(&s, format!("{}{}", PROV, class));
            }
            self.push(&s, format!("{}type", PROV), Term::literal(agent_type));
        }
        self.push(&s, format!("{}label", RDFS), Term::literal(&agent.login));
        self.push(&s, format!("{}homepage", FOAF), any_uri(&agent.homepage));
        if let Some(name) = &agent.display_name {
            self.push(&s, format!("{}name", FOAF), Term::literal(name));
        }
        if let Some(email) = &agent.email {
            self.push(&s, format!("{}mbox", FOAF), Term::literal(email));
        }
        if let Some(avatar) = &agent.avatar_url {
            self.push(&s, format!("{}img", FOAF), any_uri(avatar));
        }
        if let Some(contributions) = agent.contributions {
            let p = self.records.iri("contributions");
            self.push(&s, p, int(contributions));
        }
    }

    fn entity(&mut self, entity: &Entity) {
        let s = self.node(&entity.id);
        self.typed(&s, format!("{}Entity", PROV));
        self.push(&s, format!("{}label", RDFS), Term::literal(&entity.label));
    }

    /// Unqualified edge, qualified link and the influence node's type
    fn qualified(
        &mut self,
        subject: &Term,
        property: &str,
        object: Term,
        qualifier: &str,
        class: &str,
        id: &str,
    ) -> Term {
        let q = self.node(id);
        self.push(subject, format!("{}{}", PROV, property), object);
        self.push(subject, format!("{}{}", PROV, qualifier), q.clone());
        self.typed(&q, format!("{}{}", PROV, class));
        q
    }

    fn relation(&mut self, relation: &Relation) {
        match relation {
            Relation::Association {
                id,
                activity,
                agent,
                role,
            } => {
                let s = self.node(activity);
                let agent = self.node(agent);
                let q = self.qualified(
                    &s,
                    "wasAssociatedWith",
                    agent.clone(),
                    "qualifiedAssociation",
                    "Association",
                    id,
                );
                self.push(&q, format!("{}agent", PROV), agent);
                let role = self.node(role);
                self.push(&q, format!("{}hadRole", PROV), role);
            }
            Relation::Specialization { specific, general } => {
                let s = self.node(specific);
                let o = self.node(general);
                self.push(&s, format!("{}specializationOf", PROV), o);
            }
            Relation::Generation {
                id,
                entity,
                activity,
                time,
            } => {
                let s = self.node(entity);
                let activity = self.node(activity);
                let q = self.qualified(
                    &s,
                    "wasGeneratedBy",
                    activity.clone(),
                    "qualifiedGeneration",
                    "Generation",
                    id,
                );
                self.push(&q, format!("{}activity", PROV), activity);
                self.push(&q, format!("{}atTime", PROV), date_time(time));
            }
            Relation::Invalidation {
                id,
                entity,
                activity,
                time,
            } => {
                let s = self.node(entity);
                let activity = self.node(activity);
                let q = self.qualified(
                    &s,
                    "wasInvalidatedBy",
                    activity.clone(),
                    "qualifiedInvalidation",
                    "Invalidation",
                    id,
                );
                self.push(&q, format!("{}activity", PROV), activity);
                self.push(&q, format!("{}atTime", PROV), date_time(time));
            }
            Relation::Usage {
                id,
                activity,
                entity,
                time,
            } => {
                let s = self.node(activity);
                let entity = self.node(entity);
                let q = self.qualified(&s, "used", entity.clone(), "qualifiedUsage", "Usage", id);
                self.push(&q, format!("{}entity", PROV), entity);
                self.push(&q, format!("{}atTime", PROV), date_time(time));
            }
            Relation::Communication {
                id,
                informed,
                informant,
            } => {
                let s = self.node(informed);
                let informant = self.node(informant);
                let q = self.qualified(
                    &s,
                    "wasInformedBy",
                    informant.clone(),
                    "qualifiedCommunication",
                    "Communication",
                    id,
                );
                self.push(&q, format!("{}activity", PROV), informant);
            }
            Relation::Derivation {
                id,
                generated,
                used,
                activity,
                generation,
                usage,
                stats,
            } => {
                let s = self.node(generated);
                let used = self.node(used);
                let q = self.qualified(
                    &s,
                    "wasDerivedFrom",
                    used.clone(),
                    "qualifiedDerivation",
                    "Derivation",
                    id,
                );
                self.push(&q, format!("{}entity", PROV), used);
                let activity = self.node(activity);
                self.push(&q, format!("{}hadActivity", PROV), activity);
                let generation = self.node(generation);
                self.push(&q, format!("{}hadGeneration", PROV), generation);
                let usage = self.node(usage);
                self.push(&q, format!("{}hadUsage", PROV), usage);
                for (name, value) in [
                    ("additions", stats.additions),
                    ("changes", stats.changes),
                    ("deletions", stats.deletions),
                ] {
                    let p = self.records.iri(name);
                    self.push(&q, p, int(value));
                }
            }
        }
    }
}

/// All triples of `records`, in statement order
pub fn triples(records: &RecordSet) -> Vec<Triple> {
    let mut emitter = Emitter {
        records,
        triples: Vec::with_capacity(records.statement_count() * 4),
    };

    for activity in &records.activities {
        emitter.activity(activity);
    }
    for agent in &records.agents {
        emitter.agent(agent);
    }
    for entity in records.entities.iter().chain(&records.base_entities) {
        emitter.entity(entity);
    }
    for relation in &records.relations {
        emitter.relation(relation);
    }

    if records
        .relations
        .iter()
        .any(|r| matches!(r, Relation::Association { .. }))
    {
        let role = emitter.node(AUTHORSHIP_ROLE);
        emitter.typed(&role, format!("{}Role", PROV));
        emitter.push(&role, format!("{}label", RDFS), Term::literal(AUTHORSHIP_ROLE));
    }

    emitter.triples
}

fn date_time(time: &DateTime<Utc>) -> Term {
    Term::typed(timestamp(time), format!("{}dateTime", XSD))
}

fn any_uri(uri: &str) -> Term {
    Term::typed(uri, format!("{}anyURI", XSD))
}

fn int(value: u32) -> Term {
    Term::typed(value.to_string(), format!("{}int", XSD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prov::records::ChangeStats;
    use chrono::TimeZone;

    fn records() -> RecordSet {
        let time = Utc.with_ymd_and_hms(2021, 3, 2, 12, 0, 0).unwrap();
        RecordSet {
            repository: "o/n".to_string(),
            namespace: "http://localhost:8080/owner/o/n#".to_string(),
            activities: vec![Activity {
                id: "commit-c2".to_string(),
                sha: "c2".to_string(),
                label: "Edit".to_string(),
                timestamp: time,
                homepage: "https://github.com/o/n/commit/c2".to_string(),
            }],
            agents: vec![Agent {
                id: "bot".to_string(),
                login: "bot".to_string(),
                display_name: None,
                email: None,
                homepage: "https://github.com/bot".to_string(),
                avatar_url: None,
                agent_type: Some("Bot".to_string()),
                contributions: Some(7),
            }],
            entities: vec![],
            base_entities: vec![],
            relations: vec![
                Relation::Association {
                    id: "association-c2".to_string(),
                    activity: "commit-c2".to_string(),
                    agent: "bot".to_string(),
                    role: AUTHORSHIP_ROLE.to_string(),
                },
                Relation::Derivation {
                    id: "derivation-x".to_string(),
                    generated: "file-a_commit-c2".to_string(),
                    used: "file-a_commit-c1".to_string(),
                    activity: "commit-c2".to_string(),
                    generation: "generation-file-a-c2".to_string(),
                    usage: "usage-file-a-c2-c1".to_string(),
                    stats: ChangeStats {
                        additions: 1,
                        changes: 2,
                        deletions: 1,
                    },
                },
            ],
        }
    }

    fn has(triples: &[Triple], s: &str, p: &str, o: Term) -> bool {
        triples.contains(&Triple::new(Term::iri(s), Term::iri(p), o))
    }

    #[test]
    fn test_bot_is_software_agent() {
        let triples = triples(&records());
        let ns = "http://localhost:8080/owner/o/n#";
        assert!(has(
            &triples,
            &format!("{}bot", ns),
            &format!("{}type", RDF),
            Term::iri(format!("{}SoftwareAgent", PROV))
        ));
        assert!(has(
            &triples,
            &format!("{}bot", ns),
            &format!("{}contributions", ns),
            int(7)
        ));
    }

    #[test]
    fn test_relation_emitted_qualified_and_unqualified() {
        let triples = triples(&records());
        let ns = "http://localhost:8080/owner/o/n#";
        assert!(has(
            &triples,
            &format!("{}file-a_commit-c2", ns),
            &format!("{}wasDerivedFrom", PROV),
            Term::iri(format!("{}file-a_commit-c1", ns))
        ));
        assert!(has(
            &triples,
            &format!("{}derivation-x", ns),
            &format!("{}hadUsage", PROV),
            Term::iri(format!("{}usage-file-a-c2-c1", ns))
        ));
        assert!(has(
            &triples,
            &format!("{}association-c2", ns),
            &format!("{}hadRole", PROV),
            Term::iri(format!("{}authorship", ns))
        ));
        assert!(!triples
            .iter()
            .any(|t| matches!(&t.subject, Term::Blank(_)) || matches!(&t.object, Term::Blank(_))));
    }

    #[test]
    fn test_activity_time_is_xsd_date_time() {
        let triples = triples(&records());
        let started = triples
            .iter()
            .find(|t| t.predicate == Term::iri(format!("{}startedAtTime", PROV)))
            .unwrap();
        assert_eq!(
            started.object,
            Term::typed("2021-03-02T12:00:00Z", format!("{}dateTime", XSD))
        );
    }
}
