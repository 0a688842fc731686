//! Provenance records produced by a build
//!
//! Ids are local names inside the document namespace carried by the
//! [`RecordSet`]; serializers expand them to IRIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub login: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub homepage: String,
    pub avatar_url: Option<String>,
    /// Account type reported by the provider (User, Organization, Bot)
    pub agent_type: Option<String>,
    pub contributions: Option<u32>,
}

/// A commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub sha: String,
    /// Commit message
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub homepage: String,
}

/// A file identity (base entity) or a file at one commit (versioned entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    /// Original filename
    pub label: String,
}

/// Line deltas attached to a derivation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub additions: u32,
    pub changes: u32,
    pub deletions: u32,
}

/// Relation discriminant, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    Association,
    Specialization,
    Generation,
    Invalidation,
    Usage,
    Communication,
    Derivation,
}

/// A relation between records, referenced by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Relation {
    Association {
        id: String,
        activity: String,
        agent: String,
        role: String,
    },
    Specialization {
        specific: String,
        general: String,
    },
    Generation {
        id: String,
        entity: String,
        activity: String,
        time: DateTime<Utc>,
    },
    Invalidation {
        id: String,
        entity: String,
        activity: String,
        time: DateTime<Utc>,
    },
    Usage {
        id: String,
        activity: String,
        entity: String,
        time: DateTime<Utc>,
    },
    Communication {
        id: String,
        informed: String,
        informant: String,
    },
    Derivation {
        id: String,
        generated: String,
        used: String,
        activity: String,
        generation: String,
        usage: String,
        stats: ChangeStats,
    },
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::Association { .. } => RelationKind::Association,
            Relation::Specialization { .. } => RelationKind::Specialization,
            Relation::Generation { .. } => RelationKind::Generation,
            Relation::Invalidation { .. } => RelationKind::Invalidation,
            Relation::Usage { .. } => RelationKind::Usage,
            Relation::Communication { .. } => RelationKind::Communication,
            Relation::Derivation { .. } => RelationKind::Derivation,
        }
    }

    /// Relation id; specializations are unqualified and have none
    pub fn id(&self) -> Option<&str> {
        match self {
            Relation::Specialization { .. } => None,
            Relation::Association { id, .. }
            | Relation::Generation { id, .. }
            | Relation::Invalidation { id, .. }
            | Relation::Usage { id, .. }
            | Relation::Communication { id, .. }
            | Relation::Derivation { id, .. } => Some(id),
        }
    }
}

/// One record of a [`RecordSet`], borrowed
#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Activity(&'a Activity),
    Agent(&'a Agent),
    Entity(&'a Entity),
    Relation(&'a Relation),
}

/// The finished output of one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Store key, `owner/name`
    pub repository: String,
    /// Document namespace ids are resolved against (ends with `#`)
    pub namespace: String,
    pub activities: Vec<Activity>,
    pub agents: Vec<Agent>,
    pub entities: Vec<Entity>,
    pub base_entities: Vec<Entity>,
    /// Grouped by [`RelationKind`] order, insertion order within a kind
    pub relations: Vec<Relation>,
}

impl RecordSet {
    pub fn relations_of(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(move |r| r.kind() == kind)
    }

    /// All records in emission order: activities, agents, associations,
    /// entities, base entities, then the remaining relations by kind.
    pub fn statements(&self) -> Vec<Statement<'_>> {
        let mut out = Vec::with_capacity(
            self.activities.len()
                + self.agents.len()
                + self.entities.len()
                + self.base_entities.len()
                + self.relations.len(),
        );
        out.extend(self.activities.iter().map(Statement::Activity));
        out.extend(self.agents.iter().map(Statement::Agent));
        out.extend(
            self.relations_of(RelationKind::Association)
                .map(Statement::Relation),
        );
        out.extend(self.entities.iter().map(Statement::Entity));
        out.extend(self.base_entities.iter().map(Statement::Entity));
        out.extend(
            self.relations
                .iter()
                .filter(|r| r.kind() != RelationKind::Association)
                .map(Statement::Relation),
        );
        out
    }

    /// Expand a local id into an IRI
    pub fn iri(&self, id: &str) -> String {
        format!("{}{}", self.namespace, id)
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn statement_count(&self) -> usize {
        self.activities.len()
            + self.agents.len()
            + self.entities.len()
            + self.base_entities.len()
            + self.relations.len()
    }
}
