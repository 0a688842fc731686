//! Provenance graph construction
//!
//! Turns a commit history into PROV records:
//! - [`ids`] - stable node identifiers
//! - [`contributors`] - commit author → Agent resolution
//! - [`versions`] - per-file version chains
//! - [`builder`] - the build itself, producing a [`RecordSet`]

pub mod builder;
pub mod contributors;
pub mod ids;
pub mod records;
pub mod versions;

pub use builder::{BuildOptions, BuildStats, GraphBuilder, AUTHORSHIP_ROLE};
pub use contributors::{ContributorResolver, ResolverStrategy};
pub use records::{
    Activity, Agent, ChangeStats, Entity, RecordSet, Relation, RelationKind, Statement,
};
pub use versions::VersionTracker;
