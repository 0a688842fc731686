use super::*;
use crate::error::ProvError;
use crate::git::memory::{anonymous_author, author, commit};
use crate::git::MemorySource;
use crate::models::{Contributor, UserProfile};
use crate::prov::records::RelationKind;
use chrono::{DateTime, TimeZone, Utc};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, d, 12, 0, 0).unwrap()
}

fn repo() -> RepoRef {
    RepoRef::new("octo", "hello")
}

fn lazy() -> BuildOptions {
    BuildOptions {
        strategy: ResolverStrategy::Lazy,
        ..BuildOptions::default()
    }
}

/// C1 adds a.txt, C2 modifies it, C3 removes it
fn add_modify_remove() -> MemorySource {
    MemorySource::new()
        .with_commit(
            commit("c1", &[], author("alice", "Alice", day(1)), "Add a"),
            vec![FileChange::added("a.txt").with_stats(10, 0)],
        )
        .with_commit(
            commit("c2", &["c1"], author("alice", "Alice", day(2)), "Edit a"),
            vec![FileChange::modified("a.txt").with_stats(3, 1)],
        )
        .with_commit(
            commit("c3", &["c2"], author("bob", "Bob", day(3)), "Drop a"),
            vec![FileChange::removed("a.txt").with_stats(0, 12)],
        )
}

fn build(source: &MemorySource, options: BuildOptions) -> (RecordSet, BuildStats) {
    GraphBuilder::new(repo(), options)
        .build(source, source)
        .unwrap()
}

fn count(records: &RecordSet, kind: RelationKind) -> usize {
    records.relations_of(kind).count()
}

#[test]
fn test_add_then_modify() {
    let (records, stats) = build(&add_modify_remove(), lazy());

    assert_eq!(stats.commits_processed, 3);
    assert!(records.relations.contains(&Relation::Specialization {
        specific: "file-a-txt_commit-c2".to_string(),
        general: "file-a-txt".to_string(),
    }));
    assert!(records.relations.contains(&Relation::Generation {
        id: "generation-file-a-txt-c2".to_string(),
        entity: "file-a-txt_commit-c2".to_string(),
        activity: "commit-c2".to_string(),
        time: day(2),
    }));
    assert!(records.relations.contains(&Relation::Usage {
        id: "usage-file-a-txt-c2-c1".to_string(),
        activity: "commit-c2".to_string(),
        entity: "file-a-txt_commit-c1".to_string(),
        time: day(2),
    }));
    assert!(records.relations.contains(&Relation::Derivation {
        id: "derivation-file-a-txt_commit-c2-c1".to_string(),
        generated: "file-a-txt_commit-c2".to_string(),
        used: "file-a-txt_commit-c1".to_string(),
        activity: "commit-c2".to_string(),
        generation: "generation-file-a-txt-c2".to_string(),
        usage: "usage-file-a-txt-c2-c1".to_string(),
        stats: ChangeStats {
            additions: 3,
            changes: 4,
            deletions: 1,
        },
    }));
    assert!(records.relations.contains(&Relation::Communication {
        id: "information-c1-c2".to_string(),
        informed: "commit-c2".to_string(),
        informant: "commit-c1".to_string(),
    }));
}

#[test]
fn test_removal_invalidates_without_generation() {
    let (records, _) = build(&add_modify_remove(), lazy());

    assert!(records.relations.contains(&Relation::Invalidation {
        id: "invalidation-file-a-txt-c3".to_string(),
        entity: "file-a-txt_commit-c3".to_string(),
        activity: "commit-c3".to_string(),
        time: day(3),
    }));
    let c3_generations = records
        .relations_of(RelationKind::Generation)
        .filter(|r| matches!(r, Relation::Generation { activity, .. } if activity == "commit-c3"))
        .count();
    assert_eq!(c3_generations, 0);
}

#[test]
fn test_every_versioned_entity_has_one_specialization() {
    let (records, _) = build(&add_modify_remove(), lazy());

    assert_eq!(records.entities.len(), 3);
    for entity in &records.entities {
        let generals: Vec<&str> = records
            .relations
            .iter()
            .filter_map(|r| match r {
                Relation::Specialization { specific, general } if specific == &entity.id => {
                    Some(general.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(generals.len(), 1, "entity {}", entity.id);

        let base = records
            .base_entities
            .iter()
            .find(|b| b.id == generals[0])
            .unwrap();
        assert_eq!(base.label, entity.label);
    }
    // one base entity per distinct filename
    assert_eq!(records.base_entities.len(), 1);
}

#[test]
fn test_one_agent_per_login() {
    let mut source = MemorySource::new();
    let mut parent: Option<String> = None;
    for i in 1..=5u32 {
        let sha = format!("s{}", i);
        let parents: Vec<&str> = parent.iter().map(String::as_str).collect();
        source = source.with_commit(
            commit(&sha, &parents, author("alice", "Alice", day(i)), "work"),
            vec![],
        );
        parent = Some(sha);
    }

    let (records, _) = build(&source, lazy());
    assert_eq!(records.agents.len(), 1);
    assert_eq!(count(&records, RelationKind::Association), 5);
}

#[test]
fn test_first_observed_modification_has_no_usage() {
    let source = MemorySource::new()
        .with_commit(
            commit("c9", &["c8"], author("alice", "Alice", day(9)), "Edit"),
            vec![FileChange::modified("lib.rs").with_stats(1, 1)],
        )
        .truncated(true);

    let (records, stats) = build(&source, lazy());
    assert!(stats.truncated);
    assert_eq!(count(&records, RelationKind::Generation), 1);
    assert_eq!(count(&records, RelationKind::Usage), 0);
    assert_eq!(count(&records, RelationKind::Derivation), 0);
    // the parent link is still recorded
    assert_eq!(count(&records, RelationKind::Communication), 1);
}

#[test]
fn test_activities_oldest_first() {
    let (records, _) = build(&add_modify_remove(), lazy());
    let shas: Vec<&str> = records.activities.iter().map(|a| a.sha.as_str()).collect();
    assert_eq!(shas, vec!["c1", "c2", "c3"]);
    assert_eq!(
        records.activities[0].homepage,
        "https://github.com/octo/hello/commit/c1"
    );
    assert_eq!(records.activities[1].label, "Edit a");
}

#[test]
fn test_relations_grouped_by_kind() {
    let (records, _) = build(&add_modify_remove(), lazy());
    let kinds: Vec<RelationKind> = records.relations.iter().map(Relation::kind).collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
    assert_eq!(kinds.first(), Some(&RelationKind::Association));
    assert_eq!(kinds.last(), Some(&RelationKind::Derivation));
}

#[test]
fn test_unresolvable_author_skips_commit() {
    let source = MemorySource::new()
        .with_commit(
            commit("c1", &[], author("alice", "Alice", day(1)), "Add a"),
            vec![FileChange::added("a.txt")],
        )
        .with_commit(
            commit(
                "c2",
                &["c1"],
                anonymous_author("Stranger", "s@example.com", day(2)),
                "Drive-by",
            ),
            vec![FileChange::modified("a.txt")],
        );

    let (records, stats) = build(&source, lazy());
    assert_eq!(stats.commits_skipped, 1);
    // the activity stays, nothing hangs off it
    assert!(records.activity("commit-c2").is_some());
    assert_eq!(count(&records, RelationKind::Association), 1);
    assert_eq!(records.entities.len(), 1);
    assert_eq!(count(&records, RelationKind::Communication), 0);
}

#[test]
fn test_name_fallback_resolves_known_display_name() {
    let source = MemorySource::new()
        .with_contributor(
            Contributor {
                login: "alice".to_string(),
                contributor_type: "User".to_string(),
                contributions: 2,
                url: "https://api.github.com/users/alice".to_string(),
            },
            UserProfile {
                name: Some("Alice Liddell".to_string()),
                ..UserProfile::default()
            },
        )
        .with_commit(
            commit(
                "c1",
                &[],
                anonymous_author("Alice Liddell", "alice@laptop", day(1)),
                "Add a",
            ),
            vec![FileChange::added("a.txt")],
        );

    let (records, _) = build(&source, BuildOptions::default());
    assert!(records.relations.contains(&Relation::Association {
        id: "association-c1".to_string(),
        activity: "commit-c1".to_string(),
        agent: "alice".to_string(),
        role: AUTHORSHIP_ROLE.to_string(),
    }));

    let no_fallback = BuildOptions {
        name_fallback: false,
        ..BuildOptions::default()
    };
    let (records, stats) = build(&source, no_fallback);
    assert_eq!(stats.commits_skipped, 1);
    assert_eq!(count(&records, RelationKind::Association), 0);
}

#[test]
fn test_eager_strategy_keeps_contributor_metadata() {
    let source = add_modify_remove().with_contributor(
        Contributor {
            login: "alice".to_string(),
            contributor_type: "User".to_string(),
            contributions: 2,
            url: "https://api.github.com/users/alice".to_string(),
        },
        UserProfile {
            email: Some("alice@example.com".to_string()),
            name: Some("Alice".to_string()),
            avatar_url: None,
        },
    );

    let (records, stats) = build(&source, BuildOptions::default());
    assert_eq!(stats.agents, 2);
    let alice = records.agent("alice").unwrap();
    assert_eq!(alice.contributions, Some(2));
    assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
    // bob is not a listed contributor but still gets an agent
    assert!(records.agent("bob").is_some());
}

#[test]
fn test_other_status_records_entity_only() {
    let source = MemorySource::new().with_commit(
        commit("c1", &[], author("alice", "Alice", day(1)), "Rename"),
        vec![FileChange::new("new.txt", FileStatus::Other("renamed".to_string()))],
    );

    let (records, _) = build(&source, lazy());
    assert_eq!(records.entities.len(), 1);
    assert_eq!(count(&records, RelationKind::Specialization), 1);
    assert_eq!(count(&records, RelationKind::Generation), 0);
    assert_eq!(count(&records, RelationKind::Invalidation), 0);
}

#[test]
fn test_duplicate_commit_processed_once() {
    let c1 = commit("c1", &[], author("alice", "Alice", day(1)), "Add a");
    let source = MemorySource::new()
        .with_commit(c1.clone(), vec![FileChange::added("a.txt")])
        .with_commit(c1, vec![FileChange::added("a.txt")]);

    let (records, stats) = build(&source, lazy());
    assert_eq!(stats.duplicate_commits, 1);
    assert_eq!(records.activities.len(), 1);
    assert_eq!(records.entities.len(), 1);
}

#[test]
fn test_fetch_failure_aborts_build() {
    let source = add_modify_remove().failing_files("c2");
    let err = GraphBuilder::new(repo(), lazy())
        .build(&source, &source)
        .unwrap_err();
    assert!(matches!(err, ProvError::Fetch { .. }));
    assert!(err.is_fetch_failure());
}

#[test]
fn test_namespace_and_repository_key() {
    let options = BuildOptions {
        service_base: "https://prov.example.org/".to_string(),
        ..lazy()
    };
    let (records, _) = build(&add_modify_remove(), options);
    assert_eq!(records.repository, "octo/hello");
    assert_eq!(
        records.namespace,
        "https://prov.example.org/owner/octo/hello#"
    );
}
