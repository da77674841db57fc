//! Member Repository Tests
//!
//! End-to-end scenarios over a `member` collection with a related `team`
//! collection:
//! - CRUD through the staging layer
//! - Derived, in-set and named queries
//! - Paging, slicing and DTO mapping
//! - Bulk mutation with and without staging invalidation
//! - Batched nested projections (no N+1)
//! - Read-only and lock hints

use aerorepo::backend::{DataSource, LockMode, MemoryBackend, ReadOptions};
use aerorepo::executor::ExecutorError;
use aerorepo::observability::Logger;
use aerorepo::projection::ProjectionShape;
use aerorepo::query::{PageRequest, QueryDescriptor, SortDirection, SortSpec};
use aerorepo::record::{FieldDef, FieldType, Record, RecordId, RecordSchema};
use aerorepo::repository::{RepoError, Repository};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn fields(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

fn member_schema() -> RecordSchema {
    RecordSchema::new("member")
        .with_field("username", FieldDef::required(FieldType::String))
        .with_field("age", FieldDef::optional(FieldType::Int))
        .with_field("team_id", FieldDef::reference("team"))
}

fn team_schema() -> RecordSchema {
    RecordSchema::new("team").with_field("name", FieldDef::required(FieldType::String))
}

/// Repository with teamA (id 1) and teamB (id 2) already stored
fn repository() -> Repository<MemoryBackend> {
    let mut backend = MemoryBackend::default()
        .with_collection("member")
        .with_collection("team");
    backend.insert("team", fields(json!({"name": "teamA"}))).unwrap();
    backend.insert("team", fields(json!({"name": "teamB"}))).unwrap();
    backend.register_named_query("Member.findByUsername", "member", |record, query| {
        query.param("username") == record.get("username")
    });

    Repository::new(backend, member_schema())
        .with_related(team_schema())
        .with_logger(Logger::silent())
}

fn save(repo: &mut Repository<MemoryBackend>, username: &str, age: i64, team: Option<u64>) -> Record {
    let mut body = json!({"username": username, "age": age});
    if let Some(team) = team {
        body["team_id"] = json!(team);
    }
    repo.save(fields(body)).unwrap()
}

fn usernames(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(|r| r.get_str("username")).collect()
}

fn ages(records: &[Record]) -> Vec<i64> {
    records.iter().filter_map(|r| r.get_i64("age")).collect()
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[test]
fn test_save_and_find_by_id() {
    let mut repo = repository();
    let saved = save(&mut repo, "memberA", 10, None);

    let found = repo.find_by_id(saved.id()).unwrap().unwrap();
    assert_eq!(found.id(), saved.id());
    assert_eq!(found.get_str("username"), Some("memberA"));
    assert_eq!(found, saved);
}

#[test]
fn test_basic_crud() {
    let mut repo = repository();
    let member1 = save(&mut repo, "member1", 10, None);
    let member2 = save(&mut repo, "member2", 20, None);

    assert_eq!(repo.find_by_id(member1.id()).unwrap(), Some(member1.clone()));
    assert_eq!(repo.find_by_id(member2.id()).unwrap(), Some(member2.clone()));
    assert_eq!(repo.find_all(&QueryDescriptor::all()).unwrap().len(), 2);
    assert_eq!(repo.count().unwrap(), 2);

    assert!(repo.delete(member1.id()).unwrap());
    assert!(repo.delete(member2.id()).unwrap());
    assert_eq!(repo.count().unwrap(), 0);
    assert!(repo.find_by_id(member1.id()).unwrap().is_none());
}

#[test]
fn test_update_writes_through() {
    let mut repo = repository();
    let mut member = save(&mut repo, "member1", 10, None);

    member.set("username", json!("member2")).unwrap();
    repo.update(member.clone()).unwrap();

    let found = repo.get_by_id(member.id()).unwrap();
    assert_eq!(found.get_str("username"), Some("member2"));

    let stored = repo
        .backend()
        .get("member", member.id(), &ReadOptions::direct())
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("username"), Some("member2"));
}

#[test]
fn test_id_is_immutable() {
    let mut repo = repository();
    let mut member = save(&mut repo, "member1", 10, None);

    let err = member.set("id", json!(99)).unwrap_err();
    assert_eq!(err.code().code(), "AERO_RECORD_IMMUTABLE_ID");
    assert_eq!(member.id(), RecordId(1));
}

// =============================================================================
// Derived Query Tests
// =============================================================================

#[test]
fn test_find_by_username_and_age_greater_than() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, None);
    save(&mut repo, "AAA", 20, None);

    let result = repo
        .find_all(
            &QueryDescriptor::all()
                .where_eq("username", "AAA")
                .where_gt("age", 15),
        )
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get_str("username"), Some("AAA"));
    assert_eq!(result[0].get_i64("age"), Some(20));
}

#[test]
fn test_find_by_names_in_set() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, None);
    save(&mut repo, "BBB", 20, None);
    save(&mut repo, "CCC", 30, None);

    let result = repo
        .find_all(&QueryDescriptor::all().where_in("username", ["AAA", "BBB"]))
        .unwrap();
    assert_eq!(usernames(&result), vec!["AAA", "BBB"]);
}

#[test]
fn test_named_query() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, None);
    save(&mut repo, "BBB", 20, None);

    let result = repo
        .find_all(&QueryDescriptor::text("Member.findByUsername").with_param("username", "AAA"))
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get_i64("age"), Some(10));
}

#[test]
fn test_unregistered_query_text_fails_in_backend() {
    let repo = repository();
    let err = repo
        .find_all(&QueryDescriptor::text("select m from Member m"))
        .unwrap_err();
    assert_eq!(err.code(), "AERO_BACKEND_UNSUPPORTED_QUERY");
}

#[test]
fn test_find_username_list() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, None);
    save(&mut repo, "BBB", 20, None);

    let names = repo.find_values(&QueryDescriptor::all(), "username").unwrap();
    assert_eq!(names, vec![json!("AAA"), json!("BBB")]);
}

#[test]
fn test_find_one_cardinality() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, None);
    save(&mut repo, "AAA", 20, None);
    save(&mut repo, "BBB", 30, None);

    let one = repo
        .find_one(&QueryDescriptor::all().where_eq("username", "BBB"), LockMode::None)
        .unwrap();
    assert_eq!(one.get_i64("age"), Some(30));

    let none = repo
        .find_one(&QueryDescriptor::all().where_eq("username", "ZZZ"), LockMode::None)
        .unwrap_err();
    assert!(none.is_not_found());

    let many = repo
        .find_one(&QueryDescriptor::all().where_eq("username", "AAA"), LockMode::None)
        .unwrap_err();
    assert!(matches!(
        many,
        RepoError::Executor(ExecutorError::AmbiguousResult { count: 2, .. })
    ));
    assert_eq!(many.code(), "AERO_EXECUTOR_AMBIGUOUS_RESULT");
}

// =============================================================================
// Paging Tests
// =============================================================================

#[test]
fn test_paging() {
    let mut repo = repository();
    for i in 1..=5 {
        save(&mut repo, &format!("member{}", i), 10, None);
    }

    let request = PageRequest::sorted(0, 3, SortSpec::desc("username")).unwrap();
    let page = repo
        .find_page(&QueryDescriptor::all().where_eq("age", 10), &request)
        .unwrap();

    assert_eq!(usernames(page.content()), vec!["member5", "member4", "member3"]);
    assert_eq!(page.content().len(), 3);
    assert_eq!(page.total_elements(), 5);
    assert_eq!(page.number(), 0);
    assert_eq!(page.total_pages(), 2);
    assert!(page.is_first());
    assert!(page.has_next());
}

#[test]
fn test_page_map_to_dto() {
    #[derive(Debug, PartialEq)]
    struct MemberDto {
        id: RecordId,
        username: String,
    }

    let mut repo = repository();
    for i in 1..=5 {
        save(&mut repo, &format!("member{}", i), 10, None);
    }

    let request = PageRequest::sorted(1, 3, SortSpec::desc("username")).unwrap();
    let page = repo
        .find_page(&QueryDescriptor::all(), &request)
        .unwrap()
        .map(|r| MemberDto {
            id: r.id(),
            username: r.get_str("username").unwrap_or_default().to_string(),
        });

    assert_eq!(
        page.content(),
        &[
            MemberDto {
                id: RecordId(2),
                username: "member2".into()
            },
            MemberDto {
                id: RecordId(1),
                username: "member1".into()
            },
        ]
    );
    assert_eq!(page.total_elements(), 5);
    assert!(page.is_last());
    assert!(page.has_previous());
}

#[test]
fn test_slice() {
    let mut repo = repository();
    for i in 1..=5 {
        save(&mut repo, &format!("member{}", i), 10, None);
    }
    let descriptor = QueryDescriptor::all().where_eq("age", 10);

    let first = PageRequest::sorted(0, 3, SortSpec::desc("username")).unwrap();
    let slice = repo.find_slice(&descriptor, &first).unwrap();
    assert_eq!(usernames(slice.content()), vec!["member5", "member4", "member3"]);
    assert!(slice.has_next());

    let slice = repo.find_slice(&descriptor, &first.next()).unwrap();
    assert_eq!(usernames(slice.content()), vec!["member2", "member1"]);
    assert!(!slice.has_next());
}

#[test]
fn test_multi_key_sort() {
    let mut repo = repository();
    save(&mut repo, "b", 20, None);
    save(&mut repo, "z", 10, None);
    save(&mut repo, "a", 20, None);

    let result = repo
        .find_all(
            &QueryDescriptor::all()
                .with_sort(SortSpec::desc("age").then(SortDirection::Asc, "username")),
        )
        .unwrap();
    assert_eq!(usernames(&result), vec!["a", "b", "z"]);
}

// =============================================================================
// Bulk Mutation Tests
// =============================================================================

#[test]
fn test_bulk_age_plus() {
    let mut repo = repository();
    for (i, age) in [10, 19, 20, 21, 40].into_iter().enumerate() {
        save(&mut repo, &format!("member{}", i + 1), age, None);
    }

    let count = repo
        .bulk_mutate(
            &QueryDescriptor::all().where_gte("age", 20),
            |r| r.increment("age", 1).map(|_| ()),
            true,
        )
        .unwrap();
    assert_eq!(count, 3);

    let all = repo.find_all(&QueryDescriptor::all()).unwrap();
    assert_eq!(ages(&all), vec![10, 19, 21, 22, 41]);
    assert_eq!(repo.metrics().records_mutated, 3);
}

#[test]
fn test_bulk_without_invalidate_serves_stale_copies() {
    let mut repo = repository();
    let member = save(&mut repo, "member5", 40, None);

    repo.bulk_mutate(
        &QueryDescriptor::all().where_gte("age", 20),
        |r| r.increment("age", 1).map(|_| ()),
        false,
    )
    .unwrap();

    // staged copy predates the mutation
    let staged = repo.find_by_id(member.id()).unwrap().unwrap();
    assert_eq!(staged.get_i64("age"), Some(40));

    let direct = repo
        .find_all_with(&QueryDescriptor::all(), &ReadOptions::direct())
        .unwrap();
    assert_eq!(ages(&direct), vec![41]);

    repo.clear_staging();
    let fresh = repo.find_by_id(member.id()).unwrap().unwrap();
    assert_eq!(fresh.get_i64("age"), Some(41));
}

#[test]
fn test_bulk_with_invalidate_reads_fresh() {
    let mut repo = repository();
    let member = save(&mut repo, "member5", 40, None);
    assert!(repo.backend().is_staged("member", member.id()));

    repo.bulk_mutate(
        &QueryDescriptor::all().where_gte("age", 20),
        |r| r.increment("age", 1).map(|_| ()),
        true,
    )
    .unwrap();

    assert!(!repo.backend().is_staged("member", member.id()));
    let fresh = repo.find_by_id(member.id()).unwrap().unwrap();
    assert_eq!(fresh.get_i64("age"), Some(41));
    assert_eq!(repo.metrics().staging_invalidations, 1);
}

// =============================================================================
// Projection Tests
// =============================================================================

#[test]
fn test_nested_projection_batches_related_fetch() {
    let mut repo = repository();
    save(&mut repo, "member1", 10, Some(1));
    save(&mut repo, "member2", 10, Some(2));
    save(&mut repo, "member3", 10, Some(1));
    save(&mut repo, "member4", 10, None);

    let before = repo.backend().stats();
    let shape = ProjectionShape::of(["username"]).with_nested("team", "team_id", ["name"]);
    let views = repo
        .find_all_projected(&QueryDescriptor::all(), &shape)
        .unwrap();
    let after = repo.backend().stats();

    // one scan for members, one batch for teams
    assert_eq!(after.scans - before.scans, 1);
    assert_eq!(after.batch_lookups - before.batch_lookups, 1);
    assert_eq!(after.point_lookups, before.point_lookups);

    let teams: Vec<Option<&str>> = views
        .iter()
        .map(|v| v.nested("team").and_then(|t| t.get_str("name")))
        .collect();
    assert_eq!(teams, vec![Some("teamA"), Some("teamB"), Some("teamA"), None]);
    assert!(views[0].get("age").is_none());
}

#[test]
fn test_member_dto_projection_json() {
    let mut repo = repository();
    save(&mut repo, "AAA", 10, Some(1));

    let shape = ProjectionShape::of(["username"]).with_nested("team", "team_id", ["name"]);
    let views = repo
        .find_all_projected(&QueryDescriptor::all(), &shape)
        .unwrap();

    assert_eq!(
        serde_json::to_value(&views).unwrap(),
        json!([{"id": 1, "username": "AAA", "team": {"id": 1, "name": "teamA"}}])
    );
}

#[test]
fn test_projected_page() {
    let mut repo = repository();
    for i in 1..=5 {
        save(&mut repo, &format!("member{}", i), i, Some(1));
    }

    let request = PageRequest::sorted(0, 2, SortSpec::desc("age")).unwrap();
    let page = repo
        .find_page_projected(
            &QueryDescriptor::all().where_gt("age", 1),
            &request,
            &ProjectionShape::of(["username"]),
        )
        .unwrap();

    assert_eq!(page.total_elements(), 4);
    assert_eq!(page.total_pages(), 2);
    let names: Vec<&str> = page.content().iter().filter_map(|v| v.get_str("username")).collect();
    assert_eq!(names, vec!["member5", "member4"]);
}

#[test]
fn test_projection_unknown_field_rejected() {
    let repo = repository();
    let err = repo
        .find_all_projected(
            &QueryDescriptor::all(),
            &ProjectionShape::of(["username"]).with_nested("team", "team_id", ["budget"]),
        )
        .unwrap_err();
    assert_eq!(err.code(), "AERO_QUERY_UNKNOWN_FIELD");
}

#[test]
fn test_projection_duplicate_keys_rejected() {
    let mut repo = repository();
    save(&mut repo, "member1", 10, Some(1));

    let err = repo
        .find_all_projected(&QueryDescriptor::all(), &ProjectionShape::of(["id", "username"]))
        .unwrap_err();
    assert_eq!(err.code(), "AERO_QUERY_INVALID");

    let err = repo
        .find_all_projected(
            &QueryDescriptor::all(),
            &ProjectionShape::of(["username"]).with_nested("username", "team_id", ["name"]),
        )
        .unwrap_err();
    assert_eq!(err.code(), "AERO_QUERY_INVALID");
}

// =============================================================================
// Hint Tests
// =============================================================================

#[test]
fn test_read_only_hint_skips_staging() {
    let mut repo = repository();
    let member = save(&mut repo, "member1", 10, None);
    repo.clear_staging();

    let result = repo
        .find_all_with(
            &QueryDescriptor::all().where_eq("username", "member1"),
            &ReadOptions::read_only(),
        )
        .unwrap();
    assert_eq!(result.len(), 1);
    assert!(!repo.backend().is_staged("member", member.id()));

    repo.find_all(&QueryDescriptor::all().where_eq("username", "member1"))
        .unwrap();
    assert!(repo.backend().is_staged("member", member.id()));
}

#[test]
fn test_lock_hint_forwarded() {
    let mut repo = repository();
    save(&mut repo, "member1", 10, None);

    repo.find_one(
        &QueryDescriptor::all().where_eq("username", "member1"),
        LockMode::PessimisticWrite,
    )
    .unwrap();
    assert_eq!(repo.backend().last_lock(), LockMode::PessimisticWrite);

    repo.find_all_with(
        &QueryDescriptor::all(),
        &ReadOptions::locked(LockMode::PessimisticRead),
    )
    .unwrap();
    assert_eq!(repo.backend().last_lock(), LockMode::PessimisticRead);
}
