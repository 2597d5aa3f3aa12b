//! Tests for the migration runner over in-memory adapters.

use super::*;
use crate::domain::ports::{MigrationStoreError, MockMigrationStore};
use crate::test_support::migrations::{
    InMemoryMigrationStore, InMemoryRevisionSource, id, revision_file,
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type Runner = MigrationRunner<InMemoryMigrationStore, InMemoryRevisionSource>;

type Handles = (
    Runner,
    Arc<InMemoryMigrationStore>,
    Arc<InMemoryRevisionSource>,
);

fn runner_with(store: InMemoryMigrationStore, source: InMemoryRevisionSource) -> Handles {
    let store = Arc::new(store);
    let source = Arc::new(source);
    let runner = MigrationRunner::new(store.clone(), source.clone(), Arc::new(DefaultClock));
    (runner, store, source)
}

#[fixture]
fn linear_source() -> InMemoryRevisionSource {
    InMemoryRevisionSource::with_files(vec![
        revision_file("a", &[]),
        revision_file("b", &["a"]),
        revision_file("c", &["b"]),
    ])
}

#[rstest]
#[tokio::test]
async fn upgrade_head_runs_every_revision(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), linear_source);

    let applied = runner.upgrade(&Target::Head).await.expect("upgrade");

    assert_eq!(applied.len(), 3);
    assert_eq!(store.rows(), vec!["c"]);
    assert_eq!(store.executed(), vec!["-- up a", "-- up b", "-- up c"]);
}

#[rstest]
#[tokio::test]
async fn downgrade_then_upgrade_reapplies_one(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), linear_source);
    runner.upgrade(&Target::Head).await.expect("upgrade");

    let reverted = runner
        .downgrade(&"-1".parse().expect("target"))
        .await
        .expect("downgrade");
    assert_eq!(reverted.len(), 1);
    assert_eq!(store.rows(), vec!["b"]);

    let reapplied = runner.upgrade(&Target::Head).await.expect("upgrade");
    assert_eq!(reapplied.len(), 1);
    assert_eq!(store.rows(), vec!["c"]);
}

#[rstest]
#[tokio::test]
async fn failed_step_keeps_earlier_steps(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), linear_source);
    store.fail_on("-- up c");

    let err = runner
        .upgrade(&Target::Head)
        .await
        .expect_err("step c fails");

    assert!(matches!(err, MigrationError::StepFailed { ref revision, .. } if revision == "c"));
    assert_eq!(store.rows(), vec!["b"]);
}

#[rstest]
#[tokio::test]
async fn auto_on_empty_database_installs_everything(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), linear_source);

    let outcome = runner.auto().await.expect("auto");

    assert_eq!(outcome.branch, AutoBranch::FreshInstall);
    assert_eq!(outcome.applied.len(), 3);
    assert_eq!(store.rows(), vec!["c"]);
}

#[rstest]
#[tokio::test]
async fn auto_on_untracked_schema_stamps_head(linear_source: InMemoryRevisionSource) {
    let store = InMemoryMigrationStore::default();
    store.add_table(SENTINEL_TABLE);
    let (runner, store, _) = runner_with(store, linear_source);

    let outcome = runner.auto().await.expect("auto");

    assert_eq!(outcome.branch, AutoBranch::StampedExisting);
    assert!(outcome.applied.is_empty());
    assert!(store.executed().is_empty());
    assert_eq!(store.rows(), vec!["c"]);
}

#[rstest]
#[tokio::test]
async fn auto_on_tracked_database_upgrades(linear_source: InMemoryRevisionSource) {
    let store = InMemoryMigrationStore::with_rows(&["a"]);
    store.add_table(SENTINEL_TABLE);
    let (runner, store, _) = runner_with(store, linear_source);

    let outcome = runner.auto().await.expect("auto");

    assert_eq!(outcome.branch, AutoBranch::Upgrade);
    assert_eq!(outcome.applied.len(), 2);
    assert_eq!(store.executed(), vec!["-- up b", "-- up c"]);
}

#[rstest]
fn revision_parents_on_single_head(linear_source: InMemoryRevisionSource) {
    let (runner, _, source) = runner_with(InMemoryMigrationStore::default(), linear_source);

    let created = runner
        .revision("add avatar column", None, false)
        .expect("revision written");

    assert_eq!(created.parents, vec![id("c")]);
    assert!(created.path.ends_with("_add_avatar_column.sql"));
    let graph = runner.load_graph().expect("graph reloads");
    assert_eq!(graph.heads(), vec![created.id]);
    assert_eq!(source.files().len(), 4);
}

#[rstest]
fn revision_message_is_folded_onto_one_line(linear_source: InMemoryRevisionSource) {
    let (runner, _, source) = runner_with(InMemoryMigrationStore::default(), linear_source);

    let created = runner
        .revision("add sku\n  to items\n", None, false)
        .expect("revision written");

    assert!(created.path.ends_with("_add_sku_to_items.sql"));
    let written = source
        .files()
        .into_iter()
        .find(|file| created.path.ends_with(&file.name))
        .expect("script stored");
    assert!(written.contents.contains("-- message: add sku to items\n"));
    assert!(written.contents.contains("-- upgrade statements for: add sku to items\n"));
    let graph = runner.load_graph().expect("graph reloads");
    let reloaded = graph.get(&created.id).expect("revision loaded");
    assert_eq!(reloaded.message, "add sku to items");
}

#[rstest]
fn revision_refuses_multiple_heads() {
    let source = InMemoryRevisionSource::with_files(vec![
        revision_file("a", &[]),
        revision_file("b1", &["a"]),
        revision_file("b2", &["a"]),
    ]);
    let (runner, _, _) = runner_with(InMemoryMigrationStore::default(), source);

    assert!(matches!(
        runner.revision("next", None, true),
        Err(MigrationError::MultipleHeads { .. })
    ));
    assert!(runner.revision("next", Some("b1"), true).is_ok());
}

#[rstest]
#[tokio::test]
async fn merge_collapses_two_stamped_heads() {
    let source = InMemoryRevisionSource::with_files(vec![
        revision_file("a", &[]),
        revision_file("b1", &["a"]),
        revision_file("b2", &["a"]),
    ]);
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), source);
    runner.upgrade(&Target::Heads).await.expect("upgrade heads");
    assert_eq!(store.rows(), vec!["b1", "b2"]);

    let merge = runner.merge("merge branches", &[]).expect("merge written");
    runner.upgrade(&Target::Head).await.expect("upgrade head");

    assert_eq!(store.rows(), vec![merge.id.to_string()]);
}

#[rstest]
fn merge_needs_two_parents(linear_source: InMemoryRevisionSource) {
    let (runner, _, _) = runner_with(InMemoryMigrationStore::default(), linear_source);
    assert_eq!(
        runner.merge("nothing to merge", &[]),
        Err(MigrationError::MergeNeedsTwoRevisions { found: 1 })
    );
}

#[rstest]
#[tokio::test]
async fn stamp_base_clears_rows(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::with_rows(&["c"]), linear_source);

    let rows = runner.stamp(&Target::Base).await.expect("stamp");

    assert!(rows.is_empty());
    assert!(store.rows().is_empty());
    assert!(store.executed().is_empty());
}

#[rstest]
#[tokio::test]
async fn current_flags_unknown_rows(linear_source: InMemoryRevisionSource) {
    let (runner, _, _) = runner_with(InMemoryMigrationStore::with_rows(&["c", "gone"]), linear_source);

    let current = runner.current().await.expect("current");

    assert_eq!(current.len(), 2);
    assert!(current[0].known && current[0].is_head);
    assert!(!current[1].known);
}

#[rstest]
#[tokio::test]
async fn unknown_stamped_revision_blocks_upgrade(linear_source: InMemoryRevisionSource) {
    let (runner, _, _) = runner_with(InMemoryMigrationStore::with_rows(&["gone"]), linear_source);

    assert_eq!(
        runner.upgrade(&Target::Head).await,
        Err(MigrationError::UnknownRevision {
            target: "gone".into()
        })
    );
}

#[rstest]
fn offline_sql_does_not_touch_store(linear_source: InMemoryRevisionSource) {
    let (runner, store, _) = runner_with(InMemoryMigrationStore::default(), linear_source);

    let sql = runner
        .upgrade_sql(&Target::Head, Some("a"))
        .expect("offline script");

    assert!(sql.contains("-- up b"));
    assert!(!sql.contains("-- up a"));
    assert!(store.executed().is_empty());
}

#[rstest]
#[tokio::test]
async fn store_failures_surface_unchanged(linear_source: InMemoryRevisionSource) {
    let mut store = MockMigrationStore::new();
    store
        .expect_current_heads()
        .times(1)
        .return_once(|| Err(MigrationStoreError::connection("refused")));
    let runner = MigrationRunner::new(
        Arc::new(store),
        Arc::new(linear_source),
        Arc::new(DefaultClock),
    );

    let err = runner.upgrade(&Target::Head).await.expect_err("store down");

    assert_eq!(
        err,
        MigrationError::Store(MigrationStoreError::connection("refused"))
    );
}
