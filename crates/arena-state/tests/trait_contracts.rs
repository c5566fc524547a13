//! Trait contract tests for AgentStateStore and ScenarioArchive.
//!
//! Every conforming implementation must pass these. Each contract is a
//! helper run against the in-memory backend and SurrealDB `mem://`.

use std::sync::Arc;

use arena_state::storage_traits::*;
use arena_state::{MemoryAgentStore, MemoryScenarioArchive, StorageError, SurrealHandle};
use chrono::{Duration, Utc};

async fn surreal() -> SurrealHandle {
    SurrealHandle::in_memory().await.unwrap()
}

// ===========================================================================
// AgentStateStore contracts
// ===========================================================================

async fn first_get_creates_default(store: &dyn AgentStateStore) {
    let state = store.get(&AgentId::from("alpha")).await.unwrap();
    assert_eq!(state.agent_id, AgentId::from("alpha"));
    assert_eq!(state.difficulty_multiplier, DEFAULT_MULTIPLIER);
    assert_eq!(state.total_games, 0);
    assert!(state.learning_history.is_empty());

    let again = store.get(&AgentId::from("alpha")).await.unwrap();
    assert_eq!(again.version, state.version);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

async fn update_bumps_version(store: &dyn AgentStateStore) {
    let id = AgentId::from("beta");
    let before = store.get(&id).await.unwrap();
    let after = store
        .update(&id, &|s: &mut AgentState| {
            s.difficulty_multiplier += 0.5;
            s.wins += 1;
            s.total_games += 1;
        })
        .await
        .unwrap();

    assert_eq!(after.version, before.version + 1);
    assert_eq!(after.difficulty_multiplier, 1.5);
    assert_eq!(store.get(&id).await.unwrap(), after);
}

async fn update_rejects_invalid_state(store: &dyn AgentStateStore) {
    let id = AgentId::from("gamma");
    let err = store
        .update(&id, &|s: &mut AgentState| s.difficulty_multiplier = 0.25)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidState { .. }));

    let state = store.get(&id).await.unwrap();
    assert_eq!(state.difficulty_multiplier, DEFAULT_MULTIPLIER);
}

async fn archive_is_idempotent(store: &dyn AgentStateStore) {
    let id = AgentId::from("delta");
    let first = store.archive(&id).await.unwrap();
    assert!(first.is_archived());
    let second = store.archive(&id).await.unwrap();
    assert_eq!(second.archived_at, first.archived_at);
}

async fn update_preserves_learning_history(store: &dyn AgentStateStore) {
    let id = AgentId::from("epsilon");
    let event = LearningEvent {
        agent_id: id.clone(),
        kind: LearningKind::Defeat,
        scenario_id: "scn-1".to_string(),
        score: 42,
        lessons: vec!["Analyze what went wrong".to_string()],
        reference_winner_id: Some(AgentId::from("zeta")),
        created_at: Utc::now(),
    };
    let pushed = event.clone();
    store
        .update(&id, &move |s: &mut AgentState| s.push_learning(pushed.clone(), 10))
        .await
        .unwrap();

    let state = store.get(&id).await.unwrap();
    assert_eq!(state.learning_history.len(), 1);
    assert_eq!(state.learning_history[0].kind, LearningKind::Defeat);
    assert_eq!(
        state.learning_history[0].reference_winner_id,
        event.reference_winner_id
    );
}

#[tokio::test]
async fn memory_first_get_creates_default() {
    first_get_creates_default(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn surreal_first_get_creates_default() {
    first_get_creates_default(&surreal().await.agent_store()).await;
}

#[tokio::test]
async fn memory_update_bumps_version() {
    update_bumps_version(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn surreal_update_bumps_version() {
    update_bumps_version(&surreal().await.agent_store()).await;
}

#[tokio::test]
async fn memory_update_rejects_invalid_state() {
    update_rejects_invalid_state(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn surreal_update_rejects_invalid_state() {
    update_rejects_invalid_state(&surreal().await.agent_store()).await;
}

#[tokio::test]
async fn memory_archive_is_idempotent() {
    archive_is_idempotent(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn surreal_archive_is_idempotent() {
    archive_is_idempotent(&surreal().await.agent_store()).await;
}

#[tokio::test]
async fn memory_update_preserves_learning_history() {
    update_preserves_learning_history(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn surreal_update_preserves_learning_history() {
    update_preserves_learning_history(&surreal().await.agent_store()).await;
}

#[tokio::test]
async fn surreal_stale_version_is_a_conflict() {
    let store = surreal().await.agent_store();
    let id = AgentId::from("stale");
    let base = store.get(&id).await.unwrap();

    let mut first = base.clone();
    first.wins = 1;
    first.total_games = 1;
    store.compare_and_swap(base.version, first).await.unwrap();

    let mut second = base.clone();
    second.losses = 1;
    second.total_games = 1;
    let err = store
        .compare_and_swap(base.version, second)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let current = store.get(&id).await.unwrap();
    assert_eq!(current.wins, 1);
    assert_eq!(current.losses, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_concurrent_updates_are_not_lost() {
    let store = Arc::new(MemoryAgentStore::new());
    let id = AgentId::from("busy");

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = id.clone();
            tokio::spawn(async move {
                store
                    .update(&id, &|s: &mut AgentState| {
                        s.wins += 1;
                        s.total_games += 1;
                    })
                    .await
                    .unwrap();
            })
        })
        .collect();
    futures::future::join_all(handles).await;

    let state = store.get(&id).await.unwrap();
    assert_eq!(state.wins, 50);
    assert_eq!(state.version, 50);
}

// ===========================================================================
// ScenarioArchive contracts
// ===========================================================================

fn archived(id: &str, offset_secs: i64) -> ArchivedScenario {
    ArchivedScenario {
        scenario_id: id.to_string(),
        fingerprint: format!("fp-{id}"),
        category: "code_quality".to_string(),
        variant: "advanced".to_string(),
        ultra_complex: false,
        scenario_difficulty: 1.25,
        participants: vec![AgentId::from("a"), AgentId::from("b")],
        outcome: ArchivedOutcome::Decisive,
        winners: vec![AgentId::from("a")],
        losers: vec![AgentId::from("b")],
        scores: vec![
            ArchivedScore {
                agent_id: AgentId::from("a"),
                received: true,
                score: 80,
                rank: 1,
                latency_ms: 12,
            },
            ArchivedScore {
                agent_id: AgentId::from("b"),
                received: true,
                score: 40,
                rank: 2,
                latency_ms: 30,
            },
        ],
        archived_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

async fn archive_record_and_get(archive: &dyn ScenarioArchive) {
    archive.record(archived("s1", 0)).await.unwrap();
    let got = archive.get("s1").await.unwrap();
    assert_eq!(got.winners, vec![AgentId::from("a")]);
    assert_eq!(got.scores.len(), 2);
    assert_eq!(got.outcome, ArchivedOutcome::Decisive);
}

async fn archive_rejects_duplicates(archive: &dyn ScenarioArchive) {
    archive.record(archived("dup", 0)).await.unwrap();
    let err = archive.record(archived("dup", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::DuplicateScenario { .. }));
}

async fn archive_get_missing(archive: &dyn ScenarioArchive) {
    let err = archive.get("nope").await.unwrap_err();
    assert!(matches!(err, StorageError::ScenarioNotFound { .. }));
}

async fn archive_recent_is_newest_first(archive: &dyn ScenarioArchive) {
    for (i, id) in ["old", "mid", "new"].iter().enumerate() {
        archive.record(archived(id, i as i64)).await.unwrap();
    }
    let recent: Vec<_> = archive
        .recent(2)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.scenario_id)
        .collect();
    assert_eq!(recent, vec!["new", "mid"]);

    let all: Vec<_> = archive
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.scenario_id)
        .collect();
    assert_eq!(all, vec!["old", "mid", "new"]);
    assert!(archive.recent(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_archive_record_and_get() {
    archive_record_and_get(&MemoryScenarioArchive::new()).await;
}

#[tokio::test]
async fn surreal_archive_record_and_get() {
    archive_record_and_get(&surreal().await.scenario_archive()).await;
}

#[tokio::test]
async fn memory_archive_rejects_duplicates() {
    archive_rejects_duplicates(&MemoryScenarioArchive::new()).await;
}

#[tokio::test]
async fn surreal_archive_rejects_duplicates() {
    archive_rejects_duplicates(&surreal().await.scenario_archive()).await;
}

#[tokio::test]
async fn memory_archive_get_missing() {
    archive_get_missing(&MemoryScenarioArchive::new()).await;
}

#[tokio::test]
async fn surreal_archive_get_missing() {
    archive_get_missing(&surreal().await.scenario_archive()).await;
}

#[tokio::test]
async fn memory_archive_recent_is_newest_first() {
    archive_recent_is_newest_first(&MemoryScenarioArchive::new()).await;
}

#[tokio::test]
async fn surreal_archive_recent_is_newest_first() {
    archive_recent_is_newest_first(&surreal().await.scenario_archive()).await;
}
