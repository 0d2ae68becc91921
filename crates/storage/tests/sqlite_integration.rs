use chrono::Duration;
use storage::repository::MasteryStore;
use storage::sqlite::SqliteMasteryStore;
use tutor_core::model::{LearnerId, Mastery, TopicId};
use tutor_core::time::fixed_now;

fn learner(raw: &str) -> LearnerId {
    LearnerId::new(raw).unwrap()
}

fn topic(raw: &str) -> TopicId {
    TopicId::new(raw).unwrap()
}

#[tokio::test]
async fn sqlite_round_trips_mastery() {
    let store = SqliteMasteryStore::open("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("open");

    let alice = learner("alice");
    let ownership = topic("rust-ownership");

    store
        .upsert_mastery(&alice, &ownership, Mastery::clamped(0.42), fixed_now())
        .await
        .unwrap();

    let read = store.read_mastery(&alice, &ownership).await.unwrap();
    assert_eq!(read, Some(Mastery::clamped(0.42)));
}

#[tokio::test]
async fn sqlite_reports_missing_records_as_none() {
    let store = SqliteMasteryStore::open("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("open");

    let read = store
        .read_mastery(&learner("nobody"), &topic("nothing"))
        .await
        .unwrap();
    assert_eq!(read, None);
}

#[tokio::test]
async fn sqlite_upsert_replaces_existing_mastery() {
    let store = SqliteMasteryStore::open("sqlite:file:memdb_upsert?mode=memory&cache=shared")
        .await
        .expect("open");

    let bob = learner("bob");
    let lifetimes = topic("rust-lifetimes");
    let now = fixed_now();

    store
        .upsert_mastery(&bob, &lifetimes, Mastery::clamped(0.1), now)
        .await
        .unwrap();
    store
        .upsert_mastery(
            &bob,
            &lifetimes,
            Mastery::clamped(0.6),
            now + Duration::minutes(5),
        )
        .await
        .unwrap();

    let read = store.read_mastery(&bob, &lifetimes).await.unwrap();
    assert_eq!(read, Some(Mastery::clamped(0.6)));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = SqliteMasteryStore::open("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("open");
    store.migrate().await.expect("second migrate");
}
