use cardlux_json::JsonStore;
use cardlux_core::{
    CardFilter, CardKind, Catalog, Difficulty, Direction, MatchQuality, ProgressStore,
    StudyConfig, StudyEngine,
};
use std::sync::Arc;
use uuid::Uuid;

async fn open_store(dir: &std::path::Path) -> JsonStore {
    JsonStore::open_with(dir.join("cardlux.json"), dir.join("backups"), 3)
        .await
        .unwrap()
}

#[tokio::test]
async fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let (topic_id, card_id) = {
        let store = open_store(dir.path()).await;
        let topic = store.create_topic("Greetings", "Basic greetings").await.unwrap();
        let card = store
            .add_card(topic.id, "Moien", "hello", Difficulty::Beginner, CardKind::Vocabulary)
            .await
            .unwrap();
        (topic.id, card.id)
    };

    let store = open_store(dir.path()).await;
    let topic = store.get_topic(topic_id).await.unwrap();
    assert_eq!(topic.name, "Greetings");
    let card = store.get_card(card_id).await.unwrap();
    assert_eq!(card.back, "hello");
    assert_eq!(card.difficulty, Difficulty::Beginner);
}

#[tokio::test]
async fn outcome_commit_is_durable() {
    let dir = tempfile::tempdir().unwrap();
    let user = Uuid::new_v4();

    let (topic_id, card) = {
        let store = Arc::new(open_store(dir.path()).await);
        let topic = store.create_topic("Greetings", "").await.unwrap();
        let card = store
            .add_card(topic.id, "Moien", "hello", Difficulty::Beginner, CardKind::Vocabulary)
            .await
            .unwrap();

        let engine = StudyEngine::new(store.clone(), StudyConfig::default());
        engine
            .record_outcome(user, &card, Direction::FrontToBack, "hello", MatchQuality::Exact)
            .await
            .unwrap();
        (topic.id, card)
    };

    let store = open_store(dir.path()).await;
    let progress = store.get_progress(user, card.id).await.unwrap().unwrap();
    assert_eq!(progress.times_correct, 1);
    assert_eq!(progress.interval_days, 1);

    let reviews = store.list_reviews(user, None).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert!(reviews[0].was_correct);

    let stats = store.get_stats(user).await.unwrap().unwrap();
    assert_eq!(stats.cards_studied, 1);

    let tp = store.get_topic_progress(user, topic_id).await.unwrap().unwrap();
    assert_eq!(tp.cards_seen, 1);
}

#[tokio::test]
async fn invariant_violations_never_reach_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let topic = store.create_topic("Rules", "").await.unwrap();

    store
        .add_card(topic.id, "Schwéier", "difficult", Difficulty::Advanced, CardKind::Vocabulary)
        .await
        .expect_err("vocabulary must not be advanced");

    let cards = store.list_cards(&CardFilter::active()).await.unwrap();
    assert!(cards.is_empty());
}

#[tokio::test]
async fn catalog_saves_keep_committed_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let user = Uuid::new_v4();

    {
        let store = Arc::new(open_store(dir.path()).await);
        let topic = store.create_topic("Greetings", "").await.unwrap();
        let card = store
            .add_card(topic.id, "Moien", "hello", Difficulty::Beginner, CardKind::Vocabulary)
            .await
            .unwrap();

        let engine = StudyEngine::new(store.clone(), StudyConfig::default());
        engine
            .record_outcome(user, &card, Direction::FrontToBack, "hello", MatchQuality::Exact)
            .await
            .unwrap();

        // A catalog write after the commit must persist an image that still
        // holds the outcome.
        store
            .add_card(topic.id, "Kaz", "cat", Difficulty::Beginner, CardKind::Vocabulary)
            .await
            .unwrap();
    }

    let store = open_store(dir.path()).await;
    assert_eq!(store.list_cards(&CardFilter::active()).await.unwrap().len(), 2);
    let reviews = store.list_reviews(user, None).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert!(store.get_stats(user).await.unwrap().is_some());
}

#[tokio::test]
async fn backups_are_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let topic = store.create_topic("Greetings", "").await.unwrap();
    for i in 0..6 {
        store
            .add_card(
                topic.id,
                &format!("front{i}"),
                &format!("back{i}"),
                Difficulty::Beginner,
                CardKind::Vocabulary,
            )
            .await
            .unwrap();
    }

    let backups: Vec<_> = std::fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(backups.len() <= 3);
    assert!(!backups.is_empty());
}
