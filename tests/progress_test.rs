// ABOUTME: Integration tests for the progress aggregate over real record sets
// ABOUTME: Covers dashboard totals, accuracy, streak anchoring, and chart series shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::create_test_database;

use habla_hermano::models::{CefrLevel, Identity, TargetLanguage, VocabularyItem};
use habla_hermano::progress::ProgressTracker;

fn item(word: &str) -> VocabularyItem {
    VocabularyItem {
        word: word.to_owned(),
        translation: "test".to_owned(),
        part_of_speech: None,
    }
}

#[tokio::test]
async fn test_dashboard_stats_over_recorded_activity() {
    let database = create_test_database().await;
    let identity = Identity::new_guest();
    let vocabulary = database.vocabulary();

    // 3 words today: "hola" seen twice (once correctly), others once
    vocabulary
        .record_correct_use(identity, TargetLanguage::Es, &item("hola"))
        .await
        .unwrap();
    vocabulary
        .record_encounter(identity, TargetLanguage::Es, &item("hola"))
        .await
        .unwrap();
    vocabulary
        .record_encounter(identity, TargetLanguage::Es, &item("gracias"))
        .await
        .unwrap();
    vocabulary
        .record_encounter(identity, TargetLanguage::Es, &item("adiós"))
        .await
        .unwrap();

    // A German word must not leak into the Spanish dashboard
    vocabulary
        .record_encounter(identity, TargetLanguage::De, &item("hallo"))
        .await
        .unwrap();

    database
        .sessions()
        .record_activity(identity, TargetLanguage::Es, CefrLevel::A0, 3)
        .await
        .unwrap();
    database
        .lessons()
        .record_completion(identity, "greetings-001", Some(90))
        .await
        .unwrap();

    let stats = ProgressTracker::new(database)
        .dashboard_stats(identity.id, TargetLanguage::Es)
        .await
        .unwrap();

    assert_eq!(stats.total_words, 3);
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.lessons_completed, 1);
    // Session recorded just now, so today anchors a streak of 1
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.words_learned_today, 3);
    assert_eq!(stats.messages_today, 1);
    // 4 encounters, 1 correct
    assert!((stats.accuracy_rate - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_accuracy_zero_when_no_vocabulary() {
    let database = create_test_database().await;
    let identity = Identity::new_guest();

    let stats = ProgressTracker::new(database)
        .dashboard_stats(identity.id, TargetLanguage::Fr)
        .await
        .unwrap();

    assert_eq!(stats.total_words, 0);
    assert!((stats.accuracy_rate - 0.0).abs() < f64::EPSILON);
    assert_eq!(stats.current_streak, 0);
}

#[tokio::test]
async fn test_chart_data_shape_and_monotonic_growth() {
    let database = create_test_database().await;
    let identity = Identity::new_guest();
    let vocabulary = database.vocabulary();

    vocabulary
        .record_encounter(identity, TargetLanguage::Es, &item("hola"))
        .await
        .unwrap();
    vocabulary
        .record_encounter(identity, TargetLanguage::Es, &item("gracias"))
        .await
        .unwrap();

    let chart = ProgressTracker::new(database)
        .chart_data(identity.id, TargetLanguage::Es, 7)
        .await
        .unwrap();

    assert_eq!(chart.vocab_growth.len(), 7);
    assert_eq!(chart.accuracy_trend.len(), 7);

    let counts: Vec<u64> = chart
        .vocab_growth
        .iter()
        .map(|p| p.cumulative_count)
        .collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    // Both words were first seen today, the final point
    assert_eq!(*counts.last().unwrap(), 2);
    assert_eq!(counts[0], 0);
}

#[tokio::test]
async fn test_repeat_encounters_do_not_duplicate_entries() {
    let database = create_test_database().await;
    let identity = Identity::new_guest();
    let vocabulary = database.vocabulary();

    for _ in 0..4 {
        vocabulary
            .record_encounter(identity, TargetLanguage::Es, &item("hola"))
            .await
            .unwrap();
    }

    let entries = vocabulary
        .list_for_language(identity.id, TargetLanguage::Es)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].times_seen, 4);
    assert_eq!(entries[0].times_correct, 0);
}

#[tokio::test]
async fn test_activity_in_window_reuses_the_session() {
    let database = create_test_database().await;
    let identity = Identity::new_guest();
    let sessions = database.sessions();

    sessions
        .record_activity(identity, TargetLanguage::Es, CefrLevel::A1, 2)
        .await
        .unwrap();
    sessions
        .record_activity(identity, TargetLanguage::Es, CefrLevel::A1, 1)
        .await
        .unwrap();

    let all = sessions.list_for_identity(identity.id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].messages_count, 2);
    assert_eq!(all[0].words_learned, 3);

    // A different language opens its own session
    sessions
        .record_activity(identity, TargetLanguage::De, CefrLevel::A0, 0)
        .await
        .unwrap();
    assert_eq!(sessions.list_for_identity(identity.id).await.unwrap().len(), 2);
}
