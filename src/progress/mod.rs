// ABOUTME: Read-side progress aggregation over vocabulary, sessions, and lesson completions
// ABOUTME: Computes dashboard statistics, streaks, accuracy, and chart time series
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Progress Aggregation
//!
//! Read-only aggregation over the three per-identity record sets. No side
//! effects; every calculation works off already-persisted state. Storage
//! read failures surface as errors rather than silently reporting zeros,
//! which would read as "no progress" instead of "unknown".

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{Database, LearningSessionEntry, VocabularyEntry};
use crate::errors::AppResult;
use crate::models::TargetLanguage;

/// Headline statistics for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Vocabulary entries in the selected language
    pub total_words: u64,
    /// Learning sessions across all languages
    pub total_sessions: u64,
    /// Lessons completed at least once
    pub lessons_completed: u64,
    /// Consecutive calendar days with a session, anchored at today
    pub current_streak: u32,
    /// Percentage of correct uses across the selected language's vocabulary
    pub accuracy_rate: f64,
    /// Words first seen today in the selected language
    pub words_learned_today: u64,
    /// Learner messages sent in sessions that started today
    pub messages_today: u64,
}

/// One cumulative vocabulary count point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabGrowthPoint {
    /// Calendar day
    pub date: NaiveDate,
    /// Words first seen on or before this day
    pub cumulative_count: u64,
}

/// One accuracy trend point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyPoint {
    /// Calendar day
    pub date: NaiveDate,
    /// Accuracy over vocabulary known by this day, as a percentage
    pub accuracy_pct: f64,
}

/// Chart series for the trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    /// Monotonically non-decreasing cumulative vocabulary counts
    pub vocab_growth: Vec<VocabGrowthPoint>,
    /// Accuracy percentage per day
    pub accuracy_trend: Vec<AccuracyPoint>,
}

/// Read-side aggregate over one identity's record sets
pub struct ProgressTracker {
    db: Database,
}

impl ProgressTracker {
    /// Create a tracker over the shared database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Dashboard statistics for one identity and language.
    ///
    /// The language scopes the vocabulary-derived numbers; sessions and
    /// lesson completions count across languages.
    ///
    /// # Errors
    ///
    /// Surfaces any record-set read failure to the caller.
    pub async fn dashboard_stats(
        &self,
        identity_id: Uuid,
        language: TargetLanguage,
    ) -> AppResult<DashboardStats> {
        let vocabulary = self
            .db
            .vocabulary()
            .list_for_language(identity_id, language)
            .await?;
        let sessions = self.db.sessions().list_for_identity(identity_id).await?;
        let lessons = self.db.lessons().list_for_identity(identity_id).await?;

        let today = Utc::now().date_naive();
        Ok(compute_dashboard_stats(
            &vocabulary,
            &sessions,
            lessons.len() as u64,
            today,
        ))
    }

    /// Chart series over the trailing `days` calendar days.
    ///
    /// # Errors
    ///
    /// Surfaces any record-set read failure to the caller.
    pub async fn chart_data(
        &self,
        identity_id: Uuid,
        language: TargetLanguage,
        days: u32,
    ) -> AppResult<ChartData> {
        let vocabulary = self
            .db
            .vocabulary()
            .list_for_language(identity_id, language)
            .await?;

        let today = Utc::now().date_naive();
        Ok(compute_chart_data(&vocabulary, today, days))
    }
}

/// Assemble dashboard statistics from fetched record sets
fn compute_dashboard_stats(
    vocabulary: &[VocabularyEntry],
    sessions: &[LearningSessionEntry],
    lessons_completed: u64,
    today: NaiveDate,
) -> DashboardStats {
    let session_days: HashSet<NaiveDate> =
        sessions.iter().map(|s| s.started_at.date_naive()).collect();

    let words_learned_today = vocabulary
        .iter()
        .filter(|v| v.first_seen_at.date_naive() == today)
        .count() as u64;

    let messages_today = sessions
        .iter()
        .filter(|s| s.started_at.date_naive() == today)
        .map(|s| s.messages_count.max(0) as u64)
        .sum();

    DashboardStats {
        total_words: vocabulary.len() as u64,
        total_sessions: sessions.len() as u64,
        lessons_completed,
        current_streak: compute_streak(&session_days, today),
        accuracy_rate: compute_accuracy(vocabulary),
        words_learned_today,
        messages_today,
    }
}

/// Consecutive days with at least one session, walking backward from today.
///
/// Today anchors the streak: with no session today the streak is 0, no
/// matter how long yesterday's run was.
fn compute_streak(session_days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while session_days.contains(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

/// Correct uses over total encounters, as a percentage. 0 when nothing
/// has been seen yet.
fn compute_accuracy(vocabulary: &[VocabularyEntry]) -> f64 {
    let seen: i64 = vocabulary.iter().map(|v| v.times_seen).sum();
    if seen <= 0 {
        return 0.0;
    }
    let correct: i64 = vocabulary.iter().map(|v| v.times_correct).sum();
    100.0 * correct as f64 / seen as f64
}

/// Build both chart series for the trailing window, one point per day
fn compute_chart_data(vocabulary: &[VocabularyEntry], today: NaiveDate, days: u32) -> ChartData {
    let days = days.max(1);
    let mut vocab_growth = Vec::with_capacity(days as usize);
    let mut accuracy_trend = Vec::with_capacity(days as usize);

    for offset in (0..days).rev() {
        let date = today - Duration::days(i64::from(offset));

        let known: Vec<&VocabularyEntry> = vocabulary
            .iter()
            .filter(|v| v.first_seen_at.date_naive() <= date)
            .collect();

        vocab_growth.push(VocabGrowthPoint {
            date,
            cumulative_count: known.len() as u64,
        });

        let seen: i64 = known.iter().map(|v| v.times_seen).sum();
        let correct: i64 = known.iter().map(|v| v.times_correct).sum();
        accuracy_trend.push(AccuracyPoint {
            date,
            accuracy_pct: if seen > 0 {
                100.0 * correct as f64 / seen as f64
            } else {
                0.0
            },
        });
    }

    ChartData {
        vocab_growth,
        accuracy_trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn entry(first_seen: DateTime<Utc>, seen: i64, correct: i64) -> VocabularyEntry {
        VocabularyEntry {
            id: Uuid::new_v4().to_string(),
            identity_id: Uuid::new_v4(),
            word: "hola".into(),
            translation: "hello".into(),
            language: TargetLanguage::Es,
            part_of_speech: None,
            first_seen_at: first_seen,
            times_seen: seen,
            times_correct: correct,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_streak_anchored_at_today() {
        let today = day(2025, 6, 10);
        let days: HashSet<NaiveDate> =
            [day(2025, 6, 10), day(2025, 6, 9), day(2025, 6, 8)].into();
        assert_eq!(compute_streak(&days, today), 3);
    }

    #[test]
    fn test_streak_broken_without_session_today() {
        let today = day(2025, 6, 10);
        let days: HashSet<NaiveDate> = [day(2025, 6, 9), day(2025, 6, 8)].into();
        assert_eq!(compute_streak(&days, today), 0);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let today = day(2025, 6, 10);
        let days: HashSet<NaiveDate> =
            [day(2025, 6, 10), day(2025, 6, 9), day(2025, 6, 7)].into();
        assert_eq!(compute_streak(&days, today), 2);
    }

    #[test]
    fn test_accuracy_rate() {
        let entries = vec![entry(at(2025, 6, 1), 6, 4), entry(at(2025, 6, 2), 4, 3)];
        let accuracy = compute_accuracy(&entries);
        assert!((accuracy - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_zero_denominator() {
        assert!((compute_accuracy(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vocab_growth_is_monotonic_and_cumulative() {
        let entries = vec![
            entry(at(2025, 6, 1), 1, 0),
            entry(at(2025, 6, 3), 1, 0),
            entry(at(2025, 6, 3), 1, 0),
        ];
        let chart = compute_chart_data(&entries, day(2025, 6, 4), 4);

        let counts: Vec<u64> = chart
            .vocab_growth
            .iter()
            .map(|p| p.cumulative_count)
            .collect();
        assert_eq!(counts, vec![1, 1, 3, 3]);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(chart.vocab_growth.first().unwrap().date, day(2025, 6, 1));
        assert_eq!(chart.vocab_growth.last().unwrap().date, day(2025, 6, 4));
    }

    #[test]
    fn test_dashboard_today_filters() {
        let today = day(2025, 6, 10);
        let vocabulary = vec![entry(at(2025, 6, 10), 1, 0), entry(at(2025, 6, 9), 1, 0)];
        let sessions = vec![LearningSessionEntry {
            id: Uuid::new_v4().to_string(),
            identity_id: Uuid::new_v4(),
            started_at: at(2025, 6, 10),
            ended_at: None,
            language: TargetLanguage::Es,
            level: crate::models::CefrLevel::A1,
            messages_count: 7,
            words_learned: 2,
        }];

        let stats = compute_dashboard_stats(&vocabulary, &sessions, 3, today);
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.words_learned_today, 1);
        assert_eq!(stats.messages_today, 7);
        assert_eq!(stats.lessons_completed, 3);
        assert_eq!(stats.current_streak, 1);
    }
}
