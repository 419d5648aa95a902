// ABOUTME: Lesson catalog loaded from YAML definitions at startup
// ABOUTME: Validates lesson ids and serves read-only lesson content to routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Lesson Catalog
//!
//! Micro-lessons are authored as YAML files, one lesson per file, and
//! loaded once at startup. The catalog is immutable after load; completion
//! state lives in the lesson completion record set, not here.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{CefrLevel, TargetLanguage};

/// One vocabulary item taught by a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonVocabulary {
    /// Word in the target language
    pub word: String,
    /// English translation
    pub translation: String,
    /// Part of speech, when the author tagged it
    #[serde(default)]
    pub part_of_speech: Option<String>,
}

/// One practice phrase inside a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPhrase {
    /// English prompt shown to the learner
    pub prompt: String,
    /// Expected reply in the target language
    pub answer: String,
}

/// A single authored lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Stable lesson id, e.g. `greetings-001`
    pub id: String,
    /// Display title
    pub title: String,
    /// Language the lesson teaches
    pub language: TargetLanguage,
    /// Intended proficiency level
    pub level: CefrLevel,
    /// One-paragraph description
    #[serde(default)]
    pub description: String,
    /// Vocabulary introduced by the lesson
    #[serde(default)]
    pub vocabulary: Vec<LessonVocabulary>,
    /// Practice phrases
    #[serde(default)]
    pub phrases: Vec<LessonPhrase>,
}

/// Listing form of a lesson, without its content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
    /// Stable lesson id
    pub id: String,
    /// Display title
    pub title: String,
    /// Language the lesson teaches
    pub language: TargetLanguage,
    /// Intended proficiency level
    pub level: CefrLevel,
    /// One-paragraph description
    pub description: String,
    /// How many vocabulary items the lesson introduces
    pub vocabulary_count: usize,
}

/// Immutable lesson catalog
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
    by_id: HashMap<String, usize>,
}

impl LessonCatalog {
    /// Build a catalog from already-parsed lessons
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate lesson ids.
    pub fn new(lessons: Vec<Lesson>) -> AppResult<Self> {
        let mut by_id = HashMap::with_capacity(lessons.len());
        for (index, lesson) in lessons.iter().enumerate() {
            if by_id.insert(lesson.id.clone(), index).is_some() {
                return Err(AppError::config(format!(
                    "Duplicate lesson id: {}",
                    lesson.id
                )));
            }
        }
        Ok(Self { lessons, by_id })
    }

    /// Load every `*.yaml` / `*.yml` file under a directory.
    ///
    /// A missing directory yields an empty catalog with a warning; the
    /// chat and progress surfaces work without lesson content.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a file is unreadable, fails to
    /// parse, or duplicates a lesson id.
    pub fn load_from_dir(dir: &Path) -> AppResult<Self> {
        if !dir.is_dir() {
            warn!("Lessons directory {} not found, starting with an empty catalog", dir.display());
            return Self::new(Vec::new());
        }

        let mut lessons = Vec::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| AppError::config(format!("Failed to read lessons directory: {e}")))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| AppError::config(format!("Failed to read lessons directory: {e}")))?;
            let path = entry.path();

            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }

            let raw = fs::read_to_string(&path)
                .map_err(|e| AppError::config(format!("Failed to read {}: {e}", path.display())))?;
            let lesson: Lesson = serde_yaml::from_str(&raw)
                .map_err(|e| AppError::config(format!("Failed to parse {}: {e}", path.display())))?;
            lessons.push(lesson);
        }

        // Stable listing order regardless of directory iteration order
        lessons.sort_by(|a, b| a.id.cmp(&b.id));

        info!("Loaded {} lessons from {}", lessons.len(), dir.display());
        Self::new(lessons)
    }

    /// Look up one lesson by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Lesson> {
        self.by_id.get(id).map(|&index| &self.lessons[index])
    }

    /// Lesson summaries, optionally filtered by language
    #[must_use]
    pub fn summaries(&self, language: Option<TargetLanguage>) -> Vec<LessonSummary> {
        self.lessons
            .iter()
            .filter(|lesson| language.is_none_or(|l| lesson.language == l))
            .map(|lesson| LessonSummary {
                id: lesson.id.clone(),
                title: lesson.title.clone(),
                language: lesson.language,
                level: lesson.level,
                description: lesson.description.clone(),
                vocabulary_count: lesson.vocabulary.len(),
            })
            .collect()
    }

    /// Number of lessons in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Whether the catalog holds no lessons
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, language: TargetLanguage) -> Lesson {
        Lesson {
            id: id.into(),
            title: "Greetings".into(),
            language,
            level: CefrLevel::A0,
            description: String::new(),
            vocabulary: vec![],
            phrases: vec![],
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = LessonCatalog::new(vec![
            lesson("greetings-001", TargetLanguage::Es),
            lesson("greetings-001", TargetLanguage::De),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_summaries_filter_by_language() {
        let catalog = LessonCatalog::new(vec![
            lesson("greetings-001", TargetLanguage::Es),
            lesson("gruesse-001", TargetLanguage::De),
        ])
        .unwrap();

        let spanish = catalog.summaries(Some(TargetLanguage::Es));
        assert_eq!(spanish.len(), 1);
        assert_eq!(spanish[0].id, "greetings-001");

        assert_eq!(catalog.summaries(None).len(), 2);
    }

    #[test]
    fn test_parse_lesson_yaml() {
        let raw = r"
id: greetings-001
title: First Greetings
language: es
level: A0
description: Say hello and introduce yourself.
vocabulary:
  - word: hola
    translation: hello
  - word: buenos días
    translation: good morning
    part_of_speech: phrase
phrases:
  - prompt: Say hello
    answer: hola
";
        let parsed: Lesson = serde_yaml::from_str(raw).unwrap();
        assert_eq!(parsed.id, "greetings-001");
        assert_eq!(parsed.language, TargetLanguage::Es);
        assert_eq!(parsed.level, CefrLevel::A0);
        assert_eq!(parsed.vocabulary.len(), 2);
        assert_eq!(parsed.vocabulary[1].part_of_speech.as_deref(), Some("phrase"));
    }
}
