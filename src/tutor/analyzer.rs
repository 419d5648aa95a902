// ABOUTME: Analysis stage extracting grammar corrections and vocabulary from learner messages
// ABOUTME: Caps output counts, normalizes severity tags, and degrades to empty results on failure
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Analysis stage. Inspects only the learner's most recent turn, never the
//! tutor's. Degrades internally: malformed generator output or a provider
//! failure produces empty results instead of an error, so analysis can
//! never block returning the tutor's reply.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::constants::limits::{MAX_GRAMMAR_FEEDBACK, MAX_NEW_VOCABULARY};
use crate::llm::{prompts, strip_code_fence, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{CefrLevel, GrammarCorrection, Severity, TargetLanguage, VocabularyItem};

/// Analysis should be deterministic, not creative
const ANALYSIS_TEMPERATURE: f32 = 0.2;

/// Token budget for an analysis payload
const ANALYSIS_MAX_TOKENS: u32 = 512;

/// Raw generator payload before normalization
#[derive(Debug, Default, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    grammar_errors: Vec<RawGrammarError>,
    #[serde(default)]
    new_vocabulary: Vec<RawVocabularyItem>,
}

#[derive(Debug, Deserialize)]
struct RawGrammarError {
    #[serde(default)]
    original: String,
    #[serde(default)]
    correction: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    severity: String,
}

#[derive(Debug, Deserialize)]
struct RawVocabularyItem {
    #[serde(default)]
    word: String,
    #[serde(default)]
    translation: String,
    #[serde(default)]
    part_of_speech: Option<String>,
}

/// Normalized output of one analysis call
#[derive(Debug, Default)]
pub struct AnalysisResult {
    /// Grammar corrections, at most [`MAX_GRAMMAR_FEEDBACK`]
    pub grammar_feedback: Vec<GrammarCorrection>,
    /// Vocabulary items, at most [`MAX_NEW_VOCABULARY`]
    pub new_vocabulary: Vec<VocabularyItem>,
}

/// Extracts corrections and vocabulary from the learner's latest turn
pub struct Analyzer {
    provider: Arc<dyn LlmProvider>,
}

impl Analyzer {
    /// Create an analyzer backed by the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Analyze the learner's latest utterance.
    ///
    /// Never fails: provider errors and malformed output both degrade to
    /// an empty [`AnalysisResult`].
    pub async fn analyze(
        &self,
        level: CefrLevel,
        language: TargetLanguage,
        learner_text: &str,
    ) -> AnalysisResult {
        let request = ChatRequest::new(vec![ChatMessage::user(prompts::analysis_prompt(
            level,
            language,
            learner_text,
        ))])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_max_tokens(ANALYSIS_MAX_TOKENS);

        let content = match self.provider.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!("Analysis call failed, returning empty results: {}", e);
                return AnalysisResult::default();
            }
        };

        let payload: AnalysisPayload = match serde_json::from_str(strip_code_fence(&content)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Analysis output was not valid JSON, returning empty results: {}", e);
                return AnalysisResult::default();
            }
        };

        let result = normalize(payload);
        debug!(
            corrections = result.grammar_feedback.len(),
            vocabulary = result.new_vocabulary.len(),
            "Analyzed learner message"
        );
        result
    }
}

/// Cap counts, drop empty rows, and normalize severity tags
fn normalize(payload: AnalysisPayload) -> AnalysisResult {
    let grammar_feedback = payload
        .grammar_errors
        .into_iter()
        .filter(|e| !e.original.trim().is_empty() && !e.correction.trim().is_empty())
        .take(MAX_GRAMMAR_FEEDBACK)
        .map(|e| GrammarCorrection {
            original: e.original.trim().to_owned(),
            correction: e.correction.trim().to_owned(),
            explanation: e.explanation.trim().to_owned(),
            severity: Severity::from_tag_or_minor(e.severity.trim()),
        })
        .collect();

    let new_vocabulary = payload
        .new_vocabulary
        .into_iter()
        .filter(|v| !v.word.trim().is_empty())
        .take(MAX_NEW_VOCABULARY)
        .map(|v| VocabularyItem {
            word: v.word.trim().to_owned(),
            translation: v.translation.trim().to_owned(),
            part_of_speech: v
                .part_of_speech
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
        })
        .collect();

    AnalysisResult {
        grammar_feedback,
        new_vocabulary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_error(severity: &str) -> RawGrammarError {
        RawGrammarError {
            original: "yo es".into(),
            correction: "yo soy".into(),
            explanation: "Use soy with yo".into(),
            severity: severity.into(),
        }
    }

    fn raw_word(word: &str) -> RawVocabularyItem {
        RawVocabularyItem {
            word: word.into(),
            translation: "test".into(),
            part_of_speech: None,
        }
    }

    #[test]
    fn test_normalize_caps_grammar_at_three() {
        let payload = AnalysisPayload {
            grammar_errors: (0..6).map(|_| raw_error("minor")).collect(),
            new_vocabulary: vec![],
        };
        let result = normalize(payload);
        assert_eq!(result.grammar_feedback.len(), MAX_GRAMMAR_FEEDBACK);
    }

    #[test]
    fn test_normalize_caps_vocabulary_at_five() {
        let payload = AnalysisPayload {
            grammar_errors: vec![],
            new_vocabulary: (0..9).map(|i| raw_word(&format!("palabra{i}"))).collect(),
        };
        let result = normalize(payload);
        assert_eq!(result.new_vocabulary.len(), MAX_NEW_VOCABULARY);
    }

    #[test]
    fn test_normalize_unknown_severity_becomes_minor() {
        let payload = AnalysisPayload {
            grammar_errors: vec![raw_error("catastrophic"), raw_error("significant")],
            new_vocabulary: vec![],
        };
        let result = normalize(payload);
        assert_eq!(result.grammar_feedback[0].severity, Severity::Minor);
        assert_eq!(result.grammar_feedback[1].severity, Severity::Significant);
    }

    #[test]
    fn test_normalize_drops_incomplete_rows() {
        let payload = AnalysisPayload {
            grammar_errors: vec![RawGrammarError {
                original: String::new(),
                correction: "soy".into(),
                explanation: String::new(),
                severity: "minor".into(),
            }],
            new_vocabulary: vec![raw_word("  ")],
        };
        let result = normalize(payload);
        assert!(result.grammar_feedback.is_empty());
        assert!(result.new_vocabulary.is_empty());
    }
}
