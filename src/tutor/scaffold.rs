// ABOUTME: Scaffold generation stage producing word banks, hints, and sentence starters
// ABOUTME: Enforces level-specific word bank formatting and bounds on generator output
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Scaffold generation stage. Best-effort: the pipeline replaces any
//! failure here with a disabled bundle and carries on.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::constants::limits::WORD_BANK_MAX;
use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, strip_code_fence, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{CefrLevel, Scaffolding, TargetLanguage};
use crate::tutor::LevelPolicy;

/// Scaffolds should be predictable, not creative
const SCAFFOLD_TEMPERATURE: f32 = 0.3;

/// Token budget for a scaffold bundle
const SCAFFOLD_MAX_TOKENS: u32 = 256;

/// Raw generator payload before normalization
#[derive(Debug, Deserialize)]
struct ScaffoldPayload {
    #[serde(default)]
    hint_text: String,
    #[serde(default)]
    word_bank: Vec<String>,
    #[serde(default)]
    sentence_starter: Option<String>,
}

/// Produces a learning-aid bundle for the latest tutor utterance
pub struct ScaffoldGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl ScaffoldGenerator {
    /// Create a generator backed by the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Generate scaffolding for the learner's next reply.
    ///
    /// An empty or whitespace-only tutor utterance still yields a valid,
    /// generic bundle; the prompt handles that case explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error on provider failure or unparseable output. Callers
    /// are expected to fall back to [`Scaffolding::disabled`].
    pub async fn generate(
        &self,
        level: CefrLevel,
        language: TargetLanguage,
        tutor_text: &str,
    ) -> AppResult<Scaffolding> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompts::scaffold_prompt(
            level, language, tutor_text,
        ))])
        .with_temperature(SCAFFOLD_TEMPERATURE)
        .with_max_tokens(SCAFFOLD_MAX_TOKENS);

        let response = self.provider.complete(&request).await?;

        let payload: ScaffoldPayload = serde_json::from_str(strip_code_fence(&response.content))
            .map_err(|e| {
                AppError::serialization(format!("Scaffold output was not valid JSON: {e}"))
            })?;

        let word_bank: Vec<String> = payload
            .word_bank
            .into_iter()
            .map(|entry| normalize_bank_entry(level, entry))
            .filter(|entry| !entry.is_empty())
            .take(WORD_BANK_MAX)
            .collect();

        debug!(
            level = %level,
            entries = word_bank.len(),
            "Generated scaffold bundle"
        );

        Ok(Scaffolding {
            enabled: true,
            word_bank,
            hint_text: payload.hint_text.trim().to_owned(),
            sentence_starter: payload
                .sentence_starter
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            auto_expand: LevelPolicy::auto_expand(level),
        })
    }
}

/// Apply the level-specific word bank presentation policy.
///
/// A0 entries keep their `word (translation)` form. From A1 up, any
/// parenthesized translation the generator added anyway is stripped.
fn normalize_bank_entry(level: CefrLevel, entry: String) -> String {
    let trimmed = entry.trim();
    if level == CefrLevel::A0 {
        return trimmed.to_owned();
    }
    match trimmed.split_once('(') {
        Some((word, _)) => word.trim().to_owned(),
        None => trimmed.to_owned(),
    }
}
