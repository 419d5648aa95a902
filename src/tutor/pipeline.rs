// ABOUTME: Conversation pipeline driver running respond/scaffold/analyze over checkpointed state
// ABOUTME: Owns routing, per-stage failure policy, and checkpoint persistence per chat turn
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Conversation Pipeline
//!
//! Drives one chat turn through the three generation stages. The routing
//! decision after the response stage is the only branch point; scaffold
//! always proceeds to analysis, and analysis is always terminal.
//!
//! Analysis runs last even though its input (the learner's turn) is
//! available before the response stage: the tutor's reply owns the
//! latency-critical path, and analysis is enrichment.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::database::CheckpointManager;
use crate::errors::AppResult;
use crate::llm::LlmProvider;
use crate::models::{
    CefrLevel, ConversationState, ConversationTurn, Identity, Scaffolding, TargetLanguage,
};
use crate::tutor::{
    Analyzer, LevelPolicy, ResponseGenerator, RoutingDecision, ScaffoldGenerator,
};

/// One incoming learner turn plus the caller-selected level and language
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Resolved caller identity
    pub identity: Identity,
    /// The learner's message
    pub message: String,
    /// Raw level tag as sent by the caller; routing fails open on bad tags
    pub level_tag: String,
    /// Language being practiced
    pub language: TargetLanguage,
}

/// Orchestrates the three generation stages over one conversation thread
pub struct ConversationPipeline {
    responder: ResponseGenerator,
    scaffolder: ScaffoldGenerator,
    analyzer: Analyzer,
    checkpoints: CheckpointManager,
}

impl ConversationPipeline {
    /// Create a pipeline from a shared provider and checkpoint store
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, checkpoints: CheckpointManager) -> Self {
        Self {
            responder: ResponseGenerator::new(provider.clone()),
            scaffolder: ScaffoldGenerator::new(provider.clone()),
            analyzer: Analyzer::new(provider),
            checkpoints,
        }
    }

    /// Run one pipeline invocation and return the updated conversation state.
    ///
    /// # Errors
    ///
    /// Fails only when the response stage fails; in that case no checkpoint
    /// is written. Scaffold and analysis failures degrade to fallbacks, and
    /// checkpoint I/O problems are absorbed so the reply still reaches the
    /// caller.
    pub async fn run(&self, turn: ChatTurn) -> AppResult<ConversationState> {
        let thread_id = turn.identity.thread_id();
        // Unrecognized tags behave like the top level for prompting; the
        // routing decision below is made on the raw tag regardless.
        let level = CefrLevel::from_tag(&turn.level_tag).unwrap_or(CefrLevel::B1);

        let mut state = match self.checkpoints.get(&thread_id).await {
            Ok(Some(state)) => state,
            Ok(None) => ConversationState::new(level, turn.language),
            Err(e) => {
                warn!(
                    thread_id = %thread_id,
                    "Failed to load checkpoint, starting fresh conversation: {}", e
                );
                ConversationState::new(level, turn.language)
            }
        };

        // Level and language are set by the caller per invocation
        state.level = level;
        state.language = turn.language;

        // Per-run fields reset; history is append-only
        state.scaffolding = Scaffolding::disabled();
        state.grammar_feedback.clear();
        state.new_vocabulary.clear();

        state.push_turn(ConversationTurn::learner(turn.message.clone()));

        // Stage 1: response. Fatal on failure, nothing is persisted.
        let reply = self.responder.respond(&state).await?;
        state.push_turn(ConversationTurn::tutor(reply));

        // Stage 2: scaffold, only on the beginner path. Best-effort.
        match LevelPolicy::route(&turn.level_tag) {
            RoutingDecision::ScaffoldPath => {
                let tutor_text = state
                    .last_tutor_turn()
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                state.scaffolding = match self
                    .scaffolder
                    .generate(level, turn.language, &tutor_text)
                    .await
                {
                    Ok(scaffolding) => scaffolding,
                    Err(e) => {
                        warn!("Scaffold generation failed, disabling scaffolding: {}", e);
                        Scaffolding::disabled()
                    }
                };
            }
            RoutingDecision::DirectPath => {
                debug!(level_tag = %turn.level_tag, "Skipping scaffold stage");
            }
        }

        // Stage 3: analysis of the learner's turn. Degrades internally.
        let analysis = self
            .analyzer
            .analyze(level, turn.language, &turn.message)
            .await;
        state.grammar_feedback = analysis.grammar_feedback;
        state.new_vocabulary = analysis.new_vocabulary;

        // Persist. A failed write costs continuity, not this reply.
        if let Err(e) = self.checkpoints.put(&thread_id, &state).await {
            warn!(thread_id = %thread_id, "Failed to write checkpoint: {}", e);
        }

        info!(
            thread_id = %thread_id,
            turns = state.turns.len(),
            scaffolded = state.scaffolding.enabled,
            corrections = state.grammar_feedback.len(),
            "Completed pipeline invocation"
        );

        Ok(state)
    }
}
