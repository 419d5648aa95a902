// ABOUTME: Response generation stage producing the tutor's next utterance
// ABOUTME: Maps conversation history to chat messages and calls the configured LLM provider
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Response generation stage. The only stage whose failure fails the
//! whole invocation: without a tutor reply there is nothing to return.

use std::sync::Arc;

use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{ConversationState, TurnRole};

/// Temperature for conversational replies
const RESPONSE_TEMPERATURE: f32 = 0.8;

/// Token budget for a tutor reply
const RESPONSE_MAX_TOKENS: u32 = 512;

/// Produces the tutor's next utterance from the conversation history
pub struct ResponseGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl ResponseGenerator {
    /// Create a generator backed by the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Generate the tutor's reply to the current conversation.
    ///
    /// # Errors
    ///
    /// Propagates provider failures and rejects empty completions; the
    /// pipeline treats both as fatal for this invocation.
    pub async fn respond(&self, state: &ConversationState) -> AppResult<String> {
        let mut messages =
            vec![ChatMessage::system(prompts::tutor_system_prompt(state.level, state.language))];

        messages.extend(state.turns.iter().map(|turn| match turn.role {
            TurnRole::Learner => ChatMessage::user(&turn.text),
            TurnRole::Tutor => ChatMessage::assistant(&turn.text),
        }));

        let request = ChatRequest::new(messages)
            .with_temperature(RESPONSE_TEMPERATURE)
            .with_max_tokens(RESPONSE_MAX_TOKENS);

        let response = self.provider.complete(&request).await?;
        let reply = response.content.trim().to_owned();

        if reply.is_empty() {
            return Err(AppError::external_service(
                self.provider.display_name(),
                "Empty completion for tutor response",
            ));
        }

        debug!(
            chars = reply.len(),
            level = %state.level,
            language = %state.language,
            "Generated tutor response"
        );

        Ok(reply)
    }
}
