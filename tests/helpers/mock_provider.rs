// ABOUTME: Scripted mock LLM provider for pipeline and route testing without network calls
// ABOUTME: Pops queued replies in order and records every request it receives
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use habla_hermano::errors::AppError;
use habla_hermano::llm::{ChatRequest, ChatResponse, LlmProvider};

/// One scripted outcome for a completion call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text as the completion
    Text(String),
    /// Fail the call with an external service error
    Fail(String),
}

/// Scripted chat provider. Replies are served in queue order; an empty
/// queue yields a generic tutor reply so history-building tests do not
/// need to script every call.
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a provider with a scripted reply queue
    pub fn with_replies(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Create a provider that always answers with a generic reply
    pub fn always_ok() -> Arc<Self> {
        Self::with_replies(Vec::new())
    }

    /// Number of completion calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copy of every request received so far, in call order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Fail(message)) => {
                Err(AppError::external_unavailable("Mock Provider", message))
            }
            Some(MockReply::Text(content)) => Ok(ChatResponse {
                content,
                model: "mock-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            None => Ok(ChatResponse {
                content: "¡Muy bien! ¿Y tú?".to_owned(),
                model: "mock-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
        }
    }
}

/// A well-formed scaffold payload for scripting
pub fn scaffold_json() -> String {
    r#"{"hint_text": "Answer with how you feel", "word_bank": ["bien (well)", "mal (bad)", "cansado (tired)", "feliz (happy)"], "sentence_starter": "Estoy"}"#.to_owned()
}

/// A well-formed analysis payload for scripting
pub fn analysis_json() -> String {
    r#"{"grammar_errors": [{"original": "yo es", "correction": "yo soy", "explanation": "Use soy with yo", "severity": "moderate"}], "new_vocabulary": [{"word": "hola", "translation": "hello", "part_of_speech": "interjection"}]}"#.to_owned()
}

/// An analysis payload with empty results
pub fn empty_analysis_json() -> String {
    r#"{"grammar_errors": [], "new_vocabulary": []}"#.to_owned()
}
