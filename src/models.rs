// ABOUTME: Core domain model for the tutoring pipeline and identity handling
// ABOUTME: Defines CEFR levels, target languages, conversation state, and user types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Domain Models
//!
//! Shared data structures threaded through the conversation pipeline and
//! persisted via the checkpoint store. Record types owned by a single
//! database manager live next to that manager instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Levels and Languages
// ============================================================================

/// CEFR-style proficiency level supported by the tutor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    /// Absolute beginner
    A0,
    /// Beginner
    A1,
    /// Elementary
    A2,
    /// Intermediate
    B1,
}

impl CefrLevel {
    /// All supported levels, lowest first
    pub const ALL: [Self; 4] = [Self::A0, Self::A1, Self::A2, Self::B1];

    /// Parse an exact level tag. Case-sensitive; anything else is `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "A0" => Some(Self::A0),
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            _ => None,
        }
    }

    /// String tag for this level
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A0 => "A0",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
        }
    }
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language being taught
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    /// Spanish
    Es,
    /// German
    De,
    /// French
    Fr,
}

impl TargetLanguage {
    /// Parse a two-letter language code
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "es" => Some(Self::Es),
            "de" => Some(Self::De),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    /// Two-letter code used in storage and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::De => "de",
            Self::Fr => "fr",
        }
    }

    /// English display name, used when building prompts
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Es => "Spanish",
            Self::De => "German",
            Self::Fr => "French",
        }
    }
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The human learner
    Learner,
    /// The AI tutor
    Tutor,
}

/// A single turn in a tutoring conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker of this turn
    pub role: TurnRole,
    /// Utterance text
    pub text: String,
}

impl ConversationTurn {
    /// Create a learner turn
    pub fn learner(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Learner,
            text: text.into(),
        }
    }

    /// Create a tutor turn
    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Tutor,
            text: text.into(),
        }
    }
}

/// Learning-aid bundle attached to a tutor response for beginner levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaffolding {
    /// Whether scaffolding is shown at all
    pub enabled: bool,
    /// Suggested words for the learner's reply (4-6 entries when populated)
    pub word_bank: Vec<String>,
    /// Short hint about how to respond
    pub hint_text: String,
    /// Optional opening fragment for the learner's reply
    pub sentence_starter: Option<String>,
    /// Whether the scaffold panel should open without a click
    pub auto_expand: bool,
}

impl Scaffolding {
    /// Disabled bundle with empty fields; the default state
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            word_bank: Vec::new(),
            hint_text: String::new(),
            sentence_starter: None,
            auto_expand: false,
        }
    }
}

impl Default for Scaffolding {
    fn default() -> Self {
        Self::disabled()
    }
}

/// How serious a flagged grammar issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Significant,
}

impl Severity {
    /// Normalize a free-form severity tag. Unknown values become `Minor`.
    #[must_use]
    pub fn from_tag_or_minor(tag: &str) -> Self {
        match tag {
            "moderate" => Self::Moderate,
            "significant" => Self::Significant,
            _ => Self::Minor,
        }
    }
}

/// One grammar correction extracted from the learner's latest turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarCorrection {
    /// What the learner wrote
    pub original: String,
    /// Corrected form
    pub correction: String,
    /// Short explanation in plain terms
    pub explanation: String,
    /// How serious the issue is
    pub severity: Severity,
}

/// One vocabulary item surfaced from the learner's latest turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// Word in the target language
    pub word: String,
    /// English translation
    pub translation: String,
    /// Part of speech, when the analyzer could determine it
    pub part_of_speech: Option<String>,
}

/// The conversation record threaded through one pipeline invocation.
///
/// Turns are append-only: stages add to `turns`, never rewrite it. The
/// per-run fields (`scaffolding`, `grammar_feedback`, `new_vocabulary`) are
/// reset at the start of each invocation and repopulated by the stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Full ordered conversation history
    pub turns: Vec<ConversationTurn>,
    /// Proficiency level for this invocation
    pub level: CefrLevel,
    /// Language being practiced
    pub language: TargetLanguage,
    /// Learning aids for the latest tutor turn
    #[serde(default)]
    pub scaffolding: Scaffolding,
    /// Grammar corrections for the latest learner turn (at most 3)
    #[serde(default)]
    pub grammar_feedback: Vec<GrammarCorrection>,
    /// New vocabulary from the latest learner turn (at most 5)
    #[serde(default)]
    pub new_vocabulary: Vec<VocabularyItem>,
}

impl ConversationState {
    /// Fresh state with no history
    #[must_use]
    pub const fn new(level: CefrLevel, language: TargetLanguage) -> Self {
        Self {
            turns: Vec::new(),
            level,
            language,
            scaffolding: Scaffolding::disabled(),
            grammar_feedback: Vec::new(),
            new_vocabulary: Vec::new(),
        }
    }

    /// Append a turn to the history
    pub fn push_turn(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// The most recent learner turn, if any
    #[must_use]
    pub fn last_learner_turn(&self) -> Option<&ConversationTurn> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::Learner)
    }

    /// The most recent tutor turn, if any
    #[must_use]
    pub fn last_tutor_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == TurnRole::Tutor)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Resolved caller identity. Guests carry a session-scoped UUID minted with
/// their token; authenticated users carry their stable account UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable UUID for users, session-scoped UUID for guests
    pub id: Uuid,
    /// Whether this identity is an unauthenticated guest
    pub is_guest: bool,
}

impl Identity {
    /// Guest identity with a fresh session-scoped id
    #[must_use]
    pub fn new_guest() -> Self {
        Self {
            id: Uuid::new_v4(),
            is_guest: true,
        }
    }

    /// Authenticated identity for an existing user id
    #[must_use]
    pub const fn user(id: Uuid) -> Self {
        Self {
            id,
            is_guest: false,
        }
    }

    /// Checkpoint thread key for this identity's conversation
    #[must_use]
    pub fn thread_id(&self) -> String {
        format!("user:{}", self.id)
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account id
    pub id: Uuid,
    /// Unique email address
    pub email: String,
    /// Bcrypt password hash; never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Most recent successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tag_round_trip() {
        for level in CefrLevel::ALL {
            assert_eq!(CefrLevel::from_tag(level.as_str()), Some(level));
        }
    }

    #[test]
    fn test_level_tag_is_case_sensitive() {
        assert_eq!(CefrLevel::from_tag("a0"), None);
        assert_eq!(CefrLevel::from_tag("A0 "), None);
        assert_eq!(CefrLevel::from_tag("B2"), None);
    }

    #[test]
    fn test_severity_normalization() {
        assert_eq!(Severity::from_tag_or_minor("moderate"), Severity::Moderate);
        assert_eq!(
            Severity::from_tag_or_minor("significant"),
            Severity::Significant
        );
        assert_eq!(Severity::from_tag_or_minor("critical"), Severity::Minor);
        assert_eq!(Severity::from_tag_or_minor(""), Severity::Minor);
    }

    #[test]
    fn test_last_turns() {
        let mut state = ConversationState::new(CefrLevel::A1, TargetLanguage::Es);
        state.push_turn(ConversationTurn::learner("hola"));
        state.push_turn(ConversationTurn::tutor("¡Hola! ¿Cómo estás?"));
        state.push_turn(ConversationTurn::learner("bien"));

        assert_eq!(state.last_learner_turn().unwrap().text, "bien");
        assert_eq!(state.last_tutor_turn().unwrap().text, "¡Hola! ¿Cómo estás?");
    }

    #[test]
    fn test_guest_thread_id_prefix() {
        let guest = Identity::new_guest();
        assert!(guest.thread_id().starts_with("user:"));
        assert!(guest.is_guest);
    }
}
