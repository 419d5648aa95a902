// ABOUTME: Prompt assembly for the tutoring pipeline's three generation calls
// ABOUTME: Combines the compile-time tutor persona with level and language directives
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # System Prompts
//!
//! This module builds the prompts for each generation stage. The tutor
//! persona is loaded at compile time from markdown; level-specific
//! directives (language mix, response shape, JSON output contracts) are
//! appended per request.
//!
//! The language-mix percentages are advisory guidance for the model; they
//! are not measured or enforced anywhere downstream.

use crate::models::{CefrLevel, TargetLanguage};
use crate::tutor::LevelPolicy;

/// Tutor persona, shared by every response generation call
const TUTOR_SYSTEM_PROMPT: &str = include_str!("tutor_system.md");

/// System prompt for the response generation stage
#[must_use]
pub fn tutor_system_prompt(level: CefrLevel, language: TargetLanguage) -> String {
    let target_pct = LevelPolicy::language_mix(level);
    let english_pct = 100 - target_pct;

    let level_directive = match level {
        CefrLevel::A0 => {
            "The learner is an absolute beginner. Use single short sentences. \
             Introduce at most one new word or phrase per reply and repeat it naturally."
        }
        CefrLevel::A1 => {
            "The learner is a beginner. Use short, simple sentences in the present tense. \
             Recycle vocabulary the learner has already used."
        }
        CefrLevel::A2 => {
            "The learner is at elementary level. Use everyday language, including past tense \
             and common connectors. Gently stretch their vocabulary."
        }
        CefrLevel::B1 => {
            "The learner is intermediate. Converse naturally, including opinions, plans, and \
             hypotheticals. Only simplify when the learner struggles."
        }
    };

    format!(
        "{persona}\n\n## Level: {level}\n\n{level_directive}\n\n\
         Speak roughly {target_pct}% {language_name} and {english_pct}% English. \
         Lean on English for anything the learner likely cannot parse yet.",
        persona = TUTOR_SYSTEM_PROMPT.replace("{language}", language.display_name()),
        level = level.as_str(),
        language_name = language.display_name(),
    )
}

/// Prompt for the scaffold generation stage. Requests a strict JSON object.
#[must_use]
pub fn scaffold_prompt(level: CefrLevel, language: TargetLanguage, tutor_text: &str) -> String {
    let bank_format = if level == CefrLevel::A0 {
        "Each word bank entry is formatted as \"word (translation)\", e.g. \"hola (hello)\"."
    } else {
        "Each word bank entry is a bare word in the target language, without translation."
    };

    let tutor_line = if tutor_text.trim().is_empty() {
        "The tutor has not said anything yet; produce a generic conversation-opener scaffold."
            .to_owned()
    } else {
        format!("The tutor just said: \"{tutor_text}\"")
    };

    format!(
        "You prepare learning aids for a {level} learner of {language_name}.\n\
         {tutor_line}\n\
         Produce aids that help the learner reply to that message.\n\
         {bank_format}\n\n\
         Respond with ONLY a JSON object, no code fences, in this exact shape:\n\
         {{\"hint_text\": \"one short hint in English\", \
         \"word_bank\": [\"4 to 6 entries\"], \
         \"sentence_starter\": \"an opening fragment in {language_name}, or null\"}}",
        level = level.as_str(),
        language_name = language.display_name(),
    )
}

/// Prompt for the analysis stage. Requests a strict JSON object.
#[must_use]
pub fn analysis_prompt(level: CefrLevel, language: TargetLanguage, learner_text: &str) -> String {
    let focus = match level {
        CefrLevel::A0 => "Only flag clearly wrong words or greetings. Ignore everything subtler.",
        CefrLevel::A1 => {
            "Flag clearly wrong words, gender agreement mistakes, and copula confusion. \
             Ignore advanced grammar."
        }
        CefrLevel::A2 => {
            "Flag the A1 issues plus past tense formation and reflexive verb mistakes."
        }
        CefrLevel::B1 => {
            "Flag the A2 issues plus subjunctive, conditionals, and unidiomatic usage."
        }
    };

    format!(
        "You analyze one message from a {level} learner of {language_name}.\n\
         Learner message: \"{learner_text}\"\n\
         {focus}\n\
         Also list words from the message worth adding to the learner's vocabulary log.\n\n\
         Respond with ONLY a JSON object, no code fences, in this exact shape:\n\
         {{\"grammar_errors\": [{{\"original\": \"...\", \"correction\": \"...\", \
         \"explanation\": \"one short English sentence\", \
         \"severity\": \"minor|moderate|significant\"}}], \
         \"new_vocabulary\": [{{\"word\": \"...\", \"translation\": \"...\", \
         \"part_of_speech\": \"noun|verb|adjective|other or null\"}}]}}\n\
         Use empty arrays when there is nothing to report.",
        level = level.as_str(),
        language_name = language.display_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutor_prompt_mentions_language_and_mix() {
        let prompt = tutor_system_prompt(CefrLevel::A0, TargetLanguage::Es);
        assert!(prompt.contains("Spanish"));
        assert!(prompt.contains("20% Spanish"));
        assert!(!prompt.contains("{language}"));
    }

    #[test]
    fn test_scaffold_prompt_format_policy_by_level() {
        let a0 = scaffold_prompt(CefrLevel::A0, TargetLanguage::De, "Wie geht's?");
        assert!(a0.contains("word (translation)"));

        let a1 = scaffold_prompt(CefrLevel::A1, TargetLanguage::De, "Wie geht's?");
        assert!(a1.contains("bare word"));
    }

    #[test]
    fn test_scaffold_prompt_handles_empty_tutor_text() {
        let prompt = scaffold_prompt(CefrLevel::A0, TargetLanguage::Fr, "   ");
        assert!(prompt.contains("generic conversation-opener"));
    }

    #[test]
    fn test_analysis_prompt_level_gating() {
        let a0 = analysis_prompt(CefrLevel::A0, TargetLanguage::Es, "hola");
        assert!(a0.contains("clearly wrong words"));
        assert!(!a0.contains("subjunctive"));

        let b1 = analysis_prompt(CefrLevel::B1, TargetLanguage::Es, "si tendría tiempo");
        assert!(b1.contains("subjunctive"));
    }
}
