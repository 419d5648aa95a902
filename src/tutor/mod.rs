// ABOUTME: Conversation tutoring core: level policy, generation stages, and pipeline driver
// ABOUTME: Orchestrates respond/scaffold/analyze over a checkpointed conversation state
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Tutoring Core
//!
//! The conversation pipeline and its stages. One chat turn flows through
//! up to three generation calls:
//!
//! ```text
//! Response ──► route(level) ──► Scaffold ──► Analyze   (A0/A1)
//!                        └────────────────► Analyze   (A2/B1, unknown)
//! ```
//!
//! Response failure is fatal to the invocation; scaffold and analysis
//! failures degrade to safe fallbacks so the tutor's reply is never lost.

mod analyzer;
mod level;
mod pipeline;
mod responder;
mod scaffold;

pub use analyzer::{Analyzer, AnalysisResult};
pub use level::{LevelPolicy, RoutingDecision};
pub use pipeline::{ChatTurn, ConversationPipeline};
pub use responder::ResponseGenerator;
pub use scaffold::ScaffoldGenerator;
