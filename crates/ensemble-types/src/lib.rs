// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Ensemble Kernel — the per-step score combiner used by beam search.

pub mod batch;
pub mod config;
pub mod error;
pub mod score;

pub use batch::{CorpusBatch, SubBatch, EOS_ID, PAD_ID, UNK_ID};
pub use config::{EnsembleConfig, ModelOptions, ModelOverrides, ModelType};
pub use error::{EnsembleError, EnsembleResult};
pub use score::{sanitize_score, Expr};
