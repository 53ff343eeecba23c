// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Ensemble scoring layer for beam-search decoding.
//!
//! Learned models and heuristic penalties each produce a score vector
//! over the target vocabulary at every decoding step; the beam search
//! ranks candidates by their weighted sum.
//!
//! # Invariants
//!
//! 1. **One namespace per model**: scorer `F{i}` owns namespace `F{i}` in
//!    the shared graph. Models only ever see a `ParamScope`, which enters
//!    that namespace immediately before the call and leaves it after.
//!
//! 2. **States move, never alias**: `step` consumes the previous state and
//!    returns its successor. A model scorer refuses states it did not
//!    produce.
//!
//! 3. **Construction fails whole**: weight/model count mismatch, unknown
//!    model types and vocabulary disagreement abort the build. Only a
//!    model file without stored settings is tolerated, with a warning.

pub mod bigram;
pub mod builder;
pub mod ensemble;
pub mod graph;
pub mod model;
pub mod penalty;
pub mod scorer;
pub mod weights;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bigram::BigramLm;
pub use builder::{create_ensemble, create_scorers};
pub use ensemble::Ensemble;
pub use graph::{ExpressionGraph, Graph, ParamScope};
pub use model::{DecoderState, EncoderDecoder, ModelRegistry};
pub use penalty::{UnseenWordPenalty, WordPenalty};
pub use scorer::{ModelScorer, ModelState, PenaltyState, Scorer, ScorerState};
pub use weights::{load_model_overrides, read_model_file, ModelFile, OverrideLookup};
