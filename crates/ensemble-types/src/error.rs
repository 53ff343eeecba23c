// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Error Hierarchy
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use thiserror::Error;

/// Root error type for all Ensemble Kernel failures.
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// Invalid or inconsistent ensemble configuration.
    #[error("config error: {0}")]
    Config(String),

    /// `weights` was given but does not line up with `models`.
    #[error("config error: {weights} weights given for {models} models")]
    WeightCountMismatch { models: usize, weights: usize },

    /// Scorer type tag that no model kind answers to.
    #[error("unknown model type: {0}")]
    UnknownModelType(String),

    /// Known type tag, but no constructor is registered for it.
    #[error("unsupported model type {model_type} for {path}")]
    UnsupportedModel { model_type: String, path: PathBuf },

    /// A member disagrees with the ensemble's target vocabulary size.
    #[error("vocabulary mismatch for {}: ensemble uses {expected}, model declares {got}", model.display())]
    VocabMismatch {
        model: PathBuf,
        expected: usize,
        got: usize,
    },

    /// A scorer was handed a state it did not produce.
    #[error("state mismatch: scorer {scorer} received state from {found}")]
    StateMismatch { scorer: String, found: String },

    /// Model file could not be parsed or lacks required content.
    #[error("model file {}: {reason}", path.display())]
    ModelFile { path: PathBuf, reason: String },

    /// Parameter lookup failed in the active namespace.
    #[error("parameter {name} not found in namespace {namespace}")]
    MissingParam { namespace: String, name: String },

    /// Score vector or index has the wrong extent.
    #[error("shape error: {0}")]
    Shape(String),

    /// Batch does not carry the field a scorer reads.
    #[error("batch error: {0}")]
    Batch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EnsembleResult<T> = Result<T, EnsembleError>;
