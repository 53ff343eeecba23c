// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::EOS_ID;
use crate::error::{EnsembleError, EnsembleResult};

/// Model architecture tag. Closed set: anything else is a config error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    #[serde(rename = "amun")]
    Amun,
    #[serde(rename = "nematus")]
    Nematus,
    #[serde(rename = "s2s")]
    S2s,
    #[serde(rename = "multi-s2s")]
    MultiS2s,
    #[serde(rename = "transformer")]
    Transformer,
    #[serde(rename = "hard-att")]
    HardAtt,
    /// Pure language model: scores the target side only.
    #[serde(rename = "lm")]
    Lm,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amun => "amun",
            Self::Nematus => "nematus",
            Self::S2s => "s2s",
            Self::MultiS2s => "multi-s2s",
            Self::Transformer => "transformer",
            Self::HardAtt => "hard-att",
            Self::Lm => "lm",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amun" => Ok(Self::Amun),
            "nematus" => Ok(Self::Nematus),
            "s2s" => Ok(Self::S2s),
            "multi-s2s" => Ok(Self::MultiS2s),
            "transformer" => Ok(Self::Transformer),
            "hard-att" => Ok(Self::HardAtt),
            "lm" => Ok(Self::Lm),
            other => Err(EnsembleError::UnknownModelType(other.to_string())),
        }
    }
}

/// Ensemble-wide configuration for a decoding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Model files, one scorer each, in combination order.
    pub models: Vec<PathBuf>,

    /// Combination weights. `None` means 1.0 for every model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,

    /// Vocabulary sizes per stream; the last entry is the target side.
    pub dim_vocabs: Vec<usize>,

    /// Default architecture tag, overridable per model file.
    #[serde(rename = "type")]
    pub model_type: ModelType,

    /// Declared textual input streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<String>>,

    /// Weight of an appended word-count penalty scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_penalty: Option<f32>,

    /// Weight of an appended unseen-word penalty scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unseen_word_penalty: Option<f32>,

    /// Batch field the unseen-word penalty reads its vocabulary from.
    pub unseen_batch_index: usize,

    /// Remaining options, handed to model constructors untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            weights: None,
            dim_vocabs: Vec::new(),
            model_type: ModelType::default(),
            input: None,
            word_penalty: None,
            unseen_word_penalty: None,
            unseen_batch_index: 0,
            extra: Map::new(),
        }
    }
}

impl EnsembleConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> EnsembleResult<()> {
        if self.models.is_empty() {
            return Err(EnsembleError::Config(
                "at least one model is required".to_string(),
            ));
        }
        let dim_vocab = self.target_vocab()?;
        if self.dim_vocabs.iter().any(|&d| d == 0) {
            return Err(EnsembleError::Config(format!(
                "dim_vocabs entries must be > 0, got {:?}",
                self.dim_vocabs
            )));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.models.len() {
                return Err(EnsembleError::WeightCountMismatch {
                    models: self.models.len(),
                    weights: weights.len(),
                });
            }
            if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
                return Err(EnsembleError::Config(format!(
                    "weights must be finite, got {w}"
                )));
            }
        }
        for (label, weight) in [
            ("word_penalty", self.word_penalty),
            ("unseen_word_penalty", self.unseen_word_penalty),
        ] {
            if let Some(w) = weight {
                if !w.is_finite() {
                    return Err(EnsembleError::Config(format!(
                        "{label} must be finite, got {w}"
                    )));
                }
                if dim_vocab <= EOS_ID {
                    return Err(EnsembleError::Config(format!(
                        "{label} needs a vocabulary of at least {} entries, got {dim_vocab}",
                        EOS_ID + 1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Target-side vocabulary size shared by every ensemble member.
    pub fn target_vocab(&self) -> EnsembleResult<usize> {
        self.dim_vocabs
            .last()
            .copied()
            .ok_or_else(|| EnsembleError::Config("dim_vocabs must not be empty".to_string()))
    }

    /// Per-model weights, defaulting to 1.0 each.
    pub fn model_weights(&self) -> EnsembleResult<Vec<f32>> {
        match &self.weights {
            Some(w) if w.len() != self.models.len() => Err(EnsembleError::WeightCountMismatch {
                models: self.models.len(),
                weights: w.len(),
            }),
            Some(w) => Ok(w.clone()),
            None => Ok(vec![1.0; self.models.len()]),
        }
    }

    /// Options every model starts from before its own overrides apply.
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            model_type: self.model_type,
            dim_vocabs: self.dim_vocabs.clone(),
            index: None,
            inference: false,
            extra: self.extra.clone(),
        }
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> EnsembleResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EnsembleError::Config(format!("JSON parse error: {e}")))
    }
}

/// Settings stored inside a model file, overriding the ensemble defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOverrides {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_vocabs: Option<Vec<usize>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fully resolved options for constructing one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    #[serde(rename = "type")]
    pub model_type: ModelType,

    pub dim_vocabs: Vec<usize>,

    /// Batch field the model reads, when it is not the default one.
    pub index: Option<usize>,

    /// Set by the ensemble builder; models skip training-only behaviour.
    pub inference: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelOptions {
    /// Apply overrides; present fields replace the current values.
    pub fn merge(&mut self, overrides: ModelOverrides) {
        if let Some(model_type) = overrides.model_type {
            self.model_type = model_type;
        }
        if let Some(dim_vocabs) = overrides.dim_vocabs {
            self.dim_vocabs = dim_vocabs;
        }
        self.extra.extend(overrides.extra);
    }

    pub fn target_vocab(&self) -> Option<usize> {
        self.dim_vocabs.last().copied()
    }
}
