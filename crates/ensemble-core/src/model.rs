// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Model Backend Interface
// ─────────────────────────────────────────────────────────────────────
//! Trait for learned encoder/decoder models and the registry that
//! constructs them from resolved options.
//!
//! Real architectures (RNN, transformer, ...) live behind
//! [`EncoderDecoder`]; the ensemble only needs load/clear/start/step.
//! Custom backends are plugged in with [`ModelRegistry::register`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use ensemble_types::{
    CorpusBatch, EnsembleError, EnsembleResult, Expr, ModelOptions, ModelType,
};

use crate::bigram::BigramLm;
use crate::graph::ParamScope;

/// Internal decoder state of one model between steps.
pub trait DecoderState: Send + fmt::Debug {
    /// Scores over the vocabulary, `beam × dim_vocab`.
    fn probs(&self) -> &Expr;

    /// Recover the concrete state inside the model that produced it.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// Mark vocabulary entries of `costs` as invalid for this batch.
    fn blacklist(&self, _costs: &mut Expr, _batch: &CorpusBatch) {}
}

/// Trait for learned encoder/decoder models.
///
/// Every call receives the scorer's [`ParamScope`], so parameters read or
/// written here always land in the scorer's own namespace.
pub trait EncoderDecoder: Send + Sync {
    fn load(&self, graph: &mut ParamScope<'_>, path: &Path) -> EnsembleResult<()>;

    fn clear(&self, graph: &mut ParamScope<'_>) -> EnsembleResult<()>;

    /// Encode the batch and return the decoder's initial state.
    fn start_state(
        &self,
        graph: &mut ParamScope<'_>,
        batch: &CorpusBatch,
    ) -> EnsembleResult<Box<dyn DecoderState>>;

    /// Advance one position. `hyp_indices[k]` is the previous beam slot
    /// entry `k` descends from, `emb_indices[k]` the token it chose.
    fn step(
        &self,
        graph: &mut ParamScope<'_>,
        state: Box<dyn DecoderState>,
        hyp_indices: &[usize],
        emb_indices: &[usize],
    ) -> EnsembleResult<Box<dyn DecoderState>>;
}

type ModelConstructor =
    Arc<dyn Fn(&ModelOptions) -> EnsembleResult<Box<dyn EncoderDecoder>> + Send + Sync>;

/// Constructors for each model type.
///
/// Thread-safe: the constructor table is guarded by a `parking_lot::RwLock`
/// so a shared registry can be extended while builders read from it.
pub struct ModelRegistry {
    constructors: RwLock<HashMap<ModelType, ModelConstructor>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ModelRegistry {
    /// Registry with no constructors.
    pub fn empty() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with the built-in models (`lm` → [`BigramLm`]).
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(ModelType::Lm, |options| {
            Ok(Box::new(BigramLm::from_options(options)?) as Box<dyn EncoderDecoder>)
        });
        registry
    }

    /// Register (or replace) the constructor for `model_type`.
    pub fn register(
        &self,
        model_type: ModelType,
        constructor: impl Fn(&ModelOptions) -> EnsembleResult<Box<dyn EncoderDecoder>>
            + Send
            + Sync
            + 'static,
    ) {
        self.constructors
            .write()
            .insert(model_type, Arc::new(constructor));
    }

    pub fn supports(&self, model_type: ModelType) -> bool {
        self.constructors.read().contains_key(&model_type)
    }

    /// Build a model for `options`; `path` is only used for error reporting.
    pub fn create(
        &self,
        options: &ModelOptions,
        path: &Path,
    ) -> EnsembleResult<Box<dyn EncoderDecoder>> {
        let constructor = self
            .constructors
            .read()
            .get(&options.model_type)
            .cloned()
            .ok_or_else(|| EnsembleError::UnsupportedModel {
                model_type: options.model_type.to_string(),
                path: path.to_path_buf(),
            })?;
        constructor(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(model_type: ModelType) -> ModelOptions {
        ModelOptions {
            model_type,
            dim_vocabs: vec![4],
            index: None,
            inference: true,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_defaults_support_lm() {
        let registry = ModelRegistry::with_defaults();
        assert!(registry.supports(ModelType::Lm));
        assert!(!registry.supports(ModelType::Transformer));
        assert!(registry
            .create(&options(ModelType::Lm), Path::new("lm.json"))
            .is_ok());
    }

    #[test]
    fn test_unsupported_type_names_path() {
        let registry = ModelRegistry::empty();
        match registry.create(&options(ModelType::S2s), Path::new("models/s2s.json")) {
            Err(EnsembleError::UnsupportedModel { model_type, path }) => {
                assert_eq!(model_type, "s2s");
                assert_eq!(path, Path::new("models/s2s.json"));
            }
            Err(other) => panic!("expected UnsupportedModel, got {other}"),
            Ok(_) => panic!("expected UnsupportedModel"),
        }
    }

    #[test]
    fn test_register_replaces_constructor() {
        let registry = ModelRegistry::empty();
        registry.register(ModelType::Transformer, |_| {
            Err(EnsembleError::Config("first".into()))
        });
        registry.register(ModelType::Transformer, |_| {
            Err(EnsembleError::Config("second".into()))
        });
        let err = registry
            .create(&options(ModelType::Transformer), Path::new("t.json"))
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("config error: second"));
    }
}
