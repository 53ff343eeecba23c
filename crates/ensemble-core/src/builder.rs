// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Builder
// ─────────────────────────────────────────────────────────────────────
//! Assembles the ordered scorer list from an [`EnsembleConfig`].
//!
//! Model `i` becomes scorer `F{i}`, which doubles as its parameter
//! namespace. Overrides stored in a model file refine the ensemble-wide
//! options; a model file without them only earns a warning.

use std::path::Path;

use ensemble_types::{
    EnsembleConfig, EnsembleError, EnsembleResult, ModelOptions, ModelType,
};

use crate::model::ModelRegistry;
use crate::penalty::{UnseenWordPenalty, WordPenalty};
use crate::scorer::{ModelScorer, Scorer};
use crate::weights::{load_model_overrides, OverrideLookup};

/// Name of the appended word-count penalty scorer.
pub const WORD_PENALTY_NAME: &str = "WordPenalty";
/// Name of the appended unseen-word penalty scorer.
pub const UNSEEN_WORD_PENALTY_NAME: &str = "UnseenWordPenalty";

/// Build scorers with the built-in model registry.
pub fn create_ensemble(config: &EnsembleConfig) -> EnsembleResult<Vec<Box<dyn Scorer>>> {
    create_scorers(config, &ModelRegistry::with_defaults())
}

/// Build one scorer per model, then any configured penalty scorers.
///
/// Fails as a whole on any configuration problem; there is no partial
/// ensemble.
pub fn create_scorers(
    config: &EnsembleConfig,
    registry: &ModelRegistry,
) -> EnsembleResult<Vec<Box<dyn Scorer>>> {
    config.validate()?;
    let dim_vocab = config.target_vocab()?;
    let weights = config.model_weights()?;

    let mut scorers: Vec<Box<dyn Scorer>> = Vec::with_capacity(config.models.len() + 2);
    for (i, (model, &weight)) in config.models.iter().zip(&weights).enumerate() {
        let fname = format!("F{i}");
        let mut options = config.model_options();

        match load_model_overrides(model)? {
            OverrideLookup::Loaded(overrides) => options.merge(overrides),
            OverrideLookup::NotFound => log::warn!(
                "No model settings found in model file {}",
                model.display()
            ),
        }

        let got = options.target_vocab().unwrap_or(0);
        if got != dim_vocab {
            return Err(EnsembleError::VocabMismatch {
                model: model.clone(),
                expected: dim_vocab,
                got,
            });
        }

        scorers.push(scorer_by_type(&fname, weight, model, options, config, registry)?);
    }

    if let Some(weight) = config.word_penalty {
        scorers.push(Box::new(WordPenalty::new(WORD_PENALTY_NAME, weight, dim_vocab)?));
    }
    if let Some(weight) = config.unseen_word_penalty {
        scorers.push(Box::new(UnseenWordPenalty::new(
            UNSEEN_WORD_PENALTY_NAME,
            weight,
            dim_vocab,
            config.unseen_batch_index,
        )?));
    }

    Ok(scorers)
}

fn scorer_by_type(
    fname: &str,
    weight: f32,
    model: &Path,
    mut options: ModelOptions,
    config: &EnsembleConfig,
    registry: &ModelRegistry,
) -> EnsembleResult<Box<dyn Scorer>> {
    options.inference = true;

    // An LM reads the field after the declared inputs.
    if options.model_type == ModelType::Lm {
        if let Some(input) = &config.input {
            options.index = Some(input.len());
        }
    }

    let encdec = registry.create(&options, model)?;

    log::info!(
        "Loading scorer of type {} as feature {}",
        options.model_type,
        fname
    );

    Ok(Box::new(ModelScorer::new(encdec, fname, weight, model)))
}
