// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Reference Bigram Language Model
// ─────────────────────────────────────────────────────────────────────
//! Minimal `lm`-type model: a unigram row for the first position and a
//! `V × V` bigram table afterwards, both stored as graph parameters.
//!
//! Small enough to reason about in tests and benchmarks, but it goes
//! through the same load/clear/start/step path as a real network.

use std::any::Any;
use std::path::Path;

use ensemble_types::{
    CorpusBatch, EnsembleError, EnsembleResult, Expr, ModelOptions, UNK_ID,
};

use crate::graph::ParamScope;
use crate::model::{DecoderState, EncoderDecoder};
use crate::weights::read_model_file;

const UNIGRAM: &str = "unigram";
const BIGRAM: &str = "bigram";

/// Decoder state: per-hypothesis token history plus the emitted scores.
#[derive(Debug)]
pub struct BigramState {
    probs: Expr,
    history: Vec<Vec<usize>>,
    index: usize,
}

impl BigramState {
    pub fn history(&self) -> &[Vec<usize>] {
        &self.history
    }
}

impl DecoderState for BigramState {
    fn probs(&self) -> &Expr {
        &self.probs
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    /// Ban `<unk>` when the model's source field does not contain one.
    fn blacklist(&self, costs: &mut Expr, batch: &CorpusBatch) {
        let Some(field) = batch.get(self.index) else {
            return;
        };
        let cols = costs.cols();
        if field.contains(UNK_ID) || cols <= UNK_ID {
            return;
        }
        for row in costs.values_mut().chunks_mut(cols) {
            row[UNK_ID] = f32::NEG_INFINITY;
        }
    }
}

/// Bigram language model over a `dim_vocab`-sized vocabulary.
#[derive(Debug, Clone)]
pub struct BigramLm {
    dim_vocab: usize,
    index: usize,
}

impl BigramLm {
    pub fn from_options(options: &ModelOptions) -> EnsembleResult<Self> {
        let dim_vocab = options
            .target_vocab()
            .ok_or_else(|| EnsembleError::Config("lm needs dim_vocabs".to_string()))?;
        Ok(Self {
            dim_vocab,
            index: options.index.unwrap_or(0),
        })
    }
}

impl EncoderDecoder for BigramLm {
    fn load(&self, graph: &mut ParamScope<'_>, path: &Path) -> EnsembleResult<()> {
        let file = read_model_file(path)?;
        for (name, rows) in [(UNIGRAM, 1), (BIGRAM, self.dim_vocab)] {
            let tensor = file.params.get(name).ok_or_else(|| EnsembleError::ModelFile {
                path: path.to_path_buf(),
                reason: format!("missing parameter {name}"),
            })?;
            let expr = tensor.to_expr().map_err(|e| EnsembleError::ModelFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            if expr.shape() != (rows, self.dim_vocab) {
                return Err(EnsembleError::ModelFile {
                    path: path.to_path_buf(),
                    reason: format!(
                        "{name} has shape {:?}, expected ({rows}, {})",
                        expr.shape(),
                        self.dim_vocab
                    ),
                });
            }
            graph.set_param(name, expr);
        }
        Ok(())
    }

    fn clear(&self, graph: &mut ParamScope<'_>) -> EnsembleResult<()> {
        graph.clear_params();
        Ok(())
    }

    fn start_state(
        &self,
        graph: &mut ParamScope<'_>,
        batch: &CorpusBatch,
    ) -> EnsembleResult<Box<dyn DecoderState>> {
        let unigram = graph.require_param(UNIGRAM)?;
        let sentences = batch.size().max(1);
        let probs = if sentences == 1 {
            unigram
        } else {
            let values = unigram.values().repeat(sentences);
            graph.constant(sentences, self.dim_vocab, values)?
        };
        Ok(Box::new(BigramState {
            probs,
            history: vec![Vec::new(); sentences],
            index: self.index,
        }))
    }

    fn step(
        &self,
        graph: &mut ParamScope<'_>,
        state: Box<dyn DecoderState>,
        hyp_indices: &[usize],
        emb_indices: &[usize],
    ) -> EnsembleResult<Box<dyn DecoderState>> {
        let prev = state
            .into_any()
            .downcast::<BigramState>()
            .map_err(|_| EnsembleError::StateMismatch {
                scorer: "bigram-lm".to_string(),
                found: "foreign decoder state".to_string(),
            })?;
        if hyp_indices.len() != emb_indices.len() {
            return Err(EnsembleError::Shape(format!(
                "{} hypothesis indices but {} embedding indices",
                hyp_indices.len(),
                emb_indices.len()
            )));
        }

        let bigram = graph.require_param(BIGRAM)?;
        let mut history = Vec::with_capacity(hyp_indices.len());
        let mut values = Vec::with_capacity(hyp_indices.len() * self.dim_vocab);
        for (&hyp, &emb) in hyp_indices.iter().zip(emb_indices) {
            let parent = prev.history.get(hyp).ok_or_else(|| {
                EnsembleError::Shape(format!(
                    "hypothesis index {hyp} out of range for beam of {}",
                    prev.history.len()
                ))
            })?;
            let row = bigram.row_slice(emb).ok_or_else(|| {
                EnsembleError::Shape(format!(
                    "embedding index {emb} out of range for vocabulary of {}",
                    self.dim_vocab
                ))
            })?;
            let mut extended = parent.clone();
            extended.push(emb);
            history.push(extended);
            values.extend_from_slice(row);
        }

        let probs = graph.constant(history.len(), self.dim_vocab, values)?;
        Ok(Box::new(BigramState {
            probs,
            history,
            index: prev.index,
        }))
    }
}
