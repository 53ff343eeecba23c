// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Heuristic Penalty Scorers
// ─────────────────────────────────────────────────────────────────────
//! Non-learned scorers producing one fixed vector per batch.
//!
//! - `WordPenalty`: 1 for every real word, 0 for padding and `</s>`;
//!   its weight sets how strongly hypothesis length is rewarded or punished.
//! - `UnseenWordPenalty`: -1 for every word absent from a source field,
//!   biasing the search towards copying source vocabulary.
//!
//! Neither has parameters, and `step` hands back the state it was given.

use ensemble_types::{CorpusBatch, EnsembleError, EnsembleResult, EOS_ID, PAD_ID};

use crate::graph::Graph;
use crate::scorer::{PenaltyState, Scorer, ScorerState};

fn check_vocab(name: &str, dim_vocab: usize) -> EnsembleResult<()> {
    if dim_vocab <= EOS_ID {
        return Err(EnsembleError::Config(format!(
            "{name}: dim_vocab must be > {EOS_ID}, got {dim_vocab}"
        )));
    }
    Ok(())
}

/// Length penalty: constant 1 per emitted word.
#[derive(Debug, Clone)]
pub struct WordPenalty {
    name: String,
    weight: f32,
    dim_vocab: usize,
}

impl WordPenalty {
    pub fn new(name: impl Into<String>, weight: f32, dim_vocab: usize) -> EnsembleResult<Self> {
        let name = name.into();
        check_vocab(&name, dim_vocab)?;
        Ok(Self {
            name,
            weight,
            dim_vocab,
        })
    }
}

impl Scorer for WordPenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn clear(&self, _graph: &mut dyn Graph) -> EnsembleResult<()> {
        Ok(())
    }

    fn start_state(
        &self,
        graph: &mut dyn Graph,
        _batch: &CorpusBatch,
    ) -> EnsembleResult<ScorerState> {
        let mut p = vec![1.0; self.dim_vocab];
        p[PAD_ID] = 0.0;
        p[EOS_ID] = 0.0;
        let penalties = graph.constant(1, self.dim_vocab, p)?;
        Ok(ScorerState::Penalty(PenaltyState::new(
            self.dim_vocab,
            penalties,
        )?))
    }

    fn step(
        &self,
        _graph: &mut dyn Graph,
        state: ScorerState,
        _hyp_indices: &[usize],
        _emb_indices: &[usize],
    ) -> EnsembleResult<ScorerState> {
        Ok(state)
    }
}

/// Coverage bias against words the selected source field never contains.
#[derive(Debug, Clone)]
pub struct UnseenWordPenalty {
    name: String,
    weight: f32,
    dim_vocab: usize,
    batch_index: usize,
}

impl UnseenWordPenalty {
    pub fn new(
        name: impl Into<String>,
        weight: f32,
        dim_vocab: usize,
        batch_index: usize,
    ) -> EnsembleResult<Self> {
        let name = name.into();
        check_vocab(&name, dim_vocab)?;
        Ok(Self {
            name,
            weight,
            dim_vocab,
            batch_index,
        })
    }
}

impl Scorer for UnseenWordPenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn clear(&self, _graph: &mut dyn Graph) -> EnsembleResult<()> {
        Ok(())
    }

    fn start_state(
        &self,
        graph: &mut dyn Graph,
        batch: &CorpusBatch,
    ) -> EnsembleResult<ScorerState> {
        let field = batch.get(self.batch_index).ok_or_else(|| {
            EnsembleError::Batch(format!(
                "{}: batch has {} fields, no field {}",
                self.name,
                batch.len(),
                self.batch_index
            ))
        })?;

        let mut p = vec![-1.0; self.dim_vocab];
        for &i in field.indices() {
            match p.get_mut(i) {
                Some(v) => *v = 0.0,
                None => log::debug!(
                    "{}: ignoring id {i} outside vocabulary of {}",
                    self.name,
                    self.dim_vocab
                ),
            }
        }
        p[EOS_ID] = 0.0;

        let penalties = graph.constant(1, self.dim_vocab, p)?;
        Ok(ScorerState::Penalty(PenaltyState::new(
            self.dim_vocab,
            penalties,
        )?))
    }

    fn step(
        &self,
        _graph: &mut dyn Graph,
        state: ScorerState,
        _hyp_indices: &[usize],
        _emb_indices: &[usize],
    ) -> EnsembleResult<ScorerState> {
        Ok(state)
    }
}
