// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Driver
// ─────────────────────────────────────────────────────────────────────
//! Drives every scorer through one decoding run and combines their
//! score vectors into the single distribution the beam search ranks.
//!
//! Combination is `Σ weight_i · probs_i`, with shorter vectors (penalty
//! rows) broadcast across a `beam × dim_vocab` layout. Numeric edges:
//! - weight `0.0` skips the scorer entirely (no `0 · -inf`).
//! - a NaN contribution counts as `-inf`.
//! - a `-inf` contribution stays `-inf` whatever the weight's sign.

use ensemble_types::{
    sanitize_score, CorpusBatch, EnsembleConfig, EnsembleError, EnsembleResult, Expr,
};

use crate::builder::create_ensemble;
use crate::graph::Graph;
use crate::scorer::{Scorer, ScorerState};

/// Weighted contribution of one score, after the NaN/-inf policy.
#[inline]
fn contribution(weight: f32, value: f32) -> f32 {
    let value = sanitize_score(value);
    if value == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    weight * value
}

/// Ordered scorer list plus the per-step operations over it.
pub struct Ensemble {
    scorers: Vec<Box<dyn Scorer>>,
}

impl Ensemble {
    pub fn new(scorers: Vec<Box<dyn Scorer>>) -> Self {
        Self { scorers }
    }

    pub fn from_config(config: &EnsembleConfig) -> EnsembleResult<Self> {
        Ok(Self::new(create_ensemble(config)?))
    }

    pub fn scorers(&self) -> &[Box<dyn Scorer>] {
        &self.scorers
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    /// Load every scorer's parameters.
    pub fn init(&self, graph: &mut dyn Graph) -> EnsembleResult<()> {
        for scorer in &self.scorers {
            scorer.init(graph)?;
        }
        Ok(())
    }

    pub fn clear(&self, graph: &mut dyn Graph) -> EnsembleResult<()> {
        for scorer in &self.scorers {
            scorer.clear(graph)?;
        }
        Ok(())
    }

    /// Initial state of every scorer, in scorer order.
    pub fn start_states(
        &self,
        graph: &mut dyn Graph,
        batch: &CorpusBatch,
    ) -> EnsembleResult<Vec<ScorerState>> {
        self.scorers
            .iter()
            .map(|scorer| scorer.start_state(graph, batch))
            .collect()
    }

    /// Step every scorer with the same hypothesis and embedding indices.
    pub fn step(
        &self,
        graph: &mut dyn Graph,
        states: Vec<ScorerState>,
        hyp_indices: &[usize],
        emb_indices: &[usize],
    ) -> EnsembleResult<Vec<ScorerState>> {
        self.check_arity(states.len())?;
        self.scorers
            .iter()
            .zip(states)
            .map(|(scorer, state)| scorer.step(graph, state, hyp_indices, emb_indices))
            .collect()
    }

    /// Weighted sum of all score vectors.
    pub fn combined_scores(&self, states: &[ScorerState]) -> EnsembleResult<Vec<f32>> {
        self.check_arity(states.len())?;
        let total = states.iter().map(|s| s.probs().len()).max().unwrap_or(0);
        let mut combined = vec![0.0f32; total];

        for (scorer, state) in self.scorers.iter().zip(states) {
            let weight = scorer.weight();
            if weight == 0.0 {
                continue;
            }
            let probs = state.probs().values();
            if probs.is_empty() || total % probs.len() != 0 {
                return Err(EnsembleError::Shape(format!(
                    "{}: {} scores cannot broadcast to {total}",
                    scorer.name(),
                    probs.len()
                )));
            }
            for (i, out) in combined.iter_mut().enumerate() {
                *out += contribution(weight, probs[i % probs.len()]);
            }
        }

        for out in combined.iter_mut().filter(|v| v.is_nan()) {
            *out = f32::NEG_INFINITY;
        }
        Ok(combined)
    }

    /// Weighted contribution of each scorer at flat index `i`.
    pub fn break_down(
        &self,
        states: &[ScorerState],
        i: usize,
    ) -> EnsembleResult<Vec<(String, f32)>> {
        self.check_arity(states.len())?;
        self.scorers
            .iter()
            .zip(states)
            .map(|(scorer, state)| {
                let len = state.probs().len();
                if len == 0 {
                    return Err(EnsembleError::Shape(format!(
                        "{}: empty score vector",
                        scorer.name()
                    )));
                }
                if matches!(state, ScorerState::Model(_)) && i >= len {
                    return Err(EnsembleError::Shape(format!(
                        "{}: index {i} past {len} scores",
                        scorer.name()
                    )));
                }
                let raw = state.break_down(i);
                let weighted = if scorer.weight() == 0.0 {
                    0.0
                } else {
                    contribution(scorer.weight(), raw)
                };
                Ok((scorer.name().to_string(), weighted))
            })
            .collect()
    }

    /// Let every state mark invalid entries in the candidate costs.
    pub fn blacklist(&self, states: &[ScorerState], costs: &mut Expr, batch: &CorpusBatch) {
        for state in states {
            state.blacklist(costs, batch);
        }
    }

    fn check_arity(&self, states: usize) -> EnsembleResult<()> {
        if states != self.scorers.len() {
            return Err(EnsembleError::Shape(format!(
                "{states} states for {} scorers",
                self.scorers.len()
            )));
        }
        Ok(())
    }
}
