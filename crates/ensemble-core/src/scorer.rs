// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Scorers
// ─────────────────────────────────────────────────────────────────────
//! Scorer interface and the model-backed scorer.
//!
//! A scorer is a named, weighted producer of [`ScorerState`]s. The beam
//! search calls `start_state` once per batch and `step` once per
//! decoding position; each state carries a vocabulary-sized score vector
//! that the ensemble combines as `Σ weight_i · probs_i`.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use ensemble_types::{CorpusBatch, EnsembleError, EnsembleResult, Expr};

use crate::graph::{Graph, ParamScope};
use crate::model::{DecoderState, EncoderDecoder};

/// Trait for ensemble members.
///
/// `name` and `weight` are fixed for the scorer's lifetime. No operation
/// may touch another scorer's parameters or states.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    fn weight(&self) -> f32;

    /// Reset any parameters this scorer owns in the graph.
    fn clear(&self, graph: &mut dyn Graph) -> EnsembleResult<()>;

    /// Load persisted parameters. Scorers without parameters keep the no-op.
    fn init(&self, _graph: &mut dyn Graph) -> EnsembleResult<()> {
        Ok(())
    }

    /// Initial state for a new batch.
    fn start_state(&self, graph: &mut dyn Graph, batch: &CorpusBatch)
        -> EnsembleResult<ScorerState>;

    /// Advance one decoding step, consuming the previous state.
    fn step(
        &self,
        graph: &mut dyn Graph,
        state: ScorerState,
        hyp_indices: &[usize],
        emb_indices: &[usize],
    ) -> EnsembleResult<ScorerState>;
}

/// Source of per-instance tokens for [`ModelScorer`].
static NEXT_SCORER_ID: AtomicU64 = AtomicU64::new(0);

/// State of a model-backed scorer: the decoder state plus its producer.
///
/// The producer is identified by instance, not by name: two scorers both
/// called `F0` (say, from two ensembles) never accept each other's states.
pub struct ModelState {
    owner: String,
    owner_id: u64,
    state: Box<dyn DecoderState>,
}

impl ModelState {
    pub(crate) fn new(
        owner: impl Into<String>,
        owner_id: u64,
        state: Box<dyn DecoderState>,
    ) -> Self {
        Self {
            owner: owner.into(),
            owner_id,
            state,
        }
    }

    /// Name of the scorer that produced this state.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn into_inner(self) -> Box<dyn DecoderState> {
        self.state
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelState")
            .field("owner", &self.owner)
            .field("owner_id", &self.owner_id)
            .field("state", &self.state)
            .finish()
    }
}

/// Fixed penalty vector, identical at every position.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyState {
    dim_vocab: usize,
    penalties: Expr,
}

impl PenaltyState {
    /// `penalties` must hold exactly `dim_vocab > 0` entries.
    pub fn new(dim_vocab: usize, penalties: Expr) -> EnsembleResult<Self> {
        if dim_vocab == 0 || penalties.len() != dim_vocab {
            return Err(EnsembleError::Shape(format!(
                "penalty vector of {} entries for dim_vocab {dim_vocab}",
                penalties.len()
            )));
        }
        Ok(Self {
            dim_vocab,
            penalties,
        })
    }
}

/// What a scorer hands the beam search after each step.
#[derive(Debug)]
pub enum ScorerState {
    Model(ModelState),
    Penalty(PenaltyState),
}

impl ScorerState {
    /// Scores over the vocabulary: `dim_vocab` or `beam × dim_vocab` entries.
    pub fn probs(&self) -> &Expr {
        match self {
            Self::Model(s) => s.state.probs(),
            Self::Penalty(s) => &s.penalties,
        }
    }

    /// One scalar component, for attributing a chosen token's score.
    ///
    /// Penalty vectors are reused across a flattened beam × vocab layout,
    /// so their index wraps at `dim_vocab`.
    ///
    /// # Panics
    /// Panics if a model state is indexed past its score vector.
    pub fn break_down(&self, i: usize) -> f32 {
        match self {
            Self::Model(s) => s.state.probs().get(i),
            Self::Penalty(s) => s.penalties.get(i % s.dim_vocab),
        }
    }

    /// Mark entries of `costs` as invalid for this batch. No-op for penalties.
    pub fn blacklist(&self, costs: &mut Expr, batch: &CorpusBatch) {
        if let Self::Model(s) = self {
            s.state.blacklist(costs, batch);
        }
    }

    /// Producer label for diagnostics.
    pub fn origin(&self) -> &str {
        match self {
            Self::Model(s) => &s.owner,
            Self::Penalty(_) => "penalty",
        }
    }
}

/// Scorer wrapping a learned encoder/decoder model.
///
/// Every parameter-touching call runs inside a [`ParamScope`] named after
/// the scorer, so any number of models can share one graph.
pub struct ModelScorer {
    id: u64,
    name: String,
    weight: f32,
    model: Box<dyn EncoderDecoder>,
    path: PathBuf,
}

impl ModelScorer {
    pub fn new(
        model: Box<dyn EncoderDecoder>,
        name: impl Into<String>,
        weight: f32,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: NEXT_SCORER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            weight,
            model,
            path: path.into(),
        }
    }

    fn unwrap_state(&self, state: ScorerState) -> EnsembleResult<Box<dyn DecoderState>> {
        match state {
            ScorerState::Model(s) if s.owner_id == self.id => Ok(s.into_inner()),
            other => Err(EnsembleError::StateMismatch {
                scorer: self.name.clone(),
                found: other.origin().to_string(),
            }),
        }
    }
}

impl Scorer for ModelScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn clear(&self, graph: &mut dyn Graph) -> EnsembleResult<()> {
        let mut scope = ParamScope::enter(graph, &self.name);
        self.model.clear(&mut scope)
    }

    fn init(&self, graph: &mut dyn Graph) -> EnsembleResult<()> {
        let mut scope = ParamScope::enter(graph, &self.name);
        self.model.load(&mut scope, &self.path)
    }

    fn start_state(
        &self,
        graph: &mut dyn Graph,
        batch: &CorpusBatch,
    ) -> EnsembleResult<ScorerState> {
        let mut scope = ParamScope::enter(graph, &self.name);
        let state = self.model.start_state(&mut scope, batch)?;
        Ok(ScorerState::Model(ModelState::new(self.name.as_str(), self.id, state)))
    }

    fn step(
        &self,
        graph: &mut dyn Graph,
        state: ScorerState,
        hyp_indices: &[usize],
        emb_indices: &[usize],
    ) -> EnsembleResult<ScorerState> {
        let wrapped = self.unwrap_state(state)?;
        let mut scope = ParamScope::enter(graph, &self.name);
        let next = self
            .model
            .step(&mut scope, wrapped, hyp_indices, emb_indices)?;
        Ok(ScorerState::Model(ModelState::new(self.name.as_str(), self.id, next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use ensemble_types::{ModelOptions, ModelType, SubBatch};

    use crate::bigram::BigramLm;
    use crate::graph::ExpressionGraph;
    use crate::test_helpers::{write_model, FixedModel, FixedState};

    fn lm() -> Box<dyn EncoderDecoder> {
        Box::new(
            BigramLm::from_options(&ModelOptions {
                model_type: ModelType::Lm,
                dim_vocabs: vec![4],
                index: None,
                inference: true,
                extra: Default::default(),
            })
            .unwrap(),
        )
    }

    fn batch() -> CorpusBatch {
        CorpusBatch::new(vec![SubBatch::new(vec![3, 2])], 1)
    }

    /// Records the namespace active at every call.
    struct NamespaceProbe {
        seen: Arc<Mutex<Vec<(&'static str, String)>>>,
    }

    impl EncoderDecoder for NamespaceProbe {
        fn load(&self, graph: &mut ParamScope<'_>, _path: &Path) -> EnsembleResult<()> {
            self.seen.lock().push(("load", graph.namespace().to_string()));
            Ok(())
        }

        fn clear(&self, graph: &mut ParamScope<'_>) -> EnsembleResult<()> {
            self.seen.lock().push(("clear", graph.namespace().to_string()));
            Ok(())
        }

        fn start_state(
            &self,
            graph: &mut ParamScope<'_>,
            _batch: &CorpusBatch,
        ) -> EnsembleResult<Box<dyn DecoderState>> {
            self.seen.lock().push(("start", graph.namespace().to_string()));
            Ok(Box::new(FixedState(Expr::row(vec![0.0; 4]))))
        }

        fn step(
            &self,
            graph: &mut ParamScope<'_>,
            state: Box<dyn DecoderState>,
            _hyp_indices: &[usize],
            _emb_indices: &[usize],
        ) -> EnsembleResult<Box<dyn DecoderState>> {
            self.seen.lock().push(("step", graph.namespace().to_string()));
            Ok(state)
        }
    }

    #[test]
    fn test_every_call_runs_in_own_namespace() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let scorer = ModelScorer::new(
            Box::new(NamespaceProbe { seen: seen.clone() }),
            "F2",
            1.0,
            "probe.json",
        );
        let mut graph = ExpressionGraph::new();
        graph.switch_params("F0");

        scorer.clear(&mut graph).unwrap();
        scorer.init(&mut graph).unwrap();
        let state = scorer.start_state(&mut graph, &batch()).unwrap();
        let _ = scorer.step(&mut graph, state, &[0], &[1]).unwrap();

        let seen = seen.lock();
        let calls: Vec<&str> = seen.iter().map(|(c, _)| *c).collect();
        assert_eq!(calls, ["clear", "load", "start", "step"]);
        assert!(seen.iter().all(|(_, ns)| ns == "F2"));
        assert_eq!(graph.namespace(), "F0");
    }

    #[test]
    fn test_two_models_same_param_names_do_not_alias() {
        let dir = tempfile::tempdir().unwrap();
        let a = ModelScorer::new(lm(), "F0", 1.0, write_model(dir.path(), "a.json", 0.0));
        let b = ModelScorer::new(lm(), "F1", 1.0, write_model(dir.path(), "b.json", 100.0));
        let mut graph = ExpressionGraph::new();
        a.init(&mut graph).unwrap();
        b.init(&mut graph).unwrap();

        let sa = a.start_state(&mut graph, &batch()).unwrap();
        let sb = b.start_state(&mut graph, &batch()).unwrap();
        assert_eq!(sa.probs().values(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(sb.probs().values(), &[100.0, 101.0, 102.0, 103.0]);
    }

    #[test]
    fn test_step_rejects_state_of_other_model_scorer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), "a.json", 0.0);
        let a = ModelScorer::new(lm(), "F0", 1.0, &path);
        let b = ModelScorer::new(lm(), "F1", 1.0, &path);
        let mut graph = ExpressionGraph::new();
        a.init(&mut graph).unwrap();
        b.init(&mut graph).unwrap();

        let state_a = a.start_state(&mut graph, &batch()).unwrap();
        match b.step(&mut graph, state_a, &[0], &[1]) {
            Err(EnsembleError::StateMismatch { scorer, found }) => {
                assert_eq!(scorer, "F1");
                assert_eq!(found, "F0");
            }
            other => panic!("expected StateMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_step_rejects_state_of_same_named_scorer() {
        let a = ModelScorer::new(Box::new(FixedModel(vec![-9.0; 4])), "F0", 1.0, "a.json");
        let b = ModelScorer::new(Box::new(FixedModel(vec![0.0; 4])), "F0", 1.0, "b.json");
        let mut graph = ExpressionGraph::new();

        let state_a = a.start_state(&mut graph, &batch()).unwrap();
        match b.step(&mut graph, state_a, &[0], &[1]) {
            Err(EnsembleError::StateMismatch { scorer, found }) => {
                assert_eq!(scorer, "F0");
                assert_eq!(found, "F0");
            }
            other => panic!("expected StateMismatch, got {other:?}"),
        }

        // the producing instance still accepts it
        let state_a = a.start_state(&mut graph, &batch()).unwrap();
        let next = a.step(&mut graph, state_a, &[0], &[1]).unwrap();
        assert_eq!(next.probs().values(), &[-9.0; 4]);
    }

    #[test]
    fn test_penalty_state_rejects_bad_shapes() {
        assert!(matches!(
            PenaltyState::new(0, Expr::row(vec![])),
            Err(EnsembleError::Shape(_))
        ));
        assert!(matches!(
            PenaltyState::new(4, Expr::row(vec![1.0; 3])),
            Err(EnsembleError::Shape(_))
        ));
        let penalties = PenaltyState::new(3, Expr::row(vec![1.0, 2.0, 3.0])).unwrap();
        let state = ScorerState::Penalty(penalties);
        assert_eq!(state.break_down(4), 2.0);
    }

    #[test]
    fn test_step_rejects_penalty_state() {
        let scorer = ModelScorer::new(lm(), "F0", 1.0, "unused.json");
        let mut graph = ExpressionGraph::new();
        let penalty = ScorerState::Penalty(PenaltyState::new(4, Expr::row(vec![1.0; 4])).unwrap());
        assert!(matches!(
            scorer.step(&mut graph, penalty, &[0], &[0]),
            Err(EnsembleError::StateMismatch { .. })
        ));
    }

    #[test]
    fn test_clear_drops_only_own_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), "a.json", 0.0);
        let a = ModelScorer::new(lm(), "F0", 1.0, &path);
        let b = ModelScorer::new(lm(), "F1", 1.0, &path);
        let mut graph = ExpressionGraph::new();
        a.init(&mut graph).unwrap();
        b.init(&mut graph).unwrap();
        a.clear(&mut graph).unwrap();

        assert_eq!(graph.param_count("F0"), 0);
        assert_eq!(graph.param_count("F1"), 2);
        assert!(a.start_state(&mut graph, &batch()).is_err());
        assert!(b.start_state(&mut graph, &batch()).is_ok());
    }

    #[test]
    fn test_model_break_down_indexes_probs() {
        let state = ScorerState::Model(ModelState::new(
            "F0",
            0,
            Box::new(FixedState(Expr::row(vec![0.1, 0.2, 0.3]))),
        ));
        assert_eq!(state.break_down(2), 0.3);
        assert_eq!(state.origin(), "F0");
    }
}
