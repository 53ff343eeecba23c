// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Shared Test Fixtures
// ─────────────────────────────────────────────────────────────────────

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

use ensemble_types::{CorpusBatch, EnsembleResult, Expr, ModelOverrides};

use crate::graph::ParamScope;
use crate::model::{DecoderState, EncoderDecoder};
use crate::weights::{ModelFile, ParamTensor};

/// Vocabulary size of the fixture models.
pub const FIXTURE_VOCAB: usize = 4;

fn fixture(offset: f32) -> ModelFile {
    let v = FIXTURE_VOCAB;
    let mut file = ModelFile::default();
    file.params.insert(
        "unigram".into(),
        ParamTensor {
            shape: [1, v],
            values: (0..v).map(|i| offset + i as f32).collect(),
        },
    );
    file.params.insert(
        "bigram".into(),
        ParamTensor {
            shape: [v, v],
            values: (0..v * v).map(|i| offset + 10.0 * i as f32).collect(),
        },
    );
    file
}

/// Write a 4-word bigram model: `unigram[i] = offset + i`,
/// `bigram[r][c] = offset + 10 * (r * 4 + c)`.
pub fn write_model(dir: &Path, name: &str, offset: f32) -> PathBuf {
    write_model_with(dir, name, offset, None)
}

/// Same as [`write_model`], with a `config` override section.
pub fn write_model_with(
    dir: &Path,
    name: &str,
    offset: f32,
    overrides: Option<ModelOverrides>,
) -> PathBuf {
    let mut file = fixture(offset);
    file.config = overrides;
    let path = dir.join(name);
    fs::write(&path, file.to_json().unwrap()).unwrap();
    path
}

/// Decoder state holding a fixed score vector.
#[derive(Debug)]
pub struct FixedState(pub Expr);

impl DecoderState for FixedState {
    fn probs(&self) -> &Expr {
        &self.0
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Model emitting the same scores at every position.
pub struct FixedModel(pub Vec<f32>);

impl EncoderDecoder for FixedModel {
    fn load(&self, _graph: &mut ParamScope<'_>, _path: &Path) -> EnsembleResult<()> {
        Ok(())
    }

    fn clear(&self, _graph: &mut ParamScope<'_>) -> EnsembleResult<()> {
        Ok(())
    }

    fn start_state(
        &self,
        _graph: &mut ParamScope<'_>,
        _batch: &CorpusBatch,
    ) -> EnsembleResult<Box<dyn DecoderState>> {
        Ok(Box::new(FixedState(Expr::row(self.0.clone()))))
    }

    fn step(
        &self,
        _graph: &mut ParamScope<'_>,
        state: Box<dyn DecoderState>,
        _hyp_indices: &[usize],
        _emb_indices: &[usize],
    ) -> EnsembleResult<Box<dyn DecoderState>> {
        Ok(state)
    }
}
