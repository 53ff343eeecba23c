// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Model File Container
// ─────────────────────────────────────────────────────────────────────
//! JSON model files: named parameter tensors plus an optional `config`
//! section holding per-model overrides of the ensemble options.
//!
//! ```json
//! {
//!   "params": { "unigram": { "shape": [1, 4], "values": [...] } },
//!   "config": { "type": "lm", "dim_vocabs": [4] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ensemble_types::{EnsembleError, EnsembleResult, Expr, ModelOverrides};

/// One stored parameter tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTensor {
    pub shape: [usize; 2],
    pub values: Vec<f32>,
}

impl ParamTensor {
    pub fn to_expr(&self) -> EnsembleResult<Expr> {
        Expr::new(self.shape[0], self.shape[1], self.values.clone())
    }
}

/// Parsed model file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub params: BTreeMap<String, ParamTensor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ModelOverrides>,
}

impl ModelFile {
    pub fn from_json(path: &Path, json: &str) -> EnsembleResult<Self> {
        serde_json::from_str(json).map_err(|e| EnsembleError::ModelFile {
            path: path.to_path_buf(),
            reason: format!("JSON parse error: {e}"),
        })
    }

    pub fn to_json(&self) -> EnsembleResult<String> {
        serde_json::to_string(self).map_err(|e| EnsembleError::Config(e.to_string()))
    }
}

/// Outcome of looking for per-model overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideLookup {
    Loaded(ModelOverrides),
    NotFound,
}

/// Read and parse a model file.
pub fn read_model_file(path: &Path) -> EnsembleResult<ModelFile> {
    let json = fs::read_to_string(path).map_err(|e| EnsembleError::ModelFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    ModelFile::from_json(path, &json)
}

/// Look up the overrides stored alongside a model's parameters.
///
/// A missing file or a file without a `config` section is `NotFound`;
/// an unreadable or malformed file is an error naming the path.
pub fn load_model_overrides(path: &Path) -> EnsembleResult<OverrideLookup> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(OverrideLookup::NotFound),
        Err(e) => {
            return Err(EnsembleError::ModelFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    Ok(match ModelFile::from_json(path, &json)?.config {
        Some(overrides) => OverrideLookup::Loaded(overrides),
        None => OverrideLookup::NotFound,
    })
}
