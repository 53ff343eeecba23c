// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Score Vectors
// ─────────────────────────────────────────────────────────────────────

use std::sync::Arc;

use crate::error::{EnsembleError, EnsembleResult};

/// Replace a NaN score contribution with `-inf`.
///
/// Infinite values pass through unchanged: `-inf` is how a scorer bans a
/// token outright, and the beam search must see it as such.
#[inline]
pub fn sanitize_score(value: f32) -> f32 {
    if value.is_nan() {
        log::warn!("sanitize_score: NaN detected, treating as -inf");
        return f32::NEG_INFINITY;
    }
    value
}

/// Row-major `rows × cols` score matrix with shared storage.
///
/// Clones share the underlying buffer, so handing the same state back
/// from a step costs nothing and is observable via [`Expr::same_storage`].
/// Mutation goes through copy-on-write.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    rows: usize,
    cols: usize,
    values: Arc<Vec<f32>>,
}

impl Expr {
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> EnsembleResult<Self> {
        if values.len() != rows * cols {
            return Err(EnsembleError::Shape(format!(
                "expected {rows}x{cols} = {} values, got {}",
                rows * cols,
                values.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            values: Arc::new(values),
        })
    }

    /// Single-row vector.
    pub fn row(values: Vec<f32>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            values: Arc::new(values),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at flat index `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> f32 {
        self.values[i]
    }

    /// Borrow row `r` as a slice.
    pub fn row_slice(&self, r: usize) -> Option<&[f32]> {
        if r >= self.rows {
            return None;
        }
        Some(&self.values[r * self.cols..(r + 1) * self.cols])
    }

    /// Mutable access, detaching from any other holder of the buffer.
    pub fn values_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.values).as_mut_slice()
    }

    pub fn same_storage(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}
