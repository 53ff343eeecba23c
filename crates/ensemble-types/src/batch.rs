// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ensemble Kernel Source Batches
// ─────────────────────────────────────────────────────────────────────
//! Read-only view of a source batch as the scorers see it.
//!
//! Batch construction (tokenisation, padding, sorting) happens upstream;
//! scorers only need to know which vocabulary ids each field contains.

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Padding id.
pub const PAD_ID: usize = 0;
/// Unknown-word id.
pub const UNK_ID: usize = 1;
/// End-of-sequence id.
pub const EOS_ID: usize = 2;

/// One input stream of a batch, flattened to vocabulary ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBatch {
    indices: Vec<usize>,
}

impl SubBatch {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Vocabulary ids present in this field, padding included.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, id: usize) -> bool {
        self.indices.contains(&id)
    }
}

/// A set of source sequences split into per-stream fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusBatch {
    fields: Vec<SubBatch>,
    sentences: usize,
}

impl CorpusBatch {
    pub fn new(fields: Vec<SubBatch>, sentences: usize) -> Self {
        Self { fields, sentences }
    }

    pub fn get(&self, index: usize) -> Option<&SubBatch> {
        self.fields.get(index)
    }

    /// Number of fields (input streams).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of source sentences.
    pub fn size(&self) -> usize {
        self.sentences
    }
}

impl Index<usize> for CorpusBatch {
    type Output = SubBatch;

    fn index(&self, index: usize) -> &SubBatch {
        &self.fields[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let batch = CorpusBatch::new(
            vec![SubBatch::new(vec![5, 6, 2]), SubBatch::new(vec![7, 0])],
            1,
        );
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].indices(), &[7, 0]);
        assert!(batch.get(2).is_none());
        assert!(batch[0].contains(6));
        assert!(!batch[0].contains(UNK_ID));
    }
}
