//! Batches and data sources.

use ndarray::ArrayD;

/// A minibatch as named fields.
///
/// Sources normalize whatever layout they read (positional tuples, maps)
/// into named fields here; the optimizer matches fields to model inputs by
/// name and never branches on batch representation.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    fields: Vec<(String, ArrayD<f32>)>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, values: ArrayD<f32>) -> Self {
        self.insert(name, values);
        self
    }

    /// Add or replace a named field.
    pub fn insert(&mut self, name: impl Into<String>, values: ArrayD<f32>) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = values;
        } else {
            self.fields.push((name, values));
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Mutable lookup, for perturbation hooks.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ArrayD<f32>> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the batch has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

/// Produces minibatches for the optimizer.
///
/// May be finite or infinite; restart policy, if any, belongs to the
/// implementation. The optimizer treats exhaustion as fatal.
pub trait DataSource {
    /// Next minibatch, or `None` when exhausted.
    fn next_batch(&mut self) -> Option<Batch>;
}

/// In-memory data source over a fixed set of batches.
pub struct MemorySource {
    batches: Vec<Batch>,
    cursor: usize,
    cycle: bool,
}

impl MemorySource {
    /// Source that yields each batch once, in order, then exhausts.
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches, cursor: 0, cycle: false }
    }

    /// Source that cycles over the batches forever.
    pub fn cycling(batches: Vec<Batch>) -> Self {
        Self { batches, cursor: 0, cycle: true }
    }
}

impl DataSource for MemorySource {
    fn next_batch(&mut self) -> Option<Batch> {
        if self.batches.is_empty() {
            return None;
        }
        if self.cursor >= self.batches.len() {
            if !self.cycle {
                return None;
            }
            self.cursor = 0;
        }
        let batch = self.batches[self.cursor].clone();
        self.cursor += 1;
        Some(batch)
    }
}
