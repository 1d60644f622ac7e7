//! Optimizer-owned per-parameter and per-input state.

use ndarray::{Array1, ArrayD, IxDyn};

use crate::error::{Result, TrainError};
use crate::model::InputSpec;

/// Running gradient statistics for one active parameter.
///
/// All three buffers share the parameter's shape, start at zero when the
/// optimizer is constructed and are committed on every step.
#[derive(Clone, Debug)]
pub struct GradientState {
    /// Momentum-accumulated gradient (the raw gradient when momentum is off).
    pub momentum_grad: Array1<f32>,
    /// Running mean of the gradient.
    pub mean_grad: Array1<f32>,
    /// Running mean of the squared gradient.
    pub mean_sq_grad: Array1<f32>,
}

impl GradientState {
    /// Zero-initialized state for a parameter of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            momentum_grad: Array1::zeros(len),
            mean_grad: Array1::zeros(len),
            mean_sq_grad: Array1::zeros(len),
        }
    }

    /// Number of elements in each buffer.
    pub fn len(&self) -> usize {
        self.momentum_grad.len()
    }

    /// Whether the buffers hold no elements.
    pub fn is_empty(&self) -> bool {
        self.momentum_grad.is_empty()
    }
}

/// Staging buffer for one model input.
///
/// Holds the current minibatch's values for the batch field of the same
/// name. Starts at a minimal placeholder shape (2 along every axis) and is
/// overwritten on every step.
#[derive(Clone, Debug)]
pub struct StagedInput {
    spec: InputSpec,
    values: ArrayD<f32>,
}

impl StagedInput {
    /// Placeholder buffer for an input declaration, shaped `[2; rank]`.
    pub fn placeholder(spec: InputSpec) -> Self {
        let values = ArrayD::zeros(IxDyn(&vec![2; spec.rank]));
        Self { spec, values }
    }

    /// The input's name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The input declaration this buffer mirrors.
    pub fn spec(&self) -> &InputSpec {
        &self.spec
    }

    /// The currently staged values.
    pub fn values(&self) -> &ArrayD<f32> {
        &self.values
    }

    /// Length of the leading axis, used by length-rescaled norm clipping.
    pub fn leading_dim(&self) -> usize {
        self.values.shape().first().copied().unwrap_or(1)
    }

    /// Overwrite the buffer with the batch's values for this input.
    pub(crate) fn stage(&mut self, values: &ArrayD<f32>) -> Result<()> {
        if values.ndim() != self.spec.rank {
            return Err(TrainError::BatchMismatch(format!(
                "input '{}' has rank {}, batch field has rank {}",
                self.spec.name,
                self.spec.rank,
                values.ndim()
            )));
        }
        self.values = values.clone();
        Ok(())
    }
}
