//! The model-side contract the optimizer drives.

use ndarray::Array1;
use rand::RngCore;

use crate::data::Batch;
use crate::optim::{Hyper, StagedInput};
use crate::tensor::Parameter;

/// Element type of a model input, recorded on the input declaration.
///
/// Staged values are stored as `f32` regardless; integer inputs carry exact
/// values up to 2^24.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    I64,
}

/// Declaration of one model input.
#[derive(Clone, Debug)]
pub struct InputSpec {
    /// Field name, matched against batch fields.
    pub name: String,
    /// Element type of the values the model expects.
    pub dtype: DType,
    /// Number of axes of a staged value.
    pub rank: usize,
}

impl InputSpec {
    /// Declare an input.
    pub fn new(name: impl Into<String>, dtype: DType, rank: usize) -> Self {
        Self { name: name.into(), dtype, rank }
    }
}

/// One gradient pass worth of model outputs.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Raw gradients aligned with the full declared parameter list.
    ///
    /// Gradients for excluded parameters are still produced and
    /// cardinality-checked; the optimizer just never applies them.
    pub gradients: Vec<Array1<f32>>,
    /// New values for the model's auxiliary update rules.
    pub auxiliary: Vec<Array1<f32>>,
    /// Values for the model's named properties, in declaration order.
    pub properties: Vec<f32>,
    /// Scalar training cost.
    pub cost: f32,
}

/// A schedule callback.
///
/// Runs once per step between the gradient and apply passes with the current
/// cost; mutating [`Hyper::lr`] here is the sanctioned way for learning-rate
/// schedules to adapt state between steps.
pub type Schedule = Box<dyn FnMut(&mut Hyper, f32) + Send>;

/// Contract between the optimizer and the thing being trained.
///
/// Ordering matters: `parameters()` fixes the parameter order at optimizer
/// construction, and every `evaluate` call must return gradients in that
/// order. The same holds for `inputs()` and staged buffers.
pub trait Model {
    /// Ordered trainable parameters. Called once, at optimizer construction.
    fn parameters(&self) -> Vec<Parameter>;

    /// Names of parameters the optimizer must never update.
    fn excluded(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of parameters exempt from norm clipping. Still updated.
    fn excluded_from_norm(&self) -> Vec<String> {
        Vec::new()
    }

    /// Ordered input declarations; staged buffers mirror this list.
    fn inputs(&self) -> Vec<InputSpec>;

    /// Names of the scalar properties every evaluation reports.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Number of auxiliary update rules every evaluation reports.
    fn auxiliary_count(&self) -> usize {
        0
    }

    /// Data augmentation hook; runs on the raw batch before staging.
    fn perturb(&mut self, batch: Batch, _rng: &mut dyn RngCore) -> Batch {
        batch
    }

    /// Gradient pass: cost, per-parameter gradients, auxiliary rule values
    /// and property values for the currently staged inputs.
    fn evaluate(&mut self, staged: &[StagedInput]) -> Evaluation;

    /// Commit auxiliary rule values produced by `evaluate`.
    fn commit_auxiliary(&mut self, _values: &[Array1<f32>]) {}

    /// Schedule callbacks, fetched once at optimizer construction.
    fn schedules(&mut self) -> Vec<Schedule> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_spec() {
        let spec = InputSpec::new("tokens", DType::I64, 2);
        assert_eq!(spec.name, "tokens");
        assert_eq!(spec.dtype, DType::I64);
        assert_eq!(spec.rank, 2);
    }
}
