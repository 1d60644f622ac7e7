//! Error types for the training driver.

use thiserror::Error;

/// Errors surfaced by the optimizer.
///
/// A NaN or infinite gradient on a single parameter is *not* an error: the
/// update rule quarantines it locally. A NaN or infinite cost is fatal.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The model's declared lists (parameters, exclusions, inputs,
    /// properties, gradients) are inconsistent with each other.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// The data source produced no batch.
    #[error("data source exhausted at step {step}")]
    DataExhausted { step: usize },

    /// A batch did not line up with the model's declared inputs.
    #[error("batch mismatch: {0}")]
    BatchMismatch(String),

    /// The training cost came back NaN or infinite. Training halts; gradient
    /// and auxiliary state already committed this step are not rolled back.
    #[error("cost diverged at step {step}: cost = {cost}")]
    CostDiverged { step: usize, cost: f32 },
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrainError::CostDiverged { step: 12, cost: f32::NAN };
        assert!(err.to_string().contains("step 12"));

        let err = TrainError::DataExhausted { step: 3 };
        assert_eq!(err.to_string(), "data source exhausted at step 3");
    }
}
