//! RMSProp training driver with Nesterov-style momentum.
//!
//! `descenso` drives gradient-descent training of a model defined elsewhere.
//! The model exposes its parameters and an eager gradient pass behind the
//! [`Model`] trait, a [`DataSource`] produces minibatches, and [`RmsProp`]
//! owns the per-parameter running statistics and the step protocol: clip the
//! global gradient norm, quarantine non-finite batches, adapt each element's
//! learning rate from a centered second-moment estimate, optionally
//! accumulate momentum, and apply the update in place.
//!
//! ```no_run
//! use descenso::{MemorySource, RmsProp, TrainingConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! # fn model() -> Box<dyn descenso::Model> { unimplemented!() }
//! # fn batches() -> Vec<descenso::Batch> { unimplemented!() }
//!
//! # fn main() -> descenso::Result<()> {
//! let config = TrainingConfig::new(0.01, 64).with_cutoff(1.0).with_moment(0.9);
//! let data = Box::new(MemorySource::cycling(batches()));
//! let rng = Box::new(StdRng::seed_from_u64(42));
//!
//! let mut optimizer = RmsProp::new(model(), data, config, rng)?;
//! for _ in 0..100 {
//!     let metrics = optimizer.step()?;
//!     let _ = (metrics.cost, metrics.lr);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Each `step` call is synchronous and blocking; the optimizer has no
//! internal concurrency and is the sole writer of parameter and auxiliary
//! state during a step.

pub mod data;
pub mod error;
pub mod model;
pub mod optim;
pub mod tensor;

pub use data::{Batch, DataSource, MemorySource};
pub use error::{Result, TrainError};
pub use model::{DType, Evaluation, InputSpec, Model, Schedule};
pub use optim::{
    format_duration, halve_on_cost_increase, step_decay, GradientState, Hyper, RmsProp,
    StagedInput, StepMetrics, TrainingConfig,
};
pub use tensor::{Parameter, Tensor};
