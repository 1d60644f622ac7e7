//! The optimizer: configuration, per-parameter state, update rule and step
//! protocol.

mod config;
mod metrics;
mod rmsprop;
mod schedule;
mod state;

pub use config::TrainingConfig;
pub use metrics::{format_duration, StepMetrics};
pub use rmsprop::RmsProp;
pub use schedule::{halve_on_cost_increase, step_decay, Hyper};
pub use state::{GradientState, StagedInput};
