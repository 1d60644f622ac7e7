//! Learning-rate schedules.
//!
//! A [`Schedule`](crate::model::Schedule) runs once per step between the
//! gradient and apply passes. The constructors here cover the common cases;
//! models are free to return their own closures instead.

use crate::model::Schedule;

/// Mutable hyperparameter view handed to schedule callbacks.
///
/// `lr` is the live learning rate the apply pass will use; `step` is the
/// number of completed steps before the current one.
#[derive(Clone, Debug)]
pub struct Hyper {
    /// Current learning rate.
    pub lr: f32,
    /// Index of the step being executed.
    pub step: usize,
}

/// Multiply the learning rate by `factor` every `every` steps.
pub fn step_decay(every: usize, factor: f32) -> Schedule {
    assert!(every > 0, "step_decay interval must be positive");
    Box::new(move |hyper, _cost| {
        if hyper.step > 0 && hyper.step % every == 0 {
            hyper.lr *= factor;
        }
    })
}

/// Halve the learning rate after `patience` consecutive steps without a new
/// best cost.
pub fn halve_on_cost_increase(patience: usize) -> Schedule {
    assert!(patience > 0, "patience must be positive");
    let mut best = f32::INFINITY;
    let mut bad_steps = 0usize;
    Box::new(move |hyper, cost| {
        if cost < best {
            best = cost;
            bad_steps = 0;
        } else {
            bad_steps += 1;
            if bad_steps >= patience {
                hyper.lr *= 0.5;
                bad_steps = 0;
            }
        }
    })
}
