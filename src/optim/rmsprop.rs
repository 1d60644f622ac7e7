//! RMSProp with Nesterov-style momentum, norm clipping and NaN quarantine.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Instant;

use ndarray::Array1;
use rand::RngCore;

use crate::data::{Batch, DataSource};
use crate::error::{Result, TrainError};
use crate::model::{Evaluation, Model, Schedule};
use crate::optim::config::TrainingConfig;
use crate::optim::metrics::{format_duration, StepMetrics};
use crate::optim::schedule::Hyper;
use crate::optim::state::{GradientState, StagedInput};
use crate::tensor::Parameter;

/// Factor applied to a parameter's value when the global gradient norm is
/// not finite and the gradient is replaced wholesale.
const NONFINITE_FALLBACK: f32 = 0.1;

/// RMSProp training driver.
///
/// Owns the per-parameter running statistics and the staged input buffers,
/// and executes the step protocol: fetch batch, perturb, stage, gradient
/// pass, schedules, apply pass, cost check, log.
///
/// Single-threaded and blocking: each [`step`](RmsProp::step) call runs the
/// whole protocol before returning, and nothing else may write the
/// parameters while it does.
pub struct RmsProp {
    model: Box<dyn Model>,
    data: Box<dyn DataSource>,
    config: TrainingConfig,
    rng: Box<dyn RngCore>,
    hyper: Hyper,
    /// Full declared parameter list, in model order.
    params: Vec<Parameter>,
    /// Indices into `params` of the parameters this optimizer updates.
    active: Vec<usize>,
    /// Per-active flag: participates in the gradient norm and its clipping.
    in_norm: Vec<bool>,
    /// Running statistics, aligned with `active`.
    state: Vec<GradientState>,
    /// Staging buffers, aligned with the model's input list.
    staged: Vec<StagedInput>,
    schedules: Vec<Schedule>,
    property_names: Vec<String>,
    auxiliary_count: usize,
    step: usize,
    started: Instant,
}

impl RmsProp {
    /// Build an optimizer around a model and a data source.
    ///
    /// Fails with [`TrainError::InvalidConfig`] if the hyperparameters are
    /// out of range or the model's declarations are inconsistent (duplicate
    /// names, exclusion entries that resolve to no parameter). Cardinality
    /// of the per-step evaluation is checked on every gradient pass.
    pub fn new(
        mut model: Box<dyn Model>,
        data: Box<dyn DataSource>,
        config: TrainingConfig,
        rng: Box<dyn RngCore>,
    ) -> Result<Self> {
        config.validate()?;

        let params = model.parameters();
        ensure_unique("parameter", params.iter().map(Parameter::name))?;

        let excluded = resolve_names(&params, &model.excluded(), "excluded")?;
        let norm_exempt = resolve_names(&params, &model.excluded_from_norm(), "excluded-from-norm")?;

        let active: Vec<usize> = (0..params.len()).filter(|i| !excluded.contains(i)).collect();
        let in_norm: Vec<bool> = active.iter().map(|i| !norm_exempt.contains(i)).collect();
        let state: Vec<GradientState> =
            active.iter().map(|&i| GradientState::zeros(params[i].len())).collect();

        let inputs = model.inputs();
        ensure_unique("input", inputs.iter().map(|spec| spec.name.as_str()))?;
        let staged: Vec<StagedInput> = inputs.into_iter().map(StagedInput::placeholder).collect();

        let property_names = model.property_names();
        ensure_unique("property", property_names.iter().map(String::as_str))?;
        let auxiliary_count = model.auxiliary_count();
        let schedules = model.schedules();

        let device_resident = params.iter().filter(|p| p.is_device_resident()).count();
        log::info!(
            "rmsprop: {} parameters ({} active, {} device-resident), lr {:.2e}, decay {}, bs {}",
            params.len(),
            active.len(),
            device_resident,
            config.lr,
            config.decay,
            config.batch_size,
        );

        let hyper = Hyper { lr: config.lr, step: 0 };
        Ok(Self {
            model,
            data,
            config,
            rng,
            hyper,
            params,
            active,
            in_norm,
            state,
            staged,
            schedules,
            property_names,
            auxiliary_count,
            step: 0,
            started: Instant::now(),
        })
    }

    /// Run one training step and return its metrics.
    ///
    /// The cost check runs after the apply pass, matching the step protocol;
    /// on [`TrainError::CostDiverged`] the gradient state, auxiliary state
    /// and parameter values committed this step are left in place.
    pub fn step(&mut self) -> Result<StepMetrics> {
        let batch =
            self.data.next_batch().ok_or(TrainError::DataExhausted { step: self.step })?;
        let batch = self.model.perturb(batch, self.rng.as_mut());
        self.stage(&batch)?;

        let pass_started = Instant::now();
        let eval = self.model.evaluate(&self.staged);
        self.check_evaluation(&eval)?;

        let effective = self.adjust_gradients(&eval.gradients);
        self.model.commit_auxiliary(&eval.auxiliary);

        self.hyper.step = self.step;
        for schedule in self.schedules.iter_mut() {
            schedule(&mut self.hyper, eval.cost);
        }

        self.apply(&effective);

        let step_time = pass_started.elapsed().as_secs_f64();
        let whole_time = self.started.elapsed().as_secs_f64();

        if !eval.cost.is_finite() {
            return Err(TrainError::CostDiverged { step: self.step, cost: eval.cost });
        }

        let properties: Vec<(String, f32)> = self
            .property_names
            .iter()
            .cloned()
            .zip(eval.properties.iter().copied())
            .collect();

        if log_due(self.step, self.config.train_freq) {
            self.log_step(eval.cost, &properties, step_time, whole_time);
        }

        self.step += 1;

        Ok(StepMetrics {
            cost: eval.cost,
            error: eval.cost,
            step_time,
            whole_time,
            lr: self.hyper.lr,
            properties,
        })
    }

    /// Current learning rate.
    pub fn lr(&self) -> f32 {
        self.hyper.lr
    }

    /// Set the learning rate (checkpoint resume, external schedules).
    pub fn set_lr(&mut self, lr: f32) {
        self.hyper.lr = lr;
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Set the step counter (checkpoint resume).
    pub fn set_step_count(&mut self, step: usize) {
        self.step = step;
    }

    /// The configuration this optimizer was built with.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The full declared parameter list, in model order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// Running statistics, aligned with the active-parameter list.
    pub fn gradient_states(&self) -> &[GradientState] {
        &self.state
    }

    /// Restore the running statistics for one active parameter.
    pub fn set_gradient_state(&mut self, slot: usize, state: GradientState) -> Result<()> {
        let expected = self
            .state
            .get(slot)
            .ok_or_else(|| {
                TrainError::InvalidConfig(format!("no active parameter at slot {slot}"))
            })?
            .len();
        if state.len() != expected {
            return Err(TrainError::InvalidConfig(format!(
                "gradient state for slot {slot} has length {}, expected {expected}",
                state.len()
            )));
        }
        self.state[slot] = state;
        Ok(())
    }

    /// The staging buffers, aligned with the model's input list.
    pub fn staged_inputs(&self) -> &[StagedInput] {
        &self.staged
    }

    /// Copy the batch's fields into the staging buffers, matched by name.
    fn stage(&mut self, batch: &Batch) -> Result<()> {
        for staged in &mut self.staged {
            let values = batch.get(staged.name()).ok_or_else(|| {
                TrainError::BatchMismatch(format!("batch is missing input '{}'", staged.name()))
            })?;
            staged.stage(values)?;
        }
        Ok(())
    }

    /// Check an evaluation's cardinality and gradient shapes against the
    /// model's declarations.
    fn check_evaluation(&self, eval: &Evaluation) -> Result<()> {
        if eval.gradients.len() != self.params.len() {
            return Err(TrainError::InvalidConfig(format!(
                "model declared {} parameters but produced {} gradients",
                self.params.len(),
                eval.gradients.len()
            )));
        }
        if eval.auxiliary.len() != self.auxiliary_count {
            return Err(TrainError::InvalidConfig(format!(
                "model declared {} auxiliary rules but produced {} values",
                self.auxiliary_count,
                eval.auxiliary.len()
            )));
        }
        if eval.properties.len() != self.property_names.len() {
            return Err(TrainError::InvalidConfig(format!(
                "model declared {} properties but produced {} values",
                self.property_names.len(),
                eval.properties.len()
            )));
        }
        for (param, grad) in self.params.iter().zip(&eval.gradients) {
            if grad.len() != param.len() {
                return Err(TrainError::InvalidConfig(format!(
                    "gradient for '{}' has length {}, parameter has {}",
                    param.name(),
                    grad.len(),
                    param.len()
                )));
            }
        }
        Ok(())
    }

    /// Clip, adapt and accumulate the raw gradients; commits the running
    /// statistics as a side effect. Returns the effective gradients the
    /// apply pass subtracts, aligned with the active-parameter list.
    fn adjust_gradients(&mut self, gradients: &[Array1<f32>]) -> Vec<Array1<f32>> {
        let decay = self.config.decay;
        let eps = self.config.eps;
        let max_lr_scale = self.config.max_lr_scale;

        let mut norm_sq = 0.0f32;
        for (slot, &i) in self.active.iter().enumerate() {
            if self.in_norm[slot] {
                norm_sq += gradients[i].iter().map(|g| g * g).sum::<f32>();
            }
        }
        let norm_gs = norm_sq.sqrt();
        let nonfinite = !norm_gs.is_finite();

        let threshold = self.config.cutoff.map(|cutoff| {
            if self.config.cutoff_rescale_length {
                cutoff * self.staged.first().map_or(1.0, |s| s.leading_dim() as f32)
            } else {
                cutoff
            }
        });

        let mut effective = Vec::with_capacity(self.active.len());
        for (slot, &i) in self.active.iter().enumerate() {
            let mut grad = gradients[i].clone();

            if let Some(c) = threshold {
                if self.in_norm[slot] {
                    if norm_gs >= c {
                        grad *= c / norm_gs;
                    }
                    if nonfinite {
                        grad = &*self.params[i].value().data() * NONFINITE_FALLBACK;
                    }
                }
            }

            let state = &mut self.state[slot];
            let mean = &state.mean_grad * decay + &grad * (1.0 - decay);
            let sq = &state.mean_sq_grad * decay + (&grad * &grad) * (1.0 - decay);
            let rms = (&sq - &(&mean * &mean) + eps).mapv(f32::sqrt);
            let adaptive = rms.mapv(|r| (1.0 / r).min(max_lr_scale));

            let momentum = match self.config.moment {
                Some(m) => &state.momentum_grad * m + &grad,
                None => grad,
            };
            effective.push(&momentum * &adaptive);

            state.momentum_grad = momentum;
            state.mean_grad = mean;
            state.mean_sq_grad = sq;
        }
        effective
    }

    /// Subtract `lr * effective` from every active parameter, in place.
    fn apply(&mut self, effective: &[Array1<f32>]) {
        let lr = self.hyper.lr;
        for (slot, &i) in self.active.iter().enumerate() {
            let mut value = self.params[i].value().data_mut();
            value.zip_mut_with(&effective[slot], |v, g| *v -= lr * g);
        }
    }

    fn log_step(&self, cost: f32, properties: &[(String, f32)], step_time: f64, whole_time: f64) {
        let mut line = format!("iter {:>4} cost {:.3}", self.step, cost);
        for (name, value) in properties {
            let _ = write!(line, " {name} {value:.2e}");
        }
        let _ = write!(
            line,
            " step time {} whole time {} lr {:.2e}",
            format_duration(step_time),
            format_duration(whole_time),
            self.hyper.lr
        );
        log::info!("{line}");
    }
}

/// Whether the per-step log line is due at the given cadence.
fn log_due(step: usize, train_freq: usize) -> bool {
    step % train_freq == 0
}

fn ensure_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TrainError::InvalidConfig(format!("duplicate {kind} name '{name}'")));
        }
    }
    Ok(())
}

/// Resolve a list of names from an exclusion set to parameter indices.
fn resolve_names(params: &[Parameter], names: &[String], kind: &str) -> Result<HashSet<usize>> {
    let mut indices = HashSet::new();
    for name in names {
        let index = params
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| {
                TrainError::InvalidConfig(format!(
                    "{kind} set names unknown parameter '{name}'"
                ))
            })?;
        indices.insert(index);
    }
    Ok(indices)
}
