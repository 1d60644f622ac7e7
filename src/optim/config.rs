//! Training hyperparameter configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};

/// Hyperparameters for the RMSProp training driver.
///
/// Immutable after construction; the live learning rate the schedules mutate
/// is held by the optimizer itself, seeded from `lr` here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Initial learning rate.
    pub lr: f32,
    /// Intended minibatch size, recorded for bookkeeping and logging.
    pub batch_size: usize,
    /// Decay of the running mean and mean-square gradient estimates.
    pub decay: f32,
    /// Floor added under the centered second-moment estimate.
    pub eps: f32,
    /// Upper bound on the per-element adaptive learning-rate scale.
    pub max_lr_scale: f32,
    /// Global gradient-norm clip threshold; `None` disables clipping and the
    /// non-finite-norm quarantine with it.
    pub cutoff: Option<f32>,
    /// Scale the clip threshold by the leading-axis length of the first
    /// staged input.
    pub cutoff_rescale_length: bool,
    /// Momentum coefficient; `None` applies the raw adjusted gradient.
    /// Any positive finite value is accepted; `1.0` accumulates gradients
    /// without decay.
    pub moment: Option<f32>,
    /// Emit a log line every this many steps.
    pub train_freq: usize,
}

impl TrainingConfig {
    /// Configuration with the given learning rate and batch size, defaults
    /// elsewhere.
    pub fn new(lr: f32, batch_size: usize) -> Self {
        Self { lr, batch_size, ..Self::default() }
    }

    /// Set the running-estimate decay.
    #[must_use]
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    /// Set the second-moment floor.
    #[must_use]
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set the adaptive learning-rate cap.
    #[must_use]
    pub fn with_max_lr_scale(mut self, max_lr_scale: f32) -> Self {
        self.max_lr_scale = max_lr_scale;
        self
    }

    /// Enable gradient-norm clipping at the given threshold.
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Scale the clip threshold by the staged leading-axis length.
    #[must_use]
    pub fn with_cutoff_rescale_length(mut self, rescale: bool) -> Self {
        self.cutoff_rescale_length = rescale;
        self
    }

    /// Enable momentum accumulation with the given coefficient.
    #[must_use]
    pub fn with_moment(mut self, moment: f32) -> Self {
        self.moment = Some(moment);
        self
    }

    /// Set the logging cadence.
    #[must_use]
    pub fn with_train_freq(mut self, train_freq: usize) -> Self {
        self.train_freq = train_freq;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(TrainError::InvalidConfig("lr must be positive and finite".to_string()));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(TrainError::InvalidConfig("decay must be in [0, 1)".to_string()));
        }
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(TrainError::InvalidConfig("eps must be positive and finite".to_string()));
        }
        if !self.max_lr_scale.is_finite() || self.max_lr_scale <= 0.0 {
            return Err(TrainError::InvalidConfig(
                "max_lr_scale must be positive and finite".to_string(),
            ));
        }
        if let Some(cutoff) = self.cutoff {
            if !cutoff.is_finite() || cutoff <= 0.0 {
                return Err(TrainError::InvalidConfig(
                    "cutoff must be positive and finite".to_string(),
                ));
            }
        }
        if let Some(moment) = self.moment {
            if !moment.is_finite() || moment <= 0.0 {
                return Err(TrainError::InvalidConfig(
                    "moment must be positive and finite".to_string(),
                ));
            }
        }
        if self.train_freq == 0 {
            return Err(TrainError::InvalidConfig("train_freq must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            batch_size: 64,
            decay: 0.95,
            eps: 1e-7,
            max_lr_scale: 5.0,
            cutoff: None,
            cutoff_rescale_length: false,
            moment: None,
            train_freq: 1,
        }
    }
}
