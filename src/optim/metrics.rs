//! Per-step metrics and log formatting.

use serde::Serialize;

/// Metrics returned by every optimizer step.
#[derive(Clone, Debug, Serialize)]
pub struct StepMetrics {
    /// Scalar training cost for the step's batch.
    pub cost: f32,
    /// Mirrors `cost`; kept as its own field for consumers that track error
    /// and cost separately.
    pub error: f32,
    /// Duration of the gradient and apply passes, in seconds.
    pub step_time: f64,
    /// Wall time since the optimizer was constructed, in seconds.
    pub whole_time: f64,
    /// Learning rate after this step's schedules ran.
    pub lr: f32,
    /// Named property values in the model's declared order.
    pub properties: Vec<(String, f32)>,
}

impl StepMetrics {
    /// Look up a named property value.
    pub fn property(&self, name: &str) -> Option<f32> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// Render a duration in seconds as a compact human-readable string.
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let minutes = (secs / 60.0).floor();
        format!("{}m{:.0}s", minutes, secs - minutes * 60.0)
    } else {
        let hours = (secs / 3600.0).floor();
        let minutes = ((secs - hours * 3600.0) / 60.0).floor();
        format!("{hours}h{minutes}m")
    }
}
