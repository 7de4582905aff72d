//! The model's input vector.

use serde::{Deserialize, Serialize};

use rt_core::DayKind;
use rt_sim::TrainingExample;

use crate::{ModelError, ModelResult};

/// Number of columns in [`Features::to_array`].
pub const FEATURE_COUNT: usize = 3;

/// One feature vector, as fed to the forest.
pub type Row = [f64; FEATURE_COUNT];

/// Column names, in [`Features::to_array`] order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["dist_m", "base_time_sec", "is_disruption_day"];

/// One trip as seen by the model: route length, uncorrected time and the
/// day flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub distance_m:  f64,
    pub base_time_s: f64,
    pub day:         DayKind,
}

impl Features {
    pub fn new(distance_m: f64, base_time_s: f64, day: DayKind) -> Self {
        Self { distance_m, base_time_s, day }
    }

    pub fn from_example(example: &TrainingExample) -> Self {
        Self::new(example.distance_m, example.base_time_s, example.day)
    }

    /// Distance and base time must be finite and non-negative.
    pub fn validate(&self) -> ModelResult<()> {
        check(FEATURE_NAMES[0], self.distance_m)?;
        check(FEATURE_NAMES[1], self.base_time_s)
    }

    #[inline]
    pub fn to_array(&self) -> Row {
        [self.distance_m, self.base_time_s, self.day.feature()]
    }
}

fn check(name: &'static str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidFeature { name, value })
    }
}
