//! One labelled training row.

use serde::{Deserialize, Serialize};

use rt_core::{DayKind, NodeKey};

/// A simulated origin–destination trip with its "real" travel time.
///
/// Field names on disk follow the dataset CSV header:
/// `orig,dest,dist_m,base_time_sec,time_real_sec,is_disruption_day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    #[serde(rename = "orig")]
    pub origin: NodeKey,
    #[serde(rename = "dest")]
    pub destination: NodeKey,
    /// Path length on the graph used for this day.
    #[serde(rename = "dist_m")]
    pub distance_m: f64,
    /// Uncorrected travel time on the same path.
    #[serde(rename = "base_time_sec")]
    pub base_time_s: f64,
    /// Label: base time with penalty and noise applied.
    #[serde(rename = "time_real_sec")]
    pub real_time_s: f64,
    #[serde(rename = "is_disruption_day")]
    pub day: DayKind,
}

impl TrainingExample {
    /// Ratio of the label to the base time (penalty × noise).
    pub fn slowdown(&self) -> f64 {
        self.real_time_s / self.base_time_s
    }
}
