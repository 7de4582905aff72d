//! `rt-sim` — synthetic travel-time dataset generation.
//!
//! Draws origin/destination pairs near a sampling center, routes each pair
//! on the normal network or, on simulated disruption days, on the
//! restricted network, and labels the trip with a penalized, noisy "real"
//! travel time.  The result is the training corpus for `rt-model`.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rt_core::SimRng;
//! use rt_sim::SimulatorBuilder;
//!
//! let sim = SimulatorBuilder::new().n_pairs(300).build()?;
//! let report = sim.simulate(&base, &restricted, Some(center), &mut SimRng::new(42))?;
//! rt_sim::write_examples(Path::new("dataset.csv"), &report.examples)?;
//! ```

pub mod builder;
pub mod dataset;
pub mod error;
pub mod example;
pub mod observer;
pub mod sampler;
pub mod simulator;


pub use builder::SimulatorBuilder;
pub use dataset::{read_examples, read_examples_from, write_examples, write_examples_to};
pub use error::{SimError, SimResult};
pub use example::TrainingExample;
pub use observer::{NoopObserver, Rejection, SimObserver};
pub use sampler::pick_sample_nodes;
pub use simulator::{SimulationReport, Simulator};
