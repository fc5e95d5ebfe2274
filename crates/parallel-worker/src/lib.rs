//! Parallel worker scenario filter.
//!
//! Splits a Gherkin suite between N independent processes. Worker `i` keeps
//! the scenarios (and outline example rows) whose global position `p`
//! satisfies `p % N == i`:
//!
//! ```text
//!   units:     A   B   C   D   E
//!   worker 0:  A       C       E
//!   worker 1:      B       D
//! ```

pub mod config;
pub mod filter;

pub use config::WorkerConfig;
pub use filter::{schedulable_units, FeatureFilter, ParallelWorkerFilter, SchedulableUnit};
pub use stepkit_core::{Result, StepKitError};
