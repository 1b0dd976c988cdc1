pub mod catalog;
pub mod ingest;
pub mod scheduler;

pub use catalog::scan;
pub use ingest::{generate_data, sweep_sources, Ingestor};
pub use scheduler::{run_batch, FilterTask, TaskOutcome};

pub use topograph_core::{Result, TopographError};
