pub mod config;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter, Stage};
pub use runner::{Dataset, Pipeline};
