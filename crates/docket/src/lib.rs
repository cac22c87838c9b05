pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod source;

pub use config::{load_config, Config};
pub use enrich::{EnrichedTask, Enricher, ForecastBucket, Status};
pub use error::{ConfigError, DocketError, ExportError, LoadError, Result};
pub use filter::{FilterSelection, StatusChoice};
pub use pipeline::{Dataset, Pipeline, PipelineConfig};
pub use report::DashboardReport;
pub use source::{load_table, Cell, Table, Task};
