use std::fmt;

use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loading,
    Enriching,
    Filtering,
    Aggregating,
    Exporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Enriching => "enriching",
            Self::Filtering => "filtering",
            Self::Aggregating => "aggregating",
            Self::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

/// Events emitted by the pipeline as it moves through its stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { stage: Stage, message: String },
    Finished { stage: Stage, rows: usize },
    Failed { stage: Stage, error: String },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for tests and library callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Forwards pipeline events to `tracing`.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { stage, message } => info!(%stage, "{}", message),
            ProgressEvent::Finished { stage, rows } => info!(%stage, rows, "Stage finished"),
            ProgressEvent::Failed { stage, error } => error!(%stage, %error, "Stage failed"),
        }
    }
}
