//! Test harness for isolated pipeline runs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use docket::pipeline::NoopProgress;
use docket::{Config, Dataset, Pipeline, PipelineConfig};

use super::builders::TaskSheetBuilder;

/// Temporary directory holding the task spreadsheet and any exported files.
pub struct TestHarness {
    temp_dir: TempDir,
    pub source: PathBuf,
    pub config: Config,
}

impl TestHarness {
    /// Writes `sheet` to a temp dir and points a default config at it.
    pub fn with_sheet(sheet: &TaskSheetBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("tarefas.xlsx");
        sheet.write(&source);

        let config = Config {
            source: source.to_string_lossy().into_owned(),
            ..Config::default()
        };

        Self {
            temp_dir,
            source,
            config,
        }
    }

    /// Path inside the harness directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn pipeline(&self) -> Pipeline {
        let config = PipelineConfig::from_config(&self.config).expect("Invalid test config");
        Pipeline::from_config(Arc::new(config))
    }

    /// Builds the pipeline and loads the sheet.
    pub fn load(&self) -> (Pipeline, Dataset) {
        let pipeline = self.pipeline();
        let dataset = pipeline.load(&NoopProgress).expect("Failed to load dataset");
        (pipeline, dataset)
    }
}
