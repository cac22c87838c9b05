use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::info_span;

use crate::enrich::{EnrichedTask, Enricher};
use crate::error::{DocketError, ExportError, LoadError};
use crate::export::{self, ReportLayout};
use crate::filter::FilterSelection;
use crate::report::{map, DashboardReport};
use crate::sanitize;
use crate::source::{self, Table, TaskTable};

use super::config::PipelineConfig;
use super::progress::{ProgressEvent, ProgressReporter, Stage};

/// The enriched, unfiltered table of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub deadline_column: usize,
    pub tasks: Vec<EnrichedTask>,
}

impl Dataset {
    /// Every status, user and sector observed in the table.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection::all_of(&self.tasks)
    }

    pub fn filter(&self, selection: &FilterSelection) -> Vec<EnrichedTask> {
        selection.apply(&self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Load → enrich → filter → aggregate/export.
///
/// Every stage is a pure function of the source, the reference date and the
/// filter selection, so callers may rerun any stage as often as they like.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    enricher: Enricher,
}

impl Pipeline {
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let enricher = Enricher::new(config.reference_date, &config.date_formats);
        Self { config, enricher }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Reads the configured source and enriches it. Any load failure halts
    /// the run.
    pub fn load(&self, progress: &dyn ProgressReporter) -> Result<Dataset, DocketError> {
        let _pipeline_span = info_span!("pipeline",
            source = %sanitize::redact_path(&self.config.source),
            reference_date = %self.config.reference_date,
        )
        .entered();

        let task_table = {
            let _step = info_span!("load").entered();
            progress.report(ProgressEvent::Started {
                stage: Stage::Loading,
                message: "Reading task spreadsheet...".to_string(),
            });
            let loaded = source::load_table(&self.config.source, self.config.sheet.as_deref())
                .and_then(|table| table.into_tasks(&self.config.columns));
            match loaded {
                Ok(task_table) => {
                    progress.report(ProgressEvent::Finished {
                        stage: Stage::Loading,
                        rows: task_table.tasks.len(),
                    });
                    task_table
                }
                Err(e) => {
                    progress.report(ProgressEvent::Failed {
                        stage: Stage::Loading,
                        error: e.to_string(),
                    });
                    return Err(e.into());
                }
            }
        };

        let _step = info_span!("enrich").entered();
        progress.report(ProgressEvent::Started {
            stage: Stage::Enriching,
            message: "Deriving deadline status...".to_string(),
        });
        let dataset = self.enrich_tasks(task_table);
        progress.report(ProgressEvent::Finished {
            stage: Stage::Enriching,
            rows: dataset.len(),
        });
        Ok(dataset)
    }

    /// Maps columns and derives status for an already loaded table.
    pub fn enrich_table(&self, table: Table) -> Result<Dataset, LoadError> {
        let task_table = table.into_tasks(&self.config.columns)?;
        Ok(self.enrich_tasks(task_table))
    }

    fn enrich_tasks(&self, task_table: TaskTable) -> Dataset {
        Dataset {
            tasks: self.enricher.enrich(&task_table.tasks),
            columns: task_table.columns,
            deadline_column: task_table.deadline_column,
        }
    }

    pub fn report(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
        progress: &dyn ProgressReporter,
    ) -> DashboardReport {
        let filtered = self.filter(dataset, selection, progress);

        let _step = info_span!("aggregate").entered();
        progress.report(ProgressEvent::Started {
            stage: Stage::Aggregating,
            message: "Computing dashboard figures...".to_string(),
        });
        let report = DashboardReport::build(
            &dataset.tasks,
            &filtered,
            selection,
            self.config.reference_date,
            &self.config.sectors,
            self.config.top_n,
        );
        progress.report(ProgressEvent::Finished {
            stage: Stage::Aggregating,
            rows: report.filtered_tasks,
        });
        report
    }

    /// Report workbook as bytes, ready to be offered for download.
    pub fn export_bytes(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
    ) -> Result<Vec<u8>, ExportError> {
        let filtered = selection.apply(&dataset.tasks);
        export::report_workbook_bytes(
            &self.layout(dataset),
            &filtered,
            &dataset.tasks,
            self.config.top_n,
        )
    }

    /// Writes the report workbook to `path`.
    pub fn export(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<PathBuf, DocketError> {
        let filtered = self.filter(dataset, selection, progress);

        let _step = info_span!("export").entered();
        progress.report(ProgressEvent::Started {
            stage: Stage::Exporting,
            message: "Writing report workbook...".to_string(),
        });
        let result = export::write_report(
            path,
            &self.layout(dataset),
            &filtered,
            &dataset.tasks,
            self.config.top_n,
        );
        match result {
            Ok(written) => {
                progress.report(ProgressEvent::Finished {
                    stage: Stage::Exporting,
                    rows: filtered.len(),
                });
                Ok(written)
            }
            Err(e) => {
                progress.report(ProgressEvent::Failed {
                    stage: Stage::Exporting,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// GeoJSON of the sector markers for the filtered view.
    pub fn map(&self, dataset: &Dataset, selection: &FilterSelection) -> Value {
        let filtered = selection.apply(&dataset.tasks);
        let counts = crate::report::counts_by_sector(&filtered);
        let markers = map::sector_markers(&counts, &self.config.sectors);
        map::to_geojson(&markers, &self.config.map)
    }

    /// Writes the sector map GeoJSON to `path`.
    pub fn export_map(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
        path: &Path,
    ) -> Result<PathBuf, DocketError> {
        let _step = info_span!("export_map", file = %sanitize::redact_path(path)).entered();
        let geojson = self.map(dataset, selection);
        let bytes = serde_json::to_vec_pretty(&geojson).map_err(ExportError::from)?;
        export::write_file(path, &bytes)?;
        Ok(path.to_path_buf())
    }

    fn filter(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedTask> {
        let _step = info_span!("filter").entered();
        progress.report(ProgressEvent::Started {
            stage: Stage::Filtering,
            message: format!("Applying filter (status: {})...", selection.status),
        });
        let filtered = dataset.filter(selection);
        progress.report(ProgressEvent::Finished {
            stage: Stage::Filtering,
            rows: filtered.len(),
        });
        filtered
    }

    fn layout<'a>(&'a self, dataset: &'a Dataset) -> ReportLayout<'a> {
        ReportLayout::new(
            &dataset.columns,
            dataset.deadline_column,
            &self.config.export,
        )
    }
}
