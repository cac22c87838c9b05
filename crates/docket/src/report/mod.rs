//! Read-only summaries over enriched tasks.
//!
//! Queries documented as taking the *full* table must be given the
//! unfiltered tasks; the others accept either view.

pub mod map;

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::SectorCoordinates;
use crate::enrich::{EnrichedTask, ForecastBucket, Status};
use crate::filter::FilterSelection;

pub use map::{sector_markers, SectorMarker};

pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCount {
    pub user: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOverdueRate {
    pub user: String,
    pub overdue: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub bucket: ForecastBucket,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorCount {
    pub sector: String,
    pub count: usize,
}

/// Columns shown in the top overdue listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueRow {
    pub process_id: String,
    pub responsible_user: Option<String>,
    pub origin_sector: Option<String>,
    pub days_overdue: i64,
}

impl OverdueRow {
    pub fn from_task(task: &EnrichedTask) -> Self {
        Self {
            process_id: task.process_id().to_string(),
            responsible_user: task.task.responsible_user.clone(),
            origin_sector: task.task.origin_sector.clone(),
            days_overdue: task.days_overdue.unwrap_or_default(),
        }
    }
}

/// Counts per key, ordered by count descending then key ascending.
fn count_by<'a, F>(tasks: &'a [EnrichedTask], key: F) -> Vec<(String, usize)>
where
    F: Fn(&'a EnrichedTask) -> Option<&'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for task in tasks {
        if let Some(k) = key(task) {
            *counts.entry(k).or_default() += 1;
        }
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Count per status; both statuses are always present.
pub fn status_distribution(tasks: &[EnrichedTask]) -> Vec<StatusCount> {
    Status::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: tasks.iter().filter(|t| t.status == status).count(),
        })
        .collect()
}

pub fn counts_by_user(tasks: &[EnrichedTask]) -> Vec<UserCount> {
    count_by(tasks, EnrichedTask::responsible_user)
        .into_iter()
        .map(|(user, count)| UserCount { user, count })
        .collect()
}

pub fn counts_by_sector(tasks: &[EnrichedTask]) -> Vec<SectorCount> {
    count_by(tasks, EnrichedTask::origin_sector)
        .into_iter()
        .map(|(sector, count)| SectorCount { sector, count })
        .collect()
}

/// Share of each user's tasks that are overdue, over the **unfiltered** table.
///
/// The denominator is the user's whole workload, so the result must not be
/// computed from a filtered view.
pub fn overdue_percentage_by_user(full: &[EnrichedTask]) -> Vec<UserOverdueRate> {
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    for task in full {
        if let Some(user) = task.responsible_user() {
            let entry = totals.entry(user).or_default();
            entry.1 += 1;
            if task.is_overdue() {
                entry.0 += 1;
            }
        }
    }

    let mut rates: Vec<UserOverdueRate> = totals
        .into_iter()
        .map(|(user, (overdue, total))| UserOverdueRate {
            user: user.to_string(),
            overdue,
            total,
            percentage: 100.0 * overdue as f64 / total as f64,
        })
        .collect();
    rates.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.user.cmp(&b.user))
    });
    rates
}

/// On-time tasks of the **unfiltered** table per bucket, all four buckets in
/// display order.
pub fn forecast_buckets(full: &[EnrichedTask]) -> Vec<BucketCount> {
    ForecastBucket::ALL
        .iter()
        .map(|&bucket| BucketCount {
            bucket,
            count: full
                .iter()
                .filter(|t| t.status == Status::OnTime && t.forecast_bucket == Some(bucket))
                .count(),
        })
        .collect()
}

/// The `n` most overdue tasks of the **unfiltered** table.
///
/// Sorted by days overdue descending; ties keep source order.
pub fn top_n_overdue(full: &[EnrichedTask], n: usize) -> Vec<&EnrichedTask> {
    let mut overdue: Vec<&EnrichedTask> = full.iter().filter(|t| t.is_overdue()).collect();
    overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    overdue.truncate(n);
    overdue
}

/// Every dashboard figure for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub reference_date: NaiveDateTime,
    pub selection: FilterSelection,
    pub total_tasks: usize,
    pub filtered_tasks: usize,
    pub status_distribution: Vec<StatusCount>,
    pub tasks_by_user: Vec<UserCount>,
    pub overdue_rate_by_user: Vec<UserOverdueRate>,
    pub forecast: Vec<BucketCount>,
    pub tasks_by_sector: Vec<SectorCount>,
    pub sector_markers: Vec<SectorMarker>,
    pub top_overdue: Vec<OverdueRow>,
}

impl DashboardReport {
    /// Figures of the filtered view where the dashboard follows the filter,
    /// figures of the full table where it does not.
    pub fn build(
        full: &[EnrichedTask],
        filtered: &[EnrichedTask],
        selection: &FilterSelection,
        reference_date: NaiveDateTime,
        sectors: &SectorCoordinates,
        top_n: usize,
    ) -> Self {
        let tasks_by_sector = counts_by_sector(filtered);
        let sector_markers = sector_markers(&tasks_by_sector, sectors);

        Self {
            reference_date,
            selection: selection.clone(),
            total_tasks: full.len(),
            filtered_tasks: filtered.len(),
            status_distribution: status_distribution(filtered),
            tasks_by_user: counts_by_user(filtered),
            overdue_rate_by_user: overdue_percentage_by_user(full),
            forecast: forecast_buckets(full),
            tasks_by_sector,
            sector_markers,
            top_overdue: top_n_overdue(full, top_n)
                .into_iter()
                .map(OverdueRow::from_task)
                .collect(),
        }
    }
}
