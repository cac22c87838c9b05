//! Deadline parsing and per-task status derivation.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::source::{Cell, Task};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Upper bound (exclusive) of Excel serial dates, 10000-01-01.
const EXCEL_SERIAL_MAX: f64 = 2_958_466.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Overdue,
    OnTime,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Overdue, Status::OnTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::OnTime => "on_time",
        }
    }

    /// Label written to reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Overdue => "Em atraso",
            Self::OnTime => "Dentro do prazo",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse range of days left before an on-time deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForecastBucket {
    #[serde(rename = "0-7")]
    Week,
    #[serde(rename = "8-15")]
    Fortnight,
    #[serde(rename = "16-30")]
    Month,
    #[serde(rename = ">30")]
    Later,
}

impl ForecastBucket {
    /// Display order.
    pub const ALL: [ForecastBucket; 4] = [
        ForecastBucket::Week,
        ForecastBucket::Fortnight,
        ForecastBucket::Month,
        ForecastBucket::Later,
    ];

    /// An unknown day count fails every threshold and lands in `>30`.
    pub fn from_days(days_remaining: Option<i64>) -> Self {
        match days_remaining {
            Some(d) if d <= 7 => Self::Week,
            Some(d) if d <= 15 => Self::Fortnight,
            Some(d) if d <= 30 => Self::Month,
            _ => Self::Later,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Week => "0-7",
            Self::Fortnight => "8-15",
            Self::Month => "16-30",
            Self::Later => ">30",
        }
    }
}

impl fmt::Display for ForecastBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A task with its deadline-derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTask {
    pub task: Task,
    /// `None` when the source value was missing or could not be parsed.
    pub deadline: Option<NaiveDateTime>,
    pub status: Status,
    /// Whole days past the deadline; only set for overdue tasks.
    pub days_overdue: Option<i64>,
    /// Whole days until the deadline; only set for on-time tasks with a deadline.
    pub days_remaining: Option<i64>,
    /// Set for every on-time task.
    pub forecast_bucket: Option<ForecastBucket>,
}

impl EnrichedTask {
    pub fn process_id(&self) -> &str {
        &self.task.process_id
    }

    pub fn responsible_user(&self) -> Option<&str> {
        self.task.responsible_user.as_deref()
    }

    pub fn origin_sector(&self) -> Option<&str> {
        self.task.origin_sector.as_deref()
    }

    pub fn is_overdue(&self) -> bool {
        self.status == Status::Overdue
    }
}

/// Derives status and day counts against a fixed reference instant.
///
/// Holds no state beyond its inputs, so the same tasks always enrich to the
/// same output.
#[derive(Debug, Clone)]
pub struct Enricher {
    reference_date: NaiveDateTime,
    date_formats: Vec<String>,
}

impl Enricher {
    pub fn new(reference_date: NaiveDateTime, date_formats: &[String]) -> Self {
        Self {
            reference_date,
            date_formats: date_formats.to_vec(),
        }
    }

    pub fn reference_date(&self) -> NaiveDateTime {
        self.reference_date
    }

    pub fn enrich(&self, tasks: &[Task]) -> Vec<EnrichedTask> {
        let enriched: Vec<EnrichedTask> = tasks.iter().map(|t| self.enrich_task(t)).collect();

        let unparsed = enriched
            .iter()
            .filter(|t| t.deadline.is_none() && !t.task.deadline.is_empty())
            .count();
        if unparsed > 0 {
            warn!(
                unparsed,
                "Some deadlines could not be parsed and are treated as on time"
            );
        }
        debug!(
            rows = enriched.len(),
            overdue = enriched.iter().filter(|t| t.is_overdue()).count(),
            "Enriched tasks"
        );

        enriched
    }

    pub fn enrich_task(&self, task: &Task) -> EnrichedTask {
        let deadline = parse_deadline(&task.deadline, &self.date_formats);

        // A missing deadline is never overdue.
        let status = match deadline {
            Some(d) if d < self.reference_date => Status::Overdue,
            _ => Status::OnTime,
        };

        let (days_overdue, days_remaining) = match (status, deadline) {
            (Status::Overdue, Some(d)) => (Some(whole_days(self.reference_date - d)), None),
            (Status::OnTime, Some(d)) => (None, Some(whole_days(d - self.reference_date))),
            _ => (None, None),
        };

        let forecast_bucket = match status {
            Status::OnTime => Some(ForecastBucket::from_days(days_remaining)),
            Status::Overdue => None,
        };

        EnrichedTask {
            task: task.clone(),
            deadline,
            status,
            days_overdue,
            days_remaining,
            forecast_bucket,
        }
    }
}

/// Whole days in a signed duration, rounded toward negative infinity.
pub fn whole_days(delta: TimeDelta) -> i64 {
    delta.num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Best-effort deadline parse. Unparseable values yield `None`.
pub fn parse_deadline(cell: &Cell, formats: &[String]) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_text(s.trim(), formats),
        Cell::Number(n) => from_excel_serial(*n),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

fn parse_text(s: &str, formats: &[String]) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(s, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    })
}

/// Excel 1900 date system. The 1899-12-30 epoch absorbs the phantom
/// 1900-02-29, so serials are exact from 1900-03-01 onward.
fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..EXCEL_SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * MILLIS_PER_DAY as f64).round() as i64;
    epoch.checked_add_signed(TimeDelta::milliseconds(millis))
}
