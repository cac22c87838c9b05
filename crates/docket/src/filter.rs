//! Filter selection over enriched tasks.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::enrich::{EnrichedTask, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChoice {
    #[default]
    All,
    Only(Status),
}

impl StatusChoice {
    pub fn matches(&self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todos" => Ok(Self::All),
            "overdue" | "em atraso" => Ok(Self::Only(Status::Overdue)),
            "on_time" | "on-time" | "ontime" | "dentro do prazo" => Ok(Self::Only(Status::OnTime)),
            other => Err(format!(
                "unknown status '{}', expected one of: all, overdue, on_time",
                other
            )),
        }
    }
}

impl fmt::Display for StatusChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Sorted distinct non-null responsible users.
pub fn distinct_users(tasks: &[EnrichedTask]) -> BTreeSet<String> {
    tasks
        .iter()
        .filter_map(|t| t.responsible_user())
        .map(str::to_string)
        .collect()
}

/// Sorted distinct non-null origin sectors.
pub fn distinct_sectors(tasks: &[EnrichedTask]) -> BTreeSet<String> {
    tasks
        .iter()
        .filter_map(|t| t.origin_sector())
        .map(str::to_string)
        .collect()
}

/// Status choice plus the selected users and sectors.
///
/// A row passes only when all three predicates hold. A row whose user or
/// sector is null never passes, since the sets only hold observed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub status: StatusChoice,
    pub users: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
}

impl FilterSelection {
    /// Every status, every observed user, every observed sector.
    pub fn all_of(tasks: &[EnrichedTask]) -> Self {
        Self {
            status: StatusChoice::All,
            users: distinct_users(tasks),
            sectors: distinct_sectors(tasks),
        }
    }

    pub fn with_status(mut self, status: StatusChoice) -> Self {
        self.status = status;
        self
    }

    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sectors<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sectors = sectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, task: &EnrichedTask) -> bool {
        self.status.matches(task.status)
            && task
                .responsible_user()
                .is_some_and(|u| self.users.contains(u))
            && task
                .origin_sector()
                .is_some_and(|s| self.sectors.contains(s))
    }

    /// Rows passing the selection, in source order.
    pub fn apply(&self, tasks: &[EnrichedTask]) -> Vec<EnrichedTask> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}
