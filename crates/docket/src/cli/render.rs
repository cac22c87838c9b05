//! Plain-text rendering of report figures.

use std::fmt::Write;

use crate::report::{DashboardReport, OverdueRow};

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

pub fn summary(report: &DashboardReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reference date: {}", report.reference_date.date());
    let _ = writeln!(
        out,
        "Tasks: {} of {} (status: {}, {} users, {} sectors)",
        report.filtered_tasks,
        report.total_tasks,
        report.selection.status,
        report.selection.users.len(),
        report.selection.sectors.len(),
    );

    let _ = writeln!(out, "\nStatus");
    for entry in &report.status_distribution {
        let _ = writeln!(
            out,
            "  {:<16} {:>6}  {:>5.1}%",
            entry.status.label(),
            entry.count,
            share(entry.count, report.filtered_tasks),
        );
    }

    let _ = writeln!(out, "\nTasks per user");
    for entry in &report.tasks_by_user {
        let _ = writeln!(out, "  {:<24} {:>6}", entry.user, entry.count);
    }

    let _ = writeln!(out, "\nOverdue share per user (all tasks)");
    for entry in &report.overdue_rate_by_user {
        let _ = writeln!(
            out,
            "  {:<24} {:>5.1}%  ({}/{})",
            entry.user, entry.percentage, entry.overdue, entry.total,
        );
    }

    let _ = writeln!(out, "\nDue within (all on-time tasks)");
    for entry in &report.forecast {
        let _ = writeln!(out, "  {:<8} {:>6}", entry.bucket.label(), entry.count);
    }

    let _ = writeln!(out, "\nTasks per sector");
    for entry in &report.tasks_by_sector {
        let _ = writeln!(out, "  {:<8} {:>6}", entry.sector, entry.count);
    }

    let _ = writeln!(out, "\nMost overdue (all tasks)");
    out.push_str(&overdue_rows(&report.top_overdue));
    out
}

pub fn overdue_rows(rows: &[OverdueRow]) -> String {
    if rows.is_empty() {
        return "  No overdue tasks\n".to_string();
    }

    let mut out = String::new();
    for (rank, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {:<28} {:<24} {:<8} {:>5} days",
            rank + 1,
            row.process_id,
            or_dash(row.responsible_user.as_deref()),
            or_dash(row.origin_sector.as_deref()),
            row.days_overdue,
        );
    }
    out
}
