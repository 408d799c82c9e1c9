// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering for the two output modes every subcommand supports:
//! human-readable tables (`text`, the default) and machine-readable
//! `json` for scripting.

use std::fmt;

use clap::ValueEnum;
use oj_core::{Clock, SystemClock};
use oj_wire::{JobDetail, JobGroup, JobSummary};
use serde::Serialize;

use crate::table::{Column, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}

pub fn print_job_table(jobs: &[JobSummary]) {
    let mut table = Table::new(vec![
        Column::left("ID"),
        Column::status("STATUS"),
        Column::left("TYPE"),
        Column::left("NAME"),
        Column::muted("AGE"),
        Column::muted("CHILDREN"),
    ]);
    for job in jobs {
        table.row(vec![
            job.id.to_string(),
            job.status.to_string(),
            job.job_type.clone(),
            job.name.clone(),
            time_ago(job.created_at_epoch_ms),
            child_summary(job),
        ]);
    }
    table.render(&mut std::io::stdout());
}

pub fn print_job_groups(groups: &[JobGroup], orphans: &[JobSummary]) {
    for group in groups {
        println!(
            "{} {} [{}]",
            crate::color::header(group.parent.id.as_str()),
            group.parent.name,
            crate::color::status(&group.parent.status.to_string())
        );
        print_job_table(&group.children);
        println!();
    }
    if !orphans.is_empty() {
        println!("{}", crate::color::muted("orphans (parent not on this page):"));
        print_job_table(orphans);
    }
}

pub fn print_job_detail(detail: &JobDetail) {
    let s = &detail.summary;
    println!("{}  {}", crate::color::header(s.id.as_str()), s.name);
    println!("  type:     {}", s.job_type);
    println!("  status:   {}", crate::color::status(&s.status.to_string()));
    println!("  phase:    {}", s.phase);
    println!("  progress: {}{}", s.progress_current, s.progress_total.map(|t| format!("/{t}")).unwrap_or_default());
    println!("  created:  {}", time_ago(s.created_at_epoch_ms));
    if let Some(parent) = &s.parent_id {
        println!("  parent:   {parent}");
    }
    if let Some(error) = &s.error {
        println!("  error:    {error}");
    }
    if !detail.steps.is_empty() {
        println!("  steps:");
        for step in &detail.steps {
            println!("    - {} [{}]", step.step_name, crate::color::status(&step.status.to_string()));
        }
    }
}

fn child_summary(job: &JobSummary) -> String {
    match &job.child_stats {
        Some(stats) => format!(
            "{} ({}r/{}f)",
            stats.child_count, stats.running_children, stats.failed_children
        ),
        None => "-".to_string(),
    }
}

/// Render a past epoch-ms timestamp as a short relative age
/// (`"3s"`, `"5m"`, `"2h"`, `"4d"`), matching the compact style the
/// rest of the table columns use.
pub fn time_ago(epoch_ms: u64) -> String {
    let now_ms = SystemClock.epoch_ms();
    let delta_ms = now_ms.saturating_sub(epoch_ms);
    let secs = delta_ms / 1000;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
