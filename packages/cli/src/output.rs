//! Rendering of run reports and catalogs on stdout

use clap::ValueEnum;
use indexsync_core::services::{Action, Catalog, CollectionReport, RunReport};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for collection in &report.collections {
                print_collection(collection);
            }
            match &report.read_failure {
                Some(failure) => println!("run aborted: {}", failure.error),
                None if report.aborted => println!("run aborted after a failed create"),
                None => {}
            }
            println!(
                "summary: created={} planned={} rebuilds={} failures={}",
                report.created_count(),
                report.planned_count(),
                report.rebuild_count(),
                report.failure_count()
            );
        }
    }
    Ok(())
}

fn print_collection(report: &CollectionReport) {
    println!(
        "{} ({} existing: {})",
        report.collection,
        report.existing_indexes.len(),
        report.existing_indexes.join(", ")
    );

    for outcome in &report.outcomes {
        let action = match &outcome.action {
            Action::Unchanged => "unchanged".to_string(),
            Action::Created { name } => format!("created as '{}'", name),
            Action::Planned => "would create".to_string(),
            Action::RebuildNotImplemented { existing } => {
                format!("rebuild of '{}' required (not performed)", existing)
            }
            Action::Failed { error, .. } => format!("FAILED: {}", error),
            Action::Skipped => "skipped".to_string(),
        };
        println!(
            "  {:<8} {} {} -> {}",
            outcome.decision.classification.to_string(),
            outcome.index,
            outcome.keys,
            action
        );
        if let Some(warning) = &outcome.decision.warning {
            println!("           warning: {}", warning);
        }
    }
}

pub fn print_catalogs(catalogs: &[Catalog], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let value: Vec<_> = catalogs
                .iter()
                .map(|catalog| {
                    json!({
                        "collection": catalog.collection(),
                        "indexes": catalog.iter().collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            for catalog in catalogs {
                println!("{} ({} indexes)", catalog.collection(), catalog.len());
                for index in catalog.iter() {
                    println!("  {} {}", index.name, index.keys);
                }
            }
        }
    }
    Ok(())
}
