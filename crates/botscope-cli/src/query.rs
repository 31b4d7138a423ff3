//! Read-only snapshot query handlers and report rendering.

use std::fmt::Write as _;

use botscope_core::{parse_username, Platform};
use botscope_db::{AnalysisReport, DbError, SnapshotStore};

use crate::store::AnyStore;

/// List stored snapshots for an account.
///
/// # Errors
///
/// Returns an error if the username is invalid or the query fails.
pub(crate) async fn run_history(store: &AnyStore, input: &str, limit: usize) -> anyhow::Result<()> {
    let username = parse_username(input)?;
    let snapshots = store
        .list_snapshots(Platform::Reddit, &username, limit)
        .await?;

    if snapshots.is_empty() {
        println!("no snapshots found for u/{username}; run `analyze {username}` first");
        if !store.is_persistent() {
            println!("hint: set DATABASE_URL to keep results between runs");
        }
        return Ok(());
    }

    println!(
        "{:<10}{:<20}{:<12}{:<14}{:<12}ITEMS",
        "SNAPSHOT", "COLLECTED", "AUTOMATION", "COORDINATION", "CONFIDENCE"
    );
    for summary in &snapshots {
        let snap = &summary.snapshot;
        let collected = snap.collected_at.format("%Y-%m-%d %H:%M").to_string();
        let coordination = summary
            .coordination_score
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let confidence = summary
            .confidence
            .map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
        println!(
            "{:<10}{:<20}{:<12}{:<14}{:<12}{}",
            snap.id,
            collected,
            summary.automation_score,
            coordination,
            confidence,
            snap.post_count + snap.comment_count
        );
    }

    Ok(())
}

/// Show the full report for one snapshot.
///
/// # Errors
///
/// Returns an error if the snapshot does not exist or the query fails.
pub(crate) async fn run_report(store: &AnyStore, snapshot_id: i64, json: bool) -> anyhow::Result<()> {
    let report = match store.load_report(snapshot_id).await {
        Ok(report) => report,
        Err(DbError::NotFound) => anyhow::bail!("snapshot {snapshot_id} not found"),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// Plain-text rendering of a report.
pub(crate) fn render_report(report: &AnalysisReport) -> String {
    let snap = &report.snapshot;
    let score = &report.score;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "u/{}  snapshot {}  collected {}",
        snap.username,
        snap.id,
        snap.collected_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "automation {}/100  coordination {}  confidence {}",
        score.automation_score,
        score
            .coordination_score
            .map_or_else(|| "n/a".to_string(), |c| format!("{c}/100")),
        score
            .confidence
            .map_or_else(|| "n/a".to_string(), |c| format!("{c:.2}")),
    );
    let _ = writeln!(
        out,
        "items: {} posts, {} comments over {:.1} days",
        snap.post_count, snap.comment_count, snap.data_coverage_days
    );

    if score.reasons.is_empty() {
        let _ = writeln!(out, "no automation signals fired");
    } else {
        let _ = writeln!(out, "reasons:");
        for reason in &score.reasons {
            let _ = writeln!(out, "  [+{:>2}] {}: {}", reason.impact, reason.title, reason.details);
            for link in &reason.evidence {
                let _ = writeln!(out, "        {link}");
            }
        }
    }

    let coverage = &score.explanations.coverage;
    if !coverage.has_items {
        let _ = writeln!(out, "note: no public activity was found");
    } else if !coverage.has_timestamps {
        let _ = writeln!(out, "note: activity carried no usable timestamps");
    }

    out
}
