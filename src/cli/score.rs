//! Score command - run the full pipeline over a corpus

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use std::path::Path;
use std::time::Instant;
use whosaid::config::Config;
use whosaid::corpus::default_output_path;
use whosaid::models::DifficultyLabel;
use whosaid::{Pipeline, RunSummary};

pub fn run(
    input: &Path,
    output: Option<&Path>,
    config: Config,
    now: Option<DateTime<Utc>>,
    workers: usize,
    show_progress: bool,
    format: &str,
) -> Result<()> {
    let start = Instant::now();
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    let mut pipeline = Pipeline::new(config)
        .with_workers(workers)
        .with_progress(show_progress && format == "text");
    if let Some(now) = now {
        pipeline = pipeline.with_now(now);
    }

    let summary = pipeline.run(input, &output)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, start.elapsed().as_secs_f64());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, elapsed: f64) {
    let load = &summary.load;
    let scoring = &summary.scoring;

    println!(
        "\n{} Scored {} messages in {:.1}s",
        style("✓").green(),
        style(scoring.scored).cyan(),
        elapsed
    );

    println!(
        "  Loaded:     {} of {} messages",
        style(load.kept()).cyan(),
        load.total_messages
    );
    if load.skipped > 0 {
        println!(
            "  Skipped:    {} malformed",
            style(load.skipped).yellow()
        );
    }
    if load.deduped > 0 || load.filtered > 0 {
        println!(
            "  Filtered:   {} duplicates, {} too short",
            load.deduped, load.filtered
        );
    }

    match &scoring.classifier {
        Some(model) => println!(
            "  Classifier: {} documents, {} authors, {} features",
            style(model.documents).cyan(),
            style(model.authors).cyan(),
            style(model.features).cyan()
        ),
        None => println!(
            "  Classifier: {}",
            style("skipped (heuristics only)").dim()
        ),
    }

    let labels: Vec<String> = DifficultyLabel::all()
        .iter()
        .map(|label| {
            let count = scoring.labels.get(label).copied().unwrap_or(0);
            let count = match label {
                DifficultyLabel::Easy => style(count).green(),
                DifficultyLabel::Medium => style(count).yellow(),
                DifficultyLabel::Hard => style(count).red(),
            };
            format!("{} {}", label, count)
        })
        .collect();
    println!("  Labels:     {}", labels.join(" · "));

    println!("  Imposters:  {}", style(scoring.imposters).cyan());
    println!(
        "  Users:      {} ({} pruned)",
        style(summary.users).cyan(),
        scoring.pruned_authors
    );
    if scoring.orphaned_records > 0 {
        println!(
            "  Orphans:    {} messages without a user profile dropped",
            style(scoring.orphaned_records).yellow()
        );
    }
    println!(
        "\n{} {}",
        style("Saved to").bold(),
        style(summary.output.display()).cyan()
    );
}
