//! Explain command - show how one message was scored

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use std::path::Path;
use whosaid::config::Config;
use whosaid::corpus::load_corpus;
use whosaid::models::{DifficultyLabel, Snowflake};
use whosaid::pipeline::Explanation;
use whosaid::Pipeline;

pub fn run(
    input: &Path,
    msg_id: Snowflake,
    config: Config,
    now: Option<DateTime<Utc>>,
    workers: usize,
    format: &str,
) -> Result<()> {
    let loaded = load_corpus(input, &config.loader)
        .with_context(|| format!("Failed to load corpus {}", input.display()))?;

    let mut pipeline = Pipeline::new(config).with_workers(workers);
    if let Some(now) = now {
        pipeline = pipeline.with_now(now);
    }

    let explanation = pipeline
        .explain(&loaded.corpus, msg_id)
        .with_context(|| format!("No message {} in {}", msg_id, input.display()))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        print_explanation(&explanation);
    }
    Ok(())
}

fn signed(v: i8) -> String {
    format!("{:+}", v)
}

fn print_explanation(e: &Explanation) {
    let b = &e.breakdown;
    let record = &e.record;

    println!(
        "\n{} Message {} by {}",
        style("🔎").bold(),
        style(record.msg_id).cyan(),
        style(&record.author_id).cyan()
    );
    if record.is_text() {
        println!("  {}", style(format!("\"{}\"", record.content)).dim());
    } else {
        println!("  {} {}", style("[image]").dim(), style(&record.content).dim());
    }

    println!("\n{}", style("Heuristics").bold());
    println!(
        "  Age:      {:>3}  ({} days, sent {})",
        signed(b.sub_scores.age_score),
        e.age_days,
        e.timestamp.format("%Y-%m-%d")
    );
    println!(
        "  Channel:  {:>3}  ({})",
        signed(b.sub_scores.channel_score),
        e.channel_name.as_deref().unwrap_or("unknown channel")
    );
    if record.is_text() {
        println!(
            "  Length:   {:>3}  ({} words)",
            signed(b.sub_scores.length_score),
            e.word_count
        );
    } else {
        println!("  Length:   {:>3}  (image)", signed(b.sub_scores.length_score));
    }

    println!("\n{}", style("Classifier").bold());
    match (&e.classifier, b.confidence) {
        (Some(model), Some(confidence)) => {
            println!(
                "  Model:      {} documents, {} authors",
                model.documents, model.authors
            );
            let note = if b.used_fallback { " (author not trained, fallback)" } else { "" };
            println!("  Confidence: {:.3}{}", confidence, note);
            if let Some(ai_score) = b.ai_score {
                println!("  AI score:   {:.2}", ai_score);
            }
            println!("  AI offset:  {:+.2}", b.ai_offset);
            for (i, (author, p)) in e.top_guesses.iter().enumerate() {
                println!("  Guess #{}:   {} ({:.1}%)", i + 1, author, p * 100.0);
            }
        }
        _ => println!("  {}", style("not trained (corpus too small)").dim()),
    }

    let label = match b.label {
        DifficultyLabel::Easy => style(b.label).green(),
        DifficultyLabel::Medium => style(b.label).yellow(),
        DifficultyLabel::Hard => style(b.label).red(),
    };
    println!(
        "\n{} raw {:.2} → {} {}",
        style("Score").bold(),
        b.raw,
        style(b.score).bold(),
        label
    );
    if let Some(imposter) = &b.imposter_id {
        println!("  Imposter: {}", style(imposter).magenta());
    }
}
