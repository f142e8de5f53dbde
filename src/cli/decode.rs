//! Decode command - snowflake id to timestamp

use anyhow::Result;
use console::style;
use whosaid::models::Snowflake;

pub fn run(snowflake: Snowflake) -> Result<()> {
    println!(
        "{} {} ({} ms)",
        style(snowflake).cyan(),
        snowflake.timestamp().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        snowflake.timestamp_ms()
    );
    Ok(())
}
