use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use serde_json::Value as JsonValue;

use cbt_flow::{ResultSource, SessionResult};

use super::Context;

const MOOD_LABELS: [&str; 5] = ["very low", "low", "neutral", "good", "very good"];

#[derive(Args, Debug, Clone)]
pub struct ResultsArgs {
    /// Only show results of this template
    #[arg(long = "template", value_name = "ID")]
    pub template: Option<String>,
    #[arg(long, conflicts_with = "csv")]
    pub json: bool,
    /// Export the answers of one session as `Question ID,Answer` rows
    #[arg(long = "csv", value_name = "SESSION_ID")]
    pub csv: Option<String>,
    /// Write the CSV export to FILE instead of stdout
    #[arg(short = 'o', long = "out", value_name = "FILE", requires = "csv")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ResultsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let results = store.list_results(args.template.as_deref())?;

    if let Some(session_id) = &args.csv {
        let result = results
            .iter()
            .find(|result| result.session_id.to_string() == *session_id)
            .with_context(|| format!("session {session_id} not found"))?;
        return match &args.out {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                write_answers_csv(file, result)?;
                println!("exported session {session_id} to {}", path.display());
                Ok(())
            }
            None => write_answers_csv(io::stdout().lock(), result),
        };
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("no results");
        return Ok(());
    }
    for result in &results {
        println!(
            "{}  {}  {}  mood {}  {} steps",
            result.completed_at,
            result.session_id,
            result.template_id,
            result.capture.primary,
            result.path_taken.len()
        );
    }
    if let Some(line) = latest_check_in(&results) {
        println!("{line}");
    }
    Ok(())
}

/// Summary of the most recent check-in; `results` must be ordered by completion time.
pub fn latest_check_in(results: &[SessionResult]) -> Option<String> {
    let latest = results.last()?;
    let primary = latest.capture.primary;
    let label = usize::try_from(primary)
        .ok()
        .and_then(|score| score.checked_sub(1))
        .and_then(|idx| MOOD_LABELS.get(idx))
        .copied()
        .unwrap_or("unrated");
    let note = if latest.capture.note.is_empty() {
        "no note".to_string()
    } else {
        format!("\"{}\"", latest.capture.note)
    };
    Some(format!(
        "latest check-in: mood {primary} ({label}), {note} [{}]",
        latest.template_title
    ))
}

/// One row per answer, multi-choice values joined with `;`. Capture fields use their reserved keys.
pub fn write_answers_csv<W: Write>(writer: W, result: &SessionResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Question ID", "Answer"])?;
    for (question_id, answer) in result.flattened_answers() {
        wtr.write_record([question_id.as_str(), &cell(&answer)])?;
    }
    wtr.flush()?;
    Ok(())
}

fn cell(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        JsonValue::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(";"),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
