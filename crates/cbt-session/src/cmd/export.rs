use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::debug;

use cbt_flow::{Template, TemplateStore};

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Template to export
    #[arg(value_name = "ID")]
    pub id: String,
    /// Destination file (defaults to `<title>_v<version>.json` in the current directory)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ExportArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let template = store.get_template(&args.id)?;
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_file_name(&template)));

    let body = serde_json::to_string_pretty(&template)?;
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(template_id = %template.id, path = %path.display(), "template exported");
    println!("exported {} to {}", template.id, path.display());
    Ok(())
}

/// Title with whitespace runs and path separators collapsed to `_`, suffixed by the version.
pub fn export_file_name(template: &Template) -> String {
    let mut stem = String::with_capacity(template.title.len());
    let mut in_gap = false;
    for ch in template.title.chars() {
        if ch.is_whitespace() || ch == '/' || ch == '\\' {
            if !in_gap {
                stem.push('_');
            }
            in_gap = true;
        } else {
            stem.push(ch);
            in_gap = false;
        }
    }
    if stem.is_empty() {
        stem.push_str(&template.id);
    }
    format!("{stem}_v{}.json", template.version)
}
