use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use tracing::warn;

use cbt_flow::{Severity, TemplateStore, lint_template};

use super::Context;
use super::lint::{count, emit_issues, read_template};

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Template JSON file to add or replace
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

pub fn run(args: &ImportArgs, ctx: &Context) -> Result<()> {
    let template = read_template(&args.file)?;
    if template.is_empty() {
        bail!("template {} has no questions", template.id);
    }

    let issues = lint_template(&template);
    emit_issues(&issues);
    let errors = count(&issues, Severity::Error);
    if errors > 0 {
        bail!("template {} rejected: {errors} error(s)", template.id);
    }
    let warnings = count(&issues, Severity::Warning);
    if warnings > 0 {
        warn!(template_id = %template.id, warnings, "importing template with lint warnings");
    }

    let store = ctx.open_store()?;
    store.save_template(&template)?;
    println!(
        "imported {} ({} questions)",
        template.id,
        template.len()
    );
    Ok(())
}
