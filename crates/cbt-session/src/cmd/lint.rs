use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;

use cbt_flow::{Severity, Template, TemplateIssue, lint_template};

#[derive(Args, Debug, Clone)]
pub struct LintArgs {
    /// Template JSON file to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
    /// Emit the findings as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &LintArgs) -> Result<()> {
    let template = read_template(&args.file)?;
    let issues = lint_template(&template);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!("{}: no issues", template.id);
    } else {
        emit_issues(&issues);
    }

    let errors = count(&issues, Severity::Error);
    if errors > 0 {
        bail!("template-lint: {errors} error(s) in {}", args.file.display());
    }
    let warnings = count(&issues, Severity::Warning);
    if args.strict && warnings > 0 {
        bail!("template-lint: {warnings} warning(s) treated as errors (--strict)");
    }
    Ok(())
}

pub fn read_template(path: &Path) -> Result<Template> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("template {} must be valid JSON", path.display()))?;
    Template::from_document(&document)
        .with_context(|| format!("template {} is not a valid template document", path.display()))
}

pub fn emit_issues(issues: &[TemplateIssue]) {
    for issue in issues {
        let level = match issue.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &issue.question_id {
            Some(id) => eprintln!("{level}[{}] {id}: {}", issue.code, issue.message),
            None => eprintln!("{level}[{}] {}", issue.code, issue.message),
        }
    }
}

pub fn count(issues: &[TemplateIssue], severity: Severity) -> usize {
    issues
        .iter()
        .filter(|issue| issue.severity == severity)
        .count()
}
