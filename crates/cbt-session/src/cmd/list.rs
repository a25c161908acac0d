use anyhow::Result;
use clap::Args;
use serde::Serialize;

use cbt_flow::{Template, TemplateStore};

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TemplateSummary<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    version: u32,
    questions: usize,
    branching: bool,
}

impl<'a> From<&'a Template> for TemplateSummary<'a> {
    fn from(template: &'a Template) -> Self {
        Self {
            id: &template.id,
            title: &template.title,
            description: template.description.as_deref(),
            version: template.version,
            questions: template.len(),
            branching: template.questions.iter().any(|question| question.is_branching()),
        }
    }
}

pub fn run(args: &ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let templates = store.list_templates()?;
    let summaries: Vec<TemplateSummary<'_>> = templates.iter().map(Into::into).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("no templates");
        return Ok(());
    }
    for summary in &summaries {
        let branching = if summary.branching { ", branching" } else { "" };
        println!(
            "{:<24} {} (v{}, {} questions{branching})",
            summary.id, summary.title, summary.version, summary.questions
        );
    }
    Ok(())
}
