use anyhow::Result;
use clap::Args;

use cbt_flow::{TemplateStore, answers_schema, template_schema};

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Print the answers schema of a stored template instead of the template schema
    #[arg(long = "answers", value_name = "ID")]
    pub answers: Option<String>,
}

pub fn run(args: &SchemaArgs, ctx: &Context) -> Result<()> {
    let schema = match &args.answers {
        Some(id) => answers_schema(&ctx.open_store()?.get_template(id)?),
        None => template_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
