use anyhow::{Result, bail};
use clap::Args;

use cbt_flow::TemplateStore;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Template id
    #[arg(value_name = "ID")]
    pub id: String,
}

pub fn run(args: &DeleteArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    if !store.delete_template(&args.id)? {
        bail!("template {} not found", args.id);
    }
    println!("deleted {}", args.id);
    Ok(())
}
