use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::cmd::{
    self, Context, delete::DeleteArgs, export::ExportArgs, import::ImportArgs, lint::LintArgs,
    list::ListArgs, results::ResultsArgs, run::RunArgs, schema::SchemaArgs,
};
use crate::config::Config;
use crate::logging;

#[derive(Parser, Debug)]
#[command(
    name = "cbt-session",
    about = "Run and manage branching CBT questionnaires",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (TOML)
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding templates and results
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored questionnaire templates
    List(ListArgs),
    /// Add or replace a template from a JSON file
    Import(ImportArgs),
    /// Remove a stored template
    Delete(DeleteArgs),
    /// Write a stored template to a JSON file
    Export(ExportArgs),
    /// Take a questionnaire interactively or from an answers file
    Run(RunArgs),
    /// Check a template file for authoring mistakes
    Lint(LintArgs),
    /// Print the JSON schema of templates or of one template's answers
    Schema(SchemaArgs),
    /// List saved session results or export one as CSV
    Results(ResultsArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_filter.as_deref());
    let ctx = Context::new(config, cli.data_dir);

    match &cli.command {
        Commands::List(args) => cmd::list::run(args, &ctx),
        Commands::Import(args) => cmd::import::run(args, &ctx),
        Commands::Delete(args) => cmd::delete::run(args, &ctx),
        Commands::Export(args) => cmd::export::run(args, &ctx),
        Commands::Run(args) => cmd::run::run(args, &ctx),
        Commands::Lint(args) => cmd::lint::run(args),
        Commands::Schema(args) => cmd::schema::run(args, &ctx),
        Commands::Results(args) => cmd::results::run(args, &ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_command_with_globals() {
        let cli = Cli::try_parse_from([
            "cbt-session",
            "-vv",
            "run",
            "tmpl_anxiety_001",
            "--preview",
            "--answers",
            "answers.json",
            "--data-dir",
            "/tmp/cbt",
        ])
        .expect("expected CLI to parse");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/cbt")));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.id, "tmpl_anxiety_001");
                assert!(args.preview);
                assert_eq!(args.answers, Some(PathBuf::from("answers.json")));
                assert!(!args.json);
            }
            _ => panic!("expected run args"),
        }
    }

    #[test]
    fn parses_lint_flags() {
        let cli = Cli::try_parse_from(["cbt-session", "lint", "t.json", "--strict", "--json"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Lint(args) => {
                assert_eq!(args.file, PathBuf::from("t.json"));
                assert!(args.strict);
                assert!(args.json);
            }
            _ => panic!("expected lint args"),
        }
    }

    #[test]
    fn parses_results_filter() {
        let cli = Cli::try_parse_from(["cbt-session", "results", "--template", "tmpl_stress_001"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Results(args) => {
                assert_eq!(args.template.as_deref(), Some("tmpl_stress_001"));
            }
            _ => panic!("expected results args"),
        }
    }

    #[test]
    fn parses_results_csv_export() {
        let cli = Cli::try_parse_from(["cbt-session", "results", "--csv", "abc", "-o", "out.csv"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Results(args) => {
                assert_eq!(args.csv.as_deref(), Some("abc"));
                assert_eq!(args.out, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("expected results args"),
        }
        assert!(Cli::try_parse_from(["cbt-session", "results", "-o", "out.csv"]).is_err());
        assert!(Cli::try_parse_from(["cbt-session", "results", "--csv", "abc", "--json"]).is_err());
    }

    #[test]
    fn parses_export_with_optional_destination() {
        let cli = Cli::try_parse_from(["cbt-session", "export", "tmpl_stress_001"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.id, "tmpl_stress_001");
                assert_eq!(args.out, None);
            }
            _ => panic!("expected export args"),
        }
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["cbt-session"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
