use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use cbt_flow::{AnswerValue, CaptureFields, FlowError, Mode, Phase, SessionResult, SessionRunner};

use super::Context;
use crate::prompt::{CaptureInput, Prompter, QuestionInput, REQUIRED_MESSAGE};

/// Steps allowed per question before a scripted run is considered stuck in a branch cycle.
const STEPS_PER_QUESTION: usize = 4;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Template id
    #[arg(value_name = "ID")]
    pub id: String,
    /// Dry run: nothing is saved and the run can be restarted
    #[arg(long)]
    pub preview: bool,
    /// Answer from a JSON file instead of prompting
    #[arg(long = "answers", value_name = "FILE")]
    pub answers: Option<PathBuf>,
    /// Print the session result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Scripted answers document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedAnswers {
    #[serde(default)]
    pub answers: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub capture: Option<CaptureFields>,
}

impl ScriptedAnswers {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read answers {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("answers {} must be valid JSON", path.display()))
    }
}

pub fn run(args: &RunArgs, ctx: &Context) -> Result<()> {
    let store = Arc::new(ctx.open_store()?);
    let mode = if args.preview { Mode::Preview } else { Mode::Live };
    let mut runner = SessionRunner::open(store.as_ref(), &args.id, mode, store.clone())
        .with_context(|| format!("cannot start template {}", args.id))?;
    let default_primary = ctx.config().default_capture_primary;

    let result = match &args.answers {
        Some(path) => {
            let script = ScriptedAnswers::load(path)?;
            run_scripted(&mut runner, &script, default_primary)?
        }
        None => {
            if !(io::stdin().is_terminal() && io::stdout().is_terminal()) {
                bail!("stdin is not a terminal; pass --answers FILE for a scripted run");
            }
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout().lock());
            run_interactive(&mut runner, &mut prompter, default_primary)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match result.mode {
            Mode::Live => println!(
                "session {} saved ({} questions on path)",
                result.session_id,
                result.path_taken.len()
            ),
            Mode::Preview => println!(
                "preview of {} finished ({} questions on path); nothing saved",
                result.template_id,
                result.path_taken.len()
            ),
        }
    }
    Ok(())
}

/// Drives a run from pre-recorded answers. Questions without an entry are advanced unanswered.
pub fn run_scripted(
    runner: &mut SessionRunner,
    script: &ScriptedAnswers,
    default_primary: i64,
) -> Result<SessionResult> {
    let template = runner.state().template();
    for id in script.answers.keys() {
        if !template.contains(id) {
            warn!(question_id = %id, template_id = %template.id, "scripted answer for unknown question");
        }
    }

    let limit = template.len() * STEPS_PER_QUESTION;
    let mut steps = 0;
    while runner.phase() == Phase::InQuestion {
        steps += 1;
        if steps > limit {
            bail!("scripted run did not reach the end after {limit} steps; check for branch cycles");
        }
        let question = runner
            .current_question()
            .cloned()
            .context("current question is missing from the template")?;
        if let Some(raw) = script.answers.get(&question.id) {
            let value = AnswerValue::from_json(question.kind, raw)
                .with_context(|| format!("answer for {}", question.id))?;
            runner.answer(value)?;
        }
        runner
            .advance()
            .with_context(|| format!("cannot leave question {}", question.id))?;
    }

    let capture = script
        .capture
        .clone()
        .unwrap_or_else(|| CaptureFields::new(default_primary, ""));
    Ok(runner.complete_capture(capture)?)
}

/// Prompts until the run completes. Preview runs may be restarted afterwards.
pub fn run_interactive<R: BufRead, W: Write>(
    runner: &mut SessionRunner,
    prompter: &mut Prompter<R, W>,
    default_primary: i64,
) -> Result<SessionResult> {
    loop {
        let result = prompt_until_complete(runner, prompter, default_primary)?;
        if result.mode == Mode::Preview && prompter.ask_yes_no("Restart the preview?", false)? {
            runner.restart()?;
            continue;
        }
        return Ok(result);
    }
}

fn prompt_until_complete<R: BufRead, W: Write>(
    runner: &mut SessionRunner,
    prompter: &mut Prompter<R, W>,
    default_primary: i64,
) -> Result<SessionResult> {
    loop {
        match runner.phase() {
            Phase::InQuestion => {
                let question = runner
                    .current_question()
                    .cloned()
                    .context("current question is missing from the template")?;
                prompter.render_question(
                    &question,
                    runner.state().step_number(),
                    runner.progress_percent(),
                    runner.can_go_back(),
                )?;
                let existing = runner.state().answer_for(&question.id).cloned();
                match prompter.ask_question(&question, existing.as_ref())? {
                    QuestionInput::Back => {
                        if !runner.back() {
                            prompter.notice("This is the first question.")?;
                        }
                        continue;
                    }
                    QuestionInput::Answer(value) => runner.answer(value)?,
                    QuestionInput::Skip => runner.clear_answer()?,
                }
                match runner.advance() {
                    Ok(phase) => debug!(?phase, "advanced"),
                    Err(err) if err.is_recoverable() => prompter.notice(REQUIRED_MESSAGE)?,
                    Err(err) => return Err(err.into()),
                }
            }
            Phase::SupplementalCapture => match prompter.ask_capture(default_primary)? {
                CaptureInput::Back => {
                    runner.back();
                }
                CaptureInput::Submit(capture) => match runner.complete_capture(capture) {
                    Ok(result) => return Ok(result),
                    Err(err @ FlowError::Store(_)) => {
                        prompter.notice(&format!("Could not save the result ({err}); try again."))?;
                    }
                    Err(err) => return Err(err.into()),
                },
            },
            Phase::Completed => bail!("session is already completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use cbt_flow::{
        Branch, ChoiceOption, MemoryStore, Question, QuestionKind, ResultSource, Template,
    };
    use serde_json::json;

    use super::*;

    fn template() -> Template {
        Template::new(
            "tmpl_run",
            "Run",
            vec![
                Question::new("q1", QuestionKind::SingleChoice, "Slept well?")
                    .required()
                    .with_options(vec![
                        ChoiceOption::new("yes", "Yes", "yes"),
                        ChoiceOption::new("no", "No", "no"),
                    ])
                    .with_branches(vec![Branch::new("no", "q3")]),
                Question::new("q2", QuestionKind::Text, "What helped?"),
                Question::new("q3", QuestionKind::Text, "Anything else?"),
            ],
        )
    }

    fn runner(mode: Mode) -> (Arc<MemoryStore>, SessionRunner) {
        let sink = Arc::new(MemoryStore::new());
        let runner = SessionRunner::start(template(), mode, sink.clone()).expect("start");
        (sink, runner)
    }

    #[test]
    fn scripted_run_follows_branches_and_defaults_capture() {
        let (sink, mut runner) = runner(Mode::Live);
        let script: ScriptedAnswers =
            serde_json::from_value(json!({ "answers": { "q1": "no", "q3": "tired" } }))
                .expect("fixture should deserialize");

        let result = run_scripted(&mut runner, &script, 3).expect("run");
        assert_eq!(result.path_taken, ["q1", "q3", "q3"]);
        assert_eq!(result.capture, CaptureFields::new(3, ""));
        assert_eq!(sink.list_results(None).expect("list").len(), 1);
    }

    #[test]
    fn scripted_run_reports_missing_required_answer() {
        let (_sink, mut runner) = runner(Mode::Live);
        let err = run_scripted(&mut runner, &ScriptedAnswers::default(), 3).expect_err("required");
        assert!(format!("{err:#}").contains("required_answer_missing"));
    }

    #[test]
    fn scripted_answer_with_wrong_shape_fails() {
        let (_sink, mut runner) = runner(Mode::Live);
        let script: ScriptedAnswers =
            serde_json::from_value(json!({ "answers": { "q1": ["yes"] } }))
                .expect("fixture should deserialize");
        let err = run_scripted(&mut runner, &script, 3).expect_err("shape");
        assert!(format!("{err:#}").contains("answer for q1"));
    }

    #[test]
    fn interactive_run_supports_validation_and_back() {
        let (sink, mut runner) = runner(Mode::Live);
        let input = "\n1\n:back\n2\nlate night\n:back\n\nok\n4\nfine\n";
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

        let result = run_interactive(&mut runner, &mut prompter, 3).expect("run");
        let output = String::from_utf8(prompter.into_output()).expect("utf8");
        assert!(output.contains(REQUIRED_MESSAGE));
        assert_eq!(result.path_taken, ["q1", "q3", "q3"]);
        assert_eq!(result.capture, CaptureFields::new(4, "fine"));
        assert_eq!(sink.result_count(), 1);
    }

    #[test]
    fn preview_can_restart_and_saves_nothing() {
        let (sink, mut runner) = runner(Mode::Preview);
        let input = "1\n\n\n\n\ny\n2\n\n5\n\nn\n";
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

        let result = run_interactive(&mut runner, &mut prompter, 3).expect("run");
        assert_eq!(result.mode, Mode::Preview);
        assert_eq!(result.path_taken, ["q1", "q3", "q3"]);
        assert_eq!(result.capture.primary, 5);
        assert_eq!(sink.result_count(), 0);
    }
}
