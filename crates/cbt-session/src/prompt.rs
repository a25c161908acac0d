use std::io::{BufRead, Write};

use anyhow::{Result, bail};

use cbt_flow::{AnswerValue, CaptureFields, Question, QuestionKind};

pub const BACK_COMMAND: &str = ":back";
pub const REQUIRED_MESSAGE: &str = "Please answer this question to proceed.";

/// Lowest and highest mood score accepted by the check-in.
pub const CAPTURE_RANGE: (i64, i64) = (1, 5);

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionInput {
    Answer(AnswerValue),
    Skip,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureInput {
    Submit(CaptureFields),
    Back,
}

/// Line-oriented terminal front end for a run.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn notice(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    pub fn render_question(
        &mut self,
        question: &Question,
        step: usize,
        progress: u8,
        can_go_back: bool,
    ) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{} {progress:>3}%", progress_bar(progress))?;
        let marker = if question.required { " *" } else { "" };
        writeln!(self.output, "{step}. {}{marker}", question.prompt)?;
        if let Some(description) = &question.description {
            writeln!(self.output, "   {description}")?;
        }
        match question.kind {
            QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
                for (idx, option) in question.options.iter().enumerate() {
                    writeln!(self.output, "  {}. {}", idx + 1, option.label)?;
                }
            }
            QuestionKind::Scale => {
                if let Some(range) = &question.range {
                    let low = range.min_label.as_deref().unwrap_or("");
                    let high = range.max_label.as_deref().unwrap_or("");
                    writeln!(self.output, "  {} {low} .. {} {high}", range.min, range.max)?;
                }
            }
            QuestionKind::Text | QuestionKind::Info => {}
        }
        if can_go_back {
            writeln!(self.output, "  ({BACK_COMMAND} returns to the previous question)")?;
        }
        Ok(())
    }

    /// Reads until the line parses for `question`. Empty input keeps `existing` when there is one.
    pub fn ask_question(
        &mut self,
        question: &Question,
        existing: Option<&AnswerValue>,
    ) -> Result<QuestionInput> {
        loop {
            let hint = match question.kind {
                QuestionKind::Info => "Press Enter to continue",
                QuestionKind::SingleChoice => "Select a number or value",
                QuestionKind::MultiChoice => "Select numbers or values, comma separated",
                QuestionKind::Scale => "Enter a number",
                QuestionKind::Text => "Your answer",
            };
            match existing {
                Some(answer) => write!(self.output, "{hint} [{}]: ", display_answer(answer))?,
                None => write!(self.output, "{hint}: ")?,
            }
            self.output.flush()?;

            let line = self.read_line()?;
            if line == BACK_COMMAND {
                return Ok(QuestionInput::Back);
            }
            if question.kind == QuestionKind::Info {
                return Ok(QuestionInput::Skip);
            }
            if line.is_empty() {
                return Ok(match existing {
                    Some(answer) => QuestionInput::Answer(answer.clone()),
                    None => QuestionInput::Skip,
                });
            }
            match parse_answer(question, &line) {
                Ok(answer) => return Ok(QuestionInput::Answer(answer)),
                Err(message) => writeln!(self.output, "{message}")?,
            }
        }
    }

    pub fn ask_capture(&mut self, default_primary: i64) -> Result<CaptureInput> {
        let (min, max) = CAPTURE_RANGE;
        writeln!(self.output)?;
        writeln!(self.output, "All questions answered. One last check-in.")?;
        let primary = loop {
            write!(
                self.output,
                "How are you feeling right now? ({min}-{max}) [{default_primary}]: "
            )?;
            self.output.flush()?;
            let line = self.read_line()?;
            if line == BACK_COMMAND {
                return Ok(CaptureInput::Back);
            }
            if line.is_empty() {
                break default_primary;
            }
            match line.parse::<i64>() {
                Ok(value) if (min..=max).contains(&value) => break value,
                _ => writeln!(self.output, "Enter a whole number from {min} to {max}.")?,
            }
        };
        write!(self.output, "Anything you want to note? (optional): ")?;
        self.output.flush()?;
        let note = self.read_line()?;
        Ok(CaptureInput::Submit(CaptureFields::new(primary, note)))
    }

    pub fn ask_yes_no(&mut self, prompt: &str, default_yes: bool) -> Result<bool> {
        let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
        loop {
            write!(self.output, "{prompt} {suffix}: ")?;
            self.output.flush()?;
            let token = self.read_line()?.to_ascii_lowercase();
            match token.as_str() {
                "" => return Ok(default_yes),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer yes or no.")?,
            }
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("stdin closed");
        }
        Ok(line.trim().to_string())
    }
}

/// Reads a typed-in answer. Choices accept the 1-based number, the value or the option id.
pub fn parse_answer(question: &Question, raw: &str) -> Result<AnswerValue, String> {
    match question.kind {
        QuestionKind::Text => Ok(AnswerValue::text(raw)),
        QuestionKind::SingleChoice => pick_option(question, raw).map(AnswerValue::choice),
        QuestionKind::MultiChoice => {
            let mut picked: Vec<String> = Vec::new();
            for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
                let value = pick_option(question, token)?;
                if !picked.contains(&value) {
                    picked.push(value);
                }
            }
            Ok(AnswerValue::MultiChoice(picked))
        }
        QuestionKind::Scale => {
            let value: f64 = raw
                .parse()
                .ok()
                .filter(|value: &f64| value.is_finite())
                .ok_or_else(|| format!("'{raw}' is not a number."))?;
            match &question.range {
                Some(range) if !range.contains(value) => Err(format!(
                    "Enter a number from {} to {}.",
                    range.min, range.max
                )),
                _ => Ok(AnswerValue::Scale(value)),
            }
        }
        QuestionKind::Info => Err("This step takes no answer.".to_string()),
    }
}

fn pick_option(question: &Question, token: &str) -> Result<String, String> {
    if let Ok(n) = token.parse::<usize>()
        && n > 0
        && n <= question.options.len()
    {
        return Ok(question.options[n - 1].value.clone());
    }
    question
        .option_by_value(token)
        .or_else(|| question.option_by_id(token))
        .map(|option| option.value.clone())
        .ok_or_else(|| format!("'{token}' is not one of the listed options."))
}

fn display_answer(answer: &AnswerValue) -> String {
    match answer {
        AnswerValue::Text(text) | AnswerValue::Choice(text) => text.clone(),
        AnswerValue::MultiChoice(values) => values.join(", "),
        AnswerValue::Scale(value) => value.to_string(),
    }
}

fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(percent.min(100)) * WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}
