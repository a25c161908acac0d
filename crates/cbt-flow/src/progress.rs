use tracing::debug;

use crate::answers::Answers;
use crate::spec::question::Question;
use crate::spec::template::Template;

/// Why a branching question fell back to the default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFallback {
    NoAnswer,
    UnmatchedOption,
    NoBranchForOption,
    DanglingTarget,
}

impl BranchFallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchFallback::NoAnswer => "no_answer",
            BranchFallback::UnmatchedOption => "unmatched_option",
            BranchFallback::NoBranchForOption => "no_branch_for_option",
            BranchFallback::DanglingTarget => "dangling_target",
        }
    }
}

/// How the next question was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Via {
    Branch { option_id: String },
    Linear { fallback: Option<BranchFallback> },
}

/// Outcome of next-question resolution. `target == None` means the flow is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStep<'a> {
    pub target: Option<&'a str>,
    pub via: Via,
}

/// Resolves the id that follows `current_id`, honouring branches of single-choice questions.
pub fn resolve_next<'a>(
    template: &'a Template,
    answers: &Answers,
    current_id: &str,
) -> Option<&'a str> {
    explain_next(template, answers, current_id).target
}

/// Same as [`resolve_next`] but reports which rule produced the result.
pub fn explain_next<'a>(
    template: &'a Template,
    answers: &Answers,
    current_id: &str,
) -> NextStep<'a> {
    let Some(question) = template.question(current_id) else {
        return NextStep {
            target: None,
            via: Via::Linear { fallback: None },
        };
    };

    let fallback = if question.is_branching() {
        match branch_target(template, question, answers) {
            Ok((option_id, target)) => {
                return NextStep {
                    target: Some(target),
                    via: Via::Branch { option_id },
                };
            }
            Err(reason) => {
                debug!(
                    template_id = %template.id,
                    question_id = %question.id,
                    reason = reason.as_str(),
                    "branch not taken; using default order"
                );
                Some(reason)
            }
        }
    } else {
        None
    };

    NextStep {
        target: template
            .question_after(current_id)
            .map(|next| next.id.as_str()),
        via: Via::Linear { fallback },
    }
}

fn branch_target<'a>(
    template: &'a Template,
    question: &Question,
    answers: &Answers,
) -> Result<(String, &'a str), BranchFallback> {
    let selected = answers
        .get(&question.id)
        .and_then(|answer| answer.as_text())
        .ok_or(BranchFallback::NoAnswer)?;
    let option = question
        .option_by_value(selected)
        .ok_or(BranchFallback::UnmatchedOption)?;
    let branch = question
        .branch_for_option(&option.id)
        .ok_or(BranchFallback::NoBranchForOption)?;
    let target = template
        .question(&branch.target_question_id)
        .ok_or(BranchFallback::DanglingTarget)?;
    Ok((option.id.clone(), target.id.as_str()))
}

/// Cosmetic completion estimate, clamped to `0..=100`.
pub fn progress_percent(history_len: usize, total_questions: usize) -> u8 {
    let ratio = history_len as f64 / total_questions.max(1) as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
