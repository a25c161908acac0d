use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::answers::Answers;
use crate::error::FlowError;
use crate::spec::question::{Question, QuestionKind};
use crate::spec::template::Template;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid id pattern"));

/// Whether `id` is usable as a template, question or option id.
pub fn is_valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Gate applied by `advance`: a required question needs a non-empty answer.
pub fn check_required(question: &Question, answers: &Answers) -> Result<(), FlowError> {
    if !question.required {
        return Ok(());
    }
    match answers.get(&question.id) {
        Some(answer) if !answer.is_empty() => Ok(()),
        _ => Err(FlowError::required_missing(&question.id)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Authoring problem found by [`lint_template`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub code: &'static str,
    pub message: String,
}

impl TemplateIssue {
    fn error(question: Option<&Question>, code: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            question_id: question.map(|question| question.id.clone()),
            code,
            message,
        }
    }

    fn warning(question: &Question, code: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            question_id: Some(question.id.clone()),
            code,
            message,
        }
    }
}

/// Reports authoring mistakes. The engine never runs this; dangling branches stay non-fatal at run time.
pub fn lint_template(template: &Template) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();

    if template.is_empty() {
        issues.push(TemplateIssue::error(
            None,
            "empty_template",
            "template has no questions".into(),
        ));
        return issues;
    }

    let mut seen = BTreeSet::new();
    for question in &template.questions {
        if !seen.insert(question.id.as_str()) {
            issues.push(TemplateIssue::error(
                Some(question),
                "duplicate_question_id",
                format!("question id '{}' is used more than once", question.id),
            ));
        }
        if !is_valid_id(&question.id) {
            issues.push(TemplateIssue::error(
                Some(question),
                "invalid_question_id",
                format!("question id '{}' has unsupported characters", question.id),
            ));
        }
        lint_shape(question, &mut issues);
        lint_branches(template, question, &mut issues);
    }

    issues
}

fn lint_shape(question: &Question, issues: &mut Vec<TemplateIssue>) {
    if question.kind.has_options() && question.options.is_empty() {
        issues.push(TemplateIssue::error(
            Some(question),
            "missing_options",
            format!("{} question has no options", question.kind.as_str()),
        ));
    }
    if !question.kind.has_options() && !question.options.is_empty() {
        issues.push(TemplateIssue::warning(
            question,
            "unexpected_options",
            format!("options are ignored on {} questions", question.kind.as_str()),
        ));
    }

    if question.kind == QuestionKind::Scale {
        match &question.range {
            None => issues.push(TemplateIssue::error(
                Some(question),
                "missing_range",
                "scale question has no range".into(),
            )),
            Some(range) if range.min > range.max || range.step <= 0.0 => {
                issues.push(TemplateIssue::error(
                    Some(question),
                    "invalid_range",
                    format!(
                        "range {}..{} step {} is not usable",
                        range.min, range.max, range.step
                    ),
                ))
            }
            Some(_) => {}
        }
    }

    if question.kind == QuestionKind::Info && question.required {
        issues.push(TemplateIssue::warning(
            question,
            "required_info",
            "info questions cannot be answered, so required blocks the flow".into(),
        ));
    }
}

fn lint_branches(template: &Template, question: &Question, issues: &mut Vec<TemplateIssue>) {
    if question.branches.is_empty() {
        return;
    }
    if question.kind != QuestionKind::SingleChoice {
        issues.push(TemplateIssue::warning(
            question,
            "branches_ignored",
            format!("branches are ignored on {} questions", question.kind.as_str()),
        ));
        return;
    }

    for branch in &question.branches {
        if question.option_by_id(&branch.option_id).is_none() {
            issues.push(TemplateIssue::warning(
                question,
                "dangling_branch_option",
                format!("branch references unknown option '{}'", branch.option_id),
            ));
        }
        if !template.contains(&branch.target_question_id) {
            issues.push(TemplateIssue::warning(
                question,
                "dangling_branch_target",
                format!(
                    "branch target '{}' does not exist; default order will be used",
                    branch.target_question_id
                ),
            ));
        } else if branch.target_question_id == question.id {
            issues.push(TemplateIssue::warning(
                question,
                "self_branch",
                format!("option '{}' branches back to the same question", branch.option_id),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerValue;

    #[test]
    fn required_gate_rejects_missing_and_empty_answers() {
        let question = Question::new("q1", QuestionKind::MultiChoice, "Pick").required();
        let mut answers = Answers::new();
        assert_eq!(
            check_required(&question, &answers).unwrap_err().code(),
            "required_answer_missing"
        );
        answers.insert("q1".into(), AnswerValue::MultiChoice(Vec::new()));
        assert!(check_required(&question, &answers).is_err());
        answers.insert("q1".into(), AnswerValue::multi(["a"]));
        assert!(check_required(&question, &answers).is_ok());
    }

    #[test]
    fn optional_questions_pass_without_answers() {
        let question = Question::new("q1", QuestionKind::Text, "Say");
        assert!(check_required(&question, &Answers::new()).is_ok());
    }

    #[test]
    fn id_pattern_rejects_path_like_ids() {
        assert!(is_valid_id("tmpl_anxiety_001"));
        assert!(is_valid_id("dep.q-1"));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("has space"));
    }
}
