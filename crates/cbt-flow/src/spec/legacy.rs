//! Reader for templates exported by the earlier web builder.
//!
//! That layout uses camelCase keys, upper-case kind names (`MCQ`, `SLIDER`,
//! `CHECKBOX`) and keeps scale bounds directly on the question.

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::spec::question::{Branch, ChoiceOption, Question, QuestionKind, ScaleRange};
use crate::spec::template::Template;

/// Slider bounds the web builder assumed when none were stored.
const SLIDER_MIN: f64 = 0.0;
const SLIDER_MAX: f64 = 10.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTemplate {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    questions: Vec<LegacyQuestion>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum LegacyKind {
    Text,
    Mcq,
    Slider,
    Checkbox,
    Info,
}

impl From<LegacyKind> for QuestionKind {
    fn from(kind: LegacyKind) -> Self {
        match kind {
            LegacyKind::Text => QuestionKind::Text,
            LegacyKind::Mcq => QuestionKind::SingleChoice,
            LegacyKind::Slider => QuestionKind::Scale,
            LegacyKind::Checkbox => QuestionKind::MultiChoice,
            LegacyKind::Info => QuestionKind::Info,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: LegacyKind,
    prompt: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    options: Vec<ChoiceOption>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    step: Option<f64>,
    #[serde(default)]
    min_label: Option<String>,
    #[serde(default)]
    max_label: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    branches: Vec<LegacyBranch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBranch {
    option_id: String,
    target_question_id: String,
}

impl From<LegacyQuestion> for Question {
    fn from(legacy: LegacyQuestion) -> Self {
        let kind = QuestionKind::from(legacy.kind);
        let range = (kind == QuestionKind::Scale).then(|| ScaleRange {
            min: legacy.min.unwrap_or(SLIDER_MIN),
            max: legacy.max.unwrap_or(SLIDER_MAX),
            step: legacy.step.unwrap_or(1.0),
            min_label: legacy.min_label,
            max_label: legacy.max_label,
        });
        Question {
            id: legacy.id,
            kind,
            prompt: legacy.prompt,
            description: legacy.description.filter(|text| !text.is_empty()),
            options: legacy.options,
            range,
            required: legacy.required,
            branches: legacy
                .branches
                .into_iter()
                .map(|branch| Branch::new(branch.option_id, branch.target_question_id))
                .collect(),
        }
    }
}

impl From<LegacyTemplate> for Template {
    fn from(legacy: LegacyTemplate) -> Self {
        let mut template = Template::new(
            legacy.id,
            legacy.title,
            legacy.questions.into_iter().map(Question::from).collect(),
        );
        template.description = legacy.description.filter(|text| !text.is_empty());
        if let Some(version) = legacy.version {
            template.version = version;
        }
        template.created_at = legacy.created_at.as_deref().and_then(parse_timestamp);
        template.updated_at = legacy.updated_at.as_deref().and_then(parse_timestamp);
        template
    }
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

impl Template {
    /// Reads a template document in the native layout, falling back to the web builder's layout.
    /// When neither fits, the native error is returned.
    pub fn from_document(value: &Value) -> Result<Self, serde_json::Error> {
        match Template::deserialize(value) {
            Ok(template) => Ok(template),
            Err(native) => match LegacyTemplate::deserialize(value) {
                Ok(legacy) => {
                    debug!(template_id = %legacy.id, "read template in web builder layout");
                    Ok(legacy.into())
                }
                Err(_) => Err(native),
            },
        }
    }
}
