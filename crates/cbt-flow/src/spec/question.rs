use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    SingleChoice,
    MultiChoice,
    Scale,
    Info,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultiChoice => "multi_choice",
            QuestionKind::Scale => "scale",
            QuestionKind::Info => "info",
        }
    }

    /// Whether the kind carries an `options` list.
    pub fn has_options(&self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultiChoice)
    }
}

/// Selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Bounds of a scale question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
}

fn default_step() -> f64 {
    1.0
}

impl ScaleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: default_step(),
            min_label: None,
            max_label: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Routes a chosen option of a single-choice question to a non-default next question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Branch {
    pub option_id: String,
    pub target_question_id: String,
}

impl Branch {
    pub fn new(option_id: impl Into<String>, target_question_id: impl Into<String>) -> Self {
        Self {
            option_id: option_id.into(),
            target_question_id: target_question_id.into(),
        }
    }
}

/// One step of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ScaleRange>,
    #[serde(default)]
    pub required: bool,
    /// Only consulted for `single_choice` questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
}

impl Question {
    pub fn new(id: impl Into<String>, kind: QuestionKind, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            prompt: prompt.into(),
            description: None,
            options: Vec::new(),
            range: None,
            required: false,
            branches: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_range(mut self, range: ScaleRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_branches(mut self, branches: Vec<Branch>) -> Self {
        self.branches = branches;
        self
    }

    pub fn option_by_value(&self, value: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.value == value)
    }

    pub fn option_by_id(&self, id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// First branch declared for `option_id`; later duplicates are ignored.
    pub fn branch_for_option(&self, option_id: &str) -> Option<&Branch> {
        self.branches
            .iter()
            .find(|branch| branch.option_id == option_id)
    }

    pub fn is_branching(&self) -> bool {
        self.kind == QuestionKind::SingleChoice && !self.branches.is_empty()
    }
}
